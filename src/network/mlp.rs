use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::activation::activation::Activation;
use crate::error::{Error, Result};
use crate::math::matrix::{Axis, Matrix};

/// One training pair: `(input, target)`.
///
/// The input is shaped `[batch, input_width]` and the target
/// `[batch, output_width]`; the batch size may differ between pairs but
/// must agree within one.
pub type Sample = (Matrix, Matrix);

/// A multi-layer perceptron trained by backpropagation.
///
/// The network owns one weight matrix and one bias row per layer,
/// borrows its activation capability, and carries its own random source.
/// Hidden layers apply the activation elementwise; the output layer is
/// linear, so unbounded regression targets never saturate against a
/// bounded activation range.
pub struct Mlp<'a> {
    layer_sizes: Vec<usize>,
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
    activation: &'a Activation,
    rng: StdRng,
}

impl<'a> Mlp<'a> {
    /// Builds a network with fresh process entropy behind its
    /// initialization and epoch shuffling. `layer_sizes` runs from input
    /// width to output width and needs at least two entries.
    pub fn new(layer_sizes: Vec<usize>, activation: &'a Activation) -> Result<Mlp<'a>> {
        Mlp::build(layer_sizes, activation, StdRng::from_entropy())
    }

    /// Like [`Mlp::new`], but with all randomness (weight initialization
    /// and per-epoch shuffling) pinned to `seed`.
    pub fn with_seed(
        layer_sizes: Vec<usize>,
        activation: &'a Activation,
        seed: u64,
    ) -> Result<Mlp<'a>> {
        Mlp::build(layer_sizes, activation, StdRng::seed_from_u64(seed))
    }

    fn build(
        layer_sizes: Vec<usize>,
        activation: &'a Activation,
        mut rng: StdRng,
    ) -> Result<Mlp<'a>> {
        if layer_sizes.len() < 2 {
            return Err(Error::InvalidTopology(format!(
                "need at least an input and an output layer, got {} entries",
                layer_sizes.len()
            )));
        }
        if let Some(pos) = layer_sizes.iter().position(|&s| s == 0) {
            return Err(Error::InvalidTopology(format!(
                "layer {pos} has zero neurons"
            )));
        }

        let num_layers = layer_sizes.len() - 1;
        let mut weights = Vec::with_capacity(num_layers);
        let mut biases = Vec::with_capacity(num_layers);
        for i in 0..num_layers {
            let (input_size, output_size) = (layer_sizes[i], layer_sizes[i + 1]);
            let std_dev = 1.0 / ((input_size * output_size) as f64).sqrt();
            weights.push(Matrix::rand_gaussian_with(
                input_size,
                output_size,
                0.0,
                std_dev,
                &mut rng,
            )?);
            biases.push(Matrix::rand_gaussian_with(
                1,
                output_size,
                0.0,
                std_dev,
                &mut rng,
            )?);
        }

        Ok(Mlp {
            layer_sizes,
            weights,
            biases,
            activation,
            rng,
        })
    }

    /// Number of trainable layers, i.e. `layer_sizes.len() - 1`.
    pub fn num_layers(&self) -> usize {
        self.layer_sizes.len() - 1
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    /// Per-layer weight matrices, shaped `[layer_sizes[i], layer_sizes[i+1]]`.
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    /// Per-layer bias rows, shaped `[1, layer_sizes[i+1]]`.
    pub fn biases(&self) -> &[Matrix] {
        &self.biases
    }

    /// Runs the input through every layer and returns the full cache of
    /// `num_layers() + 1` activations, the input itself first. The
    /// backward pass needs every intermediate value, which is why this
    /// returns the whole sequence rather than just the output.
    pub fn forward_pass(&self, input: &Matrix) -> Result<Vec<Matrix>> {
        if input.cols() != self.layer_sizes[0] {
            return Err(Error::DimensionMismatch(format!(
                "input has {} columns, network expects {}",
                input.cols(),
                self.layer_sizes[0]
            )));
        }

        let num_layers = self.num_layers();
        let mut activations = Vec::with_capacity(num_layers + 1);
        activations.push(input.clone());
        for i in 0..num_layers {
            let mut z = activations[i]
                .mat_mul(&self.weights[i])?
                .mat_add(&self.biases[i])?;
            // The output layer stays linear.
            if i + 1 < num_layers {
                z.apply_elementwise(|x| self.activation.value(x));
            }
            activations.push(z);
        }
        Ok(activations)
    }

    /// One gradient-descent step against squared-error loss, walking the
    /// layers in reverse and updating weights and biases in place.
    ///
    /// `activations` must be the untouched cache from [`Mlp::forward_pass`].
    /// The error propagated to layer `i - 1` always uses the pre-update
    /// weights of layer `i`, so propagation happens before the update.
    /// Bias gradients are averaged over the batch dimension, keeping the
    /// bias step invariant to batch size.
    pub fn backward_pass(
        &mut self,
        activations: &[Matrix],
        target: &Matrix,
        learning_rate: f64,
    ) -> Result<()> {
        let num_layers = self.num_layers();
        if activations.len() != num_layers + 1 {
            return Err(Error::ShapeMismatch(format!(
                "activation cache has {} entries, expected {}",
                activations.len(),
                num_layers + 1
            )));
        }
        let output = &activations[num_layers];
        if output.shape() != target.shape() {
            return Err(Error::ShapeMismatch(format!(
                "output shape {:?} does not match target shape {:?}",
                output.shape(),
                target.shape()
            )));
        }

        // Negative gradient of squared error w.r.t. the linear output,
        // with the constant factor folded into the learning rate.
        let mut negated = output.clone();
        negated.scalar_mul(-1.0);
        let mut error = target.mat_add(&negated)?;

        for i in (1..=num_layers).rev() {
            // The output layer applied no activation, so its derivative
            // factor is 1 and the delta is the error itself. Hidden
            // layers evaluate the derivative on their post-activation
            // values (see the Activation docs for the restriction this
            // places on pluggable activations).
            let mut gradients = if i == num_layers {
                error.clone()
            } else {
                let mut deriv = activations[i].clone();
                deriv.apply_elementwise(|a| self.activation.derivative(a));
                error.elem_wise_mul(&deriv)?
            };
            gradients.scalar_mul(learning_rate);

            let weight_grads = activations[i - 1].transpose().mat_mul(&gradients)?;

            // Propagate through the pre-update weights before touching them.
            let propagated = error.mat_mul(&self.weights[i - 1].transpose())?;

            self.weights[i - 1] = self.weights[i - 1].mat_add(&weight_grads)?;
            self.biases[i - 1] = self.biases[i - 1].mat_add(&gradients.mean(Axis::Row))?;

            error = propagated;
        }
        Ok(())
    }

    /// Runs `epochs` full passes of stochastic gradient descent over
    /// `data`, shuffling the sample order before every pass. There is no
    /// convergence check; exactly `epochs` passes run. `verbose` prints
    /// the per-epoch mean squared error and changes nothing else.
    pub fn train(
        &mut self,
        data: &[Sample],
        learning_rate: f64,
        epochs: usize,
        verbose: bool,
    ) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidArgument("training set is empty".into()));
        }
        if epochs == 0 {
            return Err(Error::InvalidArgument("epochs must be at least 1".into()));
        }
        if learning_rate <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "learning rate must be positive, got {learning_rate}"
            )));
        }

        let mut order: Vec<usize> = (0..data.len()).collect();
        for epoch in 0..epochs {
            order.shuffle(&mut self.rng);

            let mut epoch_loss = 0.0;
            for &idx in &order {
                let (input, target) = &data[idx];
                let activations = self.forward_pass(input)?;
                if verbose {
                    epoch_loss +=
                        crate::loss::mse::MseLoss::loss(&activations[self.num_layers()], target)?;
                }
                self.backward_pass(&activations, target, learning_rate)?;
            }

            if verbose {
                println!("epoch {epoch}: mse = {:.6}", epoch_loss / data.len() as f64);
            }
        }
        Ok(())
    }

    /// Inference: runs a forward pass and returns only the final
    /// activation. Weights and biases are untouched.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        let mut activations = self.forward_pass(input)?;
        let output = activations
            .pop()
            .expect("forward pass always yields at least one activation");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(values: Vec<Vec<f64>>) -> Matrix {
        Matrix::from_rows(values).unwrap()
    }

    #[test]
    fn construction_rejects_bad_topologies() {
        let sigmoid = Activation::sigmoid();
        assert!(matches!(
            Mlp::new(vec![3], &sigmoid),
            Err(Error::InvalidTopology(_))
        ));
        assert!(matches!(
            Mlp::new(vec![], &sigmoid),
            Err(Error::InvalidTopology(_))
        ));
        assert!(matches!(
            Mlp::new(vec![2, 0, 1], &sigmoid),
            Err(Error::InvalidTopology(_))
        ));
    }

    #[test]
    fn construction_shapes_follow_layer_sizes() {
        let sigmoid = Activation::sigmoid();
        let mlp = Mlp::with_seed(vec![4, 3, 2], &sigmoid, 1).unwrap();
        assert_eq!(mlp.num_layers(), 2);
        assert_eq!(mlp.weights()[0].shape(), (4, 3));
        assert_eq!(mlp.weights()[1].shape(), (3, 2));
        assert_eq!(mlp.biases()[0].shape(), (1, 3));
        assert_eq!(mlp.biases()[1].shape(), (1, 2));
    }

    #[test]
    fn same_seed_same_initialization() {
        let sigmoid = Activation::sigmoid();
        let a = Mlp::with_seed(vec![2, 3, 1], &sigmoid, 9).unwrap();
        let b = Mlp::with_seed(vec![2, 3, 1], &sigmoid, 9).unwrap();
        assert_eq!(a.weights(), b.weights());
        assert_eq!(a.biases(), b.biases());
    }

    #[test]
    fn forward_pass_caches_every_activation() {
        let sigmoid = Activation::sigmoid();
        let mlp = Mlp::with_seed(vec![2, 3, 1], &sigmoid, 3).unwrap();
        let input = m(vec![vec![0.5, -0.5], vec![1.0, 1.0]]);

        let activations = mlp.forward_pass(&input).unwrap();
        assert_eq!(activations.len(), 3);
        assert_eq!(activations[0], input);
        assert_eq!(activations[1].shape(), (2, 3));
        assert_eq!(activations[2].shape(), (2, 1));

        // Hidden activations went through the sigmoid.
        assert!(activations[1]
            .as_slice()
            .iter()
            .all(|v| *v > 0.0 && *v < 1.0));
    }

    #[test]
    fn forward_pass_rejects_wrong_input_width() {
        let sigmoid = Activation::sigmoid();
        let mlp = Mlp::with_seed(vec![2, 3, 1], &sigmoid, 3).unwrap();
        let bad = m(vec![vec![1.0, 2.0, 3.0]]);
        assert!(matches!(
            mlp.forward_pass(&bad),
            Err(Error::DimensionMismatch(_))
        ));
    }

    #[test]
    fn output_layer_is_linear() {
        // A single-layer sigmoid network is output-only, so no
        // activation applies: a huge input must escape sigmoid's (0, 1)
        // range (except for astronomically unlikely near-zero weights).
        let sigmoid = Activation::sigmoid();
        let mlp = Mlp::with_seed(vec![1, 1], &sigmoid, 11).unwrap();
        let out = mlp.predict(&m(vec![vec![1.0e6]])).unwrap();
        assert!(out[(0, 0)].abs() > 1.0, "output {} looks saturated", out[(0, 0)]);
    }

    #[test]
    fn backward_pass_rejects_bad_cache_and_target() {
        let sigmoid = Activation::sigmoid();
        let mut mlp = Mlp::with_seed(vec![2, 3, 1], &sigmoid, 5).unwrap();
        let input = m(vec![vec![0.0, 1.0]]);
        let target = m(vec![vec![1.0]]);

        let mut activations = mlp.forward_pass(&input).unwrap();
        activations.pop();
        assert!(matches!(
            mlp.backward_pass(&activations, &target, 0.1),
            Err(Error::ShapeMismatch(_))
        ));

        let activations = mlp.forward_pass(&input).unwrap();
        let wide_target = m(vec![vec![1.0, 0.0]]);
        assert!(matches!(
            mlp.backward_pass(&activations, &wide_target, 0.1),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn train_rejects_bad_hyperparameters() {
        let sigmoid = Activation::sigmoid();
        let mut mlp = Mlp::with_seed(vec![2, 3, 1], &sigmoid, 5).unwrap();
        let data = vec![(m(vec![vec![0.0, 1.0]]), m(vec![vec![1.0]]))];

        assert!(matches!(
            mlp.train(&data, 0.1, 0, false),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            mlp.train(&data, 0.0, 10, false),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            mlp.train(&data, -0.5, 10, false),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn train_on_empty_dataset_leaves_parameters_unchanged() {
        let sigmoid = Activation::sigmoid();
        let mut mlp = Mlp::with_seed(vec![2, 3, 1], &sigmoid, 5).unwrap();
        let weights_before = mlp.weights().to_vec();
        let biases_before = mlp.biases().to_vec();

        assert!(matches!(
            mlp.train(&[], 0.1, 10, false),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(mlp.weights(), weights_before.as_slice());
        assert_eq!(mlp.biases(), biases_before.as_slice());
    }

    #[test]
    fn predict_does_not_mutate_parameters() {
        let sigmoid = Activation::sigmoid();
        let mlp = Mlp::with_seed(vec![2, 3, 1], &sigmoid, 5).unwrap();
        let weights_before = mlp.weights().to_vec();

        let out = mlp.predict(&m(vec![vec![0.25, 0.75]])).unwrap();
        assert_eq!(out.shape(), (1, 1));
        assert_eq!(mlp.weights(), weights_before.as_slice());
    }

    #[test]
    fn train_fits_a_simple_affine_relation() {
        // With the identity activation the whole network is affine, so
        // plain gradient descent must drive the error down on y = 2x.
        let identity = Activation::identity();
        let mut mlp = Mlp::with_seed(vec![1, 1], &identity, 21).unwrap();
        let data: Vec<Sample> = vec![
            (m(vec![vec![1.0]]), m(vec![vec![2.0]])),
            (m(vec![vec![2.0]]), m(vec![vec![4.0]])),
            (m(vec![vec![-1.0]]), m(vec![vec![-2.0]])),
        ];

        let sq_err = |mlp: &Mlp| -> f64 {
            data.iter()
                .map(|(input, target)| {
                    let diff = mlp.predict(input).unwrap()[(0, 0)] - target[(0, 0)];
                    diff * diff
                })
                .sum()
        };

        let before = sq_err(&mlp);
        mlp.train(&data, 0.05, 500, false).unwrap();
        let after = sq_err(&mlp);

        assert!(after < before, "{after} >= {before}");
        assert!(after < 1e-6, "did not fit affine relation: {after}");
    }
}

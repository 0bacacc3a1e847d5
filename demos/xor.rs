use dense_nn::{Activation, Matrix, Mlp, Sample};

fn main() -> dense_nn::Result<()> {
    let sigmoid = Activation::sigmoid();
    let mut mlp = Mlp::new(vec![2, 3, 1], &sigmoid)?;

    // XOR with some noisy replicas of each corner.
    let points: [[f64; 3]; 8] = [
        [0.0, 0.0, 0.0],
        [0.0, 1.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 0.0],
        [0.1, 0.1, 0.0],
        [0.1, 0.9, 1.0],
        [0.9, 0.1, 1.0],
        [0.9, 0.9, 0.0],
    ];

    let mut data: Vec<Sample> = Vec::new();
    for [a, b, label] in points {
        data.push((
            Matrix::from_rows(vec![vec![a, b]])?,
            Matrix::from_rows(vec![vec![label]])?,
        ));
    }

    println!("Initial predictions:");
    for (input, target) in &data {
        let pred = mlp.predict(input)?;
        println!(
            "  ({}, {}) -> {:.4}  (want {})",
            input[(0, 0)],
            input[(0, 1)],
            pred[(0, 0)],
            target[(0, 0)]
        );
    }

    mlp.train(&data, 0.2, 4000, false)?;

    println!("Trained predictions:");
    for (input, target) in &data {
        let pred = mlp.predict(input)?;
        println!(
            "  ({}, {}) -> {:.4}  (want {})",
            input[(0, 0)],
            input[(0, 1)],
            pred[(0, 0)],
            target[(0, 0)]
        );
    }
    Ok(())
}

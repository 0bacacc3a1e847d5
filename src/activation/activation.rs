/// An elementwise activation capability: a value transform and its
/// derivative, both plain `fn(f64) -> f64`.
///
/// The derivative is evaluated on **post-activation** values during the
/// backward pass, never on the pre-activation sum. That convention only
/// works for activations whose derivative can be written in terms of
/// their own output — sigmoid (`s * (1 - s)`), tanh (`1 - t^2`) and
/// identity qualify; ReLU works because the sign of its output matches
/// the sign of its input. Activations outside that family (e.g. GELU)
/// must not be plugged in here.
///
/// Activations are plain values owned outside the network; a network
/// borrows one for its whole lifetime.
#[derive(Debug, Clone, Copy)]
pub struct Activation {
    value: fn(f64) -> f64,
    derivative: fn(f64) -> f64,
}

impl Activation {
    /// Builds a capability from a value function and a derivative
    /// function. `derivative` receives the activation *output*, not the
    /// pre-activation sum; see the type-level docs for what that allows.
    pub const fn new(value: fn(f64) -> f64, derivative: fn(f64) -> f64) -> Activation {
        Activation { value, derivative }
    }

    /// Logistic sigmoid, `1 / (1 + e^-x)`.
    pub const fn sigmoid() -> Activation {
        Activation::new(sigmoid_value, sigmoid_derivative)
    }

    /// Rectified linear unit, `max(0, x)`.
    pub const fn relu() -> Activation {
        Activation::new(relu_value, relu_derivative)
    }

    /// Hyperbolic tangent.
    pub const fn tanh() -> Activation {
        Activation::new(tanh_value, tanh_derivative)
    }

    /// Pass-through; turns a layer into a purely affine transform.
    pub const fn identity() -> Activation {
        Activation::new(identity_value, identity_derivative)
    }

    /// Applies the value transform to one element.
    pub fn value(&self, x: f64) -> f64 {
        (self.value)(x)
    }

    /// Applies the derivative transform to one post-activation element.
    pub fn derivative(&self, output: f64) -> f64 {
        (self.derivative)(output)
    }
}

fn sigmoid_value(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

// `s` is the sigmoid output, not the pre-activation sum.
fn sigmoid_derivative(s: f64) -> f64 {
    s * (1.0 - s)
}

fn relu_value(x: f64) -> f64 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}

fn relu_derivative(a: f64) -> f64 {
    if a > 0.0 {
        1.0
    } else {
        0.0
    }
}

fn tanh_value(x: f64) -> f64 {
    x.tanh()
}

// `t` is the tanh output.
fn tanh_derivative(t: f64) -> f64 {
    1.0 - t * t
}

fn identity_value(x: f64) -> f64 {
    x
}

fn identity_derivative(_: f64) -> f64 {
    1.0
}

use super::activation::Activation;
use super::error::Error;
use super::group::{Groups, group_layers};
use super::layer::{Layer, Linear};
use crate::model::precision::Precision;
use ndarray::{Array1, Array2, ArrayView2, ArrayView3, Axis, s};
use rand::Rng;

/// Lifecycle of a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No layer has been added.
    Empty,
    /// Layers are being pushed; the model cannot be evaluated yet.
    Building,
    /// Structure validated and frozen; parameters may still be updated.
    Locked,
}

/// Sequential feed-forward network mapping per-atom fingerprints to per-atom
/// energy contributions.
///
/// Layers are pushed in order and then [`lock`](Model::lock)ed, which checks
/// layer placement and widths once. Only a locked model can be evaluated or
/// exported.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    descriptor_size: usize,
    precision: Precision,
    layers: Vec<Layer>,
    state: State,
}

impl Model {
    pub fn new(descriptor_size: usize) -> Self {
        Self {
            descriptor_size,
            precision: Precision::default(),
            layers: Vec::new(),
            state: State::Empty,
        }
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    #[inline]
    pub fn descriptor_size(&self) -> usize {
        self.descriptor_size
    }

    #[inline]
    pub fn precision(&self) -> Precision {
        self.precision
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.state == State::Locked
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn push_layer(&mut self, layer: Layer) -> Result<(), Error> {
        if self.state == State::Locked {
            return Err(Error::PushAfterLock);
        }
        self.layers.push(layer);
        self.state = State::Building;
        Ok(())
    }

    /// Validates the layer sequence and freezes the structure.
    pub fn lock(&mut self) -> Result<(), Error> {
        match self.state {
            State::Locked => return Err(Error::AlreadyLocked),
            State::Empty => return Err(Error::Empty),
            State::Building => {}
        }
        self.validate()?;
        self.state = State::Locked;
        Ok(())
    }

    /// Pushes every layer and locks. Must be the only way layers are added.
    pub fn add_layers(&mut self, layers: impl IntoIterator<Item = Layer>) -> Result<(), Error> {
        if self.state != State::Empty {
            return Err(Error::LayersAlreadyAdded);
        }
        for layer in layers {
            self.push_layer(layer)?;
        }
        self.lock()
    }

    fn validate(&self) -> Result<(), Error> {
        let mut width: Option<usize> = None;
        let mut last_linear = None;

        for (index, layer) in self.layers.iter().enumerate() {
            let previous = index.checked_sub(1).map(|i| &self.layers[i]);
            match layer {
                Layer::Activation(kind) => match previous {
                    None => {
                        return Err(Error::ActivationFirst {
                            index,
                            kind: kind.to_string(),
                        });
                    }
                    Some(Layer::Linear(_)) => {}
                    Some(other) => {
                        return Err(Error::MisplacedActivation {
                            index,
                            kind: kind.to_string(),
                            previous: other.to_string(),
                        });
                    }
                },
                Layer::Dropout { p } => {
                    if !(0.0..1.0).contains(p) {
                        return Err(Error::InvalidDropout { index, p: *p });
                    }
                    match previous {
                        None | Some(Layer::Activation(_)) => {}
                        Some(other) => {
                            return Err(Error::MisplacedDropout {
                                index,
                                previous: other.to_string(),
                            });
                        }
                    }
                }
                Layer::Linear(linear) => {
                    if linear.bias.len() != linear.outputs() {
                        return Err(Error::Shape {
                            index,
                            details: format!(
                                "bias has {} entries but the weight has {} rows",
                                linear.bias.len(),
                                linear.outputs()
                            ),
                        });
                    }
                    match width {
                        None if linear.inputs() != self.descriptor_size => {
                            return Err(Error::FirstLayerWidth {
                                index,
                                expected: self.descriptor_size,
                                actual: linear.inputs(),
                            });
                        }
                        Some(w) if linear.inputs() != w => {
                            return Err(Error::Shape {
                                index,
                                details: format!(
                                    "input width {} does not match the previous output width {w}",
                                    linear.inputs()
                                ),
                            });
                        }
                        _ => {}
                    }
                    width = Some(linear.outputs());
                    last_linear = Some((index, linear.outputs()));
                }
            }
        }

        match last_linear {
            None => Err(Error::NoLinearLayer),
            Some((index, actual)) if actual != 1 => Err(Error::OutputWidth { index, actual }),
            Some(_) => Ok(()),
        }
    }

    /// Splits the locked layer sequence into export groups.
    pub fn groups(&self) -> Result<Groups<'_>, Error> {
        self.ensure_locked()?;
        group_layers(&self.layers)
    }

    /// Linear layers in order.
    pub fn parameters(&self) -> impl Iterator<Item = &Linear> {
        self.layers.iter().filter_map(Layer::as_linear)
    }

    /// Mutable access to the linear layers, for an external optimizer.
    pub fn parameters_mut(&mut self) -> impl Iterator<Item = &mut Linear> {
        self.layers.iter_mut().filter_map(|layer| match layer {
            Layer::Linear(linear) => Some(linear),
            _ => None,
        })
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters().map(Linear::parameter_count).sum()
    }

    /// Activations used by the model, in layer order.
    pub fn activations(&self) -> impl Iterator<Item = Activation> + '_ {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Activation(kind) => Some(*kind),
            _ => None,
        })
    }

    /// Deterministic pass over `[rows, channels]`; dropout is the identity.
    pub fn forward(&self, input: ArrayView2<f64>) -> Result<Array2<f64>, Error> {
        self.check_input(&input)?;
        let mut x = input.to_owned();
        for layer in &self.layers {
            x = match layer {
                Layer::Linear(linear) => affine(&x, linear),
                Layer::Activation(kind) => x.mapv_into(|v| kind.apply(v)),
                Layer::Dropout { .. } => x,
            };
        }
        Ok(x)
    }

    /// Training-mode pass: every dropout layer zeroes inputs with probability
    /// `p` and scales the survivors by `1 / (1 - p)`.
    pub fn forward_stochastic<R: Rng>(
        &self,
        input: ArrayView2<f64>,
        rng: &mut R,
    ) -> Result<Array2<f64>, Error> {
        self.check_input(&input)?;
        let mut x = input.to_owned();
        for layer in &self.layers {
            x = match layer {
                Layer::Linear(linear) => affine(&x, linear),
                Layer::Activation(kind) => x.mapv_into(|v| kind.apply(v)),
                Layer::Dropout { p } if *p > 0.0 => {
                    let keep = 1.0 - p;
                    x.mapv_into(|v| if rng.random_bool(keep) { v / keep } else { 0.0 })
                }
                Layer::Dropout { .. } => x,
            };
        }
        Ok(x)
    }

    /// Total energy of one configuration: the sum of per-atom outputs.
    pub fn energy(&self, zeta: ArrayView2<f64>) -> Result<f64, Error> {
        Ok(self.forward(zeta)?.sum())
    }

    /// Gradient of the summed output with respect to every input entry.
    pub fn input_gradient(&self, input: ArrayView2<f64>) -> Result<Array2<f64>, Error> {
        self.check_input(&input)?;

        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut x = input.to_owned();
        for layer in &self.layers {
            let next = match layer {
                Layer::Linear(linear) => affine(&x, linear),
                Layer::Activation(kind) => x.mapv(|v| kind.apply(v)),
                Layer::Dropout { .. } => x.clone(),
            };
            inputs.push(x);
            x = next;
        }

        let mut grad = Array2::<f64>::ones(x.raw_dim());
        for (layer, layer_input) in self.layers.iter().zip(&inputs).rev() {
            grad = match layer {
                Layer::Linear(linear) => grad.dot(&linear.weight),
                Layer::Activation(kind) => {
                    grad.zip_mut_with(layer_input, |g, &v| *g *= kind.derivative(v));
                    grad
                }
                Layer::Dropout { .. } => grad,
            };
        }
        Ok(grad)
    }

    /// Forces `-dE/dr`, flattened `[x0, y0, z0, x1, ...]`.
    ///
    /// `dzeta_dr` must have shape `[atoms, channels, atoms * 3]` matching `zeta`.
    pub fn forces(
        &self,
        zeta: ArrayView2<f64>,
        dzeta_dr: ArrayView3<f64>,
    ) -> Result<Array1<f64>, Error> {
        let (atoms, channels, dof) = dzeta_dr.dim();
        if (atoms, channels) != zeta.dim() {
            return Err(Error::InputWidth {
                expected: zeta.ncols(),
                actual: channels,
            });
        }

        let grad = self.input_gradient(zeta)?;
        let mut forces = Array1::zeros(dof);
        for ((i, c), &g) in grad.indexed_iter() {
            if g != 0.0 {
                forces.scaled_add(-g, &dzeta_dr.slice(s![i, c, ..]));
            }
        }
        Ok(forces)
    }

    fn ensure_locked(&self) -> Result<(), Error> {
        if self.is_locked() {
            Ok(())
        } else {
            Err(Error::NotLocked)
        }
    }

    fn check_input(&self, input: &ArrayView2<f64>) -> Result<(), Error> {
        self.ensure_locked()?;
        if input.ncols() != self.descriptor_size {
            return Err(Error::InputWidth {
                expected: self.descriptor_size,
                actual: input.ncols(),
            });
        }
        Ok(())
    }
}

fn affine(x: &Array2<f64>, linear: &Linear) -> Array2<f64> {
    let mut y = x.dot(&linear.weight.t());
    y += &linear.bias.view().insert_axis(Axis(0));
    y
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array, Array3, array};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng() -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(35)
    }

    fn small_model(descriptor_size: usize) -> Model {
        let mut rng = rng();
        let mut model = Model::new(descriptor_size);
        model
            .add_layers([
                Layer::linear(descriptor_size, 5, &mut rng),
                Layer::activation(Activation::Tanh),
                Layer::linear(5, 1, &mut rng),
            ])
            .expect("valid model");
        model
    }

    #[test]
    fn lifecycle_moves_from_empty_to_locked() {
        let mut rng = rng();
        let mut model = Model::new(3);
        assert_eq!(model.state(), State::Empty);
        model.push_layer(Layer::linear(3, 1, &mut rng)).unwrap();
        assert_eq!(model.state(), State::Building);
        model.lock().unwrap();
        assert!(model.is_locked());
    }

    #[test]
    fn locking_with_wrong_input_width_fails() {
        let mut rng = rng();
        let mut model = Model::new(10);
        model.push_layer(Layer::linear(8, 1, &mut rng)).unwrap();
        assert_eq!(
            model.lock(),
            Err(Error::FirstLayerWidth {
                index: 0,
                expected: 10,
                actual: 8
            })
        );
        assert!(!model.is_locked());
    }

    #[test]
    fn locking_twice_fails() {
        let mut model = small_model(4);
        assert_eq!(model.lock(), Err(Error::AlreadyLocked));
    }

    #[test]
    fn push_after_lock_fails() {
        let mut model = small_model(4);
        assert_eq!(
            model.push_layer(Layer::dropout(0.1)),
            Err(Error::PushAfterLock)
        );
    }

    #[test]
    fn add_layers_twice_fails() {
        let mut rng = rng();
        let mut model = small_model(4);
        let err = model
            .add_layers([Layer::linear(4, 1, &mut rng)])
            .unwrap_err();
        assert_eq!(err, Error::LayersAlreadyAdded);
    }

    #[test]
    fn locking_empty_model_fails() {
        assert_eq!(Model::new(2).lock(), Err(Error::Empty));
    }

    #[test]
    fn output_width_must_be_one() {
        let mut rng = rng();
        let mut model = Model::new(3);
        let err = model
            .add_layers([Layer::linear(3, 2, &mut rng)])
            .unwrap_err();
        assert_eq!(err, Error::OutputWidth { index: 0, actual: 2 });
    }

    #[test]
    fn widths_must_chain() {
        let mut rng = rng();
        let mut model = Model::new(3);
        let err = model
            .add_layers([
                Layer::linear(3, 4, &mut rng),
                Layer::activation(Activation::Sigmoid),
                Layer::linear(5, 1, &mut rng),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::Shape { index: 2, .. }));
    }

    #[test]
    fn activation_placement_is_checked() {
        let mut rng = rng();
        let mut model = Model::new(3);
        let err = model
            .add_layers([
                Layer::activation(Activation::Relu),
                Layer::linear(3, 1, &mut rng),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::ActivationFirst { index: 0, .. }));

        let mut model = Model::new(3);
        let err = model
            .add_layers([
                Layer::linear(3, 2, &mut rng),
                Layer::activation(Activation::Relu),
                Layer::activation(Activation::Tanh),
                Layer::linear(2, 1, &mut rng),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::MisplacedActivation { index: 2, .. }));
    }

    #[test]
    fn dropout_placement_is_checked() {
        let mut rng = rng();
        let mut model = Model::new(3);
        let err = model
            .add_layers([
                Layer::linear(3, 2, &mut rng),
                Layer::dropout(0.2),
                Layer::linear(2, 1, &mut rng),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::MisplacedDropout { index: 1, .. }));

        let mut model = Model::new(3);
        let err = model
            .add_layers([Layer::dropout(1.0), Layer::linear(3, 1, &mut rng)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDropout { index: 0, .. }));
    }

    #[test]
    fn forward_requires_lock_and_matching_width() {
        let mut rng = rng();
        let mut model = Model::new(2);
        model.push_layer(Layer::linear(2, 1, &mut rng)).unwrap();
        let x = Array2::<f64>::zeros((1, 2));
        assert_eq!(model.forward(x.view()), Err(Error::NotLocked));

        model.lock().unwrap();
        let wide = Array2::<f64>::zeros((1, 3));
        assert_eq!(
            model.forward(wide.view()),
            Err(Error::InputWidth {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn forward_computes_affine_and_activation() {
        let mut model = Model::new(2);
        model
            .add_layers([
                Layer::Linear(Linear {
                    weight: array![[1.0, 2.0], [0.0, -1.0]],
                    bias: array![0.5, 0.0],
                }),
                Layer::activation(Activation::Relu),
                Layer::Linear(Linear {
                    weight: array![[1.0, 10.0]],
                    bias: array![-1.0],
                }),
            ])
            .unwrap();
        let out = model.forward(array![[1.0, 1.0], [1.0, -2.0]].view()).unwrap();
        // row 0: hidden = relu([3.5, -1]) = [3.5, 0] -> 2.5
        // row 1: hidden = relu([-2.5, 2]) = [0, 2] -> 19
        assert_eq!(out, array![[2.5], [19.0]]);
        assert_eq!(model.energy(array![[1.0, 1.0], [1.0, -2.0]].view()).unwrap(), 21.5);
    }

    #[test]
    fn dropout_is_identity_in_deterministic_pass() {
        let mut rng = rng();
        let mut with_dropout = Model::new(3);
        let first = Layer::linear(3, 4, &mut rng);
        let last = Layer::linear(4, 1, &mut rng);
        with_dropout
            .add_layers([
                Layer::dropout(0.3),
                first.clone(),
                Layer::activation(Activation::Sigmoid),
                Layer::dropout(0.5),
                last.clone(),
            ])
            .unwrap();
        let mut plain = Model::new(3);
        plain
            .add_layers([first, Layer::activation(Activation::Sigmoid), last])
            .unwrap();

        let x = array![[0.1, -0.4, 0.9]];
        assert_eq!(
            with_dropout.forward(x.view()).unwrap(),
            plain.forward(x.view()).unwrap()
        );
        let stochastic = with_dropout.forward_stochastic(x.view(), &mut rng).unwrap();
        assert_eq!(stochastic.dim(), (1, 1));
    }

    #[test]
    fn parameter_traversal_counts_every_linear_layer() {
        let model = small_model(4);
        assert_eq!(model.parameters().count(), 2);
        assert_eq!(model.parameter_count(), 4 * 5 + 5 + 5 + 1);
        assert_eq!(model.activations().collect::<Vec<_>>(), vec![Activation::Tanh]);
    }

    #[test]
    fn input_gradient_matches_finite_differences() {
        let model = small_model(3);
        let x = array![[0.2, -0.7, 1.1], [0.5, 0.3, -0.2]];
        let grad = model.input_gradient(x.view()).unwrap();
        let h = 1e-6;
        for i in 0..2 {
            for c in 0..3 {
                let mut plus = x.clone();
                plus[[i, c]] += h;
                let mut minus = x.clone();
                minus[[i, c]] -= h;
                let numeric = (model.energy(plus.view()).unwrap()
                    - model.energy(minus.view()).unwrap())
                    / (2.0 * h);
                assert_relative_eq!(grad[[i, c]], numeric, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn forces_contract_gradient_with_fingerprint_derivatives() {
        let model = small_model(2);
        let zeta = array![[0.3, -0.1], [0.8, 0.4]];
        let dzeta = Array::from_shape_fn((2, 2, 6), |(i, c, k)| {
            ((i + 1) * (c + 2)) as f64 * 0.1 - k as f64 * 0.05
        });
        let grad = model.input_gradient(zeta.view()).unwrap();
        let forces = model.forces(zeta.view(), dzeta.view()).unwrap();
        for k in 0..6 {
            let mut expected = 0.0;
            for i in 0..2 {
                for c in 0..2 {
                    expected -= grad[[i, c]] * dzeta[[i, c, k]];
                }
            }
            assert_relative_eq!(forces[k], expected, epsilon = 1e-12);
        }

        let bad = Array3::<f64>::zeros((2, 3, 6));
        assert!(model.forces(zeta.view(), bad.view()).is_err());
    }
}

//! Grouping of a layer sequence into the units the exported format stores.
//!
//! Every linear layer opens a new group. Group 0 holds what precedes the first
//! linear layer and may only be empty or a single dropout. Each middle group
//! is `linear, activation [, dropout]`, and the last group is exactly one
//! linear layer of output width 1.

use super::activation::Activation;
use super::error::Error;
use super::layer::{Layer, Linear};

/// A `linear, activation [, dropout]` group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HiddenGroup<'a> {
    pub linear: &'a Linear,
    pub activation: Activation,
    pub dropout: Option<f64>,
}

/// The grouped view of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Groups<'a> {
    pub input_dropout: Option<f64>,
    pub hidden: Vec<HiddenGroup<'a>>,
    pub output: &'a Linear,
}

impl Groups<'_> {
    /// Linear layers in order, hidden groups first.
    pub fn linears(&self) -> impl Iterator<Item = &Linear> {
        self.hidden
            .iter()
            .map(|g| g.linear)
            .chain(std::iter::once(self.output))
    }

    /// Retention probability of the input to each linear layer.
    pub fn keep_probabilities(&self) -> Vec<f64> {
        std::iter::once(self.input_dropout)
            .chain(self.hidden.iter().map(|g| g.dropout))
            .map(|p| 1.0 - p.unwrap_or(0.0))
            .collect()
    }

    /// Input width of each linear layer followed by the output width of the
    /// last one.
    pub fn unit_counts(&self) -> Vec<usize> {
        let mut units: Vec<usize> = self.linears().map(Linear::inputs).collect();
        units.push(self.output.outputs());
        units
    }
}

/// Splits `layers` into groups, rejecting layouts the exported format cannot
/// represent.
pub fn group_layers(layers: &[Layer]) -> Result<Groups<'_>, Error> {
    let mut raw: Vec<Vec<&Layer>> = vec![Vec::new()];
    for layer in layers {
        if matches!(layer, Layer::Linear(_)) {
            raw.push(Vec::new());
        }
        if let Some(current) = raw.last_mut() {
            current.push(layer);
        }
    }

    if raw.len() < 2 {
        return Err(Error::NoLinearLayer);
    }
    let last = raw.len() - 1;

    let input_dropout = match raw[0].as_slice() {
        [] => None,
        [Layer::Dropout { p }] => Some(*p),
        other => {
            return Err(Error::group(
                0,
                format!(
                    "only a single dropout may precede the first linear layer, found {}",
                    describe(other)
                ),
            ));
        }
    };

    let mut hidden = Vec::with_capacity(last.saturating_sub(1));
    for (group, members) in raw.iter().enumerate().take(last).skip(1) {
        let parsed = match members.as_slice() {
            [Layer::Linear(linear), Layer::Activation(activation)] => HiddenGroup {
                linear,
                activation: *activation,
                dropout: None,
            },
            [
                Layer::Linear(linear),
                Layer::Activation(activation),
                Layer::Dropout { p },
            ] => HiddenGroup {
                linear,
                activation: *activation,
                dropout: Some(*p),
            },
            [Layer::Linear(_)] => {
                return Err(Error::group(
                    group,
                    "hidden linear layer is not followed by an activation",
                ));
            }
            other => {
                return Err(Error::group(
                    group,
                    format!(
                        "expected linear, activation and optional dropout, found {}",
                        describe(other)
                    ),
                ));
            }
        };
        hidden.push(parsed);
    }

    let output = match raw[last].as_slice() {
        [Layer::Linear(linear)] if linear.outputs() == 1 => linear,
        [Layer::Linear(linear)] => {
            return Err(Error::group(
                last,
                format!(
                    "output layer must have width 1, found {}",
                    linear.outputs()
                ),
            ));
        }
        other => {
            return Err(Error::group(
                last,
                format!(
                    "the last group must be a single linear layer, found {}",
                    describe(other)
                ),
            ));
        }
    };

    Ok(Groups {
        input_dropout,
        hidden,
        output,
    })
}

fn describe(layers: &[&Layer]) -> String {
    let names: Vec<String> = layers.iter().map(|l| l.to_string()).collect();
    format!("[{}]", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn rng() -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(3)
    }

    #[test]
    fn plain_network_has_no_dropout() {
        let mut rng = rng();
        let layers = vec![
            Layer::linear(10, 5, &mut rng),
            Layer::activation(Activation::Sigmoid),
            Layer::linear(5, 1, &mut rng),
        ];
        let groups = group_layers(&layers).unwrap();
        assert_eq!(groups.input_dropout, None);
        assert_eq!(groups.hidden.len(), 1);
        assert_eq!(groups.hidden[0].activation, Activation::Sigmoid);
        assert_eq!(groups.keep_probabilities(), vec![1.0, 1.0]);
        assert_eq!(groups.unit_counts(), vec![10, 5, 1]);
        assert_eq!(groups.linears().count(), 2);
    }

    #[test]
    fn dropout_rates_become_keep_probabilities() {
        let mut rng = rng();
        let layers = vec![
            Layer::dropout(0.2),
            Layer::linear(10, 5, &mut rng),
            Layer::activation(Activation::Sigmoid),
            Layer::dropout(0.3),
            Layer::linear(5, 1, &mut rng),
        ];
        let groups = group_layers(&layers).unwrap();
        assert_eq!(groups.input_dropout, Some(0.2));
        assert_eq!(groups.hidden[0].dropout, Some(0.3));
        let keep = groups.keep_probabilities();
        assert!((keep[0] - 0.8).abs() < 1e-12);
        assert!((keep[1] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn adjacent_linear_layers_are_rejected() {
        let mut rng = rng();
        let layers = vec![
            Layer::linear(10, 5, &mut rng),
            Layer::linear(5, 1, &mut rng),
        ];
        let err = group_layers(&layers).unwrap_err();
        assert!(matches!(err, Error::GroupLayout { group: 1, .. }));
    }

    #[test]
    fn trailing_activation_is_rejected() {
        let mut rng = rng();
        let layers = vec![
            Layer::linear(4, 1, &mut rng),
            Layer::activation(Activation::Tanh),
        ];
        let err = group_layers(&layers).unwrap_err();
        assert!(matches!(err, Error::GroupLayout { group: 1, .. }));
    }

    #[test]
    fn layers_without_linear_are_rejected() {
        assert_eq!(
            group_layers(&[Layer::dropout(0.1)]).unwrap_err(),
            Error::NoLinearLayer
        );
    }
}

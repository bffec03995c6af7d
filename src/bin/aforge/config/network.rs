use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use ann_forge::{Activation, Layer, Model, Precision};

use crate::cli::NetworkOptions;

/// Builds and locks `[dropout] (linear, activation [, dropout])* linear` with
/// randomly initialized weights.
pub fn build_model(descriptor_size: usize, opts: &NetworkOptions) -> Result<Model> {
    if opts.hidden.is_empty() {
        bail!("At least one hidden layer is required (--hidden)");
    }
    if let Some(&width) = opts.hidden.iter().find(|&&w| w == 0) {
        bail!("Hidden layer width must be positive, got {}", width);
    }

    let seed = opts.seed.unwrap_or_else(rand::random);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let activation: Activation = opts.activation.into();

    let mut layers = Vec::with_capacity(opts.hidden.len() * 3 + 2);
    if let Some(p) = opts.input_dropout {
        layers.push(Layer::dropout(p));
    }
    let mut width = descriptor_size;
    for &next in &opts.hidden {
        layers.push(Layer::linear(width, next, &mut rng));
        layers.push(Layer::activation(activation));
        if let Some(p) = opts.dropout {
            layers.push(Layer::dropout(p));
        }
        width = next;
    }
    layers.push(Layer::linear(width, 1, &mut rng));

    let precision: Precision = opts.precision.into();
    let mut model = Model::new(descriptor_size).with_precision(precision);
    model
        .add_layers(layers)
        .context("Failed to assemble the network")?;
    log::info!("initialized {} parameters with seed {}", model.parameter_count(), seed);
    Ok(model)
}

//! Export of a trained model as a KIM neural-network model directory.
//!
//! [`export`] writes four files into the output directory:
//!
//! - `descriptor.params` – descriptor hyperparameters and normalization statistics
//! - `NN.params` – layer sizes, activation, keep probabilities, weights and biases
//! - `dropout_binary.params` – pre-sampled dropout masks
//! - `CMakeLists.txt` – the KIM API build descriptor naming the files above
//!
//! Every structural check runs and every file is rendered in memory before the
//! directory is touched, so a rejected model leaves nothing behind.

use crate::descriptor::Descriptor;
use crate::network::{Activation, Groups, Model};
use crate::normalize::Normalization;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fs;
use std::path::{Path, PathBuf};

mod cmake;
mod dropout;
mod error;
mod nn;

pub use error::Error;

pub const DESCRIPTOR_FILE: &str = "descriptor.params";
pub const NETWORK_FILE: &str = "NN.params";
pub const DROPOUT_FILE: &str = "dropout_binary.params";
pub const CMAKE_FILE: &str = "CMakeLists.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub model_name: String,
    pub driver_name: String,
    /// Parameter format version recorded in the build descriptor.
    pub version: String,
    /// Number of dropout mask instances; 0 disables dropout in the driver.
    pub dropout_repeat: usize,
    /// Seed for the dropout masks; `None` draws one from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            model_name: "NeuralNetwork_ANNFORGE__MO_000000111111_000".to_string(),
            driver_name: "dNN_WT__MD_000000111111_000".to_string(),
            version: "2.0.2".to_string(),
            dropout_repeat: 50,
            seed: None,
        }
    }
}

/// Rendered content of every exported file.
struct Rendered {
    files: Vec<(&'static str, String)>,
}

/// Writes the model directory and returns its path.
pub fn export<D: Descriptor + ?Sized>(
    model: &Model,
    descriptor: &D,
    normalization: &Normalization,
    output_dir: &Path,
    options: &ExportOptions,
) -> Result<PathBuf, Error> {
    let rendered = render(model, descriptor, normalization, options)?;

    fs::create_dir_all(output_dir).map_err(|source| Error::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;
    for (name, content) in &rendered.files {
        let path = output_dir.join(name);
        fs::write(&path, content).map_err(|source| Error::Write { path, source })?;
    }

    log::info!(
        "exported model '{}' ({} parameters) to {}",
        options.model_name,
        model.parameter_count(),
        output_dir.display()
    );
    Ok(output_dir.to_path_buf())
}

fn render<D: Descriptor + ?Sized>(
    model: &Model,
    descriptor: &D,
    normalization: &Normalization,
    options: &ExportOptions,
) -> Result<Rendered, Error> {
    let groups = model.groups()?;
    let activation = uniform_activation(&groups)?;

    if descriptor.channel_count() != model.descriptor_size() {
        return Err(Error::DescriptorMismatch {
            model: model.descriptor_size(),
            descriptor: descriptor.channel_count(),
        });
    }
    if let Some(stats) = normalization.stats() {
        if stats.channel_count() != model.descriptor_size() {
            return Err(Error::ChannelMismatch {
                expected: model.descriptor_size(),
                actual: stats.channel_count(),
            });
        }
    }

    let precision = model.precision();
    let mut descriptor_params = Vec::new();
    descriptor
        .write_kim_params(&mut descriptor_params, normalization, precision)
        .map_err(Error::Render)?;
    let descriptor_params = String::from_utf8_lossy(&descriptor_params).into_owned();

    let network_params = nn::render(&groups, activation, precision)?;

    let mut rng = match options.seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::seed_from_u64(rand::random()),
    };
    let dropout_params = dropout::render(
        options.dropout_repeat,
        &groups.keep_probabilities(),
        &groups.unit_counts(),
        &mut rng,
    )?;

    let cmake = cmake::render(
        &options.model_name,
        &options.driver_name,
        &options.version,
        &[DESCRIPTOR_FILE, NETWORK_FILE, DROPOUT_FILE],
    )?;

    Ok(Rendered {
        files: vec![
            (CMAKE_FILE, cmake),
            (NETWORK_FILE, network_params),
            (DESCRIPTOR_FILE, descriptor_params),
            (DROPOUT_FILE, dropout_params),
        ],
    })
}

/// The single activation shared by every hidden group.
fn uniform_activation(groups: &Groups<'_>) -> Result<Activation, Error> {
    let mut chosen: Option<Activation> = None;
    for (offset, group) in groups.hidden.iter().enumerate() {
        let index = offset + 1;
        if !group.activation.is_exportable() {
            return Err(Error::UnsupportedActivation {
                group: index,
                activation: group.activation.to_string(),
            });
        }
        match chosen {
            None => chosen = Some(group.activation),
            Some(first) if first != group.activation => {
                return Err(Error::MixedActivations {
                    group: index,
                    first: first.to_string(),
                    found: group.activation.to_string(),
                });
            }
            Some(_) => {}
        }
    }
    chosen.ok_or(Error::NoHiddenLayer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CutoffKind, DescriptorConfig, FunctionSet, G2Params, SymmetryFunctions};
    use crate::model::precision::Precision;
    use crate::network::{Layer, Linear};
    use crate::normalize::NormStats;
    use ndarray::{Array1, Array2};
    use tempfile::tempdir;

    fn descriptor(channels: usize) -> SymmetryFunctions {
        let mut config = DescriptorConfig::with_cutoffs(CutoffKind::Cos, [("Si-Si", 3.77)]);
        config.functions = FunctionSet {
            g2: (0..channels)
                .map(|i| G2Params {
                    eta: 0.01 * (i + 1) as f64,
                    rs: 0.0,
                })
                .collect(),
            ..FunctionSet::default()
        };
        SymmetryFunctions::new(config).unwrap()
    }

    fn linear(inputs: usize, outputs: usize) -> Layer {
        Layer::Linear(Linear {
            weight: Array2::from_shape_fn((outputs, inputs), |(o, i)| {
                0.01 * (o * inputs + i) as f64
            }),
            bias: Array1::from_shape_fn(outputs, |o| -0.5 * o as f64),
        })
    }

    fn locked(layers: Vec<Layer>) -> Model {
        let mut model = Model::new(10);
        model.add_layers(layers).unwrap();
        model
    }

    fn options() -> ExportOptions {
        ExportOptions {
            seed: Some(35),
            ..ExportOptions::default()
        }
    }

    fn read(dir: &Path, name: &str) -> String {
        fs::read_to_string(dir.join(name)).unwrap()
    }

    /// Data lines (comments and blanks removed) of a parameter file.
    fn data_lines(text: &str) -> Vec<String> {
        text.lines()
            .map(|l| l.split('#').next().unwrap_or("").trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    #[test]
    fn exports_plain_sigmoid_network() {
        let model = locked(vec![
            linear(10, 5),
            Layer::activation(Activation::Sigmoid),
            linear(5, 1),
        ]);
        let dir = tempdir().unwrap();
        let out = dir.path().join("model");
        export(&model, &descriptor(10), &Normalization::Disabled, &out, &options()).unwrap();

        let nn = read(&out, NETWORK_FILE);
        let data = data_lines(&nn);
        assert_eq!(data[0], "2");
        assert_eq!(data[1], "5  1");
        assert_eq!(data[2], "sigmoid");
        assert_eq!(data[3], "1  1");
        assert_eq!(nn.matches("# weight of").count(), 2);
        assert_eq!(nn.matches("# bias of").count(), 2);
        assert!(nn.contains("# weight of hidden layer 1,  shape(10, 5)"));
        assert!(nn.contains("# weight of output layer, shape(5, 1)"));

        // Transposed weights: 10 rows of 5 values, then the bias row.
        let weight_rows = &data[4..14];
        assert!(weight_rows.iter().all(|r| r.split_whitespace().count() == 5));
        // Row 1 of the transposed matrix holds weight[o][1] = 0.01 * (10 o + 1).
        let row1: Vec<f64> = weight_rows[1]
            .split_whitespace()
            .map(|v| v.parse().unwrap())
            .collect();
        assert!((row1[2] - 0.21).abs() < 1e-15);
        assert!(nn.contains("  1.000000000000000e-02"));

        for name in [CMAKE_FILE, DESCRIPTOR_FILE, DROPOUT_FILE] {
            assert!(out.join(name).is_file(), "{name} missing");
        }
    }

    #[test]
    fn exports_dropout_keep_probabilities_and_masks() {
        let model = locked(vec![
            Layer::dropout(0.2),
            linear(10, 5),
            Layer::activation(Activation::Sigmoid),
            Layer::dropout(0.3),
            linear(5, 1),
        ]);
        let dir = tempdir().unwrap();
        export(&model, &descriptor(10), &Normalization::Disabled, dir.path(), &options()).unwrap();

        let data = data_lines(&read(dir.path(), NETWORK_FILE));
        assert_eq!(data[3], "0.8  0.7");

        let masks = data_lines(&read(dir.path(), DROPOUT_FILE));
        assert_eq!(masks[0], "50");
        let rows = &masks[1..];
        assert_eq!(rows.len(), 100);
        for (i, row) in rows.iter().enumerate() {
            let entries: Vec<&str> = row.split_whitespace().collect();
            assert_eq!(entries.len(), if i % 2 == 0 { 10 } else { 5 });
            assert!(entries.iter().all(|e| *e == "0" || *e == "1"));
        }
    }

    #[test]
    fn same_seed_gives_same_masks() {
        let model = locked(vec![
            Layer::dropout(0.5),
            linear(10, 5),
            Layer::activation(Activation::Tanh),
            linear(5, 1),
        ]);
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let desc = descriptor(10);
        export(&model, &desc, &Normalization::Disabled, a.path(), &options()).unwrap();
        export(&model, &desc, &Normalization::Disabled, b.path(), &options()).unwrap();
        assert_eq!(read(a.path(), DROPOUT_FILE), read(b.path(), DROPOUT_FILE));
    }

    #[test]
    fn adjacent_linear_layers_fail_and_write_nothing() {
        let mut model = Model::new(10);
        model.add_layers(vec![linear(10, 5), linear(5, 1)]).unwrap();
        let dir = tempdir().unwrap();
        let out = dir.path().join("model");

        let err = export(&model, &descriptor(10), &Normalization::Disabled, &out, &options())
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(!out.exists());
    }

    #[test]
    fn mixed_activations_are_rejected() {
        let model = locked(vec![
            linear(10, 5),
            Layer::activation(Activation::Tanh),
            linear(5, 3),
            Layer::activation(Activation::Relu),
            linear(3, 1),
        ]);
        let dir = tempdir().unwrap();
        let err = export(&model, &descriptor(10), &Normalization::Disabled, dir.path(), &options())
            .unwrap_err();
        assert!(matches!(err, Error::MixedActivations { group: 2, .. }));
        assert!(!dir.path().join(NETWORK_FILE).exists());
    }

    #[test]
    fn non_exportable_activation_is_rejected() {
        let model = locked(vec![
            linear(10, 5),
            Layer::activation(Activation::Softplus),
            linear(5, 1),
        ]);
        let dir = tempdir().unwrap();
        let err = export(&model, &descriptor(10), &Normalization::Disabled, dir.path(), &options())
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedActivation { group: 1, .. }));
    }

    #[test]
    fn unlocked_model_is_rejected() {
        let mut model = Model::new(10);
        model.push_layer(linear(10, 1)).unwrap();
        let dir = tempdir().unwrap();
        let err = export(&model, &descriptor(10), &Normalization::Disabled, dir.path(), &options())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Network(crate::network::Error::NotLocked)
        ));
    }

    #[test]
    fn descriptor_and_statistics_must_match_the_model() {
        let model = locked(vec![
            linear(10, 5),
            Layer::activation(Activation::Sigmoid),
            linear(5, 1),
        ]);
        let dir = tempdir().unwrap();
        let err = export(&model, &descriptor(8), &Normalization::Disabled, dir.path(), &options())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DescriptorMismatch {
                model: 10,
                descriptor: 8
            }
        ));

        let stats = Normalization::Stats(NormStats::new(Array1::zeros(4), Array1::ones(4)));
        let err = export(&model, &descriptor(10), &stats, dir.path(), &options()).unwrap_err();
        assert!(matches!(
            err,
            Error::ChannelMismatch {
                expected: 10,
                actual: 4
            }
        ));
    }

    #[test]
    fn single_precision_uses_short_fields() {
        let mut model = Model::new(10).with_precision(Precision::Single);
        model
            .add_layers(vec![
                linear(10, 5),
                Layer::activation(Activation::Elu),
                linear(5, 1),
            ])
            .unwrap();
        let dir = tempdir().unwrap();
        export(&model, &descriptor(10), &Normalization::Disabled, dir.path(), &options()).unwrap();
        let nn = read(dir.path(), NETWORK_FILE);
        assert!(nn.contains("  1.0000000e-02"));
        assert!(!nn.contains("1.000000000000000e-02"));
    }

    #[test]
    fn cmake_names_model_driver_and_parameter_files() {
        let model = locked(vec![
            linear(10, 5),
            Layer::activation(Activation::Relu),
            linear(5, 1),
        ]);
        let dir = tempdir().unwrap();
        let opts = ExportOptions {
            model_name: "MyModel__MO_000000000000_000".into(),
            ..options()
        };
        export(&model, &descriptor(10), &Normalization::Disabled, dir.path(), &opts).unwrap();
        let cmake = read(dir.path(), CMAKE_FILE);
        assert!(cmake.contains("NAME            \"MyModel__MO_000000000000_000\""));
        assert!(cmake.contains("DRIVER_NAME     \"dNN_WT__MD_000000111111_000\""));
        assert!(cmake.contains(
            "PARAMETER_FILES \"descriptor.params\" \"NN.params\" \"dropout_binary.params\""
        ));
        assert!(cmake.contains("2.0.2"));
    }

    #[test]
    fn zero_repeat_writes_no_mask_instances() {
        let model = locked(vec![
            linear(10, 5),
            Layer::activation(Activation::Sigmoid),
            linear(5, 1),
        ]);
        let dir = tempdir().unwrap();
        let opts = ExportOptions {
            dropout_repeat: 0,
            ..options()
        };
        export(&model, &descriptor(10), &Normalization::Disabled, dir.path(), &opts).unwrap();
        let masks = data_lines(&read(dir.path(), DROPOUT_FILE));
        assert_eq!(masks, vec!["0".to_string()]);
    }
}

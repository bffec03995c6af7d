//! Dataset preprocessing.
//!
//! [`preprocess`] splits a dataset into training and validation sets, computes
//! normalization statistics on the training set only, persists them next to
//! the data, and serializes every normalized configuration as a record.
//! [`preprocess_test_set`] later reuses the persisted statistics for a test
//! set so that all splits share one normalization.

use crate::descriptor::Descriptor;
use crate::io::{
    norm,
    record::{Record, RecordWriter},
};
use crate::model::{configuration::Configuration, fingerprint::Fingerprint, precision::Precision};
use crate::normalize::Normalization;
use crate::stats::{self, StatsStrategy};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

mod error;

pub use error::Error;

pub const TRAIN_FILE: &str = "train.records";
pub const VALIDATION_FILE: &str = "validation.records";
pub const TEST_FILE: &str = "test.records";

#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    /// Number of configurations held out for validation; 0 keeps all for training.
    pub validation_size: usize,
    /// Center and scale fingerprints with the training-set statistics.
    pub normalize: bool,
    /// Shuffle before splitting.
    pub shuffle: bool,
    /// Seed for the shuffle; `None` draws one from the thread RNG.
    pub seed: Option<u64>,
    pub strategy: StatsStrategy,
    pub precision: Precision,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            validation_size: 0,
            normalize: true,
            shuffle: true,
            seed: None,
            strategy: StatsStrategy::default(),
            precision: Precision::default(),
        }
    }
}

/// What [`preprocess`] wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessSummary {
    pub train_path: PathBuf,
    pub train_count: usize,
    pub validation_path: Option<PathBuf>,
    pub validation_count: usize,
    pub normalization_path: PathBuf,
    pub normalization: Normalization,
}

pub fn preprocess<D: Descriptor + ?Sized>(
    configs: &[Configuration],
    descriptor: &D,
    output_dir: &Path,
    config: &PreprocessConfig,
) -> Result<PreprocessSummary, Error> {
    if configs.is_empty() {
        return Err(Error::EmptyDataset);
    }
    if config.validation_size > configs.len() {
        return Err(Error::ValidationTooLarge {
            validation: config.validation_size,
            dataset: configs.len(),
        });
    }

    let mut indices: Vec<usize> = (0..configs.len()).collect();
    if config.shuffle {
        let mut rng = match config.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::seed_from_u64(rand::random()),
        };
        indices.shuffle(&mut rng);
    }
    let train_size = configs.len() - config.validation_size;
    let train: Vec<Configuration> = indices[..train_size]
        .iter()
        .map(|&i| configs[i].clone())
        .collect();
    let validation: Vec<Configuration> = indices[train_size..]
        .iter()
        .map(|&i| configs[i].clone())
        .collect();
    log::info!(
        "dataset split: {} training, {} validation configurations",
        train.len(),
        validation.len()
    );

    fs::create_dir_all(output_dir).map_err(|e| Error::file(output_dir, e))?;

    let (normalization, cached) = if config.normalize {
        log::info!("computing normalization statistics ({:?})", config.strategy);
        let (stats, fingerprints) = stats::mean_and_std(&train, descriptor, config.strategy)?;
        (Normalization::Stats(stats), fingerprints)
    } else {
        (Normalization::Disabled, None)
    };

    let normalization_path = output_dir.join(norm::FILE_NAME);
    let file = File::create(&normalization_path).map_err(|e| Error::file(&normalization_path, e))?;
    let mut norm_writer = BufWriter::new(file);
    norm::write(&mut norm_writer, &normalization)?;
    norm_writer
        .flush()
        .map_err(|e| Error::file(&normalization_path, e))?;

    let train_path = output_dir.join(TRAIN_FILE);
    log::info!("writing training records to {}", train_path.display());
    write_records(
        &train_path,
        &train,
        descriptor,
        &normalization,
        config.precision,
        cached,
    )?;

    let validation_path = if validation.is_empty() {
        None
    } else {
        let path = output_dir.join(VALIDATION_FILE);
        log::info!("writing validation records to {}", path.display());
        write_records(
            &path,
            &validation,
            descriptor,
            &normalization,
            config.precision,
            None,
        )?;
        Some(path)
    };

    Ok(PreprocessSummary {
        train_path,
        train_count: train.len(),
        validation_path,
        validation_count: validation.len(),
        normalization_path,
        normalization,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestSetConfig {
    /// Apply the statistics persisted by [`preprocess`] in the same directory.
    pub normalize: bool,
    pub precision: Precision,
}

impl Default for TestSetConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            precision: Precision::default(),
        }
    }
}

/// Serializes a test set with the training statistics found in `dir`.
pub fn preprocess_test_set<D: Descriptor + ?Sized>(
    configs: &[Configuration],
    descriptor: &D,
    dir: &Path,
    config: &TestSetConfig,
) -> Result<PathBuf, Error> {
    if configs.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let normalization = if config.normalize {
        let path = dir.join(norm::FILE_NAME);
        if !path.is_file() {
            return Err(Error::MissingNormalization { path });
        }
        let file = File::open(&path).map_err(|e| Error::file(&path, e))?;
        norm::read_checked(BufReader::new(file), descriptor.channel_count())?
    } else {
        Normalization::Disabled
    };

    fs::create_dir_all(dir).map_err(|e| Error::file(dir, e))?;
    let path = dir.join(TEST_FILE);
    log::info!("writing test records to {}", path.display());
    write_records(
        &path,
        configs,
        descriptor,
        &normalization,
        config.precision,
        None,
    )?;
    Ok(path)
}

fn write_records<D: Descriptor + ?Sized>(
    path: &Path,
    configs: &[Configuration],
    descriptor: &D,
    normalization: &Normalization,
    precision: Precision,
    cached: Option<Vec<Fingerprint>>,
) -> Result<(), Error> {
    let file = File::create(path).map_err(|e| Error::file(path, e))?;
    let mut writer = RecordWriter::new(BufWriter::new(file), precision);
    let mut cached = cached.map(Vec::into_iter);

    for (i, conf) in configs.iter().enumerate() {
        let fingerprint = match cached.as_mut().and_then(|fps| fps.next()) {
            Some(fp) => fp,
            None => descriptor.generate(conf)?,
        };
        let fingerprint = normalization.apply(fingerprint);
        writer.write(&Record::new(conf, fingerprint))?;
        if i % 100 == 0 {
            log::debug!("processing configuration {i}");
        }
    }

    let written = writer.written();
    writer.finish()?;
    log::info!("processed {written} configurations");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CutoffKind, DescriptorConfig, SymmetryFunctions};
    use crate::io::record::RecordReader;
    use crate::model::atom::Atom;
    use approx::assert_relative_eq;
    use ndarray::Axis;
    use tempfile::tempdir;

    fn descriptor() -> SymmetryFunctions {
        SymmetryFunctions::new(DescriptorConfig::with_cutoffs(
            CutoffKind::Cos,
            [("Si-Si", 4.0)],
        ))
        .unwrap()
    }

    fn dataset(count: usize) -> Vec<Configuration> {
        (0..count)
            .map(|c| {
                let s = 2.0 + 0.07 * c as f64;
                let atoms = vec![
                    Atom::new("Si", [0.0, 0.0, 0.0]),
                    Atom::new("Si", [s, 0.0, 0.0]),
                    Atom::new("Si", [0.0, s * 1.1, 0.0]),
                    Atom::new("Si", [0.3, 0.4, s * 0.9]),
                ];
                let forces = vec![0.1 * c as f64; 12];
                Configuration::new(format!("conf{c}"), atoms, -4.0 * s, forces).unwrap()
            })
            .collect()
    }

    fn read_all(path: &Path, precision: Precision) -> Vec<Record> {
        let file = File::open(path).unwrap();
        RecordReader::new(BufReader::new(file), precision)
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn splits_and_normalizes_with_training_statistics() {
        let dir = tempdir().unwrap();
        let configs = dataset(10);
        let config = PreprocessConfig {
            validation_size: 3,
            seed: Some(1),
            ..PreprocessConfig::default()
        };
        let summary = preprocess(&configs, &descriptor(), dir.path(), &config).unwrap();

        assert_eq!(summary.train_count, 7);
        assert_eq!(summary.validation_count, 3);
        assert!(summary.normalization.is_enabled());

        let train = read_all(&summary.train_path, Precision::Double);
        let validation = read_all(summary.validation_path.as_ref().unwrap(), Precision::Double);
        assert_eq!(train.len(), 7);
        assert_eq!(validation.len(), 3);

        let mut names: Vec<&str> = train
            .iter()
            .chain(&validation)
            .map(|r| r.name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);

        // Normalized training rows have zero mean and unit sample std.
        let views: Vec<_> = train.iter().map(|r| r.gen_coords.view()).collect();
        let stacked = ndarray::concatenate(Axis(0), &views).unwrap();
        for c in 0..stacked.ncols() {
            let column = stacked.column(c);
            assert_relative_eq!(column.mean().unwrap(), 0.0, epsilon = 1e-9);
            assert_relative_eq!(column.std(1.0), 1.0, epsilon = 1e-9);
        }

        let persisted = norm::read(BufReader::new(File::open(&summary.normalization_path).unwrap()))
            .unwrap();
        assert_eq!(persisted, summary.normalization);
    }

    #[test]
    fn welford_and_batch_write_identical_records() {
        let configs = dataset(6);
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let base = PreprocessConfig {
            shuffle: false,
            ..PreprocessConfig::default()
        };
        preprocess(
            &configs,
            &descriptor(),
            a.path(),
            &PreprocessConfig {
                strategy: StatsStrategy::Welford,
                ..base.clone()
            },
        )
        .unwrap();
        preprocess(&configs, &descriptor(), b.path(), &base).unwrap();

        let ra = read_all(&a.path().join(TRAIN_FILE), Precision::Double);
        let rb = read_all(&b.path().join(TRAIN_FILE), Precision::Double);
        for (x, y) in ra.iter().zip(&rb) {
            assert_eq!(x.name, y.name);
            for (p, q) in x.gen_coords.iter().zip(y.gen_coords.iter()) {
                assert_relative_eq!(*p, *q, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn disabled_normalization_writes_marker_and_raw_fingerprints() {
        let dir = tempdir().unwrap();
        let configs = dataset(3);
        let desc = descriptor();
        let config = PreprocessConfig {
            normalize: false,
            shuffle: false,
            precision: Precision::Single,
            ..PreprocessConfig::default()
        };
        let summary = preprocess(&configs, &desc, dir.path(), &config).unwrap();
        assert_eq!(
            fs::read_to_string(&summary.normalization_path).unwrap(),
            "False\n"
        );
        assert!(summary.validation_path.is_none());

        let records = read_all(&summary.train_path, Precision::Single);
        let raw = desc.generate(&configs[0]).unwrap();
        assert_eq!(records[0].name, "conf0");
        assert_eq!(records[0].gen_coords, raw.zeta.mapv(|v| Precision::Single.round(v)));
    }

    #[test]
    fn oversized_validation_set_is_rejected() {
        let dir = tempdir().unwrap();
        let config = PreprocessConfig {
            validation_size: 5,
            ..PreprocessConfig::default()
        };
        let err = preprocess(&dataset(4), &descriptor(), dir.path(), &config).unwrap_err();
        assert!(matches!(
            err,
            Error::ValidationTooLarge {
                validation: 5,
                dataset: 4
            }
        ));
    }

    #[test]
    fn test_set_reuses_training_statistics() {
        let dir = tempdir().unwrap();
        let desc = descriptor();
        let summary = preprocess(
            &dataset(8),
            &desc,
            dir.path(),
            &PreprocessConfig {
                seed: Some(9),
                ..PreprocessConfig::default()
            },
        )
        .unwrap();

        let test = dataset(2);
        let path = preprocess_test_set(&test, &desc, dir.path(), &TestSetConfig::default()).unwrap();
        let records = read_all(&path, Precision::Double);
        assert_eq!(records.len(), 2);

        let expected = summary.normalization.apply(desc.generate(&test[1]).unwrap());
        assert_eq!(records[1].gen_coords, expected.zeta);
        assert_eq!(records[1].dgen_datomic_coords, expected.dzeta_dr);
    }

    #[test]
    fn test_set_requires_persisted_statistics() {
        let dir = tempdir().unwrap();
        let err = preprocess_test_set(&dataset(1), &descriptor(), dir.path(), &TestSetConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::MissingNormalization { .. }));
    }

    #[test]
    fn test_set_rejects_statistics_of_another_descriptor() {
        let dir = tempdir().unwrap();
        let stats = crate::normalize::NormStats::new(ndarray::Array1::zeros(3), ndarray::Array1::ones(3));
        let file = File::create(dir.path().join(norm::FILE_NAME)).unwrap();
        norm::write(file, &Normalization::Stats(stats)).unwrap();

        let err = preprocess_test_set(&dataset(1), &descriptor(), dir.path(), &TestSetConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Io(crate::io::Error::ChannelMismatch {
                expected: 20,
                actual: 3
            })
        ));
    }
}

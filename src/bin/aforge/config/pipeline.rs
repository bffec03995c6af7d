use ann_forge::{ExportOptions, PreprocessConfig, TestSetConfig};

use crate::cli::{KimOptions, PreprocessArgs, TestSetArgs};
use crate::util::convert::build_stats_strategy;

pub fn build_preprocess_config(args: &PreprocessArgs) -> PreprocessConfig {
    PreprocessConfig {
        validation_size: args.split.validation_size,
        normalize: !args.records.no_normalize,
        shuffle: !args.split.no_shuffle,
        seed: args.split.seed,
        strategy: build_stats_strategy(&args.stats),
        precision: args.records.precision.into(),
    }
}

pub fn build_test_set_config(args: &TestSetArgs) -> TestSetConfig {
    TestSetConfig {
        normalize: !args.records.no_normalize,
        precision: args.records.precision.into(),
    }
}

pub fn build_export_options(opts: &KimOptions) -> ExportOptions {
    let defaults = ExportOptions::default();
    ExportOptions {
        model_name: opts.model_name.clone().unwrap_or(defaults.model_name),
        driver_name: opts.driver_name.clone().unwrap_or(defaults.driver_name),
        version: defaults.version,
        dropout_repeat: opts.dropout_repeat,
        seed: opts.seed,
    }
}

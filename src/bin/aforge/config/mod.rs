mod network;
mod pipeline;

pub use network::build_model;
pub use pipeline::{build_export_options, build_preprocess_config, build_test_set_config};

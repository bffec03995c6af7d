use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "aforge",
    about = "Neural-network interatomic potential fingerprinting and KIM export",
    version,
    author,
    before_help = crate::display::banner_for_help(),
    propagate_version = true
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Default `env_logger` filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    pub fn quiet(&self) -> bool {
        match &self.command {
            Command::Preprocess(args) => args.quiet,
            Command::TestSet(args) => args.quiet,
            Command::Init(args) => args.quiet,
            Command::Export(args) => args.quiet,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Fingerprint, normalize and serialize a training set
    #[command(visible_alias = "p")]
    Preprocess(PreprocessArgs),

    /// Serialize a test set with the statistics of a preprocessed training set
    #[command(name = "test-set", visible_alias = "t")]
    TestSet(TestSetArgs),

    /// Create a randomly initialized model checkpoint
    #[command(visible_alias = "i")]
    Init(InitArgs),

    /// Write a KIM model directory from a checkpoint
    #[command(visible_alias = "e")]
    Export(ExportArgs),
}

/// Descriptor options shared by all commands.
#[derive(Args)]
#[command(next_help_heading = "Descriptor")]
pub struct DescriptorOptions {
    /// Descriptor configuration (TOML with cutoffs and symmetry functions)
    #[arg(short = 'd', long = "descriptor", value_name = "FILE")]
    pub path: PathBuf,
}

/// Options controlling the serialized fingerprints.
#[derive(Args)]
#[command(next_help_heading = "Fingerprint Output")]
pub struct RecordOptions {
    /// Float width of serialized fingerprints
    #[arg(long, value_name = "WIDTH", default_value = "double")]
    pub precision: PrecisionArg,

    /// Store raw fingerprints without centering and scaling
    #[arg(long)]
    pub no_normalize: bool,
}

#[derive(Args)]
pub struct PreprocessArgs {
    /// Training configurations (extended XYZ)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output directory for records and statistics
    #[arg(short, long, value_name = "DIR", default_value = "fingerprints")]
    pub output: PathBuf,

    /// Suppress progress output (for scripting)
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub descriptor: DescriptorOptions,

    #[command(flatten)]
    pub records: RecordOptions,

    #[command(flatten)]
    pub split: SplitOptions,

    #[command(flatten)]
    pub stats: StatsOptions,
}

#[derive(Args)]
#[command(next_help_heading = "Dataset Split")]
pub struct SplitOptions {
    /// Number of configurations held out for validation
    #[arg(long = "validation-size", value_name = "N", default_value = "0")]
    pub validation_size: usize,

    /// Keep the input order instead of shuffling before the split
    #[arg(long)]
    pub no_shuffle: bool,

    /// Seed for the shuffle (random if omitted)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Args)]
#[command(next_help_heading = "Statistics")]
pub struct StatsOptions {
    /// Strategy for the per-channel mean and standard deviation
    #[arg(long = "stats", value_name = "METHOD", default_value = "batch")]
    pub method: StatsMethod,

    /// Worker threads for batch statistics (rayon default if omitted)
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,
}

#[derive(Args)]
pub struct TestSetArgs {
    /// Test configurations (extended XYZ)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Directory of a preprocessed training set; the test records are written here
    #[arg(long, value_name = "DIR", default_value = "fingerprints")]
    pub dir: PathBuf,

    /// Suppress progress output (for scripting)
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub descriptor: DescriptorOptions,

    #[command(flatten)]
    pub records: RecordOptions,
}

#[derive(Args)]
pub struct InitArgs {
    /// Checkpoint file to create
    #[arg(short, long, value_name = "FILE", default_value = "model.json")]
    pub output: PathBuf,

    /// Suppress progress output (for scripting)
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub descriptor: DescriptorOptions,

    #[command(flatten)]
    pub network: NetworkOptions,
}

#[derive(Args)]
#[command(next_help_heading = "Network")]
pub struct NetworkOptions {
    /// Hidden layer widths, comma separated
    #[arg(
        long,
        value_name = "N,...",
        value_delimiter = ',',
        default_value = "20,20"
    )]
    pub hidden: Vec<usize>,

    /// Activation applied after every hidden layer
    #[arg(long, value_name = "KIND", default_value = "tanh")]
    pub activation: ActivationArg,

    /// Dropout probability of the descriptor input
    #[arg(long = "input-dropout", value_name = "P")]
    pub input_dropout: Option<f64>,

    /// Dropout probability after every hidden activation
    #[arg(long, value_name = "P")]
    pub dropout: Option<f64>,

    /// Float width of exported parameters
    #[arg(long, value_name = "WIDTH", default_value = "double")]
    pub precision: PrecisionArg,

    /// Seed for weight initialization (random if omitted)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("normalization_source")
        .args(["normalization", "no_normalize"])
        .required(true)
))]
pub struct ExportArgs {
    /// Model checkpoint (JSON)
    #[arg(value_name = "CHECKPOINT")]
    pub checkpoint: PathBuf,

    /// Output model directory (defaults to the model name)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Suppress progress output (for scripting)
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub descriptor: DescriptorOptions,

    /// Normalization file written by `preprocess`
    #[arg(short, long, value_name = "FILE")]
    pub normalization: Option<PathBuf>,

    /// The model was trained on raw fingerprints without centering and scaling
    #[arg(long)]
    pub no_normalize: bool,

    #[command(flatten)]
    pub kim: KimOptions,
}

#[derive(Args)]
#[command(next_help_heading = "KIM Model")]
pub struct KimOptions {
    /// KIM model name
    #[arg(long = "name", value_name = "NAME")]
    pub model_name: Option<String>,

    /// KIM model driver name
    #[arg(long = "driver", value_name = "NAME")]
    pub driver_name: Option<String>,

    /// Number of dropout mask instances (0 disables dropout in the driver)
    #[arg(long = "dropout-repeat", value_name = "N", default_value = "50")]
    pub dropout_repeat: usize,

    /// Seed for the dropout masks (random if omitted)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum PrecisionArg {
    /// 4-byte floats
    #[value(alias = "float")]
    Single,
    /// 8-byte floats
    #[default]
    Double,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum StatsMethod {
    /// Parallel, holds every fingerprint in memory
    #[default]
    Batch,
    /// Sequential, constant memory
    Welford,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum ActivationArg {
    Sigmoid,
    #[default]
    Tanh,
    Relu,
    Elu,
}

pub fn parse() -> Cli {
    Cli::parse()
}

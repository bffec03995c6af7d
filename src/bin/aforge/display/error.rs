use std::io::{self, Write};

use anyhow::Error;

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    let msg = err.to_string();
    for line in wrap(&msg, 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    for cause in err.chain().skip(1) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 57) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
    }

    if let Some(hints) = HintCollector::collect(err) {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

/// Finds the first error of type `E` anywhere in the chain.
fn find<E>(err: &Error) -> Option<&E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    err.chain().find_map(|cause| cause.downcast_ref::<E>())
}

struct HintCollector {
    hints: Vec<String>,
    has_typed_hints: bool,
}

impl HintCollector {
    fn new() -> Self {
        Self {
            hints: Vec::new(),
            has_typed_hints: false,
        }
    }

    fn collect(err: &Error) -> Option<Vec<String>> {
        let mut collector = Self::new();

        collector.collect_pipeline_hints(err);
        collector.collect_io_hints(err);
        collector.collect_stats_hints(err);
        collector.collect_descriptor_hints(err);
        collector.collect_export_hints(err);
        collector.collect_network_hints(err);

        if !collector.has_typed_hints {
            collector.collect_fallback_hints(err);
        }

        if collector.hints.is_empty() {
            None
        } else {
            Some(collector.hints)
        }
    }

    fn add(&mut self, hint: impl Into<String>) {
        self.hints.push(hint.into());
    }

    fn mark_typed(&mut self) {
        self.has_typed_hints = true;
    }

    fn collect_pipeline_hints(&mut self, err: &Error) {
        use ann_forge::PipelineError;

        let Some(pipeline_err) = find::<PipelineError>(err) else {
            return;
        };

        match pipeline_err {
            PipelineError::EmptyDataset => {
                self.mark_typed();
                self.add("The input file contains no configurations");
                self.add("Check that every frame starts with an atom count line");
            }

            PipelineError::ValidationTooLarge { dataset, .. } => {
                self.mark_typed();
                self.add(format!(
                    "Choose --validation-size of at most {} configurations",
                    dataset
                ));
            }

            PipelineError::MissingNormalization { .. } => {
                self.mark_typed();
                self.add("Run `aforge preprocess` on the training set first");
                self.add("Point --dir at the training output directory");
                self.add("Or pass --no-normalize if the training set was not normalized");
            }

            PipelineError::File { .. }
            | PipelineError::Descriptor(_)
            | PipelineError::Stats(_)
            | PipelineError::Io(_) => {}
        }
    }

    fn collect_io_hints(&mut self, err: &Error) {
        use ann_forge::IoError;

        let Some(io_err) = find::<IoError>(err) else {
            if let Some(source) = find::<io::Error>(err) {
                self.mark_typed();
                self.collect_std_io_hints(source);
            }
            return;
        };

        self.mark_typed();

        match io_err {
            IoError::Io { source } => {
                self.collect_std_io_hints(source);
            }

            IoError::Parse { format, line, .. } => {
                self.add(format!(
                    "Parser encountered an issue near line {} in {} data",
                    line, format
                ));
                self.add("Inspect the file around that line for malformed entries");
                self.add_format_specific_parse_hints(*format);
            }

            IoError::Record { index, .. } => {
                self.add(format!("Record #{} could not be decoded", index));
                self.add("Read records with the precision they were written with");
                self.add("The file may be truncated; regenerate it with `aforge preprocess`");
            }

            IoError::ChannelMismatch { expected, actual } => {
                self.add(format!(
                    "The statistics were computed for {} channels, the descriptor produces {}",
                    actual, expected
                ));
                self.add("Use the same descriptor configuration as for the training set");
            }

            IoError::Checkpoint(_) => {
                self.add("The checkpoint is not valid JSON or has missing fields");
                self.add("Create a fresh checkpoint with `aforge init`");
            }

            IoError::InvalidModel(_) => {
                self.add("The checkpoint layers do not form a valid network");
            }

            IoError::Configuration(_) => {
                self.add("Every atom needs three force components");
                self.add("Check the Properties column layout of the frame");
            }
        }
    }

    fn collect_std_io_hints(&mut self, source: &std::io::Error) {
        use std::io::ErrorKind;

        match source.kind() {
            ErrorKind::NotFound => {
                self.add("File or directory not found");
                self.add("Check the path spelling and ensure the file exists");
            }

            ErrorKind::PermissionDenied => {
                self.add("Permission denied accessing the file");
                self.add("Check file permissions with `ls -la`");
            }

            ErrorKind::InvalidData => {
                self.add("File contains invalid or corrupt data");
                self.add("Verify the file is not truncated or corrupted");
            }

            ErrorKind::UnexpectedEof => {
                self.add("Unexpected end of file encountered");
                self.add("The file may be truncated or incomplete");
            }

            ErrorKind::WriteZero | ErrorKind::StorageFull => {
                self.add("Failed to write data (disk full?)");
                self.add("Check available disk space");
            }

            _ => {
                self.add("I/O operation failed");
                self.add("Check file path, permissions, and disk space");
            }
        }
    }

    fn add_format_specific_parse_hints(&mut self, format: ann_forge::io::Format) {
        use ann_forge::io::Format;

        match format {
            Format::Extxyz => {
                self.add("XYZ: The comment line must carry energy=<value>");
                self.add("XYZ: Declare columns with Properties=species:S:1:pos:R:3:forces:R:3");
            }

            Format::Normalization => {
                self.add("The first value must be False or the channel count");
                self.add("Regenerate the file with `aforge preprocess`");
            }

            Format::Records | Format::Checkpoint => {}
        }
    }

    fn collect_stats_hints(&mut self, err: &Error) {
        use ann_forge::StatsError;

        let Some(stats_err) = find::<StatsError>(err) else {
            return;
        };

        self.mark_typed();

        match stats_err {
            StatsError::OutOfMemory { .. } => {
                self.add("The fingerprints of the whole training set do not fit in memory");
                self.add("Use --stats welford for constant-memory statistics");
            }

            StatsError::TooFewSamples { .. } => {
                self.add("A standard deviation needs at least two atoms in the training set");
                self.add("Add configurations or pass --no-normalize");
            }

            StatsError::ThreadPool(_) => {
                self.add("Reduce --workers or omit it to use the global pool");
            }

            StatsError::EmptyDataset
            | StatsError::ChannelDrift { .. }
            | StatsError::Descriptor(_) => {}
        }
    }

    fn collect_descriptor_hints(&mut self, err: &Error) {
        use ann_forge::DescriptorError;

        let Some(desc_err) = find::<DescriptorError>(err) else {
            return;
        };

        self.mark_typed();

        match desc_err {
            DescriptorError::ConfigParse(_) => {
                self.add("Descriptor configuration has invalid TOML syntax or fields");
                self.add("Expected keys: cutoff_kind, [cutoffs], optional [functions]");
            }

            DescriptorError::InvalidHyperparameter(_) => {
                self.add("Check cutoff radii and symmetry-function parameters");
                self.add("Cutoffs must be positive and given once per species pair");
            }

            DescriptorError::UnsupportedSpeciesPair { first, second, .. } => {
                self.add(format!(
                    "Add a cutoff for \"{}-{}\" to the [cutoffs] table",
                    first, second
                ));
            }

            DescriptorError::EmptyConfiguration(_) => {
                self.add("Remove frames with zero atoms from the input");
            }

            DescriptorError::CoincidentAtoms { .. } => {
                self.add("Two atoms share a position; check the coordinates");
            }
        }
    }

    fn collect_export_hints(&mut self, err: &Error) {
        use ann_forge::ExportError;

        let Some(export_err) = find::<ExportError>(err) else {
            return;
        };

        self.mark_typed();

        match export_err {
            ExportError::Network(_) | ExportError::NoHiddenLayer => {
                self.add("Exported networks are: [dropout] (linear, activation [, dropout])+ linear");
                self.add("The last linear layer must have a single output");
            }

            ExportError::UnsupportedActivation { .. } => {
                self.add("The KIM driver supports sigmoid, tanh, relu and elu");
            }

            ExportError::MixedActivations { .. } => {
                self.add("Use the same activation after every hidden layer");
            }

            ExportError::DescriptorMismatch { .. } => {
                self.add("Export with the descriptor configuration the model was trained on");
            }

            ExportError::ChannelMismatch { .. } => {
                self.add("Pass the normalization file of the matching training set");
            }

            ExportError::Write { .. } | ExportError::Render(_) | ExportError::Format(_) => {}
        }
    }

    fn collect_network_hints(&mut self, err: &Error) {
        use ann_forge::NetworkError;

        if find::<NetworkError>(err).is_none() {
            return;
        }

        self.mark_typed();
        self.add("Check the layer order and widths in the checkpoint");
        self.add("Dropout probabilities must lie in [0, 1)");
    }

    fn collect_fallback_hints(&mut self, err: &Error) {
        let msg = error_chain_text(err);

        if msg.contains("no such file") || msg.contains("not found") {
            self.add("Check that the file path is correct");
            self.add("Verify the file exists and is readable");
            return;
        }

        if msg.contains("permission denied") {
            self.add("Check file permissions with `ls -la`");
            self.add("Ensure you have the required access rights");
        }
    }
}

fn error_chain_text(err: &Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}

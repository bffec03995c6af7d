use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};

use ann_forge::io::{checkpoint, extxyz, norm};
use ann_forge::{Configuration, DescriptorConfig, Model, Normalization, SymmetryFunctions};

/// Returns `true` if stderr is a terminal (interactive).
pub fn stderr_is_tty() -> bool {
    io::stderr().is_terminal()
}

pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;
    Ok(BufReader::new(file))
}

pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Reads every frame of an extended-XYZ file; ids are prefixed with the file stem.
pub fn read_configurations(path: &Path) -> Result<Vec<Configuration>> {
    let prefix = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "conf".to_string());
    let reader = open_input(path)?;
    extxyz::read(reader, &prefix)
        .with_context(|| format!("Failed to read configurations from {}", path.display()))
}

pub fn read_descriptor(path: &Path) -> Result<SymmetryFunctions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor configuration: {}", path.display()))?;
    let config = DescriptorConfig::from_toml(&text)
        .with_context(|| format!("Invalid descriptor configuration: {}", path.display()))?;
    let descriptor = SymmetryFunctions::new(config)
        .with_context(|| format!("Invalid descriptor configuration: {}", path.display()))?;
    Ok(descriptor)
}

pub fn read_checkpoint(path: &Path) -> Result<Model> {
    let reader = open_input(path)?;
    checkpoint::load(reader)
        .with_context(|| format!("Failed to load model checkpoint: {}", path.display()))
}

pub fn write_checkpoint(path: &Path, model: &Model) -> Result<()> {
    let mut writer = create_output(path)?;
    checkpoint::save(&mut writer, model)
        .with_context(|| format!("Failed to write model checkpoint: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write model checkpoint: {}", path.display()))
}

/// Reads a normalization file and checks it against the descriptor's channel count.
pub fn read_normalization(path: &Path, channels: usize) -> Result<Normalization> {
    let reader = open_input(path)?;
    norm::read_checked(reader, channels)
        .with_context(|| format!("Failed to read normalization file: {}", path.display()))
}

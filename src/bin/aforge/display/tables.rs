use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use ann_forge::{Configuration, Model, Normalization, PreprocessSummary};

use crate::util::text::{group_digits, truncate};

const INDENT: &str = "      ";

const BOX_INNER_WIDTH: usize = 62;
const SAFE_TABLE_WIDTH: usize = BOX_INNER_WIDTH - INDENT.len();

pub fn print_dataset_info(title: &str, configs: &[Configuration], channels: usize) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let atom_counts: Vec<usize> = configs.iter().map(Configuration::atom_count).collect();
    let total_atoms: usize = atom_counts.iter().sum();
    let min_atoms = atom_counts.iter().min().copied().unwrap_or(0);
    let max_atoms = atom_counts.iter().max().copied().unwrap_or(0);

    let mut rows = vec![
        ("Configurations", group_digits(configs.len())),
        ("Total Atoms", group_digits(total_atoms)),
        ("Atoms per Conf.", format!("{} – {}", min_atoms, max_atoms)),
        ("Channels", format!("{}", channels)),
    ];

    let species = species_counts(configs);
    if !species.is_empty() {
        let list: Vec<String> = species
            .iter()
            .map(|(s, n)| format!("{}×{}", s, group_digits(*n)))
            .collect();
        rows.push(("Species", list.join(" ")));
    }

    print_kv_table(&mut out, title, &rows);
}

pub fn print_records_info(summary: &PreprocessSummary) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let mut rows = vec![("Train Records", group_digits(summary.train_count))];
    if summary.validation_path.is_some() {
        rows.push(("Valid. Records", group_digits(summary.validation_count)));
    }
    rows.push(("Normalization", describe_normalization(&summary.normalization)));
    rows.push(("Output", file_name(&summary.train_path)));

    print_kv_table(&mut out, "Dataset Summary", &rows);
}

pub fn print_model_info(model: &Model) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let mut owned = vec![
        ("Descriptor Size".to_string(), model.descriptor_size().to_string()),
        ("Parameters".to_string(), group_digits(model.parameter_count())),
        ("Precision".to_string(), model.precision().to_string()),
    ];
    for (i, layer) in model.layers().iter().enumerate() {
        owned.push((format!("Layer {}", i), layer.to_string()));
    }

    let rows: Vec<(&str, String)> = owned.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
    print_kv_table(&mut out, "Network Summary", &rows);
}

pub fn print_export_info(dir: &Path, files: &[&str]) {
    let stderr = io::stderr();
    let mut out = stderr.lock();

    let mut rows = vec![("Directory", dir.display().to_string())];
    for file in files {
        rows.push(("File", (*file).to_string()));
    }

    print_kv_table(&mut out, "KIM Model", &rows);
}

fn species_counts(configs: &[Configuration]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for conf in configs {
        for atom in conf.atoms() {
            *counts.entry(atom.species.as_str()).or_insert(0) += 1;
        }
    }
    counts
}

fn describe_normalization(normalization: &Normalization) -> String {
    match normalization.stats() {
        Some(stats) => format!("{} channels", stats.channel_count()),
        None => "disabled".to_string(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn print_kv_table(out: &mut impl Write, title: &str, rows: &[(&str, String)]) {
    let key_w = 16usize;
    let sep_overhead = 6;
    let val_w = SAFE_TABLE_WIDTH.saturating_sub(key_w + sep_overhead);

    let _ = writeln!(
        out,
        "{}┌─ {} ─┐",
        INDENT,
        truncate(title, SAFE_TABLE_WIDTH - 6)
    );
    let _ = writeln!(
        out,
        "{}┌{k_line}┬{v_line}┐",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );

    for (key, val) in rows {
        let _ = writeln!(
            out,
            "{}│ {:<key_w$} │ {:>val_w$} │",
            INDENT,
            truncate(key, key_w),
            truncate(val, val_w),
            key_w = key_w,
            val_w = val_w
        );
    }

    let _ = writeln!(
        out,
        "{}└{k_line}┴{v_line}┘",
        INDENT,
        k_line = "─".repeat(key_w + 2),
        v_line = "─".repeat(val_w + 2)
    );
}

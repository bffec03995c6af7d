//! `dropout_binary.params`: pre-sampled dropout masks for the driver's
//! uncertainty estimates.

use rand::Rng;
use std::fmt::{self, Write};

/// Renders `repeat` instances; each holds one 0/1 mask per layer input,
/// where `units[i]` entries are drawn with retention probability `keep[i]`.
pub(super) fn render<R: Rng>(
    repeat: usize,
    keep: &[f64],
    units: &[usize],
    rng: &mut R,
) -> Result<String, fmt::Error> {
    let rule = format!("#{}\n", "=".repeat(80));
    let mut out = String::new();
    out.push_str(&rule);
    out.push_str(
        "# Dropout binary parameters file generated by ann-forge.\n\
         #\n\
         # Note, if number of repeat is 0, it means that no dropout needs to\n\
         # be applied at all.\n",
    );
    out.push_str(&rule);
    out.push('\n');

    writeln!(out, "{repeat}  # number of repeat")?;
    for instance in 0..repeat {
        out.push_str(&rule);
        writeln!(out, "# instance {instance}")?;
        for (layer, (&k, &n)) in keep.iter().zip(units).enumerate() {
            writeln!(out, "# layer {layer}")?;
            for _ in 0..n {
                out.push_str(if rng.random_bool(k) { "1 " } else { "0 " });
            }
            out.push('\n');
        }
    }
    Ok(out)
}

//! The `descriptor.params` file read by the KIM neural-network driver.

use super::symmetry::SymmetryFunctions;
use crate::io::{fmt::general, norm};
use crate::model::precision::Precision;
use crate::normalize::Normalization;
use std::io::{self, Write};

fn rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "#{}", "=".repeat(80))
}

fn num(value: f64, precision: Precision) -> String {
    match precision {
        Precision::Double => general(value, 15),
        Precision::Single => general(value, 7),
    }
}

pub(super) fn write(
    desc: &SymmetryFunctions,
    w: &mut dyn Write,
    normalization: &Normalization,
    precision: Precision,
) -> io::Result<()> {
    rule(w)?;
    writeln!(w, "# Descriptor parameters file generated by ann-forge.")?;
    rule(w)?;
    writeln!(w)?;

    let species = desc.species();
    writeln!(w, "{}    # number of species", species.len())?;
    writeln!(w, "{}", species.join("  "))?;
    writeln!(w)?;

    writeln!(w, "{}    # cutoff type", desc.cutoff_kind())?;
    writeln!(w)?;
    writeln!(w, "# species_i  species_j  cutoff")?;
    for (a, b, rc) in desc.pair_cutoffs() {
        writeln!(w, "{a}  {b}  {}", num(rc, precision))?;
    }
    writeln!(w)?;

    rule(w)?;
    writeln!(w, "# symmetry functions")?;
    rule(w)?;
    writeln!(w)?;

    let functions = &desc.config().functions;
    let families = usize::from(functions.g1)
        + [
            functions.g2.is_empty(),
            functions.g3.is_empty(),
            functions.g4.is_empty(),
            functions.g5.is_empty(),
        ]
        .iter()
        .filter(|empty| !**empty)
        .count();
    writeln!(w, "{families}    # number of symmetry function types")?;
    writeln!(w)?;
    writeln!(w, "# sym_function    rows    cols")?;

    if functions.g1 {
        writeln!(w, "g1")?;
        writeln!(w)?;
    }
    if !functions.g2.is_empty() {
        writeln!(w, "g2    {}    2", functions.g2.len())?;
        for p in &functions.g2 {
            writeln!(
                w,
                "{} {}    # eta  Rs",
                num(p.eta, precision),
                num(p.rs, precision)
            )?;
        }
        writeln!(w)?;
    }
    if !functions.g3.is_empty() {
        writeln!(w, "g3    {}    1", functions.g3.len())?;
        for p in &functions.g3 {
            writeln!(w, "{}    # kappa", num(p.kappa, precision))?;
        }
        writeln!(w)?;
    }
    for (name, params) in [("g4", &functions.g4), ("g5", &functions.g5)] {
        if params.is_empty() {
            continue;
        }
        writeln!(w, "{name}    {}    3", params.len())?;
        for p in params {
            writeln!(
                w,
                "{} {} {}    # zeta  lambda  eta",
                num(p.zeta, precision),
                num(p.lambda, precision),
                num(p.eta, precision)
            )?;
        }
        writeln!(w)?;
    }

    rule(w)?;
    writeln!(w, "# Preprocessing data to center and normalize")?;
    rule(w)?;
    match normalization {
        Normalization::Disabled => writeln!(w, "center_and_normalize  False")?,
        Normalization::Stats(_) => {
            writeln!(w, "center_and_normalize  True")?;
            writeln!(w)?;
            w.write_all(norm::to_string(normalization)?.as_bytes())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::config::{AngularParams, DescriptorConfig, FunctionSet, G2Params};
    use crate::descriptor::cutoff::CutoffKind;
    use crate::normalize::NormStats;
    use ndarray::array;

    fn descriptor() -> SymmetryFunctions {
        let mut config =
            DescriptorConfig::with_cutoffs(CutoffKind::Cos, [("Si-Si", 3.77), ("Si-C", 3.2)]);
        config.functions = FunctionSet {
            g1: false,
            g2: vec![G2Params { eta: 0.1, rs: 0.0 }],
            g3: vec![],
            g4: vec![AngularParams {
                zeta: 2.0,
                lambda: -1.0,
                eta: 0.003,
            }],
            g5: vec![],
        };
        SymmetryFunctions::new(config).unwrap()
    }

    fn render(normalization: &Normalization, precision: Precision) -> String {
        let mut buf = Vec::new();
        write(&descriptor(), &mut buf, normalization, precision).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn lists_species_cutoffs_and_functions() {
        let text = render(&Normalization::Disabled, Precision::Double);
        assert!(text.contains("2    # number of species\nC  Si\n"));
        assert!(text.contains("cos    # cutoff type"));
        assert!(text.contains("C  Si  3.2\nSi  Si  3.77\n"));
        assert!(text.contains("2    # number of symmetry function types"));
        assert!(text.contains("g2    1    2\n0.1 0    # eta  Rs\n"));
        assert!(text.contains("g4    1    3\n2 -1 0.003    # zeta  lambda  eta\n"));
        assert!(!text.contains("g1\n"));
        assert!(text.trim_end().ends_with("center_and_normalize  False"));
    }

    #[test]
    fn embeds_normalization_statistics() {
        let stats = Normalization::Stats(NormStats::new(array![0.5, 1.0], array![2.0, 4.0]));
        let text = render(&stats, Precision::Double);
        assert!(text.contains("center_and_normalize  True\n\n2  # number of descriptors.\n# mean\n"));
    }

    #[test]
    fn single_precision_uses_seven_significant_digits() {
        let text = render(&Normalization::Disabled, Precision::Single);
        assert!(text.contains("Si  Si  3.77\n"));
        assert!(text.contains("0.003"));
    }
}

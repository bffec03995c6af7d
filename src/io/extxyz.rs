use super::{Format, error::Error};
use crate::model::{atom::Atom, configuration::Configuration};
use std::io::BufRead;

/// Column layout of the per-atom lines, from the `Properties=` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    species: usize,
    pos: usize,
    forces: Option<usize>,
    width: usize,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            species: 0,
            pos: 1,
            forces: None,
            width: 4,
        }
    }
}

/// Reads every frame of an extended-XYZ stream.
///
/// Frame `k` gets the id `"{id_prefix}_{k}"`. The comment line must carry an
/// `energy=` key; frames without a `forces` property get a zero force label.
pub fn read<R: BufRead>(reader: R, id_prefix: &str) -> Result<Vec<Configuration>, Error> {
    let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));
    let mut configs = Vec::new();

    loop {
        let (count_ln, count_line) = match lines.next() {
            None => break,
            Some((ln, line)) => (ln, line?),
        };
        let count_line = count_line.trim();
        if count_line.is_empty() {
            continue;
        }
        let atom_count = count_line.parse::<usize>().map_err(|_| {
            Error::parse(
                Format::Extxyz,
                count_ln,
                format!("expected an atom count, got '{count_line}'"),
            )
        })?;

        let (comment_ln, comment) = match lines.next() {
            Some((ln, line)) => (ln, line?),
            None => {
                return Err(Error::parse(
                    Format::Extxyz,
                    count_ln,
                    "frame ended before the comment line",
                ));
            }
        };
        let header = parse_header(&comment, comment_ln)?;

        let mut atoms = Vec::new();
        let mut forces = Vec::new();
        for _ in 0..atom_count {
            let (ln, line) = match lines.next() {
                Some((ln, line)) => (ln, line?),
                None => {
                    return Err(Error::parse(
                        Format::Extxyz,
                        comment_ln,
                        format!("frame declares {atom_count} atoms but the input ended early"),
                    ));
                }
            };
            let (atom, force) = parse_atom_line(&line, ln, &header.columns)?;
            atoms.push(atom);
            if let Some(f) = force {
                forces.extend_from_slice(&f);
            }
        }

        let id = format!("{id_prefix}_{}", configs.len());
        let conf = if header.columns.forces.is_some() {
            Configuration::new(id, atoms, header.energy, forces)?
        } else {
            log::warn!("configuration '{id}' has no forces; using a zero force label");
            Configuration::without_forces(id, atoms, header.energy)
        };
        configs.push(conf);
    }

    Ok(configs)
}

struct Header {
    energy: f64,
    columns: Columns,
}

fn parse_header(line: &str, ln: usize) -> Result<Header, Error> {
    let mut energy = None;
    let mut columns = Columns::default();

    for (key, value) in key_values(line) {
        match key.to_ascii_lowercase().as_str() {
            "energy" => {
                energy = Some(value.parse::<f64>().map_err(|_| {
                    Error::parse(Format::Extxyz, ln, format!("invalid energy '{value}'"))
                })?);
            }
            "properties" => columns = parse_properties(&value, ln)?,
            _ => {}
        }
    }

    let energy = energy
        .ok_or_else(|| Error::parse(Format::Extxyz, ln, "comment line has no 'energy=' key"))?;
    Ok(Header { energy, columns })
}

/// Splits `key=value` tokens, honoring double-quoted values.
fn key_values(line: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }

        let mut value = String::new();
        if chars.peek() == Some(&'=') {
            chars.next();
            if chars.peek() == Some(&'"') {
                chars.next();
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                    value.push(c);
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
        }
        pairs.push((key, value));
    }

    pairs
}

fn parse_properties(value: &str, ln: usize) -> Result<Columns, Error> {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() % 3 != 0 {
        return Err(Error::parse(
            Format::Extxyz,
            ln,
            "Properties must be a list of name:type:count triplets",
        ));
    }

    let mut species = None;
    let mut pos = None;
    let mut forces = None;
    let mut offset: usize = 0;
    for triplet in parts.chunks_exact(3) {
        let (name, kind) = (triplet[0], triplet[1]);
        let count = triplet[2].parse::<usize>().map_err(|_| {
            Error::parse(
                Format::Extxyz,
                ln,
                format!("invalid column count '{}' for property '{name}'", triplet[2]),
            )
        })?;
        match (name.to_ascii_lowercase().as_str(), kind, count) {
            ("species", "S", 1) => species = Some(offset),
            ("pos", "R", 3) => pos = Some(offset),
            ("forces" | "force", "R", 3) => forces = Some(offset),
            ("species" | "pos" | "forces" | "force", _, _) => {
                return Err(Error::parse(
                    Format::Extxyz,
                    ln,
                    format!("property '{name}' has unexpected type {kind}:{count}"),
                ));
            }
            _ => {}
        }
        offset = offset.checked_add(count).ok_or_else(|| {
            Error::parse(Format::Extxyz, ln, "Properties declare too many columns")
        })?;
    }

    match (species, pos) {
        (Some(species), Some(pos)) => Ok(Columns {
            species,
            pos,
            forces,
            width: offset,
        }),
        _ => Err(Error::parse(
            Format::Extxyz,
            ln,
            "Properties must declare species:S:1 and pos:R:3",
        )),
    }
}

fn parse_atom_line(
    line: &str,
    ln: usize,
    columns: &Columns,
) -> Result<(Atom, Option<[f64; 3]>), Error> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < columns.width {
        return Err(Error::parse(
            Format::Extxyz,
            ln,
            format!(
                "atom line has {} columns, expected {}",
                tokens.len(),
                columns.width
            ),
        ));
    }

    let vector = |start: usize| -> Result<[f64; 3], Error> {
        let mut v = [0.0; 3];
        for (d, slot) in v.iter_mut().enumerate() {
            let token = tokens[start + d];
            *slot = token.parse::<f64>().map_err(|_| {
                Error::parse(Format::Extxyz, ln, format!("invalid number '{token}'"))
            })?;
        }
        Ok(v)
    };

    let atom = Atom::new(tokens[columns.species], vector(columns.pos)?);
    let force = columns.forces.map(vector).transpose()?;
    Ok((atom, force))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FRAMES: &str = "\
3
Lattice=\"10 0 0 0 10 0 0 0 10\" Properties=species:S:1:pos:R:3:forces:R:3 energy=-12.5 pbc=\"F F F\"
Si 0.0 0.0 0.0 0.1 0.2 0.3
Si 2.3 0.0 0.0 -0.1 0.0 0.0
C  0.0 1.9 0.0 0.0 -0.2 -0.3
2
energy=-3.25 Properties=species:S:1:pos:R:3:forces:R:3
C 0.0 0.0 0.0 1.0 0.0 0.0
C 0.0 0.0 1.4 -1.0 0.0 0.0
";

    #[test]
    fn reads_frames_in_order() {
        let configs = read(TWO_FRAMES.as_bytes(), "train").expect("parse");
        assert_eq!(configs.len(), 2);

        let first = &configs[0];
        assert_eq!(first.id(), "train_0");
        assert_eq!(first.atom_count(), 3);
        assert_eq!(first.energy(), -12.5);
        assert_eq!(first.atoms()[2].species, "C");
        assert_eq!(first.atoms()[1].position, [2.3, 0.0, 0.0]);
        assert_eq!(&first.forces()[..3], &[0.1, 0.2, 0.3]);

        assert_eq!(configs[1].id(), "train_1");
        assert_eq!(configs[1].forces()[3], -1.0);
    }

    #[test]
    fn missing_forces_are_zero_filled() {
        let text = "1\nenergy=0.5 Properties=species:S:1:pos:R:3\nSi 0 0 0\n";
        let configs = read(text.as_bytes(), "x").unwrap();
        assert_eq!(configs[0].forces(), &[0.0; 3]);
    }

    #[test]
    fn default_columns_apply_without_properties() {
        let text = "1\nenergy=1.0\nAr 1 2 3\n";
        let configs = read(text.as_bytes(), "x").unwrap();
        assert_eq!(configs[0].atoms()[0].position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn extra_columns_are_skipped() {
        let text = "1\nenergy=1.0 Properties=species:S:1:mass:R:1:pos:R:3\nAr 39.9 1 2 3\n";
        let configs = read(text.as_bytes(), "x").unwrap();
        assert_eq!(configs[0].atoms()[0].position, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn missing_energy_is_an_error() {
        let err = read("1\nProperties=species:S:1:pos:R:3\nSi 0 0 0\n".as_bytes(), "x").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let err = read("3\nenergy=1.0\nSi 0 0 0\n".as_bytes(), "x").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn huge_atom_count_is_a_parse_error() {
        let text = "18446744073709551615\nenergy=1.0\nSi 0 0 0\n";
        let err = read(text.as_bytes(), "x").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn huge_property_count_is_a_parse_error() {
        let text = "1\nenergy=1.0 Properties=species:S:1:pos:R:3:a:R:18446744073709551615:b:R:1\nSi 0 0 0\n";
        let err = read(text.as_bytes(), "x").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn bad_coordinate_reports_line() {
        let err = read("1\nenergy=1.0\nSi 0 zero 0\n".as_bytes(), "x").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn quoted_values_keep_spaces() {
        let pairs = key_values("a=1 b=\"x y\" flag");
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "x y".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
    }
}

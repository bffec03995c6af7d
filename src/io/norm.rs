//! The `mean_and_std_for_kim_ann` side file.
//!
//! The file either holds the single marker line `False`, or a channel count
//! followed by `count` mean values and `count` standard deviations. A `#`
//! starts a comment anywhere on a line and blank lines are ignored, so the
//! labelled headers written by [`write`] are skipped on read.

use super::{Format, error::Error, fmt::sci};
use crate::normalize::{NormStats, Normalization};
use ndarray::Array1;
use std::io::{self, BufRead, Write};

/// Conventional file name inside a preprocessing output directory.
pub const FILE_NAME: &str = "mean_and_std_for_kim_ann";

const DISABLED_MARKER: &str = "False";

pub fn write<W: Write>(writer: W, normalization: &Normalization) -> Result<(), Error> {
    write_lines(writer, normalization)?;
    Ok(())
}

/// Renders the file content in memory.
pub fn to_string(normalization: &Normalization) -> io::Result<String> {
    let mut buf = Vec::new();
    write_lines(&mut buf, normalization)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn write_lines<W: Write>(mut writer: W, normalization: &Normalization) -> io::Result<()> {
    match normalization {
        Normalization::Disabled => writeln!(writer, "{DISABLED_MARKER}")?,
        Normalization::Stats(stats) => {
            writeln!(
                writer,
                "{}  # number of descriptors.",
                stats.channel_count()
            )?;
            writeln!(writer, "# mean")?;
            for &v in &stats.mean {
                writeln!(writer, "{}", sci(v, 24, 16))?;
            }
            writeln!(writer, "# standard derivation")?;
            for &v in &stats.std {
                writeln!(writer, "{}", sci(v, 24, 16))?;
            }
        }
    }
    Ok(())
}

pub fn read<R: BufRead>(reader: R) -> Result<Normalization, Error> {
    let mut count: Option<(usize, usize)> = None;
    let mut values = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let ln = i + 1;
        let content = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line.as_str(),
        }
        .trim();
        if content.is_empty() {
            continue;
        }

        match count {
            None => {
                if content == DISABLED_MARKER {
                    return Ok(Normalization::Disabled);
                }
                let n = content.parse::<usize>().map_err(|_| {
                    Error::parse(
                        Format::Normalization,
                        ln,
                        format!("expected a descriptor count or '{DISABLED_MARKER}', got '{content}'"),
                    )
                })?;
                count = Some((n, ln));
            }
            Some(_) => {
                let v = content.parse::<f64>().map_err(|_| {
                    Error::parse(
                        Format::Normalization,
                        ln,
                        format!("invalid floating-point value '{content}'"),
                    )
                })?;
                values.push(v);
            }
        }
    }

    let Some((n, ln)) = count else {
        return Err(Error::parse(
            Format::Normalization,
            1,
            "file contains no data lines",
        ));
    };
    if n.checked_mul(2) != Some(values.len()) {
        return Err(Error::parse(
            Format::Normalization,
            ln,
            format!(
                "expected {} values for {n} descriptors, found {}",
                n.saturating_mul(2),
                values.len()
            ),
        ));
    }

    let std = values.split_off(n);
    Ok(Normalization::Stats(NormStats::new(
        Array1::from(values),
        Array1::from(std),
    )))
}

/// Reads the file and checks it against the active descriptor's channel count.
///
/// A disabled marker passes for any descriptor.
pub fn read_checked<R: BufRead>(reader: R, expected: usize) -> Result<Normalization, Error> {
    let normalization = read(reader)?;
    if let Some(stats) = normalization.stats() {
        if stats.channel_count() != expected {
            return Err(Error::ChannelMismatch {
                expected,
                actual: stats.channel_count(),
            });
        }
    }
    Ok(normalization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Normalization {
        Normalization::Stats(NormStats::new(
            array![0.1, -2.5e-7, 1234.5678901234567],
            array![1.0 / 3.0, 2.0e-3, 7.0],
        ))
    }

    #[test]
    fn writes_labelled_layout() {
        let text = to_string(&sample()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "3  # number of descriptors.");
        assert_eq!(lines[1], "# mean");
        assert_eq!(lines[2], "  1.0000000000000001e-01");
        assert_eq!(lines[5], "# standard derivation");
        assert!(lines[2..5].iter().all(|l| l.len() == 24));
    }

    #[test]
    fn round_trip_reproduces_written_floats() {
        let original = sample();
        let text = to_string(&original).unwrap();
        let back = read(text.as_bytes()).expect("read");
        assert_eq!(back, original);
    }

    #[test]
    fn disabled_marker_round_trips() {
        let text = to_string(&Normalization::Disabled).unwrap();
        assert_eq!(text, "False\n");
        assert_eq!(read(text.as_bytes()).unwrap(), Normalization::Disabled);
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let text = "\n# header\n2 # count\n\n0.5\n1.5 # trailing\n# std\n2.0\n3.0\n";
        let norm = read(text.as_bytes()).expect("read");
        let stats = norm.stats().expect("enabled");
        assert_eq!(stats.mean, array![0.5, 1.5]);
        assert_eq!(stats.std, array![2.0, 3.0]);
    }

    #[test]
    fn truncated_file_is_a_parse_error() {
        let err = read("2\n0.5\n1.5\n2.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn invalid_value_reports_line() {
        let err = read("1\n0.5\nabc\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn channel_mismatch_reports_both_counts() {
        let text = to_string(&sample()).unwrap();
        let err = read_checked(text.as_bytes(), 20).unwrap_err();
        match err {
            Error::ChannelMismatch { expected, actual } => {
                assert_eq!(expected, 20);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(read_checked("False\n".as_bytes(), 20).is_ok());
    }
}

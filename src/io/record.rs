//! Serialized fingerprint dataset (`*.records`).
//!
//! A file is a plain sequence of records. Each record is a native-endian `u64`
//! payload length followed by the payload:
//!
//! ```text
//! u32                      field count
//! repeated per field:
//!   u16 + [u8]             field name
//!   u8                     kind tag (0 = int64, 1 = bytes)
//!   i64 | u64 + [u8]       value
//! ```
//!
//! Float blobs hold `f32` or `f64` values in native endianness depending on
//! the [`Precision`] the file was written with. The precision is not stored,
//! so readers must be given the same one.

use super::error::Error;
use crate::model::{configuration::Configuration, fingerprint::Fingerprint, precision::Precision};
use byteorder::{ByteOrder, NativeEndian, ReadBytesExt, WriteBytesExt};
use ndarray::{Array2, Array3};
use std::collections::HashMap;
use std::io::{self, Cursor, ErrorKind, Read, Write};

const TAG_INT64: u8 = 0;
const TAG_BYTES: u8 = 1;

const FIELD_NAME: &str = "name";
const FIELD_NUM_ATOMS: &str = "num_atoms";
const FIELD_NUM_DESCRIPTORS: &str = "num_descriptors";
const FIELD_ATOMIC_COORDS: &str = "atomic_coords";
const FIELD_GEN_COORDS: &str = "gen_coords";
const FIELD_DGEN_DATOMIC_COORDS: &str = "dgen_datomic_coords";
const FIELD_ENERGY: &str = "energy";
const FIELD_FORCES: &str = "forces";

/// One preprocessed configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub atomic_coords: Vec<f64>,
    /// `[atoms, descriptors]`
    pub gen_coords: Array2<f64>,
    /// `[atoms, descriptors, atoms * 3]`
    pub dgen_datomic_coords: Array3<f64>,
    pub energy: f64,
    pub forces: Vec<f64>,
}

impl Record {
    /// Pairs a configuration with its (possibly normalized) fingerprint.
    pub fn new(conf: &Configuration, fingerprint: Fingerprint) -> Self {
        Self {
            name: conf.id().to_string(),
            atomic_coords: conf.flat_coords(),
            gen_coords: fingerprint.zeta,
            dgen_datomic_coords: fingerprint.dzeta_dr,
            energy: conf.energy(),
            forces: conf.forces().to_vec(),
        }
    }

    #[inline]
    pub fn num_atoms(&self) -> usize {
        self.gen_coords.nrows()
    }

    #[inline]
    pub fn num_descriptors(&self) -> usize {
        self.gen_coords.ncols()
    }

    /// Encodes the payload (without the length prefix).
    fn encode(&self, precision: Precision) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.write_u32::<NativeEndian>(8)?;

        put_bytes(&mut buf, FIELD_NAME, self.name.as_bytes())?;
        put_int(&mut buf, FIELD_NUM_ATOMS, self.num_atoms() as i64)?;
        put_int(&mut buf, FIELD_NUM_DESCRIPTORS, self.num_descriptors() as i64)?;
        put_bytes(
            &mut buf,
            FIELD_ATOMIC_COORDS,
            &float_blob(self.atomic_coords.iter().copied(), precision),
        )?;
        put_bytes(
            &mut buf,
            FIELD_GEN_COORDS,
            &float_blob(self.gen_coords.iter().copied(), precision),
        )?;
        put_bytes(
            &mut buf,
            FIELD_DGEN_DATOMIC_COORDS,
            &float_blob(self.dgen_datomic_coords.iter().copied(), precision),
        )?;
        put_bytes(
            &mut buf,
            FIELD_ENERGY,
            &float_blob(std::iter::once(self.energy), precision),
        )?;
        put_bytes(
            &mut buf,
            FIELD_FORCES,
            &float_blob(self.forces.iter().copied(), precision),
        )?;
        Ok(buf)
    }

    fn decode(payload: &[u8], precision: Precision, index: usize) -> Result<Self, Error> {
        let mut fields = decode_fields(payload).map_err(|e| Error::record(index, e.to_string()))?;

        let int = |fields: &mut HashMap<String, Field>, name: &str| -> Result<usize, Error> {
            match fields.remove(name) {
                Some(Field::Int(v)) => usize::try_from(v)
                    .map_err(|_| Error::record(index, format!("field '{name}' is negative"))),
                Some(Field::Bytes(_)) => Err(Error::record(
                    index,
                    format!("field '{name}' must be an integer"),
                )),
                None => Err(Error::record(index, format!("missing field '{name}'"))),
            }
        };
        let floats = |fields: &mut HashMap<String, Field>,
                      name: &str,
                      expected: usize|
         -> Result<Vec<f64>, Error> {
            let bytes = match fields.remove(name) {
                Some(Field::Bytes(b)) => b,
                Some(Field::Int(_)) => {
                    return Err(Error::record(
                        index,
                        format!("field '{name}' must be a byte blob"),
                    ));
                }
                None => return Err(Error::record(index, format!("missing field '{name}'"))),
            };
            if expected.checked_mul(precision.byte_width()) != Some(bytes.len()) {
                return Err(Error::record(
                    index,
                    format!(
                        "field '{name}' holds {} bytes, expected {expected} {precision}-precision values",
                        bytes.len()
                    ),
                ));
            }
            Ok(read_floats(&bytes, precision))
        };

        let num_atoms = int(&mut fields, FIELD_NUM_ATOMS)?;
        let num_descriptors = int(&mut fields, FIELD_NUM_DESCRIPTORS)?;
        let name = match fields.remove(FIELD_NAME) {
            Some(Field::Bytes(b)) => String::from_utf8(b)
                .map_err(|_| Error::record(index, "field 'name' is not valid UTF-8"))?,
            _ => return Err(Error::record(index, "missing or malformed field 'name'")),
        };

        let overflow = || Error::record(index, "declared sizes overflow");
        let dof = num_atoms.checked_mul(3).ok_or_else(overflow)?;
        let zeta_len = num_atoms
            .checked_mul(num_descriptors)
            .ok_or_else(overflow)?;
        let dzeta_len = zeta_len.checked_mul(dof).ok_or_else(overflow)?;

        let atomic_coords = floats(&mut fields, FIELD_ATOMIC_COORDS, dof)?;
        let zeta = floats(&mut fields, FIELD_GEN_COORDS, zeta_len)?;
        let dzeta = floats(&mut fields, FIELD_DGEN_DATOMIC_COORDS, dzeta_len)?;
        let energy = floats(&mut fields, FIELD_ENERGY, 1)?[0];
        let forces = floats(&mut fields, FIELD_FORCES, dof)?;

        let shape_err = |e: ndarray::ShapeError| Error::record(index, e.to_string());
        Ok(Self {
            name,
            atomic_coords,
            gen_coords: Array2::from_shape_vec((num_atoms, num_descriptors), zeta)
                .map_err(shape_err)?,
            dgen_datomic_coords: Array3::from_shape_vec((num_atoms, num_descriptors, dof), dzeta)
                .map_err(shape_err)?,
            energy,
            forces,
        })
    }
}

enum Field {
    Int(i64),
    Bytes(Vec<u8>),
}

fn put_name(buf: &mut Vec<u8>, name: &str) -> io::Result<()> {
    buf.write_u16::<NativeEndian>(name.len() as u16)?;
    buf.write_all(name.as_bytes())
}

fn put_int(buf: &mut Vec<u8>, name: &str, value: i64) -> io::Result<()> {
    put_name(buf, name)?;
    buf.write_u8(TAG_INT64)?;
    buf.write_i64::<NativeEndian>(value)
}

fn put_bytes(buf: &mut Vec<u8>, name: &str, value: &[u8]) -> io::Result<()> {
    put_name(buf, name)?;
    buf.write_u8(TAG_BYTES)?;
    buf.write_u64::<NativeEndian>(value.len() as u64)?;
    buf.write_all(value)
}

fn float_blob(values: impl ExactSizeIterator<Item = f64>, precision: Precision) -> Vec<u8> {
    let width = precision.byte_width();
    let mut out = vec![0u8; values.len() * width];
    for (chunk, v) in out.chunks_exact_mut(width).zip(values) {
        match precision {
            Precision::Single => NativeEndian::write_f32(chunk, v as f32),
            Precision::Double => NativeEndian::write_f64(chunk, v),
        }
    }
    out
}

fn read_floats(bytes: &[u8], precision: Precision) -> Vec<f64> {
    bytes
        .chunks_exact(precision.byte_width())
        .map(|chunk| match precision {
            Precision::Single => NativeEndian::read_f32(chunk) as f64,
            Precision::Double => NativeEndian::read_f64(chunk),
        })
        .collect()
}

fn decode_fields(payload: &[u8]) -> io::Result<HashMap<String, Field>> {
    let mut cursor = Cursor::new(payload);
    let count = cursor.read_u32::<NativeEndian>()?;
    let mut fields = HashMap::new();

    for _ in 0..count {
        let name_len = cursor.read_u16::<NativeEndian>()? as usize;
        let mut name = vec![0u8; name_len];
        cursor.read_exact(&mut name)?;
        let name = String::from_utf8(name)
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "field name is not UTF-8"))?;

        let value = match cursor.read_u8()? {
            TAG_INT64 => Field::Int(cursor.read_i64::<NativeEndian>()?),
            TAG_BYTES => {
                let len = cursor.read_u64::<NativeEndian>()?;
                let remaining = (payload.len() as u64).saturating_sub(cursor.position());
                if len > remaining {
                    return Err(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        format!("field '{name}' declares {len} bytes, only {remaining} remain"),
                    ));
                }
                let mut bytes = vec![0u8; len as usize];
                cursor.read_exact(&mut bytes)?;
                Field::Bytes(bytes)
            }
            tag => {
                return Err(io::Error::new(
                    ErrorKind::InvalidData,
                    format!("field '{name}' has unknown kind tag {tag}"),
                ));
            }
        };
        fields.insert(name, value);
    }

    if cursor.position() as usize != payload.len() {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "trailing bytes after the last field",
        ));
    }
    Ok(fields)
}

/// Appends length-prefixed records to a byte sink.
pub struct RecordWriter<W: Write> {
    writer: W,
    precision: Precision,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W, precision: Precision) -> Self {
        Self {
            writer,
            precision,
            written: 0,
        }
    }

    pub fn write(&mut self, record: &Record) -> Result<(), Error> {
        let payload = record.encode(self.precision)?;
        self.writer.write_u64::<NativeEndian>(payload.len() as u64)?;
        self.writer.write_all(&payload)?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far.
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the underlying sink.
    pub fn finish(mut self) -> Result<W, Error> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Reads records back in file order.
pub struct RecordReader<R: Read> {
    reader: R,
    precision: Precision,
    index: usize,
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R, precision: Precision) -> Self {
        Self {
            reader,
            precision,
            index: 0,
        }
    }

    /// Returns the next record, or `None` at a clean end of input.
    pub fn next_record(&mut self) -> Result<Option<Record>, Error> {
        let Some(len) = self.read_length()? else {
            return Ok(None);
        };
        let mut payload = Vec::new();
        (&mut self.reader).take(len).read_to_end(&mut payload)?;
        if payload.len() as u64 != len {
            return Err(Error::record(
                self.index,
                format!("payload truncated (expected {len} bytes)"),
            ));
        }
        let record = Record::decode(&payload, self.precision, self.index)?;
        self.index += 1;
        Ok(Some(record))
    }

    fn read_length(&mut self) -> Result<Option<u64>, Error> {
        let mut buf = [0u8; 8];
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        match filled {
            0 => Ok(None),
            8 => Ok(Some(NativeEndian::read_u64(&buf))),
            _ => Err(Error::record(self.index, "truncated length prefix")),
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

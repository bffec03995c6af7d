//! Readers and writers for every file the pipeline touches.
//!
//! - [`norm`] – the `mean_and_std_for_kim_ann` normalization side file
//! - [`record`] – the serialized fingerprint dataset
//! - [`extxyz`] – extended-XYZ configuration files
//! - [`checkpoint`] – JSON model checkpoints
//! - [`fmt`] – printf-compatible float formatting shared by the text writers

use std::fmt as stdfmt;

pub mod checkpoint;
pub mod error;
pub mod extxyz;
pub mod fmt;
pub mod norm;
pub mod record;

pub use error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Extxyz,
    Normalization,
    Records,
    Checkpoint,
}

impl stdfmt::Display for Format {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        match self {
            Format::Extxyz => write!(f, "extended XYZ"),
            Format::Normalization => write!(f, "normalization"),
            Format::Records => write!(f, "record"),
            Format::Checkpoint => write!(f, "checkpoint"),
        }
    }
}

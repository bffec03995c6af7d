//! JSON model checkpoints.
//!
//! A checkpoint stores the descriptor size, the precision and the layer list.
//! Loading replays the layers through [`Model::add_layers`], so a checkpoint
//! never yields a model that would fail to lock.

use super::error::Error;
use crate::model::precision::Precision;
use crate::network::{Layer, Model};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

#[derive(Debug, Serialize, Deserialize)]
struct Checkpoint {
    descriptor_size: usize,
    #[serde(default)]
    precision: Precision,
    layers: Vec<Layer>,
}

pub fn save<W: Write>(mut writer: W, model: &Model) -> Result<(), Error> {
    let checkpoint = Checkpoint {
        descriptor_size: model.descriptor_size(),
        precision: model.precision(),
        layers: model.layers().to_vec(),
    };
    serde_json::to_writer_pretty(&mut writer, &checkpoint)?;
    writeln!(writer)?;
    Ok(())
}

pub fn load<R: Read>(reader: R) -> Result<Model, Error> {
    let checkpoint: Checkpoint = serde_json::from_reader(reader)?;
    let mut model = Model::new(checkpoint.descriptor_size).with_precision(checkpoint.precision);
    model.add_layers(checkpoint.layers)?;
    Ok(model)
}

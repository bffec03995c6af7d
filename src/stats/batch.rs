use super::error::Error;
use crate::descriptor::Descriptor;
use crate::model::{configuration::Configuration, fingerprint::Fingerprint};
use crate::normalize::NormStats;
use ndarray::{Array2, Axis};
use rayon::prelude::*;

/// Computes every fingerprint in parallel, stacks them and takes exact
/// two-pass statistics with the `n - 1` denominator.
///
/// The fingerprints are returned alongside the statistics so callers can
/// normalize and serialize them without recomputing. `workers` selects a
/// dedicated pool size; `None` uses the global rayon pool.
///
/// All fingerprints and the stacked `rows * channels` matrix are held at
/// once. Their combined size is reserved up front, before any fingerprint is
/// computed; if that fails the function returns [`Error::OutOfMemory`]
/// instead of falling back.
pub fn batch_mean_and_std<D: Descriptor + ?Sized>(
    configs: &[Configuration],
    descriptor: &D,
    workers: Option<usize>,
) -> Result<(NormStats, Vec<Fingerprint>), Error> {
    if configs.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let channels = descriptor.channel_count();
    let mut rows: usize = 0;
    let mut dzeta_per_channel: usize = 0;
    for conf in configs {
        let n = conf.atom_count();
        rows = rows.saturating_add(n);
        dzeta_per_channel = n
            .checked_mul(3 * n)
            .and_then(|d| dzeta_per_channel.checked_add(d))
            .unwrap_or(usize::MAX);
    }
    check_capacity(rows, dzeta_per_channel, channels)?;

    let generate = || -> Result<Vec<Fingerprint>, Error> {
        configs
            .par_iter()
            .map(|conf| descriptor.generate(conf).map_err(Error::from))
            .collect()
    };
    let fingerprints = match workers {
        Some(n) => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?
            .install(generate)?,
        None => generate()?,
    };
    log::debug!(
        "statistics: generated {} fingerprints on {} workers",
        fingerprints.len(),
        workers.unwrap_or_else(rayon::current_num_threads)
    );

    for (conf, fp) in configs.iter().zip(&fingerprints) {
        if fp.channel_count() != channels {
            return Err(Error::ChannelDrift {
                id: conf.id().to_string(),
                expected: channels,
                actual: fp.channel_count(),
            });
        }
    }
    if rows < 2 {
        return Err(Error::TooFewSamples { rows });
    }

    let mut data: Vec<f64> = Vec::new();
    data.try_reserve_exact(rows * channels)
        .map_err(|_| Error::OutOfMemory { rows, channels })?;
    for fp in &fingerprints {
        data.extend(fp.zeta.iter().copied());
    }
    let stacked = Array2::from_shape_vec((rows, channels), data)
        .map_err(|_| Error::OutOfMemory { rows, channels })?;

    let mean = stacked
        .mean_axis(Axis(0))
        .ok_or(Error::TooFewSamples { rows })?;
    let std = stacked.std_axis(Axis(0), 1.0);
    Ok((NormStats::new(mean, std), fingerprints))
}

/// Reserves the zeta rows twice (fingerprints and stack) plus every
/// derivative tensor, then releases the reservation.
fn check_capacity(rows: usize, dzeta_per_channel: usize, channels: usize) -> Result<(), Error> {
    let out_of_memory = || Error::OutOfMemory { rows, channels };
    let total = rows
        .checked_mul(2)
        .and_then(|zeta| zeta.checked_add(dzeta_per_channel))
        .and_then(|per_channel| per_channel.checked_mul(channels))
        .ok_or_else(out_of_memory)?;

    let mut reservation: Vec<f64> = Vec::new();
    reservation.try_reserve_exact(total).map_err(|_| out_of_memory())?;
    log::debug!(
        "statistics: reserved {} floats for {rows} atoms x {channels} channels",
        total
    );
    Ok(())
}

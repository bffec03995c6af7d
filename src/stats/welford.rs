use super::error::Error;
use crate::descriptor::Descriptor;
use crate::model::configuration::Configuration;
use crate::normalize::NormStats;
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Running per-channel mean and variance.
///
/// Rows are folded one at a time, so memory stays `O(channels)` however large
/// the dataset.
#[derive(Debug, Clone)]
pub struct Welford {
    n: usize,
    mean: Array1<f64>,
    m2: Array1<f64>,
}

impl Welford {
    pub fn new(channels: usize) -> Self {
        Self {
            n: 0,
            mean: Array1::zeros(channels),
            m2: Array1::zeros(channels),
        }
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.mean.len()
    }

    /// # Panics
    ///
    /// Panics if `row` does not have [`channel_count`](Self::channel_count) entries.
    pub fn push(&mut self, row: ArrayView1<f64>) {
        self.n += 1;
        let n = self.n as f64;
        for ((mean, m2), &x) in self.mean.iter_mut().zip(self.m2.iter_mut()).zip(row) {
            let delta = x - *mean;
            *mean += delta / n;
            let delta2 = x - *mean;
            *m2 += delta * delta2;
        }
    }

    pub fn push_rows(&mut self, rows: ArrayView2<f64>) {
        for row in rows.rows() {
            self.push(row);
        }
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Sample statistics with the `n - 1` denominator.
    pub fn finish(self) -> Result<NormStats, Error> {
        if self.n < 2 {
            return Err(Error::TooFewSamples { rows: self.n });
        }
        let denom = (self.n - 1) as f64;
        let std = self.m2.mapv(|m2| (m2 / denom).sqrt());
        Ok(NormStats::new(self.mean, std))
    }
}

/// Streams every configuration through `descriptor` once, in order.
pub fn welford_mean_and_std<D: Descriptor + ?Sized>(
    configs: &[Configuration],
    descriptor: &D,
) -> Result<NormStats, Error> {
    if configs.is_empty() {
        return Err(Error::EmptyDataset);
    }

    let channels = descriptor.channel_count();
    let mut acc = Welford::new(channels);
    for (i, conf) in configs.iter().enumerate() {
        let fp = descriptor.generate(conf)?;
        if fp.channel_count() != channels {
            return Err(Error::ChannelDrift {
                id: conf.id().to_string(),
                expected: channels,
                actual: fp.channel_count(),
            });
        }
        acc.push_rows(fp.zeta.view());
        if i % 100 == 0 {
            log::debug!("statistics: processed configuration {i}");
        }
    }
    log::debug!(
        "statistics: {} configurations, {} rows",
        configs.len(),
        acc.count()
    );
    acc.finish()
}

use ann_forge::{Activation, Precision, StatsStrategy};

use crate::cli::{self, ActivationArg, PrecisionArg, StatsMethod};

impl From<PrecisionArg> for Precision {
    fn from(p: PrecisionArg) -> Self {
        match p {
            PrecisionArg::Single => Self::Single,
            PrecisionArg::Double => Self::Double,
        }
    }
}

impl From<ActivationArg> for Activation {
    fn from(a: ActivationArg) -> Self {
        match a {
            ActivationArg::Sigmoid => Self::Sigmoid,
            ActivationArg::Tanh => Self::Tanh,
            ActivationArg::Relu => Self::Relu,
            ActivationArg::Elu => Self::Elu,
        }
    }
}

pub fn build_stats_strategy(opts: &cli::StatsOptions) -> StatsStrategy {
    match opts.method {
        StatsMethod::Welford => StatsStrategy::Welford,
        StatsMethod::Batch => StatsStrategy::Batch {
            workers: opts.workers,
        },
    }
}

pub fn strategy_display_name(strategy: StatsStrategy) -> String {
    match strategy {
        StatsStrategy::Welford => "Welford (streaming)".to_string(),
        StatsStrategy::Batch { workers: None } => "batch (all cores)".to_string(),
        StatsStrategy::Batch { workers: Some(n) } => format!("batch ({} workers)", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workers_only_apply_to_batch() {
        let opts = cli::StatsOptions {
            method: StatsMethod::Welford,
            workers: Some(4),
        };
        assert_eq!(build_stats_strategy(&opts), StatsStrategy::Welford);

        let opts = cli::StatsOptions {
            method: StatsMethod::Batch,
            workers: Some(4),
        };
        assert_eq!(
            build_stats_strategy(&opts),
            StatsStrategy::Batch { workers: Some(4) }
        );
    }

    #[test]
    fn strategy_names() {
        assert_eq!(
            strategy_display_name(StatsStrategy::Batch { workers: Some(2) }),
            "batch (2 workers)"
        );
        assert_eq!(
            strategy_display_name(StatsStrategy::Welford),
            "Welford (streaming)"
        );
    }
}

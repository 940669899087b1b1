
use std::time::Instant;

use crate::error::Result;

/// Quantiles requested from the benchmarker for each candidate: the median
/// bracketed by p20 and p80.
pub const QUANTILES: (f64, f64, f64) = (0.5, 0.2, 0.8);

/// Runtime quantile triple for one candidate, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timings {
    pub median: f64,
    pub low: f64,
    pub high: f64,
}

impl Timings {
    /// Sentinel for a candidate that could not be measured at all.
    pub const INFINITE: Timings = Timings {
        median: f64::INFINITY,
        low: f64::INFINITY,
        high: f64::INFINITY,
    };
}

/// Measures one call closure and reports the requested runtime quantiles.
///
/// The closure performs a full hooked launch; errors it returns must
/// propagate unchanged so the measurement harness can classify them.
pub type Benchmarker =
    Box<dyn FnMut(&mut dyn FnMut() -> Result<()>, (f64, f64, f64)) -> Result<Timings>>;

/// Host wall-clock benchmarker: `warmup` untimed runs, then `rep` timed
/// runs, quantiles by linear interpolation over the sorted samples.
pub fn wall_clock(warmup: u32, rep: u32) -> Benchmarker {
    Box::new(move |call, quantiles| {
        for _ in 0..warmup {
            call()?;
        }
        let mut samples = Vec::with_capacity(rep.max(1) as usize);
        for _ in 0..rep.max(1) {
            let started = Instant::now();
            call()?;
            samples.push(started.elapsed().as_secs_f64() * 1e3);
        }
        samples.sort_by(f64::total_cmp);
        let (q50, q_lo, q_hi) = quantiles;
        Ok(Timings {
            median: quantile(&samples, q50),
            low: quantile(&samples, q_lo),
            high: quantile(&samples, q_hi),
        })
    })
}

pub(crate) fn default_benchmarker() -> Benchmarker {
    wall_clock(5, 25)
}

/// Linear-interpolation quantile over an ascending, non-empty sample slice.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}

/// Arithmetic mean of a non-empty sample slice.
pub(crate) fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Unbiased sample variance; callers guard for fewer than two samples.
pub(crate) fn variance(samples: &[f64]) -> f64 {
    let m = mean(samples);
    samples.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (samples.len() - 1) as f64
}

use std::collections::HashMap;

use crate::arg::{ArgMap, ArgValue};
use crate::bench::{mean, variance};
use crate::config::ConfigId;
use crate::driver::Device;
use crate::error::{Error, Result};
use crate::kernel::Kernel;

use super::key::CacheKey;
use super::{Entry, SampleState, TunerBase};

/// Confidence-interval elimination.
///
/// Each candidate's sample list induces a `mean ± ratio * variance`
/// interval, with the conventions that an unsampled candidate sits at
/// `(+inf, +inf)` and a single sample makes the interval unbounded. Every
/// call samples the candidate with the smallest lower bound until its
/// upper bound undercuts every competitor's lower bound, then commits to
/// it. A candidate dominates when its pessimistic estimate still beats
/// everyone else's optimistic one; `ratio` scales how much evidence that
/// takes.
pub(crate) struct Confidence {
    ratio: f64,
    pub(crate) cache: HashMap<CacheKey, Entry>,
}

fn bounds(times: &[f64], ratio: f64) -> (f64, f64) {
    let mean = if times.is_empty() {
        f64::INFINITY
    } else {
        mean(times)
    };
    let var = match times.len() {
        0 => 0.0,
        1 => f64::INFINITY,
        _ => variance(times),
    };
    (mean - ratio * var, mean + ratio * var)
}

fn times_of(state: Option<&SampleState>) -> &[f64] {
    match state {
        Some(SampleState::Samples(times)) => times,
        _ => &[],
    }
}

impl Confidence {
    pub(crate) fn new(ratio: f64) -> Self {
        Self {
            ratio,
            cache: HashMap::new(),
        }
    }

    pub(crate) fn run<K: Kernel, D: Device>(
        &mut self,
        base: &mut TunerBase<K, D>,
        args: &[ArgValue],
        kwargs: &ArgMap,
    ) -> Result<K::Output> {
        let key = base.cache_key(kwargs);
        loop {
            let (id, exploring) = self.choose(base, &key, kwargs)?;
            let current = base.merged_meta(kwargs, id)?;
            if let Some(pre_hook) = base.configs.get(id).pre_hook.as_deref() {
                pre_hook(&base.full_nargs(&current));
            }
            match base.timed_run(args, &current, exploring) {
                Ok((out, cost)) => {
                    if let Some(cost) = cost {
                        self.record_sample(&key, id, cost);
                    }
                    return Ok(out);
                }
                Err(err @ Error::OutOfResources { .. }) => {
                    base.print_failure(id, &err);
                    if exploring {
                        self.mark_failed(&key, id);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn choose<K: Kernel, D: Device>(
        &mut self,
        base: &TunerBase<K, D>,
        key: &CacheKey,
        kwargs: &ArgMap,
    ) -> Result<(ConfigId, bool)> {
        let ratio = self.ratio;
        let entry = self.cache.entry(key.clone()).or_insert_with(Entry::exploring);
        let samples = match entry {
            Entry::Decided(id) => return Ok((*id, false)),
            Entry::Exploring(samples) => samples,
        };

        let live: Vec<ConfigId> = base
            .prune(kwargs)
            .into_iter()
            .filter(|id| !matches!(samples.get(id), Some(SampleState::Failed)))
            .collect();

        let mut best: Option<(ConfigId, f64)> = None;
        for &id in &live {
            let (lower, _) = bounds(times_of(samples.get(&id)), ratio);
            if best.map_or(true, |(_, b)| lower < b) {
                best = Some((id, lower));
            }
        }
        let Some((winner, _)) = best else {
            return Err(Error::NoViableConfig);
        };

        let (_, upper) = bounds(times_of(samples.get(&winner)), ratio);
        let dominated = samples.iter().all(|(id, state)| {
            if *id == winner {
                return true;
            }
            match state {
                SampleState::Failed => true,
                SampleState::Samples(times) => bounds(times, ratio).0 >= upper,
            }
        });
        if dominated {
            log::debug!("confidence committed to `{}`", base.configs.get(winner));
            *entry = Entry::Decided(winner);
            return Ok((winner, false));
        }
        Ok((winner, true))
    }

    fn record_sample(&mut self, key: &CacheKey, id: ConfigId, cost: f64) {
        if let Some(Entry::Exploring(samples)) = self.cache.get_mut(key) {
            if let SampleState::Samples(times) = samples
                .entry(id)
                .or_insert_with(|| SampleState::Samples(Vec::new()))
            {
                times.push(cost);
            }
        }
    }

    fn mark_failed(&mut self, key: &CacheKey, id: ConfigId) {
        if let Some(Entry::Exploring(samples)) = self.cache.get_mut(key) {
            samples.insert(id, SampleState::Failed);
        }
    }
}

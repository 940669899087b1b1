use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::arg::{ArgMap, ArgValue};
use crate::bench::mean;
use crate::config::ConfigId;
use crate::driver::Device;
use crate::error::{Error, Result};
use crate::kernel::Kernel;

use super::key::CacheKey;
use super::{Entry, SampleState, TunerBase};

/// Bounded-trial random exploration.
///
/// Until every candidate for a key either failed or accumulated `min_try`
/// samples, each call launches a uniformly random eligible candidate and
/// records its device-event time. The first call with nothing left to
/// sample commits to the candidate with the smallest mean.
pub(crate) struct Stepwise {
    min_try: usize,
    rng: StdRng,
    pub(crate) cache: HashMap<CacheKey, Entry>,
}

impl Stepwise {
    pub(crate) fn new(min_try: usize, rng: StdRng) -> Self {
        Self {
            min_try,
            rng,
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
        let entry = self.cache.entry(key.clone()).or_insert_with(Entry::exploring);
        let samples = match entry {
            Entry::Decided(id) => return Ok((*id, false)),
            Entry::Exploring(samples) => samples,
        };

        let min_try = self.min_try;
        let eligible: Vec<ConfigId> = base
            .prune(kwargs)
            .into_iter()
            .filter(|id| match samples.get(id) {
                None => true,
                Some(SampleState::Samples(times)) => times.len() < min_try,
                Some(SampleState::Failed) => false,
            })
            .collect();
        if let Some(&id) = eligible.choose(&mut self.rng) {
            return Ok((id, true));
        }

        // Nothing left to sample under this key: commit to the best mean.
        let mut scored: Vec<(ConfigId, f64)> = samples
            .iter()
            .filter_map(|(id, state)| match state {
                SampleState::Samples(times) if !times.is_empty() => Some((*id, mean(times))),
                _ => None,
            })
            .collect();
        scored.sort_unstable_by_key(|(id, _)| *id);
        let mut best: Option<(ConfigId, f64)> = None;
        for (id, m) in scored {
            if best.map_or(true, |(_, b)| m < b) {
                best = Some((id, m));
            }
        }
        let (id, m) = best.ok_or(Error::NoViableConfig)?;
        log::debug!("stepwise committed to `{}` at {m:.3}ms mean", base.configs.get(id));
        *entry = Entry::Decided(id);
        Ok((id, false))
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

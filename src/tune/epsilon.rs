use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::arg::{ArgMap, ArgValue};
use crate::config::ConfigId;
use crate::driver::Device;
use crate::error::{Error, Result};
use crate::kernel::Kernel;

use super::key::CacheKey;
use super::TunerBase;

/// Per-key state: the incumbent, the current exploration probability and
/// the best time seen so far.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Arm {
    pub(crate) candidate: Option<ConfigId>,
    pub(crate) epsilon: f64,
    pub(crate) best_ms: f64,
}

/// ε-greedy exploration with decay.
///
/// Explores with probability ε (mandatory on a fresh key), picking a
/// uniform candidate other than the incumbent, and measures it. An
/// improvement replaces the incumbent and resets ε; anything else decays
/// ε by `1 - decay`. The policy never commits: exploration merely becomes
/// rare as the incumbent keeps winning.
pub(crate) struct Epsilon {
    epsilon: f64,
    decay: f64,
    rng: StdRng,
    pub(crate) cache: HashMap<CacheKey, Arm>,
}

impl Epsilon {
    pub(crate) fn new(epsilon: f64, decay: f64, rng: StdRng) -> Self {
        Self {
            epsilon,
            decay,
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
            let (candidate, epsilon, best_ms, exploring) = match self.cache.get(&key) {
                Some(arm) => (
                    arm.candidate,
                    arm.epsilon,
                    arm.best_ms,
                    self.rng.gen::<f64>() < arm.epsilon,
                ),
                None => (None, self.epsilon, f64::INFINITY, true),
            };

            let mut picked = None;
            if exploring {
                let pool: Vec<ConfigId> = base
                    .prune(kwargs)
                    .into_iter()
                    .filter(|&id| Some(id) != candidate)
                    .collect();
                picked = pool.choose(&mut self.rng).copied();
            }
            let Some(id) = picked.or(candidate) else {
                return Err(Error::NoViableConfig);
            };

            let current = base.merged_meta(kwargs, id)?;
            if let Some(pre_hook) = base.configs.get(id).pre_hook.as_deref() {
                pre_hook(&base.full_nargs(&current));
            }
            match base.timed_run(args, &current, exploring) {
                Ok((out, cost)) => {
                    if let Some(cost) = cost {
                        let arm = if cost < best_ms {
                            Arm {
                                candidate: Some(id),
                                epsilon: self.epsilon,
                                best_ms: cost,
                            }
                        } else {
                            Arm {
                                candidate,
                                epsilon: epsilon * (1.0 - self.decay),
                                best_ms,
                            }
                        };
                        self.cache.insert(key.clone(), arm);
                    }
                    return Ok(out);
                }
                Err(err @ Error::OutOfResources { .. }) => base.print_failure(id, &err),
                Err(err) => return Err(err),
            }
        }
    }
}

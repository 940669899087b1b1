//! Policy-driven selection of kernel configurations.
//!
//! A tuner binds one [`Kernel`] to one of four selection policies. Each
//! [`Autotuner::run`] extracts a cache key from the arguments named in
//! `key` (plus the dtypes of buffer arguments), consults the per-key
//! policy state, and either exploits the current best config or explores
//! another candidate while measuring it:
//!
//! - `"default"` — benchmark every pruned candidate on the first call per
//!   key, cache the winner, exploit forever after.
//! - `"stepwise"` — sample random candidates until each has `min_try`
//!   timings (or failed), then commit to the best mean.
//! - `"epsilon"` — ε-greedy: explore with decaying probability, keep the
//!   incumbent otherwise; never commits.
//! - `"confidence"` — sample the candidate with the best optimistic bound
//!   until its pessimistic bound beats every competitor, then commit.
//!
//! Setting `TRITON_PRINT_AUTOTUNING=1` prints a one-line summary to stdout
//! when exhaustive tuning completes for a key, and whenever a candidate
//! exhausts device resources in the other policies.

mod confidence;
mod epsilon;
mod exhaustive;
mod hooks;
mod key;
mod prune;
mod stepwise;


use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;

pub use hooks::{PostHook, PreHook};
pub use key::{CacheKey, KeyPart};
pub use prune::{EarlyPrune, PerfModel, TopK};

use crate::arg::{ArgMap, ArgValue};
use crate::bench::{self, Benchmarker, Timings};
use crate::config::{Config, ConfigId, ConfigSet};
use crate::driver::{Device, DeviceEvent};
use crate::error::{Error, Result};
use crate::kernel::Kernel;

use confidence::Confidence;
use epsilon::Epsilon;
use exhaustive::Exhaustive;
use hooks::Hooks;
use prune::Pruner;
use stepwise::Stepwise;

/// Tuning options shared by all policies, plus the per-policy
/// hyper-parameters. Plain data; unused fields are ignored by the policy
/// that does not read them.
pub struct TunerOpts {
    /// Argument names whose values partition the cache. A change in any of
    /// them (or in a buffer dtype) triggers a fresh tuning trajectory.
    pub key: Vec<String>,
    /// Buffer arguments zeroed before every measured launch.
    pub reset_to_zero: Vec<String>,
    /// Buffer arguments snapshotted before and restored after every
    /// measured launch.
    pub restore_value: Vec<String>,
    /// Replaces the default reset/restore pre-hook.
    pub pre_hook: Option<PreHook>,
    /// Replaces the default restore post-hook.
    pub post_hook: Option<PostHook>,
    /// Candidate filter applied before model ranking.
    pub early_prune: Option<EarlyPrune>,
    /// Analytic runtime predictor for model ranking.
    pub perf_model: Option<PerfModel>,
    /// How many model-ranked candidates survive.
    pub top_k: TopK,
    /// Benchmarker for the exhaustive policy; host wall clock when unset.
    pub do_bench: Option<Benchmarker>,
    /// Stepwise: samples per candidate before committing.
    pub min_try: usize,
    /// Epsilon: initial exploration probability.
    pub epsilon: f64,
    /// Epsilon: per-non-improvement decay of the exploration probability.
    pub decay: f64,
    /// Confidence: width multiplier on the sample variance.
    pub ratio: f64,
    /// Seed for the exploration RNG; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for TunerOpts {
    fn default() -> Self {
        Self {
            key: Vec::new(),
            reset_to_zero: Vec::new(),
            restore_value: Vec::new(),
            pre_hook: None,
            post_hook: None,
            early_prune: None,
            perf_model: None,
            top_k: TopK::Frac(1.0),
            do_bench: None,
            min_try: 20,
            epsilon: 1.0,
            decay: 0.001,
            ratio: 3.0,
            seed: None,
        }
    }
}

/// Per-candidate timing state within one cache key.
#[derive(Debug)]
pub(crate) enum SampleState {
    Samples(Vec<f64>),
    /// The candidate raised `OutOfResources` under this key; never retried.
    Failed,
}

/// Per-key cache payload of the sampling policies.
#[derive(Debug)]
pub(crate) enum Entry {
    Decided(ConfigId),
    Exploring(HashMap<ConfigId, SampleState>),
}

impl Entry {
    fn exploring() -> Self {
        Self::Exploring(HashMap::new())
    }
}

pub(crate) fn print_enabled() -> bool {
    std::env::var("TRITON_PRINT_AUTOTUNING").is_ok_and(|v| v == "1")
}

/// State shared by every policy: the kernel, the device, the candidate
/// set, and the measurement plumbing.
pub(crate) struct TunerBase<K: Kernel, D: Device> {
    pub(crate) kernel: K,
    pub(crate) device: D,
    pub(crate) configs: ConfigSet,
    pub(crate) keys: Vec<String>,
    pub(crate) arg_names: Vec<String>,
    pub(crate) hooks: Hooks,
    pub(crate) pruner: Pruner,
    pub(crate) do_bench: Benchmarker,
    /// Positional arguments bound by name, populated for the duration of
    /// one `run`/`warmup` and cleared afterwards.
    pub(crate) nargs: ArgMap,
}

impl<K: Kernel, D: Device> TunerBase<K, D> {
    fn set_nargs(&mut self, args: &[ArgValue]) {
        self.nargs = self
            .arg_names
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
    }

    pub(crate) fn cache_key(&self, kwargs: &ArgMap) -> CacheKey {
        key::extract(&self.arg_names, &self.keys, &self.nargs, kwargs)
    }

    pub(crate) fn prune(&self, kwargs: &ArgMap) -> Vec<ConfigId> {
        self.pruner.prune(&self.configs, &self.nargs, kwargs)
    }

    /// Caller overrides merged with the candidate's meta-parameters.
    ///
    /// A name supplied both by the caller and by the config is a
    /// [`ConflictingMetaParameters`](Error::ConflictingMetaParameters)
    /// error on every launch path, measured or not.
    pub(crate) fn merged_meta(&self, kwargs: &ArgMap, id: ConfigId) -> Result<ArgMap> {
        let config = self.configs.get(id);
        let mut conflicts: Vec<&str> = kwargs
            .keys()
            .map(String::as_str)
            .filter(|name| config.kwargs().contains_key(*name))
            .collect();
        if !conflicts.is_empty() {
            conflicts.sort_unstable();
            return Err(Error::ConflictingMetaParameters(conflicts.join(", ")));
        }
        let mut merged = kwargs.clone();
        merged.extend(config.all_kwargs());
        Ok(merged)
    }

    /// `nargs ⊕ current`: the full mapping handed to hooks.
    pub(crate) fn full_nargs(&self, current: &ArgMap) -> ArgMap {
        let mut full = self.nargs.clone();
        full.extend(current.iter().map(|(k, v)| (k.clone(), v.clone())));
        full
    }

    /// Measures one candidate through the benchmarker: config pre-hook,
    /// tuner pre-hook, launch, tuner post-hook, repeated as the benchmarker
    /// sees fit. Resource exhaustion and compile-time assertion failures
    /// yield infinite timings instead of propagating.
    pub(crate) fn bench(&mut self, args: &[ArgValue], kwargs: &ArgMap, id: ConfigId) -> Result<Timings> {
        let current = self.merged_meta(kwargs, id)?;
        let full_nargs = self.full_nargs(&current);
        let config_hook = self.configs.get(id).pre_hook.clone();

        let TunerBase {
            kernel,
            hooks,
            do_bench,
            ..
        } = self;
        let mut call = || -> Result<()> {
            if let Some(hook) = config_hook.as_deref() {
                hook(&full_nargs);
            }
            hooks.fire_pre(&full_nargs, false);
            match kernel.run(args, &current) {
                Ok(_) => {
                    hooks.fire_post(&full_nargs, None);
                    Ok(())
                }
                Err(err) => {
                    hooks.fire_post(&full_nargs, Some(&err));
                    Err(err)
                }
            }
        };

        match do_bench(&mut call, bench::QUANTILES) {
            Ok(timings) => Ok(timings),
            Err(Error::OutOfResources { .. }) | Err(Error::CompileTimeAssertion(_)) => {
                Ok(Timings::INFINITE)
            }
            Err(err) => Err(err),
        }
    }

    /// One launch for the sampling policies, bracketed by a device event
    /// pair when `timed`. Returns the kernel result and the elapsed
    /// milliseconds of a timed launch.
    pub(crate) fn timed_run(
        &mut self,
        args: &[ArgValue],
        current: &ArgMap,
        timed: bool,
    ) -> Result<(K::Output, Option<f64>)> {
        let timer = if timed {
            let mut start = self.device.event();
            let end = self.device.event();
            start.record();
            Some((start, end))
        } else {
            None
        };
        let out = self.kernel.run(args, current)?;
        let cost = timer.map(|(start, mut end)| {
            end.record();
            self.device.synchronize();
            end.elapsed_ms(&start)
        });
        Ok((out, cost))
    }

    pub(crate) fn print_failure(&self, id: ConfigId, err: &Error) {
        log::warn!("config `{}` failed: {err}", self.configs.get(id));
        if print_enabled() {
            let args_display: Vec<String> = self
                .keys
                .iter()
                .filter_map(|k| self.nargs.get(k).map(|v| format!("{k}: {v}")))
                .collect();
            println!(
                "autotuning for kernel `{}` failed on config `{}` with args `[{}]`",
                self.kernel.name(),
                self.configs.get(id),
                args_display.join(", "),
            );
        }
    }
}

pub(crate) enum Policy {
    Exhaustive(Exhaustive),
    Stepwise(Stepwise),
    Epsilon(Epsilon),
    Confidence(Confidence),
}

/// A kernel bound to a selection policy.
///
/// Not reentrant: `run` takes `&mut self`, and buffer handles are
/// reference-counted without atomics, so a tuner stays on the thread that
/// created it. Distinct tuners are fully independent.
pub struct Autotuner<K: Kernel, D: Device> {
    base: TunerBase<K, D>,
    policy: Policy,
}

impl<K: Kernel, D: Device> std::fmt::Debug for Autotuner<K, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autotuner").finish_non_exhaustive()
    }
}

impl<K: Kernel, D: Device> Autotuner<K, D> {
    /// Binds `kernel` to the policy named `policy`; one of `"default"`,
    /// `"stepwise"`, `"epsilon"` or `"confidence"`, anything else is
    /// [`Error::UnknownPolicy`]. An empty candidate list gets the single
    /// all-defaults [`Config`].
    pub fn new(
        kernel: K,
        device: D,
        policy: &str,
        configs: Vec<Config>,
        opts: TunerOpts,
    ) -> Result<Self> {
        let configs = if configs.is_empty() {
            vec![Config::default()]
        } else {
            configs
        };
        let TunerOpts {
            key,
            reset_to_zero,
            restore_value,
            pre_hook,
            post_hook,
            early_prune,
            perf_model,
            top_k,
            do_bench,
            min_try,
            epsilon,
            decay,
            ratio,
            seed,
        } = opts;

        let rng = || match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let chosen = match policy {
            "default" => Policy::Exhaustive(Exhaustive::new()),
            "stepwise" => Policy::Stepwise(Stepwise::new(min_try, rng())),
            "epsilon" => Policy::Epsilon(Epsilon::new(epsilon, decay, rng())),
            "confidence" => Policy::Confidence(Confidence::new(ratio)),
            other => return Err(Error::UnknownPolicy(other.to_owned())),
        };
        log::debug!(
            "autotuner for kernel `{}` using policy `{policy}` over {} candidates",
            kernel.name(),
            configs.len(),
        );

        let arg_names = kernel.arg_names().to_vec();
        let base = TunerBase {
            kernel,
            device,
            configs: ConfigSet::new(configs),
            keys: key,
            arg_names,
            hooks: Hooks::new(reset_to_zero, restore_value, pre_hook, post_hook),
            pruner: Pruner {
                early: early_prune,
                perf_model,
                top_k,
            },
            do_bench: do_bench.unwrap_or_else(bench::default_benchmarker),
            nargs: ArgMap::new(),
        };
        Ok(Self {
            base,
            policy: chosen,
        })
    }

    /// Picks a config for these arguments, launches the kernel with it and
    /// returns the kernel result, updating the tuning state on the way.
    pub fn run(&mut self, args: &[ArgValue], kwargs: &ArgMap) -> Result<K::Output> {
        self.base.set_nargs(args);
        let out = match &mut self.policy {
            Policy::Exhaustive(policy) => policy.run(&mut self.base, args, kwargs),
            Policy::Stepwise(policy) => policy.run(&mut self.base, args, kwargs),
            Policy::Epsilon(policy) => policy.run(&mut self.base, args, kwargs),
            Policy::Confidence(policy) => policy.run(&mut self.base, args, kwargs),
        };
        self.base.nargs.clear();
        out
    }

    /// Compiles every pruned candidate ahead of time, without measuring,
    /// and returns the compilation results in candidate order.
    pub fn warmup(&mut self, args: &[ArgValue], kwargs: &ArgMap) -> Result<Vec<K::Compiled>> {
        self.base.set_nargs(args);
        let out = (|| {
            let pruned = self.base.prune(kwargs);
            let mut compiled = Vec::with_capacity(pruned.len());
            for id in pruned {
                let current = self.base.merged_meta(kwargs, id)?;
                compiled.push(self.base.kernel.warmup(args, &current)?);
            }
            Ok(compiled)
        })();
        self.base.nargs.clear();
        out
    }

    /// The winner of the most recent exhaustive `run`, if any. The other
    /// policies keep their state per cache key and report nothing here.
    pub fn best_config(&self) -> Option<&Config> {
        match &self.policy {
            Policy::Exhaustive(policy) => policy.best.map(|id| self.base.configs.get(id)),
            _ => None,
        }
    }

    /// The candidate set, in the order ids were assigned.
    pub fn configs(&self) -> &ConfigSet {
        &self.base.configs
    }
}

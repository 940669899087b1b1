use crate::arg::ArgMap;
use crate::config::{ConfigId, ConfigSet};

/// User callback that prunes the candidate set before any model ranking.
/// Receives the full set, the bound positional arguments and the caller
/// overrides; returns the surviving ids.
pub type EarlyPrune = Box<dyn Fn(&ConfigSet, &ArgMap, &ArgMap) -> Vec<ConfigId>>;

/// Analytic runtime predictor, evaluated on the merged argument mapping
/// (bound arguments, caller overrides and the candidate's meta-parameters).
pub type PerfModel = Box<dyn Fn(&ArgMap) -> f64>;

/// How many model-ranked candidates survive pruning.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TopK {
    /// Fraction of the *original* candidate count, when at most 1.0; larger
    /// values are truncated and used as a count.
    Frac(f64),
    Count(usize),
}

pub(crate) struct Pruner {
    pub(crate) early: Option<EarlyPrune>,
    pub(crate) perf_model: Option<PerfModel>,
    pub(crate) top_k: TopK,
}

impl Pruner {
    /// Pure candidate filtering: early prune first, then keep the `top_k`
    /// candidates with the smallest predicted runtimes. Ranking is stable,
    /// so predicted ties keep their candidate order.
    pub(crate) fn prune(
        &self,
        configs: &ConfigSet,
        nargs: &ArgMap,
        kwargs: &ArgMap,
    ) -> Vec<ConfigId> {
        let mut pruned = match &self.early {
            Some(early) => early(configs, nargs, kwargs),
            None => configs.ids().collect(),
        };

        if let Some(model) = &self.perf_model {
            let top_k = match self.top_k {
                TopK::Frac(f) if f <= 1.0 => (configs.len() as f64 * f) as usize,
                TopK::Frac(f) => f as usize,
                TopK::Count(n) => n,
            };
            if pruned.len() > top_k {
                let mut predicted: Vec<(ConfigId, f64)> = pruned
                    .iter()
                    .map(|&id| {
                        let mut full = nargs.clone();
                        full.extend(kwargs.iter().map(|(k, v)| (k.clone(), v.clone())));
                        full.extend(configs.get(id).all_kwargs());
                        (id, model(&full))
                    })
                    .collect();
                predicted.sort_by(|a, b| a.1.total_cmp(&b.1));
                log::debug!(
                    "perf model pruned {} candidates down to {top_k}",
                    pruned.len(),
                );
                pruned = predicted.into_iter().take(top_k).map(|(id, _)| id).collect();
            }
        }
        pruned
    }
}

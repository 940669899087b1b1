
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::arg::{ArgMap, ArgValue};
use crate::error::{Error, Result};

/// Hook run with the full argument mapping right before a config launches.
pub type ConfigHook = Rc<dyn Fn(&ArgMap)>;

/// Names reserved for the compiler hints; user meta-parameters must not
/// shadow them.
const HINT_NAMES: [&str; 8] = [
    "num_warps",
    "num_ctas",
    "num_stages",
    "num_buffers_warp_spec",
    "num_consumer_groups",
    "reg_dec_producer",
    "reg_inc_consumer",
    "maxnreg",
];

/// One candidate kernel parameterization for the auto-tuner to try.
///
/// A config carries the user meta-parameters (`kwargs`) plus the compiler
/// hints: `num_warps` controls how many warps cooperate per kernel instance,
/// `num_stages` how deep the compiler software-pipelines loops, `num_ctas`
/// the block-cluster size, and `maxnreg` the per-thread register cap. The
/// warp-specialization knobs (`num_buffers_warp_spec`, `num_consumer_groups`,
/// `reg_dec_producer`, `reg_inc_consumer`) default to off.
///
/// ```rust
/// use kernel_autotune::arg::ArgValue;
/// use kernel_autotune::config::Config;
///
/// let mut config = Config::new([("BLOCK_SIZE", ArgValue::Int(128))]).unwrap();
/// config.num_warps = 8;
/// assert_eq!(
///     config.to_string(),
///     "BLOCK_SIZE: 128, num_warps: 8, num_ctas: 1, num_stages: 2, \
///      num_buffers_warp_spec: 0, num_consumer_groups: 0, \
///      reg_dec_producer: 0, reg_inc_consumer: 0",
/// );
/// ```
#[derive(Clone)]
pub struct Config {
    kwargs: BTreeMap<String, ArgValue>,
    pub num_warps: u32,
    pub num_ctas: u32,
    pub num_stages: u32,
    pub num_buffers_warp_spec: u32,
    pub num_consumer_groups: u32,
    pub reg_dec_producer: u32,
    pub reg_inc_consumer: u32,
    pub maxnreg: Option<u32>,
    pub pre_hook: Option<ConfigHook>,
}

impl Config {
    /// Creates a config with the given meta-parameters and default hints.
    ///
    /// Fails with [`Error::ConflictingMetaParameters`] if a meta-parameter
    /// name shadows one of the compiler hints.
    pub fn new<'a, I>(kwargs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, ArgValue)>,
    {
        let kwargs: BTreeMap<String, ArgValue> = kwargs
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect();

        let shadowed: Vec<&str> = HINT_NAMES
            .iter()
            .copied()
            .filter(|name| kwargs.contains_key(*name))
            .collect();
        if !shadowed.is_empty() {
            return Err(Error::ConflictingMetaParameters(shadowed.join(", ")));
        }

        Ok(Self {
            kwargs,
            ..Self::default()
        })
    }

    /// The user meta-parameters, without the compiler hints.
    pub fn kwargs(&self) -> &BTreeMap<String, ArgValue> {
        &self.kwargs
    }

    /// Meta-parameters plus every set compiler hint, as passed to the
    /// kernel on launch. `maxnreg` appears only when set; no entry ever
    /// maps to a null-equivalent value.
    pub fn all_kwargs(&self) -> ArgMap {
        let mut all: ArgMap = self
            .kwargs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        all.insert("num_warps".into(), ArgValue::Int(self.num_warps.into()));
        all.insert("num_ctas".into(), ArgValue::Int(self.num_ctas.into()));
        all.insert("num_stages".into(), ArgValue::Int(self.num_stages.into()));
        all.insert(
            "num_buffers_warp_spec".into(),
            ArgValue::Int(self.num_buffers_warp_spec.into()),
        );
        all.insert(
            "num_consumer_groups".into(),
            ArgValue::Int(self.num_consumer_groups.into()),
        );
        all.insert(
            "reg_dec_producer".into(),
            ArgValue::Int(self.reg_dec_producer.into()),
        );
        all.insert(
            "reg_inc_consumer".into(),
            ArgValue::Int(self.reg_inc_consumer.into()),
        );
        if let Some(maxnreg) = self.maxnreg {
            all.insert("maxnreg".into(), ArgValue::Int(maxnreg.into()));
        }
        all
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kwargs: BTreeMap::new(),
            num_warps: 4,
            num_ctas: 1,
            num_stages: 2,
            num_buffers_warp_spec: 0,
            num_consumer_groups: 0,
            reg_dec_producer: 0,
            reg_inc_consumer: 0,
            maxnreg: None,
            pre_hook: None,
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.kwargs {
            write!(f, "{k}: {v}, ")?;
        }
        write!(f, "num_warps: {}", self.num_warps)?;
        write!(f, ", num_ctas: {}", self.num_ctas)?;
        write!(f, ", num_stages: {}", self.num_stages)?;
        write!(f, ", num_buffers_warp_spec: {}", self.num_buffers_warp_spec)?;
        write!(f, ", num_consumer_groups: {}", self.num_consumer_groups)?;
        write!(f, ", reg_dec_producer: {}", self.reg_dec_producer)?;
        write!(f, ", reg_inc_consumer: {}", self.reg_inc_consumer)?;
        if let Some(maxnreg) = self.maxnreg {
            write!(f, ", maxnreg: {maxnreg}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Config({self})")
    }
}

/// Dense config identity within one tuner.
///
/// Field-equal configs are still distinct candidates; caches key timing
/// state by index into the tuner's [`ConfigSet`], not by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigId(pub(crate) usize);

impl ConfigId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The candidate list of one tuner, fixed at construction.
pub struct ConfigSet {
    configs: Vec<Config>,
}

impl ConfigSet {
    pub(crate) fn new(configs: Vec<Config>) -> Self {
        Self { configs }
    }

    pub fn get(&self, id: ConfigId) -> &Config {
        &self.configs[id.0]
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ConfigId> + '_ {
        (0..self.configs.len()).map(ConfigId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConfigId, &Config)> {
        self.configs
            .iter()
            .enumerate()
            .map(|(i, c)| (ConfigId(i), c))
    }
}

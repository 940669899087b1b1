//! Policy-driven runtime autotuning for parameterized compute kernels.
//!
//! A kernel usually has a handful of meta-parameters (tile sizes, warp
//! counts, pipeline depths) whose best values depend on the input shapes.
//! This crate picks them at runtime: wrap the kernel in an [`Autotuner`]
//! with a list of candidate [`Config`]s, and every call measures or
//! exploits candidates according to the chosen policy, converging on the
//! fastest config per input shape class.
//!
//! ## Example
//!
//! Tune the tile size of a toy kernel with the exhaustive policy: the
//! first call per key benchmarks both candidates, later calls launch the
//! cached winner directly.
//!
//! ```rust
//! use kernel_autotune::arg::{ArgMap, ArgValue};
//! use kernel_autotune::config::Config;
//! use kernel_autotune::driver::HostDevice;
//! use kernel_autotune::error::Result;
//! use kernel_autotune::kernel::Kernel;
//! use kernel_autotune::tune::{Autotuner, TunerOpts};
//!
//! struct Saxpy {
//!     arg_names: Vec<String>,
//! }
//!
//! impl Kernel for Saxpy {
//!     type Output = ();
//!     type Compiled = ();
//!
//!     fn arg_names(&self) -> &[String] {
//!         &self.arg_names
//!     }
//!
//!     fn name(&self) -> &str {
//!         "saxpy"
//!     }
//!
//!     fn run(&mut self, _args: &[ArgValue], meta: &ArgMap) -> Result<()> {
//!         let _block = meta["BLOCK_SIZE"].as_int(); // launch with the tuned tile
//!         Ok(())
//!     }
//!
//!     fn warmup(&mut self, _args: &[ArgValue], _meta: &ArgMap) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let configs = vec![
//!         Config::new([("BLOCK_SIZE", ArgValue::Int(128))])?,
//!         Config::new([("BLOCK_SIZE", ArgValue::Int(1024))])?,
//!     ];
//!     let kernel = Saxpy { arg_names: vec!["n".into()] };
//!
//!     let mut opts = TunerOpts::default();
//!     opts.key = vec!["n".into()]; // re-tune whenever `n` changes
//!
//!     let mut tuner = Autotuner::new(kernel, HostDevice, "default", configs, opts)?;
//!     tuner.run(&[ArgValue::Int(4096)], &ArgMap::new())?;
//!     assert!(tuner.best_config().is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Policies
//!
//! Four policies sit behind [`Autotuner::new`]: `"default"` (benchmark all
//! once, then cache), `"stepwise"` (bounded random trials, commit to the
//! best mean), `"epsilon"` (ε-greedy with decay, never commits) and
//! `"confidence"` (interval elimination). See the [`tune`] module docs.
//!
//! GPU-backed kernels implement [`Kernel`], [`Device`] and [`Buffer`] over
//! their driver; the crate ships host implementations of the timing pieces
//! for CPU kernels and tests.
//!
//! [`Autotuner`]: tune::Autotuner
//! [`Autotuner::new`]: tune::Autotuner::new
//! [`Config`]: config::Config
//! [`Kernel`]: kernel::Kernel
//! [`Device`]: driver::Device
//! [`Buffer`]: arg::Buffer

pub mod arg;
pub mod bench;
pub mod config;
pub mod driver;
pub mod error;
pub mod kernel;
pub mod tune;

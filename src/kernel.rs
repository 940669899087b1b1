use crate::arg::{ArgMap, ArgValue};
use crate::error::Result;

/// A launchable, ahead-of-time compilable computation.
///
/// The tuner drives a kernel through two entry points: [`run`](Kernel::run)
/// launches synchronously with positional arguments plus the merged
/// meta-parameters (caller overrides and the tuned config), and
/// [`warmup`](Kernel::warmup) compiles one specialization without running
/// it. Resource exhaustion and compile-time assertion failures are reported
/// through the crate error type so the policies can treat them as soft.
pub trait Kernel {
    /// What a launch returns.
    type Output;

    /// What ahead-of-time compilation returns.
    type Compiled;

    /// Ordered names of the positional arguments.
    fn arg_names(&self) -> &[String];

    /// Kernel name, used for diagnostics only.
    fn name(&self) -> &str;

    /// Launches the kernel and blocks until it completes.
    fn run(&mut self, args: &[ArgValue], meta: &ArgMap) -> Result<Self::Output>;

    /// Compiles the specialization selected by `meta` without launching.
    fn warmup(&mut self, args: &[ArgValue], meta: &ArgMap) -> Result<Self::Compiled>;
}

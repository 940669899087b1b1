use thiserror::Error;

/// Errors surfaced by tuning and kernel launches.
///
/// [`OutOfResources`](Error::OutOfResources) and
/// [`CompileTimeAssertion`](Error::CompileTimeAssertion) are soft failures
/// for the tuner: the exhaustive policy scores the offending config with
/// infinite timings, the adaptive policies either blacklist it for the
/// current cache key (stepwise, confidence) or retry another candidate
/// (epsilon). Everything else aborts the call that raised it.
#[derive(Debug, Error)]
pub enum Error {
    /// The launch exceeded a hardware resource (shared memory, registers, ...).
    #[error("out of resource: {resource}, required {required}, hardware limit {limit}")]
    OutOfResources {
        resource: String,
        required: u64,
        limit: u64,
    },

    /// A compile-time assertion inside the kernel failed for this config.
    #[error("compile-time assertion failure: {0}")]
    CompileTimeAssertion(String),

    /// A meta-parameter was supplied both by the caller and by the config.
    #[error("conflicting meta-parameters: {0}. Make sure that you don't re-define auto-tuned symbols")]
    ConflictingMetaParameters(String),

    /// The dispatch facade was asked for a policy it does not know.
    #[error("unknown autotuner policy `{0}`")]
    UnknownPolicy(String),

    /// Every candidate for the current cache key is unlaunchable.
    #[error("autotuning found no runnable configuration")]
    NoViableConfig,

    /// Any other launch failure, propagated verbatim.
    #[error(transparent)]
    Launch(#[from] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

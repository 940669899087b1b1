use crate::arg::{ArgMap, ArgValue, DType};

/// One fragment of a cache key.
///
/// Floats key by bit pattern so the key stays hashable; buffers contribute
/// their element type rather than their contents.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyPart {
    Int(i64),
    Bits(u64),
    Bool(bool),
    Str(String),
    Dtype(DType),
}

/// Cache key partitioning the tuning state by input shape class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheKey(pub(crate) Vec<KeyPart>);

fn key_part(value: &ArgValue) -> KeyPart {
    match value {
        ArgValue::Int(v) => KeyPart::Int(*v),
        ArgValue::Float(v) => KeyPart::Bits(v.to_bits()),
        ArgValue::Bool(v) => KeyPart::Bool(*v),
        ArgValue::Str(v) => KeyPart::Str(v.clone()),
        ArgValue::Buffer(b) => KeyPart::Dtype(b.dtype()),
    }
}

/// Derives the cache key from the bound arguments.
///
/// Considers only entries named in `arg_names` (caller overrides shadow the
/// positional binding). The values of the `keys`-listed names come first, in
/// `keys` order; then one dtype tag per buffer-typed entry, in `arg_names`
/// order so the key is reproducible across runs.
pub(crate) fn extract(
    arg_names: &[String],
    keys: &[String],
    nargs: &ArgMap,
    kwargs: &ArgMap,
) -> CacheKey {
    let lookup = |name: &String| kwargs.get(name).or_else(|| nargs.get(name));

    let mut parts = Vec::new();
    for key in keys {
        if arg_names.contains(key) {
            if let Some(value) = lookup(key) {
                parts.push(key_part(value));
            }
        }
    }
    for name in arg_names {
        if let Some(value) = lookup(name) {
            if let Some(dtype) = value.dtype() {
                parts.push(KeyPart::Dtype(dtype));
            }
        }
    }
    CacheKey(parts)
}

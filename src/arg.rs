use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Keyword-style argument mapping, used for bound positional arguments
/// (`nargs`), caller overrides and tuned meta-parameters alike.
pub type ArgMap = HashMap<String, ArgValue>;

/// One kernel argument or meta-parameter value.
///
/// Scalars are stored by value; device buffers are shared handles, so
/// cloning an `ArgValue` never copies device memory. The tuner mutates
/// buffers only through the [`Buffer`] trait (zero, snapshot, restore).
#[derive(Clone)]
pub enum ArgValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Buffer(Rc<dyn Buffer>),
}

impl ArgValue {
    /// Element type tag, present only for buffer arguments.
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Self::Buffer(b) => Some(b.dtype()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
            Self::Buffer(b) => write!(f, "buffer<{}>", b.dtype()),
        }
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<Rc<dyn Buffer>> for ArgValue {
    fn from(v: Rc<dyn Buffer>) -> Self {
        Self::Buffer(v)
    }
}

/// Mutable device (or host) storage named in `reset_to_zero` or
/// `restore_value`.
///
/// Implementations use interior mutability: the tuner only ever holds
/// shared references to buffers, possibly several times within one
/// argument mapping.
pub trait Buffer {
    /// Element type, contributed to the cache key.
    fn dtype(&self) -> DType;

    /// Zero the contents in place.
    fn zero(&self);

    /// Clone the contents into an opaque sidecar value.
    fn snapshot(&self) -> Box<dyn Any>;

    /// Copy a sidecar value produced by [`snapshot`](Buffer::snapshot)
    /// back into this buffer. Snapshots from a different buffer type are
    /// ignored.
    fn restore(&self, snapshot: &dyn Any);
}

/// Buffer element types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Bool,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::Bool => "bool",
        };
        f.write_str(name)
    }
}

//! Definition of errors.

use std::error::Error;
use std::fmt;

/// A specialized Result type for MilkCat.
pub type Result<T, E = MilkcatError> = std::result::Result<T, E>;

/// The error type for MilkCat.
#[derive(Debug, thiserror::Error)]
pub enum MilkcatError {
    /// The error variant for [`InvalidArgumentError`].
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// The error variant for [`InvalidFormatError`].
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// The error variant for [`CapacityError`].
    #[error(transparent)]
    Capacity(CapacityError),

    /// The error variant for [`TryFromIntError`](std::num::TryFromIntError).
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),

    /// The error variant for [`ParseIntError`](std::num::ParseIntError).
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    /// The error variant for [`ParseFloatError`](std::num::ParseFloatError).
    #[error(transparent)]
    ParseFloat(#[from] std::num::ParseFloatError),

    /// The error variant for [`DecodeError`](bincode::error::DecodeError).
    #[error(transparent)]
    BincodeDecode(#[from] bincode::error::DecodeError),

    /// The error variant for [`EncodeError`](bincode::error::EncodeError).
    #[error(transparent)]
    BincodeEncode(#[from] bincode::error::EncodeError),

    /// The error variant for [`std::io::Error`].
    #[error(transparent)]
    StdIo(#[from] std::io::Error),
}

impl MilkcatError {
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn invalid_format<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) const fn capacity(what: &'static str, len: usize, max: usize) -> Self {
        Self::Capacity(CapacityError { what, len, max })
    }
}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// Error used when a model table or a feature template is malformed,
/// or when model components do not fit together.
#[derive(Debug)]
pub struct InvalidFormatError {
    /// Name of the component.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidFormatError {}

/// Error used when an input exceeds the capacity configured at construction.
///
/// The rejected input is left untouched and no partial output is produced.
#[derive(Debug)]
pub struct CapacityError {
    /// What was measured.
    pub(crate) what: &'static str,

    /// Length of the rejected input.
    pub(crate) len: usize,

    /// Configured maximum.
    pub(crate) max: usize,
}

impl CapacityError {
    /// Length of the rejected input.
    pub const fn input_len(&self) -> usize {
        self.len
    }

    /// Configured maximum.
    pub const fn max(&self) -> usize {
        self.max
    }
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "CapacityError: {} has length {}, exceeding the maximum {}",
            self.what, self.len, self.max
        )
    }
}

impl Error for CapacityError {}

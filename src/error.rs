//! Fatal error taxonomy.
//!
//! Soft diagnostics — schema mismatches and missing indexing
//! preconditions — are never represented here; they are logged via
//! `log::warn!` and parsing continues, matching `master.rs`'s
//! `log::warn!("Skipped unknown element ...")` style.

use crate::vint::Id;

/// Error types for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A VINT's first byte has no set bit in the first 8 positions.
    #[error("invalid variable-length integer encoding at offset {0}")]
    InvalidVIntAt(u64),

    /// Internal VINT decode failure without a known stream offset
    /// (used by the minimal TLV walker in the index builder).
    #[error("invalid variable-length integer encoding")]
    InvalidVInt,

    /// Attempted to read past the end of the available bytes.
    #[error("attempted to read past the end of the buffer")]
    OutOfBounds,

    /// An unsigned/signed integer payload was wider than 8 bytes.
    #[error("integer payload of {0} bytes exceeds the 8-byte limit")]
    InvalidIntegerWidth(usize),

    /// A float payload was neither 4, 8, nor 10 bytes wide.
    #[error("float payload of {0} bytes is not 4, 8, or 10 bytes wide")]
    InvalidFloatWidth(usize),

    /// An 80-bit extended float's rebiased exponent fell outside the
    /// representable subnormal-to-normal double range.
    #[error("80-bit float exponent out of representable double range")]
    FloatExtendedRange,

    /// A structural violation: an identifier was expected at `offset` but
    /// none could be resolved, or a payload ran past its container.
    #[error("structural error at offset {offset}: {message}")]
    Structure {
        /// Absolute offset of the violation.
        offset: u64,
        /// Human-readable description.
        message: String,
    },

    /// Neither an EBML header nor a Segment could be located.
    #[error("Cannot find EBML or Segment structure")]
    MissingRoot,

    /// The observer callback requested an abort.
    #[error("parsing aborted by caller")]
    Aborted,
}

impl Error {
    pub(crate) fn structure(offset: u64, message: impl Into<String>) -> Self {
        Error::Structure { offset, message: message.into() }
    }

    pub(crate) fn unexpected_identifier(offset: u64, id: Id) -> Self {
        Error::structure(offset, format!("unexpected identifier {id}"))
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

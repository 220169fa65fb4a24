//! Error types for the codec crate.

use std::io;

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Frame header carries the wrong magic number.
    #[error("invalid magic: expected 0x{expected:08x}, got 0x{actual:08x}")]
    InvalidMagic {
        /// The magic this decoder understands.
        expected: u32,
        /// The magic found in the header.
        actual: u32,
    },

    /// An entry did not start with a string-encoded key.
    #[error("key is not a string: opcode {opcode} at offset {offset}")]
    KeyNotString {
        /// The byte found where the key opcode was expected.
        opcode: u8,
        /// Payload offset of that byte.
        offset: usize,
    },

    /// A value byte is neither a small integer nor an assigned opcode.
    #[error("unknown opcode {opcode} at offset {offset}")]
    UnknownOpcode {
        /// The unrecognized byte.
        opcode: u8,
        /// Payload offset of that byte.
        offset: usize,
    },

    /// The payload ended before a value was complete.
    #[error("truncated payload: need {needed} more bytes at offset {offset}")]
    Truncated {
        /// Payload offset where reading stopped.
        offset: usize,
        /// Number of bytes that were still required.
        needed: usize,
    },

    /// An integer was required (a length, count or duration) but another
    /// opcode was found.
    #[error("expected an integer, found opcode {opcode} at offset {offset}")]
    ExpectedInteger {
        /// The byte found instead.
        opcode: u8,
        /// Payload offset of that byte.
        offset: usize,
    },

    /// The payload ended while group children were still expected.
    #[error("payload ended with {missing} group entries missing")]
    UnterminatedGroup {
        /// Number of child entries that never arrived.
        missing: usize,
    },

    /// A string, byte or integer length field is negative or otherwise unusable.
    #[error("invalid length {length} at offset {offset}")]
    InvalidLength {
        /// The decoded length.
        length: i64,
        /// Payload offset of the length field.
        offset: usize,
    },

    /// A group count is negative or odd.
    #[error("invalid group count {count} at offset {offset}")]
    InvalidGroupCount {
        /// The decoded count.
        count: i64,
        /// Payload offset of the count field.
        offset: usize,
    },

    /// A group opens deeper than the decoder's nesting limit.
    #[error("groups nested {depth} deep at offset {offset} exceed the limit")]
    NestingTooDeep {
        /// Depth the offending group would have opened at.
        depth: usize,
        /// Payload offset of the group's count field.
        offset: usize,
    },

    /// A timestamp block does not describe a representable point in time.
    #[error("invalid timestamp at offset {offset}: {message}")]
    InvalidTime {
        /// Payload offset of the timestamp block.
        offset: usize,
        /// What was wrong with it.
        message: String,
    },

    /// A varint ran past ten bytes or overflowed 64 bits.
    #[error("varint overflow at offset {offset}")]
    VarintOverflow {
        /// Payload offset where the varint starts.
        offset: usize,
    },

    /// Header length exceeds the decoder's configured limit.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Length declared in the header.
        size: u32,
        /// Configured maximum.
        max: u32,
    },

    /// The encoded record does not fit the 32-bit length field.
    #[error("frame too large: {size} bytes exceeds the 32-bit length limit")]
    FrameTooLarge {
        /// Size of the accumulated payload.
        size: usize,
    },

    /// A value could not be turned into its text representation.
    #[error("marshaling failed: {message}")]
    Marshal {
        /// Description of the marshaling failure.
        message: String,
    },

    /// Reading from the source or writing to the sink failed.
    #[error("i/o error after {transferred} bytes: {source}")]
    Io {
        /// Bytes successfully transferred before the failure.
        transferred: usize,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

impl CodecError {
    /// Create a marshaling error.
    pub fn marshal(message: impl Into<String>) -> Self {
        Self::Marshal {
            message: message.into(),
        }
    }

    /// Create an I/O error carrying the number of bytes already transferred.
    pub fn io(source: io::Error, transferred: usize) -> Self {
        Self::Io {
            transferred,
            source,
        }
    }

    /// Create an invalid timestamp error.
    pub fn invalid_time(offset: usize, message: impl Into<String>) -> Self {
        Self::InvalidTime {
            offset,
            message: message.into(),
        }
    }

    /// Returns true if the error describes malformed input rather than I/O.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. }
                | Self::KeyNotString { .. }
                | Self::UnknownOpcode { .. }
                | Self::Truncated { .. }
                | Self::ExpectedInteger { .. }
                | Self::UnterminatedGroup { .. }
                | Self::InvalidLength { .. }
                | Self::InvalidGroupCount { .. }
                | Self::NestingTooDeep { .. }
                | Self::InvalidTime { .. }
                | Self::VarintOverflow { .. }
                | Self::PayloadTooLarge { .. }
        )
    }

    /// Returns true for read/write failures against the source or sink.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns the byte count transferred before an I/O failure.
    pub fn transferred(&self) -> Option<usize> {
        match self {
            Self::Io { transferred, .. } => Some(*transferred),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_message_names_both_values() {
        let err = CodecError::InvalidMagic {
            expected: 0xBAFE_DC01,
            actual: 0x0102_0304,
        };
        let text = err.to_string();
        assert!(text.contains("0xbafedc01"));
        assert!(text.contains("0x01020304"));
        assert!(err.is_format_error());
    }

    #[test]
    fn io_error_reports_transferred() {
        let err = CodecError::io(io::ErrorKind::UnexpectedEof.into(), 5);
        assert!(err.is_io_error());
        assert!(!err.is_format_error());
        assert_eq!(err.transferred(), Some(5));
    }
}

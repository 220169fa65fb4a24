//! Wire format constants and primitive encodings.
//!
//! A frame is an 8-byte header (`MAGIC` then the payload length, both
//! little-endian `u32`) followed by the payload. The payload is a flat
//! sequence of key/value entries where every value starts with one byte:
//!
//! - `0..SMALL_INT_END`: the byte is itself a non-negative integer value
//! - `SMALL_INT_END..`: an [`Opcode`] naming the kind of what follows

/// Magic number written at the start of every frame.
pub const MAGIC: u32 = 0xBAFE_DC01;

/// Size of the frame header in bytes (magic + length).
pub const HEADER_LEN: usize = 8;

/// First byte value that is an opcode rather than a direct small integer.
pub const SMALL_INT_END: u8 = 200;

/// Size of an encoded timestamp block (seconds + nanos + offset).
pub const TIME_LEN: usize = 16;

/// Longest possible LEB128 encoding of a 64-bit value.
pub const MAX_VARINT_LEN: usize = 10;

/// Tagged opcodes. Values are assigned contiguously from [`SMALL_INT_END`]
/// and must not change while [`MAGIC`] stays the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Signed integer, zig-zag varint follows.
    Int = SMALL_INT_END,
    /// Unsigned integer, varint follows.
    Uint = SMALL_INT_END + 1,
    /// 64-bit float, 8 little-endian bytes follow.
    Float = SMALL_INT_END + 2,
    /// Boolean true, no payload.
    True = SMALL_INT_END + 3,
    /// Boolean false, no payload.
    False = SMALL_INT_END + 4,
    /// UTF-8 string, integer length and raw bytes follow.
    String = SMALL_INT_END + 5,
    /// Opaque bytes, integer length and raw bytes follow.
    Bytes = SMALL_INT_END + 6,
    /// Duration, integer nanosecond count follows.
    Duration = SMALL_INT_END + 7,
    /// Timestamp, a [`TIME_LEN`]-byte block follows.
    Time = SMALL_INT_END + 8,
    /// Group, integer item count follows, then the child entries.
    Group = SMALL_INT_END + 9,
}

impl Opcode {
    /// Converts a byte to an opcode.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b.checked_sub(SMALL_INT_END)? {
            0 => Some(Self::Int),
            1 => Some(Self::Uint),
            2 => Some(Self::Float),
            3 => Some(Self::True),
            4 => Some(Self::False),
            5 => Some(Self::String),
            6 => Some(Self::Bytes),
            7 => Some(Self::Duration),
            8 => Some(Self::Time),
            9 => Some(Self::Group),
            _ => None,
        }
    }

    /// Converts the opcode to a byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Builds the frame header for a payload of `length` bytes.
pub fn encode_header(length: u32) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[..4].copy_from_slice(&MAGIC.to_le_bytes());
    header[4..].copy_from_slice(&length.to_le_bytes());
    header
}

/// Splits a header into its magic and length fields.
pub fn decode_header(header: &[u8; HEADER_LEN]) -> (u32, u32) {
    let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    (magic, length)
}

/// Zig-zag maps signed integers onto unsigned ones so small magnitudes stay short.
#[allow(clippy::cast_sign_loss)]
pub const fn zigzag(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag`].
#[allow(clippy::cast_possible_wrap)]
pub const fn unzigzag(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Writes `value` as an unsigned LEB128 varint into `out`, returning the length used.
#[allow(clippy::cast_possible_truncation)]
pub fn put_uvarint(out: &mut [u8; MAX_VARINT_LEN], mut value: u64) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        out[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    out[i] = value as u8;
    i + 1
}

/// Outcome of reading a varint from a byte slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Varint {
    /// Decoded value and the number of bytes consumed.
    Value(u64, usize),
    /// The slice ended before the terminating byte.
    Incomplete,
    /// More than ten bytes, or the value does not fit in 64 bits.
    Overflow,
}

/// Reads an unsigned LEB128 varint from the front of `buf`.
pub fn read_uvarint(buf: &[u8]) -> Varint {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in buf.iter().enumerate() {
        if i == MAX_VARINT_LEN {
            return Varint::Overflow;
        }
        if byte < 0x80 {
            if i == MAX_VARINT_LEN - 1 && byte > 1 {
                return Varint::Overflow;
            }
            return Varint::Value(value | (u64::from(byte) << shift), i + 1);
        }
        value |= u64::from(byte & 0x7f) << shift;
        shift += 7;
    }
    Varint::Incomplete
}

/// Returns true if `n` is carried directly in a single value byte.
pub const fn is_small_int(n: i64) -> bool {
    n >= 0 && n < SMALL_INT_END as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_are_contiguous() {
        let all = [
            Opcode::Int,
            Opcode::Uint,
            Opcode::Float,
            Opcode::True,
            Opcode::False,
            Opcode::String,
            Opcode::Bytes,
            Opcode::Duration,
            Opcode::Time,
            Opcode::Group,
        ];
        for (i, op) in all.iter().enumerate() {
            assert_eq!(op.as_byte(), SMALL_INT_END + i as u8);
            assert_eq!(Opcode::from_byte(op.as_byte()), Some(*op));
        }
    }

    #[test]
    fn small_ints_and_unassigned_bytes_are_not_opcodes() {
        assert_eq!(Opcode::from_byte(0), None);
        assert_eq!(Opcode::from_byte(SMALL_INT_END - 1), None);
        assert_eq!(Opcode::from_byte(210), None);
        assert_eq!(Opcode::from_byte(255), None);
    }

    #[test]
    fn header_layout_is_little_endian() {
        let header = encode_header(0x0102_0304);
        assert_eq!(header, [0x01, 0xDC, 0xFE, 0xBA, 0x04, 0x03, 0x02, 0x01]);
        assert_eq!(decode_header(&header), (MAGIC, 0x0102_0304));
    }

    #[test]
    fn zigzag_matches_sint64_convention() {
        assert_eq!(zigzag(0), 0);
        assert_eq!(zigzag(-1), 1);
        assert_eq!(zigzag(1), 2);
        assert_eq!(zigzag(-2), 3);
        assert_eq!(zigzag(i64::MAX), u64::MAX - 1);
        assert_eq!(zigzag(i64::MIN), u64::MAX);
        for n in [0, 1, -1, 1000, -1000, i64::MIN, i64::MAX] {
            assert_eq!(unzigzag(zigzag(n)), n);
        }
    }

    #[test]
    fn uvarint_encoding() {
        let mut out = [0u8; MAX_VARINT_LEN];
        let n = put_uvarint(&mut out, 2000);
        assert_eq!(&out[..n], &[0xD0, 0x0F]);

        let n = put_uvarint(&mut out, u64::MAX);
        assert_eq!(n, MAX_VARINT_LEN);
        assert_eq!(read_uvarint(&out[..n]), Varint::Value(u64::MAX, n));
    }

    #[test]
    fn uvarint_rejects_bad_input() {
        assert_eq!(read_uvarint(&[]), Varint::Incomplete);
        assert_eq!(read_uvarint(&[0x80, 0x80]), Varint::Incomplete);
        assert_eq!(read_uvarint(&[0xff; 11]), Varint::Overflow);
        let mut too_big = [0xffu8; MAX_VARINT_LEN];
        too_big[MAX_VARINT_LEN - 1] = 0x02;
        assert_eq!(read_uvarint(&too_big), Varint::Overflow);
    }

    #[test]
    fn small_int_bounds() {
        assert!(is_small_int(0));
        assert!(is_small_int(199));
        assert!(!is_small_int(200));
        assert!(!is_small_int(-1));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn uvarint_is_minimal_and_reversible(value in any::<u64>()) {
                let mut out = [0u8; MAX_VARINT_LEN];
                let n = put_uvarint(&mut out, value);
                prop_assert_eq!(read_uvarint(&out[..n]), Varint::Value(value, n));
                prop_assert!(n == 1 || out[n - 1] != 0);
                prop_assert_eq!(read_uvarint(&out[..n - 1]), Varint::Incomplete);
            }

            #[test]
            fn zigzag_is_a_bijection(n in any::<i64>()) {
                prop_assert_eq!(unzigzag(zigzag(n)), n);
                prop_assert!(zigzag(n) <= n.unsigned_abs().saturating_mul(2));
            }
        }
    }
}

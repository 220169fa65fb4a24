//! Callback interface driven by the decoder.

use chrono::{DateTime, FixedOffset, TimeDelta};

/// Receives decoded entries in payload order.
///
/// Exactly one method fires per entry. Keys and string/byte values are
/// slices into the payload buffer; copy them if they must outlive the call.
///
/// Groups are announced by [`group`](Visitor::group) with the number of
/// flattened items (twice the number of child entries). The child entries
/// follow as ordinary callbacks, depth first, so a visitor that cares about
/// nesting tracks the remaining counts itself.
pub trait Visitor {
    /// A signed integer value.
    fn int(&mut self, key: &[u8], value: i64);

    /// An unsigned integer value.
    fn uint(&mut self, key: &[u8], value: u64);

    /// A string value. The bytes are not re-validated as UTF-8.
    fn string(&mut self, key: &[u8], value: &[u8]);

    /// An opaque byte value.
    fn bytes(&mut self, key: &[u8], value: &[u8]);

    /// A boolean value.
    fn bool(&mut self, key: &[u8], value: bool);

    /// A floating point value.
    fn float(&mut self, key: &[u8], value: f64);

    /// A duration value.
    fn duration(&mut self, key: &[u8], value: TimeDelta);

    /// A timestamp value.
    fn time(&mut self, key: &[u8], value: DateTime<FixedOffset>);

    /// Start of a group whose `count` flattened items follow.
    fn group(&mut self, key: &[u8], count: usize);
}

impl<V: Visitor + ?Sized> Visitor for &mut V {
    fn int(&mut self, key: &[u8], value: i64) {
        (**self).int(key, value);
    }

    fn uint(&mut self, key: &[u8], value: u64) {
        (**self).uint(key, value);
    }

    fn string(&mut self, key: &[u8], value: &[u8]) {
        (**self).string(key, value);
    }

    fn bytes(&mut self, key: &[u8], value: &[u8]) {
        (**self).bytes(key, value);
    }

    fn bool(&mut self, key: &[u8], value: bool) {
        (**self).bool(key, value);
    }

    fn float(&mut self, key: &[u8], value: f64) {
        (**self).float(key, value);
    }

    fn duration(&mut self, key: &[u8], value: TimeDelta) {
        (**self).duration(key, value);
    }

    fn time(&mut self, key: &[u8], value: DateTime<FixedOffset>) {
        (**self).time(key, value);
    }

    fn group(&mut self, key: &[u8], count: usize) {
        (**self).group(key, count);
    }
}

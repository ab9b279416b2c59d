//! Fixed-layout composite keys for the positional index.
//!
//! `PositionalKey` encodes `(token, record, previous_token)` and `ReverseKey`
//! encodes `(record, token)`. Both serialize to big-endian byte strings so
//! that byte-lexicographic order (what the ordered store sorts on) matches
//! numeric tuple order.

use std::cmp::Ordering;

/// An unmanaged fixed-size value usable as a record identifier or token.
/// Implemented for the unsigned integer types; encoding is big-endian so
/// that byte order and numeric order coincide.
pub trait FixedKey: Copy + Ord + Send + Sync + 'static {
    const SIZE: usize;
    fn to_be_bytes_vec(&self) -> Vec<u8>;
    fn from_be_bytes_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_fixed_key {
    ($t:ty) => {
        impl FixedKey for $t {
            const SIZE: usize = std::mem::size_of::<$t>();
            fn to_be_bytes_vec(&self) -> Vec<u8> {
                self.to_be_bytes().to_vec()
            }
            fn from_be_bytes_slice(bytes: &[u8]) -> Self {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                buf.copy_from_slice(bytes);
                <$t>::from_be_bytes(buf)
            }
        }
    };
}

impl_fixed_key!(u8);
impl_fixed_key!(u16);
impl_fixed_key!(u32);
impl_fixed_key!(u64);
impl_fixed_key!(u128);

/// The "no previous token" sentinel for the first token of a document.
pub const START_OF_RECORD: u64 = 0;

/// Primary index key: `(token, record, previous_token)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionalKey<R: FixedKey, T: FixedKey = u64> {
    pub token: T,
    pub record: R,
    pub prev_token: T,
}

impl<R: FixedKey, T: FixedKey> PositionalKey<R, T> {
    pub fn new(token: T, record: R, prev_token: T) -> Self {
        PositionalKey { token, record, prev_token }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(T::SIZE * 2 + R::SIZE);
        buf.extend(self.token.to_be_bytes_vec());
        buf.extend(self.record.to_be_bytes_vec());
        buf.extend(self.prev_token.to_be_bytes_vec());
        buf
    }

    /// Prefix matching `(token, record, *)` — any key with this prefix
    /// shares this token and record regardless of `prev_token`.
    pub fn token_record_prefix(token: T, record: R) -> Vec<u8> {
        let mut buf = Vec::with_capacity(T::SIZE + R::SIZE);
        buf.extend(token.to_be_bytes_vec());
        buf.extend(record.to_be_bytes_vec());
        buf
    }

    /// Prefix matching `(token, *, *)` — every key carrying this token.
    pub fn token_prefix(token: T) -> Vec<u8> {
        token.to_be_bytes_vec()
    }

    pub fn decode(bytes: &[u8]) -> Self {
        let (t, rest) = bytes.split_at(T::SIZE);
        let (r, rest) = rest.split_at(R::SIZE);
        let (p, _) = rest.split_at(T::SIZE);
        PositionalKey {
            token: T::from_be_bytes_slice(t),
            record: R::from_be_bytes_slice(r),
            prev_token: T::from_be_bytes_slice(p),
        }
    }

    pub fn starts_with_token_record(bytes: &[u8], token: T, record: R) -> bool {
        bytes.len() >= T::SIZE + R::SIZE
            && bytes.starts_with(&Self::token_record_prefix(token, record))
    }

    pub fn starts_with_token(bytes: &[u8], token: T) -> bool {
        bytes.starts_with(&Self::token_prefix(token))
    }
}

impl<R: FixedKey, T: FixedKey> PartialOrd for PositionalKey<R, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R: FixedKey, T: FixedKey> Ord for PositionalKey<R, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.token, self.record, self.prev_token).cmp(&(other.token, other.record, other.prev_token))
    }
}

/// Secondary index key: `(record, token)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseKey<R: FixedKey, T: FixedKey = u64> {
    pub record: R,
    pub token: T,
}

impl<R: FixedKey, T: FixedKey> ReverseKey<R, T> {
    pub fn new(record: R, token: T) -> Self {
        ReverseKey { record, token }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(R::SIZE + T::SIZE);
        buf.extend(self.record.to_be_bytes_vec());
        buf.extend(self.token.to_be_bytes_vec());
        buf
    }

    pub fn record_prefix(record: R) -> Vec<u8> {
        record.to_be_bytes_vec()
    }

    pub fn decode(bytes: &[u8]) -> Self {
        let (r, rest) = bytes.split_at(R::SIZE);
        let (t, _) = rest.split_at(T::SIZE);
        ReverseKey {
            record: R::from_be_bytes_slice(r),
            token: T::from_be_bytes_slice(t),
        }
    }

    pub fn starts_with_record(bytes: &[u8], record: R) -> bool {
        bytes.starts_with(&Self::record_prefix(record))
    }
}

//! Provide `FixedHasher` and `NoOpHasher`.
//!
//! `FixedHasher` is built on `foldhash` with a constant seed, so the same
//! input always hashes to the same value across runs.
//!
//! `NoOpHasher` forwards an already well-distributed `u64` (such as a `TypeId`)
//! as the hash value.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHasher

const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x5A17_C0DE_0B5E_77ED);

/// A type alias for [`foldhash::fast::FoldHasher`] seeded by [`FixedHashState`].
pub type FixedHasher = FoldHasher<'static>;

/// Hash state based upon a fixed seed.
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hash, Hasher};
/// use vc_json_utils::hash::FixedHashState;
///
/// let hash = |s: &str| {
///     let mut hasher = FixedHashState.build_hasher();
///     s.hash(&mut hasher);
///     hasher.finish()
/// };
///
/// assert_eq!(hash("alloc::string::String"), hash("alloc::string::String"));
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHasher

/// A hasher that passes a single `u64` straight through.
///
/// `TypeId` hashes itself with one `write_u64` call, which is already a
/// random-looking value, so there is nothing left to mix.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher {
    hash: u64,
}

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        // Only reached for keys that are not hashed as a single `u64`.
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

/// [`BuildHasher`] for [`NoOpHasher`].
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hash, Hasher};
/// use vc_json_utils::hash::NoOpHashState;
///
/// let mut hasher = NoOpHashState.build_hasher();
/// 42_u64.hash(&mut hasher);
///
/// assert_eq!(hasher.finish(), 42);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher { hash: 0 }
    }
}

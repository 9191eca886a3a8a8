//! Session-scoped handles for interned text.
//!
//! A [`Name`] indexes one session's [`StringInterner`](crate::StringInterner).
//! Two sessions hand out handles independently: equal text may get
//! different handles, and one handle may mean different text. Handles
//! therefore never cross a session boundary. Snapshots carry the interner
//! that resolves them, [`AstDb`](crate::AstDb) rejects snapshots built
//! against another session, and content IDs hash text instead of handles.

use std::fmt;

use crate::StringLookup;

/// Handle to text interned in one session.
///
/// The top [`Name::SHARD_BITS`] bits pick the interner shard and the rest
/// are the slot inside it. [`Name::EMPTY`] is the empty string in every
/// session.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Shard 0, slot 0: pre-interned by every interner.
    pub const EMPTY: Name = Name(0);

    pub const SHARD_BITS: u32 = 4;

    /// Number of interner shards.
    pub const SHARDS: usize = 1 << Self::SHARD_BITS;

    /// Largest slot a shard can hand out.
    pub const MAX_SLOT: u32 = u32::MAX >> Self::SHARD_BITS;

    const SLOT_BITS: u32 = u32::BITS - Self::SHARD_BITS;

    /// Handle for `slot` of `shard`, or `None` when either is out of range.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "shard is checked against SHARDS (16) first"
    )]
    #[inline]
    pub const fn from_parts(shard: usize, slot: u32) -> Option<Name> {
        if shard >= Self::SHARDS || slot > Self::MAX_SLOT {
            return None;
        }
        Some(Name(((shard as u32) << Self::SLOT_BITS) | slot))
    }

    #[inline]
    pub const fn shard(self) -> usize {
        (self.0 >> Self::SLOT_BITS) as usize
    }

    #[inline]
    pub const fn slot(self) -> usize {
        (self.0 & Self::MAX_SLOT) as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == Self::EMPTY.0
    }

    /// Text of this name in the session that produced it.
    ///
    /// Resolving against another session's interner returns whatever that
    /// interner holds at the same slot, or `""`.
    #[inline]
    pub fn resolve<L: StringLookup + ?Sized>(self, session: &L) -> &str {
        session.lookup(self)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({}:{})", self.shard(), self.slot())
    }
}

//! Sharded string interner for identifiers and literal text.
//!
//! One interner lives per compilation session (see [`SharedInterner`]).
//! Lookups take a shard read lock; insertions take the shard write lock, so
//! two units lowered in parallel may intern the same identifier at the same
//! time and still receive the same [`Name`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

/// Per-shard storage for interned strings.
struct InternShard {
    map: FxHashMap<&'static str, Name>,
    strings: Vec<&'static str>,
}

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InternError {
    /// Shard ran out of slots.
    #[error("interner shard {shard_idx} exceeded capacity: {count} strings, max is {max}", max = Name::MAX_SLOT)]
    ShardOverflow { shard_idx: usize, count: usize },
}

impl InternShard {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        }
    }

    fn with_empty() -> Self {
        let mut shard = Self::new();
        let empty: &'static str = "";
        shard.map.insert(empty, Name::EMPTY);
        shard.strings.push(empty);
        shard
    }
}

/// Sharded string interner with O(1) lookup and equality.
///
/// Interned text is leaked to obtain `'static` references, so a `Name`
/// can be resolved without holding a lock guard.
pub struct StringInterner {
    shards: [RwLock<InternShard>; Name::SHARDS],
    total_count: AtomicUsize,
}

impl StringInterner {
    /// Create a new interner with Janus keywords pre-interned.
    pub fn new() -> Self {
        let shards = std::array::from_fn(|i| {
            if i == 0 {
                RwLock::new(InternShard::with_empty())
            } else {
                RwLock::new(InternShard::new())
            }
        });

        let interner = Self {
            shards,
            total_count: AtomicUsize::new(1),
        };
        interner.pre_intern_keywords();
        interner
    }

    #[inline]
    fn shard_for(s: &str) -> usize {
        let mut hash = 0u32;
        for byte in s.bytes().take(8) {
            hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
        }
        (hash as usize) % Name::SHARDS
    }

    /// Intern a string, returning its `Name` or an error on shard overflow.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        let shard_idx = Self::shard_for(s);
        let shard = &self.shards[shard_idx];
        {
            let guard = shard.read();
            if let Some(&name) = guard.map.get(s) {
                return Ok(name);
            }
        }

        let mut guard = shard.write();

        // Another thread may have inserted while we waited for the write lock.
        if let Some(&name) = guard.map.get(s) {
            return Ok(name);
        }

        let count = guard.strings.len();
        let name = u32::try_from(count)
            .ok()
            .and_then(|slot| Name::from_parts(shard_idx, slot))
            .ok_or(InternError::ShardOverflow { shard_idx, count })?;

        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());
        guard.strings.push(leaked);
        guard.map.insert(leaked, name);
        self.total_count.fetch_add(1, Ordering::Relaxed);

        Ok(name)
    }

    /// Intern a string.
    ///
    /// # Panics
    /// Panics if a shard exceeds 2^28 strings. Use `try_intern` to handle it.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Look up a `Name` that was already interned, without inserting.
    pub fn get(&self, s: &str) -> Option<Name> {
        let shard_idx = Self::shard_for(s);
        self.shards[shard_idx].read().map.get(s).copied()
    }

    /// Resolve a `Name` to its text.
    ///
    /// Names from a different interner resolve to the empty string when
    /// their index is out of range.
    pub fn lookup(&self, name: Name) -> &'static str {
        let guard = self.shards[name.shard()].read();
        guard.strings.get(name.slot()).copied().unwrap_or("")
    }

    fn pre_intern_keywords(&self) {
        const KEYWORDS: &[&str] = &[
            // Declarations
            "func",
            "async",
            "let",
            "var",
            "struct",
            "error",
            "trait",
            "impl",
            "for",
            "import",
            "use",
            "zig",
            "dyn",
            "self",
            "Self",
            // Control flow
            "if",
            "else",
            "while",
            "in",
            "match",
            "when",
            "unless",
            "return",
            "break",
            "continue",
            "fail",
            "catch",
            "await",
            "nursery",
            "spawn",
            "and",
            "or",
            "not",
            "true",
            "false",
            "_",
            // Primitive types
            "i32",
            "i64",
            "f64",
            "bool",
            "string",
            "void",
            "Channel",
            // Runtime builtins
            "main",
            "print",
            "println",
            "print_int",
            "panic",
        ];

        for kw in KEYWORDS {
            self.intern(kw);
        }
    }

    /// Number of interned strings (O(1)).
    pub fn len(&self) -> usize {
        self.total_count.load(Ordering::Relaxed)
    }

    /// Check if the interner only holds the empty string.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for looking up interned string names.
///
/// Lets consumers accept any resolver without depending on the concrete
/// interner type.
pub trait StringLookup {
    /// Look up the string for an interned name.
    fn lookup(&self, name: Name) -> &str;
}

impl StringLookup for StringInterner {
    fn lookup(&self, name: Name) -> &str {
        StringInterner::lookup(self, name)
    }
}

/// Session-scoped interner handle, cheap to clone across threads.
///
/// Created once per compiler invocation (`AstDb::new`) and dropped with it;
/// snapshots keep a clone so they can resolve their own token text.
#[derive(Clone)]
pub struct SharedInterner(Arc<StringInterner>);

impl SharedInterner {
    /// Create a new shared interner.
    pub fn new() -> Self {
        SharedInterner(Arc::new(StringInterner::new()))
    }

    /// Whether two handles refer to the same underlying interner.
    pub fn same_session(&self, other: &SharedInterner) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for SharedInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for SharedInterner {
    type Target = StringInterner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Debug for SharedInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedInterner")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;

//! Compilation units and the per-session unit table.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::{SharedInterner, Snapshot};

/// Handle into an [`AstDb`]'s unit table.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct UnitId(u32);

impl UnitId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

/// One compilation unit: a module name, its source path and its snapshot.
#[derive(Clone, Debug)]
pub struct Unit {
    pub id: UnitId,
    /// Module path such as `main` or `std/math`.
    pub name: String,
    pub path: Option<PathBuf>,
    pub snapshot: Arc<Snapshot>,
}

impl Unit {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Error raised when registering a unit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("a unit named `{0}` is already registered")]
    DuplicateName(String),
    #[error("snapshot for unit `{0}` was built with a different interner")]
    ForeignInterner(String),
    #[error("unit table is full")]
    TableFull,
}

/// Table of units in one compilation session, indexed by id and by name.
#[derive(Default)]
struct UnitTable {
    units: Vec<Arc<Unit>>,
    by_name: FxHashMap<String, UnitId>,
}

/// Per-session AST database: the shared interner plus the unit table.
pub struct AstDb {
    interner: SharedInterner,
    table: UnitTable,
}

impl AstDb {
    /// Start a session with a fresh interner.
    pub fn new() -> Self {
        Self::with_interner(SharedInterner::new())
    }

    /// Start a session around an existing interner.
    pub fn with_interner(interner: SharedInterner) -> Self {
        AstDb {
            interner,
            table: UnitTable::default(),
        }
    }

    /// The session interner. Snapshots added to this database must be
    /// built against it.
    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Register a unit. Names are unique within the table.
    pub fn add_unit(
        &mut self,
        name: impl Into<String>,
        path: Option<PathBuf>,
        snapshot: Snapshot,
    ) -> Result<UnitId, UnitError> {
        let name = name.into();
        if self.table.by_name.contains_key(&name) {
            return Err(UnitError::DuplicateName(name));
        }
        if !snapshot.interner().same_session(&self.interner) {
            return Err(UnitError::ForeignInterner(name));
        }
        let raw = u32::try_from(self.table.units.len()).map_err(|_| UnitError::TableFull)?;
        let id = UnitId::new(raw);

        tracing::debug!(unit = %name, nodes = snapshot.node_count(), "registered unit");
        self.table.by_name.insert(name.clone(), id);
        self.table.units.push(Arc::new(Unit {
            id,
            name,
            path,
            snapshot: Arc::new(snapshot),
        }));
        Ok(id)
    }

    /// Unit by id.
    pub fn unit(&self, id: UnitId) -> Option<&Arc<Unit>> {
        self.table.units.get(id.index())
    }

    /// Unit by module name.
    pub fn unit_by_name(&self, name: &str) -> Option<&Arc<Unit>> {
        let id = self.table.by_name.get(name)?;
        self.unit(*id)
    }

    /// All units in registration order.
    pub fn units(&self) -> impl ExactSizeIterator<Item = &Arc<Unit>> {
        self.table.units.iter()
    }

    /// Number of registered units.
    pub fn len(&self) -> usize {
        self.table.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.units.is_empty()
    }
}

impl Default for AstDb {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AstDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstDb")
            .field("units", &self.table.units.len())
            .finish_non_exhaustive()
    }
}

//! Module resolution for `import`.
//!
//! The lowering engine never parses source text itself. A [`ModuleLoader`]
//! turns a module path such as `std/math` into a [`Snapshot`]; the
//! filesystem loader delegates parsing to an injected [`SourceParser`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use janus_ir::{SharedInterner, Snapshot};
use rustc_hash::FxHashMap;

use crate::LowerError;

/// A module resolved by a loader.
#[derive(Clone, Debug)]
pub struct LoadedModule {
    pub snapshot: Arc<Snapshot>,
    /// Source file, when the module came from disk.
    pub path: Option<PathBuf>,
}

/// Parses Janus source into a snapshot built against `interner`.
pub trait SourceParser: Send + Sync {
    fn parse(&self, source: &str, interner: &SharedInterner) -> Result<Snapshot, String>;
}

/// Resolves module paths to snapshots.
pub trait ModuleLoader: Send + Sync {
    /// Load `module` (`/`-separated). `Ok(None)` means "not found here".
    fn load(&self, module: &str, interner: &SharedInterner)
        -> Result<Option<LoadedModule>, LowerError>;
}

/// Loads `<root>/<module>.<extension>` from disk.
pub struct FsModuleLoader {
    root: PathBuf,
    extension: String,
    parser: Option<Arc<dyn SourceParser>>,
}

impl FsModuleLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsModuleLoader {
            root: root.into(),
            extension: "jan".to_string(),
            parser: None,
        }
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn SourceParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File a module path maps to.
    pub fn module_path(&self, module: &str) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(module.split('/').filter(|s| !s.is_empty()));
        path.set_extension(&self.extension);
        path
    }
}

impl ModuleLoader for FsModuleLoader {
    fn load(
        &self,
        module: &str,
        interner: &SharedInterner,
    ) -> Result<Option<LoadedModule>, LowerError> {
        let path = self.module_path(module);
        if !path.is_file() {
            tracing::trace!(%module, path = %path.display(), "module not on disk");
            return Ok(None);
        }
        let Some(parser) = &self.parser else {
            return Err(LowerError::Parse {
                module: module.to_string(),
                message: format!("found `{}` but no source parser is configured", path.display()),
            });
        };
        let source = fs::read_to_string(&path).map_err(|source| LowerError::Io {
            path: path.clone(),
            source,
        })?;
        let snapshot = parser
            .parse(&source, interner)
            .map_err(|message| LowerError::Parse {
                module: module.to_string(),
                message,
            })?;
        tracing::debug!(%module, path = %path.display(), nodes = snapshot.node_count(), "loaded module");
        Ok(Some(LoadedModule {
            snapshot: Arc::new(snapshot),
            path: Some(path),
        }))
    }
}

/// Serves pre-built snapshots by module path.
#[derive(Default)]
pub struct MemoryLoader {
    modules: FxHashMap<String, Arc<Snapshot>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: impl Into<String>, snapshot: Snapshot) {
        self.modules.insert(module.into(), Arc::new(snapshot));
    }

    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>, snapshot: Snapshot) -> Self {
        self.insert(module, snapshot);
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for MemoryLoader {
    fn load(
        &self,
        module: &str,
        _interner: &SharedInterner,
    ) -> Result<Option<LoadedModule>, LowerError> {
        Ok(self.modules.get(module).map(|snapshot| LoadedModule {
            snapshot: Arc::clone(snapshot),
            path: None,
        }))
    }
}

#[cfg(test)]
mod tests;

//! Lowering configuration.

use std::path::{Path, PathBuf};

/// Default nesting limit for `import` chains.
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 64;

/// Options controlling one lowering run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LowerOptions {
    /// Directory used to resolve imports and `use zig` paths.
    pub search_path: Option<PathBuf>,
    /// Source file extension for imported modules, without the dot.
    pub source_extension: String,
    /// Lower integer-literal matches to a single `Switch`.
    pub switch_lowering: bool,
    pub max_import_depth: usize,
}

impl Default for LowerOptions {
    fn default() -> Self {
        LowerOptions {
            search_path: None,
            source_extension: "jan".to_string(),
            switch_lowering: true,
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }
}

impl LowerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `JANUS_PATH` and `JANUS_MAX_IMPORT_DEPTH` from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build options from an arbitrary variable source.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(path) = lookup("JANUS_PATH").filter(|p| !p.is_empty()) {
            options.search_path = Some(PathBuf::from(path));
        }
        if let Some(depth) = lookup("JANUS_MAX_IMPORT_DEPTH") {
            match depth.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => options.max_import_depth = depth,
                _ => tracing::warn!(value = %depth, "ignoring invalid JANUS_MAX_IMPORT_DEPTH"),
            }
        }
        options
    }

    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = extension.into();
        self
    }

    #[must_use]
    pub fn with_switch_lowering(mut self, enabled: bool) -> Self {
        self.switch_lowering = enabled;
        self
    }

    #[must_use]
    pub fn with_max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    pub fn search_path(&self) -> Option<&Path> {
        self.search_path.as_deref()
    }

    /// Resolve a `use zig` path: relative to the search path when one is
    /// set, as given otherwise.
    pub fn resolve_native(&self, path: &str) -> PathBuf {
        match &self.search_path {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        }
    }
}

use std::fs;

use janus_ir::{AstBuilder, NodeKind};
use pretty_assertions::assert_eq;

use super::*;

/// Treats the whole source as the name of a single empty function.
struct NameParser;

impl SourceParser for NameParser {
    fn parse(&self, source: &str, interner: &SharedInterner) -> Result<Snapshot, String> {
        let name = source.trim();
        if name.is_empty() {
            return Err("empty module".to_string());
        }
        let mut b = AstBuilder::new(interner.clone());
        let body = b.block(&[]);
        let func = b.func(name, &[], None, body);
        b.finish(&[func]).map_err(|e| e.to_string())
    }
}

fn first_item_name(snapshot: &Snapshot) -> Option<&'static str> {
    let item = *snapshot.children(snapshot.root()).first()?;
    let name = snapshot.node(item)?.child(0)?;
    snapshot.node_text(name)
}

#[test]
fn module_path_joins_segments() {
    let loader = FsModuleLoader::new("/src").with_extension("janus");
    assert_eq!(loader.module_path("std/math"), PathBuf::from("/src/std/math.janus"));
    assert_eq!(loader.root(), Path::new("/src"));
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let loader = FsModuleLoader::new(dir.path()).with_parser(Arc::new(NameParser));
    let result = loader.load("nope", &SharedInterner::new()).unwrap();
    assert!(result.is_none());
}

#[test]
fn loads_and_parses_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("util")).unwrap();
    fs::write(dir.path().join("util/strings.jan"), "shout\n").unwrap();

    let interner = SharedInterner::new();
    let loader = FsModuleLoader::new(dir.path()).with_parser(Arc::new(NameParser));
    let module = loader.load("util/strings", &interner).unwrap().unwrap();

    assert_eq!(module.path, Some(dir.path().join("util/strings.jan")));
    assert!(module.snapshot.interner().same_session(&interner));
    assert_eq!(module.snapshot.kind(module.snapshot.root()), Some(NodeKind::SourceFile));
    assert_eq!(first_item_name(&module.snapshot), Some("shout"));
}

#[test]
fn file_without_parser_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("lib.jan"), "x").unwrap();
    let loader = FsModuleLoader::new(dir.path());
    let err = loader.load("lib", &SharedInterner::new()).unwrap_err();
    assert!(matches!(err, LowerError::Parse { ref module, .. } if module.as_str() == "lib"));
}

#[test]
fn parser_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("blank.jan"), "   ").unwrap();
    let loader = FsModuleLoader::new(dir.path()).with_parser(Arc::new(NameParser));
    let err = loader.load("blank", &SharedInterner::new()).unwrap_err();
    assert_eq!(err.to_string(), "failed to parse module `blank`: empty module");
}

#[test]
fn memory_loader_serves_snapshots() {
    let interner = SharedInterner::new();
    let snapshot = NameParser.parse("helper", &interner).unwrap();
    let loader = MemoryLoader::new().with_module("lib/helpers", snapshot);
    assert_eq!(loader.len(), 1);
    assert!(!loader.is_empty());

    let module = loader.load("lib/helpers", &interner).unwrap().unwrap();
    assert_eq!(module.path, None);
    assert_eq!(first_item_name(&module.snapshot), Some("helper"));
    assert!(loader.load("lib/other", &interner).unwrap().is_none());
}

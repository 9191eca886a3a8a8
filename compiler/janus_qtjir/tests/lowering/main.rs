//! Lowering Integration Tests
//!
//! Programs are built as AST snapshots, lowered through the public API and
//! executed with the reference interpreter. Organized by category:
//! - `scenarios`: the canonical end-to-end programs
//! - `semantics`: runtime behavior of lowered control flow, data and errors
//! - `properties`: structural guarantees every lowering must keep
//! - `modules`: imports, native bindings and batch entry points

#![allow(clippy::unwrap_used, reason = "Tests can panic")]

pub mod modules;
pub mod properties;
pub mod scenarios;
pub mod semantics;

pub mod util;

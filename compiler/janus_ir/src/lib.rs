//! Janus ASTDB - the syntax data model shared by the parser and lowering.
//!
//! This crate contains:
//! - Names for interned identifiers, backed by a sharded session interner
//! - Tokens with source spans
//! - Syntax nodes stored in an immutable, append-only [`Snapshot`]
//! - Content IDs ([`Cid`]): structural fingerprints of subtrees
//! - The per-session unit table ([`AstDb`])
//! - [`AstBuilder`], a shape-aware constructor for snapshots
//!
//! # Design
//!
//! - **Intern everything**: identifier and literal text becomes `Name(u32)`
//! - **Flatten everything**: nodes refer to children by `NodeId(u32)`
//! - **Freeze after build**: a snapshot is never edited, so it can be read
//!   from many threads at once

/// Compile-time assertion that a type has a specific size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

pub mod ast;
mod builder;
mod cid;
mod interner;
mod name;
mod snapshot;
mod span;
mod token;
mod unit;

pub use ast::{Node, NodeId, NodeKind};
pub use builder::AstBuilder;
pub use cid::{Cid, CidOptions};
pub use interner::{InternError, SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use snapshot::{Snapshot, SnapshotBuilder, SnapshotError};
pub use span::TokenSpan;
pub use token::{Token, TokenId, TokenKind};
pub use unit::{AstDb, Unit, UnitError, UnitId};

static_assert_size!(Name, 4);
static_assert_size!(NodeId, 4);
static_assert_size!(TokenId, 4);
static_assert_size!(TokenSpan, 24);
static_assert_size!(Cid, 8);

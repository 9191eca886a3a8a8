//! Content IDs: structural fingerprints of syntax subtrees.
//!
//! A CID hashes the node kind, the text of text-bearing leaves, and the
//! CIDs of the children in order. Token positions are left out unless
//! [`CidOptions::include_spans`] is set, so moving a function around a file
//! does not change its CID.
//!
//! Text is hashed as a string, never as a [`Name`](crate::Name), so CIDs
//! agree across interners and sessions.

use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::{NodeId, Snapshot};

/// 64-bit content fingerprint of a subtree.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct Cid(u64);

impl Cid {
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Cid(raw)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({:016x})", self.0)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// What a CID covers beyond structure and text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct CidOptions {
    /// Mix token spans of every node into the hash.
    pub include_spans: bool,
}

impl CidOptions {
    /// Structure and text only.
    pub const STRUCTURAL: CidOptions = CidOptions {
        include_spans: false,
    };

    /// Structure, text and source positions.
    pub const WITH_SPANS: CidOptions = CidOptions {
        include_spans: true,
    };
}

/// Hash the subtree at `root`, filling the snapshot's CID cache for every
/// node visited.
///
/// Iterative post-order walk: a child's CID is always cached before its
/// parent is hashed.
pub(crate) fn hash_subtree(snapshot: &Snapshot, root: NodeId, options: CidOptions) -> Cid {
    let mut root_cid = Cid::default();
    let mut stack = vec![(root, false)];

    while let Some((id, children_done)) = stack.pop() {
        if let Some(cid) = snapshot.cached_cid(id, options) {
            if id == root {
                root_cid = cid;
            }
            continue;
        }
        if children_done {
            let cid = hash_node(snapshot, id, options);
            snapshot.store_cid(id, options, cid);
            if id == root {
                root_cid = cid;
            }
        } else {
            stack.push((id, true));
            stack.extend(
                snapshot
                    .children(id)
                    .iter()
                    .rev()
                    .filter(|&&child| snapshot.cached_cid(child, options).is_none())
                    .map(|&child| (child, false)),
            );
        }
    }

    root_cid
}

fn hash_node(snapshot: &Snapshot, id: NodeId, options: CidOptions) -> Cid {
    let mut hasher = FxHasher::default();
    let Some(node) = snapshot.node(id) else {
        return Cid::default();
    };

    (node.kind as u32).hash(&mut hasher);
    if node.kind.carries_text() {
        snapshot
            .token_text(node.first_token)
            .unwrap_or("")
            .hash(&mut hasher);
    }
    if options.include_spans {
        if let Some(span) = snapshot.node_span(id) {
            span.hash(&mut hasher);
        }
    }

    node.children.len().hash(&mut hasher);
    for &child in node.children {
        snapshot
            .cached_cid(child, options)
            .unwrap_or_default()
            .hash(&mut hasher);
    }

    Cid(hasher.finish())
}

//! Snapshot store: the frozen token and node tables of one parsed unit.
//!
//! [`SnapshotBuilder`] is append-only. Children must be added before their
//! parent, so a child id is always smaller than its parent's id and the tree
//! is acyclic by construction. [`SnapshotBuilder::finish`] freezes the
//! tables into a [`Snapshot`], which is read-only from then on and safe to
//! share across threads.
//!
//! Child lists are flattened into one `Vec<NodeId>`; each node stores the
//! start and length of its range.

use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::cid::{self, Cid, CidOptions};
use crate::{Name, Node, NodeId, NodeKind, SharedInterner, Token, TokenId, TokenKind, TokenSpan};

/// Error raised while building a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("node {child} referenced as a child of a {parent:?} node does not exist")]
    UnknownChild { parent: NodeKind, child: NodeId },
    #[error("token {token:?} referenced by a {kind:?} node does not exist")]
    UnknownToken { kind: NodeKind, token: TokenId },
    #[error("{kind:?} node spans tokens {first:?}..{last:?} in reverse order")]
    ReversedTokens {
        kind: NodeKind,
        first: TokenId,
        last: TokenId,
    },
    #[error("root node {0} does not exist")]
    UnknownRoot(NodeId),
    #[error("snapshot exceeded capacity for {0}")]
    CapacityExceeded(&'static str),
}

#[derive(Copy, Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    first_token: TokenId,
    last_token: TokenId,
    children_start: u32,
    children_len: u32,
}

fn to_u32(len: usize, what: &'static str) -> Result<u32, SnapshotError> {
    u32::try_from(len).map_err(|_| SnapshotError::CapacityExceeded(what))
}

/// Append-only builder for a [`Snapshot`].
pub struct SnapshotBuilder {
    interner: SharedInterner,
    tokens: Vec<Token>,
    nodes: Vec<NodeData>,
    child_lists: Vec<NodeId>,
}

impl SnapshotBuilder {
    /// Create a builder whose token text is interned in `interner`.
    pub fn new(interner: SharedInterner) -> Self {
        Self {
            interner,
            tokens: Vec::new(),
            nodes: Vec::new(),
            child_lists: Vec::new(),
        }
    }

    /// The session interner used for token text.
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Intern `text` in the session interner.
    pub fn intern(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    /// Append a token.
    pub fn add_token(
        &mut self,
        kind: TokenKind,
        text: Option<Name>,
        span: TokenSpan,
    ) -> Result<TokenId, SnapshotError> {
        let id = TokenId::new(to_u32(self.tokens.len(), "tokens")?);
        self.tokens.push(Token::new(kind, text, span));
        Ok(id)
    }

    /// Append a node. Its tokens and children must already exist.
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        first_token: TokenId,
        last_token: TokenId,
        children: &[NodeId],
    ) -> Result<NodeId, SnapshotError> {
        for token in [first_token, last_token] {
            if token.index() >= self.tokens.len() {
                return Err(SnapshotError::UnknownToken { kind, token });
            }
        }
        if first_token > last_token {
            return Err(SnapshotError::ReversedTokens {
                kind,
                first: first_token,
                last: last_token,
            });
        }
        if let Some(&child) = children.iter().find(|c| c.index() >= self.nodes.len()) {
            return Err(SnapshotError::UnknownChild {
                parent: kind,
                child,
            });
        }

        let id = NodeId::new(to_u32(self.nodes.len(), "nodes")?);
        let children_start = to_u32(self.child_lists.len(), "child lists")?;
        let children_len = to_u32(children.len(), "child lists")?;
        self.child_lists.extend_from_slice(children);
        self.nodes.push(NodeData {
            kind,
            first_token,
            last_token,
            children_start,
            children_len,
        });
        Ok(id)
    }

    /// Number of nodes added so far.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of tokens added so far.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// First token of an already-added node.
    pub fn first_token_of(&self, node: NodeId) -> Option<TokenId> {
        self.nodes.get(node.index()).map(|n| n.first_token)
    }

    /// Last token of an already-added node.
    pub fn last_token_of(&self, node: NodeId) -> Option<TokenId> {
        self.nodes.get(node.index()).map(|n| n.last_token)
    }

    /// Freeze the tables into an immutable snapshot rooted at `root`.
    pub fn finish(self, root: NodeId) -> Result<Snapshot, SnapshotError> {
        if root.index() >= self.nodes.len() {
            return Err(SnapshotError::UnknownRoot(root));
        }
        Ok(Snapshot {
            interner: self.interner,
            tokens: self.tokens,
            nodes: self.nodes,
            child_lists: self.child_lists,
            root,
            cid_cache: RwLock::new(FxHashMap::default()),
        })
    }
}

/// Frozen token and node tables for one parse of one unit.
pub struct Snapshot {
    interner: SharedInterner,
    tokens: Vec<Token>,
    nodes: Vec<NodeData>,
    child_lists: Vec<NodeId>,
    root: NodeId,
    cid_cache: RwLock<FxHashMap<(NodeId, CidOptions), Cid>>,
}

impl Snapshot {
    /// Root node (a `SourceFile` for parsed units).
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The interner that resolves this snapshot's token text.
    #[inline]
    pub fn interner(&self) -> &SharedInterner {
        &self.interner
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of tokens.
    #[inline]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Node view, or `None` if `id` is out of range.
    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        let data = self.nodes.get(id.index())?;
        let start = data.children_start as usize;
        let end = start + data.children_len as usize;
        Some(Node {
            kind: data.kind,
            first_token: data.first_token,
            last_token: data.last_token,
            children: &self.child_lists[start..end],
        })
    }

    /// Kind of a node, or `None` if `id` is out of range.
    #[inline]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(id.index()).map(|n| n.kind)
    }

    /// Ordered children of a node; empty if `id` is out of range.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children)
    }

    /// Token by id.
    #[inline]
    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.index())
    }

    /// Text of a token: its interned text, or the fixed spelling of its kind.
    pub fn token_text(&self, id: TokenId) -> Option<&'static str> {
        let token = self.token(id)?;
        match token.text {
            Some(name) => Some(self.interner.lookup(name)),
            None => token.kind.fixed_text(),
        }
    }

    /// Text of a node's first token.
    pub fn node_text(&self, id: NodeId) -> Option<&'static str> {
        self.token_text(self.node(id)?.first_token)
    }

    /// Interned text of a node's first token, if the token carries text.
    pub fn node_name(&self, id: NodeId) -> Option<Name> {
        self.token(self.node(id)?.first_token)?.text
    }

    /// Source span from the node's first token to its last token.
    pub fn node_span(&self, id: NodeId) -> Option<TokenSpan> {
        let node = self.node(id)?;
        let first = self.token(node.first_token)?.span;
        let last = self.token(node.last_token)?.span;
        Some(first.merge(last))
    }

    /// Content ID of the subtree rooted at `id`.
    ///
    /// Computed on first request and cached; later calls return the cached
    /// value. `None` if `id` is out of range.
    pub fn cid(&self, id: NodeId, options: CidOptions) -> Option<Cid> {
        if id.index() >= self.nodes.len() {
            return None;
        }
        if let Some(cid) = self.cached_cid(id, options) {
            return Some(cid);
        }
        Some(cid::hash_subtree(self, id, options))
    }

    pub(crate) fn cached_cid(&self, id: NodeId, options: CidOptions) -> Option<Cid> {
        self.cid_cache.read().get(&(id, options)).copied()
    }

    pub(crate) fn store_cid(&self, id: NodeId, options: CidOptions, cid: Cid) {
        self.cid_cache.write().insert((id, options), cid);
    }

    /// Iterate over all node ids in allocation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter_map(|i| u32::try_from(i).ok().map(NodeId::new))
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("tokens", &self.tokens.len())
            .finish_non_exhaustive()
    }
}

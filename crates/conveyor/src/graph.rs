//! Asset dependency graph
//!
//! Tracks every discovered asset, its ordered require edges, and which
//! assets are stubbed out of the bundle. The declaration order of a node's
//! edges is the expansion order in the bundle, so edges live in per-asset
//! vectors; a petgraph mirror is kept alongside for cycle analysis.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use petgraph::{
    algo::{is_cyclic_directed, tarjan_scc},
    graph::{DiGraph, NodeIndex},
};
use rustc_hash::FxHashSet;

/// Unique identifier for a discovered asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(u32);

impl AssetId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// Data about a single discovered asset
#[derive(Debug)]
pub struct AssetData {
    /// Canonical path, the identity used for dedup and cycle detection
    pub path: PathBuf,
    /// Raw source text
    pub source: String,
    /// 0-based indices of directive lines, stripped at emission
    pub directive_line_indices: Vec<usize>,
    /// Required assets in declaration order, directory directives flattened
    pub requires: Vec<AssetId>,
    /// Position of `require_self` within `requires`, when present
    pub self_index: Option<usize>,
}

/// Dependency graph over all discovered assets
#[derive(Debug, Default)]
pub struct AssetGraph {
    /// Asset data indexed by `AssetId`
    assets: Vec<AssetData>,
    /// Canonical path -> id, in discovery order
    path_to_id: IndexMap<PathBuf, AssetId>,
    /// petgraph mirror for cycle analysis
    petgraph: DiGraph<AssetId, ()>,
    /// Node index per asset, parallel to `assets`
    node_indices: Vec<NodeIndex>,
    /// Canonical paths excluded from the bundle via `stub`
    stubbed: FxHashSet<PathBuf>,
}

impl AssetGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly read asset. The caller records requires afterwards
    /// via [`Self::add_require`], once its directives have been resolved.
    pub fn add_asset(
        &mut self,
        path: PathBuf,
        source: String,
        directive_line_indices: Vec<usize>,
    ) -> AssetId {
        debug_assert!(!self.path_to_id.contains_key(&path));

        let id = AssetId::new(self.assets.len() as u32);
        self.assets.push(AssetData {
            path: path.clone(),
            source,
            directive_line_indices,
            requires: Vec::new(),
            self_index: None,
        });
        self.path_to_id.insert(path, id);
        self.node_indices.push(self.petgraph.add_node(id));
        id
    }

    /// Look up an asset by canonical path
    pub fn get_id(&self, path: &Path) -> Option<AssetId> {
        self.path_to_id.get(path).copied()
    }

    pub fn asset(&self, id: AssetId) -> &AssetData {
        &self.assets[id.as_u32() as usize]
    }

    /// Record a require edge; per-node edge order is declaration order
    pub fn add_require(&mut self, from: AssetId, to: AssetId) {
        self.assets[from.as_u32() as usize].requires.push(to);
        self.petgraph.add_edge(
            self.node_indices[from.as_u32() as usize],
            self.node_indices[to.as_u32() as usize],
            (),
        );
    }

    /// Record where `require_self` appeared among an asset's requires
    pub fn set_self_index(&mut self, id: AssetId, index: usize) {
        self.assets[id.as_u32() as usize].self_index = Some(index);
    }

    /// Exclude an asset (by canonical path) from the bundle
    pub fn stub(&mut self, path: PathBuf) {
        self.stubbed.insert(path);
    }

    pub fn is_stubbed(&self, id: AssetId) -> bool {
        self.stubbed.contains(&self.asset(id).path)
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Find circular require groups.
    ///
    /// Returns one group per offending strongly connected component; a
    /// single asset requiring itself counts as a cycle too.
    pub fn find_cycles(&self) -> Vec<Vec<AssetId>> {
        if !is_cyclic_directed(&self.petgraph) {
            return Vec::new();
        }

        tarjan_scc(&self.petgraph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1
                    || self
                        .petgraph
                        .find_edge(scc[0], scc[0])
                        .is_some()
            })
            .map(|scc| scc.into_iter().map(|n| self.petgraph[n]).collect())
            .collect()
    }

    /// Compute the final inclusion order: depth-first over the ordered
    /// require edges from `entry`, each asset exactly once, dependencies
    /// before dependents, `require_self` overriding body placement, stubbed
    /// assets and their unreached subtrees skipped.
    pub fn inclusion_order(&self, entry: AssetId) -> Vec<AssetId> {
        let mut order = Vec::with_capacity(self.assets.len());
        let mut included = FxHashSet::default();
        self.visit(entry, &mut included, &mut order);
        order
    }

    fn visit(&self, id: AssetId, included: &mut FxHashSet<AssetId>, order: &mut Vec<AssetId>) {
        if !included.insert(id) || self.is_stubbed(id) {
            return;
        }

        let data = self.asset(id);
        let mut placed = false;
        for (index, &child) in data.requires.iter().enumerate() {
            if data.self_index == Some(index) {
                order.push(id);
                placed = true;
            }
            self.visit(child, included, order);
        }
        if !placed {
            order.push(id);
        }
    }
}

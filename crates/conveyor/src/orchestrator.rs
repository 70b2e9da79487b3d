//! Bundling orchestration
//!
//! Drives the full pipeline: discovery (read each asset, parse its header,
//! resolve its directives, recurse into requires while building the graph),
//! cycle analysis, ordering, and emission.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::{debug, info};
use walkdir::WalkDir;

use crate::{
    combine,
    config::Config,
    directive::{Directive, ParsedDirective, parse_header},
    graph::{AssetGraph, AssetId},
    resolver::AssetResolver,
};

/// The result of a bundling run
#[derive(Debug)]
pub struct Bundle {
    /// Canonical paths of every included asset, in emission order
    pub order: Vec<PathBuf>,
    /// The concatenated bundle source
    pub source: String,
}

#[derive(Debug)]
pub struct BundleOrchestrator {
    resolver: AssetResolver,
}

impl BundleOrchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            resolver: AssetResolver::new(config),
        }
    }

    /// Bundle the asset tree rooted at `entry` into a single source string
    pub fn bundle(&mut self, entry: &Path) -> Result<Bundle> {
        let entry = entry
            .canonicalize()
            .with_context(|| format!("entry asset {} not found", entry.display()))?;

        let mut graph = AssetGraph::new();
        let entry_id = self.discover(entry, &mut graph)?;
        info!("discovered {} asset(s)", graph.asset_count());

        let cycles = graph.find_cycles();
        if !cycles.is_empty() {
            bail!("circular require detected: {}", describe_cycles(&graph, &cycles));
        }

        let order = graph.inclusion_order(entry_id);
        let source = combine::combine(&graph, &order);
        let order = order
            .into_iter()
            .map(|id| graph.asset(id).path.clone())
            .collect();

        Ok(Bundle { order, source })
    }

    /// Read and parse one asset, resolving its directives depth-first.
    ///
    /// Re-entrant requires terminate at the `get_id` check: the asset is
    /// interned before its directives are processed, so a cycle records its
    /// back edge here and is reported by the cycle analysis afterwards.
    fn discover(&mut self, path: PathBuf, graph: &mut AssetGraph) -> Result<AssetId> {
        if let Some(id) = graph.get_id(&path) {
            return Ok(id);
        }

        debug!("discovering {}", path.display());
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read asset {}", path.display()))?;
        let header = parse_header(&source)
            .with_context(|| format!("invalid directive header in {}", path.display()))?;

        let id = graph.add_asset(path.clone(), source, header.directive_line_indices);
        let requiring_dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let mut require_count = 0usize;
        for parsed in &header.directives {
            match &parsed.directive {
                Directive::Require(reference) => {
                    let child = self.resolve_required(reference, &requiring_dir, &path, parsed)?;
                    let child_id = self.discover(child, graph)?;
                    graph.add_require(id, child_id);
                    require_count += 1;
                }
                Directive::RequireDirectory(reference) | Directive::RequireTree(reference) => {
                    let recursive = matches!(parsed.directive, Directive::RequireTree(_));
                    let dir = self
                        .resolver
                        .resolve_directory(reference, &requiring_dir)
                        .with_context(|| missing(reference, &path, parsed))?;
                    for file in self.expand_directory(&dir, recursive, &path)? {
                        let child_id = self.discover(file, graph)?;
                        graph.add_require(id, child_id);
                        require_count += 1;
                    }
                }
                Directive::RequireSelf => {
                    graph.set_self_index(id, require_count);
                }
                Directive::Stub(reference) => {
                    let stubbed = self.resolve_required(reference, &requiring_dir, &path, parsed)?;
                    debug!("stubbing {}", stubbed.display());
                    graph.stub(stubbed);
                }
            }
        }

        Ok(id)
    }

    fn resolve_required(
        &mut self,
        reference: &str,
        requiring_dir: &Path,
        requiring: &Path,
        parsed: &ParsedDirective,
    ) -> Result<PathBuf> {
        self.resolver
            .resolve_asset(reference, requiring_dir)
            .with_context(|| missing(reference, requiring, parsed))
    }

    /// Expand a directory directive into a deterministic, sorted file list.
    ///
    /// Only files with a configured extension are included, and the
    /// requiring asset itself is skipped if it lives inside the tree.
    fn expand_directory(
        &self,
        dir: &Path,
        recursive: bool,
        requiring: &Path,
    ) -> Result<Vec<PathBuf>> {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry = entry
                .with_context(|| format!("failed to walk directory {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| self.resolver.config().matches_extension(e));
            if matches && entry.path() != requiring {
                files.push(entry.into_path());
            }
        }

        debug!(
            "expanded {} into {} file(s) ({})",
            dir.display(),
            files.len(),
            if recursive { "tree" } else { "directory" }
        );
        Ok(files)
    }
}

fn missing(reference: &str, requiring: &Path, parsed: &ParsedDirective) -> String {
    format!(
        "couldn't find required asset '{reference}' (required from {} on line {})",
        requiring.display(),
        parsed.line
    )
}

fn describe_cycles(graph: &AssetGraph, cycles: &[Vec<AssetId>]) -> String {
    cycles
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|id| graph.asset(*id).path.display().to_string())
                .collect::<Vec<_>>()
                .join(" -> ")
        })
        .collect::<Vec<_>>()
        .join("; ")
}

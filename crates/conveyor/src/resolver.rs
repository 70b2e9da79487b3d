//! Reference resolution
//!
//! Turns directive references into canonical file paths. Logical references
//! (`codemirror`, `jquery.fileupload`) are searched through the configured
//! load paths in declared order; relative references (`./views/grid`,
//! `../common/dropdown`) resolve against the requiring asset's directory.
//! References without a configured extension try each configured extension
//! in order.

use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};

use crate::{config::Config, types::RefKind};

/// Classify a directive reference by how it should be resolved
pub fn classify_reference(reference: &str) -> RefKind {
    // `.` and `..` alone appear in directory directives (`require_tree .`)
    if reference == "."
        || reference == ".."
        || reference.starts_with("./")
        || reference.starts_with("../")
    {
        RefKind::Relative
    } else {
        RefKind::Logical
    }
}

/// Lexically normalize a path, folding `.` and `..` components.
///
/// Used as a fallback identity when canonicalization fails, so duplicate
/// requires through different relative spellings still collapse.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[derive(Debug)]
pub struct AssetResolver {
    config: Config,
    /// Cache of resolved logical references
    logical_cache: IndexMap<String, Option<PathBuf>>,
    /// Cache of resolved relative references, keyed by requiring directory
    relative_cache: IndexMap<(PathBuf, String), Option<PathBuf>>,
}

impl AssetResolver {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            logical_cache: IndexMap::new(),
            relative_cache: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canonicalize a path, handling errors gracefully
    fn canonicalize_path(&self, path: PathBuf) -> PathBuf {
        match path.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) => {
                // Log warning but don't fail - fall back to lexical normalization
                warn!("Failed to canonicalize path {}: {}", path.display(), e);
                normalize_path(&path)
            }
        }
    }

    /// Resolve a `require` / `stub` reference to a canonical file path.
    ///
    /// Returns `None` when nothing matches; the caller decides whether that
    /// is fatal (it is, for every directive that names an asset).
    pub fn resolve_asset(&mut self, reference: &str, requiring_dir: &Path) -> Option<PathBuf> {
        match classify_reference(reference) {
            RefKind::Relative => {
                let key = (requiring_dir.to_path_buf(), reference.to_owned());
                if let Some(cached) = self.relative_cache.get(&key) {
                    return cached.clone();
                }
                let resolved = self.find_file(&requiring_dir.join(reference));
                self.relative_cache.insert(key, resolved.clone());
                resolved
            }
            RefKind::Logical => {
                if let Some(cached) = self.logical_cache.get(reference) {
                    return cached.clone();
                }
                let mut resolved = None;
                for load_path in &self.config.load_paths {
                    if let Some(found) = self.find_file(&load_path.join(reference)) {
                        resolved = Some(found);
                        break;
                    }
                }
                if resolved.is_none() {
                    debug!(
                        "logical reference '{reference}' not found in {} load path(s)",
                        self.config.load_paths.len()
                    );
                }
                self.logical_cache
                    .insert(reference.to_owned(), resolved.clone());
                resolved
            }
        }
    }

    /// Resolve a `require_directory` / `require_tree` reference to a
    /// canonical directory path. No extension inference applies.
    pub fn resolve_directory(&self, reference: &str, requiring_dir: &Path) -> Option<PathBuf> {
        match classify_reference(reference) {
            RefKind::Relative => {
                let path = requiring_dir.join(reference);
                path.is_dir().then(|| self.canonicalize_path(path))
            }
            RefKind::Logical => self.config.load_paths.iter().find_map(|load_path| {
                let path = load_path.join(reference);
                path.is_dir().then(|| self.canonicalize_path(path))
            }),
        }
    }

    /// Try a base path with extension inference; first existing file wins
    fn find_file(&self, base: &Path) -> Option<PathBuf> {
        let has_configured_extension = base
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.config.matches_extension(e));

        if has_configured_extension {
            return base.is_file().then(|| self.canonicalize_path(base.to_path_buf()));
        }

        for extension in &self.config.extensions {
            // `select2.min` must become `select2.min.js`, not `select2.js`,
            // so the extension is appended rather than replaced
            let mut candidate = base.as_os_str().to_owned();
            candidate.push(".");
            candidate.push(extension);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                return Some(self.canonicalize_path(candidate));
            }
        }

        None
    }
}

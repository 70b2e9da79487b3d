//! Bundle emission
//!
//! Concatenates the ordered assets into the final bundle. Directive lines
//! are stripped; everything else is carried through byte-for-byte, with each
//! asset's final line terminated with a newline so concatenation never glues
//! two statements onto one line.

use sha2::{Digest, Sha256};

use crate::graph::{AssetGraph, AssetId};

/// Concatenate the assets in `order` into a single bundle source
pub fn combine(graph: &AssetGraph, order: &[AssetId]) -> String {
    let mut bundle = String::new();
    for &id in order {
        let asset = graph.asset(id);
        bundle.push_str(&strip_directives(&asset.source, &asset.directive_line_indices));
    }
    bundle
}

/// Remove directive lines from an asset's source, preserving everything else
fn strip_directives(source: &str, directive_line_indices: &[usize]) -> String {
    let mut output = String::with_capacity(source.len());
    for (index, line) in source.lines().enumerate() {
        if directive_line_indices.binary_search(&index).is_ok() {
            continue;
        }
        output.push_str(line);
        output.push('\n');
    }
    output
}

/// Hex-encoded sha256 digest of the bundle contents
pub fn content_digest(bundle: &str) -> String {
    let digest = Sha256::digest(bundle.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Length of the digest prefix used in fingerprinted file names
pub const FINGERPRINT_LEN: usize = 16;

/// Insert a digest fingerprint before the output file's extension,
/// `bundle.js` becoming `bundle-0123456789abcdef.js`
pub fn fingerprinted_path(output: &std::path::Path, digest: &str) -> std::path::PathBuf {
    let fingerprint = &digest[..FINGERPRINT_LEN.min(digest.len())];
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bundle");
    let name = match output.extension().and_then(|e| e.to_str()) {
        Some(extension) => format!("{stem}-{fingerprint}.{extension}"),
        None => format!("{stem}-{fingerprint}"),
    };
    output.with_file_name(name)
}

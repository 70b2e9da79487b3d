//! Directive header parsing
//!
//! An asset's directives live in its header: the leading run of comment and
//! blank lines at the top of the file. A directive is a line comment whose
//! text begins with `=`, e.g. `//= require codemirror` or
//! `#= require_tree ./views`. The header ends at the first line that is
//! neither blank nor a comment; directives appearing later in the file are
//! plain comments and are ignored.

use anyhow::{Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a directive line and captures the directive name and its argument
static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?://|#)=\s*(\w+)(?:[ \t]+(\S.*?))?\s*$").expect("directive regex is valid")
});

/// Matches the directive marker alone, to catch malformed directive lines
static DIRECTIVE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?://|#)=").expect("directive marker regex is valid")
});

/// Matches any line comment, directive or not
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?://|#)").expect("comment regex is valid")
});

/// A single bundling instruction extracted from an asset header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Include the referenced asset (and its requires) before this one
    Require(String),
    /// Include every matching file directly inside the referenced directory
    RequireDirectory(String),
    /// Include every matching file under the referenced directory, recursively
    RequireTree(String),
    /// Place this asset's own body at this position instead of after its requires
    RequireSelf,
    /// Exclude the referenced asset from the bundle entirely
    Stub(String),
}

/// A directive together with its location, for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDirective {
    pub directive: Directive,
    /// 1-based source line the directive was parsed from
    pub line: usize,
}

/// The parsed directive header of an asset
#[derive(Debug, Clone, Default)]
pub struct Header {
    /// Directives in declaration order
    pub directives: Vec<ParsedDirective>,
    /// 0-based indices of directive lines, for stripping during emission
    pub directive_line_indices: Vec<usize>,
}

impl Header {
    /// Whether the header contains a `require_self` directive
    pub fn has_require_self(&self) -> bool {
        self.directives
            .iter()
            .any(|d| d.directive == Directive::RequireSelf)
    }
}

/// Parse the directive header of an asset source.
///
/// Blank lines inside the header are tolerated (manifests commonly group
/// directive runs with blank lines), as are non-directive comments, which
/// stay part of the emitted source.
pub fn parse_header(source: &str) -> Result<Header> {
    let mut header = Header::default();

    for (index, line) in source.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(captures) = DIRECTIVE_RE.captures(line) {
            let name = &captures[1];
            let argument = captures.get(2).map(|m| m.as_str());
            let line_number = index + 1;

            let directive = parse_directive(name, argument, line_number)?;
            if directive == Directive::RequireSelf && header.has_require_self() {
                bail!("duplicate require_self directive on line {line_number}");
            }

            header.directives.push(ParsedDirective {
                directive,
                line: line_number,
            });
            header.directive_line_indices.push(index);
        } else if DIRECTIVE_MARKER_RE.is_match(line) {
            bail!("malformed directive on line {}: {}", index + 1, line.trim());
        } else if COMMENT_RE.is_match(line) {
            // Plain comment, still inside the header
            continue;
        } else {
            // First real source line ends the header
            break;
        }
    }

    Ok(header)
}

fn parse_directive(name: &str, argument: Option<&str>, line: usize) -> Result<Directive> {
    let require_argument = || {
        argument.map(String::from).ok_or_else(|| {
            anyhow::anyhow!("directive '{name}' on line {line} is missing its path argument")
        })
    };

    let directive = match name {
        "require" => Directive::Require(require_argument()?),
        "require_directory" => Directive::RequireDirectory(require_argument()?),
        "require_tree" => Directive::RequireTree(require_argument()?),
        "require_self" => {
            if argument.is_some() {
                bail!("require_self on line {line} takes no argument");
            }
            Directive::RequireSelf
        }
        "stub" => Directive::Stub(require_argument()?),
        other => bail!("unknown directive '{other}' on line {line}"),
    };

    Ok(directive)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn directives(source: &str) -> Vec<Directive> {
        parse_header(source)
            .unwrap()
            .directives
            .into_iter()
            .map(|d| d.directive)
            .collect()
    }

    #[test]
    fn parses_slash_and_hash_comment_styles() {
        let source = "//= require codemirror\n#= require_tree ./views\n";
        assert_eq!(
            directives(source),
            vec![
                Directive::Require("codemirror".into()),
                Directive::RequireTree("./views".into()),
            ]
        );
    }

    #[test]
    fn blank_lines_and_plain_comments_stay_in_the_header() {
        let source = "//= require a\n\n// table view modules\n//= require b\n";
        assert_eq!(
            directives(source),
            vec![Directive::Require("a".into()), Directive::Require("b".into())]
        );
    }

    #[test]
    fn header_ends_at_first_source_line() {
        let source = "//= require a\nvar x = 1;\n//= require b\n";
        assert_eq!(directives(source), vec![Directive::Require("a".into())]);
    }

    #[test]
    fn records_directive_line_indices_for_stripping() {
        let source = "// header comment\n//= require a\n\n//= require b\ncode();\n";
        let header = parse_header(source).unwrap();
        assert_eq!(header.directive_line_indices, vec![1, 3]);
    }

    #[test]
    fn relative_references_keep_their_full_path() {
        let source = "//= require ../../../lib/assets/javascripts/utils/postgres.codemirror\n";
        assert_eq!(
            directives(source),
            vec![Directive::Require(
                "../../../lib/assets/javascripts/utils/postgres.codemirror".into()
            )]
        );
    }

    #[test]
    fn unknown_directive_is_an_error_with_line_number() {
        let err = parse_header("//= require a\n//= provide b\n").unwrap_err();
        assert!(err.to_string().contains("unknown directive 'provide'"));
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn malformed_directive_is_an_error() {
        let err = parse_header("//= require-tree views\n").unwrap_err();
        assert!(err.to_string().contains("malformed directive on line 1"));
    }

    #[test]
    fn require_without_argument_is_an_error() {
        let err = parse_header("//= require\n").unwrap_err();
        assert!(err.to_string().contains("missing its path argument"));
    }

    #[test]
    fn duplicate_require_self_is_an_error() {
        let err = parse_header("//= require_self\n//= require_self\n").unwrap_err();
        assert!(err.to_string().contains("duplicate require_self"));
    }

    #[test]
    fn require_self_with_argument_is_an_error() {
        let err = parse_header("//= require_self foo\n").unwrap_err();
        assert!(err.to_string().contains("takes no argument"));
    }
}

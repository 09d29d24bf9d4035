// src/fileset.rs

//! Glob-based file selection.
//!
//! A [`PathSet`] is an ordered list of inclusion patterns plus optional
//! negation patterns, written with a leading `!` in configuration:
//!
//! ```toml
//! [paths]
//! templates = ["views/**/*.html", "!views/utils/**"]
//! ```
//!
//! Resolution walks the source root and keeps every file matching an
//! inclusion pattern, then removes every file matching a negation pattern.
//! A file excluded by any negation is never emitted, regardless of which
//! inclusions it matched. An empty result is not an error; tasks treat zero
//! matched files as a no-op.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use crate::errors::TaskError;

/// Ordered inclusion/negation glob patterns, relative to the source root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct PathSet {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl From<Vec<String>> for PathSet {
    fn from(patterns: Vec<String>) -> Self {
        let mut set = PathSet::default();
        for pat in patterns {
            match pat.strip_prefix('!') {
                Some(neg) => set.exclude.push(neg.to_string()),
                None => set.include.push(pat),
            }
        }
        set
    }
}

impl PathSet {
    /// Build a path set from string literals; `!`-prefixed entries are
    /// negations.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        patterns
            .iter()
            .map(|p| p.as_ref().to_string())
            .collect::<Vec<_>>()
            .into()
    }

    /// Compile both pattern lists into matchers.
    pub fn compile(&self) -> Result<CompiledPathSet, TaskError> {
        let include = build_globset(&self.include)?;
        let exclude = if self.exclude.is_empty() {
            None
        } else {
            Some(build_globset(&self.exclude)?)
        };
        Ok(CompiledPathSet { include, exclude })
    }

    /// Expand this path set into a concrete ordered file list under `root`.
    ///
    /// Walk order is the filesystem's enumeration order, sorted for
    /// determinism. Hidden files are visited like any other entry.
    pub fn resolve(&self, root: &Path) -> Result<Vec<PathBuf>, TaskError> {
        let compiled = self.compile()?;
        let mut files = Vec::new();

        for entry in jwalk::WalkDir::new(root).sort(true) {
            let entry = entry.map_err(|e| {
                TaskError::io(root, std::io::Error::other(e.to_string()))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if let Some(rel) = relative_str(root, &path) {
                if compiled.is_match(&rel) {
                    files.push(path);
                }
            }
        }

        Ok(files)
    }
}

/// Compiled matchers for a [`PathSet`], used both by the resolver and by the
/// watch bindings.
#[derive(Debug, Clone)]
pub struct CompiledPathSet {
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl CompiledPathSet {
    /// Match a root-relative, forward-slash path such as `"styles/main.scss"`.
    pub fn is_match(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, TaskError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).map_err(|e| TaskError::Pattern {
            pattern: pat.clone(),
            source: e,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| TaskError::Pattern {
        pattern: patterns.join(", "),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_patterns_split_from_toml_list() {
        let set = PathSet::new(&["img/**/*.svg", "!img/svg/**"]);
        assert_eq!(set.include, vec!["img/**/*.svg"]);
        assert_eq!(set.exclude, vec!["img/svg/**"]);
    }

    #[test]
    fn excluded_file_never_matches_even_when_included() {
        let set = PathSet::new(&["views/**/*.html", "!views/utils/**"]);
        let compiled = set.compile().unwrap();
        assert!(compiled.is_match("views/index.html"));
        assert!(compiled.is_match("views/about/team.html"));
        assert!(!compiled.is_match("views/utils/head.html"));
        assert!(!compiled.is_match("styles/main.scss"));
    }

    #[test]
    fn brace_alternation_matches_image_extensions() {
        let set = PathSet::new(&["img/**/*.{jpg,jpeg,png,gif,svg}"]);
        let compiled = set.compile().unwrap();
        assert!(compiled.is_match("img/photo.jpg"));
        assert!(compiled.is_match("img/icons/logo.svg"));
        assert!(!compiled.is_match("img/readme.txt"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let set = PathSet::new(&["img/[oops"]);
        assert!(matches!(set.compile(), Err(TaskError::Pattern { .. })));
    }
}

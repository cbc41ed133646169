//! Object name filters
//!
//! Navigator filters are lists of include and exclude masks. Masks use `*`
//! or `%` for any run of characters and `?` for a single character, and are
//! matched case-insensitively.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

/// Include/exclude name masks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl NameFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, mask: impl Into<String>) -> Self {
        self.include.push(mask.into());
        self
    }

    pub fn exclude(mut self, mask: impl Into<String>) -> Self {
        self.exclude.push(mask.into());
        self
    }

    /// True when the filter has no masks at all
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Compile the masks for repeated matching
    pub fn compile(&self) -> CompiledNameFilter {
        CompiledNameFilter {
            include: build_set(&self.include),
            exclude: build_set(&self.exclude),
        }
    }

    /// Check a single name. Prefer `compile` when matching many names.
    pub fn matches(&self, name: &str) -> bool {
        self.compile().matches(name)
    }
}

/// Name filter with masks compiled to glob matchers
#[derive(Debug, Clone)]
pub struct CompiledNameFilter {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl CompiledNameFilter {
    /// A name passes when it matches some include mask (or there are none)
    /// and no exclude mask.
    pub fn matches(&self, name: &str) -> bool {
        let included = self.include.as_ref().is_none_or(|set| set.is_match(name));
        let excluded = self.exclude.as_ref().is_some_and(|set| set.is_match(name));
        included && !excluded
    }
}

fn build_set(masks: &[String]) -> Option<GlobSet> {
    let globs: Vec<String> = masks.iter().map(|mask| mask_to_glob(mask)).collect();
    compile_globs(&globs)
}

/// `None` when no glob compiled, so a filter made only of invalid masks
/// behaves like an empty one.
fn compile_globs(globs: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut added = 0;
    for glob in globs {
        match GlobBuilder::new(glob)
            .case_insensitive(true)
            .literal_separator(false)
            .backslash_escape(false)
            .build()
        {
            Ok(compiled) => {
                builder.add(compiled);
                added += 1;
            }
            Err(err) => {
                tracing::warn!(mask = %glob, error = %err, "ignoring invalid name mask");
            }
        }
    }
    if added == 0 {
        return None;
    }
    match builder.build() {
        Ok(set) => Some(set),
        Err(err) => {
            tracing::warn!(error = %err, "failed to compile name filter");
            None
        }
    }
}

/// Translate a navigator mask into glob syntax, escaping glob metacharacters
/// that have no meaning in masks.
fn mask_to_glob(mask: &str) -> String {
    let mut glob = String::with_capacity(mask.len());
    for c in mask.chars() {
        match c {
            '%' => glob.push('*'),
            '[' | ']' | '{' | '}' => {
                glob.push('[');
                glob.push(c);
                glob.push(']');
            }
            _ => glob.push(c),
        }
    }
    glob
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = NameFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches("orders"));
        assert!(filter.matches(""));
    }

    #[test]
    fn test_include_masks() {
        let filter = NameFilter::new().include("ord*").include("cust%");
        assert!(filter.matches("orders"));
        assert!(filter.matches("ORDER_LINES"));
        assert!(filter.matches("customers"));
        assert!(!filter.matches("products"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = NameFilter::new().include("*").exclude("tmp_*");
        assert!(filter.matches("orders"));
        assert!(!filter.matches("tmp_orders"));
    }

    #[test]
    fn test_single_char_wildcard() {
        let filter = NameFilter::new().include("log_?");
        assert!(filter.matches("log_1"));
        assert!(!filter.matches("log_12"));
    }

    #[test]
    fn test_invalid_globs_are_ignored() {
        assert!(compile_globs(&[]).is_none());
        assert!(compile_globs(&["log_[".to_string()]).is_none());

        let set = compile_globs(&["log_[".to_string(), "ord*".to_string()]).unwrap();
        assert!(set.is_match("orders"));
        assert!(!set.is_match("log_1"));
    }
}

//! Route prefix matching.
//!
//! # Design Decisions
//! - Matching is segment-aware: `/users` matches `/users` and `/users/42`
//!   but not `/usersettings`
//! - A trailing separator on the registered prefix is ignored
//! - The empty prefix (or `/`) is the root and matches every id
//! - Matching is case-sensitive

use crate::resource::ID_SEPARATOR;

/// Matches resource ids against a registered route prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    /// Create a new prefix matcher. The prefix is normalized by trimming
    /// trailing separators.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches(ID_SEPARATOR).to_string(),
        }
    }

    /// True if this matcher is the root entry.
    pub fn is_root(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Length of the normalized prefix, used to pick the longest match.
    pub fn specificity(&self) -> usize {
        self.prefix.len()
    }

    /// Returns true if `id` equals the prefix or continues it with a separator.
    /// A missing id only matches the root.
    pub fn matches(&self, id: Option<&str>) -> bool {
        if self.is_root() {
            return true;
        }
        match id {
            Some(id) => match id.strip_prefix(self.prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with(ID_SEPARATOR),
                None => false,
            },
            None => false,
        }
    }
}

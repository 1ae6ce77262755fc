//! Filter applicability matching.
//!
//! # Responsibilities
//! - Match the request method against a configured set
//! - Match the whole request id against a configured pattern
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Empty condition = always matches (wildcard)
//! - Patterns must match the full id, not a substring
//! - A missing id never matches a pattern

use std::collections::HashSet;

use regex::Regex;

use crate::resource::Method;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if a request with this method and id matches.
    fn matches(&self, method: Method, id: Option<&str>) -> bool;
}

/// Matches requests whose method is in a set.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: HashSet<Method>,
}

impl MethodMatcher {
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, method: Method, _id: Option<&str>) -> bool {
        self.methods.contains(&method)
    }
}

/// Matches requests whose whole id matches a regular expression.
#[derive(Debug, Clone)]
pub struct IdPatternMatcher {
    pattern: Regex,
}

impl IdPatternMatcher {
    /// Compile `pattern`, anchored at both ends.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("^(?:{})$", pattern))?,
        })
    }
}

impl Matcher for IdPatternMatcher {
    fn matches(&self, _method: Method, id: Option<&str>) -> bool {
        id.map(|id| self.pattern.is_match(id)).unwrap_or(false)
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug, Default)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    pub fn push(&mut self, matcher: Box<dyn Matcher>) {
        self.matchers.push(matcher);
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, method: Method, id: Option<&str>) -> bool {
        // All matchers must pass (AND)
        self.matchers.iter().all(|m| m.matches(method, id))
    }
}

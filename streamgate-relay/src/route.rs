//! Route conditions, authorization guards, and the route table entry.
//!
//! Implements: REQ-RTE-001 (Route Resolution)
//!
//! Conditions are protocol-specific predicate objects: an HTTP binding
//! matches method and path, a TCP binding matches address and port. The
//! relay only sequences them — first match wins, never best match — so the
//! trait surface is a single `matches` call over the attributes the
//! binding's translator parsed out of the accepted Begin.
//!
//! A route with no conditions matches everything; by convention the
//! catch-all route is declared last.

use std::sync::Arc;

use crate::with::WithTemplate;

/// Name/value attributes parsed from an accepted Begin.
///
/// Ordered, first-writer-wins on lookup, so repeated protocol fields (e.g.
/// repeated headers) keep their declared order for template resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamAttributes {
    entries: Vec<(String, String)>,
}

impl StreamAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from name/value pairs.
    pub fn from_pairs<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Protocol-specific route predicate.
pub trait RouteCondition: std::fmt::Debug + Send + Sync {
    /// True if the accepted stream's attributes satisfy this condition.
    fn matches(&self, attributes: &StreamAttributes) -> bool;
}

/// Glob match against one attribute field.
///
/// Patterns are compiled once when the route is built, never per stream.
#[derive(Debug)]
pub struct PatternCondition {
    field: String,
    pattern: glob::Pattern,
}

impl PatternCondition {
    /// Compile `pattern` for matches against attribute `field`.
    ///
    /// # Errors
    ///
    /// Propagates the glob compile error so a bad pattern surfaces at
    /// attach time, not per stream.
    pub fn new(field: impl Into<String>, pattern: &str) -> Result<Self, glob::PatternError> {
        Ok(Self {
            field: field.into(),
            pattern: glob::Pattern::new(pattern)?,
        })
    }
}

impl RouteCondition for PatternCondition {
    fn matches(&self, attributes: &StreamAttributes) -> bool {
        attributes
            .get(&self.field)
            .is_some_and(|value| self.pattern.matches(value))
    }
}

/// Authorization predicate over the Begin-carried token.
pub trait AuthorizationGuard: std::fmt::Debug + Send + Sync {
    fn authorized(&self, authorization: u64) -> bool;
}

/// Guard admitting every stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationGuard for AllowAll {
    fn authorized(&self, _authorization: u64) -> bool {
        true
    }
}

/// Guard requiring every bit of `mask` in the token.
#[derive(Debug, Clone, Copy)]
pub struct RequireBits(pub u64);

impl AuthorizationGuard for RequireBits {
    fn authorized(&self, authorization: u64) -> bool {
        authorization & self.0 == self.0
    }
}

/// One entry of a binding's ordered route table.
///
/// Immutable once attached; a configuration reload replaces the whole
/// binding, and sessions keep the `Arc<Route>` they resolved for their
/// entire lifetime.
#[derive(Debug)]
pub struct Route {
    id: u64,
    conditions: Vec<Box<dyn RouteCondition>>,
    guard: Box<dyn AuthorizationGuard>,
    with: Option<WithTemplate>,
}

impl Route {
    /// A catch-all route admitting everything, with no with-template.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            conditions: Vec::new(),
            guard: Box::new(AllowAll),
            with: None,
        }
    }

    /// Add a condition; all conditions must match.
    pub fn when(mut self, condition: impl RouteCondition + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    /// Replace the authorization guard.
    pub fn guarded(mut self, guard: impl AuthorizationGuard + 'static) -> Self {
        self.guard = Box::new(guard);
        self
    }

    /// Attach a with-template, resolved once per accepted stream.
    pub fn with_template(mut self, with: WithTemplate) -> Self {
        self.with = Some(with);
        self
    }

    /// Finish construction shared.
    pub fn build(self) -> Arc<Route> {
        Arc::new(self)
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn with(&self) -> Option<&WithTemplate> {
        self.with.as_ref()
    }

    /// True when every condition matches; no conditions matches everything.
    pub fn matches(&self, attributes: &StreamAttributes) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.matches(attributes))
    }

    pub fn authorized(&self, authorization: u64) -> bool {
        self.guard.authorized(authorization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: attribute lookup is first-writer-wins and order-preserving.
    #[test]
    fn test_attributes_lookup() {
        let mut attrs = StreamAttributes::new();
        attrs.insert("header", "one");
        attrs.insert("header", "two");
        attrs.insert("path", "/items/7");

        assert_eq!(attrs.get("header"), Some("one"));
        assert_eq!(attrs.get("path"), Some("/items/7"));
        assert_eq!(attrs.get("missing"), None);
        assert_eq!(attrs.iter().count(), 3);
    }

    /// Test: pattern conditions match globs against one field.
    #[test]
    fn test_pattern_condition() {
        let condition = PatternCondition::new("path", "/items/*").unwrap();
        let matching = StreamAttributes::from_pairs([("path", "/items/7")]);
        let other = StreamAttributes::from_pairs([("path", "/orders/7")]);

        assert!(condition.matches(&matching));
        assert!(!condition.matches(&other));
        // Absent field never matches.
        assert!(!condition.matches(&StreamAttributes::new()));
    }

    /// Test: a bad pattern is refused at build time.
    #[test]
    fn test_pattern_compile_error() {
        assert!(PatternCondition::new("path", "[unclosed").is_err());
    }

    /// Verifies: a route with no conditions is a catch-all.
    #[test]
    fn test_catch_all_route() {
        let route = Route::new(0);
        assert!(route.matches(&StreamAttributes::new()));
        assert!(route.matches(&StreamAttributes::from_pairs([("any", "thing")])));
        assert!(route.authorized(0));
    }

    /// Test: all conditions must match, and the guard gates separately.
    #[test]
    fn test_conditions_and_guard() {
        let route = Route::new(1)
            .when(PatternCondition::new("method", "GET").unwrap())
            .when(PatternCondition::new("path", "/items/*").unwrap())
            .guarded(RequireBits(0b101));

        let attrs = StreamAttributes::from_pairs([("method", "GET"), ("path", "/items/9")]);
        assert!(route.matches(&attrs));
        assert!(!route.matches(&StreamAttributes::from_pairs([("method", "GET")])));

        assert!(route.authorized(0b111));
        assert!(!route.authorized(0b001));
    }
}

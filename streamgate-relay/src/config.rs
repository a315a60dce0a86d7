//! Consumed configuration surface for bindings and routes.
//!
//! Implements: REQ-CFG-001 (Configuration Surface)
//!
//! The relay does not own a configuration file format; the host loads and
//! validates its declarative document and hands this module the slice the
//! router needs: binding id and kind, ordered routes with conditions, an
//! authorization mask, and optional with-templates. The compile step builds
//! the immutable [`Binding`] — glob patterns compiled, templates parsed —
//! so every configuration mistake surfaces before attach, never per stream.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use streamgate_core::frame::BindingId;

use crate::binding::{Binding, BindingKind};
use crate::route::{PatternCondition, RequireBits, Route};
use crate::translator::BeginTranslator;
use crate::with::{TemplateError, WithTemplate};

/// Declarative shape of one binding.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BindingConfig {
    pub id: BindingId,
    pub kind: BindingKind,
    /// Protocol-owned options, passed through uninterpreted.
    #[serde(default)]
    pub options: serde_json::Value,
    /// Ordered; the catch-all route, if any, goes last.
    pub routes: Vec<RouteConfig>,
}

/// Declarative shape of one route.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Conditions that must all match; empty means catch-all.
    #[serde(default)]
    pub when: Vec<ConditionConfig>,
    /// Authorization bits required in the Begin-carried token.
    #[serde(default)]
    pub authorized: Option<u64>,
    /// With-template fields, resolved once per accepted stream.
    #[serde(default)]
    pub with: Option<BTreeMap<String, String>>,
}

/// One glob condition over one attribute field.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConditionConfig {
    pub field: String,
    #[serde(rename = "match")]
    pub pattern: String,
}

/// Configuration problems surfaced at compile time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A condition's glob pattern did not compile.
    #[error("route {route}: bad pattern {pattern:?} for field {field:?}: {source}")]
    InvalidPattern {
        route: usize,
        field: String,
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A with-template field did not parse.
    #[error("route {route}: bad with-template: {source}")]
    InvalidTemplate {
        route: usize,
        #[source]
        source: TemplateError,
    },
}

impl BindingConfig {
    /// Compile into an attachable [`Binding`] using the protocol's
    /// translator.
    ///
    /// Route ids are the declared positions, which is all the relay needs:
    /// sessions hold the resolved `Arc<Route>` itself, never an id lookup.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`] encountered, in declaration order.
    pub fn compile(
        &self,
        translator: Arc<dyn BeginTranslator>,
    ) -> Result<Binding, ConfigError> {
        let mut routes = Vec::with_capacity(self.routes.len());
        for (index, route_config) in self.routes.iter().enumerate() {
            let mut route = Route::new(index as u64);

            for condition in &route_config.when {
                let compiled = PatternCondition::new(&condition.field, &condition.pattern)
                    .map_err(|source| ConfigError::InvalidPattern {
                        route: index,
                        field: condition.field.clone(),
                        pattern: condition.pattern.clone(),
                        source,
                    })?;
                route = route.when(compiled);
            }

            if let Some(mask) = route_config.authorized {
                route = route.guarded(RequireBits(mask));
            }

            if let Some(with) = &route_config.with {
                let template = WithTemplate::parse(
                    with.iter().map(|(name, value)| (name.clone(), value)),
                )
                .map_err(|source| ConfigError::InvalidTemplate {
                    route: index,
                    source,
                })?;
                route = route.with_template(template);
            }

            routes.push(route.build());
        }

        Ok(Binding::new(
            self.id,
            self.kind,
            self.options.clone(),
            routes,
            translator,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::StreamAttributes;
    use crate::translator::OpaqueTranslator;

    fn compile(json: &str) -> Result<Binding, ConfigError> {
        let config: BindingConfig = serde_json::from_str(json).unwrap();
        config.compile(Arc::new(OpaqueTranslator::new()))
    }

    /// Test: a declarative binding compiles into ordered, matchable routes.
    #[test]
    fn test_compile_binding() {
        let binding = compile(
            r#"{
                "id": 9,
                "kind": "proxy",
                "routes": [
                    {
                        "when": [{"field": "path", "match": "/items/*"}],
                        "authorized": 1,
                        "with": {"topic": "items-${params.id}"}
                    },
                    {}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(binding.id(), 9);
        assert_eq!(binding.kind(), BindingKind::Proxy);
        assert_eq!(binding.routes().len(), 2);

        let attrs = StreamAttributes::from_pairs([("path", "/items/3"), ("id", "3")]);
        assert_eq!(binding.resolve(1, &attrs).unwrap().id(), 0);
        // Unauthorized falls through to the catch-all.
        assert_eq!(binding.resolve(0, &attrs).unwrap().id(), 1);
    }

    /// Test: bad patterns are refused at compile time with their location.
    #[test]
    fn test_bad_pattern_located() {
        let err = compile(
            r#"{
                "id": 1,
                "kind": "server",
                "routes": [{}, {"when": [{"field": "path", "match": "[oops"}]}]
            }"#,
        )
        .unwrap_err();

        match err {
            ConfigError::InvalidPattern { route, field, .. } => {
                assert_eq!(route, 1);
                assert_eq!(field, "path");
            }
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    /// Test: bad templates are refused at compile time.
    #[test]
    fn test_bad_template_located() {
        let err = compile(
            r#"{
                "id": 1,
                "kind": "server",
                "routes": [{"with": {"topic": "${params.id"}}]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate { route: 0, .. }));
    }
}

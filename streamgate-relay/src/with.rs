//! With-parameters: route-scoped templates resolved once per stream.
//!
//! Implements: REQ-RTE-002 (With Resolution)
//!
//! A matched route may carry protocol-specific parameters ("with") used to
//! construct the far-side Begin — a target topic, a file path, a reply-to
//! address. Fields are template strings over two placeholder forms:
//!
//! - `${params.name}` — substituted from the accepted stream's attributes;
//! - `${correlationId}` — a token generated once per resolution, shared by
//!   every field that references it.
//!
//! Templates are parsed when the binding is built; resolution is a pure
//! string expansion with no side effects, evaluated once per accepted
//! stream.

use thiserror::Error;
use uuid::Uuid;

use crate::route::StreamAttributes;

/// Template problems, split by when they surface.
///
/// Parse-time variants are configuration errors and block attach;
/// [`TemplateError::MissingParam`] surfaces per stream and is handled as
/// route-not-found.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `${` with no closing `}`.
    #[error("unterminated placeholder in template {template:?}")]
    Unterminated { template: String },

    /// A placeholder outside `${params.*}` / `${correlationId}`.
    #[error("unknown placeholder ${{{placeholder}}}")]
    UnknownPlaceholder { placeholder: String },

    /// `${params.name}` referenced an attribute the stream did not carry.
    #[error("no attribute for placeholder ${{params.{name}}}")]
    MissingParam { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CorrelationId,
}

/// One parsed template string.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Template {
    segments: Vec<Segment>,
}

impl Template {
    fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            if !rest[..start].is_empty() {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| TemplateError::Unterminated {
                template: template.to_string(),
            })?;
            let placeholder = &after[..end];
            let segment = if let Some(name) = placeholder.strip_prefix("params.") {
                Segment::Param(name.to_string())
            } else if placeholder == "correlationId" {
                Segment::CorrelationId
            } else {
                return Err(TemplateError::UnknownPlaceholder {
                    placeholder: placeholder.to_string(),
                });
            };
            segments.push(segment);
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    fn resolve(
        &self,
        attributes: &StreamAttributes,
        correlation_id: &str,
    ) -> Result<String, TemplateError> {
        let mut resolved = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => resolved.push_str(text),
                Segment::Param(name) => {
                    let value =
                        attributes
                            .get(name)
                            .ok_or_else(|| TemplateError::MissingParam {
                                name: name.clone(),
                            })?;
                    resolved.push_str(value);
                }
                Segment::CorrelationId => resolved.push_str(correlation_id),
            }
        }
        Ok(resolved)
    }
}

/// The with-template of one route: named fields, parsed once at attach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithTemplate {
    fields: Vec<(String, Template)>,
}

impl WithTemplate {
    /// Parse named template fields.
    ///
    /// # Errors
    ///
    /// Any parse-time [`TemplateError`], so misconfiguration surfaces
    /// before attach rather than per stream.
    pub fn parse<N, T>(fields: impl IntoIterator<Item = (N, T)>) -> Result<Self, TemplateError>
    where
        N: Into<String>,
        T: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for (name, template) in fields {
            parsed.push((name.into(), Template::parse(template.as_ref())?));
        }
        Ok(Self { fields: parsed })
    }

    /// Expand every field against `attributes`.
    ///
    /// Generates one fresh correlation token per call; every
    /// `${correlationId}` in the template set expands to the same token.
    ///
    /// # Errors
    ///
    /// [`TemplateError::MissingParam`] when the stream lacks a referenced
    /// attribute; the caller rejects the stream rather than forwarding a
    /// half-expanded value.
    pub fn resolve(&self, attributes: &StreamAttributes) -> Result<WithParams, TemplateError> {
        let correlation_id = Uuid::new_v4().simple().to_string();
        let mut fields = Vec::with_capacity(self.fields.len());
        for (name, template) in &self.fields {
            fields.push((name.clone(), template.resolve(attributes, &correlation_id)?));
        }
        Ok(WithParams { fields })
    }
}

/// Fully resolved with-parameters for one accepted stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithParams {
    fields: Vec<(String, String)>,
}

impl WithParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: literal, param, and correlation placeholders expand in place.
    #[test]
    fn test_substitution() {
        let template = WithTemplate::parse([
            ("topic", "events-${params.id}"),
            ("reply_to", "replies-${correlationId}"),
        ])
        .unwrap();

        let attrs = StreamAttributes::from_pairs([("id", "42")]);
        let params = template.resolve(&attrs).unwrap();

        assert_eq!(params.get("topic"), Some("events-42"));
        let reply_to = params.get("reply_to").unwrap();
        assert!(reply_to.starts_with("replies-"));
        assert_eq!(reply_to.len(), "replies-".len() + 32);
    }

    /// Test: every ${correlationId} in one resolution shares one token,
    /// and separate resolutions get fresh tokens.
    #[test]
    fn test_correlation_token_scope() {
        let template = WithTemplate::parse([
            ("key", "${correlationId}"),
            ("echo", "${correlationId}"),
        ])
        .unwrap();

        let attrs = StreamAttributes::new();
        let first = template.resolve(&attrs).unwrap();
        let second = template.resolve(&attrs).unwrap();

        assert_eq!(first.get("key"), first.get("echo"));
        assert_ne!(first.get("key"), second.get("key"));
    }

    /// Test: parse-time errors surface before attach.
    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            WithTemplate::parse([("topic", "events-${params.id")]),
            Err(TemplateError::Unterminated { .. })
        ));
        assert!(matches!(
            WithTemplate::parse([("topic", "${headers.x}")]),
            Err(TemplateError::UnknownPlaceholder { .. })
        ));
    }

    /// Verifies: a missing attribute is an error, not an empty expansion.
    #[test]
    fn test_missing_param() {
        let template = WithTemplate::parse([("path", "/files/${params.name}")]).unwrap();
        assert_eq!(
            template.resolve(&StreamAttributes::new()),
            Err(TemplateError::MissingParam {
                name: "name".to_string()
            })
        );
    }
}

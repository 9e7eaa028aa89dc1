//! Template interpolation for request paths
//!
//! Handles `{{ variable }}` interpolation in stream path templates.
//! Supports nested access like `{{ config.organization_id }}` and
//! `{{ slice.event_id }}`.

use crate::error::{Error, Result};
use crate::types::scalar_to_string;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use url::form_urlencoded;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}").unwrap()
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Connector configuration values
    pub config: Value,
    /// Current stream slice
    pub slice: Value,
    /// Current stream state
    pub state: Value,
    /// Current next-page token
    pub page: Value,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with config values
    pub fn with_config(config: Value) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Set config values
    pub fn set_config(&mut self, config: Value) -> &mut Self {
        self.config = config;
        self
    }

    /// Set slice values
    pub fn set_slice(&mut self, slice: Value) -> &mut Self {
        self.slice = slice;
        self
    }

    /// Set state values
    pub fn set_state(&mut self, state: Value) -> &mut Self {
        self.state = state;
        self
    }

    /// Set page token values
    pub fn set_page(&mut self, page: Value) -> &mut Self {
        self.page = page;
        self
    }

    /// Get a value by path (e.g., "config.organization_id")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();

        let root = match parts[0] {
            "config" => &self.config,
            "slice" => &self.slice,
            "state" => &self.state,
            "page" => &self.page,
            // Bare names resolve against config
            _ => return get_nested_value(&self.config, &parts),
        };

        get_nested_value(root, &parts[1..])
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for part in path {
        match current {
            Value::Object(map) => {
                current = map.get(*part)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Render a template string with the given context
///
/// Every variable must resolve to a scalar; anything else is reported as
/// undefined, listing all offending variables at once. Values are inserted
/// verbatim.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    interpolate(template, ctx, |_, value| Ok(value))
}

/// Render a URL path template
///
/// Like [`render`], but each value becomes exactly one percent-encoded path
/// segment. Empty values and the dot segments `.` and `..` are rejected.
pub fn render_path(template: &str, ctx: &TemplateContext) -> Result<String> {
    interpolate(template, ctx, |variable, value| {
        if value.is_empty() || value == "." || value == ".." {
            return Err(Error::invalid_segment(variable, value));
        }
        Ok(encode_segment(&value))
    })
}

fn interpolate<F>(template: &str, ctx: &TemplateContext, mut substitute: F) -> Result<String>
where
    F: FnMut(&str, String) -> Result<String>,
{
    let mut result = String::with_capacity(template.len());
    let mut last = 0;
    let mut errors = Vec::new();

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let (Some(full_match), Some(var_path)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        result.push_str(&template[last..full_match.start()]);
        last = full_match.end();

        match ctx.get(var_path.as_str()).and_then(scalar_to_string) {
            Some(value) => result.push_str(&substitute(var_path.as_str(), value)?),
            None => errors.push(var_path.as_str().to_string()),
        }
    }
    result.push_str(&template[last..]);

    if errors.is_empty() {
        Ok(result)
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Percent-encode everything except unreserved characters
fn encode_segment(value: &str) -> String {
    // form encoding writes spaces as '+'; a literal '+' is already %2B
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_substitution() {
        let ctx = TemplateContext::with_config(json!({
            "organization_id": "acme"
        }));

        let result = render("organizations/{{ config.organization_id }}", &ctx).unwrap();
        assert_eq!(result, "organizations/acme");
    }

    #[test]
    fn test_slice_context() {
        let mut ctx = TemplateContext::with_config(json!({"organization_id": 12}));
        ctx.set_slice(json!({"event_id": 7}));

        let result = render(
            "organizations/{{ config.organization_id }}/events/{{ slice.event_id }}/invites",
            &ctx,
        )
        .unwrap();
        assert_eq!(result, "organizations/12/events/7/invites");
    }

    #[test]
    fn test_bare_name_resolves_against_config() {
        let ctx = TemplateContext::with_config(json!({"organization_id": "acme"}));
        assert_eq!(render("{{ organization_id }}", &ctx).unwrap(), "acme");
    }

    #[test]
    fn test_undefined_variable() {
        let ctx = TemplateContext::new();
        let result = render("{{ config.missing }}/{{ slice.event_id }}", &ctx);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("config.missing"));
        assert!(message.contains("slice.event_id"));
    }

    #[test]
    fn test_non_scalar_is_undefined() {
        let mut ctx = TemplateContext::new();
        ctx.set_slice(json!({"event_id": [{"id": 1}]}));
        assert!(render("{{ slice.event_id }}", &ctx).is_err());
    }

    #[test]
    fn test_no_templates() {
        let ctx = TemplateContext::new();
        let result = render("plain/path", &ctx).unwrap();
        assert_eq!(result, "plain/path");
    }

    #[test]
    fn test_render_path_encodes_each_value_as_one_segment() {
        let mut ctx = TemplateContext::with_config(json!({"organization_id": "acme co"}));
        ctx.set_slice(json!({"event_id": "a?x=1#/b%"}));

        let result = render_path(
            "organizations/{{ config.organization_id }}/events/{{ slice.event_id }}/invites",
            &ctx,
        )
        .unwrap();
        assert_eq!(
            result,
            "organizations/acme%20co/events/a%3Fx%3D1%23%2Fb%25/invites"
        );
    }

    #[test]
    fn test_render_path_keeps_plain_ids() {
        let mut ctx = TemplateContext::with_config(json!({"organization_id": 12}));
        ctx.set_slice(json!({"event_id": "e-7_x.y"}));
        assert_eq!(
            render_path("{{ config.organization_id }}/{{ slice.event_id }}", &ctx).unwrap(),
            "12/e-7_x.y"
        );
    }

    #[test]
    fn test_render_path_rejects_dot_and_empty_segments() {
        for id in ["..", ".", ""] {
            let mut ctx = TemplateContext::new();
            ctx.set_slice(json!({"event_id": id}));
            let err = render_path("events/{{ slice.event_id }}/invites", &ctx).unwrap_err();
            assert!(
                matches!(err, Error::InvalidPathSegment { ref variable, .. } if variable == "slice.event_id"),
                "{id:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_render_leaves_values_verbatim() {
        let ctx = TemplateContext::with_config(json!({"key": "a/b?c"}));
        assert_eq!(render("{{ config.key }}", &ctx).unwrap(), "a/b?c");
    }

    #[test]
    fn test_whitespace_in_template() {
        let ctx = TemplateContext::with_config(json!({"key": "value"}));

        assert_eq!(render("{{config.key}}", &ctx).unwrap(), "value");
        assert_eq!(render("{{ config.key }}", &ctx).unwrap(), "value");
        assert_eq!(render("{{  config.key  }}", &ctx).unwrap(), "value");
    }
}

//! Template rendering seam
//!
//! The installer only depends on [`TemplateRenderer`]. The bundled
//! [`PlaceholderRenderer`] substitutes `{{ name }}` placeholders and fails on
//! any variable the caller did not supply.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{ConfstrapError, Result};

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.-]*)\s*\}\}").ok());

/// Renders template text with a variable mapping
pub trait TemplateRenderer {
    /// Render `template`; an error carries the reason, the caller adds the path
    fn render(&self, template: &str, variables: &BTreeMap<String, String>) -> Result<String>;
}

/// `{{ name }}` substitution with strict undefined-variable handling
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, template: &str, variables: &BTreeMap<String, String>) -> Result<String> {
        let pattern = PLACEHOLDER.as_ref().ok_or_else(|| ConfstrapError::TemplateRenderFailed {
            path: String::new(),
            reason: "placeholder pattern failed to compile".to_string(),
        })?;

        let mut missing: Vec<String> = Vec::new();
        let rendered = pattern.replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            match variables.get(name) {
                Some(value) => value.clone(),
                None => {
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });

        if missing.is_empty() {
            Ok(rendered.into_owned())
        } else {
            Err(ConfstrapError::TemplateRenderFailed {
                path: String::new(),
                reason: format!("undefined variables: {}", missing.join(", ")),
            })
        }
    }
}

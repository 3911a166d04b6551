//! The template-evaluator seam and its default Tera-backed implementation.
//!
//! The composition core treats the expression-template evaluator as an
//! opaque collaborator: text plus a flat variable map in, text out. The
//! [`TemplateEngine`] trait is that boundary; [`TeraEngine`] is the default
//! implementation shipped with the crate.

use std::collections::HashMap;

use tera::{Context, Tera};
use thiserror::Error;

use crate::error::BoxedError;

/// Evaluates a template string against a variable mapping.
///
/// Implementations must be synchronous and side-effect free with respect to
/// the composition core; a failure is fatal for the render cycle that
/// caused it.
pub trait TemplateEngine {
    /// Evaluates `template` with `variables` bound, returning the produced
    /// text.
    fn evaluate(
        &self,
        template: &str,
        variables: &HashMap<String, String>,
    ) -> Result<String, BoxedError>;
}

/// Failure surfaced by [`TeraEngine`], with Tera's internal one-off
/// template naming stripped from the message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EvaluationError {
    message: String,
    #[source]
    source: tera::Error,
}

impl EvaluationError {
    fn from_tera(error: tera::Error) -> Self {
        Self { message: clean_tera_message(&error), source: error }
    }
}

/// Default engine: a fresh `Tera` instance per evaluation.
///
/// A fresh instance is cheap (empty maps) and guarantees no template state
/// leaks between nodes. No filesystem includes or extends are reachable
/// through `render_str`, so evaluation is sandboxed to the given text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TeraEngine;

impl TeraEngine {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateEngine for TeraEngine {
    fn evaluate(
        &self,
        template: &str,
        variables: &HashMap<String, String>,
    ) -> Result<String, BoxedError> {
        let mut context = Context::new();
        for (name, value) in variables {
            context.insert(name, value);
        }

        tracing::debug!(variables = variables.len(), "evaluating template");
        let mut tera = Tera::default();
        tera.render_str(template, &context)
            .map_err(|e| Box::new(EvaluationError::from_tera(e)) as BoxedError)
    }
}

/// Collects the Tera error chain into one message, dropping the
/// `__tera_one_off` internals that mean nothing to callers.
fn clean_tera_message(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = Vec::new();
    let mut current: Option<&dyn Error> = Some(error);
    while let Some(err) = current {
        let cleaned = err
            .to_string()
            .replace("Failed to render '__tera_one_off'", "template rendering failed")
            .replace("Failed to parse '__tera_one_off'", "template syntax error")
            .replace("'__tera_one_off'", "template")
            .trim()
            .to_string();
        if !cleaned.is_empty() && !messages.contains(&cleaned) {
            messages.push(cleaned);
        }
        current = err.source();
    }

    if messages.is_empty() {
        "template evaluation failed".to_string()
    } else {
        messages.join(": ")
    }
}

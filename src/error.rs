//! Error handling for docweave.
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **Preserved causes** so collaborator failures (template engine,
//!    interceptors, file reads) surface with their original message intact
//!
//! Nothing in the library retries automatically. A render call either fully
//! completes and returns text or fully fails with no usable partial result.
//! Handler warnings are deliberately *not* part of this taxonomy: they are
//! soft diagnostics collected per processing call (see
//! [`crate::preprocess::PreProcessor::warnings`]) and never alter control
//! flow.

use std::path::PathBuf;

use thiserror::Error;

use crate::events::ExecutionPoint;

/// Boxed error type used at the collaborator seams (template engine,
/// interceptors) where the concrete failure type belongs to the caller.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DocweaveError>;

/// The main error type for docweave operations.
///
/// Each variant represents a specific failure mode. All failures are
/// detected synchronously at the boundary of the operation that caused
/// them; no variant is ever produced by a background task.
#[derive(Error, Debug)]
pub enum DocweaveError {
    /// A required argument was empty or otherwise unusable.
    ///
    /// Raised immediately at the call site with no partial mutation, e.g.
    /// for an empty variable name, an empty placeholder name, or an empty
    /// preprocessor target token.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the rejected argument.
        reason: String,
    },

    /// A scope was asked to adopt itself as its own parent.
    ///
    /// Only the direct self-reference is detected; longer cycles are not,
    /// and avoiding them is the tree builder's responsibility. The scope is
    /// left unchanged.
    #[error("a scope cannot be its own parent")]
    ScopeCycle,

    /// A child template was assigned to a node that cannot hold children.
    ///
    /// Only layouts accept named children; fragments are terminal.
    #[error("template '{name}' is not a layout and cannot hold children")]
    NotAComposite {
        /// Descriptive name of the offending template.
        name: String,
    },

    /// The external template engine rejected the text/variable combination.
    ///
    /// This is fatal for the render cycle that produced it: no partial
    /// output is returned and nothing is retried. A parent layout does not
    /// catch a child's evaluation failure.
    #[error("template evaluation failed for '{template}'")]
    TemplateEvaluation {
        /// Descriptive name of the template that failed to evaluate.
        template: String,
        /// The engine's original failure.
        #[source]
        source: BoxedError,
    },

    /// An interceptor failed while observing a pipeline phase.
    ///
    /// Dispatch is fail-fast: interceptors registered after the failing one
    /// are not invoked, and the failure propagates to the render or apply
    /// call that triggered the event.
    #[error("interceptor failed at {point} for template '{template}'")]
    Interceptor {
        /// The execution point at which the interceptor ran.
        point: ExecutionPoint,
        /// Descriptive name of the template whose event was being observed.
        template: String,
        /// The interceptor's original failure.
        #[source]
        source: BoxedError,
    },

    /// Reading template source from a file failed.
    ///
    /// Treated as an environment defect, not retried.
    #[error("failed to read template from {path}")]
    TemplateRead {
        /// Path that could not be read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl DocweaveError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }
}

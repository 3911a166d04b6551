//! Execution points, events, and the interceptor pipeline.
//!
//! The render pipeline fires an [`Event`] at fixed points before and after
//! each phase (preprocessing, rendering, Markdown conversion). Interceptors
//! subscribe per point through an [`EventDispatcher`] and are invoked
//! synchronously, in registration order, on the calling thread.
//!
//! There is no isolation between interceptors: the first failure aborts the
//! dispatch and propagates to the render or apply call that triggered it.
//! Interceptors already invoked have run; no further guarantee is made.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::BoxedError;

/// The fixed moments in the render pipeline at which interceptors may
/// observe content, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExecutionPoint {
    /// Before a handler rewrites a node's preprocessed text. Content is the
    /// text prior to the rewrite.
    BeforePreprocessing,
    /// After the rewrite. Content is the new preprocessed text.
    AfterPreprocessing,
    /// Before the template engine evaluates the node. Content is the
    /// current preprocessed text.
    BeforeRendering,
    /// After evaluation. Content is the evaluated text.
    AfterRendering,
    /// Before Markdown conversion (skipped when the node opts out).
    BeforeMarkdown,
    /// After Markdown conversion. Content is the final HTML.
    AfterMarkdown,
}

impl fmt::Display for ExecutionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BeforePreprocessing => "before-preprocessing",
            Self::AfterPreprocessing => "after-preprocessing",
            Self::BeforeRendering => "before-rendering",
            Self::AfterRendering => "after-rendering",
            Self::BeforeMarkdown => "before-markdown",
            Self::AfterMarkdown => "after-markdown",
        };
        f.write_str(name)
    }
}

/// An immutable snapshot of one pipeline moment.
///
/// The originating template is identified by its descriptive name rather
/// than a handle into the tree, which keeps events value-like while the
/// tree is under mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    point: ExecutionPoint,
    template: String,
    content: String,
}

impl Event {
    pub(crate) fn new(
        point: ExecutionPoint,
        template: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self { point, template: template.into(), content: content.into() }
    }

    /// The execution point at which this event fired.
    pub fn point(&self) -> ExecutionPoint {
        self.point
    }

    /// Name of the template the event originated from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The content at that point in the pipeline.
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Observes pipeline events at the execution points it was registered for.
pub trait Interceptor {
    /// Called once per matching event, synchronously.
    ///
    /// Returning an error aborts the dispatch and the surrounding render.
    fn intercept(&mut self, event: &Event) -> Result<(), BoxedError>;
}

/// The seam between tree nodes and whatever consumes their events.
///
/// Nodes hold registered consumers and trigger each one per event;
/// [`EventDispatcher`] is the standard consumer, routing by point.
pub trait EventConsumer {
    /// Delivers one event to this consumer.
    fn trigger(&mut self, event: &Event) -> Result<(), BoxedError>;
}

/// Publish-subscribe registry keyed by execution point.
///
/// Interceptors are kept in insertion order per point; one interceptor may
/// be registered under several points independently (and is then invoked
/// once per matching point).
#[derive(Default)]
pub struct EventDispatcher {
    interceptors: HashMap<ExecutionPoint, Vec<Rc<RefCell<dyn Interceptor>>>>,
}

impl EventDispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `interceptor` to the ordered list for `point`.
    pub fn register(&mut self, interceptor: Rc<RefCell<dyn Interceptor>>, point: ExecutionPoint) {
        self.interceptors.entry(point).or_default().push(interceptor);
    }

    /// Invokes every interceptor registered for the event's point, in
    /// registration order. Fail-fast: the first error aborts the dispatch.
    pub fn dispatch(&self, event: &Event) -> Result<(), BoxedError> {
        let Some(interceptors) = self.interceptors.get(&event.point()) else {
            return Ok(());
        };
        tracing::trace!(point = %event.point(), template = event.template(), "dispatching event");
        for interceptor in interceptors {
            interceptor.borrow_mut().intercept(event)?;
        }
        Ok(())
    }
}

impl EventConsumer for EventDispatcher {
    fn trigger(&mut self, event: &Event) -> Result<(), BoxedError> {
        self.dispatch(event)
    }
}

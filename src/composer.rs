//! The orchestrating facade driving full render cycles.
//!
//! A [`Composer`] holds the globally registered instruction handlers, the
//! event dispatcher, and the two external collaborators (template engine
//! and Markdown converter). One [`Composer::render`] call runs the whole
//! pipeline over a tree: attach the dispatcher to the root (cascading to
//! all descendants), apply every handler to the whole tree, render the
//! root, detach the dispatcher. Detachment is guaranteed on every exit
//! path, including failure, so a failed render cannot leave dangling
//! listeners on the tree.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::{TemplateEngine, TeraEngine};
use crate::error::Result;
use crate::events::{EventConsumer, EventDispatcher, ExecutionPoint, Interceptor};
use crate::markdown::{CmarkConverter, MarkdownConverter};
use crate::preprocess::PreProcessor;
use crate::template::Template;

/// Drives apply → render cycles over composite render trees.
///
/// Handlers and interceptors are expected to be registered before any
/// render cycle begins; there is no registration-during-render guarantee.
/// At most one render cycle may be in flight per tree at a time.
pub struct Composer {
    preprocessors: Vec<Rc<RefCell<dyn PreProcessor>>>,
    dispatcher: Rc<RefCell<EventDispatcher>>,
    engine: Box<dyn TemplateEngine>,
    converter: Box<dyn MarkdownConverter>,
}

impl Composer {
    /// Creates a composer with the default collaborators: [`TeraEngine`]
    /// and [`CmarkConverter`].
    pub fn new() -> Self {
        Self::with_collaborators(Box::new(TeraEngine::new()), Box::new(CmarkConverter::new()))
    }

    /// Creates a composer with custom collaborators.
    pub fn with_collaborators(
        engine: Box<dyn TemplateEngine>,
        converter: Box<dyn MarkdownConverter>,
    ) -> Self {
        Self {
            preprocessors: Vec::new(),
            dispatcher: Rc::new(RefCell::new(EventDispatcher::new())),
            engine,
            converter,
        }
    }

    /// Registers a global instruction handler.
    ///
    /// Handlers are shared handles so the caller can inspect accumulator
    /// state and warnings after rendering. During a render cycle each
    /// handler is applied to the whole tree in registration order.
    pub fn register_preprocessor(&mut self, processor: Rc<RefCell<dyn PreProcessor>>) {
        self.preprocessors.push(processor);
    }

    /// Registers an interceptor for one execution point. Call repeatedly
    /// to watch several points with the same interceptor.
    pub fn register_interceptor(
        &mut self,
        interceptor: Rc<RefCell<dyn Interceptor>>,
        point: ExecutionPoint,
    ) {
        self.dispatcher.borrow_mut().register(interceptor, point);
    }

    /// Runs one full render cycle over `template` and returns the text.
    ///
    /// # Errors
    ///
    /// Whatever [`Template::apply`] and [`Template::render`] surface. The
    /// dispatcher is detached from the tree in all cases.
    pub fn render(&self, template: &Template) -> Result<String> {
        tracing::debug!(template = %template.name(), "starting render cycle");
        let _subscription = Subscription::attach(template, self.dispatcher.clone());

        for processor in &self.preprocessors {
            template.apply(&mut *processor.borrow_mut())?;
        }
        template.render(self.engine.as_ref(), self.converter.as_ref())
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped dispatcher attachment: registered on construction, unregistered
/// on drop, so every exit path of the render that created it detaches.
struct Subscription {
    root: Template,
    consumer: Rc<RefCell<dyn EventConsumer>>,
}

impl Subscription {
    fn attach(root: &Template, consumer: Rc<RefCell<dyn EventConsumer>>) -> Self {
        root.register(consumer.clone());
        Self { root: root.clone(), consumer }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.root.unregister(&self.consumer);
    }
}

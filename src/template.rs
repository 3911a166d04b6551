//! The composite render tree: fragments (leaves) and layouts (composites).
//!
//! A [`Template`] is a cheap, cloneable handle to one tree node. Every node
//! owns its original source text, a mutable preprocessed text buffer
//! (starting equal to the source), a variable [`Scope`], render options,
//! and the event consumers registered on it. A layout additionally maps
//! placeholder names to child handles; rendering a layout binds each
//! child's rendered output as a scope variable named after its placeholder,
//! which is what makes `{{ placeholder }}` in the layout's own text expand
//! to the child's final output.
//!
//! Nodes move through exactly two preprocessing states: *unprocessed*
//! (preprocessed text equals the source) and *preprocessed*. Rendering
//! never changes that state; it only reads the current preprocessed text.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::engine::TemplateEngine;
use crate::error::{DocweaveError, Result};
use crate::events::{Event, EventConsumer, ExecutionPoint};
use crate::markdown::MarkdownConverter;
use crate::preprocess::{self, PreProcessor};
use crate::scope::Scope;

/// Per-node render options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Skip the Markdown-conversion phase; the render result is the
    /// template evaluator's output.
    pub skip_markdown: bool,
}

impl RenderOptions {
    /// Options with Markdown conversion disabled.
    pub fn without_markdown() -> Self {
        Self { skip_markdown: true }
    }
}

/// A handle to one node of the composite render tree.
///
/// Cloning shares the node. Equality is by value of (resolved scope,
/// source text, name), not by reference; names are descriptive only and
/// uniqueness is not enforced.
#[derive(Clone)]
pub struct Template {
    node: Rc<RefCell<TemplateNode>>,
}

struct TemplateNode {
    name: String,
    source: String,
    preprocessed: String,
    scope: Scope,
    options: RenderOptions,
    consumers: Vec<Rc<RefCell<dyn EventConsumer>>>,
    kind: NodeKind,
}

enum NodeKind {
    Leaf,
    Composite { children: HashMap<String, Template> },
}

impl Template {
    /// Creates a leaf unit (fragment) from a string.
    ///
    /// # Errors
    ///
    /// [`DocweaveError::InvalidArgument`] if `name` is empty.
    pub fn fragment(
        name: impl Into<String>,
        source: impl Into<String>,
        options: RenderOptions,
    ) -> Result<Self> {
        Self::with_kind(name.into(), source.into(), options, NodeKind::Leaf)
    }

    /// Creates a composite unit (layout) from a string.
    ///
    /// # Errors
    ///
    /// [`DocweaveError::InvalidArgument`] if `name` is empty.
    pub fn layout(
        name: impl Into<String>,
        source: impl Into<String>,
        options: RenderOptions,
    ) -> Result<Self> {
        Self::with_kind(
            name.into(),
            source.into(),
            options,
            NodeKind::Composite { children: HashMap::new() },
        )
    }

    /// Creates a fragment from a UTF-8 file, named after the file name.
    ///
    /// # Errors
    ///
    /// [`DocweaveError::TemplateRead`] if the file cannot be read.
    pub fn fragment_from_file(path: impl AsRef<Path>, options: RenderOptions) -> Result<Self> {
        let (name, source) = read_template_file(path.as_ref())?;
        Self::fragment(name, source, options)
    }

    /// Creates a layout from a UTF-8 file, named after the file name.
    ///
    /// # Errors
    ///
    /// [`DocweaveError::TemplateRead`] if the file cannot be read.
    pub fn layout_from_file(path: impl AsRef<Path>, options: RenderOptions) -> Result<Self> {
        let (name, source) = read_template_file(path.as_ref())?;
        Self::layout(name, source, options)
    }

    fn with_kind(
        name: String,
        source: String,
        options: RenderOptions,
        kind: NodeKind,
    ) -> Result<Self> {
        if name.is_empty() {
            return Err(DocweaveError::invalid_argument("template name must not be empty"));
        }
        Ok(Self {
            node: Rc::new(RefCell::new(TemplateNode {
                name,
                preprocessed: source.clone(),
                source,
                scope: Scope::new(),
                options,
                consumers: Vec::new(),
                kind,
            })),
        })
    }

    /// Descriptive name of this template.
    pub fn name(&self) -> String {
        self.node.borrow().name.clone()
    }

    /// The immutable original source text.
    pub fn source(&self) -> String {
        self.node.borrow().source.clone()
    }

    /// The current preprocessed text (equal to the source until a handler
    /// is applied).
    pub fn preprocessed_text(&self) -> String {
        self.node.borrow().preprocessed.clone()
    }

    /// Whether any handler has rewritten this node's text.
    pub fn is_preprocessed(&self) -> bool {
        let node = self.node.borrow();
        node.preprocessed != node.source
    }

    /// Handle to this node's variable scope.
    pub fn scope(&self) -> Scope {
        self.node.borrow().scope.clone()
    }

    /// This node's render options.
    pub fn options(&self) -> RenderOptions {
        self.node.borrow().options
    }

    /// Whether this node can hold children.
    pub fn is_layout(&self) -> bool {
        matches!(self.node.borrow().kind, NodeKind::Composite { .. })
    }

    /// Assigns a scalar variable on this node's scope.
    ///
    /// # Errors
    ///
    /// [`DocweaveError::InvalidArgument`] if `name` is empty.
    pub fn assign(&self, name: &str, value: impl Into<String>) -> Result<()> {
        self.scope().assign(name, value)
    }

    /// Assigns a named child unit to this layout.
    ///
    /// Links the child scope's parent to this node's scope, exactly once,
    /// at assignment time. Re-assigning the same placeholder replaces the
    /// stored child handle but does not unlink the previous child's parent
    /// pointer; the old child keeps resolving through this layout's scope.
    ///
    /// # Errors
    ///
    /// - [`DocweaveError::InvalidArgument`] if `placeholder` is empty
    /// - [`DocweaveError::NotAComposite`] if this node is a fragment
    /// - [`DocweaveError::ScopeCycle`] if `child` is this very node
    pub fn set_child(&self, placeholder: &str, child: &Template) -> Result<()> {
        if placeholder.is_empty() {
            return Err(DocweaveError::invalid_argument("placeholder name must not be empty"));
        }
        if !self.is_layout() {
            return Err(DocweaveError::NotAComposite { name: self.name() });
        }

        // Linking a node to itself trips the scope's self-parent check.
        child.scope().set_parent(&self.scope())?;

        let mut node = self.node.borrow_mut();
        if let NodeKind::Composite { children } = &mut node.kind {
            children.insert(placeholder.to_string(), child.clone());
        }
        Ok(())
    }

    /// Applies an instruction handler to this node's text and, for a
    /// layout, to every child after it (parent first; children in map
    /// iteration order).
    ///
    /// Fires `BeforePreprocessing` with the old text and
    /// `AfterPreprocessing` with the new text.
    ///
    /// # Errors
    ///
    /// [`DocweaveError::Interceptor`] if a registered interceptor fails.
    pub fn apply(&self, processor: &mut dyn PreProcessor) -> Result<()> {
        let current = self.preprocessed_text();
        self.trigger(ExecutionPoint::BeforePreprocessing, &current)?;

        let rewritten = preprocess::apply(&current, processor);
        tracing::debug!(
            template = %self.name(),
            target_token = processor.target(),
            "applied instruction handler"
        );
        self.node.borrow_mut().preprocessed = rewritten.clone();
        self.trigger(ExecutionPoint::AfterPreprocessing, &rewritten)?;

        for (_, child) in self.children() {
            child.apply(processor)?;
        }
        Ok(())
    }

    /// Renders this node to its final text.
    ///
    /// A layout first renders every child (in no particular order; children
    /// must not depend on sibling rendering order) and binds each child's
    /// output as a scope variable keyed by its placeholder name. Then, for
    /// both kinds: the preprocessed text is evaluated against the resolved
    /// scope, and unless the node skips Markdown, the evaluated text is
    /// converted to HTML. Events bracket each phase.
    ///
    /// Never returns an absent value; worst case, the empty string.
    ///
    /// # Errors
    ///
    /// - [`DocweaveError::TemplateEvaluation`] if the engine rejects the
    ///   text/scope combination; fatal, not retried, no partial output. A
    ///   child's failure propagates through its parent uncaught.
    /// - [`DocweaveError::Interceptor`] if a registered interceptor fails.
    pub fn render(
        &self,
        engine: &dyn TemplateEngine,
        converter: &dyn MarkdownConverter,
    ) -> Result<String> {
        for (placeholder, child) in self.children() {
            let rendered = child.render(engine, converter)?;
            self.assign(&placeholder, rendered)?;
        }

        let name = self.name();
        let text = self.preprocessed_text();
        let options = self.options();

        self.trigger(ExecutionPoint::BeforeRendering, &text)?;
        let variables = self.scope().resolve();
        let evaluated = engine.evaluate(&text, &variables).map_err(|source| {
            DocweaveError::TemplateEvaluation { template: name.clone(), source }
        })?;
        self.trigger(ExecutionPoint::AfterRendering, &evaluated)?;

        if options.skip_markdown {
            tracing::debug!(template = %name, "rendered without markdown conversion");
            return Ok(evaluated);
        }

        self.trigger(ExecutionPoint::BeforeMarkdown, &evaluated)?;
        let html = converter.convert(&evaluated);
        self.trigger(ExecutionPoint::AfterMarkdown, &html)?;
        tracing::debug!(template = %name, "rendered with markdown conversion");
        Ok(html)
    }

    /// Registers an event consumer on this node and, pre-order, on every
    /// currently assigned child, so one subscription at the root observes
    /// every phase of every descendant's render.
    pub fn register(&self, consumer: Rc<RefCell<dyn EventConsumer>>) {
        self.node.borrow_mut().consumers.push(consumer.clone());
        for (_, child) in self.children() {
            child.register(consumer.clone());
        }
    }

    /// Removes a consumer (matched by identity) from this node and every
    /// currently assigned child.
    pub fn unregister(&self, consumer: &Rc<RefCell<dyn EventConsumer>>) {
        self.node
            .borrow_mut()
            .consumers
            .retain(|registered| !same_consumer(registered, consumer));
        for (_, child) in self.children() {
            child.unregister(consumer);
        }
    }

    /// Snapshot of (placeholder, child) pairs; empty for a fragment.
    fn children(&self) -> Vec<(String, Template)> {
        match &self.node.borrow().kind {
            NodeKind::Leaf => Vec::new(),
            NodeKind::Composite { children } => {
                children.iter().map(|(name, child)| (name.clone(), child.clone())).collect()
            }
        }
    }

    fn trigger(&self, point: ExecutionPoint, content: &str) -> Result<()> {
        let (consumers, name) = {
            let node = self.node.borrow();
            if node.consumers.is_empty() {
                return Ok(());
            }
            (node.consumers.clone(), node.name.clone())
        };

        let event = Event::new(point, name.clone(), content);
        for consumer in consumers {
            consumer.borrow_mut().trigger(&event).map_err(|source| {
                DocweaveError::Interceptor { point, template: name.clone(), source }
            })?;
        }
        Ok(())
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.node, &other.node) {
            return true;
        }
        let a = self.node.borrow();
        let b = other.node.borrow();
        a.name == b.name && a.source == b.source && a.scope == b.scope
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let node = self.node.borrow();
        f.debug_struct("Template")
            .field("name", &node.name)
            .field("layout", &matches!(node.kind, NodeKind::Composite { .. }))
            .field("preprocessed", &(node.preprocessed != node.source))
            .finish()
    }
}

fn same_consumer(
    a: &Rc<RefCell<dyn EventConsumer>>,
    b: &Rc<RefCell<dyn EventConsumer>>,
) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

fn read_template_file(path: &Path) -> Result<(String, String)> {
    let source = std::fs::read_to_string(path).map_err(|source| DocweaveError::TemplateRead {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "template".to_string());
    Ok((name, source))
}

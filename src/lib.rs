//! docweave - hierarchical document composition from template units
//!
//! docweave assembles text documents from composable template units, runs a
//! light preprocessing pass over embedded instruction blocks, and notifies
//! observers at fixed points in the render pipeline. It is a synchronous,
//! single-threaded, in-memory library: no I/O beyond optional template
//! file loading, no network surface, no persisted state.
//!
//! # Architecture Overview
//!
//! A document is a tree of [`Template`] nodes: fragments (leaves) and
//! layouts (composites holding named children). Each node owns its source
//! text, a mutable preprocessed buffer, and a variable [`Scope`] linked to
//! its parent's scope with nearest-scope-wins shadowing. Rendering a layout
//! renders its children first and binds each child's output as a scope
//! variable named after its placeholder, so the layout's own template text
//! can splice children in by name.
//!
//! Before rendering, instruction blocks of the form `<?target ... ?>` are
//! rewritten by registered [`PreProcessor`] handlers; the bundled
//! [`KeyValueProcessor`] collects `key : value` lines into a shared map and
//! erases the block. Around every phase the tree fires events that
//! registered [`Interceptor`]s observe through an [`EventDispatcher`].
//!
//! The [`Composer`] facade ties it together: it owns the handler list, the
//! dispatcher, and the two external collaborators — a [`TemplateEngine`]
//! (default: [`TeraEngine`], backed by tera) and a [`MarkdownConverter`]
//! (default: [`CmarkConverter`], backed by pulldown-cmark).
//!
//! # Core Modules
//!
//! - [`template`] - the composite render tree (fragments and layouts)
//! - [`scope`] - hierarchical variable scopes with shadowing lookup
//! - [`preprocess`] - instruction-block scanning and the handler contract
//! - [`events`] - execution points, events, and the interceptor pipeline
//! - [`composer`] - the orchestrating facade
//! - [`engine`] / [`markdown`] - the external collaborator seams and their
//!   default implementations
//! - [`error`] - the error taxonomy
//!
//! # Example
//!
//! ```
//! use docweave::{Composer, RenderOptions, Template};
//!
//! # fn main() -> docweave::Result<()> {
//! let page = Template::layout(
//!     "page",
//!     "<h1>{{ title }}</h1>\n{{ body }}",
//!     RenderOptions::without_markdown(),
//! )?;
//! let body = Template::fragment("body", "<p>hello</p>", RenderOptions::without_markdown())?;
//! page.set_child("body", &body)?;
//! page.assign("title", "Docweave")?;
//!
//! let composer = Composer::new();
//! let html = composer.render(&page)?;
//! assert_eq!(html, "<h1>Docweave</h1>\n<p>hello</p>");
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Everything runs synchronously on the calling thread. Handles are
//! `Rc`/`RefCell` based and not `Send`; at most one render cycle may be in
//! flight per tree at a time.

pub mod composer;
pub mod engine;
pub mod error;
pub mod events;
pub mod markdown;
pub mod preprocess;
pub mod scope;
pub mod template;

pub use composer::Composer;
pub use engine::{TemplateEngine, TeraEngine};
pub use error::{BoxedError, DocweaveError, Result};
pub use events::{Event, EventConsumer, EventDispatcher, ExecutionPoint, Interceptor};
pub use markdown::{CmarkConverter, MarkdownConverter};
pub use preprocess::{KeyValueProcessor, PreProcessor};
pub use scope::Scope;
pub use template::{RenderOptions, Template};

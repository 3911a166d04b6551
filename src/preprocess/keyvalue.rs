//! Reference instruction handler: line-oriented key/value blocks.
//!
//! A key-value block holds one `key : value` pair per line. Blank lines and
//! lines starting with `//` (after trimming) are ignored. The handler
//! always returns the empty string, so the whole directive vanishes from
//! the rendered output; its observable effects are the externally supplied
//! pair accumulator and a per-block warnings list.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{DocweaveError, Result};

use super::PreProcessor;

/// Default target token for key-value directives.
pub const DEFAULT_TARGET: &str = "fdm-keyvalue";

/// Line separator inside block bodies. Explicit, not platform-sniffed.
const NEW_LINE: &str = "\n";

const COMMENT_PREFIX: &str = "//";
const SEPARATOR: char = ':';

/// Collects `key : value` pairs from directive blocks.
///
/// The accumulator is shared with the caller, so pairs gathered from
/// several blocks (or several documents) land in one map:
///
/// ```
/// use std::cell::RefCell;
/// use std::collections::HashMap;
/// use std::rc::Rc;
///
/// use docweave::preprocess::{self, KeyValueProcessor};
///
/// let pairs = Rc::new(RefCell::new(HashMap::new()));
/// let mut processor = KeyValueProcessor::new(pairs.clone());
/// let output = preprocess::apply("<?fdm-keyvalue\n  title: hello\n ?>", &mut processor);
/// assert_eq!(output, "");
/// assert_eq!(pairs.borrow().get("title").map(String::as_str), Some("hello"));
/// ```
///
/// A value is truncated at the second colon-delimited segment: `key: a:b`
/// stores `a`. That is historical behavior, kept rather than guessing an
/// escaping rule.
pub struct KeyValueProcessor {
    target: String,
    pairs: Rc<RefCell<HashMap<String, String>>>,
    warnings: Vec<String>,
}

impl KeyValueProcessor {
    /// Creates a processor with the default `fdm-keyvalue` target.
    pub fn new(pairs: Rc<RefCell<HashMap<String, String>>>) -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            pairs,
            warnings: Vec::new(),
        }
    }

    /// Creates a processor answering to a custom target token.
    ///
    /// # Errors
    ///
    /// [`DocweaveError::InvalidArgument`] if `target` is empty.
    pub fn with_target(
        pairs: Rc<RefCell<HashMap<String, String>>>,
        target: impl Into<String>,
    ) -> Result<Self> {
        let target = target.into();
        if target.is_empty() {
            return Err(DocweaveError::invalid_argument("preprocessor target must not be empty"));
        }
        Ok(Self { target, pairs, warnings: Vec::new() })
    }

    /// Shared handle to the accumulated pairs.
    pub fn pairs(&self) -> Rc<RefCell<HashMap<String, String>>> {
        self.pairs.clone()
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}

impl PreProcessor for KeyValueProcessor {
    fn target(&self) -> &str {
        &self.target
    }

    fn process(&mut self, block: &str) -> String {
        // Warnings are scoped per block, not per document.
        self.warnings.clear();

        for line in block.split(NEW_LINE) {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
                continue;
            }
            if !trimmed.contains(SEPARATOR) {
                self.warn(format!("Malformed key value line '{trimmed}'! Skipping line."));
                continue;
            }

            // Trailing zero-length segments are not segments: `key:` has a
            // key and nothing else.
            let mut segments: Vec<&str> = line.split(SEPARATOR).collect();
            while segments.last() == Some(&"") {
                segments.pop();
            }

            let key = segments.first().copied().unwrap_or("").trim();
            if key.is_empty() {
                self.warn(format!("Empty key in line '{trimmed}'! Skipping line."));
                continue;
            }

            // Only the second segment counts as the value; anything after a
            // further separator is discarded.
            let value = match segments.get(1) {
                None => {
                    self.warn(format!("No value given for key '{key}'!"));
                    String::new()
                }
                Some(&"") => {
                    self.warn(format!("Empty value for key '{key}'!"));
                    String::new()
                }
                Some(raw) => raw.trim().to_string(),
            };

            tracing::debug!(key, value = %value, "collected key value pair");
            self.pairs.borrow_mut().insert(key.to_string(), value);
        }

        String::new()
    }

    fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

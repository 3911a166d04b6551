//! Instruction-block scanning and rewriting.
//!
//! Documents may embed directive blocks of the form `<?target ... ?>`.
//! [`apply`] scans a string for blocks addressed to one handler's target
//! token and splices the handler's replacement text in place of the whole
//! directive. Blocks addressed to other targets pass through byte-for-byte
//! so a later pass with a different handler can still find them.
//!
//! The scanner is an explicit two-state machine (literal text vs. inside an
//! instruction) over a whitespace-run tokenizer, not a general parser.
//! Whitespace runs are tokens themselves, which is what reproduces exact
//! spacing outside directives verbatim.

pub mod keyvalue;

pub use keyvalue::KeyValueProcessor;

/// Prefix of a directive's opening token. The full opening token is this
/// prefix glued to the handler's target, e.g. `<?fdm-keyvalue`.
const OPEN_PREFIX: &str = "<?";

/// The closing token of every directive.
const CLOSE_TOKEN: &str = "?>";

/// An instruction handler addressed by directive blocks.
///
/// A handler owns a target token and rewrites the body of every matching
/// block. `process` takes `&mut self` because handlers commonly mutate
/// accumulator state across calls (collected key/value pairs, a warnings
/// list); see [`KeyValueProcessor`] for the reference implementation.
pub trait PreProcessor {
    /// The non-empty token identifying which directives address this
    /// handler.
    fn target(&self) -> &str;

    /// Rewrites one directive body. The returned string replaces the whole
    /// directive (opening marker, body, closing marker) in the output.
    fn process(&mut self, block: &str) -> String;

    /// Soft diagnostics collected by the most recent `process` call.
    ///
    /// Warnings never alter control flow; they exist for the caller to
    /// inspect after processing.
    fn warnings(&self) -> &[String] {
        &[]
    }

    /// Whether the most recent `process` call produced warnings.
    fn has_warnings(&self) -> bool {
        !self.warnings().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Literal,
    Instruction,
}

/// Rewrites every directive in `subject` addressed to `processor`.
///
/// Directive markers must appear as standalone whitespace-bounded tokens;
/// a marker glued to adjacent punctuation is not recognized. The body
/// passed to the handler is the verbatim text between the markers,
/// including internal whitespace and newlines.
///
/// An instruction that is opened but never closed consumes the remainder of
/// the input into the buffer and is never flushed: the handler is not
/// invoked and the content is dropped from the output. This matches the
/// historical behavior of the format; a warning is logged.
pub fn apply(subject: &str, processor: &mut dyn PreProcessor) -> String {
    let open_token = format!("{OPEN_PREFIX}{}", processor.target());
    let mut output = String::with_capacity(subject.len());
    let mut buffer = String::new();
    let mut state = State::Literal;

    for token in tokens(subject) {
        match state {
            State::Literal => {
                if token == open_token {
                    tracing::debug!(target_token = processor.target(), "entering instruction");
                    state = State::Instruction;
                    buffer.clear();
                } else {
                    output.push_str(token);
                }
            }
            State::Instruction => {
                if token == CLOSE_TOKEN {
                    output.push_str(&processor.process(&buffer));
                    state = State::Literal;
                } else {
                    buffer.push_str(token);
                }
            }
        }
    }

    if state == State::Instruction {
        tracing::warn!(
            target_token = processor.target(),
            dropped_bytes = buffer.len(),
            "unterminated instruction block, content dropped"
        );
    }

    output
}

/// Splits `text` into alternating runs of whitespace and non-whitespace.
///
/// Concatenating the tokens reproduces the input exactly.
fn tokens(text: &str) -> Tokens<'_> {
    Tokens { rest: text }
}

struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let in_whitespace = first.is_whitespace();
        let end = self
            .rest
            .find(|c: char| c.is_whitespace() != in_whitespace)
            .unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(token)
    }
}

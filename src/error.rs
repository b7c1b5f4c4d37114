//! Error types for tokenizing, registration, and evaluation

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::parser::ast::Span;

/// Errors surfaced by the template engine
///
/// Syntax and lookup failures abort the whole evaluation; nothing partially
/// rendered escapes. A guard tag stopping evaluation is not an error - it
/// surfaces as [`Outcome::Aborted`](crate::Outcome::Aborted).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed template syntax, currently unclosed argument lists
    #[error("syntax error at {span:?}: {message}")]
    Syntax { span: Span, message: String },

    /// Tag name not present in the handler registry
    #[error("unknown tag: ${name}")]
    UnknownTag { name: String },

    /// Argument count outside the handler's declared bounds
    #[error("${tag} expects {} argument(s), got {found}", format_arity(.min, .max))]
    Arity {
        tag: String,
        min: usize,
        max: Option<usize>,
        found: usize,
    },

    /// Registration-time name collision; the first registration stays active
    #[error("duplicate tag registration: ${name}")]
    DuplicateTag { name: String },

    /// Nested argument expansion went past the configured limit
    #[error("tag nesting exceeds depth limit of {limit}")]
    DepthExceeded { limit: usize },

    /// Handler-level failure while evaluating a tag
    #[error("${tag}: {message}")]
    Eval { tag: String, message: String },
}

impl EngineError {
    /// Format the error with source context using ariadne
    ///
    /// Only syntax errors carry a span; the other kinds fall back to their
    /// Display form.
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            EngineError::Syntax { span, message } => {
                let mut buf = Vec::new();
                Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(message)
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf)
                    .unwrap();
                String::from_utf8(buf).unwrap()
            }
            other => other.to_string(),
        }
    }
}

fn format_arity(min: &usize, max: &Option<usize>) -> String {
    match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    }
}

/// Failure raised inside a tag handler
///
/// The evaluator wraps this into [`EngineError::Eval`] together with the
/// name of the failing tag.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EvalError(String);

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_message_exact() {
        let err = EngineError::Arity {
            tag: "round".to_string(),
            min: 1,
            max: Some(1),
            found: 3,
        };
        assert_eq!(err.to_string(), "$round expects 1 argument(s), got 3");
    }

    #[test]
    fn test_arity_message_open_ended() {
        let err = EngineError::Arity {
            tag: "sum".to_string(),
            min: 2,
            max: None,
            found: 1,
        };
        assert_eq!(err.to_string(), "$sum expects at least 2 argument(s), got 1");
    }

    #[test]
    fn test_syntax_error_formats_with_source_context() {
        let source = "$sub[1;2";
        let err = EngineError::Syntax {
            span: 4..5,
            message: "unclosed argument list for `$sub`".to_string(),
        };
        let report = err.format(source, "test.tag");
        assert!(report.contains("unclosed argument list"));
        assert!(report.contains("test.tag"));
    }

    #[test]
    fn test_non_syntax_errors_fall_back_to_display() {
        let err = EngineError::UnknownTag {
            name: "nope".to_string(),
        };
        assert_eq!(err.format("", "test.tag"), "unknown tag: $nope");
    }
}

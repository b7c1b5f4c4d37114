//! Streaming tokenizer for template strings
//!
//! Turns a template into a lazy sequence of [`Node`]s: coalesced literal
//! text runs and tags whose arguments are captured as raw source
//! substrings. Nested tags inside arguments stay unexpanded so the
//! evaluator can resolve them innermost-first on demand.
//!
//! Bracket nesting is tracked with an explicit depth counter rather than
//! recursion, so adversarial input cannot grow the native call stack. The
//! stream is single-pass and non-restartable; re-tokenizing the same
//! template requires a fresh [`tokenize`] call.

use std::iter::Peekable;

use logos::{Logos, SpannedIter};

use crate::error::EngineError;
use crate::parser::ast::{Node, Span, Tag};
use crate::parser::lexer::RawToken;

/// Tokenize a template into a lazy stream of nodes
pub fn tokenize(template: &str) -> Tokenizer<'_> {
    Tokenizer {
        source: template,
        raw: RawToken::lexer(template).spanned().peekable(),
    }
}

/// Streaming iterator over template nodes
///
/// Yields `Err` for malformed syntax (currently only unclosed argument
/// lists); after an error the stream is exhausted.
pub struct Tokenizer<'src> {
    source: &'src str,
    raw: Peekable<SpannedIter<'src, RawToken>>,
}

impl<'src> Tokenizer<'src> {
    /// Collect the argument list that follows a tag name, if any
    ///
    /// Arguments split on semicolons at depth 1 only; nested brackets are
    /// balanced with a counter and their contents captured verbatim.
    fn finish_tag(&mut self, name: String, name_span: Span) -> Result<Node, EngineError> {
        // An argument list opens only when `[` directly follows the name;
        // any intervening text token means the bracket is literal.
        let open_span = match self.raw.peek() {
            Some((Ok(RawToken::BracketOpen), span)) => span.clone(),
            _ => {
                return Ok(Node::Tag(Tag {
                    name,
                    args: Vec::new(),
                    span: name_span,
                }))
            }
        };
        self.raw.next();

        let mut args = Vec::new();
        let mut depth = 1usize;
        let mut arg_start = open_span.end;

        for (tok, span) in self.raw.by_ref() {
            match tok {
                Ok(RawToken::BracketOpen) => depth += 1,
                Ok(RawToken::BracketClose) => {
                    depth -= 1;
                    if depth == 0 {
                        args.push(self.source[arg_start..span.start].to_string());
                        return Ok(Node::Tag(Tag {
                            name,
                            args,
                            span: name_span.start..span.end,
                        }));
                    }
                }
                Ok(RawToken::Semicolon) if depth == 1 => {
                    args.push(self.source[arg_start..span.start].to_string());
                    arg_start = span.end;
                }
                _ => {}
            }
        }

        Err(EngineError::Syntax {
            span: open_span,
            message: format!("unclosed argument list for `${}`", name),
        })
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Result<Node, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut literal = String::new();

        loop {
            // Flush any pending literal before a tag starts, without
            // consuming the tag token.
            if !literal.is_empty()
                && matches!(self.raw.peek(), Some((Ok(RawToken::Name(_)), _)))
            {
                return Some(Ok(Node::Text(literal)));
            }

            let Some((tok, span)) = self.raw.next() else {
                return if literal.is_empty() {
                    None
                } else {
                    Some(Ok(Node::Text(literal)))
                };
            };

            match tok {
                Ok(RawToken::Name(name)) => return Some(self.finish_tag(name, span)),
                Ok(RawToken::EscapedDollar) | Ok(RawToken::Dollar) => literal.push('$'),
                // Structural characters outside an argument list are text.
                Ok(RawToken::Semicolon) => literal.push(';'),
                Ok(RawToken::BracketOpen) => literal.push('['),
                Ok(RawToken::BracketClose) => literal.push(']'),
                Ok(RawToken::Text) => literal.push_str(&self.source[span]),
                Err(()) => {
                    return Some(Err(EngineError::Syntax {
                        span,
                        message: "unrecognized input".to_string(),
                    }))
                }
            }
        }
    }
}

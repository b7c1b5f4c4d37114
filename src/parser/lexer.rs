//! Raw lexer for template strings using logos
//!
//! Templates are mostly literal text, so the token set is deliberately
//! small: tag names, the bracket and semicolon delimiters that structure
//! argument lists, the `$$` escape, and opaque text runs. Whitespace is
//! significant and flows through as text.

use logos::Logos;

/// Low-level tokens consumed by the streaming tokenizer
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum RawToken {
    /// `$$` - escape for a literal dollar sign
    #[token("$$", priority = 3)]
    EscapedDollar,

    /// `$name` - start of a tag invocation, captured without the sigil
    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Name(String),

    /// A `$` not followed by a name character, treated as literal text
    #[token("$")]
    Dollar,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token(";")]
    Semicolon,

    /// Any run of characters with no structural meaning
    #[regex(r"[^$\[\];]+")]
    Text,
}

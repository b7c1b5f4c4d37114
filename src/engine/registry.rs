//! Handler registry mapping tag names to their implementations
//!
//! Names resolve at evaluation time, not parse time, so tag availability
//! can depend on what the host registered. The registry is populated before
//! the first evaluation and never mutated afterwards; lookups take `&self`,
//! making a shared registry safe across concurrently running evaluations.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::engine::context::ExecutionContext;
use crate::error::{EngineError, EvalError};

/// Control-flow signal returned by directive handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Keep evaluating the rest of the template
    Continue,
    /// Stop evaluating; no message should be sent
    Abort,
}

/// Argument count bounds declared by a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` means unbounded
    pub max: Option<usize>,
}

impl Arity {
    /// No arguments
    pub fn none() -> Self {
        Self { min: 0, max: Some(0) }
    }

    /// Exactly `n` arguments
    pub fn exact(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    /// `n` or more arguments
    pub fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    /// Between `min` and `max` arguments inclusive
    pub fn range(min: usize, max: usize) -> Self {
        Self { min, max: Some(max) }
    }

    /// Validate an observed argument count against these bounds
    pub fn check(&self, tag: &str, found: usize) -> Result<(), EngineError> {
        if found < self.min || self.max.is_some_and(|max| found > max) {
            return Err(EngineError::Arity {
                tag: tag.to_string(),
                min: self.min,
                max: self.max,
                found,
            });
        }
        Ok(())
    }
}

type PureFn =
    Box<dyn Fn(&[String], &mut ExecutionContext) -> Result<String, EvalError> + Send + Sync>;
type DirectiveFn =
    Box<dyn Fn(&[String], &mut ExecutionContext) -> Result<Control, EvalError> + Send + Sync>;

enum HandlerBody {
    Pure(PureFn),
    Directive(DirectiveFn),
}

/// A registered tag implementation
///
/// Handlers come in two capability shapes: **pure** handlers produce
/// replacement text for interpolation, **directive** handlers mutate the
/// context's in-progress message descriptor and may short-circuit the
/// evaluation (guards).
pub struct TagHandler {
    arity: Arity,
    body: HandlerBody,
}

/// What a handler produced for one tag invocation
#[derive(Debug, Clone, PartialEq)]
pub enum TagOutput {
    /// Inline replacement text from a pure handler
    Text(String),
    /// A directive applied its side effect
    Applied,
    /// A guard requested that evaluation stop
    Abort,
}

impl TagHandler {
    /// An interpolation handler producing replacement text
    pub fn pure<F>(arity: Arity, f: F) -> Self
    where
        F: Fn(&[String], &mut ExecutionContext) -> Result<String, EvalError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            arity,
            body: HandlerBody::Pure(Box::new(f)),
        }
    }

    /// A side-effecting handler building the message descriptor
    pub fn directive<F>(arity: Arity, f: F) -> Self
    where
        F: Fn(&[String], &mut ExecutionContext) -> Result<Control, EvalError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            arity,
            body: HandlerBody::Directive(Box::new(f)),
        }
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Invoke with fully-resolved argument strings
    pub fn invoke(
        &self,
        args: &[String],
        ctx: &mut ExecutionContext,
    ) -> Result<TagOutput, EvalError> {
        match &self.body {
            HandlerBody::Pure(f) => f(args, ctx).map(TagOutput::Text),
            HandlerBody::Directive(f) => f(args, ctx).map(|control| match control {
                Control::Continue => TagOutput::Applied,
                Control::Abort => TagOutput::Abort,
            }),
        }
    }
}

impl fmt::Debug for TagHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            HandlerBody::Pure(_) => "pure",
            HandlerBody::Directive(_) => "directive",
        };
        f.debug_struct("TagHandler")
            .field("arity", &self.arity)
            .field("kind", &kind)
            .finish()
    }
}

/// Registry of tag handlers keyed by name
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, TagHandler>,
}

impl HandlerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name` (without the `$` sigil)
    ///
    /// The first registration of a name wins; a second attempt fails with
    /// [`EngineError::DuplicateTag`] and leaves the original in place.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: TagHandler,
    ) -> Result<(), EngineError> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(EngineError::DuplicateTag { name });
        }
        trace!(tag = %name, "registered tag handler");
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Look up a handler, failing with [`EngineError::UnknownTag`] if absent
    pub fn lookup(&self, name: &str) -> Result<&TagHandler, EngineError> {
        self.handlers.get(name).ok_or_else(|| EngineError::UnknownTag {
            name: name.to_string(),
        })
    }

    /// Check whether a tag name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered tag names, in unspecified order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(|name| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

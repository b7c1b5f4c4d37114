//! tagscript - a tag-based template expansion engine for chat bots
//!
//! Templates are literal text interleaved with tags written `$name` or
//! `$name[arg1;arg2;...]`. Evaluating a template against a per-invocation
//! [`ExecutionContext`] produces a [`MessageDescriptor`] - content, embed
//! fields, and button rows - that the host bot framework renders into its
//! own message format.
//!
//! # Example
//!
//! ```rust
//! use tagscript::{evaluate, CallerIdentity, EnvSnapshot, ExecutionContext, Outcome};
//!
//! let ctx = ExecutionContext::new(CallerIdentity::user("42"), EnvSnapshot::default());
//! let outcome = evaluate("$let[x;5]Result: $sum[$get[x];1]", ctx).unwrap();
//! match outcome {
//!     Outcome::Completed(message) => assert_eq!(message.content, "Result: 6"),
//!     Outcome::Aborted => unreachable!(),
//! }
//! ```

pub mod engine;
pub mod error;
pub mod message;
pub mod parser;
pub mod snapshot;

pub use engine::{
    Arity, CallerIdentity, CommandGateway, Control, EngineConfig, ExecutionContext,
    HandlerRegistry, Outcome, TagHandler, TagOutput,
};
pub use error::{EngineError, EvalError};
pub use message::{
    ActionRow, Button, ButtonStyle, Color, MessageDescriptor, MAX_ACTION_ROWS,
    MAX_BUTTONS_PER_ROW,
};
pub use parser::{tokenize, Node, Span, Tag};
pub use snapshot::{EnvSnapshot, SnapshotError};

/// A configured template engine: registry plus evaluation limits
///
/// Build it once at process start, register any custom tags, then share it
/// read-only across evaluations.
#[derive(Debug)]
pub struct Engine {
    registry: HandlerRegistry,
    config: EngineConfig,
}

impl Engine {
    /// An engine with an empty registry
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            config: EngineConfig::default(),
        }
    }

    /// An engine preloaded with the built-in tag set
    pub fn with_builtins() -> Self {
        let mut registry = HandlerRegistry::new();
        engine::builtins::install(&mut registry)
            .expect("Builtin tag set should register cleanly");
        Self {
            registry,
            config: EngineConfig::default(),
        }
    }

    /// Replace the evaluation limits
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a custom tag handler
    ///
    /// Registration must finish before evaluations begin; the registry is
    /// read-only from then on.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: TagHandler,
    ) -> Result<(), EngineError> {
        self.registry.register(name, handler)
    }

    /// Registered tag names, in unspecified order
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.registry.names()
    }

    /// Evaluate a template against a fresh per-invocation context
    ///
    /// # Example
    ///
    /// ```rust
    /// use tagscript::{CallerIdentity, Engine, EnvSnapshot, ExecutionContext};
    ///
    /// let engine = Engine::with_builtins();
    /// let ctx = ExecutionContext::new(CallerIdentity::user("42"), EnvSnapshot::default());
    /// let outcome = engine.evaluate("$sub[10;4]", ctx).unwrap();
    /// assert_eq!(outcome.message().unwrap().content, "6");
    /// ```
    pub fn evaluate(
        &self,
        template: &str,
        ctx: ExecutionContext,
    ) -> Result<Outcome, EngineError> {
        engine::evaluate(&self.registry, &self.config, template, ctx)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate a template with the built-in tag set and default limits
///
/// Convenience wrapper over [`Engine::with_builtins`]; hosts evaluating
/// many templates should build one [`Engine`] and reuse it.
pub fn evaluate(template: &str, ctx: ExecutionContext) -> Result<Outcome, EngineError> {
    Engine::with_builtins().evaluate(template, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(CallerIdentity::user("42"), EnvSnapshot::default())
    }

    #[test]
    fn test_evaluate_literal() {
        let outcome = evaluate("hello", ctx()).expect("Should evaluate");
        assert_eq!(outcome.message().expect("Should complete").content, "hello");
    }

    #[test]
    fn test_engine_register_custom_tag() {
        let mut engine = Engine::with_builtins();
        engine
            .register(
                "shout",
                TagHandler::pure(Arity::exact(1), |args: &[String], _: &mut ExecutionContext| {
                    Ok(args[0].to_uppercase())
                }),
            )
            .expect("Should register");
        let outcome = engine.evaluate("$shout[hi]", ctx()).expect("Should evaluate");
        assert_eq!(outcome.message().expect("Should complete").content, "HI");
    }

    #[test]
    fn test_empty_engine_knows_no_tags() {
        let engine = Engine::new();
        let err = engine.evaluate("$sub[2;1]", ctx()).expect_err("Should fail");
        assert!(matches!(err, EngineError::UnknownTag { .. }));
    }

    #[test]
    fn test_builtin_engine_lists_tags() {
        let engine = Engine::with_builtins();
        let names: Vec<&str> = engine.tag_names().collect();
        assert!(names.contains(&"sub"));
        assert!(names.contains(&"updateApplicationCommands"));
    }
}

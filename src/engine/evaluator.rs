//! Left-to-right template evaluation
//!
//! Walks the tokenized node stream, expands each tag's raw arguments
//! innermost-first, then dispatches the tag through the registry. Literal
//! text and pure-handler results concatenate in document order into the
//! message content; directive side effects apply to the shared context as
//! they are encountered. A directive nested inside another tag's argument
//! applies its side effect when the nested tag evaluates, before the
//! enclosing handler runs.

use tracing::{debug, trace};

use crate::engine::context::ExecutionContext;
use crate::engine::registry::{Control, HandlerRegistry, TagOutput};
use crate::error::EngineError;
use crate::message::MessageDescriptor;
use crate::parser::{tokenize, Node};

/// Evaluation limits
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Nested argument expansion levels allowed before failing with
    /// [`EngineError::DepthExceeded`]
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Result of one template evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Evaluation ran to completion
    Completed(MessageDescriptor),
    /// A guard tag stopped evaluation; no message should be sent
    Aborted,
}

impl Outcome {
    /// The descriptor, if evaluation completed
    pub fn message(self) -> Option<MessageDescriptor> {
        match self {
            Outcome::Completed(message) => Some(message),
            Outcome::Aborted => None,
        }
    }
}

/// Evaluate a template against a fresh per-invocation context
///
/// Synchronous and single-threaded; concurrent evaluations share only the
/// read-only registry.
pub fn evaluate(
    registry: &HandlerRegistry,
    config: &EngineConfig,
    template: &str,
    mut ctx: ExecutionContext,
) -> Result<Outcome, EngineError> {
    let mut content = String::new();
    match expand(registry, config, template, &mut ctx, 0, &mut content)? {
        Control::Abort => {
            debug!("evaluation aborted by guard tag");
            Ok(Outcome::Aborted)
        }
        Control::Continue => {
            debug!(content_len = content.len(), "evaluation completed");
            ctx.message_mut().content = content;
            Ok(Outcome::Completed(ctx.into_message()))
        }
    }
}

/// Expand one template layer into `out`
///
/// `depth` counts nested argument layers; the top-level template is depth
/// zero. Each raw argument is re-tokenized and expanded at `depth + 1`, so
/// inner tags are fully resolved strings by the time their enclosing
/// handler runs.
fn expand(
    registry: &HandlerRegistry,
    config: &EngineConfig,
    source: &str,
    ctx: &mut ExecutionContext,
    depth: usize,
    out: &mut String,
) -> Result<Control, EngineError> {
    if depth > config.max_depth {
        return Err(EngineError::DepthExceeded {
            limit: config.max_depth,
        });
    }

    for node in tokenize(source) {
        match node? {
            Node::Text(text) => out.push_str(&text),
            Node::Tag(tag) => {
                let handler = registry.lookup(&tag.name)?;
                handler.arity().check(&tag.name, tag.args.len())?;

                let mut args = Vec::with_capacity(tag.args.len());
                for raw in &tag.args {
                    let mut resolved = String::new();
                    if expand(registry, config, raw, ctx, depth + 1, &mut resolved)?
                        == Control::Abort
                    {
                        return Ok(Control::Abort);
                    }
                    args.push(resolved);
                }

                trace!(tag = %tag.name, args = args.len(), depth, "dispatching tag");
                match handler.invoke(&args, ctx) {
                    Ok(TagOutput::Text(text)) => out.push_str(&text),
                    Ok(TagOutput::Applied) => {}
                    Ok(TagOutput::Abort) => return Ok(Control::Abort),
                    Err(err) => {
                        return Err(EngineError::Eval {
                            tag: tag.name,
                            message: err.to_string(),
                        })
                    }
                }
            }
        }
    }

    Ok(Control::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::CallerIdentity;
    use crate::engine::registry::{Arity, TagHandler};
    use crate::snapshot::EnvSnapshot;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(CallerIdentity::default(), EnvSnapshot::default())
    }

    fn echo_registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry
            .register(
                "echo",
                TagHandler::pure(Arity::exact(1), |args: &[String], _: &mut ExecutionContext| {
                    Ok(args[0].clone())
                }),
            )
            .expect("Should register");
        registry
    }

    #[test]
    fn test_literal_template_passes_through() {
        let registry = HandlerRegistry::new();
        let outcome = evaluate(&registry, &EngineConfig::default(), "just text", ctx())
            .expect("Should evaluate");
        let message = outcome.message().expect("Should complete");
        assert_eq!(message.content, "just text");
    }

    #[test]
    fn test_nested_args_resolve_innermost_first() {
        let registry = echo_registry();
        let outcome = evaluate(
            &registry,
            &EngineConfig::default(),
            "$echo[a$echo[b]c]",
            ctx(),
        )
        .expect("Should evaluate");
        assert_eq!(outcome.message().expect("Should complete").content, "abc");
    }

    #[test]
    fn test_depth_limit_enforced() {
        let registry = echo_registry();
        let config = EngineConfig::new().with_max_depth(2);
        // Three argument layers: the innermost expansion runs at depth 3.
        let err = evaluate(&registry, &config, "$echo[$echo[$echo[x]]]", ctx())
            .expect_err("Should fail");
        assert!(matches!(err, EngineError::DepthExceeded { limit: 2 }));
    }

    #[test]
    fn test_depth_limit_allows_shallow_templates() {
        let registry = echo_registry();
        let config = EngineConfig::new().with_max_depth(2);
        let outcome = evaluate(&registry, &config, "$echo[$echo[x]]", ctx())
            .expect("Should evaluate");
        assert_eq!(outcome.message().expect("Should complete").content, "x");
    }

    #[test]
    fn test_unknown_tag_fails_not_passes_through() {
        let registry = HandlerRegistry::new();
        let err = evaluate(&registry, &EngineConfig::default(), "$doesNotExist[1]", ctx())
            .expect_err("Should fail");
        assert!(matches!(err, EngineError::UnknownTag { name } if name == "doesNotExist"));
    }

    #[test]
    fn test_handler_error_carries_tag_name() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(
                "boom",
                TagHandler::pure(Arity::none(), |_: &[String], _: &mut ExecutionContext| {
                    Err(crate::error::EvalError::new("it broke"))
                }),
            )
            .expect("Should register");
        let err = evaluate(&registry, &EngineConfig::default(), "$boom", ctx())
            .expect_err("Should fail");
        assert!(matches!(
            err,
            EngineError::Eval { ref tag, ref message } if tag == "boom" && message == "it broke"
        ));
    }

    #[test]
    fn test_abort_from_nested_argument_propagates() {
        let mut registry = echo_registry();
        registry
            .register(
                "deny",
                TagHandler::directive(Arity::none(), |_: &[String], _: &mut ExecutionContext| {
                    Ok(Control::Abort)
                }),
            )
            .expect("Should register");
        let outcome = evaluate(&registry, &EngineConfig::default(), "$echo[$deny]", ctx())
            .expect("Should evaluate");
        assert_eq!(outcome, Outcome::Aborted);
    }
}

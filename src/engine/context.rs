//! Per-invocation execution state threaded through evaluation
//!
//! Each evaluation receives an independent [`ExecutionContext`]; the only
//! state shared between concurrent evaluations is the read-only handler
//! registry. Variable bindings live and die with one context, so nothing
//! leaks across invocations.

use std::collections::HashMap;
use std::fmt;

use crate::error::EvalError;
use crate::message::MessageDescriptor;
use crate::snapshot::EnvSnapshot;

/// Identity of the user who triggered the evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallerIdentity {
    pub user_id: String,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
}

impl CallerIdentity {
    /// An identity with just a user id, for direct messages and tests
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            user_id: id.into(),
            guild_id: None,
            channel_id: None,
        }
    }
}

/// Host-side command registration channel
///
/// The command-sync tags call through this trait; each sync performs the
/// host's external registration work and returns the resulting total
/// command count.
pub trait CommandGateway: Send {
    /// Resynchronize prefix (message) commands
    fn sync_prefix_commands(&mut self) -> Result<u32, EvalError>;

    /// Resynchronize application (slash) commands
    fn sync_application_commands(&mut self) -> Result<u32, EvalError>;
}

/// Mutable state for a single template evaluation
pub struct ExecutionContext {
    pub caller: CallerIdentity,
    env: EnvSnapshot,
    vars: HashMap<String, String>,
    message: MessageDescriptor,
    gateway: Option<Box<dyn CommandGateway>>,
}

impl ExecutionContext {
    /// Create a context for one evaluation
    ///
    /// The snapshot should be freshly sampled by the host; the engine
    /// treats it as read-only apart from the command-sync side channel.
    pub fn new(caller: CallerIdentity, env: EnvSnapshot) -> Self {
        Self {
            caller,
            env,
            vars: HashMap::new(),
            message: MessageDescriptor::new(),
            gateway: None,
        }
    }

    /// Attach the host's command registration channel
    pub fn with_gateway(mut self, gateway: Box<dyn CommandGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Read-only environment snapshot for this evaluation
    pub fn env(&self) -> &EnvSnapshot {
        &self.env
    }

    /// Value bound by a variable tag, if any
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(|value| value.as_str())
    }

    /// Bind a variable for the remainder of this evaluation
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// The message being assembled by directive tags
    pub fn message(&self) -> &MessageDescriptor {
        &self.message
    }

    pub fn message_mut(&mut self) -> &mut MessageDescriptor {
        &mut self.message
    }

    pub(crate) fn into_message(self) -> MessageDescriptor {
        self.message
    }

    /// Trigger the host's prefix command resync
    ///
    /// Updates the snapshot's command count so later reads observe the
    /// post-sync value.
    pub fn sync_prefix_commands(&mut self) -> Result<u32, EvalError> {
        let gateway = self
            .gateway
            .as_mut()
            .ok_or_else(|| EvalError::new("no command gateway installed"))?;
        let count = gateway.sync_prefix_commands()?;
        self.env.command_count = count;
        Ok(count)
    }

    /// Trigger the host's application command resync
    pub fn sync_application_commands(&mut self) -> Result<u32, EvalError> {
        let gateway = self
            .gateway
            .as_mut()
            .ok_or_else(|| EvalError::new("no command gateway installed"))?;
        let count = gateway.sync_application_commands()?;
        self.env.command_count = count;
        Ok(count)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("caller", &self.caller)
            .field("env", &self.env)
            .field("vars", &self.vars)
            .field("message", &self.message)
            .field("gateway", &self.gateway.is_some())
            .finish()
    }
}

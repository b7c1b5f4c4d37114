//! Built-in tag set
//!
//! Covers the language's standard vocabulary: variables and arithmetic,
//! environment metrics, caller identity, message-building directives,
//! guards, and the command-sync bridge. Hosts register their own tags next
//! to these through the same registry.

use crate::engine::context::ExecutionContext;
use crate::engine::registry::{Arity, Control, HandlerRegistry, TagHandler};
use crate::error::{EngineError, EvalError};
use crate::message::{ActionRow, Button, ButtonStyle, Color, MAX_ACTION_ROWS, MAX_BUTTONS_PER_ROW};
use crate::snapshot::EnvSnapshot;

/// Install every built-in tag into `registry`
///
/// Fails with [`EngineError::DuplicateTag`] if any built-in name is
/// already taken, so hosts that pre-register custom tags find collisions
/// immediately.
pub fn install(registry: &mut HandlerRegistry) -> Result<(), EngineError> {
    install_variables(registry)?;
    install_arithmetic(registry)?;
    install_environment(registry)?;
    install_caller(registry)?;
    install_message(registry)?;
    install_guards(registry)?;
    install_command_sync(registry)?;
    Ok(())
}

fn install_variables(registry: &mut HandlerRegistry) -> Result<(), EngineError> {
    registry.register(
        "let",
        TagHandler::directive(Arity::exact(2), |args: &[String], ctx: &mut ExecutionContext| {
            let name = args[0].trim();
            if name.is_empty() {
                return Err(EvalError::new("variable name is empty"));
            }
            ctx.set_var(name, args[1].clone());
            Ok(Control::Continue)
        }),
    )?;

    registry.register(
        "get",
        TagHandler::pure(Arity::exact(1), |args: &[String], ctx: &mut ExecutionContext| {
            let name = args[0].trim();
            ctx.var(name)
                .map(str::to_string)
                .ok_or_else(|| EvalError::new(format!("undefined variable `{}`", name)))
        }),
    )?;

    Ok(())
}

fn install_arithmetic(registry: &mut HandlerRegistry) -> Result<(), EngineError> {
    registry.register(
        "sum",
        TagHandler::pure(Arity::at_least(2), |args: &[String], _: &mut ExecutionContext| {
            let mut total = parse_number(&args[0])?;
            for arg in &args[1..] {
                total += parse_number(arg)?;
            }
            Ok(total.to_string())
        }),
    )?;

    registry.register(
        "sub",
        TagHandler::pure(Arity::at_least(2), |args: &[String], _: &mut ExecutionContext| {
            let mut total = parse_number(&args[0])?;
            for arg in &args[1..] {
                total -= parse_number(arg)?;
            }
            Ok(total.to_string())
        }),
    )?;

    registry.register(
        "mul",
        TagHandler::pure(Arity::at_least(2), |args: &[String], _: &mut ExecutionContext| {
            let mut total = parse_number(&args[0])?;
            for arg in &args[1..] {
                total *= parse_number(arg)?;
            }
            Ok(total.to_string())
        }),
    )?;

    registry.register(
        "div",
        TagHandler::pure(Arity::at_least(2), |args: &[String], _: &mut ExecutionContext| {
            let mut total = parse_number(&args[0])?;
            for arg in &args[1..] {
                let divisor = parse_number(arg)?;
                if divisor == 0.0 {
                    return Err(EvalError::new("division by zero"));
                }
                total /= divisor;
            }
            Ok(total.to_string())
        }),
    )?;

    registry.register(
        "round",
        TagHandler::pure(Arity::exact(1), |args: &[String], _: &mut ExecutionContext| {
            Ok(parse_number(&args[0])?.round().to_string())
        }),
    )?;

    registry.register(
        "parseMs",
        TagHandler::pure(Arity::exact(1), |args: &[String], _: &mut ExecutionContext| {
            let raw = args[0].trim();
            let ms = raw.parse::<u64>().map_err(|_| {
                EvalError::new(format!("expected a millisecond count, got `{}`", raw))
            })?;
            Ok(format_duration_ms(ms))
        }),
    )?;

    Ok(())
}

/// A zero-argument pure tag reading one snapshot field
fn env_tag<F>(read: F) -> TagHandler
where
    F: Fn(&EnvSnapshot) -> String + Send + Sync + 'static,
{
    TagHandler::pure(Arity::none(), move |_: &[String], ctx: &mut ExecutionContext| {
        Ok(read(ctx.env()))
    })
}

fn install_environment(registry: &mut HandlerRegistry) -> Result<(), EngineError> {
    registry.register("ram", env_tag(|env| env.ram_used_mb.to_string()))?;
    registry.register("ramTotal", env_tag(|env| env.ram_total_mb.to_string()))?;
    registry.register("cpuModel", env_tag(|env| env.cpu_model.clone()))?;
    registry.register("cpuArch", env_tag(|env| env.cpu_arch.clone()))?;
    registry.register("cpuCores", env_tag(|env| env.cpu_cores.to_string()))?;
    registry.register("os", env_tag(|env| env.os_name.clone()))?;
    registry.register(
        "osUptime",
        env_tag(|env| format_duration_ms(env.os_uptime_secs.saturating_mul(1000))),
    )?;
    registry.register("ping", env_tag(|env| env.ping_ms.to_string()))?;
    // Raw milliseconds; pairs with $parseMs for display.
    registry.register("uptime", env_tag(|env| env.bot_uptime_ms.to_string()))?;
    registry.register("botName", env_tag(|env| env.bot_name.clone()))?;
    // Short alias for $botName.
    registry.register("bn", env_tag(|env| env.bot_name.clone()))?;
    registry.register("botVersion", env_tag(|env| env.bot_version.clone()))?;
    registry.register("botOwnerID", env_tag(|env| env.bot_owner_id.clone()))?;
    registry.register("shardCount", env_tag(|env| env.shard_count.to_string()))?;
    registry.register("commandCount", env_tag(|env| env.command_count.to_string()))?;
    Ok(())
}

fn install_caller(registry: &mut HandlerRegistry) -> Result<(), EngineError> {
    registry.register(
        "authorID",
        TagHandler::pure(Arity::none(), |_: &[String], ctx: &mut ExecutionContext| {
            Ok(ctx.caller.user_id.clone())
        }),
    )?;
    registry.register(
        "guildID",
        TagHandler::pure(Arity::none(), |_: &[String], ctx: &mut ExecutionContext| {
            Ok(ctx.caller.guild_id.clone().unwrap_or_default())
        }),
    )?;
    registry.register(
        "channelID",
        TagHandler::pure(Arity::none(), |_: &[String], ctx: &mut ExecutionContext| {
            Ok(ctx.caller.channel_id.clone().unwrap_or_default())
        }),
    )?;
    Ok(())
}

fn install_message(registry: &mut HandlerRegistry) -> Result<(), EngineError> {
    registry.register(
        "title",
        TagHandler::directive(Arity::exact(1), |args: &[String], ctx: &mut ExecutionContext| {
            ctx.message_mut().title = Some(args[0].trim().to_string());
            Ok(Control::Continue)
        }),
    )?;

    registry.register(
        "description",
        TagHandler::directive(Arity::exact(1), |args: &[String], ctx: &mut ExecutionContext| {
            ctx.message_mut().description = Some(args[0].trim().to_string());
            Ok(Control::Continue)
        }),
    )?;

    registry.register(
        "color",
        TagHandler::directive(Arity::exact(1), |args: &[String], ctx: &mut ExecutionContext| {
            let color = args[0]
                .trim()
                .parse::<Color>()
                .map_err(|err| EvalError::new(err.to_string()))?;
            ctx.message_mut().color = Some(color);
            Ok(Control::Continue)
        }),
    )?;

    registry.register(
        "addActionRow",
        TagHandler::directive(Arity::none(), |_: &[String], ctx: &mut ExecutionContext| {
            let message = ctx.message_mut();
            if message.rows.len() >= MAX_ACTION_ROWS {
                return Err(EvalError::new(format!(
                    "a message holds at most {} action rows",
                    MAX_ACTION_ROWS
                )));
            }
            message.rows.push(ActionRow::default());
            Ok(Control::Continue)
        }),
    )?;

    registry.register(
        "addButton",
        TagHandler::directive(Arity::range(3, 4), |args: &[String], ctx: &mut ExecutionContext| {
            let style = args[2]
                .trim()
                .parse::<ButtonStyle>()
                .map_err(|err| EvalError::new(err.to_string()))?;
            let button = Button {
                id: args[0].trim().to_string(),
                label: args[1].trim().to_string(),
                style,
                emoji: args
                    .get(3)
                    .map(|emoji| emoji.trim().to_string())
                    .filter(|emoji| !emoji.is_empty()),
            };

            let row = ctx
                .message_mut()
                .current_row_mut()
                .ok_or_else(|| EvalError::new("no action row is open; use $addActionRow first"))?;
            if row.buttons.len() >= MAX_BUTTONS_PER_ROW {
                return Err(EvalError::new(format!(
                    "an action row holds at most {} buttons",
                    MAX_BUTTONS_PER_ROW
                )));
            }
            row.buttons.push(button);
            Ok(Control::Continue)
        }),
    )?;

    Ok(())
}

fn install_guards(registry: &mut HandlerRegistry) -> Result<(), EngineError> {
    registry.register(
        "onlyForUsers",
        TagHandler::directive(
            Arity::at_least(1),
            |args: &[String], ctx: &mut ExecutionContext| {
                // Empty arguments are skipped so templates can leave the
                // leading slot blank.
                let permitted = args
                    .iter()
                    .map(|arg| arg.trim())
                    .filter(|arg| !arg.is_empty())
                    .any(|id| id == ctx.caller.user_id);
                if permitted {
                    Ok(Control::Continue)
                } else {
                    Ok(Control::Abort)
                }
            },
        ),
    )?;
    Ok(())
}

fn install_command_sync(registry: &mut HandlerRegistry) -> Result<(), EngineError> {
    registry.register(
        "updateCommands",
        TagHandler::directive(Arity::none(), |_: &[String], ctx: &mut ExecutionContext| {
            ctx.sync_prefix_commands()?;
            Ok(Control::Continue)
        }),
    )?;
    registry.register(
        "updateApplicationCommands",
        TagHandler::directive(Arity::none(), |_: &[String], ctx: &mut ExecutionContext| {
            ctx.sync_application_commands()?;
            Ok(Control::Continue)
        }),
    )?;
    Ok(())
}

fn parse_number(raw: &str) -> Result<f64, EvalError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| EvalError::new(format!("expected a number, got `{}`", trimmed)))
}

/// Render a millisecond duration as `1d 2h 3m 4s`
///
/// Sub-second durations keep millisecond precision; longer ones drop it.
fn format_duration_ms(ms: u64) -> String {
    let total_secs = ms / 1000;
    if total_secs == 0 {
        return format!("{}ms", ms);
    }

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 || !parts.is_empty() {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || !parts.is_empty() {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", seconds));
    parts.join(" ")
}

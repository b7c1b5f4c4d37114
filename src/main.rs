//! tagscript CLI
//!
//! Usage:
//!   tagscript [OPTIONS] [FILE]
//!
//! Options:
//!   -s, --snapshot <FILE>  Environment snapshot (TOML format)
//!   -c, --caller <ID>      Caller user id for guard tags
//!   -t, --tags             List the registered tags
//!   --max-depth <N>        Maximum nested argument depth
//!   -h, --help             Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tagscript::{
    CallerIdentity, Engine, EngineConfig, EnvSnapshot, ExecutionContext, MessageDescriptor,
    Outcome,
};

#[derive(Parser)]
#[command(name = "tagscript")]
#[command(about = "Tag-based template expansion for chat bot commands")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Environment snapshot file (TOML format)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Caller user id checked by guard tags
    #[arg(short, long, default_value = "0")]
    caller: String,

    /// Maximum nested argument depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// List the registered tags and exit
    #[arg(short, long)]
    tags: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut engine = Engine::with_builtins();
    if let Some(max_depth) = cli.max_depth {
        engine = engine.with_config(EngineConfig::new().with_max_depth(max_depth));
    }

    if cli.tags {
        print_tags(&engine);
        return;
    }

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    // Load snapshot
    let snapshot = match &cli.snapshot {
        Some(path) => match EnvSnapshot::from_file(path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                eprintln!("Error loading snapshot '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EnvSnapshot::default(),
    };

    // Read input
    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let ctx = ExecutionContext::new(CallerIdentity::user(cli.caller), snapshot);
    match engine.evaluate(&source, ctx) {
        Ok(Outcome::Completed(message)) => {
            print!("{}", render_message(&message));
        }
        Ok(Outcome::Aborted) => {
            eprintln!("evaluation aborted by a guard tag; no message to send");
        }
        Err(e) => {
            eprintln!("{}", e.format(&source, &filename));
            std::process::exit(1);
        }
    }
}

/// Render a descriptor as plain text, one section per populated field
fn render_message(message: &MessageDescriptor) -> String {
    let mut out = String::new();

    let content = message.content.trim();
    if !content.is_empty() {
        out.push_str(content);
        out.push('\n');
    }
    if let Some(color) = message.color {
        out.push_str(&format!("color: {}\n", color));
    }
    if let Some(title) = &message.title {
        out.push_str(&format!("title: {}\n", title));
    }
    if let Some(description) = &message.description {
        out.push_str(&format!("description:\n{}\n", description));
    }
    for (i, row) in message.rows.iter().enumerate() {
        out.push_str(&format!("row {}:\n", i + 1));
        for button in &row.buttons {
            out.push_str(&format!("  [{}] {} ({:?}", button.id, button.label, button.style));
            if let Some(emoji) = &button.emoji {
                out.push_str(&format!(" {}", emoji));
            }
            out.push_str(")\n");
        }
    }

    out
}

fn print_tags(engine: &Engine) {
    let mut names: Vec<&str> = engine.tag_names().collect();
    names.sort_unstable();
    for name in names {
        println!("${}", name);
    }
}

fn print_intro() {
    println!(
        r#"tagscript - tag-based template expansion for chat bot commands

Templates mix literal text with tags:

    $title[System: $botName]
    $description[RAM: $round[$ram] / $round[$ramTotal] MB]
    $color[2196f3]

Evaluate a template file:

    tagscript stats.tag --snapshot metrics.toml

Or pipe one through stdin:

    echo '$sub[10;4]' | tagscript

Useful flags:

    -s, --snapshot <FILE>  environment snapshot (TOML)
    -c, --caller <ID>      caller user id for guard tags
    -t, --tags             list the registered tags

Run 'tagscript --help' for the complete reference."#
    );
}

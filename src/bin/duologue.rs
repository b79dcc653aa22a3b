//! Interactive chat with a locally hosted model.
//!
//! This binary provides a streaming REPL for an Ollama-compatible endpoint, with an autonomous
//! mode in which the model converses with a second persona of itself.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! duologue
//!
//! # Specify a model and endpoint
//! duologue --model mistral --endpoint http://gpu-box:11434/
//!
//! # Disable colors (useful for piping output)
//! duologue --no-color
//! ```
//!
//! Prompts and autonomous mode are read from `duologue.yaml` (or `--config <path>`).  Set
//! `DUOLOGUE_LOG=debug` for diagnostics and `DUOLOGUE_METRICS=<path>` to write counters on exit.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use biometrics::Collector;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use duologue::chat::{
    AutoStep, ChatArgs, ChatConfig, ChatSession, PlainTextRenderer, Renderer, report_error,
};
use duologue::{emit_biometrics, register_biometrics};

const LOG_ENV: &str = "DUOLOGUE_LOG";
const METRICS_ENV: &str = "DUOLOGUE_METRICS";

/// Main entry point for the duologue application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let collector = Collector::new();
    register_biometrics(&collector);

    let (args, _) = ChatArgs::from_command_line_relaxed("duologue [OPTIONS]");
    let (config, warnings) = ChatConfig::resolve(args);
    let use_color = config.use_color;

    let mut session = ChatSession::new(config);

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));
    let mut renderer = PlainTextRenderer::with_color_and_interrupt(use_color, interrupted.clone());
    for warning in &warnings {
        renderer.print_warning(&(), warning);
    }

    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    let mut rl = DefaultEditor::new()?;

    println!(
        "duologue (model: {}, endpoint: {})",
        session.model(),
        session.state().endpoint
    );
    println!("Type /help for commands, /bye to exit\n");

    while !session.is_cancelled() {
        // The interrupt flag stays raised across autonomous rounds so that Ctrl-C ends the mode.
        if session.is_autonomous() {
            if session.autonomous_step(&mut renderer).await == AutoStep::AwaitInput {
                let line = step_prompt(&mut rl);
                session.step_input(line.as_deref(), &mut renderer).await;
            }
            continue;
        }

        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        match rl.readline("You: ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                session.handle_line(line, &mut renderer).await;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                session.cancel();
            }
            Err(err) => {
                renderer.print_error(&(), &format!("Input error: {err}"));
                session.cancel();
            }
        }
    }

    if let Ok(path) = std::env::var(METRICS_ENV) {
        if let Err(err) = emit_biometrics(&collector, &path) {
            report_error(&mut renderer, &err);
        }
    }

    Ok(())
}

/// Reads the line typed at a step-mode pause; `None` on Ctrl-C or end of input.
fn step_prompt(rl: &mut DefaultEditor) -> Option<String> {
    match rl.readline("[Enter] continue, text to steer, /auto off to stop: ") {
        Ok(line) => {
            if !line.trim().is_empty() {
                let _ = rl.add_history_entry(line.trim());
            }
            Some(line)
        }
        Err(_) => None,
    }
}

//! Output rendering for chat streaming.
//!
//! This module provides the renderer trait the chat session writes through, and a plain-text
//! implementation for terminals.

use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// ANSI escape code for dim text (used for informational notices).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the assistant label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for warnings).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for green text (used for the agent label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

///////////////////////////////////////// Streaming /////////////////////////////////////////

/// Stream context information for renderer output.
pub trait StreamContext: Send + Sync {
    /// Display label for the stream, if any.
    fn label(&self) -> Option<&str> {
        None
    }
}

/// Which side of a conversation produced a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// The model answering the primary history.
    Assistant,
    /// The model answering the agent history in autonomous mode.
    Agent,
}

impl StreamContext for Speaker {
    fn label(&self) -> Option<&str> {
        match self {
            Speaker::Assistant => Some("Assistant"),
            Speaker::Agent => Some("Agent"),
        }
    }
}

impl StreamContext for () {}

/// Trait for rendering streaming output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send + Sync {
    /// Called before the first fragment of a response.
    fn start_response(&mut self, context: &dyn StreamContext) {
        _ = context;
    }

    /// Print a chunk of response text.
    ///
    /// This is called once per fragment, as soon as the fragment arrives.
    fn print_text(&mut self, context: &dyn StreamContext, text: &str);

    /// Print an error message.
    fn print_error(&mut self, context: &dyn StreamContext, error: &str);

    /// Print a warning that does not stop the current operation.
    fn print_warning(&mut self, context: &dyn StreamContext, warning: &str) {
        self.print_info(context, &format!("Warning: {warning}"));
    }

    /// Print an informational message.
    fn print_info(&mut self, context: &dyn StreamContext, info: &str);

    /// Called when a response is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self, context: &dyn StreamContext);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self, context: &dyn StreamContext) {
        _ = context;
    }

    /// Returns true if streaming should be interrupted.
    fn should_interrupt(&self) -> bool {
        false
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer outputs text directly to stdout with optional
/// ANSI escape codes for speaker labels, warnings, and errors.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    line_start: bool,
    interrupted: Option<Arc<AtomicBool>>,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            line_start: true,
            interrupted: None,
        }
    }

    /// Attaches an interrupt flag to the renderer.
    pub fn with_interrupt(mut self, interrupted: Arc<AtomicBool>) -> Self {
        self.interrupted = Some(interrupted);
        self
    }

    /// Creates a new PlainTextRenderer with specified color and interrupt flag.
    pub fn with_color_and_interrupt(use_color: bool, interrupted: Arc<AtomicBool>) -> Self {
        Self::with_color(use_color).with_interrupt(interrupted)
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn write(&mut self, text: &str) {
        print!("{text}");
        if let Some(last) = text.chars().last() {
            self.line_start = last == '\n';
        }
        self.flush();
    }

    fn ensure_line_start(&mut self) {
        if !self.line_start {
            self.write("\n");
        }
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_response(&mut self, context: &dyn StreamContext) {
        let Some(label) = context.label() else {
            return;
        };
        self.ensure_line_start();
        let color = if label == "Agent" {
            ANSI_GREEN
        } else {
            ANSI_CYAN
        };
        let label = self.styled(&format!("{ANSI_BOLD}{color}"), &format!("{label}:"));
        self.write(&format!("{label} "));
    }

    fn print_text(&mut self, _: &dyn StreamContext, text: &str) {
        self.write(text);
    }

    fn print_error(&mut self, _: &dyn StreamContext, error: &str) {
        self.ensure_line_start();
        eprintln!("{}", self.styled(ANSI_RED, &format!("Error: {error}")));
    }

    fn print_warning(&mut self, _: &dyn StreamContext, warning: &str) {
        self.ensure_line_start();
        eprintln!("{}", self.styled(ANSI_YELLOW, &format!("Warning: {warning}")));
    }

    fn print_info(&mut self, _: &dyn StreamContext, info: &str) {
        self.ensure_line_start();
        let info = self.styled(ANSI_DIM, info);
        self.write(&format!("{info}\n"));
    }

    fn finish_response(&mut self, _: &dyn StreamContext) {
        self.write("\n");
    }

    fn print_interrupted(&mut self, _: &dyn StreamContext) {
        self.ensure_line_start();
        self.write("[interrupted]\n");
    }

    fn should_interrupt(&self) -> bool {
        self.interrupted
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

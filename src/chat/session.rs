//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns both conversation histories,
//! dispatches slash commands, and drives interactive and autonomous rounds against the
//! current model.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::future::Future;
use std::time::{Duration, Instant};

use futures::StreamExt;
use url::Url;

use crate::chat::commands::{ChatCommand, help_text, parse_command};
use crate::chat::config::ChatConfig;
use crate::chat::transcript::{default_save_path, load_history, save_history, serialize_history};
use crate::client::ChatBackend;
use crate::error::{Error, Result};
use crate::observability::{
    AUTO_ROUNDS, CHAT_ROLLBACKS, CHAT_TURN_DURATION, CHAT_TURNS, SUMMARIES,
};
use crate::registry::ChatClientRegistry;
use crate::render::{Renderer, Speaker, StreamContext};
use crate::tokens::EstimatorRegistry;
use crate::types::{Message, MessageRole};

/// How often a pending request checks the interrupt flag.
const INTERRUPT_POLL: Duration = Duration::from_millis(100);

/// Opening line of an autonomous conversation when no direction is given.
pub const DEFAULT_GREETING: &str = "Hello! What would you like to talk about today?";

/// Prefix that marks operator-injected text in the agent history.
pub const DIRECTION_LABEL: &str = "direction: ";

/// System prompt for the one-shot summarization request.
pub const SUMMARY_INSTRUCTION: &str = "You summarize conversations. The user message is a \
conversation between a user and an assistant, encoded as a JSON array of messages. Write a \
concise summary that keeps the names, facts, decisions and open questions needed to continue \
the conversation. Reply with the summary only.";

/// Separator between the original system prompt and the generated summary.
pub const SUMMARY_HEADER: &str = "\n\nSummary of the conversation so far:\n";

/// What the driver loop should do after [`ChatSession::autonomous_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoStep {
    /// Run the next round.
    Continue,
    /// Step mode: read a line and hand it to [`ChatSession::step_input`] first.
    AwaitInput,
    /// Autonomous mode has ended; return to the interactive prompt.
    Stopped,
}

/// Process-wide state of one run.
///
/// Cancellation is shared with the interrupt handler, so it lives behind an `Arc`.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Name of the model used for every request.
    pub model: String,
    /// Address of the inference server.
    pub endpoint: Url,
    /// Whether the loop runs autonomous rounds.
    pub autonomous: bool,
    /// Whether autonomous mode pauses after each round.
    pub step: bool,
    cancelled: Arc<AtomicBool>,
}

impl SessionState {
    fn from_config(config: &ChatConfig) -> Self {
        Self {
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            autonomous: config.autonomous,
            step: config.step,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Requests that the main loop stop before its next round.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// The flag an interrupt handler can raise to cancel the session.
    pub fn cancellation(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

/// Size measurements of the primary history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The model used for the session.
    pub model: String,
    /// The endpoint the model is served from.
    pub endpoint: String,
    /// Byte length of the serialized primary history.
    pub bytes: usize,
    /// Number of user messages in the primary history.
    pub user_turns: usize,
    /// Estimated tokens of the serialized primary history; zero when no estimator is available.
    pub tokens: usize,
    /// False when the token estimate is a placeholder.
    pub estimator_available: bool,
    /// Number of messages in the primary history.
    pub message_count: usize,
    /// Number of messages in the agent history.
    pub agent_message_count: usize,
    /// Whether autonomous mode is on.
    pub autonomous: bool,
    /// Whether step mode is on.
    pub step: bool,
}

/// A chat session that manages conversation state and model interactions.
///
/// The session keeps the primary history (what the user sees and the model answers) and the
/// agent history (the second persona of autonomous mode).  Both start with a system message.
pub struct ChatSession {
    system_prompt: String,
    agent_prompt: String,
    state: SessionState,
    registry: ChatClientRegistry,
    estimators: EstimatorRegistry,
    history: Vec<Message>,
    agent_history: Vec<Message>,
    direction: Option<String>,
}

impl ChatSession {
    /// Creates a new chat session that talks to the configured endpoint.
    pub fn new(config: ChatConfig) -> Self {
        let registry = ChatClientRegistry::new(config.endpoint.clone());
        Self::with_registry(config, registry)
    }

    /// Creates a new chat session with a custom client registry.
    pub fn with_registry(config: ChatConfig, registry: ChatClientRegistry) -> Self {
        let state = SessionState::from_config(&config);
        Self {
            history: vec![Message::system(config.system_prompt.clone())],
            agent_history: vec![Message::system(config.agent_prompt.clone())],
            system_prompt: config.system_prompt,
            agent_prompt: config.agent_prompt,
            state,
            registry,
            estimators: EstimatorRegistry::new(),
            direction: None,
        }
    }

    /// Replaces the token estimators.
    pub fn with_estimators(mut self, estimators: EstimatorRegistry) -> Self {
        self.estimators = estimators;
        self
    }

    /// The primary history.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// The agent history used by autonomous mode.
    pub fn agent_history(&self) -> &[Message] {
        &self.agent_history
    }

    /// The session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns the current model.
    pub fn model(&self) -> &str {
        &self.state.model
    }

    /// The system prompt `forget` restores.
    pub fn original_system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Requests that the main loop stop.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Whether the loop should run autonomous rounds.
    pub fn is_autonomous(&self) -> bool {
        self.state.autonomous
    }

    /// Whether autonomous mode pauses after each round.
    pub fn is_step(&self) -> bool {
        self.state.step
    }

    /// Turns autonomous mode on, optionally steering it.
    pub fn enable_autonomous(&mut self, direction: Option<String>) {
        self.state.autonomous = true;
        self.set_direction(direction);
    }

    /// Turns autonomous mode off.  Both histories are kept.
    pub fn disable_autonomous(&mut self) {
        self.state.autonomous = false;
        self.direction = None;
    }

    /// Sets the direction consumed by the next autonomous round.  Blank text clears it.
    pub fn set_direction(&mut self, direction: Option<String>) {
        self.direction = direction
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
    }

    /// The direction waiting to be consumed, if any.
    pub fn pending_direction(&self) -> Option<&str> {
        self.direction.as_deref()
    }

    fn current_client(&mut self) -> Result<Arc<dyn ChatBackend>> {
        self.registry.get_or_create(&self.state.model)
    }

    ////////////////////////////////////// interactive rounds //////////////////////////////////////

    /// Runs one interactive round for a line of input.
    ///
    /// Blank lines do nothing, command lines are dispatched, and anything else is sent to the
    /// model.  Failures are reported through the renderer and never escape.
    pub async fn handle_line(&mut self, line: &str, renderer: &mut dyn Renderer) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if let Some(command) = parse_command(line) {
            self.execute(command, renderer).await;
            return;
        }
        if let Err(err) = self.send_streaming(line, renderer).await {
            report_error(renderer, &err);
        }
    }

    /// Sends a user message and streams the response.
    ///
    /// This method:
    /// 1. Adds the user message to history
    /// 2. Sends a streaming request to the current model
    /// 3. Renders response fragments as they arrive
    /// 4. Adds the complete assistant response to history
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.  The history is then exactly as it was before
    /// the call.
    pub async fn send_streaming(
        &mut self,
        user_input: &str,
        renderer: &mut dyn Renderer,
    ) -> Result<String> {
        let start = Instant::now();
        let client = self.current_client()?;
        let previous_len = self.history.len();

        self.history.push(Message::user(user_input));

        match stream_reply(client.as_ref(), &self.history, &Speaker::Assistant, renderer).await {
            Ok(reply) => {
                self.history.push(Message::assistant(reply.clone()));
                CHAT_TURNS.click();
                CHAT_TURN_DURATION.add(start.elapsed().as_secs_f64());
                Ok(reply)
            }
            Err(err) => {
                self.history.truncate(previous_len);
                CHAT_ROLLBACKS.click();
                tracing::debug!(error = %err, "rolled back failed turn");
                Err(err)
            }
        }
    }

    /////////////////////////////////////////// commands ///////////////////////////////////////////

    /// Executes a parsed command, reporting the outcome through the renderer.
    pub async fn execute(&mut self, command: ChatCommand, renderer: &mut dyn Renderer) {
        let context = ();
        match command {
            ChatCommand::Save(path) => match self.save(path.as_deref()) {
                Ok(path) => renderer.print_info(
                    &context,
                    &format!("Conversation saved to {}", path.display()),
                ),
                Err(err) => report_error(renderer, &err),
            },
            ChatCommand::Load(path) => match self.load_from(&path) {
                Ok(()) => renderer.print_info(
                    &context,
                    &format!(
                        "Loaded {} messages from {}",
                        self.history.len(),
                        path
                    ),
                ),
                Err(err) => report_error(renderer, &err),
            },
            ChatCommand::Stats => {
                let stats = self.stats();
                if !stats.estimator_available {
                    renderer.print_warning(
                        &context,
                        "token estimator unavailable; reporting 0 tokens",
                    );
                }
                renderer.print_info(&context, &describe_stats(&stats));
            }
            ChatCommand::Model(model) => match self.set_model(&model) {
                Ok(()) => {
                    renderer.print_info(&context, &format!("Model changed to: {}", self.model()))
                }
                Err(err) => report_error(renderer, &err),
            },
            ChatCommand::Forget => {
                self.forget();
                renderer.print_info(&context, "Conversation forgotten.");
            }
            ChatCommand::Summarize => match self.summarize().await {
                Ok(()) => renderer.print_info(&context, "Conversation summarized."),
                Err(err) => report_error(renderer, &err),
            },
            ChatCommand::System(prompt) => match self.set_system_prompt(&prompt) {
                Ok(()) => {
                    renderer.print_info(&context, &format!("System prompt set to: {prompt}"))
                }
                Err(err) => report_error(renderer, &err),
            },
            ChatCommand::Auto(direction) => {
                self.enable_autonomous(direction);
                renderer.print_info(
                    &context,
                    "Autonomous mode on. Press Ctrl-C or use /auto off to stop.",
                );
            }
            ChatCommand::AutoOff => {
                self.disable_autonomous();
                renderer.print_info(&context, "Autonomous mode off.");
            }
            ChatCommand::Help => {
                for line in help_text().lines() {
                    renderer.print_info(&context, &format!("    {line}"));
                }
            }
            ChatCommand::Bye => {
                self.cancel();
                renderer.print_info(&context, "Goodbye!");
            }
            ChatCommand::Unknown(name) => {
                renderer.print_error(
                    &context,
                    &format!("Unknown command: /{name} (type /help for a list)"),
                );
            }
            ChatCommand::Invalid(message) => {
                renderer.print_error(&context, &message);
            }
        }
    }

    /// Resets the conversation to the original system prompt.
    ///
    /// The agent history is reset to its prompt as well, and any pending direction is dropped.
    pub fn forget(&mut self) {
        self.history = vec![Message::system(self.system_prompt.clone())];
        self.agent_history = vec![Message::system(self.agent_prompt.clone())];
        self.direction = None;
    }

    /// Replaces the leading system message, or inserts one if the history does not start
    /// with a system message.
    pub fn set_system_prompt(&mut self, prompt: &str) -> Result<()> {
        if prompt.trim().is_empty() {
            return Err(Error::validation(
                "system prompt must not be empty",
                Some("system".to_string()),
            ));
        }
        let message = Message::system(prompt);
        match self.history.first() {
            Some(first) if first.is_system() => self.history[0] = message,
            _ => self.history.insert(0, message),
        }
        Ok(())
    }

    /// Changes the model used for responses, building its client if needed.
    pub fn set_model(&mut self, model: &str) -> Result<()> {
        let model = model.trim();
        if model.is_empty() {
            return Err(Error::validation(
                "model name must not be empty",
                Some("model".to_string()),
            ));
        }
        self.registry.get_or_create(model)?;
        self.state.model = model.to_string();
        Ok(())
    }

    /// Saves the primary history, to a timestamped file when `path` is `None`.
    ///
    /// Returns the path written.
    pub fn save(&self, path: Option<&str>) -> Result<PathBuf> {
        let path = match path {
            Some(path) => PathBuf::from(path),
            None => default_save_path()?,
        };
        self.save_to(&path)?;
        Ok(path)
    }

    /// Saves the primary history to the specified path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_history(path, &self.history)
    }

    /// Loads a history from disk, replacing the primary history.
    ///
    /// On any failure the current history is left untouched.
    pub fn load_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.history = load_history(path)?;
        Ok(())
    }

    /// Measures the primary history.
    pub fn stats(&mut self) -> SessionStats {
        let serialized = serialize_history(&self.history).unwrap_or_default();
        let estimator = self.estimators.for_model(&self.state.model);
        let tokens = estimator
            .as_ref()
            .map(|e| e.estimate(&serialized))
            .unwrap_or(0);
        SessionStats {
            model: self.state.model.clone(),
            endpoint: self.state.endpoint.to_string(),
            bytes: serialized.len(),
            user_turns: self
                .history
                .iter()
                .filter(|m| m.is_user())
                .count(),
            tokens,
            estimator_available: estimator.is_some(),
            message_count: self.history.len(),
            agent_message_count: self.agent_history.len(),
            autonomous: self.state.autonomous,
            step: self.state.step,
        }
    }

    /// Replaces the primary history with a single system message that carries the original
    /// system prompt followed by a model-written summary.
    ///
    /// On failure the history is unchanged.
    pub async fn summarize(&mut self) -> Result<()> {
        let client = self.current_client()?;
        let request = vec![
            Message::system(SUMMARY_INSTRUCTION),
            Message::user(serialize_history(&self.history)?),
        ];
        let summary = client.send(&request).await?;
        self.history = vec![Message::system(format!(
            "{}{SUMMARY_HEADER}{}",
            self.system_prompt,
            summary.trim()
        ))];
        SUMMARIES.click();
        Ok(())
    }

    ////////////////////////////////////// autonomous rounds ///////////////////////////////////////

    /// Runs one autonomous round and decides how the driver loop continues.
    ///
    /// Autonomous mode ends when the interrupt flag is raised before or during the round, or
    /// when the round fails for any reason.  Failures are reported and rolled back; the loop
    /// never retries a failed round on its own.
    pub async fn autonomous_step(&mut self, renderer: &mut dyn Renderer) -> AutoStep {
        if !self.state.autonomous {
            return AutoStep::Stopped;
        }
        if renderer.should_interrupt() {
            self.leave_autonomous(renderer);
            return AutoStep::Stopped;
        }
        if let Err(err) = self.autonomous_round(renderer).await {
            report_error(renderer, &err);
            self.leave_autonomous(renderer);
            return AutoStep::Stopped;
        }
        if renderer.should_interrupt() || !self.state.autonomous {
            self.leave_autonomous(renderer);
            return AutoStep::Stopped;
        }
        if self.state.step {
            AutoStep::AwaitInput
        } else {
            AutoStep::Continue
        }
    }

    /// Applies the line read at a step-mode pause.
    ///
    /// `None` (end of input or Ctrl-C) leaves autonomous mode, an empty line continues, a
    /// command line is executed, and any other text steers the next round.
    pub async fn step_input(&mut self, input: Option<&str>, renderer: &mut dyn Renderer) {
        let Some(input) = input.map(str::trim) else {
            self.leave_autonomous(renderer);
            return;
        };
        if input.is_empty() {
            return;
        }
        match parse_command(input) {
            Some(command) => self.execute(command, renderer).await,
            None => self.set_direction(Some(input.to_string())),
        }
    }

    fn leave_autonomous(&mut self, renderer: &mut dyn Renderer) {
        if self.state.autonomous {
            self.disable_autonomous();
            renderer.print_info(&(), "Autonomous mode off.");
        }
    }

    /// Runs one autonomous round.
    ///
    /// On first entry the conversation is seeded with the pending direction (or a greeting).  A
    /// direction given on a later round is injected into the agent history without a model
    /// call.  Otherwise the primary side answers, its reply becomes the agent's input, and the
    /// agent's reply becomes the primary side's next input.
    ///
    /// # Errors
    ///
    /// If a request fails, both histories are restored to their state at the start of the
    /// round and the error is returned.
    pub async fn autonomous_round(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        let primary_len = self.history.len();
        let agent_len = self.agent_history.len();

        let mut seeded_with = None;
        if self.history.iter().all(|m| m.is_system()) {
            let seed = self.direction.take();
            let text = seed.clone().unwrap_or_else(|| DEFAULT_GREETING.to_string());
            let opening = Message::user(text);
            renderer.print_info(&(), &format!("Opening: {}", opening.content));
            self.agent_history.push(opening.inverted());
            self.history.push(opening);
            seeded_with = Some(seed);
        } else if let Some(direction) = self.direction.take() {
            self.agent_history
                .push(Message::user(format!("{DIRECTION_LABEL}{direction}")));
            renderer.print_info(&(), &format!("Direction for the agent: {direction}"));
            return Ok(());
        }

        match self.exchange(renderer).await {
            Ok(()) => {
                AUTO_ROUNDS.click();
                Ok(())
            }
            Err(err) => {
                self.history.truncate(primary_len);
                self.agent_history.truncate(agent_len);
                if let Some(seed) = seeded_with {
                    self.direction = seed;
                }
                CHAT_ROLLBACKS.click();
                tracing::debug!(error = %err, "rolled back failed autonomous round");
                Err(err)
            }
        }
    }

    async fn exchange(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        let client = self.current_client()?;

        // A primary history that already ends in a reply (e.g. after interactive turns) hands
        // that reply to the agent instead of asking for another one.
        let primary_reply = match self.history.last() {
            Some(last) if last.role == MessageRole::Assistant => last.clone(),
            _ => {
                let reply =
                    stream_reply(client.as_ref(), &self.history, &Speaker::Assistant, renderer)
                        .await?;
                let reply = Message::assistant(reply);
                self.history.push(reply.clone());
                reply
            }
        };

        self.agent_history.push(primary_reply.inverted());
        let agent_reply =
            stream_reply(client.as_ref(), &self.agent_history, &Speaker::Agent, renderer).await?;
        let agent_reply = Message::assistant(agent_reply);
        self.history.push(agent_reply.inverted());
        self.agent_history.push(agent_reply);
        Ok(())
    }
}

/// Streams a reply for `history`, printing each fragment as it arrives.
///
/// Returns the concatenation of the fragments.  The renderer's interrupt flag is polled while
/// waiting for the response and for every fragment; a raised flag aborts the stream.
pub async fn stream_reply(
    client: &dyn ChatBackend,
    history: &[Message],
    context: &dyn StreamContext,
    renderer: &mut dyn Renderer,
) -> Result<String> {
    let Some(stream) = until_interrupted(client.stream(history), renderer).await else {
        renderer.print_interrupted(context);
        return Err(Error::abort("request interrupted"));
    };
    let mut stream = stream?;
    renderer.start_response(context);
    let mut reply = String::new();
    loop {
        let fragment = match until_interrupted(stream.next(), renderer).await {
            Some(Some(fragment)) if !renderer.should_interrupt() => fragment,
            Some(None) => break,
            _ => {
                renderer.print_interrupted(context);
                return Err(Error::abort("response interrupted"));
            }
        };
        match fragment {
            Ok(fragment) => {
                renderer.print_text(context, &fragment);
                reply.push_str(&fragment);
            }
            Err(err) => {
                renderer.finish_response(context);
                return Err(err);
            }
        }
    }
    renderer.finish_response(context);
    Ok(reply)
}

/// Awaits `future` unless the renderer's interrupt flag is raised first.
async fn until_interrupted<F: Future>(future: F, renderer: &dyn Renderer) -> Option<F::Output> {
    tokio::pin!(future);
    loop {
        tokio::select! {
            output = &mut future => return Some(output),
            _ = tokio::time::sleep(INTERRUPT_POLL) => {
                if renderer.should_interrupt() {
                    return None;
                }
            }
        }
    }
}

/// Reports an error and, when there is one, a hint for fixing it.
pub fn report_error(renderer: &mut dyn Renderer, err: &Error) {
    renderer.print_error(&(), &err.to_string());
    if let Some(guidance) = err.guidance() {
        renderer.print_info(&(), &guidance);
    }
}

/// Formats statistics for display.
pub fn describe_stats(stats: &SessionStats) -> String {
    let mut out = String::from("    Session Statistics:\n");
    out.push_str(&format!("      Model: {}\n", stats.model));
    out.push_str(&format!("      Endpoint: {}\n", stats.endpoint));
    out.push_str(&format!("      Messages: {}\n", stats.message_count));
    out.push_str(&format!("      User turns: {}\n", stats.user_turns));
    out.push_str(&format!("      Size: {} bytes\n", stats.bytes));
    out.push_str(&format!("      Estimated tokens: {}\n", stats.tokens));
    out.push_str(&format!(
        "      Autonomous: {} (step: {}, agent messages: {})",
        on_off(stats.autonomous),
        on_off(stats.step),
        stats.agent_message_count
    ));
    out
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ChatSession {
        ChatSession::new(ChatConfig::new().with_system_prompt("Be helpful."))
    }

    #[test]
    fn new_session_has_system_messages() {
        let session = session();
        assert_eq!(session.history(), &[Message::system("Be helpful.")]);
        assert_eq!(session.agent_history(), &[Message::system("")]);
        assert_eq!(session.model(), "llama3.2");
        assert!(!session.is_cancelled());
    }

    #[test]
    fn forget_restores_original_prompt() {
        let mut session = session();
        session.history.push(Message::user("a"));
        session.history.push(Message::assistant("b"));
        session.set_system_prompt("Changed.").unwrap();
        session.forget();
        assert_eq!(session.history(), &[Message::system("Be helpful.")]);
        session.forget();
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn system_prompt_replaces_or_inserts() {
        let mut session = session();
        session.set_system_prompt("X").unwrap();
        session.set_system_prompt("Y").unwrap();
        assert_eq!(session.history(), &[Message::system("Y")]);

        session.history = vec![Message::user("hi")];
        session.set_system_prompt("Z").unwrap();
        assert_eq!(
            session.history(),
            &[Message::system("Z"), Message::user("hi")]
        );

        assert!(session.set_system_prompt("   ").unwrap_err().is_validation());
        assert_eq!(session.history()[0], Message::system("Z"));
    }

    #[test]
    fn set_model_rejects_blank() {
        let mut session = session();
        assert!(session.set_model("  ").unwrap_err().is_validation());
        assert_eq!(session.model(), "llama3.2");
        session.set_model(" phi3 ").unwrap();
        assert_eq!(session.model(), "phi3");
    }

    #[test]
    fn cancellation_is_shared() {
        let session = session();
        let flag = session.state().cancellation();
        flag.store(true, Ordering::Relaxed);
        assert!(session.is_cancelled());
    }

    #[test]
    fn direction_is_trimmed() {
        let mut session = session();
        session.enable_autonomous(Some("  ".to_string()));
        assert!(session.is_autonomous());
        assert_eq!(session.pending_direction(), None);
        session.set_direction(Some(" talk ".to_string()));
        assert_eq!(session.pending_direction(), Some("talk"));
        session.disable_autonomous();
        assert!(!session.is_autonomous());
        assert_eq!(session.pending_direction(), None);
    }

    #[test]
    fn stats_description() {
        let stats = SessionStats {
            model: "m".to_string(),
            endpoint: "http://localhost:11434/".to_string(),
            bytes: 10,
            user_turns: 2,
            tokens: 0,
            estimator_available: false,
            message_count: 5,
            agent_message_count: 1,
            autonomous: false,
            step: true,
        };
        let text = describe_stats(&stats);
        assert!(text.contains("User turns: 2"));
        assert!(text.contains("Size: 10 bytes"));
        assert!(text.contains("Estimated tokens: 0"));
        assert!(text.contains("step: on"));
    }
}

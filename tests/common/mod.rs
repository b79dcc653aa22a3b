//! Shared fixtures: a scripted backend and a renderer that records what it is shown.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::{future, stream};
use url::Url;

use duologue::chat::{ChatConfig, ChatSession, Renderer, StreamContext};
use duologue::{
    ChatBackend, ChatClientRegistry, ClientFactory, Error, FragmentStream, Message, Result,
};

/// One scripted answer from the fake endpoint.
#[derive(Clone, Debug)]
pub enum Reply {
    /// The request succeeds and yields these fragments.
    Fragments(Vec<&'static str>),
    /// The request fails before any fragment.
    Fail(Error),
    /// The stream yields these fragments and then fails.
    FailAfter(Vec<&'static str>, Error),
    /// The request never completes, like a server still loading the model.
    Stall,
    /// The response starts but no fragment ever arrives.
    Hang,
}

impl Reply {
    pub fn text(text: &'static str) -> Self {
        Reply::Fragments(vec![text])
    }

    pub fn refused() -> Self {
        Reply::Fail(Error::connection("connection refused", None))
    }
}

/// Script and call log shared by every backend a [`ScriptedFactory`] builds.
#[derive(Default)]
pub struct Script {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(String, Vec<Message>)>>,
    built: Mutex<Vec<String>>,
}

impl Script {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        let script = Self::default();
        script.replies.lock().unwrap().extend(replies);
        Arc::new(script)
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Every request made so far: the model and the history it was sent.
    pub fn calls(&self) -> Vec<(String, Vec<Message>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Models a backend was built for, in order.
    pub fn built(&self) -> Vec<String> {
        self.built.lock().unwrap().clone()
    }

    fn next(&self, model: &str, history: &[Message]) -> Reply {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), history.to_vec()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Fail(Error::bad_request("script exhausted")))
    }
}

pub struct ScriptedBackend {
    model: String,
    script: Arc<Script>,
}

#[async_trait::async_trait]
impl ChatBackend for ScriptedBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, history: &[Message]) -> Result<String> {
        match self.script.next(&self.model, history) {
            Reply::Fragments(fragments) => Ok(fragments.concat()),
            Reply::Fail(err) | Reply::FailAfter(_, err) => Err(err),
            Reply::Stall | Reply::Hang => future::pending().await,
        }
    }

    async fn stream(&self, history: &[Message]) -> Result<FragmentStream> {
        let items: Vec<Result<String>> = match self.script.next(&self.model, history) {
            Reply::Fragments(fragments) => {
                fragments.into_iter().map(|f| Ok(f.to_string())).collect()
            }
            Reply::Fail(err) => return Err(err),
            Reply::Stall => return future::pending().await,
            Reply::Hang => return Ok(Box::pin(stream::pending())),
            Reply::FailAfter(fragments, err) => fragments
                .into_iter()
                .map(|f| Ok(f.to_string()))
                .chain(std::iter::once(Err(err)))
                .collect(),
        };
        Ok(Box::pin(stream::iter(items)))
    }
}

pub struct ScriptedFactory {
    script: Arc<Script>,
}

impl ScriptedFactory {
    pub fn new(script: Arc<Script>) -> Self {
        Self { script }
    }
}

impl ClientFactory for ScriptedFactory {
    fn build(&self, _: &Url, model: &str) -> Result<Arc<dyn ChatBackend>> {
        self.script.built.lock().unwrap().push(model.to_string());
        Ok(Arc::new(ScriptedBackend {
            model: model.to_string(),
            script: Arc::clone(&self.script),
        }))
    }
}

pub fn endpoint() -> Url {
    Url::parse("http://localhost:11434/").unwrap()
}

pub fn registry(script: &Arc<Script>) -> ChatClientRegistry {
    ChatClientRegistry::with_factory(endpoint(), ScriptedFactory::new(Arc::clone(script)))
}

pub fn session(config: ChatConfig, script: &Arc<Script>) -> ChatSession {
    ChatSession::with_registry(config, registry(script))
}

/// Records everything a session renders.
#[derive(Default)]
pub struct RecordingRenderer {
    pub text: String,
    pub labels: Vec<String>,
    pub info: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub interrupted: usize,
    /// Raise the interrupt flag once this many fragments have been printed.
    pub interrupt_after: Option<usize>,
    fragments: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupting_after(fragments: usize) -> Self {
        Self {
            interrupt_after: Some(fragments),
            ..Self::default()
        }
    }

    pub fn saw_info(&self, needle: &str) -> bool {
        self.info.iter().any(|line| line.contains(needle))
    }

    pub fn saw_error(&self, needle: &str) -> bool {
        self.errors.iter().any(|line| line.contains(needle))
    }
}

impl Renderer for RecordingRenderer {
    fn start_response(&mut self, context: &dyn StreamContext) {
        if let Some(label) = context.label() {
            self.labels.push(label.to_string());
        }
    }

    fn print_text(&mut self, _: &dyn StreamContext, text: &str) {
        self.fragments += 1;
        self.text.push_str(text);
    }

    fn print_error(&mut self, _: &dyn StreamContext, error: &str) {
        self.errors.push(error.to_string());
    }

    fn print_warning(&mut self, _: &dyn StreamContext, warning: &str) {
        self.warnings.push(warning.to_string());
    }

    fn print_info(&mut self, _: &dyn StreamContext, info: &str) {
        self.info.push(info.to_string());
    }

    fn finish_response(&mut self, _: &dyn StreamContext) {}

    fn print_interrupted(&mut self, _: &dyn StreamContext) {
        self.interrupted += 1;
    }

    fn should_interrupt(&self) -> bool {
        self.interrupt_after
            .is_some_and(|after| self.fragments >= after)
    }
}

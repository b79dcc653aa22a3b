//! Chat application module for conversations with a locally hosted model.
//!
//! This module provides the interactive loop's building blocks.  It supports:
//!
//! - Streaming responses with real-time display and rollback on failure
//! - Slash commands for session control
//! - An autonomous mode in which the model converses with a second persona
//! - Saving, loading, measuring and summarizing the conversation
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and the YAML settings file
//! - [`session`]: Conversation state, rounds and command dispatch
//! - [`commands`]: Slash command parsing
//! - [`transcript`]: On-disk conversation format

mod commands;
mod config;
mod session;
mod transcript;

pub use crate::render::{PlainTextRenderer, Renderer, Speaker, StreamContext};
pub use commands::{COMMAND_PREFIX, ChatCommand, help_text, parse_command, split_command};
pub use config::{
    ChatArgs, ChatConfig, ConfigFile, DEFAULT_CONFIG_FILE, DEFAULT_MODEL, parse_endpoint,
};
pub use session::{
    AutoStep, ChatSession, DEFAULT_GREETING, DIRECTION_LABEL, SUMMARY_HEADER, SUMMARY_INSTRUCTION,
    SessionState, SessionStats, describe_stats, report_error, stream_reply,
};
pub use transcript::{default_save_path, load_history, save_history, serialize_history};

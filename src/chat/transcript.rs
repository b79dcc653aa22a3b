//! Reading and writing conversation histories.
//!
//! A history is stored as a pretty-printed JSON array of `{role, content}` objects, the same
//! shape that is sent to the model.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};
use crate::types::Message;
use crate::utils::time::now_slug;

/// Serialize a history in compact form, as used for measuring and summarizing it.
pub fn serialize_history(history: &[Message]) -> Result<String> {
    serde_json::to_string(history)
        .map_err(|err| Error::serialization("failed to serialize history", Some(Box::new(err))))
}

/// File name used by `/save` when none is given: `conversation-YYYYMMDD-HHMMSS.json`.
pub fn default_save_path() -> Result<PathBuf> {
    Ok(PathBuf::from(format!("conversation-{}.json", now_slug()?)))
}

/// Saves a history to the specified path.
pub fn save_history<P: AsRef<Path>>(path: P, history: &[Message]) -> Result<()> {
    let file = File::create(path.as_ref())
        .map_err(|err| Error::io("failed to create history file", err))?;
    let mut writer = BufWriter::new(file);
    to_writer_pretty(&mut writer, history).map_err(|err| {
        Error::serialization("failed to serialize history", Some(Box::new(err)))
    })?;
    writer
        .flush()
        .map_err(|err| Error::io("failed to write history file", err))
}

/// Loads a history from disk.
///
/// A file holding `null` or an empty array is rejected so that loading can never leave the
/// session without messages.
pub fn load_history<P: AsRef<Path>>(path: P) -> Result<Vec<Message>> {
    let file = File::open(path.as_ref())
        .map_err(|err| Error::io("failed to open history file", err))?;
    let reader = BufReader::new(file);
    let history: Option<Vec<Message>> = from_reader(reader)
        .map_err(|err| Error::serialization("failed to parse history", Some(Box::new(err))))?;
    match history {
        None => Err(Error::validation("history file contains null", None)),
        Some(history) if history.is_empty() => {
            Err(Error::validation("history file contains no messages", None))
        }
        Some(history) => Ok(history),
    }
}

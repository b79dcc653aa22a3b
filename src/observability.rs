use std::fs::File;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use biometrics::{Collector, Counter, Moments, PlainTextEmitter};

use crate::error::{Error, Result};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("duologue.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("duologue.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("duologue.client.request_duration_seconds");
pub(crate) static CLIENTS_BUILT: Counter = Counter::new("duologue.registry.clients_built");

pub(crate) static STREAM_FRAGMENTS: Counter = Counter::new("duologue.stream.fragments");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("duologue.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("duologue.stream.bytes");

pub(crate) static CHAT_TURNS: Counter = Counter::new("duologue.chat.turns");
pub(crate) static CHAT_ROLLBACKS: Counter = Counter::new("duologue.chat.rollbacks");
pub(crate) static CHAT_TURN_DURATION: Moments =
    Moments::new("duologue.chat.turn_duration_seconds");
pub(crate) static AUTO_ROUNDS: Counter = Counter::new("duologue.auto.rounds");
pub(crate) static SUMMARIES: Counter = Counter::new("duologue.chat.summaries");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: &Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_counter(&CLIENTS_BUILT);

    collector.register_counter(&STREAM_FRAGMENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);

    collector.register_counter(&CHAT_TURNS);
    collector.register_counter(&CHAT_ROLLBACKS);
    collector.register_moments(&CHAT_TURN_DURATION);
    collector.register_counter(&AUTO_ROUNDS);
    collector.register_counter(&SUMMARIES);
}

/// Write one reading of every registered sensor to `path`, one per line.
pub fn emit_biometrics<P: AsRef<Path>>(collector: &Collector, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|err| Error::io(format!("failed to create {}", path.display()), err))?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut emitter = PlainTextEmitter::new(file);
    collector
        .emit(&mut emitter, now)
        .map_err(|err| Error::io("failed to write biometrics", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_registered_sensors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.txt");
        let collector = Collector::new();
        register_biometrics(&collector);
        CHAT_TURNS.click();

        emit_biometrics(&collector, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("duologue.chat.turns"));
        assert!(text.contains("duologue.client.request_duration_seconds"));
    }
}

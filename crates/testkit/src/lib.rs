#![warn(missing_docs)]
//! Shared fakes and fixtures for router tests.

mod fakes;
mod fixtures;

use anyhow::Result;
use overflow_core::PlayerId;
use overflow_router::{HookKind, RouteOutcome};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use fakes::*;
pub use fixtures::*;

/// One routing decision captured by a test run.
#[derive(Debug, Serialize)]
pub struct OutcomeRecord {
    /// Sequence number within the run.
    pub seq: u64,
    /// Player the event concerned.
    pub player: PlayerId,
    /// Hook that fired, if the decision came from an event.
    pub hook: Option<HookKind>,
    /// Terminal state of the attempt.
    pub outcome: RouteOutcome,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            file: File::create(path)?,
        })
    }

    /// Append a record to the log.
    pub fn write(&mut self, record: &OutcomeRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overflow_router::RejectReason;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn jsonl_sink_writes_one_line_per_record() {
        let path = std::env::temp_dir().join(format!(
            "overflow-outcomes-{}.jsonl",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let mut sink = JsonlSink::create(&path).expect("sink create");
        sink.write(&OutcomeRecord {
            seq: 0,
            player: PlayerId(5),
            hook: Some(HookKind::ItemPickup),
            outcome: RouteOutcome::Overflowed { moved: 50 },
        })
        .expect("write succeeds");
        sink.write(&OutcomeRecord {
            seq: 1,
            player: PlayerId(5),
            hook: None,
            outcome: RouteOutcome::Rejected(RejectReason::CapacityExceeded),
        })
        .expect("write succeeds");
        drop(sink);

        let contents = fs::read_to_string(&path).expect("file readable");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("ItemPickup"));
        assert!(contents.contains("CapacityExceeded"));
        let _ = fs::remove_file(&path);
    }
}

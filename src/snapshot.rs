//! Interval-gated JSON snapshots of the coupled state.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;

use crate::coupling::FrameSnapshot;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct SnapshotRecord<'a> {
    written_at: String,
    #[serde(flatten)]
    frame: &'a FrameSnapshot,
}

pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval_steps: u64,
}

impl SnapshotWriter {
    /// `interval_steps == 0` disables snapshots entirely.
    pub fn new(output_dir: impl AsRef<Path>, interval_steps: u64) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval_steps,
        }
    }

    pub fn maybe_write(&self, frame: &FrameSnapshot) -> Result<Option<PathBuf>, SnapshotError> {
        if self.interval_steps == 0 || frame.step % self.interval_steps != 0 {
            return Ok(None);
        }
        let dir = self.output_dir.join(&frame.scenario);
        fs::create_dir_all(&dir)?;
        let file_path = dir.join(format!("step_{:06}.json", frame.step));
        let record = SnapshotRecord {
            written_at: chrono::Utc::now().to_rfc3339(),
            frame,
        };
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&file_path, json)?;
        Ok(Some(file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coupling::Census;

    fn frame(step: u64) -> FrameSnapshot {
        FrameSnapshot {
            scenario: "test".to_string(),
            step,
            days_elapsed: step as f64,
            rows: 2,
            cols: 2,
            state_label: "head_m",
            state: vec![1.0, 2.0, 3.0, 4.0],
            census: Census::default(),
            markers: Vec::new(),
        }
    }

    #[test]
    fn off_interval_steps_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 5);
        assert!(writer.maybe_write(&frame(3)).unwrap().is_none());
        assert!(writer.maybe_write(&frame(5)).unwrap().is_some());
    }

    #[test]
    fn interval_zero_disables_snapshots() {
        let temp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 0);
        assert!(writer.maybe_write(&frame(10)).unwrap().is_none());
    }

    #[test]
    fn written_file_carries_scenario_and_state() {
        let temp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 1);
        let path = writer.maybe_write(&frame(7)).unwrap().unwrap();
        assert!(path.ends_with("test/step_000007.json"));
        let data = fs::read_to_string(path).unwrap();
        assert!(data.contains("\"scenario\": \"test\""));
        assert!(data.contains("\"state_label\": \"head_m\""));
        assert!(data.contains("written_at"));
    }
}

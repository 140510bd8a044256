//! Result file writer.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::orchestrator::{AttemptError, AttemptResult};

/// Writes the raw text of the winning event record to a fixed path.
#[derive(Debug, Clone)]
pub struct ResultSink {
    path: PathBuf,
}

impl ResultSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the result file with `text`, byte for byte.
    ///
    /// The write goes to a sibling temp file that is then renamed over the
    /// target, so a reader never sees a half-written result.
    pub fn save(&self, text: &str) -> AttemptResult<()> {
        self.atomic_write(text)
            .map_err(|e| AttemptError::sink(&self.path, e))
    }

    fn atomic_write(&self, text: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(text.as_bytes())?;
            file.sync_all()
        });
        let result = written.and_then(|()| fs::rename(&temp_path, &self.path));
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_text_verbatim() {
        let dir = tempdir().unwrap();
        let sink = ResultSink::new(dir.path().join("result.txt"));

        let text = "event: data\ndata: {\"path\":\"x\"}";
        sink.save(text).unwrap();

        assert_eq!(fs::read_to_string(sink.path()).unwrap(), text);
    }

    #[test]
    fn overwrites_previous_result() {
        let dir = tempdir().unwrap();
        let sink = ResultSink::new(dir.path().join("result.txt"));

        sink.save("a much longer first result").unwrap();
        sink.save("short").unwrap();

        assert_eq!(fs::read_to_string(sink.path()).unwrap(), "short");
        assert!(!dir.path().join("result.txt.tmp").exists());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let sink = ResultSink::new(dir.path().join("out").join("nested").join("result.txt"));

        sink.save("ok").unwrap();
        assert!(sink.path().exists());
    }

    #[test]
    fn write_failure_is_sink_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let sink = ResultSink::new(blocker.join("result.txt"));

        let err = sink.save("x").unwrap_err();
        assert!(matches!(err, AttemptError::Sink { .. }));
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("result.txt");
        fs::create_dir(&target).unwrap();
        let sink = ResultSink::new(&target);

        let err = sink.save("x").unwrap_err();
        assert!(matches!(err, AttemptError::Sink { .. }));
        assert!(!dir.path().join("result.txt.tmp").exists());
        assert!(target.is_dir());
    }
}

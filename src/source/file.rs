//! File source with live tailing support.
//!
//! [`FileTailer`] remembers how far it has read and only hands out complete
//! lines, so a writer caught mid-line is picked up on the next poll.
//! [`spawn_file_source`] runs a tailer on its own thread and feeds the shared
//! model.

use super::line_buffer::decode_line;
use super::{SourceHandle, SourceStats};
use crate::model::{InputError, SharedModel, SourceGroup};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Incremental reader for a growing trace file.
#[derive(Debug)]
pub struct FileTailer {
    path: PathBuf,
    position: u64,
    file: BufReader<File>,
}

impl FileTailer {
    /// Open `path` positioned at its start.
    ///
    /// # Errors
    ///
    /// Returns `InputError::FileNotFound` if the file does not exist.
    /// Returns `InputError::Io` for other I/O errors.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InputError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            position: 0,
            file: BufReader::new(file),
        })
    }

    /// Path being tailed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read complete lines appended since the last call.
    ///
    /// A trailing line without its newline is left for a later call. If the
    /// file shrank (truncated and rewritten) reading restarts at the top.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Io` for I/O errors.
    pub fn read_new_lines(&mut self) -> Result<Vec<String>, InputError> {
        let len = self.file.get_ref().metadata()?.len();
        if len < self.position {
            warn!(path = %self.path.display(), "File truncated, rereading from start");
            self.position = 0;
        }
        self.file.seek(SeekFrom::Start(self.position))?;

        let mut lines = Vec::new();
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            let bytes_read = self.file.read_until(b'\n', &mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            if buffer.last() == Some(&b'\n') {
                lines.push(decode_line(&buffer[..buffer.len() - 1]));
                self.position += bytes_read as u64;
            } else {
                // partial line: position stays put
                break;
            }
        }
        Ok(lines)
    }

    /// Consume an unterminated final line, if the file ends with one.
    ///
    /// # Errors
    ///
    /// Returns `InputError::Io` for I/O errors.
    pub fn read_remainder(&mut self) -> Result<Option<String>, InputError> {
        self.file.seek(SeekFrom::Start(self.position))?;
        let mut rest = Vec::new();
        let read = self.file.read_to_end(&mut rest)?;
        if read == 0 {
            return Ok(None);
        }
        self.position += read as u64;
        Ok(Some(decode_line(&rest)))
    }
}

/// How a file source behaves at end of file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSourceOptions {
    /// Keep polling for appended lines after EOF.
    pub follow: bool,
    /// Delay between polls while following.
    pub poll_interval: Duration,
}

impl Default for FileSourceOptions {
    fn default() -> Self {
        Self {
            follow: false,
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Start a thread that feeds `path` into `model`.
///
/// Every file gets a fresh source group, a reopened journal included, so its
/// ids can never land on a lifeline another source owns.
///
/// The file is opened before the thread starts so a bad path fails here.
///
/// # Errors
///
/// Returns `InputError::FileNotFound` or `InputError::Io`.
pub fn spawn_file_source(
    path: impl AsRef<Path>,
    model: SharedModel,
    options: FileSourceOptions,
) -> Result<SourceHandle, InputError> {
    let tailer = FileTailer::new(path)?;
    let group = model.allocate_source_group();
    let stop = Arc::new(AtomicBool::new(false));
    let name = tailer.path().display().to_string();
    info!(path = %name, group = %group, follow = options.follow, "File source opened");

    let thread = {
        let group = group.clone();
        let stop = Arc::clone(&stop);
        thread::Builder::new()
            .name(format!("vizexec-file-{}", name))
            .spawn(move || tail(tailer, model, group, options, stop))?
    };
    Ok(SourceHandle::new(name, group, stop, thread))
}

fn tail(
    mut tailer: FileTailer,
    model: SharedModel,
    group: SourceGroup,
    options: FileSourceOptions,
    stop: Arc<AtomicBool>,
) -> SourceStats {
    let mut stats = SourceStats::default();
    while !stop.load(Ordering::Relaxed) {
        match tailer.read_new_lines() {
            Ok(lines) if !lines.is_empty() => {
                for line in &lines {
                    stats.record(&model.ingest(line, &group));
                }
                continue;
            }
            Ok(_) => {}
            Err(error) => {
                warn!(path = %tailer.path().display(), "File source failed: {}", error);
                break;
            }
        }
        if !options.follow {
            match tailer.read_remainder() {
                Ok(Some(line)) => stats.record(&model.ingest(&line, &group)),
                Ok(None) => {}
                Err(error) => {
                    warn!(path = %tailer.path().display(), "Final read failed: {}", error)
                }
            }
            break;
        }
        debug!(path = %tailer.path().display(), "Waiting for more data");
        thread::sleep(options.poll_interval);
    }
    info!(
        path = %tailer.path().display(),
        lines = stats.lines,
        rejected = stats.rejected,
        "File source finished"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(name: &str, content: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vizexec-file-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_is_reported() {
        let err = FileTailer::new("/definitely/not/here.log").unwrap_err();
        assert!(matches!(err, InputError::FileNotFound { .. }));
    }

    #[test]
    fn reads_complete_lines_and_holds_partial() {
        let path = temp_file("partial.log", b"CAL a 1 f\nRET a");
        let mut tailer = FileTailer::new(&path).unwrap();
        assert_eq!(tailer.read_new_lines().unwrap(), vec!["CAL a 1 f"]);
        assert_eq!(tailer.position(), 10);

        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b" 2\n").unwrap();
        assert_eq!(tailer.read_new_lines().unwrap(), vec!["RET a 2"]);
    }

    #[test]
    fn remainder_returns_unterminated_tail() {
        let path = temp_file("tail.log", b"CAL a 1 f\nTRM a");
        let mut tailer = FileTailer::new(&path).unwrap();
        tailer.read_new_lines().unwrap();
        assert_eq!(tailer.read_remainder().unwrap(), Some("TRM a".to_string()));
        assert_eq!(tailer.read_remainder().unwrap(), None);
    }

    #[test]
    fn truncation_restarts_from_top() {
        let path = temp_file("trunc.log", b"CAL a 1 f\nRET a 2\n");
        let mut tailer = FileTailer::new(&path).unwrap();
        assert_eq!(tailer.read_new_lines().unwrap().len(), 2);
        std::fs::write(&path, b"EVT a 3 x\n").unwrap();
        assert_eq!(tailer.read_new_lines().unwrap(), vec!["EVT a 3 x"]);
    }

    #[test]
    fn spawned_source_ingests_whole_file() {
        let path = temp_file("whole.log", b"# header\nCAL t1 1 main\nRET t1 2\nTRM t1");
        let model = SharedModel::default();
        let handle = spawn_file_source(&path, model.clone(), FileSourceOptions::default()).unwrap();
        let stats = handle.join();
        assert_eq!(stats.lines, 4);
        assert_eq!(stats.rejected, 0);
        let model = model.lock();
        assert_eq!(model.lifelines().len(), 1);
        assert!(model.lifelines()[0].is_terminated());
        assert_eq!(model.lifelines()[0].id().as_str(), "g1/t1");
    }

    #[test]
    fn reopened_journal_gets_its_own_group() {
        let path = temp_file("replay.log", b"CAL g1/t1 1 main\nCAL g1/t1 2 inner\n");
        let model = SharedModel::default();
        let live = model.allocate_source_group();
        let handle = spawn_file_source(&path, model.clone(), FileSourceOptions::default()).unwrap();
        assert_eq!(handle.group().as_str(), "g2");
        handle.join();

        model.ingest("CAL t1 3 live", &live);
        let model = model.lock();
        let ids: Vec<&str> = model.lifelines().iter().map(|l| l.id().as_str()).collect();
        assert_eq!(ids, vec!["g2/g1/t1", "g1/t1"]);
        assert_eq!(model.lifelines()[0].depth(), 2);
        assert_eq!(model.lifelines()[1].depth(), 1);
    }
}

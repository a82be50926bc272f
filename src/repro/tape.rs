use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Pane;
use crate::data::SessionMode;
use crate::error::BackendError;
use crate::quick_switch::SwitchTarget;
use crate::session::ReassignPolicy;

pub const TAPE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum TapeError {
    #[error("failed to access tape {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("tape header must be the first line (found on line {0})")]
    HeaderNotFirst(usize),

    #[error("missing tape header")]
    MissingHeader,

    #[error("unsupported tape schema version {0}")]
    UnsupportedVersion(u32),

    #[error("unknown workspace `{0}`")]
    UnknownWorkspace(String),

    #[error("unknown chat `{0}`")]
    UnknownSession(String),

    #[error("name `{0}` is used more than once")]
    DuplicateName(String),

    #[error("failed to capture fixture: {0}")]
    Capture(#[from] BackendError),
}

/// Starting data for a replay
///
/// Items are referred to by name everywhere in a tape; names must be unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TapeFixture {
    #[serde(default)]
    pub settings: TapeSettings,
    #[serde(default)]
    pub primary_target: SwitchTarget,
    pub workspaces: Vec<FixtureWorkspace>,
}

/// Navigation overrides; unset fields keep their defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapeSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub undo_window_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reassign_policy: Option<ReassignPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureWorkspace {
    pub name: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub is_remote: bool,
    /// Every mutation of this workspace is rejected by the backend
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fail: bool,
    #[serde(default)]
    pub sessions: Vec<FixtureSession>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureSession {
    pub name: String,
    #[serde(default)]
    pub mode: SessionMode,
    /// Seconds after the tape epoch the session was last active
    #[serde(default)]
    pub updated_s: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pinned: bool,
    /// Renames and mode changes of this session are rejected
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fail: bool,
}

fn default_branch() -> String {
    "main".to_string()
}

/// One user-level command; items are named, not identified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TapeCommand {
    SelectWorkspace { workspace: String },
    OpenSession { session: String },
    FocusSession { session: String },
    NewSession,
    ArchiveSession { session: String },
    ArchiveWorkspace { workspace: String },
    ArchiveSelectedSessions,
    ArchiveSelectedWorkspaces,
    Confirm,
    CancelConfirmation,
    Undo,
    TogglePin { session: String },
    PinSelected,
    AddToSplit { session: String },
    RemoveFromSplit { session: String },
    CloseSplit,
    Rename { session: String, name: String },
    ToggleMode { session: String },
    Activity { session: String },
    QuickSwitchPress {
        target: SwitchTarget,
        #[serde(default)]
        reverse: bool,
    },
    QuickSwitchRelease,
    QuickSwitchConfirm,
    QuickSwitchCancel,
    SwapTargets,
    ToggleSelection { pane: Pane, item: String },
    ShiftSelect { pane: Pane, item: String },
    SelectAll { pane: Pane },
    ClearSelection { pane: Pane },
    /// Record the hub state at this point
    Snapshot { label: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeEntry {
    pub seq: u64,
    /// Milliseconds since the tape started
    pub at_ms: u64,
    pub command: TapeCommand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TapeJsonlLine {
    Header {
        schema_version: u32,
        created_at_ms: u64,
        fixture: TapeFixture,
    },
    Entry {
        entry: TapeEntry,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tape {
    pub schema_version: u32,
    pub created_at_ms: u64,
    pub fixture: TapeFixture,
    pub entries: Vec<TapeEntry>,
}

impl Tape {
    pub fn new(fixture: TapeFixture) -> Self {
        Self {
            schema_version: TAPE_SCHEMA_VERSION,
            created_at_ms: now_ms(),
            fixture,
            entries: Vec::new(),
        }
    }

    /// Append a command at `at_ms`, numbering it after the last entry
    pub fn push(&mut self, at_ms: u64, command: TapeCommand) {
        let seq = self.entries.last().map_or(1, |e| e.seq + 1);
        self.entries.push(TapeEntry {
            seq,
            at_ms,
            command,
        });
    }

    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        let header = TapeJsonlLine::Header {
            schema_version: self.schema_version,
            created_at_ms: self.created_at_ms,
            fixture: self.fixture.clone(),
        };
        out.push_str(&serde_json::to_string(&header)?);
        out.push('\n');
        for entry in &self.entries {
            let line = TapeJsonlLine::Entry {
                entry: entry.clone(),
            };
            out.push_str(&serde_json::to_string(&line)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn write_jsonl_to_path(&self, path: &Path) -> Result<(), TapeError> {
        let io_err = |source| TapeError::Io {
            path: path.to_path_buf(),
            source,
        };
        let jsonl = self
            .to_jsonl()
            .map_err(|source| TapeError::Json { line: 0, source })?;
        std::fs::write(path, jsonl).map_err(io_err)
    }

    pub fn read_jsonl_from_path(path: &Path) -> Result<Self, TapeError> {
        let file = File::open(path).map_err(|source| TapeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            lines.push(line.map_err(|source| TapeError::Io {
                path: path.to_path_buf(),
                source,
            })?);
        }
        Self::parse_lines(lines.iter().map(String::as_str))
    }

    pub fn from_jsonl(contents: &str) -> Result<Self, TapeError> {
        Self::parse_lines(contents.lines())
    }

    fn parse_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Result<Self, TapeError> {
        let mut header: Option<(u32, u64, TapeFixture)> = None;
        let mut entries = Vec::new();

        for (idx, line) in lines.enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_no = idx + 1;
            let parsed: TapeJsonlLine = serde_json::from_str(line)
                .map_err(|source| TapeError::Json {
                    line: line_no,
                    source,
                })?;
            match parsed {
                TapeJsonlLine::Header {
                    schema_version,
                    created_at_ms,
                    fixture,
                } => {
                    if header.is_some() || !entries.is_empty() {
                        return Err(TapeError::HeaderNotFirst(line_no));
                    }
                    if schema_version != TAPE_SCHEMA_VERSION {
                        return Err(TapeError::UnsupportedVersion(schema_version));
                    }
                    header = Some((schema_version, created_at_ms, fixture));
                }
                TapeJsonlLine::Entry { entry } => {
                    if header.is_none() {
                        return Err(TapeError::MissingHeader);
                    }
                    entries.push(entry);
                }
            }
        }

        let (schema_version, created_at_ms, fixture) = header.ok_or(TapeError::MissingHeader)?;
        Ok(Self {
            schema_version,
            created_at_ms,
            fixture,
            entries,
        })
    }
}

/// Appends commands to a tape file as they happen
pub struct TapeWriter {
    started: std::time::Instant,
    seq: AtomicU64,
    writer: Mutex<BufWriter<File>>,
}

impl TapeWriter {
    /// Create `path` and write the header
    pub fn create(path: &Path, fixture: TapeFixture) -> Result<Self, TapeError> {
        let io_err = |source| TapeError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        let header = TapeJsonlLine::Header {
            schema_version: TAPE_SCHEMA_VERSION,
            created_at_ms: now_ms(),
            fixture,
        };
        let json =
            serde_json::to_string(&header).map_err(|source| TapeError::Json { line: 1, source })?;
        writeln!(writer, "{json}").map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        Ok(Self {
            started: std::time::Instant::now(),
            seq: AtomicU64::new(1),
            writer: Mutex::new(writer),
        })
    }

    /// Append `command`, stamped with the time since the writer was created
    pub fn record(&self, command: TapeCommand) -> io::Result<()> {
        let entry = TapeEntry {
            seq: self.seq.fetch_add(1, Ordering::SeqCst),
            at_ms: self.started.elapsed().as_millis() as u64,
            command,
        };
        let line = TapeJsonlLine::Entry { entry };
        let json = serde_json::to_string(&line).map_err(io::Error::other)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{json}")?;
        writer.flush()
    }
}

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixture() -> TapeFixture {
        TapeFixture {
            workspaces: vec![FixtureWorkspace {
                name: "alpha".into(),
                branch: "main".into(),
                is_remote: false,
                fail: false,
                sessions: vec![FixtureSession {
                    name: "one".into(),
                    mode: SessionMode::Agent,
                    updated_s: 5,
                    pinned: true,
                    fail: false,
                }],
            }],
            ..TapeFixture::default()
        }
    }

    #[test]
    fn test_tape_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape.jsonl");

        let mut tape = Tape::new(fixture());
        tape.push(0, TapeCommand::ArchiveSession {
            session: "one".into(),
        });
        tape.push(500, TapeCommand::Undo);
        tape.write_jsonl_to_path(&path).unwrap();

        let read = Tape::read_jsonl_from_path(&path).unwrap();
        assert_eq!(read, tape);
        assert_eq!(read.entries[1].seq, 2);
    }

    #[test]
    fn test_writer_appends_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape.jsonl");

        let writer = TapeWriter::create(&path, fixture()).unwrap();
        writer.record(TapeCommand::Undo).unwrap();
        writer
            .record(TapeCommand::QuickSwitchPress {
                target: SwitchTarget::Sessions,
                reverse: true,
            })
            .unwrap();

        let read = Tape::read_jsonl_from_path(&path).unwrap();
        assert_eq!(read.fixture, fixture());
        let seqs: Vec<_> = read.entries.iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn test_minimal_handwritten_tape() {
        let tape = Tape::from_jsonl(
            r#"
{"type":"header","schema_version":1,"created_at_ms":0,"fixture":{"workspaces":[{"name":"w","sessions":[{"name":"a"}]}]}}
{"type":"entry","entry":{"seq":1,"at_ms":20,"command":{"type":"quick_switch_press","target":"sessions"}}}
"#,
        )
        .unwrap();
        assert_eq!(tape.fixture.workspaces[0].branch, "main");
        assert_eq!(
            tape.entries[0].command,
            TapeCommand::QuickSwitchPress {
                target: SwitchTarget::Sessions,
                reverse: false
            }
        );
    }

    #[test]
    fn test_malformed_tapes_are_rejected() {
        assert!(matches!(Tape::from_jsonl(""), Err(TapeError::MissingHeader)));
        assert!(matches!(
            Tape::from_jsonl(r#"{"type":"entry","entry":{"seq":1,"at_ms":0,"command":{"type":"undo"}}}"#),
            Err(TapeError::MissingHeader)
        ));
        assert!(matches!(
            Tape::from_jsonl(r#"{"type":"header","schema_version":9,"created_at_ms":0,"fixture":{"workspaces":[]}}"#),
            Err(TapeError::UnsupportedVersion(9))
        ));
        assert!(matches!(
            Tape::from_jsonl("not json"),
            Err(TapeError::Json { line: 1, .. })
        ));
    }
}

//! Deterministic record and replay of navigation sessions
//!
//! A tape is a JSONL file: a header carrying the starting fixture, then one
//! named command per line. Replaying a tape needs no database or terminal.

pub mod record;
pub mod replay;
pub mod tape;

pub use record::{capture_fixture, Recorder};
pub use replay::{replay, LabeledSnapshot, ReplayReport, Replayer};
pub use tape::{Tape, TapeCommand, TapeEntry, TapeError, TapeFixture, TapeWriter};

//! Human-readable, timestamped transcript of a session and its offline JSON formatter.
//!
//! The raw per-stream logs stay the byte-exact record; the transcript decodes lines lossily
//! and is only meant for reading.

mod format;
mod writer;

pub use format::{default_output_path, format_line, format_transcript};
pub use writer::{open_transcript, spawn_transcript_writer, transcript_path};

//! # sonrs — Stratify Object Notation container engine
//!
//! Format guarantees:
//! - All numeric fields are little-endian; never negotiated
//! - Every record is self-checksummed: the four 32-bit words of a record
//!   sum to zero; corrupt records fail the read before any field is trusted
//! - Containers are forward-linked via `next_offset`; there is no separate
//!   index block and no in-memory index is ever built to read or edit one
//! - The writer's open-container stack is a fixed-capacity, caller-sized
//!   array — no heap allocation during a write sequence
//! - A handle carries a tamper-detection checksum, verified on every public
//!   operation

pub mod editor;
pub mod error;
pub mod handle;
pub mod json;
pub mod message;
pub mod path;
pub mod reader;
pub mod record;
pub mod sink;
pub mod writer;

pub use editor::SonEditor;
pub use error::{Result, SonError};
pub use reader::{SeekDirection, SonReader};
pub use record::{Record, SonHeader, ValueKind, HEADER_SIZE, RECORD_SIZE};
pub use sink::{BufferSink, DynSink, SinkDriver};
pub use writer::SonWriter;

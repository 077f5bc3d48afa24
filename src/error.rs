//! Error taxonomy for the SON container engine.
//!
//! Mirrors the original library's flat `son_err_t` enum: one error space for
//! the whole container lifecycle (open/write/read/edit/message), rather than
//! sixcy's per-component enums, since SON itself never split errors that way.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SonError {
    #[error("no root container has been opened")]
    NoRoot,

    #[error("failed to open underlying store: {0}")]
    OpenIo(#[source] std::io::Error),

    #[error("read failed: {0}")]
    ReadIo(#[source] std::io::Error),

    #[error("write failed: {0}")]
    WriteIo(#[source] std::io::Error),

    #[error("close failed: {0}")]
    CloseIo(#[source] std::io::Error),

    #[error("seek failed: {0}")]
    SeekIo(#[source] std::io::Error),

    #[error("record checksum did not sum to zero")]
    ReadChecksum,

    #[error("cannot append: container was never closed/sealed")]
    CannotAppend,

    #[error("cannot write: writer has no stack capacity")]
    CannotWrite,

    #[error("root record is not a valid object/array marker")]
    InvalidRoot,

    #[error("array index not found")]
    ArrayIndexNotFound,

    #[error("access string exceeds {max} bytes", max = crate::path::SON_ACCESS_MAX_USER_SIZE)]
    AccessTooLong,

    #[error("key not found")]
    KeyNotFound,

    #[error("back-patch stack overflow: container nesting exceeds configured depth")]
    StackOverflow,

    #[error("key is empty or malformed")]
    InvalidKey,

    #[error("value kind cannot be converted to the requested type")]
    CannotConvert,

    #[error("edit target kind does not match the new value's kind")]
    EditTypeMismatch,

    #[error("handle integrity checksum failed: tamper or corruption detected")]
    HandleChecksum,

    #[error("message transfer timed out")]
    MessageTimeout,

    #[error("message transport I/O error")]
    MessageIo,

    #[error("no message start marker found")]
    NoMessage,

    #[error("message buffer does not contain a complete message")]
    IncompleteMessage,

    #[error("container has no children")]
    NoChildren,
}

pub type Result<T> = std::result::Result<T, SonError>;

/// Tags a raw `std::io::Error` with which kind of operation produced it, so
/// a seek failure, a write failure, and a read failure surface as distinct
/// `SonError` variants instead of all funneling through one blanket
/// conversion.
pub trait IoResultExt<T> {
    fn open_io(self) -> Result<T>;
    fn read_io(self) -> Result<T>;
    fn write_io(self) -> Result<T>;
    fn seek_io(self) -> Result<T>;
    fn close_io(self) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn open_io(self) -> Result<T> {
        self.map_err(SonError::OpenIo)
    }

    fn read_io(self) -> Result<T> {
        self.map_err(SonError::ReadIo)
    }

    fn write_io(self) -> Result<T> {
        self.map_err(SonError::WriteIo)
    }

    fn seek_io(self) -> Result<T> {
        self.map_err(SonError::SeekIo)
    }

    fn close_io(self) -> Result<T> {
        self.map_err(SonError::CloseIo)
    }
}

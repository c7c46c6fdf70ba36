//! Error types for reading entity lumps.

use thiserror::Error;

use crate::header::LumpKind;

#[derive(Debug, Error)]
pub enum Error {
    /// The magic signature does not read as `IBSP`.
    #[error("header: not a recognized map file (magic {found:#010x})")]
    InvalidFormat { found: i32 },

    /// Fewer header bytes were available than the header layout needs.
    #[error("header: truncated, only {len} bytes available")]
    TruncatedHeader { len: usize },

    /// A directory entry resolves to a negative offset or has a negative length.
    #[error("lump directory: {kind:?} lump has invalid offset {offset} / length {length}")]
    InvalidLump {
        kind: LumpKind,
        offset: i64,
        length: i32,
    },

    #[error("lump: cannot seek to offset {offset}")]
    Seek {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// The stream ended before the declared lump length was read.
    #[error("lump: truncated at offset {offset}, expected {expected} bytes, found {found}")]
    TruncatedLump {
        offset: usize,
        expected: usize,
        found: usize,
    },

    #[error("entities: malformed classname on line {line}: {content:?}")]
    MalformedEntityLine { line: usize, content: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

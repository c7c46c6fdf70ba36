//! Reader for the entities lump of Quake 2 (`IBSP`) map files.
//!
//! The header is decoded in place, the entities lump is pulled from a seekable stream
//! and its text can be summarised into classname counts.

pub mod entities;
pub mod error;
pub mod header;
pub mod lump;
pub mod report;

pub use entities::{count_classnames, count_classnames_with, ClassnameCounts, MalformedLinePolicy};
pub use error::{Error, Result};
pub use header::{
    locate_entity_lump, locate_entity_lump_with, verify_header, Header, LumpDef, LumpKind,
    OffsetBase, BSP_VERSION, HEADER_LEN, LUMP_DEF_COUNT, MAGIC,
};
pub use lump::{extract_lump, read_header, EntityLump};
pub use report::{format_lump_table, format_raw, format_sorted_counts};

/// Read and parse settings
#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    /// How stored lump offsets map to file positions
    pub offset_base: OffsetBase,
    pub malformed_lines: MalformedLinePolicy,
}

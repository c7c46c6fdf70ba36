use std::borrow::Cow;
use std::io::{self, Read, Seek, SeekFrom};

use log::{debug, warn};

use crate::entities::{count_classnames_with, ClassnameCounts};
use crate::error::{Error, Result};
use crate::header::{verify_header, Header, LumpKind, BSP_VERSION, HEADER_LEN};
use crate::Options;

/// Reads up to [`HEADER_LEN`] bytes from the start of `source`.
///
/// A short file gives a short buffer; decoding it reports the truncation.
pub fn read_header<R: Read>(source: &mut R) -> Result<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    source.by_ref().take(HEADER_LEN as u64).read_to_end(&mut header)?;
    Ok(header)
}

/// Reads exactly `length` bytes at absolute position `offset`.
pub fn extract_lump<R: Read + Seek>(
    source: &mut R,
    offset: usize,
    length: usize,
) -> Result<Vec<u8>> {
    let seek_err = |source: io::Error| Error::Seek {
        offset: offset as u64,
        source,
    };

    let end = source.seek(SeekFrom::End(0)).map_err(seek_err)?;
    if offset as u64 > end {
        return Err(seek_err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("stream is only {end} bytes long"),
        )));
    }
    source
        .seek(SeekFrom::Start(offset as u64))
        .map_err(seek_err)?;

    // Never reserve more than the stream can still deliver
    let available = (end - offset as u64).min(length as u64) as usize;
    let mut lump = Vec::with_capacity(available);
    let found = source.by_ref().take(length as u64).read_to_end(&mut lump)?;

    if found != length {
        return Err(Error::TruncatedLump {
            offset,
            expected: length,
            found,
        });
    }
    Ok(lump)
}

/// Entities lump read from a map file
#[derive(Debug, Clone)]
pub struct EntityLump {
    /// Absolute offset in file
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl EntityLump {
    /// Runs the whole read: header, signature check, directory lookup and extraction.
    pub fn read<R: Read + Seek>(source: &mut R, options: &Options) -> Result<Self> {
        source.seek(SeekFrom::Start(0))?;
        let header = read_header(source)?;
        verify_header(&header)?;

        let header = Header::parse(&header)?;
        if header.version() != BSP_VERSION {
            warn!(
                "unexpected BSP version {} (expected {BSP_VERSION})",
                header.version()
            );
        }

        let (offset, length) = header.resolve(LumpKind::Entities, options.offset_base)?;
        debug!("entities lump at offset {offset}, {length} bytes");

        let bytes = extract_lump(source, offset, length)?;
        Ok(Self { offset, bytes })
    }

    /// Lump contents as text, invalid UTF-8 replaced
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn classname_counts(&self, options: &Options) -> Result<ClassnameCounts> {
        count_classnames_with(&self.text(), options.malformed_lines)
    }
}

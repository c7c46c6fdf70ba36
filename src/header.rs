use log::trace;
use zerocopy::byteorder::{LittleEndian, I32};
use zerocopy::FromBytes;
use zerocopy_derive::*;

use crate::error::{Error, Result};

/// `IBSP` as read from disk into a little-endian word
pub const MAGIC: i32 =
    (b'P' as i32) << 24 | (b'S' as i32) << 16 | (b'B' as i32) << 8 | b'I' as i32;

/// Quake 2 BSP version
pub const BSP_VERSION: i32 = 38;

/// Size of the file header: magic, version and the lump directory
pub const HEADER_LEN: usize = 160;

/// Lump definition count
pub const LUMP_DEF_COUNT: usize = 19;

type Le32 = I32<LittleEndian>;

/// Lump slots in directory order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LumpKind {
    Entities,
    Planes,
    Vertexes,
    Visibility,
    Nodes,
    TexInfo,
    Faces,
    Lighting,
    Leafs,
    LeafFaces,
    LeafBrushes,
    Edges,
    SurfEdges,
    Models,
    Brushes,
    BrushSides,
    Pop,
    Areas,
    AreaPortals,
}

impl LumpKind {
    pub const ALL: [LumpKind; LUMP_DEF_COUNT] = [
        LumpKind::Entities,
        LumpKind::Planes,
        LumpKind::Vertexes,
        LumpKind::Visibility,
        LumpKind::Nodes,
        LumpKind::TexInfo,
        LumpKind::Faces,
        LumpKind::Lighting,
        LumpKind::Leafs,
        LumpKind::LeafFaces,
        LumpKind::LeafBrushes,
        LumpKind::Edges,
        LumpKind::SurfEdges,
        LumpKind::Models,
        LumpKind::Brushes,
        LumpKind::BrushSides,
        LumpKind::Pop,
        LumpKind::Areas,
        LumpKind::AreaPortals,
    ];

    /// Slot index in the lump directory
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            LumpKind::Entities => "entities",
            LumpKind::Planes => "planes",
            LumpKind::Vertexes => "vertexes",
            LumpKind::Visibility => "visibility",
            LumpKind::Nodes => "nodes",
            LumpKind::TexInfo => "texinfo",
            LumpKind::Faces => "faces",
            LumpKind::Lighting => "lighting",
            LumpKind::Leafs => "leafs",
            LumpKind::LeafFaces => "leaffaces",
            LumpKind::LeafBrushes => "leafbrushes",
            LumpKind::Edges => "edges",
            LumpKind::SurfEdges => "surfedges",
            LumpKind::Models => "models",
            LumpKind::Brushes => "brushes",
            LumpKind::BrushSides => "brushsides",
            LumpKind::Pop => "pop",
            LumpKind::Areas => "areas",
            LumpKind::AreaPortals => "areaportals",
        }
    }
}

/// Reference point a stored lump offset is measured from
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OffsetBase {
    /// Stored offsets count from the end of the header
    #[default]
    HeaderRelative,
    /// Stored offsets are absolute file positions
    Absolute,
}

impl OffsetBase {
    fn bias(self) -> i64 {
        match self {
            OffsetBase::HeaderRelative => HEADER_LEN as i64,
            OffsetBase::Absolute => 0,
        }
    }
}

/// BSP lump definition
#[derive(FromBytes, KnownLayout, Immutable, Unaligned, Debug, Clone, Copy)]
#[repr(C)]
pub struct LumpDef {
    /// Offset as stored in the file
    offset: Le32,
    /// Length of data
    length: Le32,
}

impl LumpDef {
    pub fn offset(&self) -> i32 {
        self.offset.get()
    }

    pub fn length(&self) -> i32 {
        self.length.get()
    }

    /// File position of the lump data under `base`
    pub fn file_offset(&self, base: OffsetBase) -> i64 {
        i64::from(self.offset()) + base.bias()
    }
}

/// BSP file header
#[derive(FromBytes, KnownLayout, Immutable, Unaligned, Debug, Clone)]
#[repr(C)]
pub struct Header {
    /// File format identifier
    ident: Le32,
    /// File format version
    version: Le32,
    /// Lump definitions
    lump_defs: [LumpDef; LUMP_DEF_COUNT],
}

const _: () = assert!(size_of::<Header>() == HEADER_LEN);

impl Header {
    /// Decodes the header from the start of `bytes` without copying.
    pub fn parse(bytes: &[u8]) -> Result<&Header> {
        let (header, _) = Header::ref_from_prefix(bytes)
            .map_err(|_| Error::TruncatedHeader { len: bytes.len() })?;

        for (kind, def) in header.lump_defs() {
            trace!(
                "lump {:2} {:<12} offset={} length={}",
                kind.index(),
                kind.name(),
                def.offset(),
                def.length()
            );
        }
        Ok(header)
    }

    pub fn ident(&self) -> i32 {
        self.ident.get()
    }

    pub fn version(&self) -> i32 {
        self.version.get()
    }

    pub fn lump_def(&self, kind: LumpKind) -> &LumpDef {
        &self.lump_defs[kind.index()]
    }

    pub fn lump_defs(&self) -> impl Iterator<Item = (LumpKind, &LumpDef)> {
        LumpKind::ALL.into_iter().zip(self.lump_defs.iter())
    }

    /// Resolves a directory slot to a `(file offset, length)` pair.
    pub fn resolve(&self, kind: LumpKind, base: OffsetBase) -> Result<(usize, usize)> {
        let def = self.lump_def(kind);
        let offset = def.file_offset(base);
        let invalid = || Error::InvalidLump {
            kind,
            offset,
            length: def.length(),
        };

        let resolved_offset = usize::try_from(offset).map_err(|_| invalid())?;
        let length = usize::try_from(def.length()).map_err(|_| invalid())?;
        Ok((resolved_offset, length))
    }
}

/// Checks that `header` starts with the `IBSP` signature.
pub fn verify_header(header: &[u8]) -> Result<()> {
    let (ident, _) = Le32::read_from_prefix(header)
        .map_err(|_| Error::TruncatedHeader { len: header.len() })?;

    let found = ident.get();
    if found != MAGIC {
        return Err(Error::InvalidFormat { found });
    }
    Ok(())
}

/// Finds the entities lump, returning its file offset and length.
///
/// Stored offsets are taken to be relative to the end of the header.
pub fn locate_entity_lump(header: &[u8]) -> Result<(usize, usize)> {
    locate_entity_lump_with(header, OffsetBase::HeaderRelative)
}

pub fn locate_entity_lump_with(header: &[u8], base: OffsetBase) -> Result<(usize, usize)> {
    Header::parse(header)?.resolve(LumpKind::Entities, base)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a header with every slot zeroed except the ones given.
    pub(crate) fn header_bytes(lumps: &[(LumpKind, i32, i32)]) -> Vec<u8> {
        let mut bytes = vec![0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(b"IBSP");
        bytes[4..8].copy_from_slice(&BSP_VERSION.to_le_bytes());
        for &(kind, offset, length) in lumps {
            let pos = 8 + kind.index() * 8;
            bytes[pos..pos + 4].copy_from_slice(&offset.to_le_bytes());
            bytes[pos + 4..pos + 8].copy_from_slice(&length.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn magic_matches_disk_signature() {
        assert_eq!(MAGIC, 0x50534249);
        assert_eq!(MAGIC.to_le_bytes(), *b"IBSP");
    }

    #[test]
    fn verify_accepts_magic_regardless_of_rest() {
        let mut bytes = header_bytes(&[]);
        bytes[4..].fill(0xff);
        assert!(verify_header(&bytes).is_ok());
        assert!(verify_header(b"IBSP").is_ok());
    }

    #[test]
    fn verify_rejects_other_signatures() {
        for sig in [b"PSBI", b"VBSP", b"\0\0\0\0", b"ibsp"] {
            let err = verify_header(sig).unwrap_err();
            assert!(matches!(err, Error::InvalidFormat { .. }), "{sig:?}: {err}");
        }

        let err = verify_header(b"BSP2 with more bytes").unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { found } if found == i32::from_le_bytes(*b"BSP2")));
    }

    #[test]
    fn verify_short_buffer_is_truncated() {
        let err = verify_header(b"IBS").unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { len: 3 }));
        assert!(matches!(verify_header(&[]), Err(Error::TruncatedHeader { len: 0 })));
    }

    #[test]
    fn locate_adds_header_length() {
        let bytes = header_bytes(&[(LumpKind::Entities, 0, 1234), (LumpKind::Planes, 5000, 20)]);
        assert_eq!(locate_entity_lump(&bytes).unwrap(), (160, 1234));

        let bytes = header_bytes(&[(LumpKind::Entities, 40, 7)]);
        assert_eq!(locate_entity_lump(&bytes).unwrap(), (200, 7));
    }

    #[test]
    fn locate_absolute_keeps_stored_offset() {
        let bytes = header_bytes(&[(LumpKind::Entities, 160, 99)]);
        assert_eq!(
            locate_entity_lump_with(&bytes, OffsetBase::Absolute).unwrap(),
            (160, 99)
        );
    }

    #[test]
    fn locate_short_header_is_truncated() {
        let bytes = header_bytes(&[(LumpKind::Entities, 0, 10)]);
        let err = locate_entity_lump(&bytes[..159]).unwrap_err();
        assert!(matches!(err, Error::TruncatedHeader { len: 159 }));
    }

    #[test]
    fn locate_ignores_trailing_bytes() {
        let mut bytes = header_bytes(&[(LumpKind::Entities, 8, 16)]);
        bytes.extend_from_slice(&[0xaa; 64]);
        assert_eq!(locate_entity_lump(&bytes).unwrap(), (168, 16));
    }

    #[test]
    fn negative_entries_are_invalid() {
        let bytes = header_bytes(&[(LumpKind::Entities, -161, 10)]);
        let err = locate_entity_lump(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLump { kind: LumpKind::Entities, offset: -1, length: 10 }
        ));

        let bytes = header_bytes(&[(LumpKind::Entities, 0, -5)]);
        assert!(matches!(
            locate_entity_lump(&bytes),
            Err(Error::InvalidLump { length: -5, .. })
        ));

        // Header-relative bias can bring a small negative offset back into range
        let bytes = header_bytes(&[(LumpKind::Entities, -160, 3)]);
        assert_eq!(locate_entity_lump(&bytes).unwrap(), (0, 3));
    }

    #[test]
    fn all_slots_are_decoded() {
        let bytes = header_bytes(&[
            (LumpKind::Entities, 1, 2),
            (LumpKind::Areas, 3, 4),
            (LumpKind::AreaPortals, 5, 6),
        ]);
        let header = Header::parse(&bytes).unwrap();
        assert_eq!(header.ident(), MAGIC);
        assert_eq!(header.version(), BSP_VERSION);
        assert_eq!(header.lump_defs().count(), LUMP_DEF_COUNT);

        let last = header.lump_def(LumpKind::AreaPortals);
        assert_eq!((last.offset(), last.length()), (5, 6));
        assert_eq!(
            header.resolve(LumpKind::Areas, OffsetBase::HeaderRelative).unwrap(),
            (163, 4)
        );
    }

    #[test]
    fn kinds_are_in_directory_order() {
        for (i, kind) in LumpKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert_eq!(LumpKind::AreaPortals.index(), 18);
    }
}

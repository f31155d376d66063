//! Binary format definitions for HMICB animation containers.

use std::fmt;
use std::io::{self, Write};

/// Magic bytes identifying an HMICB container.
pub const ANIMATION_MAGIC: &[u8; 5] = b"HMICB";

/// Format version written by [`write_container`].
pub const ANIMATION_VERSION: u8 = 1;

/// Size of the fixed header in bytes.
/// Magic(5) + Version(1) + Width(2) + Height(2) + FrameRate(2) +
/// FrameCount(4) + Loop(1) + Compression(1) + Reserved(14) = 32
pub const HEADER_SIZE: usize = 32;

const RESERVED_SIZE: usize = 14;

/// Part of the container a truncation was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Header,
    IndexTable,
    /// Encoded chunk of the frame at this index.
    Frame(usize),
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Header => write!(f, "header"),
            Region::IndexTable => write!(f, "frame index table"),
            Region::Frame(i) => write!(f, "frame {}", i),
        }
    }
}

/// Errors raised while parsing or decoding a container.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Invalid HMICB magic bytes: {found:?}")]
    BadMagic { found: [u8; 5] },

    #[error("Truncated {region}: need {needed} bytes, have {available}")]
    Truncated {
        region: Region,
        needed: u64,
        available: u64,
    },

    #[error("Delta frame {frame} appears before any keyframe")]
    DeltaBeforeKeyframe { frame: usize },

    #[error("Frame {frame} patches pixel ({x}, {y}) outside {width}x{height}")]
    PatchOutOfBounds {
        frame: usize,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
    },

    #[error("Keyframe {frame} is {actual} bytes, expected {expected}")]
    SizeMismatch {
        frame: usize,
        expected: usize,
        actual: usize,
    },
}

#[inline]
pub(crate) fn le_u16(b: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([b[at], b[at + 1]])
}

#[inline]
pub(crate) fn le_u32(b: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

/// File header for the HMICB container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationHeader {
    /// Format version byte (not interpreted).
    pub version: u8,
    /// Frame width in pixels.
    pub width: u16,
    /// Frame height in pixels.
    pub height: u16,
    /// Declared playback rate in frames per second.
    pub frame_rate: u16,
    /// Number of entries in the frame index table.
    pub frame_count: u32,
    /// Restart from frame 0 after the last frame.
    pub looping: bool,
    /// Reserved compression flag. Preserved, never acted upon.
    pub compression: u8,
}

impl AnimationHeader {
    /// Size of header in bytes.
    pub const SIZE: usize = HEADER_SIZE;

    /// Number of pixels in one frame.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of one keyframe chunk in bytes (RGBA).
    pub fn frame_size(&self) -> usize {
        self.pixel_count() * 4
    }

    /// Write header to output. Reserved bytes are written as zeros.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(ANIMATION_MAGIC)?;
        w.write_all(&[self.version])?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&self.frame_rate.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&[u8::from(self.looping), self.compression])?;
        w.write_all(&[0u8; RESERVED_SIZE])?;
        Ok(())
    }

    /// Read header from the start of a buffer.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, FormatError> {
        if let Some(magic) = buffer.first_chunk::<5>()
            && magic != ANIMATION_MAGIC
        {
            return Err(FormatError::BadMagic { found: *magic });
        }

        let b = buffer
            .first_chunk::<HEADER_SIZE>()
            .ok_or(FormatError::Truncated {
                region: Region::Header,
                needed: HEADER_SIZE as u64,
                available: buffer.len() as u64,
            })?;

        // Bytes 18..32 are reserved and skipped
        Ok(Self {
            version: b[5],
            width: le_u16(b, 6),
            height: le_u16(b, 8),
            frame_rate: le_u16(b, 10),
            frame_count: le_u32(b, 12),
            looping: b[16] == 1,
            compression: b[17],
        })
    }
}

/// How a frame chunk is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FrameKind {
    /// Complete RGBA pixel buffer.
    #[default]
    Keyframe = 0,
    /// Patch list applied over the previous decoded frame.
    Delta = 1,
}

impl FrameKind {
    /// Any nonzero kind byte marks a delta.
    pub fn from_u8(v: u8) -> Self {
        if v == 0 {
            FrameKind::Keyframe
        } else {
            FrameKind::Delta
        }
    }
}

/// Index entry locating a single frame chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndexEntry {
    /// Byte offset from start of buffer.
    pub offset: u32,
    /// Chunk length in bytes.
    pub length: u32,
    pub kind: FrameKind,
}

impl FrameIndexEntry {
    /// Size of one index entry in bytes.
    pub const SIZE: usize = 9;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.length.to_le_bytes())?;
        w.write_all(&[self.kind as u8])?;
        Ok(())
    }

    pub fn from_bytes(b: &[u8; Self::SIZE]) -> Self {
        Self {
            offset: le_u32(b, 0),
            length: le_u32(b, 4),
            kind: FrameKind::from_u8(b[8]),
        }
    }

    /// Bounds-checked view of this entry's chunk inside `buffer`.
    pub fn chunk<'a>(&self, buffer: &'a [u8], frame: usize) -> Result<&'a [u8], FormatError> {
        let end = self.offset as u64 + self.length as u64;
        if end > buffer.len() as u64 {
            return Err(FormatError::Truncated {
                region: Region::Frame(frame),
                needed: end,
                available: buffer.len() as u64,
            });
        }
        Ok(&buffer[self.offset as usize..end as usize])
    }
}

/// One pixel overwrite inside a delta chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchRecord {
    pub x: u16,
    pub y: u16,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PatchRecord {
    /// Size of one patch record in bytes: x(2) + y(2) + rgba(4).
    pub const SIZE: usize = 8;

    pub fn rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.x.to_le_bytes())?;
        w.write_all(&self.y.to_le_bytes())?;
        w.write_all(&self.rgba())?;
        Ok(())
    }

    pub fn from_bytes(b: &[u8; Self::SIZE]) -> Self {
        Self {
            x: le_u16(b, 0),
            y: le_u16(b, 2),
            r: b[4],
            g: b[5],
            b: b[6],
            a: b[7],
        }
    }
}

/// Parse the header and frame index table from a complete container.
///
/// Chunk offsets and lengths are not validated here; the decoder checks
/// each one before slicing.
pub fn parse(buffer: &[u8]) -> Result<(AnimationHeader, Vec<FrameIndexEntry>), FormatError> {
    let header = AnimationHeader::from_bytes(buffer)?;

    let table_len = header.frame_count as u64 * FrameIndexEntry::SIZE as u64;
    let table_end = HEADER_SIZE as u64 + table_len;
    if (buffer.len() as u64) < table_end {
        return Err(FormatError::Truncated {
            region: Region::IndexTable,
            needed: table_end,
            available: buffer.len() as u64,
        });
    }

    let (entries, _) =
        buffer[HEADER_SIZE..table_end as usize].as_chunks::<{ FrameIndexEntry::SIZE }>();
    let index = entries.iter().map(FrameIndexEntry::from_bytes).collect();

    Ok((header, index))
}

/// Encode a delta chunk: patch count followed by the records.
///
/// Fails with `InvalidInput` when there are more patches than a u32 count
/// can hold.
pub fn encode_delta(patches: &[PatchRecord]) -> io::Result<Vec<u8>> {
    let count = u32::try_from(patches.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "too many patches for one delta")
    })?;

    let mut bytes = Vec::with_capacity(4 + patches.len() * PatchRecord::SIZE);
    bytes.extend_from_slice(&count.to_le_bytes());
    for patch in patches {
        bytes.extend_from_slice(&patch.x.to_le_bytes());
        bytes.extend_from_slice(&patch.y.to_le_bytes());
        bytes.extend_from_slice(&patch.rgba());
    }
    Ok(bytes)
}

/// Write a complete container: header, index table, then chunks in order.
///
/// The header's frame count is replaced by `chunks.len()`. Returns the
/// number of bytes written.
pub fn write_container<W: Write>(
    w: &mut W,
    header: &AnimationHeader,
    chunks: &[(FrameKind, Vec<u8>)],
) -> io::Result<u64> {
    let too_large = || io::Error::new(io::ErrorKind::InvalidInput, "HMICB container exceeds 4 GiB");

    let frame_count = u32::try_from(chunks.len()).map_err(|_| too_large())?;
    let header = AnimationHeader {
        frame_count,
        ..*header
    };
    header.write_to(w)?;

    let mut offset = (HEADER_SIZE + chunks.len() * FrameIndexEntry::SIZE) as u64;
    for (kind, data) in chunks {
        let entry = FrameIndexEntry {
            offset: u32::try_from(offset).map_err(|_| too_large())?,
            length: u32::try_from(data.len()).map_err(|_| too_large())?,
            kind: *kind,
        };
        entry.write_to(w)?;
        offset += data.len() as u64;
    }

    for (_, data) in chunks {
        w.write_all(data)?;
    }

    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_header() -> AnimationHeader {
        AnimationHeader {
            version: 1,
            width: 64,
            height: 48,
            frame_rate: 24,
            frame_count: 2,
            looping: true,
            compression: 0,
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample_header();

        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), AnimationHeader::SIZE);
        assert_eq!(&buf[..5], b"HMICB");

        let decoded = AnimationHeader::from_bytes(&buf).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_header_byte_layout() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf).unwrap();

        assert_eq!(buf[5], 1);
        assert_eq!(&buf[6..8], &[64, 0]);
        assert_eq!(&buf[8..10], &[48, 0]);
        assert_eq!(&buf[10..12], &[24, 0]);
        assert_eq!(&buf[12..16], &[2, 0, 0, 0]);
        assert_eq!(buf[16], 1);
        assert_eq!(buf[17], 0);
        assert!(buf[18..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf).unwrap();
        buf[0] = b'X';

        let err = parse(&buf).unwrap_err();
        assert_eq!(
            err,
            FormatError::BadMagic {
                found: *b"XMICB"
            }
        );
    }

    #[test]
    fn test_short_buffer_is_truncated() {
        let err = parse(b"HMI").unwrap_err();
        assert!(matches!(
            err,
            FormatError::Truncated {
                region: Region::Header,
                needed: 32,
                available: 3
            }
        ));

        let err = parse(b"HMICB\x01\x02\x00").unwrap_err();
        assert!(matches!(
            err,
            FormatError::Truncated {
                region: Region::Header,
                ..
            }
        ));
    }

    #[test]
    fn test_index_table_truncated() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf).unwrap();
        // Declares 2 entries, supply only one
        FrameIndexEntry {
            offset: 0,
            length: 0,
            kind: FrameKind::Keyframe,
        }
        .write_to(&mut buf)
        .unwrap();

        let err = parse(&buf).unwrap_err();
        assert_eq!(
            err,
            FormatError::Truncated {
                region: Region::IndexTable,
                needed: 32 + 18,
                available: 32 + 9,
            }
        );
    }

    #[test]
    fn test_loop_flag_only_one_means_loop() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf).unwrap();
        buf[16] = 2;
        assert!(!AnimationHeader::from_bytes(&buf).unwrap().looping);
    }

    #[test]
    fn test_compression_flag_preserved() {
        let mut buf = Vec::new();
        AnimationHeader {
            compression: 7,
            ..sample_header()
        }
        .write_to(&mut buf)
        .unwrap();
        assert_eq!(AnimationHeader::from_bytes(&buf).unwrap().compression, 7);
    }

    #[test]
    fn test_index_parsed_in_order() {
        let chunks = vec![
            (FrameKind::Keyframe, vec![1u8; 4]),
            (FrameKind::Delta, encode_delta(&[]).unwrap()),
        ];
        let header = AnimationHeader {
            width: 1,
            height: 1,
            ..sample_header()
        };
        let mut buf = Vec::new();
        let written = write_container(&mut buf, &header, &chunks).unwrap();
        assert_eq!(written, buf.len() as u64);

        let (parsed, index) = parse(&buf).unwrap();
        assert_eq!(parsed.frame_count, 2);
        assert_eq!(index.len(), 2);
        assert_eq!(index[0].offset, 32 + 18);
        assert_eq!(index[0].length, 4);
        assert_eq!(index[0].kind, FrameKind::Keyframe);
        assert_eq!(index[1].offset, 32 + 18 + 4);
        assert_eq!(index[1].length, 4);
        assert_eq!(index[1].kind, FrameKind::Delta);
    }

    #[test]
    fn test_nonzero_kind_is_delta() {
        let entry = FrameIndexEntry::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 0, 0xAB]);
        assert_eq!(entry.kind, FrameKind::Delta);
    }

    #[test]
    fn test_chunk_out_of_range() {
        let entry = FrameIndexEntry {
            offset: 10,
            length: 8,
            kind: FrameKind::Keyframe,
        };
        let err = entry.chunk(&[0u8; 12], 3).unwrap_err();
        assert_eq!(
            err,
            FormatError::Truncated {
                region: Region::Frame(3),
                needed: 18,
                available: 12,
            }
        );
    }

    #[test]
    fn test_patch_record_layout() {
        let patch = PatchRecord {
            x: 0x0102,
            y: 3,
            r: 10,
            g: 20,
            b: 30,
            a: 40,
        };
        let mut buf = Vec::new();
        patch.write_to(&mut buf).unwrap();
        assert_eq!(buf, vec![0x02, 0x01, 3, 0, 10, 20, 30, 40]);
        assert_eq!(PatchRecord::from_bytes(&[0x02, 0x01, 3, 0, 10, 20, 30, 40]), patch);

        let bytes = encode_delta(&[patch]).unwrap();
        assert_eq!(&bytes[..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..], &buf[..]);
    }

    proptest! {
        #[test]
        fn prop_header_reserializes_identically(
            version in any::<u8>(),
            width in any::<u16>(),
            height in any::<u16>(),
            frame_rate in any::<u16>(),
            frame_count in any::<u32>(),
            looping in any::<bool>(),
            compression in any::<u8>(),
        ) {
            let header = AnimationHeader {
                version,
                width,
                height,
                frame_rate,
                frame_count,
                looping,
                compression,
            };
            let mut first = Vec::new();
            header.write_to(&mut first).unwrap();

            let parsed = AnimationHeader::from_bytes(&first).unwrap();
            let mut second = Vec::new();
            parsed.write_to(&mut second).unwrap();

            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_index_entry_roundtrip(
            offset in any::<u32>(),
            length in any::<u32>(),
            delta in any::<bool>(),
        ) {
            let kind = if delta { FrameKind::Delta } else { FrameKind::Keyframe };
            let entry = FrameIndexEntry { offset, length, kind };
            let mut buf = Vec::new();
            entry.write_to(&mut buf).unwrap();
            let bytes: [u8; FrameIndexEntry::SIZE] = buf.try_into().unwrap();
            prop_assert_eq!(FrameIndexEntry::from_bytes(&bytes), entry);
        }
    }
}

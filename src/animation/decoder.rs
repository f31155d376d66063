//! Frame reconstruction from keyframes and delta patches.

use std::iter::Enumerate;
use std::slice;

use super::format::{
    AnimationHeader, FormatError, FrameIndexEntry, FrameKind, PatchRecord, Region, le_u32, parse,
};

/// A fully materialized RGBA frame.
///
/// Pixels are row-major with row 0 at the top of the image as stored.
/// Every frame owns its storage; frames derived from a delta are copies of
/// their predecessor, never views into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl DecodedFrame {
    /// Build a frame from an RGBA buffer, copying it.
    ///
    /// Returns `None` if `pixels` is not exactly `width * height * 4` bytes.
    pub fn from_rgba(width: u16, height: u16, pixels: &[u8]) -> Option<Self> {
        if pixels.len() != width as usize * height as usize * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: pixels.to_vec(),
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Raw RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA value at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u16, y: u16) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[idx..idx + 4].try_into().ok()
    }

    /// Overwrite one pixel with the patch colour.
    pub fn apply_patch(&mut self, patch: &PatchRecord, frame: usize) -> Result<(), FormatError> {
        if patch.x >= self.width || patch.y >= self.height {
            return Err(FormatError::PatchOutOfBounds {
                frame,
                x: patch.x,
                y: patch.y,
                width: self.width,
                height: self.height,
            });
        }
        let idx = (patch.y as usize * self.width as usize + patch.x as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&patch.rgba());
        Ok(())
    }
}

/// Split a delta chunk into its patch records.
///
/// Bytes past the declared record count are ignored.
fn read_patches(
    chunk: &[u8],
    frame: usize,
) -> Result<&[[u8; PatchRecord::SIZE]], FormatError> {
    if chunk.len() < 4 {
        return Err(FormatError::Truncated {
            region: Region::Frame(frame),
            needed: 4,
            available: chunk.len() as u64,
        });
    }

    let count = le_u32(chunk, 0) as u64;
    let needed = 4 + count * PatchRecord::SIZE as u64;
    if (chunk.len() as u64) < needed {
        return Err(FormatError::Truncated {
            region: Region::Frame(frame),
            needed,
            available: chunk.len() as u64,
        });
    }

    let (records, _) = chunk[4..needed as usize].as_chunks::<{ PatchRecord::SIZE }>();
    Ok(records)
}

/// Lazy decoder yielding frames in index order.
///
/// Stops after the first error, so the frames yielded before it are the
/// prefix that decoded cleanly.
///
/// Usage:
/// ```ignore
/// let (header, index) = parse(&bytes)?;
/// for frame in FrameDecoder::new(&bytes, &header, &index) {
///     let frame = frame?;
///     // Use frame...
/// }
/// ```
pub struct FrameDecoder<'a> {
    buffer: &'a [u8],
    header: AnimationHeader,
    entries: Enumerate<slice::Iter<'a, FrameIndexEntry>>,
    /// Copy of the last frame produced; base for the next delta.
    previous: Option<DecodedFrame>,
    failed: bool,
}

impl<'a> FrameDecoder<'a> {
    pub fn new(buffer: &'a [u8], header: &AnimationHeader, index: &'a [FrameIndexEntry]) -> Self {
        Self {
            buffer,
            header: *header,
            entries: index.iter().enumerate(),
            previous: None,
            failed: false,
        }
    }

    fn decode_entry(
        &self,
        frame: usize,
        entry: &FrameIndexEntry,
    ) -> Result<DecodedFrame, FormatError> {
        match entry.kind {
            FrameKind::Keyframe => {
                let expected = self.header.frame_size();
                if entry.length as usize != expected {
                    return Err(FormatError::SizeMismatch {
                        frame,
                        expected,
                        actual: entry.length as usize,
                    });
                }
                let chunk = entry.chunk(self.buffer, frame)?;
                log::debug!("Frame {}: keyframe, {} bytes", frame, chunk.len());

                Ok(DecodedFrame {
                    width: self.header.width,
                    height: self.header.height,
                    pixels: chunk.to_vec(),
                })
            }
            FrameKind::Delta => {
                let previous = self
                    .previous
                    .as_ref()
                    .ok_or(FormatError::DeltaBeforeKeyframe { frame })?;
                let chunk = entry.chunk(self.buffer, frame)?;
                let records = read_patches(chunk, frame)?;
                log::debug!("Frame {}: delta, {} patches", frame, records.len());

                let mut out = previous.clone();
                for record in records {
                    out.apply_patch(&PatchRecord::from_bytes(record), frame)?;
                }
                Ok(out)
            }
        }
    }
}

impl Iterator for FrameDecoder<'_> {
    type Item = Result<DecodedFrame, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let (frame, entry) = self.entries.next()?;
        let result = self.decode_entry(frame, entry);
        match &result {
            Ok(decoded) => self.previous = Some(decoded.clone()),
            Err(_) => self.failed = true,
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        (0, Some(self.entries.len()))
    }
}

/// Decode every frame of a parsed container.
pub fn decode(
    buffer: &[u8],
    header: &AnimationHeader,
    index: &[FrameIndexEntry],
) -> Result<Vec<DecodedFrame>, FormatError> {
    FrameDecoder::new(buffer, header, index).collect()
}

/// A parsed and fully decoded animation.
#[derive(Debug, Clone)]
pub struct Animation {
    header: AnimationHeader,
    frames: Vec<DecodedFrame>,
}

impl Animation {
    /// Parse and decode a complete container.
    pub fn decode(buffer: &[u8]) -> Result<Self, FormatError> {
        let (header, index) = parse(buffer)?;
        if header.compression != 0 {
            log::warn!(
                "Compression flag {} is reserved; decoding frames as raw",
                header.compression
            );
        }
        let frames = decode(buffer, &header, &index)?;
        Ok(Self { header, frames })
    }

    /// Get animation header.
    pub fn header(&self) -> &AnimationHeader {
        &self.header
    }

    /// Get number of decoded frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Get frame dimensions.
    pub fn dimensions(&self) -> (u16, u16) {
        (self.header.width, self.header.height)
    }

    pub fn frames(&self) -> &[DecodedFrame] {
        &self.frames
    }

    pub fn frame(&self, n: usize) -> Option<&DecodedFrame> {
        self.frames.get(n)
    }
}

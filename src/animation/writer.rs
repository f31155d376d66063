//! Animation writer for building HMICB containers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::format::{
    ANIMATION_VERSION, AnimationHeader, FrameKind, PatchRecord, encode_delta, write_container,
};

/// Configuration for animation writing.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Force a keyframe every N frames (0 = only when required).
    pub keyframe_interval: u32,
    /// Value stored in the reserved compression byte.
    pub compression: u8,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            keyframe_interval: 0,
            compression: 0,
        }
    }
}

/// Builds an HMICB container in memory from full RGBA frames.
///
/// Usage:
/// ```ignore
/// let mut writer = AnimationWriter::new(64, 64, 24, true, Default::default());
/// for frame in frames {
///     writer.push_frame(&frame)?;
/// }
/// let stats = writer.save("output.hmicb")?;
/// ```
pub struct AnimationWriter {
    header: AnimationHeader,
    config: WriterConfig,
    chunks: Vec<(FrameKind, Vec<u8>)>,
    /// Pixels of the last pushed frame, for diffing.
    previous: Option<Vec<u8>>,
    deltas_since_keyframe: u32,
}

impl AnimationWriter {
    /// Create a new animation writer.
    pub fn new(
        width: u16,
        height: u16,
        frame_rate: u16,
        looping: bool,
        config: WriterConfig,
    ) -> Self {
        let header = AnimationHeader {
            version: ANIMATION_VERSION,
            width,
            height,
            frame_rate,
            frame_count: 0, // Set from the chunk list on write
            looping,
            compression: config.compression,
        };

        Self {
            header,
            config,
            chunks: Vec::new(),
            previous: None,
            deltas_since_keyframe: 0,
        }
    }

    fn check_size(&self, pixels: &[u8]) -> io::Result<()> {
        let expected = self.header.frame_size();
        if pixels.len() != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Frame size mismatch: {} bytes vs {} expected",
                    pixels.len(),
                    expected
                ),
            ));
        }
        Ok(())
    }

    /// Append a complete RGBA frame as a keyframe.
    pub fn push_keyframe(&mut self, pixels: &[u8]) -> io::Result<()> {
        self.check_size(pixels)?;
        self.chunks.push((FrameKind::Keyframe, pixels.to_vec()));
        self.previous = Some(pixels.to_vec());
        self.deltas_since_keyframe = 0;
        Ok(())
    }

    /// Append a complete RGBA frame, stored as a delta against the previous
    /// frame when that is smaller.
    ///
    /// Returns the kind the frame was stored as.
    pub fn push_frame(&mut self, pixels: &[u8]) -> io::Result<FrameKind> {
        self.check_size(pixels)?;

        let forced = self.config.keyframe_interval > 0
            && self.deltas_since_keyframe + 1 >= self.config.keyframe_interval;
        let Some(previous) = self.previous.as_deref().filter(|_| !forced) else {
            self.push_keyframe(pixels)?;
            return Ok(FrameKind::Keyframe);
        };

        let patches = diff(previous, pixels, self.header.width);
        if 4 + patches.len() * PatchRecord::SIZE >= pixels.len() {
            self.push_keyframe(pixels)?;
            return Ok(FrameKind::Keyframe);
        }

        self.chunks.push((FrameKind::Delta, encode_delta(&patches)?));
        self.previous = Some(pixels.to_vec());
        self.deltas_since_keyframe += 1;
        Ok(FrameKind::Delta)
    }

    /// Get number of frames pushed so far.
    pub fn frames_written(&self) -> usize {
        self.chunks.len()
    }

    /// Serialize the container to `w`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<WriterStats> {
        let total_bytes = write_container(w, &self.header, &self.chunks)?;
        let keyframes = self
            .chunks
            .iter()
            .filter(|(kind, _)| *kind == FrameKind::Keyframe)
            .count();

        Ok(WriterStats {
            frame_count: self.chunks.len(),
            keyframes,
            deltas: self.chunks.len() - keyframes,
            total_bytes,
        })
    }

    /// Serialize the container into a new buffer.
    pub fn finish(self) -> io::Result<(Vec<u8>, WriterStats)> {
        let mut buf = Vec::new();
        let stats = self.write_to(&mut buf)?;
        Ok((buf, stats))
    }

    /// Write the container to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<WriterStats> {
        let mut writer = BufWriter::new(File::create(path)?);
        let stats = self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(stats)
    }
}

/// Patch records turning `from` into `to`, one per changed pixel.
fn diff(from: &[u8], to: &[u8], width: u16) -> Vec<PatchRecord> {
    let width = width as usize;
    let (from, _) = from.as_chunks::<4>();
    let (to, _) = to.as_chunks::<4>();

    from.iter()
        .zip(to)
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, (_, &[r, g, b, a]))| PatchRecord {
            x: (i % width) as u16,
            y: (i / width) as u16,
            r,
            g,
            b,
            a,
        })
        .collect()
}

/// Statistics from a write.
#[derive(Debug, Clone)]
pub struct WriterStats {
    /// Total frames written.
    pub frame_count: usize,
    pub keyframes: usize,
    pub deltas: usize,
    /// Total container size in bytes.
    pub total_bytes: u64,
}

impl std::fmt::Display for WriterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames ({} keyframes, {} deltas), {} bytes total",
            self.frame_count, self.keyframes, self.deltas, self.total_bytes
        )
    }
}

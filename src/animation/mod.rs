//! HMICB animation decoding and playback.
//!
//! # File Format
//!
//! The `.hmicb` container stores RGBA frames as keyframes (complete pixel
//! buffers) or deltas (sparse pixel overwrites on top of the previous
//! decoded frame). All integers are little-endian.
//!
//! ```text
//! Header (32 bytes):
//!   Magic: "HMICB" (5 bytes)
//!   Version: u8
//!   Width: u16
//!   Height: u16
//!   Frame rate: u16
//!   Frame count: u32
//!   Loop: u8 (1 = loop)
//!   Compression: u8 (reserved)
//!   Reserved: 14 bytes
//!
//! Frame index table (frame_count * 9 bytes):
//!   Offset: u32
//!   Length: u32
//!   Kind: u8 (0 = keyframe, otherwise delta)
//!
//! Frame data (variable):
//!   Keyframe: width * height * 4 bytes RGBA, row 0 at the top
//!   Delta: patch count u32, then per patch x: u16, y: u16, r, g, b, a
//! ```

mod decoder;
mod format;
mod player;
mod writer;

pub use decoder::{Animation, DecodedFrame, FrameDecoder, decode};
pub use format::{
    ANIMATION_MAGIC, ANIMATION_VERSION, AnimationHeader, FormatError, FrameIndexEntry, FrameKind,
    HEADER_SIZE, PatchRecord, Region, encode_delta, parse, write_container,
};
pub use player::{AnimationHandle, PlaybackController, PlaybackState};
pub use writer::{AnimationWriter, WriterConfig, WriterStats};

//! HMICB - Decoder and fixed-rate player for HMICB animation containers.
//!
//! An HMICB file holds a sequence of RGBA frames, each stored either as a
//! full keyframe or as a sparse list of pixel patches over the previous
//! frame. This crate parses the container, reconstructs every frame into an
//! independent buffer, and plays them back through a caller-supplied
//! renderer.
//!
//! # Architecture
//!
//! - `animation`: Container format, frame decoder, playback controller, writer
//! - `render`: The `Renderer` seam and an in-memory `Canvas`
//! - `schema`: Player configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use hmicb::{
//!     animation::PlaybackController,
//!     render::Canvas,
//! };
//!
//! let bytes = std::fs::read("intro.hmicb").unwrap();
//!
//! let mut player = PlaybackController::new(Canvas::new(64, 64));
//! let handle = player.load(&bytes).unwrap();
//! println!("{} frames at {:?}/frame", handle.frame_count, handle.interval);
//!
//! player.play();
//! while player.is_playing() {
//!     std::thread::sleep(handle.interval);
//!     player.advance(handle.interval);
//! }
//!
//! print!("{}", player.renderer().to_ascii());
//! ```

pub mod animation;
pub mod render;
pub mod schema;

// Re-export commonly used types
pub use animation::{Animation, DecodedFrame, FormatError, PlaybackController, PlaybackState};
pub use render::{Canvas, Renderer};
pub use schema::PlayerConfig;

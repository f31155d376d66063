//! Fixed-rate playback of decoded animations.

use std::time::Duration;

use super::decoder::{Animation, DecodedFrame};
use super::format::{AnimationHeader, FormatError};
use crate::render::{Renderer, render_frame};
use crate::schema::PlayerConfig;

/// Playback state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Summary of a successfully loaded animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationHandle {
    /// Header as stored in the file.
    pub header: AnimationHeader,
    /// Number of decoded frames.
    pub frame_count: usize,
    /// Effective tick interval after config overrides.
    pub interval: Duration,
    /// Effective loop flag after config overrides.
    pub looping: bool,
}

/// Recurring tick source driven by elapsed time.
#[derive(Debug, Clone, Copy)]
struct Ticker {
    interval: Duration,
    accumulator: Duration,
}

impl Ticker {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
        }
    }

    /// Accumulate `elapsed` and return how many ticks are due, at most `max`.
    ///
    /// A `max` of 0 is treated as 1 so a due tick is never discarded.
    fn due(&mut self, elapsed: Duration, max: u32) -> u32 {
        let max = max.max(1);
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.interval && ticks < max {
            self.accumulator -= self.interval;
            ticks += 1;
        }
        if ticks == max && self.accumulator >= self.interval {
            log::debug!("Dropping {:?} of playback backlog", self.accumulator);
            self.accumulator = Duration::ZERO;
        }
        ticks
    }
}

/// Single-threaded playback controller.
///
/// Owns the decoded frame table and the playback cursor, and paints frames
/// onto an injected [`Renderer`]. Time only moves when the host calls
/// [`advance`](Self::advance) with elapsed time, or [`tick`](Self::tick)
/// from its own timer.
///
/// Usage:
/// ```ignore
/// let mut player = PlaybackController::new(Canvas::new(64, 64));
/// player.load(&bytes)?;
/// player.play();
/// loop {
///     std::thread::sleep(frame_time);
///     player.advance(frame_time);
/// }
/// ```
pub struct PlaybackController<R: Renderer> {
    renderer: R,
    config: PlayerConfig,
    animation: Option<Animation>,
    handle: Option<AnimationHandle>,
    state: PlaybackState,
    cursor: usize,
    /// Present only while playing.
    ticker: Option<Ticker>,
}

impl<R: Renderer> PlaybackController<R> {
    /// Create a controller with the default configuration.
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, PlayerConfig::default())
    }

    pub fn with_config(renderer: R, config: PlayerConfig) -> Self {
        Self {
            renderer,
            config,
            animation: None,
            handle: None,
            state: PlaybackState::Stopped,
            cursor: 0,
            ticker: None,
        }
    }

    /// Parse and decode a container and make it the current animation.
    ///
    /// On success playback is stopped, the cursor reset, and frame 0 drawn.
    /// On failure the controller is left exactly as it was.
    pub fn load(&mut self, buffer: &[u8]) -> Result<AnimationHandle, FormatError> {
        let animation = Animation::decode(buffer)?;
        let header = *animation.header();

        if header.frame_rate == 0 && self.config.frame_rate_override.is_none() {
            log::warn!(
                "Animation declares 0 fps, using {}",
                self.config.default_frame_rate
            );
        }

        let handle = AnimationHandle {
            header,
            frame_count: animation.frame_count(),
            interval: self.config.frame_interval(header.frame_rate),
            looping: self.config.looping(header.looping),
        };

        // Cancel the old tick stream before swapping frames out from under it
        self.ticker = None;
        self.animation = Some(animation);
        self.handle = Some(handle);
        self.state = PlaybackState::Stopped;
        self.cursor = 0;

        log::info!(
            "Loaded HMICB v{}: {}x{}, {} frames, {:?}/frame, loop={}",
            header.version,
            header.width,
            header.height,
            handle.frame_count,
            handle.interval,
            handle.looping
        );

        self.render(0);
        Ok(handle)
    }

    /// Start or resume playback. No-op if already playing or nothing is loaded.
    pub fn play(&mut self) {
        let Some(handle) = self.handle else {
            return;
        };
        if self.state == PlaybackState::Playing || handle.frame_count == 0 {
            return;
        }

        log::debug!("{:?} -> Playing at frame {}", self.state, self.cursor);
        self.state = PlaybackState::Playing;
        self.ticker = Some(Ticker::new(handle.interval));
    }

    /// Pause playback, keeping the cursor.
    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        log::debug!("Playing -> Paused at frame {}", self.cursor);
        self.state = PlaybackState::Paused;
        self.ticker = None;
    }

    /// Stop playback, rewind to frame 0 and draw it.
    pub fn stop(&mut self) {
        if self.animation.is_none() {
            return;
        }
        log::debug!("{:?} -> Stopped", self.state);
        self.ticker = None;
        self.state = PlaybackState::Stopped;
        self.cursor = 0;
        self.render(0);
    }

    /// Draw frame `n`, clamped to the valid range, without touching playback.
    pub fn draw_frame(&mut self, n: i64) {
        let Some(handle) = self.handle else {
            return;
        };
        if handle.frame_count == 0 {
            return;
        }
        let last = handle.frame_count as i64 - 1;
        self.render(n.clamp(0, last) as usize);
    }

    /// Run one playback step: draw the frame at the cursor and advance.
    ///
    /// Reaching the end wraps to 0 when looping; otherwise playback pauses
    /// with the cursor one past the last frame. No-op unless playing.
    pub fn tick(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(handle) = self.handle else {
            return;
        };

        if self.cursor >= handle.frame_count {
            // Resumed after a non-looping run ended; nothing left to show
            self.halt();
            return;
        }

        self.render(self.cursor);
        self.cursor += 1;

        if self.cursor >= handle.frame_count {
            if handle.looping {
                self.cursor = 0;
            } else {
                self.halt();
            }
        }
    }

    /// Report elapsed host time and run every tick that has come due.
    ///
    /// Returns the number of ticks run. Stops early if a tick ends playback.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        let Some(ticker) = self.ticker.as_mut() else {
            return 0;
        };
        let due = ticker.due(elapsed, self.config.max_catch_up_ticks);

        let mut ran = 0;
        for _ in 0..due {
            if self.ticker.is_none() {
                break;
            }
            self.tick();
            ran += 1;
        }
        ran
    }

    fn halt(&mut self) {
        log::debug!("Reached end at frame {}, pausing", self.cursor);
        self.state = PlaybackState::Paused;
        self.ticker = None;
    }

    fn render(&mut self, n: usize) {
        if let Some(frame) = self.animation.as_ref().and_then(|a| a.frame(n)) {
            render_frame(&mut self.renderer, frame);
        }
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Index of the next frame a tick will draw.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Summary of the loaded animation, if any.
    pub fn handle(&self) -> Option<AnimationHandle> {
        self.handle
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn frame(&self, n: usize) -> Option<&DecodedFrame> {
        self.animation.as_ref()?.frame(n)
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }
}

//! Animated loading indicator for in-flight feed activity.
//!
//! The feed renders an indicator in its footer while a page load or refresh
//! is in flight. The animation is driven the usual way: each [`TickMsg`]
//! advances one frame and schedules the next tick, and messages are routed by
//! instance id so several indicators can coexist in one program.
//!
//! # Examples
//!
//! ```rust
//! use bubbletea_feed::indicator::{Model, DOTS};
//!
//! let indicator = Model::new().with_frames(DOTS.clone()).with_label("loading");
//! assert!(indicator.view().ends_with("loading"));
//! ```

use bubbletea_rs::{tick as bubbletea_tick, Cmd, Msg};
use lipgloss_extras::prelude::*;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// A frame set: the strings to cycle through and the rate to advance at.
#[derive(Debug, Clone)]
pub struct Frames {
    /// Animation frames, shown in order.
    pub frames: Vec<String>,
    /// Delay between frames; smaller is faster.
    pub fps: Duration,
}

/// Braille dot animation.
pub static DOTS: Lazy<Frames> = Lazy::new(|| Frames {
    frames: ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    fps: Duration::from_millis(83),
});

/// Classic spinning line.
pub static LINE: Lazy<Frames> = Lazy::new(|| Frames {
    frames: ["|", "/", "-", "\\"].iter().map(|s| s.to_string()).collect(),
    fps: Duration::from_millis(100),
});

/// Growing ellipsis, for text-heavy footers.
pub static ELLIPSIS: Lazy<Frames> = Lazy::new(|| Frames {
    frames: ["", ".", "..", "..."].iter().map(|s| s.to_string()).collect(),
    fps: Duration::from_millis(333),
});

/// Advances the indicator one frame.
#[derive(Debug, Clone)]
pub struct TickMsg {
    /// Identifier of the indicator this tick belongs to.
    pub id: i64,
    tag: i64,
}

/// Loading indicator state: frame set, style, and an optional label rendered
/// after the current frame.
#[derive(Debug)]
pub struct Model {
    frames: Frames,
    style: Style,
    label: Option<String>,
    frame: usize,
    id: i64,
    tag: i64,
}

impl Model {
    /// Creates an indicator using the [`DOTS`] frames and no label.
    pub fn new() -> Self {
        Self {
            frames: DOTS.clone(),
            style: Style::new(),
            label: None,
            frame: 0,
            id: next_id(),
            tag: 0,
        }
    }

    /// Sets the frame set.
    pub fn with_frames(mut self, frames: Frames) -> Self {
        self.frames = frames;
        self.frame = 0;
        self
    }

    /// Sets the style applied to the rendered frame.
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Sets the label rendered after the frame.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// This indicator's unique id, used for message routing.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Schedules the next animation tick. Call once from the host's `init`
    /// to start the loop; `update` keeps it running.
    pub fn tick(&self) -> Cmd {
        let id = self.id;
        let tag = self.tag;
        let fps = self.frames.fps;
        bubbletea_tick(fps, move |_| Box::new(TickMsg { id, tag }) as Msg)
    }

    /// Advances the animation on a matching [`TickMsg`] and schedules the
    /// next one. Messages for other instances, stale ticks, and unrelated
    /// message types are ignored.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        let tick_msg = msg.downcast_ref::<TickMsg>()?;
        if tick_msg.id != self.id || tick_msg.tag != self.tag {
            return None;
        }

        self.frame += 1;
        if self.frame >= self.frames.frames.len() {
            self.frame = 0;
        }
        self.tag += 1;
        Some(self.tick())
    }

    /// Renders the current frame (and label) as a styled string.
    pub fn view(&self) -> String {
        let frame = self
            .frames
            .frames
            .get(self.frame)
            .map(String::as_str)
            .unwrap_or_default();
        match &self.label {
            Some(label) => format!("{} {}", self.style.render(frame), label),
            None => self.style.render(frame),
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

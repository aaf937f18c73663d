//! Hologram lines and the parser that builds them from raw text.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::hologram::Hologram;
use crate::spawn::{EntityHandle, SpawnError};

/// Vertical space taken by a text line, in blocks.
pub const TEXT_LINE_HEIGHT: f64 = 0.25;

/// Vertical space taken by a floating item, in blocks.
pub const ITEM_LINE_HEIGHT: f64 = 0.5;

const ITEM_PREFIX: &str = "item:";
const ANIMATED_PREFIX: &str = "animated:";
const FRAME_SEPARATOR: &str = "||";

static NEXT_LINE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a line.
///
/// Two lines with the same text are still different lines; tracking sets key
/// on this id rather than on content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineId(pub u64);

impl LineId {
    fn next() -> Self {
        Self(NEXT_LINE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line#{}", self.0)
    }
}

/// Why an [`Animation`] could not be built.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error("animation has no frames")]
    NoFrames,

    #[error("frame interval must be at least one tick")]
    ZeroInterval,
}

/// Frames of an animated line and the tick counter driving them.
///
/// Always holds at least one frame, and the current index always points at
/// one of them.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    frames: Vec<String>,
    interval_ticks: u32,
    current: usize,
    elapsed: u32,
}

impl Animation {
    pub fn new(frames: Vec<String>, interval_ticks: u32) -> Result<Self, AnimationError> {
        if frames.is_empty() {
            return Err(AnimationError::NoFrames);
        }
        if interval_ticks == 0 {
            return Err(AnimationError::ZeroInterval);
        }
        Ok(Self {
            frames,
            interval_ticks,
            current: 0,
            elapsed: 0,
        })
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn interval_ticks(&self) -> u32 {
        self.interval_ticks
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> &str {
        &self.frames[self.current]
    }

    /// Count one tick; returns `true` when the frame switched.
    fn tick(&mut self) -> bool {
        self.elapsed += 1;
        if self.elapsed < self.interval_ticks {
            return false;
        }
        self.elapsed = 0;
        self.current = (self.current + 1) % self.frames.len();
        true
    }
}

/// What a line displays.
#[derive(Debug, PartialEq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum LineKind {
    /// Formatted text.
    Text { rendered: String },

    /// A floating item identified by its host item id.
    Item { item: String },

    /// Text cycling through frames; needs periodic refresh.
    Animated(Animation),
}

/// One line of a hologram.
///
/// Lines are not `Clone`: each one carries a unique [`LineId`] and at most one
/// live entity.
#[derive(Debug)]
pub struct HologramLine {
    id: LineId,
    raw: String,
    kind: LineKind,
    pub(crate) entity: Option<EntityHandle>,
}

impl HologramLine {
    pub fn new(raw: impl Into<String>, kind: LineKind) -> Self {
        Self {
            id: LineId::next(),
            raw: raw.into(),
            kind,
            entity: None,
        }
    }

    /// Plain text line; `&` colour codes are translated.
    pub fn text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let rendered = translate_colors(&raw);
        Self::new(raw, LineKind::Text { rendered })
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    /// Source text exactly as persisted.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &LineKind {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        (&self.kind).into()
    }

    /// Content currently shown by the entity.
    pub fn rendered(&self) -> &str {
        match &self.kind {
            LineKind::Text { rendered } => rendered,
            LineKind::Item { item } => item,
            LineKind::Animated(animation) => animation.current_frame(),
        }
    }

    pub fn height(&self) -> f64 {
        match self.kind {
            LineKind::Item { .. } => ITEM_LINE_HEIGHT,
            _ => TEXT_LINE_HEIGHT,
        }
    }

    /// True for lines that an update driver must refresh periodically.
    pub fn is_updating(&self) -> bool {
        matches!(self.kind, LineKind::Animated(_))
    }

    /// Entity currently displaying this line, if spawned.
    pub fn entity(&self) -> Option<EntityHandle> {
        self.entity
    }

    /// Advance an animated line by one tick.
    ///
    /// The frame switches once every `interval_ticks` ticks. Returns `true`
    /// only when the displayed content changed; static lines always return
    /// `false`.
    pub fn tick(&mut self) -> bool {
        match &mut self.kind {
            LineKind::Animated(animation) => animation.tick(),
            _ => false,
        }
    }
}

impl PartialEq for HologramLine {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for HologramLine {}

/// Builds typed lines from raw persisted strings.
pub trait LineParser: Send + Sync {
    fn parse(&self, hologram: &Hologram, raw: &str) -> Result<HologramLine, SpawnError>;
}

/// Parser for the built-in line syntax.
///
/// - `item:<id>` shows a floating item
/// - `animated:<ticks>:<frame>||<frame>...` cycles frames every `ticks`
/// - anything else is text with `&` colour codes
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultLineParser;

impl DefaultLineParser {
    fn invalid(raw: &str, reason: impl Into<String>) -> SpawnError {
        SpawnError::InvalidLine {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }

    fn parse_animated(raw: &str, rest: &str) -> Result<HologramLine, SpawnError> {
        let (ticks, frames) = rest
            .split_once(':')
            .ok_or_else(|| Self::invalid(raw, "missing frame interval"))?;

        let interval_ticks: u32 = ticks
            .trim()
            .parse()
            .map_err(|_| Self::invalid(raw, format!("bad frame interval `{ticks}`")))?;

        let frames: Vec<String> = frames
            .split(FRAME_SEPARATOR)
            .filter(|frame| !frame.is_empty())
            .map(translate_colors)
            .collect();
        let animation = Animation::new(frames, interval_ticks)
            .map_err(|err| Self::invalid(raw, err.to_string()))?;

        Ok(HologramLine::new(raw, LineKind::Animated(animation)))
    }
}

impl LineParser for DefaultLineParser {
    fn parse(&self, _hologram: &Hologram, raw: &str) -> Result<HologramLine, SpawnError> {
        if let Some(item) = raw.strip_prefix(ITEM_PREFIX) {
            let item = item.trim();
            if item.is_empty() {
                return Err(Self::invalid(raw, "missing item id"));
            }
            return Ok(HologramLine::new(
                raw,
                LineKind::Item {
                    item: item.to_string(),
                },
            ));
        }

        if let Some(rest) = raw.strip_prefix(ANIMATED_PREFIX) {
            return Self::parse_animated(raw, rest);
        }

        Ok(HologramLine::text(raw))
    }
}

/// Replace `&` colour/format codes with the `§` section sign.
pub fn translate_colors(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&code) if c == '&' && is_format_code(code) => out.push('§'),
            _ => out.push(c),
        }
    }
    out
}

fn is_format_code(code: char) -> bool {
    matches!(code.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r')
}

//! Drawing primitives and the sink they are emitted into.
//!
//! The traversal never talks to a graphics backend directly. It emits
//! [`DrawPrimitive`]s into a [`DrawSink`]; the terminal canvas is one sink and
//! a plain `Vec` is another, which is what tests inspect.

use super::types::{Point, Rect};
use unicode_width::UnicodeWidthStr;

/// RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Color {
    /// Black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// White.
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    /// Bar fill.
    pub const BAR: Self = Self::rgb(0x88, 0xaa, 0xff);
    /// Message lines.
    pub const MESSAGE: Self = Self::rgb(0, 0, 255);
    /// Markers.
    pub const MARK: Self = Self::rgb(0xcc, 0x00, 0x00);
    /// Lifeline spine.
    pub const SPINE: Self = Self::rgb(0x80, 0x80, 0x80);
    /// Selection halo.
    pub const HALO: Self = Self::rgb(0xff, 0x88, 0x00);

    /// Build from components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Stroke/fill attributes of a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// Outline colour; `None` for no outline.
    pub stroke: Option<Color>,
    /// Fill colour (text colour for text); `None` for no fill.
    pub fill: Option<Color>,
    /// Outline width.
    pub line_width: f64,
    /// Dash pattern `(on, off)`; `None` for solid.
    pub dash: Option<(f64, f64)>,
    /// Font size for text.
    pub font_size: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: Some(Color::BLACK),
            fill: None,
            line_width: 1.0,
            dash: None,
            font_size: 12.0,
        }
    }
}

impl Style {
    /// Start from the default style.
    pub fn builder() -> StyleBuilder {
        StyleBuilder {
            style: Style::default(),
        }
    }
}

/// Fluent overrides on top of [`Style::default`].
#[derive(Debug, Clone, Copy)]
pub struct StyleBuilder {
    style: Style,
}

impl StyleBuilder {
    /// Outline colour.
    pub fn stroke(mut self, color: Color) -> Self {
        self.style.stroke = Some(color);
        self
    }

    /// No outline.
    pub fn no_stroke(mut self) -> Self {
        self.style.stroke = None;
        self
    }

    /// Fill colour.
    pub fn fill(mut self, color: Color) -> Self {
        self.style.fill = Some(color);
        self
    }

    /// Outline width.
    pub fn line_width(mut self, width: f64) -> Self {
        self.style.line_width = width;
        self
    }

    /// Dash pattern.
    pub fn dash(mut self, on: f64, off: f64) -> Self {
        self.style.dash = Some((on, off));
        self
    }

    /// Font size.
    pub fn font_size(mut self, size: f64) -> Self {
        self.style.font_size = size;
        self
    }

    /// Finish.
    pub fn build(self) -> Style {
        self.style
    }
}

/// Something the traversal draws.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawPrimitive {
    /// Rectangle.
    Rect {
        /// Geometry.
        rect: Rect,
        /// Style.
        style: Style,
    },
    /// Straight segment.
    Line {
        /// Start.
        from: Point,
        /// End.
        to: Point,
        /// Style.
        style: Style,
    },
    /// Single-line text with its top-left corner at `origin`.
    Text {
        /// Top-left corner.
        origin: Point,
        /// Content.
        text: String,
        /// Style.
        style: Style,
    },
}

/// Average glyph advance relative to the font size.
const GLYPH_ASPECT: f64 = 0.6;

impl DrawPrimitive {
    /// Primitive shifted by `(dx, dy)`.
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        match self {
            DrawPrimitive::Rect { rect, style } => DrawPrimitive::Rect {
                rect: rect.offset(dx, dy),
                style,
            },
            DrawPrimitive::Line { from, to, style } => DrawPrimitive::Line {
                from: from.offset(dx, dy),
                to: to.offset(dx, dy),
                style,
            },
            DrawPrimitive::Text {
                origin,
                text,
                style,
            } => DrawPrimitive::Text {
                origin: origin.offset(dx, dy),
                text,
                style,
            },
        }
    }

    /// Style of the primitive.
    pub fn style(&self) -> &Style {
        match self {
            DrawPrimitive::Rect { style, .. }
            | DrawPrimitive::Line { style, .. }
            | DrawPrimitive::Text { style, .. } => style,
        }
    }

    /// Bounding box.
    pub fn bounds(&self) -> Rect {
        match self {
            DrawPrimitive::Rect { rect, .. } => *rect,
            DrawPrimitive::Line { from, to, .. } => Rect::new(
                from.x.min(to.x),
                from.y.min(to.y),
                (from.x - to.x).abs(),
                (from.y - to.y).abs(),
            ),
            DrawPrimitive::Text {
                origin,
                text,
                style,
            } => Rect::new(
                origin.x,
                origin.y,
                text.width() as f64 * style.font_size * GLYPH_ASPECT,
                style.font_size,
            ),
        }
    }

    /// Highlight drawn beneath a selected primitive.
    pub fn halo(&self) -> DrawPrimitive {
        match self {
            DrawPrimitive::Line { from, to, style } => DrawPrimitive::Line {
                from: *from,
                to: *to,
                style: Style::builder()
                    .stroke(Color::HALO)
                    .line_width(style.line_width + 4.0)
                    .build(),
            },
            DrawPrimitive::Rect { .. } => DrawPrimitive::Rect {
                rect: self.bounds().inflate(3.0),
                style: Style::builder()
                    .stroke(Color::HALO)
                    .line_width(3.0)
                    .build(),
            },
            DrawPrimitive::Text { .. } => DrawPrimitive::Rect {
                rect: self.bounds().inflate(2.0),
                style: Style::builder().no_stroke().fill(Color::HALO).build(),
            },
        }
    }
}

/// Destination for emitted primitives.
pub trait DrawSink {
    /// Accept one primitive in screen coordinates.
    fn draw(&mut self, primitive: &DrawPrimitive);
}

impl DrawSink for Vec<DrawPrimitive> {
    fn draw(&mut self, primitive: &DrawPrimitive) {
        self.push(primitive.clone());
    }
}

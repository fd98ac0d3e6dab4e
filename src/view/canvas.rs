//! Diagram widget: draws primitives on a braille canvas.
//!
//! Primitives arrive in screen pixels with y growing downwards. The canvas
//! has y growing upwards, so every coordinate is flipped against the pixel
//! height of the area.

use super::constants::{PX_PER_COLUMN, PX_PER_ROW};
use crate::view_state::{Color, DrawPrimitive, Point, Viewport};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect as TermRect;
use ratatui::style::{Color as TermColor, Style as TermStyle};
use ratatui::symbols::Marker;
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Context, Line as CanvasLine};
use ratatui::widgets::Widget;

/// Viewport covered by a terminal area at the given scroll offset.
pub fn viewport_for(area: TermRect, scroll_x: f64, scroll_y: f64) -> Viewport {
    Viewport::new(
        scroll_x,
        scroll_y,
        f64::from(area.width) * PX_PER_COLUMN,
        f64::from(area.height) * PX_PER_ROW,
    )
}

/// Screen pixel at the centre of a terminal cell, relative to `area`.
pub fn cell_to_screen(area: TermRect, column: u16, row: u16) -> Option<Point> {
    let inside = column >= area.x
        && column < area.x + area.width
        && row >= area.y
        && row < area.y + area.height;
    inside.then(|| {
        Point::new(
            (f64::from(column - area.x) + 0.5) * PX_PER_COLUMN,
            (f64::from(row - area.y) + 0.5) * PX_PER_ROW,
        )
    })
}

/// Terminal colour for a diagram colour. Black maps to the terminal's
/// default foreground so the diagram stays visible on dark themes.
pub fn terminal_color(color: Color) -> TermColor {
    if color == Color::BLACK {
        TermColor::Reset
    } else {
        TermColor::Rgb(color.r, color.g, color.b)
    }
}

/// Split `from..to` into the visible pieces of an `(on, off)` dash pattern.
pub fn dash_segments(from: Point, to: Point, on: f64, off: f64) -> Vec<(Point, Point)> {
    let length = from.distance(to);
    if length == 0.0 || on <= 0.0 || off < 0.0 {
        return vec![(from, to)];
    }
    let (ux, uy) = ((to.x - from.x) / length, (to.y - from.y) / length);
    let at = |d: f64| Point::new(from.x + ux * d, from.y + uy * d);
    let mut segments = Vec::new();
    let mut start = 0.0;
    while start < length {
        let end = (start + on).min(length);
        segments.push((at(start), at(end)));
        start = end + off;
    }
    segments
}

/// Widget drawing a list of primitives.
pub struct DiagramWidget<'a> {
    primitives: &'a [DrawPrimitive],
}

impl<'a> DiagramWidget<'a> {
    /// Wrap primitives painted for a viewport matching the render area.
    pub fn new(primitives: &'a [DrawPrimitive]) -> Self {
        Self { primitives }
    }
}

impl Widget for DiagramWidget<'_> {
    fn render(self, area: TermRect, buf: &mut Buffer) {
        let width = f64::from(area.width) * PX_PER_COLUMN;
        let height = f64::from(area.height) * PX_PER_ROW;
        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(|ctx| {
                for primitive in self.primitives {
                    paint_primitive(ctx, primitive, height);
                }
            })
            .render(area, buf);
    }
}

fn paint_primitive(ctx: &mut Context<'_>, primitive: &DrawPrimitive, height: f64) {
    let style = primitive.style();
    let Some(color) = style.stroke.or(style.fill) else {
        return;
    };
    let color = terminal_color(color);
    match primitive {
        DrawPrimitive::Line { from, to, style } => match style.dash {
            Some((on, off)) => {
                for (a, b) in dash_segments(*from, *to, on, off) {
                    stroke(ctx, a, b, height, color);
                }
            }
            None => stroke(ctx, *from, *to, height, color),
        },
        DrawPrimitive::Rect { rect, .. } => {
            let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
            stroke(ctx, Point::new(left, top), Point::new(right, top), height, color);
            stroke(ctx, Point::new(right, top), Point::new(right, bottom), height, color);
            stroke(ctx, Point::new(right, bottom), Point::new(left, bottom), height, color);
            stroke(ctx, Point::new(left, bottom), Point::new(left, top), height, color);
        }
        DrawPrimitive::Text { origin, text, style } => {
            // Anchor on the vertical centre so the label shares a row with its entity
            let y = height - (origin.y + style.font_size / 2.0);
            if origin.x < 0.0 || y < 0.0 || y > height {
                return;
            }
            ctx.print(
                origin.x,
                y,
                Span::styled(text.clone(), TermStyle::default().fg(color)),
            );
        }
    }
}

fn stroke(ctx: &mut Context<'_>, a: Point, b: Point, height: f64, color: TermColor) {
    ctx.draw(&CanvasLine::new(a.x, height - a.y, b.x, height - b.y, color));
}

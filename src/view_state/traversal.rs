//! Viewport traversal: the single walk behind painting and picking.
//!
//! For each lifeline overlapping the viewport, [`traverse`] binary-searches
//! the first entity at or below the top of the range, seeds the open call
//! bars from its predecessor's stack snapshot, then walks down. Every stack
//! change closes bars that left the stack and opens bars that joined it.
//! Bars still open at the bottom are closed there.
//!
//! The walk emits primitives through a [`RenderContext`]; its mode decides
//! whether they are painted or scored against a click point.

use super::hit_test::{HitTestResult, Picker};
use super::layout_params::{Anchor, LayoutParams};
use super::primitives::{Color, DrawPrimitive, DrawSink, Style};
use super::types::{Point, Rect, Viewport};
use super::visible_range::VisibleRange;
use crate::model::{
    CommunicationState, EntityIndex, EntityKind, EntityRef, FrameId, FrameRef, Lifeline,
    LifelineEntity, SelectedObject, SequenceModel, YPos,
};

/// What the walk does with each primitive.
pub enum TraversalMode<'a> {
    /// Draw into a sink, haloing the selected object.
    Paint {
        /// Destination.
        sink: &'a mut dyn DrawSink,
        /// Currently selected object.
        selected: Option<SelectedObject>,
    },
    /// Score against a click point.
    Pick(Picker),
}

/// Shared state for one walk over the model.
pub struct RenderContext<'a> {
    model: &'a SequenceModel,
    params: LayoutParams,
    viewport: Viewport,
    range: VisibleRange,
    mode: TraversalMode<'a>,
}

impl<'a> RenderContext<'a> {
    /// Context for walking `model` under `viewport`.
    pub fn new(model: &'a SequenceModel, viewport: Viewport, mode: TraversalMode<'a>) -> Self {
        Self {
            model,
            params: *model.layout_params(),
            viewport,
            range: viewport.visible_range(),
            mode,
        }
    }

    /// Vertical range being walked.
    pub fn range(&self) -> VisibleRange {
        self.range
    }

    /// Whether `lifeline` intersects the viewport at all.
    pub fn is_lifeline_visible(&self, lifeline: &Lifeline) -> bool {
        let (left, right) = self.params.lane_span(lifeline.lane());
        self.viewport.overlaps_x(left, right)
            && self
                .range
                .overlaps(lifeline.start_y(), self.model.lifeline_bottom(lifeline))
    }

    /// Whether the walk visits `entity`.
    fn visits(&self, entity: EntityRef) -> bool {
        let Some(lifeline) = self.model.lifeline(entity.lifeline) else {
            return false;
        };
        let Some(e) = lifeline.entity(entity.entity) else {
            return false;
        };
        self.is_lifeline_visible(lifeline) && self.range.contains(e.y())
    }

    fn emit(&mut self, target: Option<SelectedObject>, primitive: DrawPrimitive) {
        let primitive = primitive.translated(-self.viewport.x, -self.viewport.y);
        match &mut self.mode {
            TraversalMode::Paint { sink, selected } => {
                if target.is_some() && target == *selected {
                    sink.draw(&primitive.halo());
                }
                sink.draw(&primitive);
            }
            TraversalMode::Pick(picker) => {
                if let Some(target) = target {
                    picker.consider(&primitive, target);
                }
            }
        }
    }

    /// Consume the context, returning the pick result (always a miss when
    /// painting).
    pub fn finish(self) -> HitTestResult {
        match self.mode {
            TraversalMode::Pick(picker) => picker.finish(),
            TraversalMode::Paint { .. } => HitTestResult::Miss,
        }
    }
}

/// Paint every visible lifeline into `sink` (screen coordinates).
pub fn paint(
    model: &SequenceModel,
    viewport: Viewport,
    selected: Option<SelectedObject>,
    sink: &mut dyn DrawSink,
) {
    let mut ctx = RenderContext::new(model, viewport, TraversalMode::Paint { sink, selected });
    walk_visible(&mut ctx);
}

/// Find the object under `point` (screen coordinates).
pub fn pick(model: &SequenceModel, viewport: Viewport, point: Point) -> HitTestResult {
    let threshold = model.layout_params().pick_threshold;
    let picker = Picker::new(point, threshold);
    let mut ctx = RenderContext::new(model, viewport, TraversalMode::Pick(picker));
    walk_visible(&mut ctx);
    ctx.finish()
}

fn walk_visible(ctx: &mut RenderContext<'_>) {
    let model = ctx.model;
    let range = ctx.range;
    for lifeline in model.lifelines() {
        if ctx.is_lifeline_visible(lifeline) {
            traverse(ctx, lifeline, range.from(), range.to());
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenBar {
    frame: FrameId,
    top: YPos,
}

/// Walk one lifeline between `y_from` and `y_to` (inclusive).
pub fn traverse(ctx: &mut RenderContext<'_>, lifeline: &Lifeline, y_from: YPos, y_to: YPos) {
    if y_from > y_to {
        return;
    }
    let bottom = ctx.model.lifeline_bottom(lifeline).min(y_to);
    draw_spine(ctx, lifeline, y_from, bottom);

    let start = lifeline.first_at_or_after(y_from);
    let mut open: Vec<OpenBar> = lifeline
        .stack_before(y_from)
        .iter()
        .map(|&frame| OpenBar { frame, top: y_from })
        .collect();

    for (offset, entity) in lifeline.entities()[start..].iter().enumerate() {
        if entity.y() > y_to {
            break;
        }
        reconcile(ctx, lifeline, &mut open, entity.stack(), entity.y());
        draw_entity(ctx, lifeline, EntityIndex::new(start + offset), entity);
    }

    while let Some(bar) = open.pop() {
        let depth = open.len();
        draw_bar(ctx, lifeline, depth, bar, bottom.max(bar.top));
    }
}

/// Close bars that left the stack and open those that joined it at `y`.
fn reconcile(
    ctx: &mut RenderContext<'_>,
    lifeline: &Lifeline,
    open: &mut Vec<OpenBar>,
    stack: &[FrameId],
    y: YPos,
) {
    let keep = open
        .iter()
        .zip(stack)
        .take_while(|(bar, frame)| bar.frame == **frame)
        .count();
    while open.len() > keep {
        if let Some(bar) = open.pop() {
            draw_bar(ctx, lifeline, open.len(), bar, y);
        }
    }
    open.extend(stack[keep..].iter().map(|&frame| OpenBar { frame, top: y }));
}

fn draw_bar(
    ctx: &mut RenderContext<'_>,
    lifeline: &Lifeline,
    depth: usize,
    bar: OpenBar,
    bottom: YPos,
) {
    let params = ctx.params;
    let rect = Rect::new(
        params.bar_xpos(depth, lifeline.lane(), Anchor::Left),
        bar.top.as_f64(),
        params.bar_width,
        (bottom.get().saturating_sub(bar.top.get())) as f64,
    );
    let target = SelectedObject::Frame(FrameRef {
        lifeline: lifeline.key(),
        frame: bar.frame,
    });
    ctx.emit(
        Some(target),
        DrawPrimitive::Rect {
            rect,
            style: Style::builder().fill(Color::BAR).build(),
        },
    );
}

fn draw_spine(ctx: &mut RenderContext<'_>, lifeline: &Lifeline, y_from: YPos, bottom: YPos) {
    let params = ctx.params;
    let top = lifeline
        .start_y()
        .as_f64()
        .max(y_from.as_f64())
        .max(lifeline.start_y().as_f64() + params.title_height);
    let bottom = bottom.as_f64();
    if top >= bottom {
        return;
    }
    let x = params.bar_xpos(0, lifeline.lane(), Anchor::Center);
    ctx.emit(
        None,
        DrawPrimitive::Line {
            from: Point::new(x, top),
            to: Point::new(x, bottom),
            style: Style::builder().stroke(Color::SPINE).dash(2.0, 2.0).build(),
        },
    );
}

fn draw_entity(
    ctx: &mut RenderContext<'_>,
    lifeline: &Lifeline,
    index: EntityIndex,
    entity: &LifelineEntity,
) {
    let target = Some(SelectedObject::Entity(EntityRef {
        lifeline: lifeline.key(),
        entity: index,
    }));
    match entity.kind() {
        EntityKind::LifelineStart => draw_title(ctx, lifeline, entity, target),
        EntityKind::Call => draw_label(ctx, lifeline, entity, target, Color::BLACK),
        EntityKind::Phase => draw_label(ctx, lifeline, entity, target, Color::MESSAGE),
        EntityKind::Return => {}
        EntityKind::Event => draw_mark(ctx, lifeline, entity, target),
        EntityKind::Terminate => draw_end(ctx, lifeline, entity, target),
        EntityKind::Send | EntityKind::Recv => draw_message(ctx, lifeline, entity, target),
    }
}

fn draw_title(
    ctx: &mut RenderContext<'_>,
    lifeline: &Lifeline,
    entity: &LifelineEntity,
    target: Option<SelectedObject>,
) {
    let params = ctx.params;
    let x = params.lane_origin(lifeline.lane()) - LayoutParams::TITLE_INDENT;
    let y = entity.y().as_f64();
    ctx.emit(
        target,
        DrawPrimitive::Rect {
            rect: Rect::new(x, y, params.title_width, params.title_height),
            style: Style::builder().fill(Color::WHITE).build(),
        },
    );
    ctx.emit(
        target,
        DrawPrimitive::Text {
            origin: Point::new(x + 4.0, y + (params.title_height - params.font_size) / 2.0),
            text: lifeline.display_name().to_string(),
            style: text_style(&params, Color::BLACK),
        },
    );
}

fn draw_label(
    ctx: &mut RenderContext<'_>,
    lifeline: &Lifeline,
    entity: &LifelineEntity,
    target: Option<SelectedObject>,
    color: Color,
) {
    let Some(label) = entity.label() else {
        return;
    };
    let params = ctx.params;
    let depth = entity.depth().saturating_sub(1);
    ctx.emit(
        target,
        DrawPrimitive::Text {
            origin: Point::new(
                params.bar_xpos(depth, lifeline.lane(), Anchor::Right) + 2.0,
                entity.y().as_f64(),
            ),
            text: label.to_string(),
            style: text_style(&params, color),
        },
    );
}

fn draw_mark(
    ctx: &mut RenderContext<'_>,
    lifeline: &Lifeline,
    entity: &LifelineEntity,
    target: Option<SelectedObject>,
) {
    let params = ctx.params;
    let half = 4.0;
    let center = Point::new(
        params.bar_xpos(entity.depth(), lifeline.lane(), Anchor::Left) + half,
        entity.y().as_f64() + EntityKind::Event.extent() as f64 / 2.0,
    );
    let style = Style::builder().stroke(Color::MARK).line_width(2.0).build();
    ctx.emit(
        target,
        DrawPrimitive::Line {
            from: center.offset(-half, -half),
            to: center.offset(half, half),
            style,
        },
    );
    ctx.emit(
        target,
        DrawPrimitive::Line {
            from: center.offset(-half, half),
            to: center.offset(half, -half),
            style,
        },
    );
    if let Some(label) = entity.label().filter(|l| !l.is_empty()) {
        ctx.emit(
            target,
            DrawPrimitive::Text {
                origin: Point::new(center.x + half + 4.0, center.y - params.font_size / 2.0),
                text: label.to_string(),
                style: text_style(&params, Color::MARK),
            },
        );
    }
}

fn draw_end(
    ctx: &mut RenderContext<'_>,
    lifeline: &Lifeline,
    entity: &LifelineEntity,
    target: Option<SelectedObject>,
) {
    let params = ctx.params;
    let left = params.lane_origin(lifeline.lane()) - LayoutParams::TITLE_INDENT;
    let y = entity.y().as_f64();
    ctx.emit(
        target,
        DrawPrimitive::Line {
            from: Point::new(left, y),
            to: Point::new(left + params.title_width, y),
            style: Style::builder().line_width(3.0).build(),
        },
    );
}

/// Where a message line meets the lifeline at `entity`.
fn attach_point(ctx: &RenderContext<'_>, entity: EntityRef) -> Option<Point> {
    let lifeline = ctx.model.lifeline(entity.lifeline)?;
    let e = lifeline.entity(entity.entity)?;
    Some(Point::new(
        ctx.params.bar_xpos(e.depth(), lifeline.lane(), Anchor::Left),
        e.y().as_f64() + e.kind().extent() as f64 / 2.0,
    ))
}

fn draw_message(
    ctx: &mut RenderContext<'_>,
    lifeline: &Lifeline,
    entity: &LifelineEntity,
    target: Option<SelectedObject>,
) {
    let params = ctx.params;
    let x = params.bar_xpos(entity.depth(), lifeline.lane(), Anchor::Left);
    let y = entity.y().as_f64() + entity.kind().extent() as f64 / 2.0;
    ctx.emit(
        target,
        DrawPrimitive::Rect {
            rect: Rect::new(x, y - 2.0, 4.0, 4.0),
            style: Style::builder().stroke(Color::MESSAGE).fill(Color::MESSAGE).build(),
        },
    );

    let Some(id) = entity.communication() else {
        return;
    };
    let Some(comm) = ctx.model.communication(id) else {
        return;
    };
    let CommunicationState::Complete { send, recv } = comm.state() else {
        return;
    };
    // The receiving side draws the line; the sender only does when the
    // receiver is not walked, so each line is emitted exactly once.
    let owner = match entity.kind() {
        EntityKind::Recv => true,
        _ => !ctx.visits(recv),
    };
    if !owner {
        return;
    }
    let (Some(from), Some(to)) = (attach_point(ctx, send), attach_point(ctx, recv)) else {
        return;
    };
    ctx.emit(
        Some(SelectedObject::Communication(id)),
        DrawPrimitive::Line {
            from,
            to,
            style: Style::builder().stroke(Color::MESSAGE).dash(6.0, 2.0).build(),
        },
    );
}

fn text_style(params: &LayoutParams, color: Color) -> Style {
    Style::builder()
        .no_stroke()
        .fill(color)
        .font_size(params.font_size)
        .build()
}

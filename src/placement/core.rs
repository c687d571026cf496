use crate::geometry::{Bounds, Point, Rect, Size, clamp};

/// Inset applied to every edge of the parent before clamping the panel.
pub const EDGE_MARGIN: f32 = 8.0;

/// How the panel relates to its trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorMode {
    /// Center the previously selected option over the trigger.
    FreeFloating,
    /// Hug the trigger directly below (or above when space runs out), as a
    /// text-input-like trigger demands.
    AnchoredToTarget,
}

/// Origin the entry scale animation emanates from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformOrigin {
    TopCenter,
    BottomCenter,
    /// Panel-local coordinates of the centered option's midpoint.
    Point(Point),
}

/// Per-axis zero-state scale for the entry animation. Each axis shrinks
/// the panel to the target's footprint, never enlarging past 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryScale {
    pub x: f32,
    pub y: f32,
}

/// One-shot layout snapshot captured after the panel mounts.
///
/// Rects are in the parent's coordinate space before scroll adjustment;
/// the scroll offsets are applied during placement. Recomputed fresh on
/// every open, never reused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayMeasurement {
    pub parent: Rect,
    pub parent_scroll: Point,
    pub target: Rect,
    pub panel: Size,
    /// Visible extent of the scrollable option area.
    pub content_visible: Size,
    /// Natural (unclipped) extent of the option area.
    pub content_natural: Size,
}

/// Derived placement output, ready to be applied verbatim by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub transform_origin: TransformOrigin,
    pub scale: EntryScale,
    pub scroll_top: f32,
    /// Whether the option area needs overflow styling.
    pub overflow: bool,
    pub content_max_width: f32,
    /// Forced minimum width; only set in anchored mode.
    pub content_min_width: Option<f32>,
}

/// Visible rect inset by the edge margin, in the parent's scroll-adjusted
/// coordinate space: the parent's scroll offsets shift every edge so the
/// bounds track the portion of the content actually on screen.
pub fn inset_bounds(measurement: &OverlayMeasurement) -> Bounds {
    let parent = measurement.parent;
    let scroll = measurement.parent_scroll;
    Bounds {
        left: parent.x + scroll.x + EDGE_MARGIN,
        top: parent.y + scroll.y + EDGE_MARGIN,
        right: parent.right() + scroll.x - EDGE_MARGIN,
        bottom: parent.bottom() + scroll.y - EDGE_MARGIN,
    }
}

/// Compute where the panel goes, how its content scrolls, and what the
/// entry animation starts from.
///
/// `centered` is the panel-local rect of the option to keep visible: the
/// current selection, or the middle option when nothing is selected, or
/// `Rect::ZERO` when the panel has no options at all. Callers resolve the
/// target before measuring; this function assumes a valid measurement.
pub fn compute_placement(
    measurement: &OverlayMeasurement,
    centered: Rect,
    mode: AnchorMode,
) -> Placement {
    let bounds = inset_bounds(measurement);
    // Shift the target into the same scroll-adjusted space as the bounds;
    // every position below stays in that one space until the final clamp.
    let target = Rect::new(
        measurement.target.x + measurement.parent_scroll.x,
        measurement.target.y + measurement.parent_scroll.y,
        measurement.target.width,
        measurement.target.height,
    );
    let panel = measurement.panel;

    // Both distances are taken from the target's top edge; scroll
    // compensation below cares about headroom around that edge.
    let space_above = target.y - bounds.top;
    let space_below = bounds.bottom - target.y;

    let max_width = measurement.parent.width - EDGE_MARGIN * 2.0;
    let content_max_width = measurement.content_natural.width.min(max_width);
    let content_min_width = match mode {
        AnchorMode::AnchoredToTarget => Some(target.width),
        AnchorMode::FreeFloating => None,
    };

    let visible = measurement.content_visible.height;
    let overflow = measurement.content_natural.height > visible;
    let mut scroll_top = 0.0;
    if overflow {
        let buffer = visible / 2.0;
        // Center the option within the visible window, then pull back if
        // the target sits too close to an edge for that much travel.
        scroll_top = centered.center_y() - buffer;
        if space_above < buffer {
            scroll_top = centered.y.min(scroll_top + buffer - space_above);
        } else if space_below < buffer {
            scroll_top =
                (centered.bottom() - panel.height).max(scroll_top - buffer + space_below);
        }
        scroll_top = clamp(0.0, scroll_top, measurement.content_natural.height - visible);
    }

    let (raw, transform_origin) = match mode {
        AnchorMode::AnchoredToTarget => {
            let left = target.x;
            let mut top = target.bottom();
            let mut origin = TransformOrigin::TopCenter;
            if top + panel.height > bounds.bottom {
                top = target.y - panel.height;
                origin = TransformOrigin::BottomCenter;
            }
            (Point::new(left, top), origin)
        }
        AnchorMode::FreeFloating => {
            let left = target.x + centered.x;
            let top = target.center_y() - centered.height / 2.0 - centered.y + scroll_top;
            let origin = TransformOrigin::Point(Point::new(
                centered.x + target.width / 2.0,
                centered.center_y() - scroll_top,
            ));
            (Point::new(left, top), origin)
        }
    };

    // A panel larger than the bounds pins to the top-left inset edge.
    let max_left = (bounds.right - panel.width).max(bounds.left);
    let max_top = (bounds.bottom - panel.height).max(bounds.top);
    let position = Point::new(
        clamp(bounds.left, raw.x, max_left),
        clamp(bounds.top, raw.y, max_top),
    );

    Placement {
        position,
        transform_origin,
        scale: EntryScale {
            x: axis_scale(target.width, panel.width),
            y: axis_scale(target.height, panel.height),
        },
        scroll_top,
        overflow,
        content_max_width,
        content_min_width,
    }
}

fn axis_scale(target: f32, panel: f32) -> f32 {
    if panel <= 0.0 {
        return 1.0;
    }
    (target / panel).min(1.0)
}

use crate::canvas::{CompositeMode, DrawingSurface, LineCap, LineJoin, StateGuard};

use super::ScribblePattern;

/// Strokes `pattern` onto `surface` in `color`.
///
/// Each stroke starts with a move to its first point, curves through every
/// interior point towards the midpoint with its successor, and ends with a
/// line to its last point. Strokes multiply over what is beneath them. The
/// surface's style state is restored before returning.
pub fn draw_pattern<S: DrawingSurface + ?Sized>(
    surface: &mut S,
    pattern: &ScribblePattern,
    color: &str,
) {
    let mut surface = StateGuard::new(surface);
    {
        let state = surface.state_mut();
        state.stroke_color = color.to_string();
        state.line_cap = LineCap::Round;
        state.line_join = LineJoin::Round;
        state.composite = CompositeMode::Multiply;
    }

    for stroke in &pattern.strokes {
        let [first, .., last] = stroke.points.as_slice() else {
            continue;
        };
        {
            let state = surface.state_mut();
            state.global_alpha = stroke.opacity;
            state.line_width = stroke.thickness;
        }
        surface.begin_path();
        surface.move_to(first.x, first.y);
        for pair in stroke.points[1..].windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            let mid = current.midpoint(next);
            surface.quadratic_curve_to(current.x, current.y, mid.x, mid.y);
        }
        surface.line_to(last.x, last.y);
        surface.stroke();
    }
}

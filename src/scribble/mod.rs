//! Crossing-out scribbles.
//!
//! Strokes run from one side of the text's bounding box to the other, either
//! roughly horizontally or corner to corner, with a little perpendicular
//! wobble so they read as hand drawn.

mod cache;
mod draw;

use serde::Serialize;

use crate::geometry::{Point, Rect};
use crate::random::SeededRandom;

pub use cache::{PatternCache, PatternKey};
pub use draw::draw_pattern;

/// Every stroke point lies within the bounding box grown by this much.
pub const CONTAINMENT_MARGIN: f32 = 30.0;

const HORIZONTAL_PROBABILITY: f64 = 0.6;
const OVERSHOOT: (f32, f32) = (10.0, 30.0);
const VERTICAL_JITTER: f32 = 15.0;
const WOBBLE: f32 = 8.0;
const POINT_COUNT: (f32, f32) = (6.0, 12.0);
const THICKNESS: (f32, f32) = (2.0, 4.0);
const OPACITY: (f32, f32) = (0.4, 0.8);
const PRESSURE: (f32, f32) = (0.4, 0.8);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    pub thickness: f32,
    pub opacity: f32,
}

impl Stroke {
    /// Polyline length through the stroke's points.
    pub fn length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|pair| pair[0].distance(&pair[1]))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScribblePattern {
    pub strokes: Vec<Stroke>,
}

impl ScribblePattern {
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// The pattern as drawn `progress` of the way through: completed strokes
    /// plus the leading part of the next one.
    pub fn partial(&self, progress: f32) -> ScribblePattern {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let exact = self.strokes.len() as f32 * progress;
        let complete = (exact.floor() as usize).min(self.strokes.len());
        let fraction = exact - complete as f32;

        let mut strokes = self.strokes[..complete].to_vec();
        if fraction > 0.0
            && let Some(next) = self.strokes.get(complete)
        {
            let keep = (next.points.len() as f32 * fraction).floor() as usize;
            if keep > 1 {
                strokes.push(Stroke {
                    points: next.points[..keep].to_vec(),
                    ..next.clone()
                });
            }
        }
        ScribblePattern { strokes }
    }
}

/// Generates the crossing strokes for `bounds`.
///
/// Pure: the same `(bounds, intensity, seed)` always gives bit-identical
/// points. A box with no area produces no strokes.
pub fn generate_pattern(bounds: &Rect, intensity: f32, seed: u32) -> ScribblePattern {
    if bounds.is_degenerate() {
        return ScribblePattern::default();
    }
    let intensity = if intensity.is_finite() {
        intensity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let mut random = SeededRandom::new(seed);
    let limit = bounds.expand(CONTAINMENT_MARGIN);
    let count = (intensity * 6.0 + 4.0).floor() as usize;

    let mut strokes = Vec::with_capacity(count);
    for _ in 0..count {
        let (start, end) = if random.chance(HORIZONTAL_PROBABILITY) {
            horizontal_endpoints(bounds, &mut random)
        } else {
            diagonal_endpoints(bounds, &mut random)
        };
        strokes.push(crossing_stroke(start, end, &limit, &mut random));
    }
    ScribblePattern { strokes }
}

fn overshoot(random: &mut SeededRandom) -> f32 {
    random.range(OVERSHOOT.0, OVERSHOOT.1)
}

fn horizontal_endpoints(bounds: &Rect, random: &mut SeededRandom) -> ((f32, f32), (f32, f32)) {
    let start_x = bounds.x - overshoot(random);
    let end_x = bounds.right() + overshoot(random);
    let y = bounds.y + random.range(bounds.height * 0.2, bounds.height * 0.8);
    let end_y = y + random.range(-VERTICAL_JITTER, VERTICAL_JITTER);
    ((start_x, y), (end_x, end_y))
}

fn diagonal_endpoints(bounds: &Rect, random: &mut SeededRandom) -> ((f32, f32), (f32, f32)) {
    if random.chance(0.5) {
        // top-left to bottom-right
        let start = (bounds.x - overshoot(random), bounds.y - overshoot(random));
        let end = (
            bounds.right() + overshoot(random),
            bounds.bottom() + overshoot(random),
        );
        (start, end)
    } else {
        // top-right to bottom-left
        let start = (bounds.right() + overshoot(random), bounds.y - overshoot(random));
        let end = (bounds.x - overshoot(random), bounds.bottom() + overshoot(random));
        (start, end)
    }
}

fn crossing_stroke(
    start: (f32, f32),
    end: (f32, f32),
    limit: &Rect,
    random: &mut SeededRandom,
) -> Stroke {
    let count = random.range(POINT_COUNT.0, POINT_COUNT.1).floor().max(2.0) as usize;
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let length = (dx * dx + dy * dy).sqrt();
    let normal = if length > 0.0 {
        Some((-dy / length, dx / length))
    } else {
        None
    };

    let mut points = Vec::with_capacity(count);
    for index in 0..count {
        let progress = index as f32 / (count - 1) as f32;
        let mut x = start.0 + dx * progress;
        let mut y = start.1 + dy * progress;
        let interior = index > 0 && index + 1 < count;
        if interior && let Some((nx, ny)) = normal {
            let offset = random.range(-WOBBLE, WOBBLE);
            (x, y) = limit.clamp_point(x + nx * offset, y + ny * offset);
        }
        let pressure = random.range(PRESSURE.0, PRESSURE.1);
        points.push(Point::with_pressure(x, y, pressure));
    }

    Stroke {
        points,
        thickness: random.range(THICKNESS.0, THICKNESS.1),
        opacity: random.range(OPACITY.0, OPACITY.1),
    }
}

//! Drawing surface contract.
//!
//! The engine only needs a handful of 2D primitives: rectangles, measured and
//! filled text, paths made of lines and quadratic curves, and a small bag of
//! style state. [`StateGuard`] scopes changes to that state.

mod svg;

use std::ops::{Deref, DerefMut};

use crate::geometry::Rect;

pub use svg::SvgCanvas;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeMode {
    #[default]
    SourceOver,
    Multiply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub bold: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 10.0,
            bold: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawState {
    pub fill_color: String,
    pub stroke_color: String,
    pub line_width: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub global_alpha: f32,
    pub composite: CompositeMode,
    pub font: FontSpec,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill_color: "#000000".to_string(),
            stroke_color: "#000000".to_string(),
            line_width: 1.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            global_alpha: 1.0,
            composite: CompositeMode::default(),
            font: FontSpec::default(),
        }
    }
}

pub trait DrawingSurface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn state(&self) -> &DrawState;
    fn state_mut(&mut self) -> &mut DrawState;
    fn fill_rect(&mut self, rect: Rect);
    /// Advance width of `text` in the current font.
    fn measure_text(&self, text: &str) -> f32;
    /// Draws `text` horizontally centered on `x` with its middle on `y`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32);
    fn stroke(&mut self);
}

/// Snapshot of the surface's style state, written back on drop.
///
/// Dropping during unwinding restores too, so a panic half way through a
/// stroke leaves the next caller with the style it started from.
pub struct StateGuard<'a, S: DrawingSurface + ?Sized> {
    surface: &'a mut S,
    saved: DrawState,
}

impl<'a, S: DrawingSurface + ?Sized> StateGuard<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        let saved = surface.state().clone();
        Self { surface, saved }
    }
}

impl<S: DrawingSurface + ?Sized> Deref for StateGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> DerefMut for StateGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: DrawingSurface + ?Sized> Drop for StateGuard<'_, S> {
    fn drop(&mut self) {
        *self.surface.state_mut() = std::mem::take(&mut self.saved);
    }
}

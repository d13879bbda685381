mod wrap;

use serde::Serialize;
use tracing::debug;

use crate::font::TextMeasurer;
use crate::geometry::Rect;

pub use wrap::wrap_text;
use wrap::{normalize_segment, split_hard_breaks};

pub const DEFAULT_FONT_FAMILY: &str = "Arial Narrow, Helvetica Neue Condensed, sans-serif";
pub const LINE_HEIGHT_RATIO: f32 = 1.2;
pub const FONT_SIZE_STEP: f32 = 2.0;
/// Largest font size the descent starts from, whatever the options say.
pub const FONT_SIZE_CEILING: f32 = 2048.0;

#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub font_family: String,
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub line_height_ratio: f32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            min_font_size: 20.0,
            max_font_size: 200.0,
            line_height_ratio: LINE_HEIGHT_RATIO,
        }
    }
}

impl LayoutOptions {
    /// `(min, max)` with nonsensical values replaced so the descent terminates.
    fn font_range(&self) -> (f32, f32) {
        let min = if self.min_font_size.is_finite() && self.min_font_size >= 1.0 {
            self.min_font_size
        } else {
            1.0
        };
        let max = if self.max_font_size.is_nan() {
            min
        } else {
            self.max_font_size.min(FONT_SIZE_CEILING).max(min)
        };
        (min, max)
    }

    fn line_height_ratio(&self) -> f32 {
        if self.line_height_ratio.is_finite() && self.line_height_ratio > 0.0 {
            self.line_height_ratio
        } else {
            LINE_HEIGHT_RATIO
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlockLayout {
    pub lines: Vec<String>,
    pub font_size: f32,
    pub line_height: f32,
    pub bounding_box: Rect,
}

impl TextBlockLayout {
    fn empty(area: &Rect, font_size: f32, line_height: f32) -> Self {
        Self {
            lines: Vec::new(),
            font_size,
            line_height,
            bounding_box: Rect::new(area.center_x(), area.center_y(), 0.0, 0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Anchor of each line: horizontal center and vertical middle, matching a
    /// centered, middle-baseline text draw.
    pub fn line_anchors(&self) -> impl Iterator<Item = (&str, f32, f32)> + '_ {
        let center_x = self.bounding_box.center_x();
        let top = self.bounding_box.y;
        self.lines.iter().enumerate().map(move |(index, line)| {
            let y = top + self.line_height * (index as f32 + 0.5);
            (line.as_str(), center_x, y)
        })
    }
}

/// Picks the largest font size, descending in 2px steps, at which every
/// hard-break segment fits on one line and the stacked segments fit the
/// area's height. Falls back to the minimum size when nothing fits.
pub fn fit_font_size(
    text: &str,
    area: &Rect,
    options: &LayoutOptions,
    measurer: &dyn TextMeasurer,
) -> f32 {
    let (min, max) = options.font_range();
    let ratio = options.line_height_ratio();
    let segments: Vec<String> = split_hard_breaks(text)
        .into_iter()
        .map(normalize_segment)
        .collect();
    let line_count = segments.len().max(1) as f32;

    let steps = ((max - min) / FONT_SIZE_STEP).floor() as u32;
    for step in 0..=steps {
        let font_size = max - step as f32 * FONT_SIZE_STEP;
        let widest = segments
            .iter()
            .map(|segment| measurer.measure(segment, font_size))
            .fold(0.0, f32::max);
        let height = font_size * ratio * line_count;
        if widest <= area.width && height <= area.height {
            return font_size;
        }
    }
    min
}

/// Lays out `text` centered in `area`.
///
/// Never fails: empty text yields a layout with no lines and a zero-size box
/// at the area's center, and text that cannot fit even at the minimum size
/// overflows.
pub fn layout_text(
    text: &str,
    area: &Rect,
    options: &LayoutOptions,
    measurer: &dyn TextMeasurer,
) -> TextBlockLayout {
    let (min, _) = options.font_range();
    let ratio = options.line_height_ratio();
    if text.trim().is_empty() {
        return TextBlockLayout::empty(area, min, min * ratio);
    }

    let font_size = fit_font_size(text, area, options, measurer);
    let line_height = font_size * ratio;
    let lines = wrap_text(text, area.width, font_size, measurer);
    let widest = lines
        .iter()
        .map(|line| measurer.measure(line, font_size))
        .fold(0.0, f32::max);
    let block_height = lines.len() as f32 * line_height;
    let bounding_box = Rect::new(
        area.center_x() - widest / 2.0,
        area.center_y() - block_height / 2.0,
        widest,
        block_height,
    );
    debug!(
        "layout: {} line(s) at {}px, box {:.1}x{:.1}",
        lines.len(),
        font_size,
        widest,
        block_height
    );

    TextBlockLayout {
        lines,
        font_size,
        line_height,
        bounding_box,
    }
}

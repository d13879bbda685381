use crate::error::CoverError;
use crate::font::TextMeasurer;
use crate::geometry::Rect;

use super::{CompositeMode, DrawState, DrawingSurface};

const MAX_DIMENSION: u32 = 16_384;

/// Drawing surface that records every primitive as an SVG element.
///
/// The finished document is rasterised by [`crate::export`].
pub struct SvgCanvas<'a> {
    width: u32,
    height: u32,
    state: DrawState,
    body: String,
    path: String,
    measurer: &'a dyn TextMeasurer,
}

impl<'a> SvgCanvas<'a> {
    pub fn new(width: u32, height: u32, measurer: &'a dyn TextMeasurer) -> Result<Self, CoverError> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(CoverError::Render(format!(
                "drawing surface unavailable for {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            state: DrawState::default(),
            body: String::new(),
            path: String::new(),
            measurer,
        })
    }

    pub fn finish(&self) -> String {
        let mut svg = String::with_capacity(self.body.len() + 160);
        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        ));
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }

    /// Opacity and blend attributes shared by every painted element.
    fn paint_attributes(&self) -> String {
        let mut attrs = String::new();
        let alpha = self.state.global_alpha.clamp(0.0, 1.0);
        if alpha < 1.0 {
            attrs.push_str(&format!(r#" opacity="{}""#, alpha));
        }
        if self.state.composite == CompositeMode::Multiply {
            attrs.push_str(r#" style="mix-blend-mode:multiply""#);
        }
        attrs
    }
}

impl DrawingSurface for SvgCanvas<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn state(&self) -> &DrawState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut DrawState {
        &mut self.state
    }

    fn fill_rect(&mut self, rect: Rect) {
        let element = format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="{fill}"{paint}/>"#,
            x = rect.x,
            y = rect.y,
            w = rect.width,
            h = rect.height,
            fill = escape_xml(&self.state.fill_color),
            paint = self.paint_attributes()
        );
        self.body.push_str(&element);
    }

    fn measure_text(&self, text: &str) -> f32 {
        self.measurer.measure(text, self.state.font.size)
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        if text.is_empty() {
            return;
        }
        let font = &self.state.font;
        let weight = if font.bold { "bold" } else { "normal" };
        let element = format!(
            r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" fill="{fill}" text-anchor="middle" dominant-baseline="central"{paint}>{text}</text>"#,
            family = escape_xml(&font.family),
            size = font.size,
            fill = escape_xml(&self.state.fill_color),
            paint = self.paint_attributes(),
            text = escape_xml(text)
        );
        self.body.push_str(&element);
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        push_command(&mut self.path, &format!("M {} {}", x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        push_command(&mut self.path, &format!("L {} {}", x, y));
    }

    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) {
        push_command(&mut self.path, &format!("Q {} {} {} {}", cpx, cpy, x, y));
    }

    fn stroke(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let element = format!(
            r#"<path d="{d}" fill="none" stroke="{stroke}" stroke-width="{width}" stroke-linecap="{cap}" stroke-linejoin="{join}"{paint}/>"#,
            d = self.path,
            stroke = escape_xml(&self.state.stroke_color),
            width = self.state.line_width,
            cap = self.state.line_cap.as_str(),
            join = self.state.line_join.as_str(),
            paint = self.paint_attributes()
        );
        self.body.push_str(&element);
    }
}

fn push_command(path: &mut String, command: &str) {
    if !path.is_empty() {
        path.push(' ');
    }
    path.push_str(command);
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

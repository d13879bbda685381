use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::canvas::{DrawingSurface, FontSpec, StateGuard, SvgCanvas};
use crate::error::{CoverError, ValidationError};
use crate::font::FontContext;
use crate::geometry::Rect;
use crate::layout::{LayoutOptions, TextBlockLayout, layout_text};
use crate::random::seed_from_text;
use crate::scribble::{PatternCache, PatternKey, ScribblePattern, draw_pattern, generate_pattern};
use crate::settings::Settings;

pub const CLEAN_MARGIN: f32 = 20.0;
pub const SCRIBBLE_MARGIN: f32 = 40.0;
pub const PLACEHOLDER_ALPHA: f32 = 0.3;
/// Sub-pixel slack for float rounding when checking the block against the margins.
const FIT_TOLERANCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SizeMode {
    #[default]
    Square,
    Portrait,
}

impl SizeMode {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SizeMode::Square => (600, 600),
            SizeMode::Portrait => (600, 750),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SizeMode::Square => "1:1",
            SizeMode::Portrait => "4:5",
        }
    }
}

impl FromStr for SizeMode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1:1" | "square" | "post" => Ok(SizeMode::Square),
            "4:5" | "portrait" | "feed" => Ok(SizeMode::Portrait),
            _ => Err(ValidationError::UnsupportedSize(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub text: String,
    pub size: SizeMode,
    pub scribble: bool,
    pub background_color: String,
    pub text_color: String,
}

impl RenderConfig {
    pub fn new(text: impl Into<String>, size: SizeMode, scribble: bool) -> Self {
        let defaults = Settings::default();
        Self {
            text: text.into(),
            size,
            scribble,
            background_color: defaults.background_color,
            text_color: defaults.text_color,
        }
    }

    pub fn with_colors(mut self, settings: &Settings) -> Self {
        self.background_color = settings.background_color.clone();
        self.text_color = settings.text_color.clone();
        self
    }

    /// Region the text is fitted into: the canvas minus the margin, which is
    /// wider when scribbles need room to overshoot.
    pub fn text_area(&self) -> Rect {
        self.size.text_area(self.scribble)
    }
}

impl SizeMode {
    pub fn text_area(&self, scribbled: bool) -> Rect {
        let (width, height) = self.dimensions();
        let margin = if scribbled {
            SCRIBBLE_MARGIN
        } else {
            CLEAN_MARGIN
        };
        Rect::new(0.0, 0.0, width as f32, height as f32).inset(margin)
    }
}

/// Input caps. [`InputLimits::validate`] rejects text over any of them;
/// [`InputLimits::clamp`] truncates input so that it passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLimits {
    pub max_chars: usize,
    pub max_lines: usize,
    pub max_line_chars: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_chars: 175,
            max_lines: 5,
            max_line_chars: 35,
        }
    }
}

impl InputLimits {
    /// Keeps the first `max_lines` lines, each cut to `max_line_chars`, and
    /// the whole to `max_chars`.
    pub fn clamp(&self, text: &str) -> String {
        text.split('\n')
            .take(self.max_lines.max(1))
            .map(|line| {
                line.trim_end_matches('\r')
                    .chars()
                    .take(self.max_line_chars)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
            .chars()
            .take(self.max_chars)
            .collect()
    }

    pub fn validate(&self, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let len = text.chars().count();
        if len > self.max_chars {
            return Err(ValidationError::TextTooLong {
                len,
                max: self.max_chars,
            });
        }
        let lines: Vec<&str> = text.split('\n').collect();
        if lines.len() > self.max_lines {
            return Err(ValidationError::TooManyLines {
                lines: lines.len(),
                max: self.max_lines,
            });
        }
        for (index, line) in lines.iter().enumerate() {
            let len = line.trim_end_matches('\r').chars().count();
            if len > self.max_line_chars {
                return Err(ValidationError::LineTooLong {
                    line: index + 1,
                    len,
                    max: self.max_line_chars,
                });
            }
        }
        Ok(())
    }
}

/// A finished drawing plus the primitives it was drawn from.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedCover {
    pub text: String,
    pub size: SizeMode,
    pub placeholder: bool,
    pub layout: TextBlockLayout,
    pub seed: Option<u32>,
    pub pattern: Option<Arc<ScribblePattern>>,
    #[serde(skip)]
    pub svg: String,
}

impl RenderedCover {
    pub fn dimensions(&self) -> (u32, u32) {
        self.size.dimensions()
    }
}

pub struct Renderer {
    fonts: FontContext,
    layout: LayoutOptions,
    limits: InputLimits,
    intensity: f32,
    scribble_color: String,
    placeholder: String,
    cache: PatternCache,
}

impl Renderer {
    pub fn new(fonts: FontContext, settings: &Settings) -> Self {
        Self {
            fonts,
            layout: settings.layout_options(),
            limits: settings.input_limits(),
            intensity: settings.scribble_intensity,
            scribble_color: settings.scribble_color().to_string(),
            placeholder: settings.placeholder.clone(),
            cache: PatternCache::new(settings.cache_capacity),
        }
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    pub fn limits(&self) -> InputLimits {
        self.limits
    }

    pub fn cached_patterns(&self) -> usize {
        self.cache.len()
    }

    /// Draws one cover.
    ///
    /// Blank text is replaced by the faded placeholder and never scribbled.
    /// Validation, including the check that the fitted block stays inside the
    /// margins, runs before the surface is created, so a rejected config
    /// leaves nothing behind.
    pub fn render(&mut self, config: &RenderConfig) -> Result<RenderedCover, CoverError> {
        let placeholder = config.text.trim().is_empty();
        let text = if placeholder {
            self.placeholder.clone()
        } else {
            self.limits.validate(&config.text)?;
            config.text.clone()
        };

        let scribbled = config.scribble && !placeholder;
        let measurer = self.fonts.measurer();
        let area = config.size.text_area(scribbled);
        let layout = layout_text(&text, &area, &self.layout, measurer);
        if !area.expand(FIT_TOLERANCE).contains_rect(&layout.bounding_box) {
            return Err(ValidationError::DoesNotFit {
                font_size: layout.font_size,
            }
            .into());
        }

        let (width, height) = config.size.dimensions();
        let mut canvas = SvgCanvas::new(width, height, measurer)?;

        canvas.state_mut().fill_color = config.background_color.clone();
        canvas.fill_rect(Rect::new(0.0, 0.0, width as f32, height as f32));
        {
            let mut canvas = StateGuard::new(&mut canvas);
            let state = canvas.state_mut();
            state.fill_color = config.text_color.clone();
            state.font = FontSpec {
                family: font_stack(&self.fonts.family, &self.layout.font_family),
                size: layout.font_size,
                bold: true,
            };
            if placeholder {
                state.global_alpha = PLACEHOLDER_ALPHA;
            }
            for (line, x, y) in layout.line_anchors() {
                canvas.fill_text(line, x, y);
            }
        }

        let mut seed = None;
        let mut pattern = None;
        if scribbled {
            let text_seed = seed_from_text(&text);
            let bounds = layout.bounding_box;
            let intensity = self.intensity;
            let key = PatternKey::new(&text, config.size, config.scribble, &bounds, intensity);
            let strokes = self
                .cache
                .get_or_generate(key, || generate_pattern(&bounds, intensity, text_seed));
            draw_pattern(&mut canvas, &strokes, &self.scribble_color);
            seed = Some(text_seed);
            pattern = Some(strokes);
        }

        let svg = canvas.finish();
        info!(
            "render: {} {} line(s) at {}px, {} stroke(s)",
            config.size.label(),
            layout.lines.len(),
            layout.font_size,
            pattern.as_ref().map(|p| p.len()).unwrap_or(0)
        );

        Ok(RenderedCover {
            text,
            size: config.size,
            placeholder,
            layout,
            seed,
            pattern,
            svg,
        })
    }
}

/// Resolved family first, then the configured list for the rasteriser's own
/// fallback.
fn font_stack(resolved: &str, configured: &str) -> String {
    let already_listed = configured
        .split(',')
        .any(|name| name.trim().eq_ignore_ascii_case(resolved));
    if already_listed || resolved.is_empty() {
        configured.to_string()
    } else {
        format!("{}, {}", resolved, configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scribble::CONTAINMENT_MARGIN;

    fn renderer() -> Renderer {
        let settings = Settings::default();
        Renderer::new(FontContext::estimated(&settings.font_family), &settings)
    }

    #[test]
    fn size_mode_parsing() {
        assert_eq!("1:1".parse::<SizeMode>(), Ok(SizeMode::Square));
        assert_eq!(" Portrait ".parse::<SizeMode>(), Ok(SizeMode::Portrait));
        assert_eq!(
            "16:9".parse::<SizeMode>(),
            Err(ValidationError::UnsupportedSize("16:9".to_string()))
        );
        assert_eq!(SizeMode::Portrait.dimensions(), (600, 750));
    }

    #[test]
    fn text_area_margins() {
        let clean = RenderConfig::new("x", SizeMode::Portrait, false).text_area();
        assert_eq!(clean, Rect::new(20.0, 20.0, 560.0, 710.0));
        let scribbled = RenderConfig::new("x", SizeMode::Square, true).text_area();
        assert_eq!(scribbled, Rect::new(40.0, 40.0, 520.0, 520.0));
    }

    #[test]
    fn clamp_truncates_lines_and_length() {
        let limits = InputLimits::default();
        let long_line = "x".repeat(50);
        let text = format!("{long_line}\n2\n3\n4\n5\n6\n7");
        let clamped = limits.clamp(&text);
        let lines: Vec<&str> = clamped.split('\n').collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].chars().count(), 35);
        assert_eq!(lines[4], "5");
        assert_eq!(limits.clamp("short"), "short");
    }

    #[test]
    fn validation() {
        let limits = InputLimits::default();
        assert_eq!(limits.validate(" "), Err(ValidationError::EmptyText));
        assert!(limits.validate("HARD PASS").is_ok());
        assert_eq!(
            limits.validate(&"a".repeat(176)),
            Err(ValidationError::TextTooLong { len: 176, max: 175 })
        );
    }

    #[test]
    fn hard_pass_square_with_scribble() {
        let mut renderer = renderer();
        let config = RenderConfig::new("HARD PASS", SizeMode::Square, true);
        let cover = renderer.render(&config).expect("render");
        assert!(!cover.placeholder);
        assert_eq!(cover.layout.lines, vec!["HARD PASS"]);
        let bounds = cover.layout.bounding_box;
        assert!((bounds.center_x() - 300.0).abs() < 1e-3);
        assert!(config.text_area().contains_rect(&bounds));

        let pattern = cover.pattern.as_ref().expect("pattern");
        assert!((4..=10).contains(&pattern.len()));
        let limit = bounds.expand(CONTAINMENT_MARGIN);
        for stroke in &pattern.strokes {
            assert!(stroke.points.iter().all(|p| limit.contains(p.x, p.y)));
            let xs = stroke.points.iter().map(|p| p.x);
            let min_x = xs.clone().fold(f32::MAX, f32::min);
            let max_x = xs.fold(f32::MIN, f32::max);
            assert!(min_x < bounds.x && max_x > bounds.right());
        }
        assert_eq!(cover.seed, Some(seed_from_text("HARD PASS")));
        assert!(cover.svg.contains(">HARD PASS</text>"));
        assert!(cover.svg.contains("mix-blend-mode:multiply"));
    }

    #[test]
    fn blank_text_renders_placeholder() {
        let mut renderer = renderer();
        let cover = renderer
            .render(&RenderConfig::new("", SizeMode::Square, true))
            .expect("render");
        assert!(cover.placeholder);
        assert_eq!(cover.text, "Text Here");
        assert_eq!(cover.layout.lines, vec!["Text Here"]);
        assert!(cover.pattern.is_none());
        assert!(cover.svg.contains(r#"opacity="0.3">Text Here</text>"#));
        assert!(!cover.svg.contains("<path"));
    }

    #[test]
    fn too_many_lines_are_rejected() {
        let mut renderer = renderer();
        let text = (1..=30).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");
        let err = renderer
            .render(&RenderConfig::new(text, SizeMode::Square, true))
            .expect_err("too many lines");
        assert!(matches!(
            err,
            CoverError::Validation(ValidationError::TooManyLines { lines: 30, max: 5 })
        ));
        assert_eq!(renderer.cached_patterns(), 0);
    }

    #[test]
    fn over_long_line_is_rejected() {
        let mut renderer = renderer();
        let text = format!("brat\n{}", "W".repeat(60));
        let err = renderer
            .render(&RenderConfig::new(text, SizeMode::Square, true))
            .expect_err("line too long");
        assert!(matches!(
            err,
            CoverError::Validation(ValidationError::LineTooLong {
                line: 2,
                len: 60,
                max: 35
            })
        ));
    }

    #[test]
    fn text_wider_than_margins_at_minimum_size_is_rejected() {
        let mut renderer = renderer();
        let err = renderer
            .render(&RenderConfig::new("字".repeat(35), SizeMode::Square, true))
            .expect_err("does not fit");
        assert!(matches!(
            err,
            CoverError::Validation(ValidationError::DoesNotFit { .. })
        ));
    }

    #[test]
    fn accepted_text_stays_inside_margins() {
        let mut renderer = renderer();
        let widest_line = "W".repeat(35);
        let inputs = [
            widest_line.clone(),
            vec![widest_line.as_str(); 4].join("\n"),
            "1\n2\n3\n4\n5".to_string(),
        ];
        for text in inputs {
            for size in [SizeMode::Square, SizeMode::Portrait] {
                for scribble in [true, false] {
                    let config = RenderConfig::new(text.clone(), size, scribble);
                    let cover = renderer.render(&config).expect("render");
                    let (width, height) = size.dimensions();
                    let margin = if scribble { SCRIBBLE_MARGIN } else { CLEAN_MARGIN };
                    let allowed = Rect::new(0.0, 0.0, width as f32, height as f32)
                        .inset(margin)
                        .expand(FIT_TOLERANCE);
                    assert!(allowed.contains_rect(&cover.layout.bounding_box));
                }
            }
        }
    }

    #[test]
    fn clamped_input_always_validates() {
        let limits = InputLimits::default();
        let text = vec!["y".repeat(80); 9].join("\n");
        let clamped = limits.clamp(&text);
        assert_eq!(limits.validate(&clamped), Ok(()));
        assert_eq!(clamped.chars().count(), 175);
    }

    #[test]
    fn placeholder_uses_the_clean_margin() {
        let mut renderer = renderer();
        let cover = renderer
            .render(&RenderConfig::new("  ", SizeMode::Square, true))
            .expect("render");
        assert!(cover.placeholder);
        assert_eq!(cover.layout.font_size, 124.0);
        let clean = SizeMode::Square.text_area(false);
        assert!(clean.contains_rect(&cover.layout.bounding_box));
        assert!(cover.layout.bounding_box.width > SizeMode::Square.text_area(true).width);
    }

    #[test]
    fn too_long_text_is_rejected_before_drawing() {
        let mut renderer = renderer();
        let config = RenderConfig::new("a".repeat(500), SizeMode::Square, true);
        let err = renderer.render(&config).expect_err("too long");
        assert!(matches!(
            err,
            CoverError::Validation(ValidationError::TextTooLong { .. })
        ));
        assert_eq!(renderer.cached_patterns(), 0);
    }

    #[test]
    fn same_text_twice_same_strokes() {
        let mut first = renderer();
        let mut second = renderer();
        let config = RenderConfig::new("so julia", SizeMode::Portrait, true);
        let a = first.render(&config).expect("render");
        let b = second.render(&config).expect("render");
        assert_eq!(a.pattern, b.pattern);
        assert_eq!(a.svg, b.svg);
    }

    #[test]
    fn repeat_render_hits_the_cache() {
        let mut renderer = renderer();
        let config = RenderConfig::new("360", SizeMode::Square, true);
        let a = renderer.render(&config).expect("render");
        let b = renderer.render(&config).expect("render");
        let (a, b) = (a.pattern.expect("a"), b.pattern.expect("b"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(renderer.cached_patterns(), 1);

        renderer
            .render(&RenderConfig::new("360", SizeMode::Portrait, true))
            .expect("render");
        assert_eq!(renderer.cached_patterns(), 2);
    }

    #[test]
    fn scribble_disabled_draws_no_strokes() {
        let mut renderer = renderer();
        let cover = renderer
            .render(&RenderConfig::new("brat", SizeMode::Square, false))
            .expect("render");
        assert!(cover.pattern.is_none());
        assert!(cover.seed.is_none());
        assert!(!cover.svg.contains("<path"));
    }

    #[test]
    fn colors_come_from_config() {
        let mut renderer = renderer();
        let settings = Settings {
            background_color: "#ffffff".to_string(),
            text_color: "#222222".to_string(),
            ..Settings::default()
        };
        let config = RenderConfig::new("brat", SizeMode::Square, false).with_colors(&settings);
        let cover = renderer.render(&config).expect("render");
        assert!(cover.svg.contains(r##"fill="#ffffff""##));
        assert!(cover.svg.contains(r##"fill="#222222""##));
    }

    #[test]
    fn font_stack_avoids_duplicates() {
        assert_eq!(font_stack("Arial Narrow", "Arial Narrow, sans-serif"), "Arial Narrow, sans-serif");
        assert_eq!(font_stack("DejaVu Sans", "Arial Narrow"), "DejaVu Sans, Arial Narrow");
    }
}

use anyhow::{Context, Result};
use std::path::Path;

pub mod canvas;
pub mod error;
pub mod export;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod random;
pub mod render;
pub mod scheduler;
pub mod scribble;
pub mod settings;

pub use error::{CoverError, ValidationError};
pub use export::{ExportedImage, export_filename, export_png};
pub use font::{EstimatedMetrics, FontContext, TextMeasurer};
pub use geometry::{Point, Rect};
pub use layout::{LayoutOptions, TextBlockLayout, layout_text, wrap_text};
pub use random::{SeededRandom, seed_from_text};
pub use render::{InputLimits, RenderConfig, RenderedCover, Renderer, SizeMode};
pub use scheduler::FrameScheduler;
pub use scribble::{ScribblePattern, Stroke, draw_pattern, generate_pattern};
pub use settings::Settings;

/// Families tried after the configured list when resolving system fonts.
pub const FALLBACK_FONTS: &[&str] = &[
    "Liberation Sans Narrow",
    "Arial",
    "Helvetica",
    "Liberation Sans",
    "DejaVu Sans",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub text: String,
    pub size: String,
    pub scribble: bool,
    pub scale: Option<f32>,
    pub settings_path: Option<String>,
    /// Truncate over-long input instead of rejecting it.
    pub clamp_input: bool,
}

pub struct Generated {
    pub cover: RenderedCover,
    pub image: ExportedImage,
}

pub fn build_renderer(settings: &Settings) -> Result<Renderer> {
    let fonts = font::resolve_font(
        settings.font_path.as_deref().map(Path::new),
        &settings.font_family,
        FALLBACK_FONTS,
    )
    .with_context(|| "failed to resolve cover font")?;
    Ok(Renderer::new(fonts, settings))
}

pub async fn run(config: Config) -> Result<Generated> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let mut renderer = build_renderer(&settings)?;
    generate(&mut renderer, &settings, &config).await
}

/// Renders and exports one cover with an existing renderer, so repeated
/// calls share its pattern cache.
pub async fn generate(
    renderer: &mut Renderer,
    settings: &Settings,
    config: &Config,
) -> Result<Generated> {
    let size: SizeMode = if config.size.trim().is_empty() {
        SizeMode::default()
    } else {
        config.size.parse().map_err(CoverError::from)?
    };
    let text = if config.clamp_input {
        renderer.limits().clamp(&config.text)
    } else {
        config.text.clone()
    };
    let render_config = RenderConfig::new(text, size, config.scribble).with_colors(settings);
    let cover = renderer.render(&render_config)?;
    let scale = config.scale.unwrap_or(settings.export_scale);
    let image = export_png(&cover, scale, renderer.fonts()).await?;
    Ok(Generated { cover, image })
}

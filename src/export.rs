use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use resvg::render;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::{Pixmap, Transform};
use tracing::{debug, info};
use usvg::{Options, Tree, fontdb};

use crate::error::CoverError;
use crate::font::FontContext;
use crate::render::RenderedCover;

pub const PNG_MIME: &str = "image/png";
pub const MAX_SCALE: f32 = 8.0;
const SLUG_CHARS: usize = 20;

#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub filename: String,
}

impl ExportedImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", PNG_MIME, BASE64.encode(&self.bytes))
    }
}

/// Rasterises a finished cover to PNG off the calling thread.
///
/// Only the SVG drawing is read, so a failed export can simply be retried on
/// the same cover.
pub async fn export_png(
    cover: &RenderedCover,
    scale: f32,
    fonts: &FontContext,
) -> Result<ExportedImage, CoverError> {
    let svg = cover.svg.clone();
    let database = Arc::clone(&fonts.database);
    let (bytes, width, height) =
        tokio::task::spawn_blocking(move || rasterize_png(&svg, scale, database))
            .await
            .map_err(|err| CoverError::Export(format!("export task failed: {}", err)))??;
    let filename = export_filename(&cover.text, now_millis());
    info!("export: {} ({}x{}, {} bytes)", filename, width, height, bytes.len());
    Ok(ExportedImage {
        bytes,
        width,
        height,
        filename,
    })
}

pub fn rasterize_png(
    svg: &str,
    scale: f32,
    database: Arc<fontdb::Database>,
) -> Result<(Vec<u8>, u32, u32), CoverError> {
    if !scale.is_finite() || scale <= 0.0 || scale > MAX_SCALE {
        return Err(CoverError::Export(format!(
            "scale must be within (0, {}], got {}",
            MAX_SCALE, scale
        )));
    }
    let options = Options {
        fontdb: database,
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options)
        .map_err(|err| CoverError::Export(format!("failed to parse SVG: {}", err)))?;
    let size = tree.size();
    let width = (size.width() * scale).round() as u32;
    let height = (size.height() * scale).round() as u32;
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| CoverError::Export(format!("cannot allocate {}x{} pixmap", width, height)))?;
    render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    debug!("export: rasterised {}x{} at {}x", width, height, scale);

    let image = image::RgbaImage::from_raw(width, height, pixmap.data().to_vec())
        .ok_or_else(|| CoverError::Export("failed to build image buffer".to_string()))?;
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|err| CoverError::Export(format!("failed to encode PNG: {}", err)))?;
    Ok((bytes, width, height))
}

/// `brat-<slug>-<millis>.png`, or `brat-<millis>.png` when the text has no
/// usable characters.
pub fn export_filename(text: &str, timestamp_millis: i128) -> String {
    let mut slug = String::new();
    for ch in text.chars().take(SLUG_CHARS) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        format!("brat-{}.png", timestamp_millis)
    } else {
        format!("brat-{}-{}.png", slug, timestamp_millis)
    }
}

fn now_millis() -> i128 {
    time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

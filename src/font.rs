use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use ttf_parser::Face;
use ttf_parser::name_id;
use usvg::fontdb;

/// Measures the advance width of a single line of text.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font_size: f32) -> f32;
}

/// Width estimate by character class, used when no font file is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedMetrics;

impl TextMeasurer for EstimatedMetrics {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        estimate_text_width_units(text) * font_size
    }
}

#[derive(Clone)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    units_per_em: u16,
    space_advance: u16,
    family: Option<String>,
    face_index: u32,
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }
}

impl std::fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMetrics")
            .field("family", &self.family)
            .field("units_per_em", &self.units_per_em)
            .field("face_index", &self.face_index)
            .finish()
    }
}

impl TextMeasurer for FontMetrics {
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        let Ok(face) = Face::parse(&self.data, self.face_index) else {
            return EstimatedMetrics.measure(text, font_size);
        };
        let mut advance = 0u32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            if ch == ' ' {
                advance = advance.saturating_add(self.space_advance as u32);
                continue;
            }
            let glyph_advance = face
                .glyph_index(ch)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .unwrap_or(self.space_advance);
            advance = advance.saturating_add(glyph_advance as u32);
        }
        let units = self.units_per_em.max(1) as f32;
        advance as f32 * (font_size / units)
    }
}

/// Font database for rasterising plus the metrics used for layout.
///
/// `metrics` is `None` when no usable face was found; layout then falls back
/// to [`EstimatedMetrics`].
#[derive(Clone)]
pub struct FontContext {
    pub database: Arc<fontdb::Database>,
    pub metrics: Option<FontMetrics>,
    pub family: String,
}

impl FontContext {
    /// Context without any fonts loaded. Layout uses estimates.
    pub fn estimated(family: &str) -> Self {
        Self {
            database: Arc::new(fontdb::Database::new()),
            metrics: None,
            family: family.to_string(),
        }
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        match &self.metrics {
            Some(metrics) => metrics,
            None => &EstimatedMetrics,
        }
    }
}

/// Resolves the cover font: an explicit file wins, then each family of the
/// comma-separated `family_list`, then `fallback`.
pub fn resolve_font(
    font_path: Option<&Path>,
    family_list: &str,
    fallback: &[&str],
) -> Result<FontContext> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    if let Some(path) = font_path {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read font: {}", path.display()))?;
        let metrics = load_font_metrics_from_data(&data, 0)
            .with_context(|| format!("failed to parse font: {}", path.display()))?;
        db.load_font_data(data);
        let family = metrics
            .family()
            .map(|name| name.to_string())
            .unwrap_or_else(|| first_family(family_list));
        debug!("font: loaded {} from {}", family, path.display());
        return Ok(FontContext {
            database: Arc::new(db),
            metrics: Some(metrics),
            family,
        });
    }

    let candidates = split_family_list(family_list)
        .into_iter()
        .chain(fallback.iter().map(|name| name.to_string()));
    for candidate in candidates {
        match load_font_metrics_from_family(&db, &candidate) {
            Ok(metrics) => {
                let family = metrics
                    .family()
                    .map(|name| name.to_string())
                    .unwrap_or(candidate);
                debug!("font: resolved system family {}", family);
                return Ok(FontContext {
                    database: Arc::new(db),
                    metrics: Some(metrics),
                    family,
                });
            }
            Err(err) => debug!("font: {} unavailable ({})", candidate, err),
        }
    }

    warn!("no system font matched '{}'; using width estimates", family_list);
    Ok(FontContext {
        database: Arc::new(db),
        metrics: None,
        family: first_family(family_list),
    })
}

pub(crate) fn split_family_list(family_list: &str) -> Vec<String> {
    family_list
        .split(',')
        .map(|name| name.trim().trim_matches(|ch| ch == '"' || ch == '\'').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn first_family(family_list: &str) -> String {
    split_family_list(family_list)
        .into_iter()
        .next()
        .unwrap_or_else(|| "sans-serif".to_string())
}

fn load_font_metrics_from_family(db: &fontdb::Database, family: &str) -> Result<FontMetrics> {
    let families = match family.to_ascii_lowercase().as_str() {
        "sans-serif" => vec![fontdb::Family::SansSerif],
        "serif" => vec![fontdb::Family::Serif],
        "monospace" => vec![fontdb::Family::Monospace],
        _ => vec![fontdb::Family::Name(family)],
    };
    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight::BOLD,
        ..Default::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| anyhow!("font not found: {}", family))?;
    let (data, face_index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| anyhow!("failed to load font data: {}", family))?;
    load_font_metrics_from_data(&data, face_index)
}

fn load_font_metrics_from_data(data: &[u8], face_index: u32) -> Result<FontMetrics> {
    let face = Face::parse(data, face_index).map_err(|err| anyhow!("{}", err))?;
    let units_per_em = face.units_per_em().max(1);
    let space_advance = face
        .glyph_index(' ')
        .and_then(|id| face.glyph_hor_advance(id))
        .unwrap_or(units_per_em / 2);
    Ok(FontMetrics {
        data: Arc::new(data.to_vec()),
        units_per_em,
        space_advance,
        family: extract_family_name(&face),
        face_index,
    })
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

fn estimate_char_units(ch: char) -> f32 {
    if ch.is_whitespace() {
        0.25
    } else if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
        0.6
    } else if ch.is_ascii_alphanumeric() {
        0.5
    } else if ch.is_ascii() {
        0.35
    } else if matches!(
        ch as u32,
        0x4E00..=0x9FFF | 0x3040..=0x30FF | 0x31F0..=0x31FF
    ) {
        1.0
    } else {
        0.9
    }
}

fn estimate_text_width_units(text: &str) -> f32 {
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(estimate_char_units)
        .sum()
}

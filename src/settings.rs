use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::layout::{DEFAULT_FONT_FAMILY, LayoutOptions};
use crate::render::InputLimits;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_path: Option<String>,
    pub min_font_size: f32,
    pub max_font_size: f32,
    pub placeholder: String,
    pub scribble_intensity: f32,
    pub scribble_color: Option<String>,
    pub cache_capacity: usize,
    pub max_chars: usize,
    pub max_lines: usize,
    pub max_line_chars: usize,
    pub export_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            background_color: "#BEFF34".to_string(),
            text_color: "#000000".to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_path: None,
            min_font_size: 20.0,
            max_font_size: 200.0,
            placeholder: "Text Here".to_string(),
            scribble_intensity: 0.6,
            scribble_color: None,
            cache_capacity: 32,
            max_chars: 175,
            max_lines: 5,
            max_line_chars: 35,
            export_scale: 2.0,
        }
    }
}

impl Settings {
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            font_family: self.font_family.clone(),
            min_font_size: self.min_font_size,
            max_font_size: self.max_font_size,
            ..LayoutOptions::default()
        }
    }

    pub fn input_limits(&self) -> InputLimits {
        InputLimits {
            max_chars: self.max_chars,
            max_lines: self.max_lines,
            max_line_chars: self.max_line_chars,
        }
    }

    pub fn scribble_color(&self) -> &str {
        self.scribble_color.as_deref().unwrap_or(&self.text_color)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    canvas: Option<CanvasSettings>,
    text: Option<TextSettings>,
    scribble: Option<ScribbleSettings>,
    input: Option<InputSettings>,
    export: Option<ExportSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct CanvasSettings {
    background_color: Option<String>,
    text_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TextSettings {
    font_family: Option<String>,
    font_path: Option<String>,
    min_font_size: Option<f32>,
    max_font_size: Option<f32>,
    placeholder: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScribbleSettings {
    intensity: Option<f32>,
    color: Option<String>,
    cache_capacity: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct InputSettings {
    max_chars: Option<usize>,
    max_lines: Option<usize>,
    max_line_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ExportSettings {
    scale: Option<f32>,
}

/// Built-in defaults, then `settings.toml` / `settings.local.toml` in the
/// working directory and in `~/.brat-cover`, then `extra_path`.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }
    load_settings_from(&ordered_paths)
}

/// Layers every existing file of `paths`, in order, over the defaults.
pub fn load_settings_from(paths: &[PathBuf]) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);

    for path in paths {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }
    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(canvas) = incoming.canvas {
            merge_string(&mut self.background_color, canvas.background_color);
            merge_string(&mut self.text_color, canvas.text_color);
        }
        if let Some(text) = incoming.text {
            merge_string(&mut self.font_family, text.font_family);
            merge_optional_string(&mut self.font_path, text.font_path);
            merge_string(&mut self.placeholder, text.placeholder);
            if let Some(size) = text.min_font_size
                && size > 0.0
            {
                self.min_font_size = size;
            }
            if let Some(size) = text.max_font_size
                && size > 0.0
            {
                self.max_font_size = size;
            }
        }
        if let Some(scribble) = incoming.scribble {
            if let Some(intensity) = scribble.intensity
                && intensity.is_finite()
            {
                self.scribble_intensity = intensity.clamp(0.0, 1.0);
            }
            merge_optional_string(&mut self.scribble_color, scribble.color);
            if let Some(capacity) = scribble.cache_capacity {
                self.cache_capacity = capacity;
            }
        }
        if let Some(input) = incoming.input {
            merge_limit(&mut self.max_chars, input.max_chars);
            merge_limit(&mut self.max_lines, input.max_lines);
            merge_limit(&mut self.max_line_chars, input.max_line_chars);
        }
        if let Some(export) = incoming.export
            && let Some(scale) = export.scale
            && scale > 0.0
        {
            self.export_scale = scale;
        }
    }
}

fn merge_string(target: &mut String, value: Option<String>) {
    if let Some(value) = value
        && !value.trim().is_empty()
    {
        *target = value;
    }
}

fn merge_optional_string(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value
        && !value.trim().is_empty()
    {
        *target = Some(value);
    }
}

fn merge_limit(target: &mut usize, value: Option<usize>) {
    if let Some(limit) = value
        && limit > 0
    {
        *target = limit;
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".brat-cover"))
        }
    })
}

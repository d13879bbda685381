use brat_cover::settings::Settings;
use brat_cover::{
    Config, EstimatedMetrics, FontContext, LayoutOptions, Rect, RenderConfig, Renderer, SizeMode,
    export_filename, layout_text,
};

fn renderer(settings: &Settings) -> Renderer {
    Renderer::new(FontContext::estimated(&settings.font_family), settings)
}

#[test]
fn export_filename_snapshot() {
    insta::assert_snapshot!(
        export_filename("HARD PASS!", 1_700_000_000_000),
        @"brat-hard-pass-1700000000000.png"
    );
}

#[test]
fn hard_pass_square_cover() {
    let settings = Settings::default();
    let mut renderer = renderer(&settings);
    let cover = renderer
        .render(&RenderConfig::new("HARD PASS", SizeMode::Square, true).with_colors(&settings))
        .unwrap();

    insta::assert_json_snapshot!(cover.layout.lines, @r#"
    [
      "HARD PASS"
    ]
    "#);
    let bounds = cover.layout.bounding_box;
    assert!((bounds.center_x() - 300.0).abs() < 1e-3);

    let pattern = cover.pattern.as_ref().unwrap();
    assert!((4..=10).contains(&pattern.len()));
    for stroke in &pattern.strokes {
        let first = stroke.points.first().unwrap();
        let last = stroke.points.last().unwrap();
        let crosses_x = first.x < bounds.x && last.x > bounds.right();
        let crosses_y = first.y < bounds.y && last.y > bounds.bottom();
        assert!(crosses_x || crosses_y, "stroke misses the text block");
    }
    assert!(cover.svg.contains("#BEFF34"));
}

#[test]
fn empty_text_renders_placeholder() {
    let settings = Settings::default();
    let mut renderer = renderer(&settings);
    let cover = renderer
        .render(&RenderConfig::new("", SizeMode::Portrait, true))
        .unwrap();
    assert!(cover.placeholder);
    assert_eq!(cover.text, "Text Here");
    assert!(cover.pattern.is_none());
    assert_eq!(cover.dimensions(), (600, 750));
}

#[test]
fn unbreakable_word_overflows_at_minimum_size() {
    let word = "x".repeat(60);
    let area = Rect::new(0.0, 0.0, 520.0, 520.0);
    let layout = layout_text(&word, &area, &LayoutOptions::default(), &EstimatedMetrics);
    assert_eq!(layout.lines, vec![word]);
    assert_eq!(layout.font_size, 20.0);
    assert!(layout.bounding_box.width > area.width);
}

#[test]
fn same_text_same_strokes() {
    let settings = Settings::default();
    let config = RenderConfig::new("brat summer", SizeMode::Square, true);
    let first = renderer(&settings).render(&config).unwrap();
    let second = renderer(&settings).render(&config).unwrap();
    assert_eq!(first.seed, second.seed);
    assert_eq!(first.pattern, second.pattern);
    assert_eq!(first.svg, second.svg);
}

#[tokio::test]
async fn generate_exports_scaled_png() {
    let settings = Settings::default();
    let mut renderer = renderer(&settings);
    let config = Config {
        text: "HARD PASS".to_string(),
        size: "4:5".to_string(),
        scribble: true,
        ..Config::default()
    };
    let generated = brat_cover::generate(&mut renderer, &settings, &config)
        .await
        .unwrap();
    assert_eq!((generated.image.width, generated.image.height), (1200, 1500));
    assert!(generated.image.filename.starts_with("brat-hard-pass-"));
    assert_eq!(renderer.cached_patterns(), 1);
}

#[tokio::test]
async fn generate_rejects_unknown_size() {
    let settings = Settings::default();
    let mut renderer = renderer(&settings);
    let config = Config {
        text: "HARD PASS".to_string(),
        size: "16:9".to_string(),
        ..Config::default()
    };
    let err = brat_cover::generate(&mut renderer, &settings, &config)
        .await
        .err()
        .unwrap();
    assert!(err.to_string().contains("16:9"));
}

#[tokio::test]
async fn generate_rejects_extra_lines_unless_clamped() {
    let settings = Settings::default();
    let mut renderer = renderer(&settings);
    let mut config = Config {
        text: vec!["brat"; 8].join("\n"),
        size: "1:1".to_string(),
        scribble: true,
        ..Config::default()
    };
    let err = brat_cover::generate(&mut renderer, &settings, &config)
        .await
        .err()
        .unwrap();
    insta::assert_snapshot!(err.to_string(), @"invalid input: too many lines (8, max 5)");

    config.clamp_input = true;
    let generated = brat_cover::generate(&mut renderer, &settings, &config)
        .await
        .unwrap();
    assert_eq!(generated.cover.layout.lines.len(), 5);
}

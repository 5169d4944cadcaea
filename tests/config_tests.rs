use praline_reel::config::Configuration;
use praline_reel::frames::DimensionPolicy;
use praline_reel::processing::layout::FitMode;
use praline_reel::region::RegionKind;
use praline_reel::scroll::ProgressFormula;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn empty_document_uses_defaults() {
    let cfg: Configuration = serde_yaml::from_str("{}").unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.asset_root, PathBuf::from("public"));
    assert_eq!(cfg.main.frames, "/frames/ezgif-frame-{frame}.jpg");
    assert_eq!(cfg.footer.frames, "/footer/ezgif-frame-{frame}.jpg");
    assert_eq!(cfg.main.frame_count, 192);
    assert_eq!(cfg.main.preload_timeout, Duration::from_secs(30));
    assert_eq!(cfg.captions.len(), 4);
    assert!((cfg.caption_reveal_threshold_px - 100.0).abs() < f32::EPSILON);
}

#[test]
fn parse_kebab_case_config() {
    let yaml = r##"
asset-root: "/srv/site"
background-color: "#101010"
resize-debounce: 250ms
caption-reveal-threshold-px: 80
page:
  animation-vh: 5
main:
  frames: "/seq/main-{frame}.png"
  frame-count: 24
  fit: cover
  preload-timeout: 5s
footer:
  frames: "/seq/footer-{frame}.png"
  frame-count: 12
  progress: spacer
  dimension-policy: strict
captions:
  - frame-start: 0
    frame-end: 11
    text: "Opening"
  - frame-start: 12
    frame-end: 23
    text: "Closing"
"##;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.asset_root, PathBuf::from("/srv/site"));
    assert_eq!(cfg.resize_debounce, Duration::from_millis(250));
    assert!((cfg.page.animation_vh - 5.0).abs() < f32::EPSILON);
    assert!((cfg.page.hero_vh - 1.0).abs() < f32::EPSILON);
    assert_eq!(cfg.main.fit, FitMode::Cover);
    assert_eq!(cfg.main.progress, ProgressFormula::Section);
    assert_eq!(cfg.main.preload_timeout, Duration::from_secs(5));
    assert_eq!(cfg.footer.dimension_policy, DimensionPolicy::Strict);
    assert_eq!(cfg.footer.fit, FitMode::Contain);
    assert_eq!(cfg.background().0, [0x10, 0x10, 0x10, 255]);

    let source = cfg.frame_source(RegionKind::Footer);
    assert_eq!(
        source.path_for(0),
        PathBuf::from("/srv/site/seq/footer-001.png")
    );
}

#[test]
fn rejects_unknown_keys() {
    let yaml = r#"
asset-root: "public"
frame-rate: 30
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn rejects_template_without_placeholder() {
    let yaml = r#"
main:
  frames: "/frames/static.jpg"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(format!("{err:#}").contains("{frame}"));
}

#[test]
fn rejects_zero_frame_count_and_timeout() {
    let yaml = r#"
main:
  frames: "/f/{frame}.jpg"
  frame-count: 0
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());

    let yaml = r#"
footer:
  frames: "/f/{frame}.jpg"
  preload-timeout: 0s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn rejects_captions_beyond_frame_range() {
    let yaml = r#"
main:
  frames: "/f/{frame}.jpg"
  frame-count: 10
"#;
    // Default captions run to frame 191.
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn rejects_bad_background_color() {
    let yaml = r#"
background-color: "black"
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn loads_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "window-title: \"Reel\"\nfullscreen: true\n").unwrap();
    let cfg = Configuration::from_yaml_file(&path).unwrap();
    assert_eq!(cfg.window_title, "Reel");
    assert!(cfg.fullscreen);

    assert!(Configuration::from_yaml_file(dir.path().join("missing.yaml")).is_err());
}

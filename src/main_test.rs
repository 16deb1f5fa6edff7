use super::*;

/// A scratch directory holding `files`.
fn workspace(files: &[(&str, &[u8])]) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("easel-run-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    for (name, bytes) in files {
        std::fs::write(dir.join(name), bytes).unwrap();
    }
    dir
}

fn cli(dir: &std::path::Path, extra: &[&str]) -> Cli {
    let scene = dir.join("scene.json");
    let mut argv = vec!["easel".to_owned(), scene.to_string_lossy().to_string()];
    argv.extend(extra.iter().map(|a| (*a).to_owned()));
    Cli::try_parse_from(argv).unwrap()
}

const SCENE: &[u8] = br#"{"objects": [
    {"type": "rect", "left": 50, "top": 50, "width": 100, "height": 50, "strokeWidth": 0, "fill": "red"}
]}"#;

const DRAG: &[u8] = br#"[
    {"op": "down", "x": 100, "y": 75},
    {"op": "move", "x": 130, "y": 95},
    {"op": "up", "x": 130, "y": 95}
]"#;

#[tokio::test]
async fn json_output_reflects_replayed_drag() {
    let dir = workspace(&[("scene.json", SCENE), ("drag.json", DRAG)]);
    let script = dir.join("drag.json");
    let output = run(&cli(&dir, &["--script", script.to_str().unwrap()])).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["objects"][0]["left"], 80.0);
    assert_eq!(value["objects"][0]["top"], 70.0);
}

#[tokio::test]
async fn svg_output_is_a_document() {
    let dir = workspace(&[("scene.json", SCENE)]);
    let output = run(&cli(&dir, &["--format", "svg", "--background", "white"])).await.unwrap();
    assert!(output.starts_with("<?xml"));
    assert!(output.contains("fill=\"white\""));
    assert!(output.contains("<rect x=\"-50\" y=\"-25\""));
}

#[tokio::test]
async fn ops_output_lists_drawing_calls() {
    let dir = workspace(&[("scene.json", SCENE)]);
    let output = run(&cli(&dir, &["--format", "ops"])).await.unwrap();
    assert!(output.lines().any(|line| line.starts_with("DrawSurface")));
    assert!(output.lines().all(|line| !line.is_empty()));
}

#[tokio::test]
async fn images_resolve_against_the_scene_directory() {
    let mut png = b"\x89PNG\r\n\x1a\n\0\0\0\x0dIHDR".to_vec();
    png.extend_from_slice(&32u32.to_be_bytes());
    png.extend_from_slice(&16u32.to_be_bytes());
    let scene = br#"{"objects": [{"type": "image", "src": "tile.png"}, {"type": "image", "src": "missing.png"}]}"#;
    let dir = workspace(&[("scene.json", scene.as_slice()), ("tile.png", png.as_slice())]);
    let output = run(&cli(&dir, &[])).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    let objects = value["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0]["width"], 32.0);
}

#[tokio::test]
async fn missing_scene_is_a_read_error() {
    let dir = workspace(&[]);
    let err = run(&cli(&dir, &[])).await.unwrap_err();
    assert!(matches!(err, CliError::Read { .. }));
}

#[tokio::test]
async fn malformed_scene_is_a_load_error() {
    let dir = workspace(&[("scene.json", b"[1, 2".as_slice())]);
    let err = run(&cli(&dir, &[])).await.unwrap_err();
    assert!(matches!(err, CliError::Load(_)));
}

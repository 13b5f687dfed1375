use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const DATA: &str = r#"{
    "samples": [
        {"id": "S1", "attributes": {"Condition": "Tumor",  "Sex": "Male"}},
        {"id": "S2", "attributes": {"Condition": "Normal", "Sex": "Female"}},
        {"id": "S3", "attributes": {"Condition": "Tumor",  "Sex": "Female"}}
    ],
    "genes": [
        {"name": "ENSG1", "displayName": "TP53", "expressions": [1.5, -0.5, 2.0]},
        {"name": "ENSG2", "expressions": [-1.0, "NA", 0.25]}
    ],
    "metadata": {"contrast": "Condition", "alternate_level": "Tumor", "reference_level": "Normal"}
}"#;

const SETTING: &str = r##"{"highColor": "#ff0000", "lowColor": "#0000ff", "additionalAnnotations": ["Sex"]}"##;

fn workspace() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("data.json"), DATA).expect("write data");
    fs::write(dir.path().join("setting.json"), SETTING).expect("write setting");
    dir
}

fn exprheat(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_exprheat"))
        .current_dir(dir)
        .arg("-q")
        .args(args)
        .output()
        .expect("run exprheat")
}

#[test]
fn render_writes_svg_without_footer() {
    let dir = workspace();
    let out = exprheat(
        dir.path(),
        &[
            "render", "--data", "data.json", "--setting", "setting.json",
            "--out", "chart.svg", "--no-footer", "--title", "Tumor vs Normal",
        ],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let svg = fs::read_to_string(dir.path().join("chart.svg")).unwrap();
    assert!(svg.starts_with("<?xml") || svg.starts_with("<svg"));
    assert!(svg.contains("Tumor vs Normal"));
    assert!(!svg.contains("Generated:"));
}

#[test]
fn svg_records_inputs_and_range() {
    let dir = workspace();
    fs::write(dir.path().join("run--2.json"), DATA).unwrap();
    let out = exprheat(
        dir.path(),
        &[
            "render", "--data", "run--2.json", "--out", "chart.svg",
            "--no-footer", "--min", "-0.5", "--max", "0.6",
        ],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let svg = fs::read_to_string(dir.path().join("chart.svg")).unwrap();
    assert!(svg.contains("  <!-- data: run- -2.json -->"));
    assert!(svg.contains("  <!-- setting: default -->"));
    assert!(svg.contains("  <!-- range: [-0.50, 0.60] -->"));
}

#[test]
fn render_writes_png() {
    let dir = workspace();
    let out = exprheat(
        dir.path(),
        &["render", "--data", "data.json", "--out", "chart.png", "--min", "-1", "--max", "1"],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let bytes = fs::read(dir.path().join("chart.png")).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn render_rejects_unknown_extension() {
    let dir = workspace();
    let out = exprheat(dir.path(), &["render", "--data", "data.json", "--out", "chart.pdf"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Invalid format"));
    assert!(stderr.contains(".svg or .png"));
}

#[test]
fn strict_render_fails_when_everything_is_hidden() {
    let dir = workspace();
    let out = exprheat(
        dir.path(),
        &[
            "render", "--data", "data.json", "--setting", "setting.json", "--out", "chart.svg",
            "--hide", "Sex:Male", "--hide", "Sex:Female", "--strict",
        ],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Nothing to render"));
}

#[test]
fn hover_prints_tooltip_or_no_cell() {
    let dir = workspace();
    // Normal sorts first, so column 0 is S2
    let out = exprheat(
        dir.path(),
        &["hover", "--data", "data.json", "--setting", "setting.json", "--x", "1", "--y", "1"],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Gene: TP53 (ENSG1)",
            "Sample: S2",
            "Condition: Normal",
            "Sex: Female",
            "Expression: -0.5000",
        ]
    );

    let out = exprheat(
        dir.path(),
        &["hover", "--data", "data.json", "--x", "-5", "--y", "1"],
    );
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "no cell");
}

#[test]
fn missing_data_file_suggests_fix() {
    let dir = workspace();
    let out = exprheat(dir.path(), &["hover", "--data", "missing.json", "--x", "1", "--y", "1"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("File not found"));
    assert!(stderr.contains("Suggestions:"));
}

#[test]
fn config_example_and_local_file() {
    let dir = workspace();
    let out = exprheat(dir.path(), &["config", "--example"]);
    assert!(out.status.success());
    let example = String::from_utf8_lossy(&out.stdout).to_string();
    assert!(example.contains("[viewport]"));

    // ./exprheat.toml is picked up without --config
    fs::write(
        dir.path().join("exprheat.toml"),
        "[general]\ntitle = \"From config\"\nshow_footer = false\n",
    )
    .unwrap();
    let out = exprheat(dir.path(), &["render", "--data", "data.json", "--out", "chart.svg"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let svg = fs::read_to_string(dir.path().join("chart.svg")).unwrap();
    assert!(svg.contains("From config"));
    assert!(!svg.contains("Generated:"));
}

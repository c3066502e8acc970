use apimatic::cli::{parse_args_from_parsed, run, CliArgs};
use clap::Parser;
use std::fs;
use tempfile::TempDir;

fn create_flask_project() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("requirements.txt"), "flask\n")
        .expect("Failed to write requirements");
    fs::write(
        temp_dir.path().join("app.py"),
        include_str!("fixtures/flask_app.py"),
    )
    .expect("Failed to write app");
    temp_dir
}

fn run_with(args: &[&str]) -> anyhow::Result<()> {
    let parsed = CliArgs::try_parse_from(args)?;
    run(parse_args_from_parsed(parsed)?)
}

#[test]
fn test_markdown_written_to_project_by_default() {
    let project = create_flask_project();
    let root = project.path().to_str().unwrap();

    run_with(&["apimatic", root]).unwrap();

    let markdown = fs::read_to_string(project.path().join("API_Docs.md")).unwrap();
    assert!(markdown.starts_with("# API Documentation\n"));
    assert!(markdown.contains("\n## Flask\n"));
    assert!(markdown.contains("- **Endpoint:** `GET /ping`"));
    assert!(markdown.contains("- **Endpoint:** `POST /users`"));
}

#[test]
fn test_openapi_formats_use_their_default_file_names() {
    let project = create_flask_project();
    let root = project.path().to_str().unwrap();

    run_with(&["apimatic", root, "-f", "openapi"]).unwrap();
    run_with(&["apimatic", root, "--format", "openapi-json"]).unwrap();

    let yaml = fs::read_to_string(project.path().join("openapi.yaml")).unwrap();
    assert!(yaml.contains("openapi: 3.0.0"));
    assert!(yaml.contains("/users/{user_id}:"));

    let json = fs::read_to_string(project.path().join("openapi.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(doc["paths"]["/ping"]["get"].is_object());
}

#[test]
fn test_explicit_output_path() {
    let project = create_flask_project();
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.path().join("docs").join("api.md");

    run_with(&[
        "apimatic",
        project.path().to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ])
    .unwrap();

    assert!(output.exists());
    assert!(!project.path().join("API_Docs.md").exists());
}

#[test]
fn test_project_without_framework_still_writes_report() {
    let project = TempDir::new().unwrap();
    fs::write(project.path().join("README.md"), "# nothing here\n").unwrap();

    run_with(&["apimatic", project.path().to_str().unwrap()]).unwrap();

    assert_eq!(
        fs::read_to_string(project.path().join("API_Docs.md")).unwrap(),
        "# API Documentation\n"
    );
}

#[test]
fn test_forced_framework_flag() {
    let project = TempDir::new().unwrap();
    fs::write(
        project.path().join("routes.py"),
        "@app.route('/only')\ndef only():\n    return ''\n",
    )
    .unwrap();

    run_with(&["apimatic", project.path().to_str().unwrap(), "-w", "flask"]).unwrap();

    let markdown = fs::read_to_string(project.path().join("API_Docs.md")).unwrap();
    assert!(markdown.contains("### GET /only"));
}

#[test]
fn test_missing_project_root_fails() {
    let project = TempDir::new().unwrap();
    let missing = project.path().join("nope");

    let err = run_with(&["apimatic", missing.to_str().unwrap()]).unwrap_err();

    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_invalid_ollama_host_is_rejected_before_writing() {
    let project = create_flask_project();

    let result = run_with(&[
        "apimatic",
        project.path().to_str().unwrap(),
        "--enrich",
        "ollama-http",
        "--ollama-host",
        "ftp://localhost:11434",
    ]);

    assert!(result.is_err());
    assert!(!project.path().join("API_Docs.md").exists());
}

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn tutor_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tutor");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::create_dir_all(root.join("data")).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/tutor.sqlite"

[cache]
backend = "sqlite"
ttl_secs = 60

[server]
bind = "127.0.0.1:7341"
"#,
        root.display()
    );
    let config_path = config_dir.join("tutor.toml");
    fs::write(&config_path, config_content).unwrap();

    let corpus = r#"{
  "documents": [
    {
      "id": "mat-5-fracciones",
      "title": "Fracciones",
      "grade": 5,
      "subject": "Matemática",
      "content_text": "Una fracción representa partes iguales de un entero.",
      "learning_objectives": ["OA-MAT-5-03"],
      "ministry_standard_ref": "OA-MAT-5-03",
      "ministry_approved": true
    },
    {
      "id": "mat-5-decimales",
      "title": "Decimales",
      "grade": 5,
      "subject": "Matemática",
      "content_text": "Los números decimales se escriben con una coma.",
      "difficulty_level": "hard"
    }
  ],
  "standards": [
    {
      "oa_code": "OA-MAT-5-03",
      "grade": 5,
      "subject": "Matemática",
      "description": "Demostrar que comprenden las fracciones propias"
    }
  ]
}"#;
    fs::write(root.join("corpus.json"), corpus).unwrap();

    (tmp, config_path)
}

fn run_tutor(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = tutor_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run tutor binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn import_corpus(tmp: &TempDir, config_path: &Path) -> String {
    let corpus = tmp.path().join("corpus.json");
    let (_, stderr, success) = run_tutor(config_path, &["init"]);
    assert!(success, "init failed: {}", stderr);
    let (stdout, stderr, success) = run_tutor(config_path, &["import", corpus.to_str().unwrap()]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    stdout
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_tutor(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));

    let (_, _, success) = run_tutor(&config_path, &["init"]);
    assert!(success, "Second init failed (not idempotent)");
}

#[test]
fn test_import_counts() {
    let (tmp, config_path) = setup_test_env();
    let stdout = import_corpus(&tmp, &config_path);

    assert!(stdout.contains("imported documents: 2"));
    assert!(stdout.contains("imported standards: 1"));
    assert!(stdout.contains("indexed vectors: 0"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_import_twice_no_duplicates() {
    let (tmp, config_path) = setup_test_env();
    import_corpus(&tmp, &config_path);
    import_corpus(&tmp, &config_path);

    let (stdout, stderr, success) = run_tutor(
        &config_path,
        &["fetch", "mat-5-fracciones", "mat-5-decimales"],
    );
    assert!(success, "fetch failed: {}", stderr);
    let body: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["contents"].as_array().unwrap().len(), 2);
}

#[test]
fn test_fetch_requested_order() {
    let (tmp, config_path) = setup_test_env();
    import_corpus(&tmp, &config_path);

    let (stdout, stderr, success) = run_tutor(
        &config_path,
        &["fetch", "mat-5-decimales", "missing", "mat-5-fracciones"],
    );
    assert!(success, "fetch failed: stdout={}, stderr={}", stdout, stderr);

    let body: Value = serde_json::from_str(&stdout).unwrap();
    let contents = body["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0]["id"], "mat-5-decimales");
    assert_eq!(contents[0]["difficulty_level"], "hard");
    assert!(contents[0]["learning_objectives"].as_array().unwrap().is_empty());
    assert_eq!(contents[1]["id"], "mat-5-fracciones");
    assert_eq!(contents[1]["learning_objectives"][0], "OA-MAT-5-03");
    assert_eq!(contents[1]["difficulty_level"], "medium");
}

#[test]
fn test_invalid_grade_exits_with_envelope() {
    let (tmp, config_path) = setup_test_env();
    import_corpus(&tmp, &config_path);

    let (stdout, stderr, success) = run_tutor(
        &config_path,
        &["search", "fracciones", "--grade", "13", "--subject", "Matemática"],
    );
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("\"code\": \"INVALID_GRADE\""), "stderr={}", stderr);
}

#[test]
fn test_search_without_embedding_provider_fails() {
    let (tmp, config_path) = setup_test_env();
    import_corpus(&tmp, &config_path);

    let (_, stderr, success) = run_tutor(
        &config_path,
        &["search", "fracciones", "--grade", "5", "--subject", "Matemática"],
    );
    assert!(!success);
    assert!(stderr.contains("EMBEDDING_FAILED"), "stderr={}", stderr);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, _, success) = run_tutor(&tmp.path().join("absent.toml"), &["init"]);
    assert!(!success);
}

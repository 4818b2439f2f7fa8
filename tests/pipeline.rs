//! End-to-end pipeline tests against stubbed GitHub and Ollama
//! endpoints. The repository archive is pre-seeded into the download
//! cache, so no network leaves the loopback interface.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use axum::extract::Query;
use axum::routing::{get, post};
use axum::{Json, Router};
use zip::write::{SimpleFileOptions, ZipWriter};

use gitpersona::config::Config;
use gitpersona::server::Pipeline;

// Two functions: f has complexity 3 (if + for), g has complexity 5
// (if + for + while + if). Repository average: 4.0.
const PY_SOURCE: &str = "\
def f(x):
    if x > 0:
        return 1
    for i in range(3):
        pass
    return 0

def g(items):
    if not items:
        return 0
    total = 0
    for item in items:
        while item > 0:
            item -= 1
        if item == 0:
            total += 1
    return total
";

/// Serve stand-ins for the GitHub REST API and the Ollama generate
/// endpoint on one ephemeral loopback port.
async fn spawn_stub() -> String {
    let app = Router::new()
        .route(
            "/users/alice",
            get(|| async {
                Json(serde_json::json!({
                    "login": "alice",
                    "name": "Alice Doe",
                    "followers": 12,
                    "public_repos": 7
                }))
            }),
        )
        .route(
            "/users/alice/repos",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let page: u32 = params
                    .get("page")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(1);
                if page == 1 {
                    Json(serde_json::json!([
                        {"name": "sample-repo", "fork": false},
                        {"name": "forked-tool", "fork": true}
                    ]))
                } else {
                    Json(serde_json::json!([]))
                }
            }),
        )
        .route(
            "/api/generate",
            post(|| async {
                Json(serde_json::json!({
                    "response": "{\"origin\":\"Original\",\"reason\":\"looks handwritten\"}"
                }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn test_config(base: &str, work_dir: &Path) -> Config {
    let mut config = Config::default();
    config.github.api_base = base.to_string();
    config.github.download_base = base.to_string();
    config.ollama.endpoint = base.to_string();
    config.storage.work_dir = work_dir.to_path_buf();
    config
}

/// Place a `sample-repo` snapshot in the archive cache so the download
/// step short-circuits without hitting the (stub) network.
fn seed_archive(config: &Config) {
    let dir = config.storage.archive_dir();
    std::fs::create_dir_all(&dir).unwrap();

    let file = std::fs::File::create(dir.join("alice-sample-repo.zip")).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    writer
        .start_file("sample-repo-main/README.md", options)
        .unwrap();
    writer.write_all(b"A simple original tool").unwrap();

    writer
        .start_file("sample-repo-main/tool.py", options)
        .unwrap();
    writer.write_all(PY_SOURCE.as_bytes()).unwrap();

    writer.finish().unwrap();
}

#[tokio::test]
async fn test_analyze_url_end_to_end() {
    let base = spawn_stub().await;
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(&base, tmp.path());
    seed_archive(&config);

    let pipeline = Pipeline::new(config.clone()).unwrap();
    let outcome = pipeline
        .analyze_url("https://github.com/alice/sample-repo")
        .await
        .unwrap();

    assert_eq!(outcome.user.login, "alice");
    assert_eq!(outcome.repo.name, "sample-repo");

    assert!(outcome.report.contains("Developer Profile: alice"));
    assert!(outcome.report.contains("sample-repo"));
    assert!(outcome.report.contains("Python (1)"));
    assert!(outcome.report.contains("Projects analyzed: 1"));
    assert!(outcome.report.contains("Average Complexity Score: 4.0"));
    assert!(outcome.report.contains("- Original: 1"));
    assert!(outcome.report.contains("- AI-Generated: 0"));
    assert!(outcome.report.contains("- Copied: 0"));

    // Report file matches the payload.
    let written = std::fs::read_to_string(config.storage.report_path()).unwrap();
    assert_eq!(written, outcome.report);

    // Request-scoped extraction directory was cleaned up.
    let leftover = std::fs::read_dir(config.storage.runs_dir())
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_profile_user_skips_forks() {
    let base = spawn_stub().await;
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(&base, tmp.path());
    seed_archive(&config);

    let pipeline = Pipeline::new(config).unwrap();
    let report = pipeline.profile_user("alice").await.unwrap();

    // The forked repository is excluded, leaving one analyzed project.
    assert!(report.contains("Projects analyzed: 1"));
    assert!(report.contains("Average Complexity Score: 4.0"));
    assert!(report.contains("- Original: 1"));
}

#[tokio::test]
async fn test_profile_survives_corrupt_cached_archive() {
    let base = spawn_stub().await;
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(&base, tmp.path());
    seed_archive(&config);

    // A corrupt snapshot in the cache must not abort the batch
    // extraction that profile runs over the whole cache directory.
    std::fs::write(
        config.storage.archive_dir().join("alice-broken.zip"),
        b"this is not a zip file",
    )
    .unwrap();

    let pipeline = Pipeline::new(config).unwrap();
    let report = pipeline.profile_user("alice").await.unwrap();

    assert!(report.contains("Projects analyzed: 1 (sample-repo)"));
    assert!(report.contains("Average Complexity Score: 4.0"));
}

#[tokio::test]
async fn test_http_analyze_then_report() {
    let base = spawn_stub().await;
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(&base, tmp.path());
    seed_archive(&config);

    let app = gitpersona::server::router(config).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/analyze"))
        .json(&serde_json::json!({"repo_url": "https://github.com/alice/sample-repo"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Analysis complete");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["repo"], "sample-repo");
    assert!(
        body["report"]
            .as_str()
            .unwrap()
            .contains("Average Complexity Score: 4.0")
    );

    let report = reqwest::get(format!("http://{addr}/report.txt"))
        .await
        .unwrap();
    assert_eq!(report.status().as_u16(), 200);
    assert!(report.text().await.unwrap().contains("Developer Profile: alice"));
}

//! HTTP surface and analysis orchestration.
//!
//! The [`Pipeline`] owns the GitHub client and classifier and runs the
//! full fetch → extract → measure → classify → render sequence. The
//! axum router is a thin layer over it: `POST /analyze` runs the
//! pipeline for one repository URL, `GET /report.txt` serves the last
//! written report.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analyzer::complexity;
use crate::analyzer::language::detect_languages;
use crate::archive::{extract_all, extract_archive, repo_root};
use crate::classifier::{OllamaGenerator, OriginClassifier};
use crate::config::Config;
use crate::github::GithubClient;
use crate::persona::build_persona;
use crate::types::{
    Classification, ComplexityReport, PersonaError, RepoRef, Result, UserProfile,
};

/// Measurements gathered for a single repository.
pub struct RepoAnalysis {
    pub repo: RepoRef,
    pub complexity: ComplexityReport,
    pub classification: Classification,
    pub languages: BTreeMap<String, usize>,
}

/// Result of a full single-repository analysis.
pub struct AnalysisOutcome {
    pub user: UserProfile,
    pub repo: RepoRef,
    pub report: String,
}

/// End-to-end analysis orchestrator, shared by the HTTP server and the
/// CLI subcommands.
pub struct Pipeline {
    config: Config,
    github: GithubClient,
    classifier: OriginClassifier,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let github = GithubClient::new(&config.github, config.storage.archive_dir())?;
        let generator = Arc::new(OllamaGenerator::new(&config.ollama)?);
        let classifier = OriginClassifier::new(generator, config.analysis.max_readme_bytes);

        Ok(Self {
            config,
            github,
            classifier,
        })
    }

    /// Analyze one repository given its URL and render a persona for
    /// its owner. Writes the report file as a side effect.
    pub async fn analyze_url(&self, repo_url: &str) -> Result<AnalysisOutcome> {
        let repo = RepoRef::parse(repo_url)?;
        let user = self.github.user_info(&repo.owner).await?;
        let analysis = self.analyze_one(&repo).await?;

        let mut scores = BTreeMap::new();
        scores.insert(repo.name.clone(), analysis.complexity.average);
        let mut origins = BTreeMap::new();
        origins.insert(repo.name.clone(), analysis.classification.clone());

        let report = build_persona(&user, &analysis.languages, &scores, &origins);
        self.write_report(&report)?;

        Ok(AnalysisOutcome { user, repo, report })
    }

    /// Analyze up to `max_repos` of a user's repositories and render an
    /// aggregate persona. All selected archives are downloaded into the
    /// cache first, the cache is unpacked in one batch, and each
    /// repository is measured from its extracted tree. Individual
    /// repository failures are logged and skipped; only the user lookup
    /// and the listing itself are fatal.
    pub async fn profile_user(&self, login: &str) -> Result<String> {
        let user = self.github.user_info(login).await?;
        let listing = self.github.list_repos(login).await?;

        let selected: Vec<RepoRef> = listing
            .iter()
            .filter(|r| !(self.config.analysis.skip_forks && r.fork))
            .take(self.config.analysis.max_repos)
            .map(|r| RepoRef::new(login, r.name.as_str()))
            .collect();

        let mut downloaded = Vec::new();
        for repo in selected {
            match self.github.download_archive(&repo).await {
                Ok(_) => downloaded.push(repo),
                Err(e) => {
                    warn!("Skipping {repo}: {e}");
                }
            }
        }

        let run_dir = self
            .config
            .storage
            .runs_dir()
            .join(Uuid::new_v4().to_string());

        let result = self.measure_batch(&downloaded, &run_dir).await;
        remove_run_dir(&run_dir);
        let (languages, scores, origins) = result?;

        let report = build_persona(&user, &languages, &scores, &origins);
        self.write_report(&report)?;

        Ok(report)
    }

    /// Unpack every cached snapshot into the run directory in one
    /// batch, then measure the selected repositories from their
    /// extracted trees. A snapshot that failed to extract or measure is
    /// logged and skipped.
    async fn measure_batch(
        &self,
        repos: &[RepoRef],
        run_dir: &Path,
    ) -> Result<(
        BTreeMap<String, usize>,
        BTreeMap<String, f64>,
        BTreeMap<String, Classification>,
    )> {
        let extracted = extract_all(&self.config.storage.archive_dir(), run_dir)?;

        let mut languages: BTreeMap<String, usize> = BTreeMap::new();
        let mut scores = BTreeMap::new();
        let mut origins = BTreeMap::new();

        for repo in repos {
            let dir = run_dir.join(repo.archive_stem());
            if !extracted.contains(&dir) {
                warn!("Skipping {repo}: snapshot failed to extract");
                continue;
            }

            match self.measure_tree(repo, &repo_root(&dir)).await {
                Ok(analysis) => {
                    for (lang, count) in analysis.languages {
                        *languages.entry(lang).or_default() += count;
                    }
                    scores.insert(repo.name.clone(), analysis.complexity.average);
                    origins.insert(repo.name.clone(), analysis.classification);
                }
                Err(e) => {
                    warn!("Skipping {repo}: {e}");
                }
            }
        }

        Ok((languages, scores, origins))
    }

    /// Fetch, extract, and measure a single repository.
    ///
    /// Extraction happens into a request-scoped directory named by a
    /// fresh UUID, so concurrent analyses of same-named repositories
    /// never see each other's trees. The directory is removed on the
    /// way out, success or not.
    pub async fn analyze_one(&self, repo: &RepoRef) -> Result<RepoAnalysis> {
        let zip_path = self.github.download_archive(repo).await?;

        let run_dir = self
            .config
            .storage
            .runs_dir()
            .join(Uuid::new_v4().to_string());

        let result = self.analyze_extracted(repo, &zip_path, &run_dir).await;
        remove_run_dir(&run_dir);
        result
    }

    async fn analyze_extracted(
        &self,
        repo: &RepoRef,
        zip_path: &Path,
        run_dir: &Path,
    ) -> Result<RepoAnalysis> {
        extract_archive(zip_path, run_dir)?;

        let root = repo_root(run_dir);
        if !root.is_dir() {
            return Err(PersonaError::NotFound(format!(
                "no content found for {repo} after extraction"
            )));
        }

        self.measure_tree(repo, &root).await
    }

    async fn measure_tree(&self, repo: &RepoRef, root: &Path) -> Result<RepoAnalysis> {
        let complexity = complexity::analyze_repo(root)?;
        let classification = self.classifier.classify(&repo.name, root).await;
        let languages = detect_languages(root);

        info!(
            "Analyzed {repo}: {} functions, average complexity {}",
            complexity.functions, complexity.average
        );

        Ok(RepoAnalysis {
            repo: repo.clone(),
            complexity,
            classification,
            languages,
        })
    }

    fn write_report(&self, report: &str) -> Result<()> {
        let path = self.config.storage.report_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, report)?;
        info!("Report written to {}", path.display());
        Ok(())
    }
}

/// Best-effort removal of a request-scoped extraction directory.
fn remove_run_dir(run_dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(run_dir)
        && run_dir.exists()
    {
        warn!("Failed to clean up {}: {e}", run_dir.display());
    }
}

// =============================================================================
// HTTP layer
// =============================================================================

struct AppState {
    pipeline: Pipeline,
    report_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    repo_url: String,
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    message: String,
    username: String,
    repo: String,
    report: String,
}

pub fn router(config: Config) -> Result<Router> {
    let report_path = config.storage.report_path();
    let state = Arc::new(AppState {
        pipeline: Pipeline::new(config)?,
        report_path,
    });

    Ok(Router::new()
        .route("/analyze", post(analyze))
        .route("/report.txt", get(report))
        .with_state(state))
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: Config) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = router(config)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>> {
    let outcome = state.pipeline.analyze_url(&request.repo_url).await?;

    Ok(Json(AnalyzeResponse {
        message: "Analysis complete".to_string(),
        username: outcome.user.login,
        repo: outcome.repo.name,
        report: outcome.report,
    }))
}

async fn report(State(state): State<Arc<AppState>>) -> Response {
    match tokio::fs::read_to_string(&state.report_path).await {
        Ok(text) => ([(CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response(),
        Err(_) => PersonaError::NotFound("No report found".to_string()).into_response(),
    }
}

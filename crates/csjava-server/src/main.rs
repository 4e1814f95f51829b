//! csjava Server
//!
//! HTTP front end for the C# to Java converter: uploads, conversions,
//! archive downloads and code analysis, all scoped to in-memory sessions.

mod extractors;
mod handlers;
mod storage;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use csjava_core::{AppConfig, ConfigManager, Converter};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use storage::{SessionStore, DEFAULT_SESSION_TTL};

/// Upload size accepted by the conversion route unless configured otherwise
const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub converter: Arc<Converter>,
    pub sessions: Arc<SessionStore>,
    /// Body limit of the multipart upload route
    pub max_upload_bytes: usize,
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting csjava server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    let server_config = ServerConfig::from_lookup(|key| std::env::var(key).ok())
        .context("Failed to load server configuration")?;
    info!(
        "Config loaded: bind={}, config_dir={}, max_upload={} bytes",
        server_config.bind_address,
        server_config.config_dir.display(),
        server_config.max_upload_bytes
    );

    let config = load_app_config(&server_config.config_dir)?;
    let converter = Converter::from_config(&config).context("Failed to create converter")?;

    let sessions = Arc::new(SessionStore::new(server_config.session_ttl));
    sessions.start_cleanup_task();

    let state = AppState {
        config: Arc::new(config),
        converter: Arc::new(converter),
        sessions,
        max_upload_bytes: server_config.max_upload_bytes,
    };

    let mut app = router(state);
    if let Some(static_dir) = &server_config.static_dir {
        info!("Static files directory: {}", static_dir.display());
        let index_path = static_dir.join("index.html");
        app = app.fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index_path)));
    }
    let app = app
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = server_config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("Server listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes(state.max_upload_bytes))
        .with_state(state)
}

fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/connection", get(handlers::connection::check))
        .route("/sessions", post(handlers::sessions::create))
        .route("/sessions/:id", delete(handlers::sessions::delete))
        .route("/sessions/:id/clear", post(handlers::sessions::clear))
        .route(
            "/sessions/:id/conversions",
            get(handlers::conversions::last)
                .post(handlers::conversions::upload)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/sessions/:id/conversions/:index/java",
            get(handlers::conversions::java_file),
        )
        .route(
            "/sessions/:id/downloads/project",
            get(handlers::downloads::project),
        )
        .route("/sessions/:id/downloads/java", get(handlers::downloads::java))
        .route("/sessions/:id/instant", post(handlers::conversions::instant))
        .route(
            "/sessions/:id/instant/java",
            get(handlers::conversions::instant_java),
        )
        .route(
            "/sessions/:id/analyses",
            get(handlers::analyses::history).post(handlers::analyses::analyze),
        )
}

#[derive(Debug, Clone)]
struct ServerConfig {
    bind_address: String,
    static_dir: Option<PathBuf>,
    session_ttl: Duration,
    config_dir: PathBuf,
    max_upload_bytes: usize,
}

impl ServerConfig {
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8501".to_string());
        let static_dir = lookup("STATIC_DIR").map(PathBuf::from);
        let session_ttl = match lookup("SESSION_TTL_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .with_context(|| format!("Invalid SESSION_TTL_SECS: {}", secs))?,
            ),
            None => DEFAULT_SESSION_TTL,
        };
        let config_dir = lookup("CSJAVA_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(bytes) => bytes
                .parse()
                .with_context(|| format!("Invalid MAX_UPLOAD_BYTES: {}", bytes))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            bind_address,
            static_dir,
            session_ttl,
            config_dir,
            max_upload_bytes,
        })
    }
}

fn load_app_config(dir: &Path) -> Result<AppConfig> {
    let mut manager = ConfigManager::new();
    let config = manager
        .resolve(dir)
        .with_context(|| format!("Failed to load configuration from {}", dir.display()))?;

    let validation = manager.validate(&config);
    for warning in &validation.warnings {
        warn!("{}: {}", warning.field, warning.message);
    }
    for problem in &validation.errors {
        warn!("{}: {} ({})", problem.field, problem.message, problem.code);
    }
    if !validation.valid {
        warn!("Completion service is not fully configured; conversions will fail");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, HeaderMap, Request, StatusCode};
    use csjava_core::{CompletionClient, CompletionRequest, CoreError, SuffixMap};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::io::{Cursor, Read, Write};
    use std::sync::Mutex;
    use tower::ServiceExt;
    use zip::write::SimpleFileOptions;
    use zip::{ZipArchive, ZipWriter};

    struct Scripted {
        replies: Mutex<VecDeque<Option<String>>>,
    }

    #[axum::async_trait]
    impl CompletionClient for Scripted {
        async fn complete(&self, _request: CompletionRequest) -> csjava_core::Result<String> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .flatten()
                .ok_or_else(|| CoreError::Completion("scripted failure".to_string()))
        }
    }

    fn app(replies: Vec<Option<&str>>) -> (Router, AppState) {
        app_with_limit(replies, DEFAULT_MAX_UPLOAD_BYTES)
    }

    fn app_with_limit(replies: Vec<Option<&str>>, max_upload_bytes: usize) -> (Router, AppState) {
        let client = Scripted {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(String::from)).collect()),
        };
        let state = AppState {
            config: Arc::new(AppConfig::default()),
            converter: Arc::new(Converter::new(Arc::new(client), SuffixMap::default())),
            sessions: Arc::new(SessionStore::default()),
            max_upload_bytes,
        };
        (router(state.clone()), state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, _, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const BOUNDARY: &str = "csjava-test-boundary";

    fn multipart(uri: &str, files: &[(&str, &[u8])], fields: &[(&str, &str)]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, content) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn new_session(app: &Router) -> String {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/sessions")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send_json(app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app(vec![]);
        let (status, body) = send_json(&app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let (app, _) = app(vec![]);
        let (status, body) =
            send_json(&app, get_request("/api/v1/sessions/nope/conversions")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "session_not_found");
    }

    #[tokio::test]
    async fn test_upload_converts_and_downloads() {
        let (app, _) = app(vec![
            Some("```json\n{\"java_code\":\"public class A {}\"}\n```"),
            None,
        ]);
        let id = new_session(&app).await;
        let uri = format!("/api/v1/sessions/{}/conversions", id);

        let (status, body) = send_json(
            &app,
            multipart(
                &uri,
                &[
                    ("A.cs", "public class A {}".as_bytes()),
                    ("B.cs", "public class B {}".as_bytes()),
                    ("logo.png", b"x"),
                ],
                &[("include_comments", "false")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["target_name"], "A.java");
        assert_eq!(body["results"][0]["applied_options"]["include_comments"], false);
        assert!(body["results"][1]["translated_code"]
            .as_str()
            .unwrap()
            .contains("// Conversion failed"));
        assert_eq!(body["stats"]["succeeded"], 1);
        assert_eq!(body["warnings"].as_array().unwrap().len(), 1);

        let (status, body) = send_json(&app, get_request(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"].as_array().unwrap().len(), 2);

        let (status, headers, body) =
            send(&app, get_request(&format!("{}/0/java", uri))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"public class A {}");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"A.java\""
        );

        let (status, headers, body) = send(
            &app,
            get_request(&format!("/api/v1/sessions/{}/downloads/project", id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"A_project.zip\""
        );
        assert!(body.starts_with(b"PK"));

        let (status, headers, _) = send(
            &app,
            get_request(&format!("/api/v1/sessions/{}/downloads/java", id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"A_java.zip\""
        );
    }

    #[tokio::test]
    async fn test_upload_without_sources_is_422() {
        let (app, _) = app(vec![]);
        let id = new_session(&app).await;
        let (status, body) = send_json(
            &app,
            multipart(
                &format!("/api/v1/sessions/{}/conversions", id),
                &[("notes.txt", b"hello")],
                &[],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "empty_input");
    }

    #[tokio::test]
    async fn test_download_before_conversion_is_404() {
        let (app, _) = app(vec![]);
        let id = new_session(&app).await;
        let (status, body) = send_json(
            &app,
            get_request(&format!("/api/v1/sessions/{}/downloads/java", id)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "no_batch");
    }

    #[tokio::test]
    async fn test_instant_conversion() {
        let (app, _) = app(vec![Some("class Plain {}")]);
        let id = new_session(&app).await;
        let uri = format!("/api/v1/sessions/{}/instant", id);

        let (status, body) = send_json(
            &app,
            post_json(&uri, json!({"code": "public class Plain {}"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source_name"], "InstantConversion.cs");
        assert_eq!(body["translated_code"], "class Plain {}");

        let (status, headers, body) = send(&app, get_request(&format!("{}/java", uri))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"class Plain {}");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ConvertedCode.java\""
        );

        let (status, _) = send_json(&app, post_json(&uri, json!({"code": "   "}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_analyses_history_newest_first() {
        let (app, state) = app(vec![
            Some(r#"{"complexity_score": 2, "summary": "first"}"#),
            Some(r#"{"complexity_score": 7, "summary": "second"}"#),
            None,
        ]);
        let id = new_session(&app).await;
        let uri = format!("/api/v1/sessions/{}/analyses", id);

        let (status, body) =
            send_json(&app, post_json(&uri, json!({"code": "class A {}"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filename"], "CodeAnalysis.cs");
        assert_eq!(body["code_length"], 10);

        send_json(
            &app,
            post_json(&uri, json!({"code": "class B {}", "filename": "B.cs"})),
        )
        .await;

        let (status, body) =
            send_json(&app, post_json(&uri, json!({"code": "class C {}"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "analysis_failed");

        let (status, body) = send_json(&app, get_request(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        let summaries: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["summary"].as_str().unwrap())
            .collect();
        assert_eq!(summaries, vec!["second", "first"]);

        let latest = state
            .sessions
            .read(&id, |s| s.history.latest().map(|r| r.analysis.complexity_score))
            .flatten();
        assert_eq!(latest, Some(7));
    }

    fn zip_of(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in members {
            zip.start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn unzip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut content = Vec::new();
                file.read_to_end(&mut content).unwrap();
                (file.name().to_string(), content)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_zip_upload_repackages_project() {
        let (app, _) = app(vec![Some(
            "```json\n{\"java_code\":\"public class Order {}\"}\n```",
        )]);
        let id = new_session(&app).await;
        let logo: Vec<u8> = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff, 0x10];
        let upload = zip_of(&[
            ("src/Order.cs", b"public class Order {}"),
            ("assets/logo.png", logo.as_slice()),
            ("README.md", b"# Shop\n"),
        ]);

        let (status, body) = send_json(
            &app,
            multipart(
                &format!("/api/v1/sessions/{}/conversions", id),
                &[("Shop.zip", upload.as_slice())],
                &[],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["project"], "Shop");
        assert_eq!(body["results"][0]["target_name"], "src/Order.java");

        let (status, headers, project) = send(
            &app,
            get_request(&format!("/api/v1/sessions/{}/downloads/project", id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Shop_project.zip\""
        );
        assert_eq!(
            unzip(&project),
            vec![
                ("src/Order.java".to_string(), b"public class Order {}".to_vec()),
                ("assets/logo.png".to_string(), logo),
                ("README.md".to_string(), b"# Shop\n".to_vec()),
            ]
        );

        let (status, headers, java) = send(
            &app,
            get_request(&format!("/api/v1/sessions/{}/downloads/java", id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Shop_java.zip\""
        );
        assert_eq!(
            unzip(&java),
            vec![("src/Order.java".to_string(), b"public class Order {}".to_vec())]
        );
    }

    #[tokio::test]
    async fn test_upload_larger_than_two_megabytes() {
        let (app, _) = app(vec![Some("public class A {}")]);
        let id = new_session(&app).await;
        let mut source = b"public class A {}\n".to_vec();
        source.resize(3 * 1024 * 1024, b' ');

        let (status, body) = send_json(
            &app,
            multipart(
                &format!("/api/v1/sessions/{}/conversions", id),
                &[("A.cs", source.as_slice())],
                &[],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["succeeded"], 1);
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_413() {
        let (app, _) = app_with_limit(vec![], 1024);
        let id = new_session(&app).await;
        let source = vec![b' '; 4096];

        let (status, body) = send_json(
            &app,
            multipart(
                &format!("/api/v1/sessions/{}/conversions", id),
                &[("A.cs", source.as_slice())],
                &[],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "upload_too_large");
    }

    /// Drops its session while the completion is in flight
    struct Expiring {
        sessions: Arc<SessionStore>,
        id: String,
    }

    #[axum::async_trait]
    impl CompletionClient for Expiring {
        async fn complete(&self, _request: CompletionRequest) -> csjava_core::Result<String> {
            self.sessions.remove(&self.id);
            Ok("public class A {}".to_string())
        }
    }

    #[tokio::test]
    async fn test_session_expiring_during_batch_is_404() {
        let sessions = Arc::new(SessionStore::default());
        let id = sessions.create();
        let client = Expiring {
            sessions: sessions.clone(),
            id: id.clone(),
        };
        let app = router(AppState {
            config: Arc::new(AppConfig::default()),
            converter: Arc::new(Converter::new(Arc::new(client), SuffixMap::default())),
            sessions,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        });

        let (status, body) = send_json(
            &app,
            multipart(
                &format!("/api/v1/sessions/{}/conversions", id),
                &[("A.cs", "public class A {}".as_bytes())],
                &[],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "session_not_found");
    }

    #[tokio::test]
    async fn test_non_numeric_result_index_is_json_error() {
        let (app, _) = app(vec![]);
        let id = new_session(&app).await;
        let (status, body) = send_json(
            &app,
            get_request(&format!("/api/v1/sessions/{}/conversions/first/java", id)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_index");
    }

    #[tokio::test]
    async fn test_clear_session_keeps_it_alive() {
        let (app, state) = app(vec![Some("class Plain {}")]);
        let id = new_session(&app).await;
        send_json(
            &app,
            post_json(
                &format!("/api/v1/sessions/{}/instant", id),
                json!({"code": "class Plain {}"}),
            ),
        )
        .await;

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/v1/sessions/{}/clear", id))
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.sessions.contains(&id));

        let (status, body) = send_json(
            &app,
            get_request(&format!("/api/v1/sessions/{}/instant/java", id)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "no_result");
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (app, state) = app(vec![]);
        let id = new_session(&app).await;
        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/sessions/{}", id))
            .body(Body::empty())
            .unwrap();
        let (status, _, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!state.sessions.contains(&id));
    }

    #[tokio::test]
    async fn test_connection_check() {
        let (app, _) = app(vec![Some("Connection successful!"), None]);
        let (status, body) = send_json(&app, get_request("/api/v1/connection")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Connection successful!");

        let (status, body) = send_json(&app, get_request("/api/v1/connection")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "completion_failed");
    }

    #[test]
    fn test_server_config_from_lookup() {
        let config = ServerConfig::from_lookup(|key| match key {
            "SESSION_TTL_SECS" => Some("120".to_string()),
            "STATIC_DIR" => Some("/srv/csjava".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8501");
        assert_eq!(config.session_ttl, Duration::from_secs(120));
        assert_eq!(config.static_dir, Some(PathBuf::from("/srv/csjava")));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);

        let config = ServerConfig::from_lookup(|key| {
            (key == "MAX_UPLOAD_BYTES").then(|| "1048576".to_string())
        })
        .unwrap();
        assert_eq!(config.max_upload_bytes, 1024 * 1024);

        let invalid = ServerConfig::from_lookup(|key| {
            (key == "SESSION_TTL_SECS").then(|| "soon".to_string())
        });
        assert!(invalid.is_err());
    }

    #[test]
    fn test_load_app_config_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("csjava.config.yaml"),
            "completion:\n  deployment: gpt41\n  max_tokens: 2000\n",
        )
        .unwrap();

        let config = load_app_config(dir.path()).unwrap();
        assert_eq!(config.completion.max_tokens, 2000);
    }
}

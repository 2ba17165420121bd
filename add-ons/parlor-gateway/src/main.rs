//! Axum-based HTTP front end for Parlor. Config-driven via CoreConfig.

mod handlers;

use axum::extract::State;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use parlor_core::{bootstrap, BootSource, Brain, CoreConfig, DialogueAdapter, Pipeline};
use std::path::Path as StdPath;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) brain: Arc<Brain>,
    pub(crate) pipeline: Arc<Pipeline>,
}

/// Bootstraps the brain and wires the router and dialogue adapter into a pipeline.
fn assemble(config: &CoreConfig) -> Result<(Arc<Brain>, Arc<Pipeline>, BootSource), String> {
    let (brain, source) = bootstrap(
        StdPath::new(&config.aiml_dir),
        StdPath::new(&config.brain_path),
    )
    .map_err(|e| format!("Brain bootstrap failed: {}", e))?;
    let brain = Arc::new(brain);
    let router = parlor_skills::default_router(config)
        .map_err(|e| format!("HTTP client setup failed: {}", e))?;
    let pipeline = Arc::new(Pipeline::new(
        Arc::new(router),
        DialogueAdapter::new(brain.clone()),
    ));
    Ok((brain, pipeline, source))
}

/// Pre-flight check: config loads, brain bootstraps, port is available.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking brain ({} / {})... ", config.brain_path, config.aiml_dir);
    let (brain, pipeline, source) = assemble(&config)?;
    println!("OK ({:?}, {} categories)", source, brain.category_count());

    println!("Utility routes: {}", pipeline.router().route_names().join(" > "));
    if config.weather_api_key().is_none() {
        println!("Weather: disabled (no openweather_api_key)");
    }

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\nSUCCESS: Ready to start gateway.");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[parlor-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoreConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!("Config load failed: {}", e);
            std::process::exit(1);
        }
    };

    let (brain, pipeline, source) = match assemble(&config) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        target: "parlor::gateway",
        source = ?source,
        categories = brain.category_count(),
        "Brain ready"
    );

    let app = build_app(AppState {
        config: Arc::clone(&config),
        brain,
        pipeline,
    });

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Could not bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("{} listening on {}", config.app_name, addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let mut app = Router::new()
        .route("/ask", post(handlers::ask::ask))
        .route("/health", get(health))
        .route("/status", get(status));

    if state.config.frontend_enabled {
        let index = StdPath::new(&state.config.static_dir).join("index.html");
        app = app.route_service("/", ServeFile::new(index));
    }

    app.layer(cors).with_state(state)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

async fn status(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "app_name": state.config.app_name,
        "utility_routes": state.pipeline.router().route_names(),
        "weather_enabled": state.config.weather_api_key().is_some(),
        "brain_categories": state.brain.category_count(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use parlor_core::FALLBACK_REPLY;
    use tower::ServiceExt;

    const RULES: &str = r#"<aiml>
        <category><pattern>HELLO</pattern><template>Hi there!</template></category>
        <category><pattern>WHO AM I</pattern><template>You are <get name="userid"/>.</template></category>
        <category><pattern>WEATHER IN *</pattern><template>I can't check the weather in <star/>.</template></category>
    </aiml>"#;

    fn test_config(static_dir: &str, frontend_enabled: bool) -> CoreConfig {
        CoreConfig {
            app_name: "Test Parlor".to_string(),
            port: 5000,
            aiml_dir: "./aiml".to_string(),
            brain_path: "./bot_brain.brn".to_string(),
            openweather_api_key: None,
            weather_api_url: "http://127.0.0.1:9/weather".to_string(),
            wiki_api_url: "http://127.0.0.1:9".to_string(),
            lookup_timeout_secs: 1,
            frontend_enabled,
            static_dir: static_dir.to_string(),
        }
    }

    fn test_app(config: CoreConfig) -> Router {
        let mut brain = Brain::new();
        brain.learn_str(RULES).unwrap();
        let brain = Arc::new(brain);
        let router = parlor_skills::default_router(&config).unwrap();
        let pipeline = Arc::new(Pipeline::new(
            Arc::new(router),
            DialogueAdapter::new(brain.clone()),
        ));
        build_app(AppState {
            config: Arc::new(config),
            brain,
            pipeline,
        })
    }

    async fn ask(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/ask")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_ask_brain_reply() {
        let app = test_app(test_config("./static", false));
        let (status, json) = ask(app, r#"{"user_id":"u1","message":"  hello "}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["reply"], "Hi there!");
    }

    #[tokio::test]
    async fn test_ask_binds_user_id_predicate() {
        let app = test_app(test_config("./static", false));
        let (_, json) = ask(app.clone(), r#"{"user_id":"u-77","message":"who am i"}"#).await;
        assert_eq!(json["reply"], "You are u-77.");
        let (_, json) = ask(app, r#"{"message":"who am i"}"#).await;
        assert_eq!(json["reply"], "You are anon.");
    }

    #[tokio::test]
    async fn test_ask_clock_preempts_brain() {
        let app = test_app(test_config("./static", false));
        let (_, json) = ask(app, r#"{"message":"what time is it"}"#).await;
        let reply = json["reply"].as_str().unwrap();
        assert!(reply.starts_with("The time is "), "{reply}");
    }

    #[tokio::test]
    async fn test_weather_without_key_reaches_brain() {
        let app = test_app(test_config("./static", false));
        let (_, json) = ask(app, r#"{"message":"weather in Paris"}"#).await;
        assert_eq!(json["reply"], "I can't check the weather in Paris.");
    }

    #[tokio::test]
    async fn test_ask_unknown_falls_back() {
        let app = test_app(test_config("./static", false));
        let (_, json) = ask(app, r#"{"message":"sing me a song"}"#).await;
        assert_eq!(json["reply"], FALLBACK_REPLY);
        let app = test_app(test_config("./static", false));
        let (_, json) = ask(app, "{}").await;
        assert_eq!(json["reply"], FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_ask_without_content_type_is_accepted() {
        let app = test_app(test_config("./static", false));
        let req = Request::builder()
            .method("POST")
            .uri("/ask")
            .body(Body::from(r#"{"message":"hello"}"#))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ask_malformed_body_is_bad_request() {
        let app = test_app(test_config("./static", false));
        let (status, json) = ask(app, "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("invalid JSON"));
    }

    #[tokio::test]
    async fn test_status_reports_routes_and_brain() {
        let app = test_app(test_config("./static", false));
        let req = Request::builder().uri("/status").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["app_name"], "Test Parlor");
        assert_eq!(json["utility_routes"], serde_json::json!(["Clock", "Calendar", "Wiki"]));
        assert_eq!(json["weather_enabled"], false);
        assert_eq!(json["brain_categories"], 3);
    }

    #[tokio::test]
    async fn test_frontend_index_served_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>parlor</html>").unwrap();
        let app = test_app(test_config(dir.path().to_str().unwrap(), true));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<html>parlor</html>");
    }

    #[tokio::test]
    async fn test_frontend_not_routed_when_disabled() {
        let app = test_app(test_config("./static", false));
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}

//! Servidor web Axum para classificação de menções em laudos radiológicos
//!
//! Configuração por variáveis de ambiente:
//!
//! | Variável               | Padrão              | Uso                                         |
//! |------------------------|---------------------|---------------------------------------------|
//! | `LABELER_ADDR`         | `0.0.0.0:3000`      | endereço de escuta                          |
//! | `LABELER_PATTERNS_DIR` | padrões embutidos   | diretório com os três arquivos de padrões   |
//! | `LABELER_PARSE_INFON`  | `conllu`            | infon da sentença que contém o parse        |
//! | `LABELER_VERBOSE`      | desligado           | `1`/`true` loga o progresso por documento   |
//! | `RUST_LOG`             | `info`              | filtro de logs                              |

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use labeler_core::{Classifier, Collection, ConlluConverter, PatternPaths, PrecomputedParser, Stage};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Config {
    addr: String,
    patterns_dir: Option<PathBuf>,
    parse_infon: String,
    verbose: bool,
}

impl Config {
    fn from_env() -> Self {
        Self {
            addr: std::env::var("LABELER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            patterns_dir: std::env::var_os("LABELER_PATTERNS_DIR").map(PathBuf::from),
            parse_infon: std::env::var("LABELER_PARSE_INFON")
                .unwrap_or_else(|_| PrecomputedParser::DEFAULT_INFON.to_string()),
            verbose: std::env::var("LABELER_VERBOSE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    fn pattern_paths(&self) -> PatternPaths {
        match &self.patterns_dir {
            Some(dir) => PatternPaths::from_dir(dir),
            None => PatternPaths::bundled(),
        }
    }
}

/// Estado compartilhado da aplicação
struct AppState {
    classifier: Classifier,
}

#[derive(Serialize)]
struct PatternSetInfo {
    stage: Stage,
    name: String,
    count: usize,
    patterns: Vec<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let paths = config.pattern_paths();
    let parser = PrecomputedParser::new(config.parse_infon.as_str());

    let classifier = match Classifier::new(&paths, parser, ConlluConverter) {
        Ok(classifier) => classifier.verbose(config.verbose),
        Err(e) => {
            error!(error = %e, "Não foi possível carregar os padrões");
            std::process::exit(1);
        }
    };
    for stage in Stage::CASCADE {
        let set = classifier.detector().patterns(stage);
        info!(?stage, patterns = set.len(), "Conjunto de padrões carregado");
    }

    let app = router(Arc::new(AppState { classifier }));

    let listener = match tokio::net::TcpListener::bind(&config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.addr, error = %e, "Não foi possível abrir o endereço");
            std::process::exit(1);
        }
    };
    info!("🚀 Servidor de rotulagem iniciado em http://{}", config.addr);
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Servidor encerrado com erro");
    }
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/patterns", get(patterns_handler))
        .route("/classify", post(classify_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Lista os conjuntos de padrões na ordem da cascata
async fn patterns_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let sets: Vec<PatternSetInfo> = Stage::CASCADE
        .iter()
        .map(|&stage| {
            let set = state.classifier.detector().patterns(stage);
            PatternSetInfo {
                stage,
                name: set.name().to_string(),
                count: set.len(),
                patterns: set.iter().map(|p| p.name().to_string()).collect(),
            }
        })
        .collect();
    Json(sets)
}

/// Classifica um lote; a classificação é síncrona e roda fora do runtime
async fn classify_handler(
    State(state): State<Arc<AppState>>,
    Json(collection): Json<Collection>,
) -> impl IntoResponse {
    let documents = collection.documents.len();
    let start = Instant::now();

    let result = tokio::task::spawn_blocking(move || state.classifier.classify(collection)).await;

    match result {
        Ok(Ok(classified)) => {
            info!(documents, processing_ms = start.elapsed().as_millis() as u64, "Lote classificado");
            Json(classified).into_response()
        }
        Ok(Err(e)) => {
            error!(error = %e, "Falha na classificação");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(serde_json::json!({"error": e.to_string()})),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Tarefa de classificação abortada");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "tarefa de classificação falhou"})),
            )
                .into_response()
        }
    }
}

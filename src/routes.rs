use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::client::FetchError;
use crate::pipeline::Pipeline;
use crate::session::SessionState;

pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Parent of every per-request token; cancelled on shutdown.
    pub shutdown: CancellationToken,
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub state: SessionState,
    pub stories_url: String,
}

#[derive(Template)]
#[template(path = "session.html")]
pub struct SessionTemplate {
    pub state: SessionState,
    pub stories_url: String,
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct StoriesQuery {
    /// Fixes the sampler seed so the same listing yields the same page.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl StoriesQuery {
    fn stories_url(&self) -> String {
        match self.seed {
            Some(seed) => format!("/stories?seed={}", seed),
            None => "/stories".to_string(),
        }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/stories", get(stories))
        .route("/health", get(health))
        .with_state(state)
}

// Route handlers
/// Serves the page shell. An unparsable seed is ignored rather than rejected.
pub async fn index(query: Option<Query<StoriesQuery>>) -> impl IntoResponse {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    HtmlTemplate(IndexTemplate {
        state: SessionState::Loading,
        stories_url: query.stories_url(),
    })
}

pub async fn stories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StoriesQuery>,
) -> impl IntoResponse {
    let mut rng = query.rng();

    // Dropping the request (client went away) cancels the in-flight fetches.
    let cancel = state.shutdown.child_token();
    let _guard = cancel.clone().drop_guard();

    let outcome = state.pipeline.run(&mut rng, &cancel).await;
    match &outcome {
        Err(FetchError::Cancelled) => warn!("Story load cancelled"),
        Err(e) => error!("Failed to load stories: {}", e),
        Ok(_) => {}
    }

    HtmlTemplate(SessionTemplate {
        state: SessionState::Loading.settle(outcome),
        stories_url: query.stories_url(),
    })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}

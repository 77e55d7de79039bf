use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chief_core::{LoadState, Pantry, PantryCell, Recipe, RecipeId, DEFAULT_SUGGESTION_LIMIT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;
const MAX_PAGE: usize = 100;

#[derive(Deserialize)]
pub struct MatchParams {
    /// Comma-separated ingredients on hand. Absent or blank lists the whole corpus.
    #[serde(default)]
    pub have: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_page")]
    pub limit: usize,
}
fn default_page() -> usize { 20 }

#[derive(Deserialize)]
pub struct LatestParams {
    #[serde(default = "default_latest")]
    pub k: usize,
}
fn default_latest() -> usize { 5 }

#[derive(Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_suggest")]
    pub k: usize,
}
fn default_suggest() -> usize { DEFAULT_SUGGESTION_LIMIT }

#[derive(Deserialize)]
pub struct IngredientParams {
    pub term: String,
}

#[derive(Serialize)]
pub struct RecipeSummary<'a> {
    pub id: RecipeId,
    pub title: &'a str,
    pub image: Option<&'a str>,
}

impl<'a> From<&'a Recipe> for RecipeSummary<'a> {
    fn from(r: &'a Recipe) -> Self {
        Self { id: r.id, title: &r.title, image: r.image() }
    }
}

#[derive(Serialize)]
pub struct MatchHit<'a> {
    #[serde(flatten)]
    pub recipe: RecipeSummary<'a>,
    pub matches: usize,
}

#[derive(Serialize)]
pub struct MatchResponse<'a> {
    pub have: Vec<String>,
    pub keys: &'a [String],
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<MatchHit<'a>>,
}

/// Why a data endpoint could not answer.
#[derive(Debug)]
pub enum ApiError {
    Loading,
    Failed(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Loading => (StatusCode::SERVICE_UNAVAILABLE, serde_json::json!({ "status": "loading" })),
            ApiError::Failed(error) => {
                (StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({ "status": "failed", "error": error }))
            }
            ApiError::NotFound(error) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": error })),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub cell: Arc<PantryCell>,
}

impl AppState {
    fn pantry(&self) -> Result<Arc<Pantry>, ApiError> {
        match self.cell.state() {
            LoadState::Ready(p) => Ok(p),
            LoadState::Loading => Err(ApiError::Loading),
            LoadState::Failed(e) => Err(ApiError::Failed(e.to_string())),
        }
    }
}

pub fn build_app(cell: Arc<PantryCell>) -> Router {
    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/recipes", get(recipes_handler))
        .route("/recipes/latest", get(latest_handler))
        .route("/recipe/:id", get(recipe_handler))
        .route("/match", get(match_handler))
        .route("/suggest", get(suggest_handler))
        .route("/ingredient", get(ingredient_handler))
        .with_state(AppState { cell })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Always 200; reports the load state instead of failing.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let load = state.cell.state();
    let mut body = serde_json::json!({ "status": load.label() });
    match &load {
        LoadState::Ready(p) => {
            body["recipes"] = p.corpus.len().into();
            body["skipped"] = p.report.skipped.into();
            body["fallbacks"] = p.report.fallbacks.into();
            body["ingredient_keys"] = p.index.len().into();
            body["catalog"] = p.catalog.len().into();
            if let Some(err) = &p.catalog_error {
                body["catalog_error"] = err.clone().into();
            }
        }
        LoadState::Failed(e) => body["error"] = e.to_string().into(),
        LoadState::Loading => {}
    }
    Json(body)
}

pub async fn recipes_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pantry = state.pantry()?;
    let recipes = pantry.corpus.recipes();
    let start = params.offset.min(recipes.len());
    let end = start.saturating_add(params.limit.min(MAX_PAGE)).min(recipes.len());
    let page: Vec<RecipeSummary> = recipes[start..end].iter().map(RecipeSummary::from).collect();
    Ok(Json(serde_json::json!({ "total": recipes.len(), "offset": start, "recipes": page })))
}

pub async fn latest_handler(
    State(state): State<AppState>,
    Query(params): Query<LatestParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pantry = state.pantry()?;
    let latest: Vec<RecipeSummary> = pantry.corpus.latest(params.k.min(MAX_PAGE)).iter().map(RecipeSummary::from).collect();
    Ok(Json(serde_json::json!({ "recipes": latest })))
}

pub async fn recipe_handler(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pantry = state.pantry()?;
    let recipe = pantry.corpus.get(id).ok_or_else(|| ApiError::NotFound(format!("no recipe with id {id}")))?;
    serde_json::to_value(recipe)
        .map(Json)
        .map_err(|e| ApiError::Failed(e.to_string()))
}

pub async fn match_handler(
    State(state): State<AppState>,
    Query(params): Query<MatchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let start = std::time::Instant::now();
    let pantry = state.pantry()?;
    let have: Vec<String> = params
        .have
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let ranking = pantry.rank(&have);
    let k = params.k.max(1).min(MAX_K);
    let results: Vec<MatchHit> = ranking
        .window(k)
        .iter()
        .map(|m| MatchHit { recipe: RecipeSummary::from(m.recipe), matches: m.count })
        .collect();

    let elapsed = start.elapsed();
    tracing::debug!(have = have.len(), total_hits = ranking.len(), took_s = elapsed.as_secs_f64(), "match");
    let response = MatchResponse {
        keys: ranking.keys(),
        took_s: elapsed.as_secs_f64(),
        total_hits: ranking.len(),
        results,
        have,
    };
    serde_json::to_value(&response)
        .map(Json)
        .map_err(|e| ApiError::Failed(e.to_string()))
}

pub async fn suggest_handler(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pantry = state.pantry()?;
    let suggestions = pantry.suggest(&params.q, params.k.min(MAX_K));
    Ok(Json(serde_json::json!({ "query": params.q, "suggestions": suggestions })))
}

pub async fn ingredient_handler(
    State(state): State<AppState>,
    Query(params): Query<IngredientParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pantry = state.pantry()?;
    let key = pantry.index.normalizer().normalize(&params.term);
    let recipes = pantry.index.postings(&key);
    Ok(Json(serde_json::json!({ "term": params.term, "key": key, "recipes": recipes })))
}

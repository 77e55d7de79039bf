use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chief_core::{default_normalizer, load_pantry, DataPaths, LoadError, PantryCell};
use http_body_util::BodyExt;
use hyper::body::Bytes;
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

const RECIPES: &str = r#"[
    {"Id": 10, "Title": "Onion Tart", "Ingredients": "['2 onions', '1 sheet puff pastry']",
     "Instructions": "Bake.", "Image_Name": "onion-tart",
     "Cleaned_Ingredients": "['2 medium onions, sliced', '1 sheet puff pastry']"},
    {"Id": 11, "Title": "Scrambled Eggs", "Ingredients": "['3 eggs', 'salt']",
     "Instructions": "Stir.", "Image_Name": "",
     "Cleaned_Ingredients": "['3 large eggs', 'Kosher salt, to taste']"},
    {"Title": "No id", "Ingredients": "[]", "Instructions": "", "Image_Name": "", "Cleaned_Ingredients": "[]"},
    {"Id": 12, "Title": "Onion Omelette", "Ingredients": "['2 eggs', '1 onion']",
     "Instructions": "Fold.", "Image_Name": "omelette",
     "Cleaned_Ingredients": "['2 large eggs', '1 onion, chopped', 'Kosher salt']"}
]"#;

const CATALOG: &str = r#"[
    {"id": "1", "ingredientId": "a", "searchValue": "onion", "term": "onion", "useCount": 500},
    {"id": "2", "ingredientId": "b", "searchValue": "onion powder", "term": "onion powder", "useCount": 50},
    {"id": "3", "ingredientId": "c", "searchValue": "egg", "term": "egg", "useCount": 900}
]"#;

fn ready_app() -> Router {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Recipes.json"), RECIPES).unwrap();
    fs::write(dir.path().join("ing.json"), CATALOG).unwrap();
    let pantry = load_pantry(&DataPaths::new(dir.path()), default_normalizer()).unwrap();
    chief_server::build_app(Arc::new(PantryCell::ready(pantry)))
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body: Bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

fn ids(results: &Value) -> Vec<i64> {
    results.as_array().unwrap().iter().map(|r| r["id"].as_i64().unwrap()).collect()
}

#[tokio::test]
async fn health_reports_counts() {
    let (status, json) = call(ready_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ready");
    assert_eq!(json["recipes"], 3);
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["catalog"], 3);
}

#[tokio::test]
async fn match_ranks_by_overlap() {
    let (status, json) = call(ready_app(), "/match?have=onion,%20eggs,kosher%20salt&k=1").await;
    assert_eq!(status, StatusCode::OK);
    // "onions" in the tart is a different key from "onion"
    assert_eq!(json["total_hits"], 2);
    assert_eq!(json["keys"], serde_json::json!(["onion", "eggs", "kosher salt"]));
    assert_eq!(ids(&json["results"]), vec![12]);
    assert_eq!(json["results"][0]["matches"], 3);
    assert_eq!(json["results"][0]["image"], "omelette");
    assert!(json["took_s"].as_f64().is_some());
}

#[tokio::test]
async fn empty_match_lists_corpus_in_order() {
    let (status, json) = call(ready_app(), "/match").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json["results"]), vec![10, 11, 12]);
    assert!(json["results"].as_array().unwrap().iter().all(|r| r["matches"] == 0));
}

#[tokio::test]
async fn recipe_pages_and_detail() {
    let (_, page) = call(ready_app(), "/recipes?offset=1&limit=1").await;
    assert_eq!(page["total"], 3);
    assert_eq!(ids(&page["recipes"]), vec![11]);

    let (_, latest) = call(ready_app(), "/recipes/latest?k=2").await;
    assert_eq!(ids(&latest["recipes"]), vec![11, 12]);

    let (status, detail) = call(ready_app(), "/recipe/10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["title"], "Onion Tart");
    assert_eq!(detail["normalized_ingredients"][0], "onions");

    let (status, _) = call(ready_app(), "/recipe/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn suggest_orders_by_use_count() {
    let (status, json) = call(ready_app(), "/suggest?q=ONI").await;
    assert_eq!(status, StatusCode::OK);
    let terms: Vec<_> = json["suggestions"].as_array().unwrap().iter().map(|e| e["term"].as_str().unwrap()).collect();
    assert_eq!(terms, vec!["onion", "onion powder"]);

    let (_, empty) = call(ready_app(), "/suggest?q=").await;
    assert!(empty["suggestions"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn ingredient_lookup_normalizes_term() {
    let (_, json) = call(ready_app(), "/ingredient?term=1%20cup%20Kosher%20salt").await;
    assert_eq!(json["key"], "kosher salt");
    assert_eq!(json["recipes"], serde_json::json!([11, 12]));
}

#[tokio::test]
async fn loading_and_failed_states() {
    let cell = Arc::new(PantryCell::new());
    let app = chief_server::build_app(Arc::clone(&cell));

    let (status, json) = call(app.clone(), "/match?have=onion").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "loading");
    let (status, json) = call(app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "loading");

    cell.publish(Err(LoadError::Task("boom".into())));
    let (status, json) = call(app, "/recipes").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "failed");
}

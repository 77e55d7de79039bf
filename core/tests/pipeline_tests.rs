use chief_core::catalog::{load_catalog, suggest, DEFAULT_SUGGESTION_LIMIT};
use chief_core::corpus::{load_corpus, UNTITLED};
use chief_core::{default_normalizer, normalize, parse_array_field, IngredientIndex, RecordError};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn skips_records_without_id() {
    let load = load_corpus(&fixture("recipes.json"), default_normalizer()).unwrap();
    assert_eq!(load.corpus.len(), 8);
    assert_eq!(load.skipped(), 2);

    let ids: Vec<_> = load.corpus.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![0, 1, 3, 4, 5, 6, 8, 9]);

    let positions: Vec<_> = load.report.records.iter().map(|r| r.position).collect();
    assert_eq!(positions, vec![2, 7]);
    for record in &load.report.records {
        assert_eq!(record.error, Some(RecordError::MissingFields(vec!["Id"])));
    }
    assert_eq!(load.report.fallbacks, 0);
}

#[test]
fn recipes_are_cleaned_and_normalized() {
    let load = load_corpus(&fixture("recipes.json"), default_normalizer()).unwrap();
    let chicken = load.corpus.get(0).unwrap();
    assert_eq!(chicken.ingredients.len(), 6);
    assert_eq!(
        chicken.normalized_ingredients,
        vec!["chicken", "kosher salt", "acorn squash", "sage", "onion", "unsalted butter"]
    );
    assert!(chicken.instructions.contains('\n'));

    let untitled = load.corpus.get(6).unwrap();
    assert_eq!(untitled.title, UNTITLED);
    assert_eq!(untitled.image(), None);

    let omelette = load.corpus.get(8).unwrap();
    assert_eq!(omelette.normalized_ingredients, vec!["eggs", "kosher salt", "unsalted butter", "chives"]);

    assert!(load.corpus.get(9).unwrap().normalized_ingredients.is_empty());
}

#[test]
fn index_covers_every_normalized_ingredient() {
    let load = load_corpus(&fixture("recipes.json"), default_normalizer()).unwrap();
    let index = IngredientIndex::build(&load.corpus);
    for recipe in load.corpus.iter() {
        for key in recipe.normalized_ingredients.iter().filter(|k| !k.is_empty()) {
            assert!(index.postings(key).contains(&recipe.id));
        }
    }
    assert_eq!(index.recipes_with("2 cups chopped onion"), &[0, 3, 6]);
    assert!(index.contains("Kosher Salt, to taste"));
}

#[test]
fn ranks_fixture_by_overlap() {
    let load = load_corpus(&fixture("recipes.json"), default_normalizer()).unwrap();
    let index = IngredientIndex::build(&load.corpus);

    let ranking = chief_core::rank(&load.corpus, &index, &["1 onion", "kosher salt", "3 large eggs"]);
    let got: Vec<_> = ranking.iter().map(|m| (m.recipe.id, m.count)).collect();
    assert_eq!(got, vec![(3, 3), (0, 2), (6, 2), (8, 2), (1, 1)]);
    assert_eq!(ranking.window(2).len(), 2);

    let none: Vec<String> = Vec::new();
    let all = chief_core::rank(&load.corpus, &index, &none);
    assert_eq!(all.len(), 8);
    assert!(all.iter().all(|m| m.count == 0));
    assert_eq!(all.results().last().unwrap().recipe.id, 9);
}

#[test]
fn normalization_is_idempotent_over_fixture() {
    let text = std::fs::read_to_string(fixture("recipes.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    for record in value.as_array().unwrap() {
        for field in ["Ingredients", "Cleaned_Ingredients"] {
            for line in parse_array_field(record[field].as_str().unwrap()) {
                let once = normalize(&line);
                assert_eq!(normalize(&once), once, "{line:?}");
            }
        }
    }
}

#[test]
fn suggests_from_catalog() {
    let load = load_catalog(&fixture("ing.json")).unwrap();
    assert_eq!(load.entries.len(), 7);
    assert_eq!(load.skipped(), 1);

    let terms: Vec<_> = suggest(&load.entries, "oni", DEFAULT_SUGGESTION_LIMIT)
        .into_iter()
        .map(|e| e.term.as_str())
        .collect();
    assert_eq!(terms, vec!["onion", "scallion", "onion powder"]);
    assert!(suggest(&load.entries, "", DEFAULT_SUGGESTION_LIMIT).is_empty());
}

#[test]
fn missing_dataset_is_reported_not_empty() {
    let err = load_corpus(&fixture("absent.json"), default_normalizer()).unwrap_err();
    assert!(err.is_not_found());
    assert!(load_catalog(&fixture("absent.json")).unwrap_err().is_not_found());
}

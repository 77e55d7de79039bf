use crate::corpus::Corpus;
use crate::normalizer::Normalizer;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub type RecipeId = i64;

/// Inverted index from normalized ingredient key to the recipes containing it.
///
/// Built once per corpus and never mutated. Posting lists hold each recipe at most once,
/// in corpus order. Empty keys are never indexed.
#[derive(Debug)]
pub struct IngredientIndex {
    postings: HashMap<String, Vec<RecipeId>>,
    normalizer: Arc<Normalizer>,
    num_recipes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub num_recipes: usize,
    pub num_keys: usize,
    pub num_postings: usize,
}

impl IngredientIndex {
    pub fn build(corpus: &Corpus) -> Self {
        let mut postings: HashMap<String, Vec<RecipeId>> = HashMap::new();
        for recipe in corpus.iter() {
            let mut seen_in_recipe: HashSet<&str> = HashSet::new();
            for key in &recipe.normalized_ingredients {
                if key.is_empty() || !seen_in_recipe.insert(key.as_str()) {
                    continue;
                }
                postings.entry(key.clone()).or_default().push(recipe.id);
            }
        }
        let index = Self { postings, normalizer: Arc::clone(corpus.normalizer()), num_recipes: corpus.len() };
        tracing::info!(recipes = index.num_recipes, keys = index.postings.len(), "built ingredient index");
        index
    }

    /// The normalizer the corpus keys were produced with; queries must go through it too.
    pub fn normalizer(&self) -> &Arc<Normalizer> { &self.normalizer }

    /// Recipes indexed under an already-normalized key.
    pub fn postings(&self, key: &str) -> &[RecipeId] {
        self.postings.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Recipes containing the raw ingredient `term`, after normalization.
    pub fn recipes_with(&self, term: &str) -> &[RecipeId] {
        self.postings(&self.normalizer.normalize(term))
    }

    /// Does any recipe contain `term`?
    pub fn contains(&self, term: &str) -> bool {
        !self.recipes_with(term).is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.postings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize { self.postings.len() }
    pub fn is_empty(&self) -> bool { self.postings.is_empty() }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            num_recipes: self.num_recipes,
            num_keys: self.postings.len(),
            num_postings: self.postings.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Recipe;
    use crate::normalizer::default_normalizer;

    fn corpus() -> Corpus {
        let lines = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Corpus::from_recipes(
            vec![
                Recipe::new(1, "omelette", lines(&["2 large eggs", "1 egg", "1 onion, chopped"])),
                Recipe::new(2, "bread", lines(&["3 cups flour", "1 tsp salt", "2 cups, chopped"])),
                Recipe::new(3, "soup", lines(&["onion", "salt to taste"])),
            ],
            default_normalizer(),
        )
    }

    #[test]
    fn every_key_points_back_to_its_recipes() {
        let corpus = corpus();
        let index = IngredientIndex::build(&corpus);
        for recipe in corpus.iter() {
            for key in recipe.normalized_ingredients.iter().filter(|k| !k.is_empty()) {
                assert!(index.postings(key).contains(&recipe.id), "{key} missing {}", recipe.id);
            }
        }
    }

    #[test]
    fn postings_are_deduplicated_and_in_corpus_order() {
        let corpus = Corpus::from_recipes(
            vec![
                Recipe::new(9, "a", vec!["onion".into(), "2 onion".into()]),
                Recipe::new(4, "b", vec!["chopped onion".into()]),
            ],
            default_normalizer(),
        );
        let index = IngredientIndex::build(&corpus);
        assert_eq!(index.postings("onion"), &[9, 4]);
    }

    #[test]
    fn empty_keys_are_not_indexed() {
        let corpus = corpus();
        assert!(corpus.get(2).unwrap().normalized_ingredients.contains(&String::new()));
        let index = IngredientIndex::build(&corpus);
        assert!(index.keys().all(|k| !k.is_empty()));
        assert!(index.postings("").is_empty());
    }

    #[test]
    fn raw_terms_are_normalized_for_lookup() {
        let index = IngredientIndex::build(&corpus());
        assert!(index.contains("3 Onion"));
        assert_eq!(index.recipes_with("a pinch of salt"), &[2, 3]);
        assert!(!index.contains("saffron"));
        assert_eq!(index.stats().num_recipes, 3);
    }
}

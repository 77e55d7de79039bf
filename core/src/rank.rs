use crate::corpus::{Corpus, Recipe};
use crate::index::{IngredientIndex, RecipeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult<'a> {
    pub recipe: &'a Recipe,
    /// Distinct selected keys present in the recipe.
    pub count: usize,
}

/// Recipes ordered by match count, ties in corpus order.
#[derive(Debug, Clone)]
pub struct Ranking<'a> {
    keys: Vec<String>,
    results: Vec<MatchResult<'a>>,
}

impl<'a> Ranking<'a> {
    /// Normalized, deduplicated selection the ranking was computed for.
    pub fn keys(&self) -> &[String] { &self.keys }
    pub fn len(&self) -> usize { self.results.len() }
    pub fn is_empty(&self) -> bool { self.results.is_empty() }
    pub fn results(&self) -> &[MatchResult<'a>] { &self.results }
    pub fn iter(&self) -> std::slice::Iter<'_, MatchResult<'a>> { self.results.iter() }

    /// The first `n` results. A larger `n` always extends a smaller one.
    pub fn window(&self, n: usize) -> &[MatchResult<'a>] {
        &self.results[..n.min(self.results.len())]
    }
}

/// Rank `corpus` against the ingredients a user has on hand.
///
/// An empty selection (or one whose terms all normalize to nothing) returns every recipe
/// with a zero count in corpus order. Otherwise recipes without any overlap are dropped.
pub fn rank<'a, S: AsRef<str>>(corpus: &'a Corpus, index: &IngredientIndex, selection: &[S]) -> Ranking<'a> {
    debug_assert!(
        Arc::ptr_eq(corpus.normalizer(), index.normalizer()),
        "index was built from a different corpus"
    );
    let normalizer = index.normalizer();
    let mut seen = HashSet::new();
    let keys: Vec<String> = selection
        .iter()
        .map(|term| normalizer.normalize(term.as_ref()))
        .filter(|key| !key.is_empty() && seen.insert(key.clone()))
        .collect();

    if keys.is_empty() {
        let results = corpus.iter().map(|recipe| MatchResult { recipe, count: 0 }).collect();
        return Ranking { keys, results };
    }

    let mut counts: HashMap<RecipeId, usize> = HashMap::new();
    for key in &keys {
        for id in index.postings(key) {
            *counts.entry(*id).or_insert(0) += 1;
        }
    }

    let mut results: Vec<MatchResult<'a>> = corpus
        .iter()
        .filter_map(|recipe| counts.get(&recipe.id).map(|&count| MatchResult { recipe, count }))
        .collect();
    // stable: equal counts keep corpus order
    results.sort_by(|a, b| b.count.cmp(&a.count));
    tracing::debug!(keys = ?keys, hits = results.len(), "ranked corpus");
    Ranking { keys, results }
}

/// Growing result window for "load more" paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    shown: usize,
}

impl Default for Pager {
    fn default() -> Self { Self::new(DEFAULT_PAGE_SIZE) }
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self { page_size, shown: page_size }
    }

    pub fn shown(&self) -> usize { self.shown }

    /// Grow the window by one page and return the new size.
    pub fn load_more(&mut self) -> usize {
        self.shown = self.shown.saturating_add(self.page_size);
        self.shown
    }

    /// Back to the first page, for a new selection.
    pub fn reset(&mut self) {
        self.shown = self.page_size;
    }

    pub fn window<'r, 'a>(&self, ranking: &'r Ranking<'a>) -> &'r [MatchResult<'a>] {
        ranking.window(self.shown)
    }

    pub fn has_more(&self, ranking: &Ranking<'_>) -> bool {
        self.shown < ranking.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::default_normalizer;

    fn make_corpus(recipes: Vec<(RecipeId, Vec<&str>)>) -> Corpus {
        Corpus::from_recipes(
            recipes
                .into_iter()
                .map(|(id, ing)| Recipe::new(id, "r", ing.into_iter().map(String::from).collect()))
                .collect(),
            default_normalizer(),
        )
    }

    fn pairs(ranking: &Ranking<'_>) -> Vec<(RecipeId, usize)> {
        ranking.iter().map(|m| (m.recipe.id, m.count)).collect()
    }

    #[test]
    fn counts_distinct_overlap() {
        let corpus = make_corpus(vec![(1, vec!["onion", "egg"])]);
        let index = IngredientIndex::build(&corpus);
        let ranking = rank(&corpus, &index, &["2 cups onion", "salt"]);
        assert_eq!(pairs(&ranking), vec![(1, 1)]);

        let ranking = rank(&corpus, &index, &["onion", "chopped onion", "ONION"]);
        assert_eq!(pairs(&ranking), vec![(1, 1)]);
        assert_eq!(ranking.keys(), &["onion".to_string()]);
    }

    #[test]
    fn ties_keep_corpus_order() {
        let corpus = make_corpus(vec![(1, vec!["onion", "egg"]), (2, vec!["onion", "flour"])]);
        let index = IngredientIndex::build(&corpus);
        assert_eq!(pairs(&rank(&corpus, &index, &["onion"])), vec![(1, 1), (2, 1)]);

        let corpus = make_corpus(vec![(5, vec!["onion"]), (2, vec!["onion", "flour"]), (9, vec!["flour"])]);
        let index = IngredientIndex::build(&corpus);
        assert_eq!(pairs(&rank(&corpus, &index, &["onion", "flour"])), vec![(2, 2), (5, 1), (9, 1)]);
    }

    #[test]
    fn empty_selection_passes_everything_through() {
        let corpus = make_corpus(vec![(3, vec!["egg"]), (1, vec![]), (2, vec!["salt"])]);
        let index = IngredientIndex::build(&corpus);
        let empty: [&str; 0] = [];
        assert_eq!(pairs(&rank(&corpus, &index, &empty)), vec![(3, 0), (1, 0), (2, 0)]);
        assert_eq!(pairs(&rank(&corpus, &index, &["2 cups, chopped"])), vec![(3, 0), (1, 0), (2, 0)]);
    }

    #[test]
    fn no_overlap_yields_nothing() {
        let corpus = make_corpus(vec![(1, vec!["egg"])]);
        let index = IngredientIndex::build(&corpus);
        assert!(rank(&corpus, &index, &["saffron"]).is_empty());
    }

    #[test]
    fn windows_only_grow() {
        let recipes = (0..23)
            .map(|id| (id, if id % 3 == 0 { vec!["onion", "egg"] } else { vec!["onion"] }))
            .collect();
        let corpus = make_corpus(recipes);
        let index = IngredientIndex::build(&corpus);
        let ranking = rank(&corpus, &index, &["onion", "egg"]);

        let five = pairs_of(ranking.window(5));
        let ten = pairs_of(ranking.window(10));
        assert_eq!(&ten[..5], &five[..]);
        assert_eq!(ranking.window(100).len(), 23);

        let mut pager = Pager::new(10);
        let mut previous = pairs_of(pager.window(&ranking));
        while pager.has_more(&ranking) {
            pager.load_more();
            let current = pairs_of(pager.window(&ranking));
            assert!(current.len() > previous.len());
            assert_eq!(&current[..previous.len()], &previous[..]);
            previous = current;
        }
        assert_eq!(previous.len(), 23);
        pager.reset();
        assert_eq!(pager.shown(), 10);
    }

    fn pairs_of(window: &[MatchResult<'_>]) -> Vec<(RecipeId, usize)> {
        window.iter().map(|m| (m.recipe.id, m.count)).collect()
    }
}

//! Recipe corpus ingestion and ingredient matching.
//!
//! The pipeline runs once per process: the corpus is loaded, its list fields parsed, its
//! ingredients normalized and indexed, and the result published as one immutable
//! [`Pantry`]. Ranking and suggestions then only read.

pub mod array_field;
pub mod catalog;
pub mod corpus;
pub mod debounce;
pub mod error;
pub mod index;
pub mod normalizer;
pub mod pantry;
pub mod rank;
pub mod resource;

pub use array_field::{parse_array_field, FieldForm};
pub use catalog::{load_catalog, suggest, CatalogLoad, IngredientCatalogEntry, DEFAULT_SUGGESTION_LIMIT};
pub use corpus::{load_corpus, Corpus, CorpusLoad, LoadReport, Recipe};
pub use error::{LoadError, RecordError, VocabularyError};
pub use index::{IngredientIndex, RecipeId};
pub use normalizer::{default_normalizer, normalize, Normalizer, Vocabulary, VocabularyOverrides};
pub use pantry::{load_pantry, load_pantry_async, spawn_load, LoadState, Pantry, PantryCell};
pub use rank::{rank, MatchResult, Pager, Ranking};
pub use resource::DataPaths;

use crate::array_field::{parse_array_field_with_form, FieldForm};
use crate::error::{LoadError, RecordError};
use crate::normalizer::Normalizer;
use crate::resource::open_resource;
use crate::RecipeId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

pub const UNTITLED: &str = "Untitled Recipe";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    /// Ingredient lines as displayed.
    pub ingredients: Vec<String>,
    /// Ingredient lines from `Cleaned_Ingredients`.
    pub cleaned_ingredients: Vec<String>,
    /// One key per cleaned line, same order; may contain empty keys.
    pub normalized_ingredients: Vec<String>,
    pub instructions: String,
    pub image_name: String,
}

impl Recipe {
    /// A recipe whose displayed and cleaned ingredient lists are the same. The normalized
    /// list is filled in when the recipe joins a [`Corpus`].
    pub fn new(id: RecipeId, title: &str, ingredients: Vec<String>) -> Self {
        Self {
            id,
            title: clean_title(title),
            cleaned_ingredients: ingredients.clone(),
            ingredients,
            normalized_ingredients: Vec::new(),
            instructions: String::new(),
            image_name: String::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: &str) -> Self {
        self.instructions = clean_text(instructions);
        self
    }

    pub fn with_image(mut self, image_name: &str) -> Self {
        self.image_name = image_name.trim().to_string();
        self
    }

    pub fn image(&self) -> Option<&str> {
        if self.image_name.trim().is_empty() { None } else { Some(&self.image_name) }
    }
}

/// The loaded recipes in dataset order. Ids are unique.
///
/// A corpus remembers the normalizer that produced its keys so the index built from it
/// normalizes queries the same way.
#[derive(Debug)]
pub struct Corpus {
    recipes: Vec<Recipe>,
    positions: HashMap<RecipeId, usize>,
    normalizer: Arc<Normalizer>,
}

impl Corpus {
    pub fn empty(normalizer: Arc<Normalizer>) -> Self {
        Self { recipes: Vec::new(), positions: HashMap::new(), normalizer }
    }

    /// Normalizes every recipe's cleaned ingredients with `normalizer`. Later recipes
    /// repeating an earlier id are dropped.
    pub fn from_recipes(recipes: Vec<Recipe>, normalizer: Arc<Normalizer>) -> Self {
        let mut corpus = Corpus::empty(normalizer);
        for mut recipe in recipes {
            recipe.normalized_ingredients = corpus.normalize_all(&recipe.cleaned_ingredients);
            corpus.push(recipe);
        }
        corpus
    }

    fn normalize_all(&self, lines: &[String]) -> Vec<String> {
        lines.iter().map(|l| self.normalizer.normalize(l)).collect()
    }

    pub fn normalizer(&self) -> &Arc<Normalizer> { &self.normalizer }

    fn push(&mut self, recipe: Recipe) -> bool {
        if self.positions.contains_key(&recipe.id) {
            return false;
        }
        self.positions.insert(recipe.id, self.recipes.len());
        self.recipes.push(recipe);
        true
    }

    pub fn recipes(&self) -> &[Recipe] { &self.recipes }
    pub fn len(&self) -> usize { self.recipes.len() }
    pub fn is_empty(&self) -> bool { self.recipes.is_empty() }
    pub fn iter(&self) -> std::slice::Iter<'_, Recipe> { self.recipes.iter() }

    pub fn get(&self, id: RecipeId) -> Option<&Recipe> {
        self.position(id).map(|pos| &self.recipes[pos])
    }

    /// Position of `id` in dataset order.
    pub fn position(&self, id: RecipeId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// The recipe with `id`, or the first recipe when it is absent.
    pub fn featured(&self, id: RecipeId) -> Option<&Recipe> {
        self.get(id).or_else(|| self.recipes.first())
    }

    /// The last `n` recipes, in dataset order.
    pub fn latest(&self, n: usize) -> &[Recipe] {
        &self.recipes[self.recipes.len().saturating_sub(n)..]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    /// Index of the record in the dataset array.
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub reason: String,
    #[serde(skip)]
    pub error: Option<RecordError>,
}

/// Partial-load diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub skipped: usize,
    pub records: Vec<SkippedRecord>,
    /// Array fields that were not recognized as lists.
    pub fallbacks: usize,
}

impl LoadReport {
    pub(crate) fn skip(&mut self, position: usize, id: Option<i64>, error: RecordError) {
        tracing::warn!(position, ?id, reason = %error, "skipping record");
        self.skipped += 1;
        self.records.push(SkippedRecord { position, id, reason: error.to_string(), error: Some(error) });
    }
}

#[derive(Debug)]
pub struct CorpusLoad {
    pub corpus: Corpus,
    pub report: LoadReport,
}

impl CorpusLoad {
    pub fn skipped(&self) -> usize { self.report.skipped }
}

/// Load the recipe dataset at `path`.
pub fn load_corpus(path: &Path, normalizer: Arc<Normalizer>) -> Result<CorpusLoad, LoadError> {
    let reader = open_resource(path)?;
    let load = load_corpus_from_reader(reader, normalizer)?;
    tracing::info!(
        path = %path.display(),
        recipes = load.corpus.len(),
        skipped = load.report.skipped,
        fallbacks = load.report.fallbacks,
        "loaded recipe corpus"
    );
    Ok(load)
}

pub fn load_corpus_from_reader<R: Read>(reader: R, normalizer: Arc<Normalizer>) -> Result<CorpusLoad, LoadError> {
    let value: Value = serde_json::from_reader(reader)?;
    decode_corpus(value, normalizer)
}

pub fn load_corpus_from_str(text: &str, normalizer: Arc<Normalizer>) -> Result<CorpusLoad, LoadError> {
    let value: Value = serde_json::from_str(text)?;
    decode_corpus(value, normalizer)
}

fn decode_corpus(value: Value, normalizer: Arc<Normalizer>) -> Result<CorpusLoad, LoadError> {
    let records = record_array(value)?;
    let mut load = CorpusLoad { corpus: Corpus::empty(normalizer), report: LoadReport::default() };
    for (position, record) in records.into_iter().enumerate() {
        let raw: RawRecipe = match serde_json::from_value(record) {
            Ok(raw) => raw,
            Err(_) => {
                load.report.skip(position, None, RecordError::NotAnObject);
                continue;
            }
        };
        let fields = match raw.validate() {
            Ok(fields) => fields,
            Err(e) => {
                load.report.skip(position, None, e);
                continue;
            }
        };
        let id = fields.id;
        let recipe = fields.into_recipe(&load.corpus, &mut load.report);
        if !load.corpus.push(recipe) {
            load.report.skip(position, Some(id), RecordError::DuplicateId(id));
        }
    }
    Ok(load)
}

pub(crate) fn record_array(value: Value) -> Result<Vec<Value>, LoadError> {
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(_) => Err(LoadError::Malformed { found: "object" }),
        Value::String(_) => Err(LoadError::Malformed { found: "string" }),
        Value::Number(_) => Err(LoadError::Malformed { found: "number" }),
        Value::Bool(_) => Err(LoadError::Malformed { found: "boolean" }),
        Value::Null => Err(LoadError::Malformed { found: "null" }),
    }
}

/// Dataset record before validation. `None` means the key was absent; `Some(Null)` means
/// it was present but null.
#[derive(Debug, Deserialize)]
struct RawRecipe {
    #[serde(rename = "Id", default, deserialize_with = "present")]
    id: Option<Value>,
    #[serde(rename = "Title", default, deserialize_with = "present")]
    title: Option<Value>,
    #[serde(rename = "Ingredients", default, deserialize_with = "present")]
    ingredients: Option<Value>,
    #[serde(rename = "Instructions", default, deserialize_with = "present")]
    instructions: Option<Value>,
    #[serde(rename = "Image_Name", default, deserialize_with = "present")]
    image_name: Option<Value>,
    #[serde(rename = "Cleaned_Ingredients", default, deserialize_with = "present")]
    cleaned_ingredients: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

struct RecipeFields {
    id: RecipeId,
    title: String,
    ingredients: String,
    instructions: String,
    image_name: String,
    cleaned_ingredients: String,
}

impl RawRecipe {
    fn validate(self) -> Result<RecipeFields, RecordError> {
        let missing: Vec<&'static str> = [
            ("Id", self.id.is_none()),
            ("Title", self.title.is_none()),
            ("Ingredients", self.ingredients.is_none()),
            ("Instructions", self.instructions.is_none()),
            ("Image_Name", self.image_name.is_none()),
            ("Cleaned_Ingredients", self.cleaned_ingredients.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();
        if !missing.is_empty() {
            return Err(RecordError::MissingFields(missing));
        }

        let id = self
            .id
            .as_ref()
            .and_then(Value::as_i64)
            .ok_or(RecordError::WrongType { field: "Id", expected: "an integer" })?;
        let title = match self.title {
            Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s,
            _ => return Err(RecordError::WrongType { field: "Title", expected: "a string" }),
        };
        Ok(RecipeFields {
            id,
            title,
            ingredients: string_field("Ingredients", self.ingredients)?,
            instructions: string_field("Instructions", self.instructions)?,
            image_name: string_field("Image_Name", self.image_name)?,
            cleaned_ingredients: string_field("Cleaned_Ingredients", self.cleaned_ingredients)?,
        })
    }
}

fn string_field(field: &'static str, value: Option<Value>) -> Result<String, RecordError> {
    match value {
        Some(Value::String(s)) => Ok(s),
        _ => Err(RecordError::WrongType { field, expected: "a string" }),
    }
}

impl RecipeFields {
    fn into_recipe(self, corpus: &Corpus, report: &mut LoadReport) -> Recipe {
        let mut parse = |raw: &str| {
            let (items, form) = parse_array_field_with_form(raw);
            if form == FieldForm::Fallback {
                report.fallbacks += 1;
            }
            items
        };
        let ingredients = parse(&self.ingredients);
        let cleaned_ingredients = parse(&self.cleaned_ingredients);
        let normalized_ingredients = corpus.normalize_all(&cleaned_ingredients);
        Recipe {
            id: self.id,
            title: clean_title(&self.title),
            ingredients,
            cleaned_ingredients,
            normalized_ingredients,
            instructions: clean_text(&self.instructions),
            image_name: self.image_name.trim().to_string(),
        }
    }
}

fn clean_text(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\/", "/").trim().to_string()
}

fn clean_title(title: &str) -> String {
    let title = clean_text(title);
    if title.is_empty() { UNTITLED.to_string() } else { title }
}

use crate::error::VocabularyError;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex =
        Regex::new(r"[\p{L}\p{N}]+(?:['’\-./⁄][\p{L}\p{N}]+)*").expect("valid regex");
    static ref PARENTHETICAL: Regex = Regex::new(r"\([^()]*\)").expect("valid regex");
    static ref NUMBER: Regex = Regex::new(r"^\p{N}+(?:[./⁄\-]\p{N}+)*$").expect("valid regex");
    // `200g`, `4-lb`, `1.5cups`
    static ref FUSED_QUANTITY: Regex =
        Regex::new(r"^\p{N}+(?:[./⁄\-]\p{N}+)*-?(\p{L}+)$").expect("valid regex");
    static ref DEFAULT_NORMALIZER: Arc<Normalizer> = Arc::new(Normalizer::default());
}

const QUANTITY_WORDS: &[&str] = &[
    "a", "an", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "half", "dozen", "couple", "few", "several",
];

const UNITS: &[&str] = &[
    "cup", "tbsp", "tbs", "tbl", "tablespoon", "tsp", "teaspoon", "oz", "ounce", "fl", "g", "gr",
    "gram", "lb", "pound", "ml", "milliliter", "millilitre", "cl", "dl", "l", "liter", "litre",
    "kg", "kilogram", "quart", "qt", "pint", "pt", "gallon", "pinch", "dash", "can", "tin",
    "packet", "package", "pkg", "slice", "piece", "stick", "bunch", "sprig", "handful", "head",
    "jar", "bottle", "box", "bag", "envelope", "container", "inch", "cm", "large", "medium",
    "small", "whole", "extra-large", "jumbo", "heaping", "heaped", "level",
];

const DESCRIPTORS: &[&str] = &[
    "chopped", "diced", "sliced", "peeled", "crushed", "minced", "grated", "zested", "melted",
    "toasted", "cooled", "rinsed", "drained", "packed", "firmly", "loosely", "lightly", "scant",
    "generous", "halved", "quartered", "cored", "finely", "coarsely", "thinly", "thickly",
    "roughly", "freshly", "fresh", "softened", "beaten", "whisked", "shredded", "trimmed",
    "divided", "seeded", "deseeded", "pitted", "stemmed", "cubed", "julienned", "mashed", "sifted",
    "squeezed", "thawed", "warmed", "chilled", "separated", "torn", "smashed", "optional",
];

const FILLERS: &[&str] = &[
    "to taste", "for garnish", "for garnishing", "for dusting", "including juice", "for serving",
    "plus more", "as needed", "if needed", "at room temperature", "room temperature", "or more",
    "for greasing", "for the pan", "for frying", "for brushing", "for drizzling",
];

const CONNECTORS: &[&str] = &["and", "or", "of", "plus", "with", "for", "into", "in"];

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Word lists driving [`Normalizer`].
///
/// `Default` is the standard vocabulary. When deserialized, absent lists are empty, which is
/// what [`VocabularyOverrides`] wants for its `add`/`remove` sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Number words treated like numeric quantities.
    #[serde(default)]
    pub quantity_words: Vec<String>,
    /// Removed only when they directly follow a quantity.
    #[serde(default)]
    pub units: Vec<String>,
    /// Removed wherever they appear.
    #[serde(default)]
    pub descriptors: Vec<String>,
    /// Multi-word phrases removed wherever they appear.
    #[serde(default)]
    pub fillers: Vec<String>,
    /// Trimmed when left dangling at either end.
    #[serde(default)]
    pub connectors: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            quantity_words: owned(QUANTITY_WORDS),
            units: owned(UNITS),
            descriptors: owned(DESCRIPTORS),
            fillers: owned(FILLERS),
            connectors: owned(CONNECTORS),
        }
    }
}

impl Vocabulary {
    pub fn empty() -> Self {
        Self {
            quantity_words: Vec::new(),
            units: Vec::new(),
            descriptors: Vec::new(),
            fillers: Vec::new(),
            connectors: Vec::new(),
        }
    }

    pub fn extend_units<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.units.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn extend_descriptors<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptors.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn extend_fillers<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fillers.extend(phrases.into_iter().map(Into::into));
        self
    }

    pub fn without_units(mut self, words: &[&str]) -> Self {
        self.units.retain(|w| !words.contains(&w.as_str()));
        self
    }

    pub fn without_descriptors(mut self, words: &[&str]) -> Self {
        self.descriptors.retain(|w| !words.contains(&w.as_str()));
        self
    }

    pub fn without_fillers(mut self, phrases: &[&str]) -> Self {
        self.fillers.retain(|w| !phrases.contains(&w.as_str()));
        self
    }

    /// Removals are applied before additions.
    pub fn apply(mut self, overrides: &VocabularyOverrides) -> Self {
        if let Some(remove) = &overrides.remove {
            retain_absent(&mut self.quantity_words, &remove.quantity_words);
            retain_absent(&mut self.units, &remove.units);
            retain_absent(&mut self.descriptors, &remove.descriptors);
            retain_absent(&mut self.fillers, &remove.fillers);
            retain_absent(&mut self.connectors, &remove.connectors);
        }
        if let Some(add) = &overrides.add {
            self.quantity_words.extend(add.quantity_words.iter().cloned());
            self.units.extend(add.units.iter().cloned());
            self.descriptors.extend(add.descriptors.iter().cloned());
            self.fillers.extend(add.fillers.iter().cloned());
            self.connectors.extend(add.connectors.iter().cloned());
        }
        self
    }

    /// Standard vocabulary with the overrides file at `path` applied.
    pub fn from_overrides_file<P: AsRef<Path>>(path: P) -> Result<Self, VocabularyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: VocabularyOverrides =
            serde_json::from_str(&text).map_err(|source| VocabularyError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::default().apply(&overrides))
    }
}

fn retain_absent(list: &mut Vec<String>, removed: &[String]) {
    list.retain(|w| !removed.iter().any(|r| r.eq_ignore_ascii_case(w)));
}

/// JSON shape of a vocabulary overrides file: `{"add": {...}, "remove": {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyOverrides {
    #[serde(default)]
    pub add: Option<Vocabulary>,
    #[serde(default)]
    pub remove: Option<Vocabulary>,
}

/// Maps a raw ingredient phrase to its comparison key.
///
/// The same instance (shared through `Arc`) must serve both index building and query
/// normalization; [`crate::IngredientIndex`] keeps the one it was built with.
#[derive(Debug)]
pub struct Normalizer {
    vocabulary: Vocabulary,
    quantity_words: HashSet<String>,
    units: HashSet<String>,
    descriptors: HashSet<String>,
    fillers: Vec<Vec<String>>,
    connectors: HashSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Vocabulary::default())
    }
}

impl Normalizer {
    pub fn new(vocabulary: Vocabulary) -> Self {
        let single = |words: &[String]| -> HashSet<String> {
            words.iter().map(|w| w.trim().to_lowercase()).filter(|w| !w.is_empty()).collect()
        };
        let fillers = vocabulary
            .fillers
            .iter()
            .map(|phrase| words(&phrase.to_lowercase()))
            .filter(|tokens| !tokens.is_empty())
            .collect();
        Self {
            quantity_words: single(&vocabulary.quantity_words),
            units: single(&vocabulary.units),
            descriptors: single(&vocabulary.descriptors),
            connectors: single(&vocabulary.connectors),
            fillers,
            vocabulary,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Canonical key for `phrase`. Idempotent; may return an empty string when the phrase is
    /// nothing but quantities and descriptors.
    pub fn normalize(&self, phrase: &str) -> String {
        let folded = phrase.nfkc().collect::<String>().to_lowercase();
        let folded = PARENTHETICAL.replace_all(&folded, " ");
        let tokens = words(&folded);

        let tokens = self.strip_quantities(tokens);
        let tokens: Vec<String> =
            tokens.into_iter().filter(|t| !self.descriptors.contains(t)).collect();
        let tokens = self.strip_fillers(tokens);
        self.trim_edges(tokens).join(" ")
    }

    /// Dangling connectors at either end, and a leading `pinch of` / `can of`.
    fn trim_edges(&self, mut tokens: Vec<String>) -> Vec<String> {
        loop {
            if tokens.first().is_some_and(|t| self.connectors.contains(t)) {
                tokens.remove(0);
            } else if tokens.last().is_some_and(|t| self.connectors.contains(t)) {
                tokens.pop();
            } else if tokens.len() > 2 && self.is_unit(&tokens[0]) && tokens[1] == "of" {
                tokens.drain(..2);
            } else {
                return tokens;
            }
        }
    }

    fn strip_quantities(&self, tokens: Vec<String>) -> Vec<String> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut i = 0;
        while i < tokens.len() {
            if !self.is_quantity(&tokens[i]) {
                out.push(tokens[i].clone());
                i += 1;
                continue;
            }
            i += 1;
            // unit run: `2 large`, `1 1/2 cups`, `2 to 3 tbsp`
            loop {
                match tokens.get(i) {
                    Some(t) if self.is_unit(t) || self.is_quantity(t) => i += 1,
                    Some(t) if (t == "to" || t == "or")
                        && tokens.get(i + 1).is_some_and(|n| self.is_quantity(n)) =>
                    {
                        i += 2
                    }
                    _ => break,
                }
            }
            if tokens.get(i).is_some_and(|t| t == "of") {
                i += 1;
            }
        }
        out
    }

    fn strip_fillers(&self, mut tokens: Vec<String>) -> Vec<String> {
        loop {
            let hit = self.fillers.iter().find_map(|filler| {
                tokens
                    .windows(filler.len())
                    .position(|w| w == filler.as_slice())
                    .map(|start| (start, filler.len()))
            });
            match hit {
                Some((start, len)) => {
                    tokens.drain(start..start + len);
                }
                None => return tokens,
            }
        }
    }

    fn is_quantity(&self, token: &str) -> bool {
        if NUMBER.is_match(token) || self.quantity_words.contains(token) {
            return true;
        }
        FUSED_QUANTITY
            .captures(token)
            .and_then(|caps| caps.get(1))
            .is_some_and(|unit| self.is_unit(unit.as_str()))
    }

    fn is_unit(&self, token: &str) -> bool {
        if self.units.contains(token) {
            return true;
        }
        let singular = |suffix: &str| {
            token
                .strip_suffix(suffix)
                .is_some_and(|stem| !stem.is_empty() && self.units.contains(stem))
        };
        singular("s") || singular("es")
    }
}

fn words(text: &str) -> Vec<String> {
    WORD.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// The process-wide normalizer over the standard vocabulary.
pub fn default_normalizer() -> Arc<Normalizer> {
    Arc::clone(&DEFAULT_NORMALIZER)
}

/// Normalize with the standard vocabulary.
pub fn normalize(phrase: &str) -> String {
    DEFAULT_NORMALIZER.normalize(phrase)
}

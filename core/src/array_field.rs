use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Separator between quoted items of a Python-repr list: `', '`, `", '`, `','` ...
    static ref ITEM_DELIMITER: Regex = Regex::new(r#"['"]\s*,\s*['"]"#).expect("valid regex");
}

/// Which branch of the parser produced the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldForm {
    Empty,
    Bracketed,
    Json,
    /// Not recognized as a list; the whole value became one item.
    Fallback,
}

/// Parse a list-valued dataset field into clean items.
///
/// Dataset fields look like `"['2 cups flour', '1 egg']"`: a Python repr, not JSON.
/// Items that contain the quote-comma-quote delimiter themselves are split in two;
/// that loss is accepted rather than guessed around.
pub fn parse_array_field(raw: &str) -> Vec<String> {
    parse_array_field_with_form(raw).0
}

/// Same as [`parse_array_field`], also reporting which form was recognized.
pub fn parse_array_field_with_form(raw: &str) -> (Vec<String>, FieldForm) {
    parse_inner(raw, true)
}

fn parse_inner(raw: &str, allow_unwrap: bool) -> (Vec<String>, FieldForm) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (Vec::new(), FieldForm::Empty);
    }

    if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        let inner = &trimmed[1..trimmed.len() - 1];
        let items = ITEM_DELIMITER
            .split(inner)
            .map(clean_item)
            .filter(|s| !s.is_empty())
            .collect();
        return (items, FieldForm::Bracketed);
    }

    // A bracketed JSON array was already split above; what can still decode here is a
    // double-encoded field, a JSON string whose content is the list.
    if allow_unwrap {
        if let Ok(inner) = serde_json::from_str::<String>(trimmed) {
            let (items, form) = parse_inner(&inner, false);
            if form != FieldForm::Fallback {
                return (items, FieldForm::Json);
            }
        }
    }

    tracing::debug!(value = trimmed, "array field not recognized, using single-item fallback");
    let item = clean_item(trimmed);
    if item.is_empty() {
        (Vec::new(), FieldForm::Fallback)
    } else {
        (vec![item], FieldForm::Fallback)
    }
}

fn clean_item(item: &str) -> String {
    item.replace("\\/", "/")
        .replace("\\'", "'")
        .replace("\\u00b0", "°")
        .replace(['º', '˚'], "°")
        .trim_matches(|c: char| c == '\'' || c == '"' || c.is_whitespace())
        .to_string()
}

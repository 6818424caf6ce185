//! List <-> single text column codec.
//!
//! `symptoms`, `riskAreas` and `preIllnesses` travel as JSON arrays but are
//! stored in one nullable text column. An empty list is stored as `NULL`; any
//! other list is its items joined by [`DELIMITER`]. This keeps `[""]` (stored
//! as `""`) distinct from `[]` (stored as `NULL`), so every list whose items
//! are free of the delimiter survives `decode(encode(list))` unchanged.

use crate::validation::ValidationError;

/// Separator between list items in the stored column.
pub const DELIMITER: char = ';';

/// Encode a list for storage.
pub fn encode(items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(items.iter().map(|s| s.len() + 1).sum());
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        out.push_str(item);
    }
    Some(out)
}

/// Decode a stored column back into a list.
pub fn decode(column: Option<&str>) -> Vec<String> {
    match column {
        None => Vec::new(),
        Some(raw) => raw.split(DELIMITER).map(str::to_owned).collect(),
    }
}

/// Ensure a list can be stored losslessly.
pub fn check(field: &'static str, items: &[String]) -> Result<(), ValidationError> {
    if items.iter().any(|item| item.contains(DELIMITER)) {
        return Err(ValidationError::ContainsDelimiter {
            field,
            delimiter: DELIMITER,
        });
    }
    Ok(())
}

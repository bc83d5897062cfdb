// ----------------------------------------------------------------------------
// Turns a saved timetable table (CSV or TSV) into the same row objects the
// in-page extractor produces, so it can go through the normal row mapping.
//
// First record is the header. Blank header cells become `Column_N`, which is
// what makes the survey export dialect detectable.
// ----------------------------------------------------------------------------

use crate::error::*;
use csv::ReaderBuilder;
use serde_json::{Map, Number, Value};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Delimiter {
    Csv,
    Tsv,
}

impl Delimiter {
    pub fn byte(&self) -> u8 {
        match self {
            Delimiter::Csv => b',',
            Delimiter::Tsv => b'\t',
        }
    }

    pub fn new_from_extension(ext: &str) -> Option<Delimiter> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Delimiter::Csv),
            "tsv" | "tab" => Some(Delimiter::Tsv),
            _ => None,
        }
    }
}

/// Positional fallback name of the `index`th (0-based) column.
pub fn fallback_column_name(index: usize) -> String {
    format!("Column_{}", index + 1)
}

/// Numeric-looking cells become numbers, everything else stays text.
pub fn cell_value(cell: &str) -> Value {
    let cell = cell.trim();

    if cell.is_empty() {
        return Value::String(String::new());
    }

    if let Ok(i) = cell.parse::<i64>() {
        return Value::Number(Number::from(i));
    }

    match cell.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) if cell.chars().any(|c| c.is_ascii_digit()) => Value::Number(n),
        _ => Value::String(cell.to_string()),
    }
}

pub fn rows_from_table(text: &str, delimiter: Delimiter) -> TkbResult<Vec<Value>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter.byte())
        .from_reader(text.as_bytes());

    let mut records = reader.records();

    let headers: Vec<String> = match records.next() {
        Some(header) => header?
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let cell = cell.trim();
                if cell.is_empty() {
                    fallback_column_name(i)
                } else {
                    cell.to_string()
                }
            })
            .collect(),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();

    for record in records {
        let record = record?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut row = Map::new();

        for (i, cell) in record.iter().enumerate() {
            let key = headers
                .get(i)
                .cloned()
                .unwrap_or_else(|| fallback_column_name(i));
            row.insert(key, cell_value(cell));
        }

        rows.push(Value::Object(row));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cells_become_numbers_when_they_look_like_numbers() {
        assert_eq!(cell_value(" 12 "), json!(12));
        assert_eq!(cell_value("1.5"), json!(1.5));
        assert_eq!(cell_value("inf"), json!("inf"));
        assert_eq!(cell_value("NaN"), json!("NaN"));
        assert_eq!(cell_value("1-15"), json!("1-15"));
        assert_eq!(cell_value(""), json!(""));
    }
}

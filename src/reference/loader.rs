//! Parsers for the reference tables.
//!
//! JSON tables are read through `serde_json::Value` so that field aliases,
//! keyed-object layouts and tolerant numbers can be handled row by row.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::parse::{count_from_json, parse_weight, strip_bom, text_from_json};
use super::records::{
    CantonRecord, CompanyRecord, Gender, Language, NameEntry, NameFrequencyTable, OccupationRecord,
};
use crate::error::{Error, Result};

const CANTON_CODE_KEYS: &[&str] = &["code", "id", "canton_code"];
const CANTON_LANGUAGE_KEYS: &[&str] = &["primary_language", "language"];
const CANTON_CITY_KEYS: &[&str] = &["major_cities", "cities"];
const COMPANY_CANTON_KEYS: &[&str] = &["canton", "canton_code"];

const NAME_COLUMNS: &[&str] = &[
    "name",
    "vorname",
    "first_name",
    "surname",
    "last_name",
    "nachname",
];
const WEIGHT_COLUMNS: &[&str] = &["frequency", "freq", "anzahl", "count", "weight"];
const GENDER_COLUMNS: &[&str] = &["gender", "geschlecht", "sex"];

/// Industry assigned to companies that do not declare one.
const DEFAULT_INDUSTRY: &str = "general";

type RowOutcome<T> = std::result::Result<T, String>;

/// Tracks malformed rows for one table.
struct RowFilter<'a> {
    source: &'a str,
    strict: bool,
    skipped: usize,
}

impl<'a> RowFilter<'a> {
    fn new(source: &'a str, strict: bool) -> Self {
        Self {
            source,
            strict,
            skipped: 0,
        }
    }

    /// Strict mode fails the table; lenient mode logs and moves on.
    fn reject(&mut self, row: usize, reason: &str) -> Result<()> {
        if self.strict {
            return Err(Error::data_format(
                self.source,
                format!("row {}: {}", row, reason),
            ));
        }
        warn!(source = self.source, row, reason, "Skipping malformed reference row");
        self.skipped += 1;
        Ok(())
    }

    fn finish<T>(self, rows: Vec<T>) -> Result<Vec<T>> {
        if rows.is_empty() && self.skipped > 0 {
            return Err(Error::data_format(
                self.source,
                format!("all {} rows are malformed", self.skipped),
            ));
        }
        debug!(
            source = self.source,
            loaded = rows.len(),
            skipped = self.skipped,
            "Reference table parsed"
        );
        Ok(rows)
    }
}

/// Parse `cantons.json`.
pub fn parse_cantons(text: &str, strict: bool) -> Result<Vec<CantonRecord>> {
    let source = "cantons";
    let mut filter = RowFilter::new(source, strict);
    let mut seen = HashSet::new();
    let mut cantons = Vec::new();

    for (index, (key, row)) in json_rows(source, text)?.into_iter().enumerate() {
        match canton_from_row(key.as_deref(), &row) {
            Ok(canton) if !seen.insert(canton.code.clone()) => {
                filter.reject(index + 1, &format!("duplicate canton code '{}'", canton.code))?;
            }
            Ok(canton) => cantons.push(canton),
            Err(reason) => filter.reject(index + 1, &reason)?,
        }
    }

    filter.finish(cantons)
}

/// Parse `occupations.json`.
pub fn parse_occupations(text: &str, strict: bool) -> Result<Vec<OccupationRecord>> {
    let source = "occupations";
    let mut filter = RowFilter::new(source, strict);
    let mut occupations = Vec::new();

    for (index, (key, row)) in json_rows(source, text)?.into_iter().enumerate() {
        match occupation_from_row(key.as_deref(), &row) {
            Ok(occupation) => occupations.push(occupation),
            Err(reason) => filter.reject(index + 1, &reason)?,
        }
    }

    filter.finish(occupations)
}

/// Parse `companies.json`.
pub fn parse_companies(text: &str, strict: bool) -> Result<Vec<CompanyRecord>> {
    let source = "companies";
    let mut filter = RowFilter::new(source, strict);
    let mut companies = Vec::new();

    for (index, (key, row)) in json_rows(source, text)?.into_iter().enumerate() {
        match company_from_row(key.as_deref(), &row) {
            Ok(company) => companies.push(company),
            Err(reason) => filter.reject(index + 1, &reason)?,
        }
    }

    filter.finish(companies)
}

/// Parse a headered name CSV (`names_<lang>.csv` or `surnames.csv`).
pub fn parse_name_table(source: &str, text: &str, strict: bool) -> Result<NameFrequencyTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(strip_bom(text).as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| Error::data_format(source, e.to_string()))?
        .clone();
    let name_col = find_column(&headers, NAME_COLUMNS).unwrap_or(0);
    let weight_col = find_column(&headers, WEIGHT_COLUMNS);
    let gender_col = find_column(&headers, GENDER_COLUMNS);

    let mut filter = RowFilter::new(source, strict);
    let mut entries = Vec::new();

    for (index, record) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                filter.reject(line, &e.to_string())?;
                continue;
            }
        };

        let Some(name) = record.get(name_col).filter(|n| !n.is_empty()) else {
            filter.reject(line, "missing name")?;
            continue;
        };

        let weight = weight_col
            .and_then(|c| record.get(c))
            .map(parse_weight)
            .unwrap_or(1.0);
        let gender = gender_col
            .and_then(|c| record.get(c))
            .and_then(|g| g.parse::<Gender>().ok());

        entries.push(NameEntry {
            name: name.to_string(),
            weight,
            gender,
        });
    }

    filter.finish(entries).map(NameFrequencyTable::new)
}

// ─────────────────────────────────────────────────────────────────
// Row conversion
// ─────────────────────────────────────────────────────────────────

fn canton_from_row(key: Option<&str>, row: &Value) -> RowOutcome<CantonRecord> {
    let obj = row.as_object().ok_or("row is not an object")?;

    let code = field(obj, CANTON_CODE_KEYS)
        .and_then(text_from_json)
        .or_else(|| key.map(str::to_string))
        .ok_or("missing canton code")?
        .to_uppercase();

    let name = field(obj, &["name"])
        .and_then(text_from_json)
        .ok_or_else(|| format!("{}: missing name", code))?;

    let primary_language = field(obj, CANTON_LANGUAGE_KEYS)
        .and_then(text_from_json)
        .ok_or_else(|| format!("{}: missing primary_language", code))?
        .parse::<Language>()
        .map_err(|e| format!("{}: {}", code, e))?;

    let population = field(obj, &["population"])
        .and_then(count_from_json)
        .unwrap_or(0);
    let workforce = field(obj, &["workforce"])
        .and_then(count_from_json)
        .filter(|workforce| *workforce > 0);

    let major_cities = match field(obj, CANTON_CITY_KEYS) {
        Some(Value::Array(items)) => items.iter().filter_map(text_from_json).collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(CantonRecord {
        code,
        name,
        population,
        workforce,
        primary_language,
        major_cities,
    })
}

fn occupation_from_row(key: Option<&str>, row: &Value) -> RowOutcome<OccupationRecord> {
    let obj = row.as_object().ok_or("row is not an object")?;

    let code = field(obj, &["code", "id"])
        .and_then(text_from_json)
        .or_else(|| key.map(str::to_string));

    let mut occupation = OccupationRecord {
        code,
        titles: Default::default(),
        industry: String::new(),
    };

    match field(obj, &["titles", "title"]) {
        Some(Value::Object(translations)) => {
            for (lang, title) in translations {
                if let (Ok(lang), Some(title)) = (lang.parse::<Language>(), text_from_json(title)) {
                    occupation.titles.insert(lang, title);
                }
            }
        }
        Some(plain) => {
            if let Some(title) = text_from_json(plain) {
                occupation.titles.insert(Language::De, title);
            }
        }
        None => {}
    }
    for lang in Language::ALL {
        let column = format!("title_{}", lang.code());
        if let Some(title) = obj.get(&column).and_then(text_from_json) {
            occupation.titles.insert(lang, title);
        }
    }

    if occupation.titles.is_empty() {
        return Err(format!(
            "{}: missing title",
            occupation.code.as_deref().unwrap_or("occupation")
        ));
    }

    occupation.industry = field(obj, &["industry", "sector"])
        .and_then(text_from_json)
        .ok_or_else(|| format!("{}: missing industry", occupation.title_for(Language::De)))?;

    Ok(occupation)
}

fn company_from_row(key: Option<&str>, row: &Value) -> RowOutcome<CompanyRecord> {
    let obj = row.as_object().ok_or("row is not an object")?;

    let name = field(obj, &["name", "company"])
        .and_then(text_from_json)
        .or_else(|| key.map(str::to_string))
        .ok_or("missing company name")?;

    let canton = field(obj, COMPANY_CANTON_KEYS)
        .and_then(text_from_json)
        .ok_or_else(|| format!("{}: missing canton", name))?
        .to_uppercase();

    let industry = field(obj, &["industry", "sector"])
        .and_then(text_from_json)
        .unwrap_or_else(|| DEFAULT_INDUSTRY.to_string());

    let size_band = field(obj, &["size_band", "size"]).and_then(text_from_json);

    Ok(CompanyRecord {
        name,
        canton,
        industry,
        size_band,
    })
}

// ─────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────

/// Split a JSON table into rows. Accepts a list, an object keyed by
/// code, or a single-key wrapper around a list (`{"cantons": [...]}`).
fn json_rows(source: &str, text: &str) -> Result<Vec<(Option<String>, Value)>> {
    let value: Value = serde_json::from_str(strip_bom(text))
        .map_err(|e| Error::data_format(source, e.to_string()))?;

    match value {
        Value::Array(items) => Ok(items.into_iter().map(|row| (None, row)).collect()),
        Value::Object(mut map) if map.len() == 1 && map.values().all(Value::is_array) => {
            let items = match map.values_mut().next().map(Value::take) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            Ok(items.into_iter().map(|row| (None, row)).collect())
        }
        Value::Object(map) => Ok(map.into_iter().map(|(k, row)| (Some(k), row)).collect()),
        _ => Err(Error::data_format(
            source,
            "expected a list of objects or an object keyed by code",
        )),
    }
}

/// First present key among `aliases`.
fn field<'v>(obj: &'v Map<String, Value>, aliases: &[&str]) -> Option<&'v Value> {
    aliases
        .iter()
        .find_map(|key| obj.get(*key))
        .filter(|v| !v.is_null())
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(candidate))
    })
}

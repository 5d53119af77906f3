//! Reference record types.
//!
//! One concrete type per entity; the provider is the only producer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────
// Language
// ─────────────────────────────────────────────────────────────────

/// Primary language of a canton or persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    Fr,
    It,
    En,
}

impl Language {
    /// All supported languages.
    pub const ALL: [Language; 4] = [Language::De, Language::Fr, Language::It, Language::En];

    /// The three official languages used for the diaspora split.
    pub const OFFICIAL: [Language; 3] = [Language::De, Language::Fr, Language::It];

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::De => "de",
            Language::Fr => "fr",
            Language::It => "it",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "de" | "german" | "deutsch" => Ok(Language::De),
            "fr" | "french" | "français" | "francais" => Ok(Language::Fr),
            "it" | "italian" | "italiano" => Ok(Language::It),
            "en" | "english" => Ok(Language::En),
            other => Err(format!("Unknown language '{}'. Valid: de, fr, it, en", other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Gender
// ─────────────────────────────────────────────────────────────────

/// Gender drawn for a persona, also used to tag given-name rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" | "mann" | "männlich" | "h" | "homme" | "maschio" => Ok(Gender::Male),
            "f" | "w" | "female" | "frau" | "weiblich" | "femme" | "femmina" => Ok(Gender::Female),
            other => Err(format!("Unknown gender '{}'", other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────────────

/// A Swiss canton with its sampling weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CantonRecord {
    pub code: String,
    pub name: String,
    pub population: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workforce: Option<u64>,
    pub primary_language: Language,
    #[serde(default)]
    pub major_cities: Vec<String>,
}

impl CantonRecord {
    pub fn new(code: &str, name: &str, population: u64, primary_language: Language) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            population,
            workforce: None,
            primary_language,
            major_cities: Vec::new(),
        }
    }

    pub fn with_workforce(mut self, workforce: u64) -> Self {
        self.workforce = Some(workforce);
        self
    }

    pub fn with_cities(mut self, cities: &[&str]) -> Self {
        self.major_cities = cities.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Weight used for canton selection: a positive workforce, else population.
    pub fn sampling_weight(&self) -> u64 {
        self.workforce
            .filter(|workforce| *workforce > 0)
            .unwrap_or(self.population)
    }
}

/// An occupation with per-language titles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupationRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub titles: BTreeMap<Language, String>,
    pub industry: String,
}

impl OccupationRecord {
    pub fn new(title: &str, industry: &str) -> Self {
        let mut titles = BTreeMap::new();
        titles.insert(Language::De, title.to_string());
        Self {
            code: None,
            titles,
            industry: industry.to_string(),
        }
    }

    pub fn with_title(mut self, language: Language, title: &str) -> Self {
        self.titles.insert(language, title.to_string());
        self
    }

    /// Title in `language`, falling back to German, then English, then any translation.
    pub fn title_for(&self, language: Language) -> &str {
        [language, Language::De, Language::En]
            .iter()
            .find_map(|l| self.titles.get(l))
            .or_else(|| self.titles.values().next())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// An employer located in a canton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    pub canton: String,
    pub industry: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_band: Option<String>,
}

impl CompanyRecord {
    pub fn new(name: &str, canton: &str, industry: &str) -> Self {
        Self {
            name: name.to_string(),
            canton: canton.to_string(),
            industry: industry.to_string(),
            size_band: None,
        }
    }
}

/// One row of a name frequency table.
#[derive(Debug, Clone, PartialEq)]
pub struct NameEntry {
    pub name: String,
    pub weight: f64,
    pub gender: Option<Gender>,
}

/// Weighted names, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameFrequencyTable {
    entries: Vec<NameEntry>,
}

impl NameFrequencyTable {
    pub fn new(entries: Vec<NameEntry>) -> Self {
        Self { entries }
    }

    /// Build an ungendered table from `(name, weight)` pairs.
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(name, weight)| NameEntry {
                    name: name.to_string(),
                    weight: *weight,
                    gender: None,
                })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[NameEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows tagged with `gender`; untagged tables yield every row.
    pub fn for_gender(&self, gender: Gender) -> Vec<&NameEntry> {
        let tagged: Vec<&NameEntry> = self
            .entries
            .iter()
            .filter(|e| e.gender == Some(gender))
            .collect();
        if tagged.is_empty() {
            self.entries.iter().collect()
        } else {
            tagged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("DE".parse::<Language>().unwrap(), Language::De);
        assert_eq!("Français".parse::<Language>().unwrap(), Language::Fr);
        assert_eq!(" italiano ".parse::<Language>().unwrap(), Language::It);
        assert!("rm".parse::<Language>().is_err());
    }

    #[test]
    fn test_gender_parse() {
        assert_eq!("w".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("M".parse::<Gender>().unwrap(), Gender::Male);
        assert!("x".parse::<Gender>().is_err());
    }

    #[test]
    fn test_sampling_weight_prefers_workforce() {
        let zh = CantonRecord::new("ZH", "Zürich", 1_000_000, Language::De);
        assert_eq!(zh.sampling_weight(), 1_000_000);
        assert_eq!(zh.clone().with_workforce(500_000).sampling_weight(), 500_000);
    }

    #[test]
    fn test_zero_workforce_falls_back_to_population() {
        let zh = CantonRecord::new("ZH", "Zürich", 1_000_000, Language::De).with_workforce(0);
        assert_eq!(zh.sampling_weight(), 1_000_000);
    }

    #[test]
    fn test_title_fallback_chain() {
        let occ = OccupationRecord::new("Informatiker/in", "technology")
            .with_title(Language::Fr, "Informaticien/ne");
        assert_eq!(occ.title_for(Language::Fr), "Informaticien/ne");
        assert_eq!(occ.title_for(Language::It), "Informatiker/in");

        let mut only_en = OccupationRecord::new("x", "technology");
        only_en.titles.clear();
        only_en.titles.insert(Language::En, "Developer".into());
        assert_eq!(only_en.title_for(Language::It), "Developer");
    }

    #[test]
    fn test_for_gender_falls_back_to_all_rows() {
        let table = NameFrequencyTable::from_pairs(&[("Anna", 3.0), ("Luca", 2.0)]);
        assert_eq!(table.for_gender(Gender::Female).len(), 2);

        let tagged = NameFrequencyTable::new(vec![
            NameEntry { name: "Anna".into(), weight: 3.0, gender: Some(Gender::Female) },
            NameEntry { name: "Luca".into(), weight: 2.0, gender: Some(Gender::Male) },
        ]);
        let female = tagged.for_gender(Gender::Female);
        assert_eq!(female.len(), 1);
        assert_eq!(female[0].name, "Anna");
    }
}

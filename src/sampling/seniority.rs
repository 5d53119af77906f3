//! Career seniority derived from years of experience.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::rng::SampleRng;
use crate::reference::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
    Lead,
    Principal,
}

impl Seniority {
    /// `<2` junior, `2..=5` mid, `6..=11` senior, `>=12` one of senior/lead/principal.
    ///
    /// Only the last band draws from the RNG.
    pub fn draw(rng: &mut SampleRng, years_experience: u32) -> Self {
        match years_experience {
            0..=1 => Seniority::Junior,
            2..=5 => Seniority::Mid,
            6..=11 => Seniority::Senior,
            _ => {
                const VETERAN: [Seniority; 3] =
                    [Seniority::Senior, Seniority::Lead, Seniority::Principal];
                VETERAN[rng.index(VETERAN.len())]
            }
        }
    }

    /// Title prefix in `language`; mid-level titles carry none.
    pub fn prefix(&self, language: Language) -> Option<&'static str> {
        match (self, language) {
            (Seniority::Mid, _) => None,
            (Seniority::Junior, _) => Some("Junior"),
            (Seniority::Senior, _) => Some("Senior"),
            (Seniority::Lead, Language::De) => Some("Leitende/r"),
            (Seniority::Lead, Language::Fr) => Some("Responsable"),
            (Seniority::Lead, Language::It) => Some("Responsabile"),
            (Seniority::Lead, Language::En) => Some("Lead"),
            (Seniority::Principal, Language::De) => Some("Haupt-"),
            (Seniority::Principal, Language::Fr) => Some("Principal/e"),
            (Seniority::Principal, Language::It) => Some("Principale"),
            (Seniority::Principal, Language::En) => Some("Principal"),
        }
    }

    /// Localized job title with the seniority prefix.
    pub fn apply(&self, title: &str, language: Language) -> String {
        match self.prefix(language) {
            None => title.to_string(),
            Some(prefix) if prefix.ends_with('-') => format!("{}{}", prefix, title),
            Some(prefix) => format!("{} {}", prefix, title),
        }
    }
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Seniority::Junior => "junior",
            Seniority::Mid => "mid",
            Seniority::Senior => "senior",
            Seniority::Lead => "lead",
            Seniority::Principal => "principal",
        };
        f.write_str(s)
    }
}

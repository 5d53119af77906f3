//! Reference dataset compiled into the binary.

use super::provider::SourceName;
use super::records::Language;

/// Bundled text for a logical source, if one ships with the binary.
pub fn bundled_text(source: SourceName) -> Option<&'static str> {
    match source {
        SourceName::Cantons => Some(include_str!("../../data/cantons.json")),
        SourceName::Occupations => Some(include_str!("../../data/occupations.json")),
        SourceName::Companies => Some(include_str!("../../data/companies.json")),
        SourceName::GivenNames(Language::De) => Some(include_str!("../../data/names_de.csv")),
        SourceName::GivenNames(Language::Fr) => Some(include_str!("../../data/names_fr.csv")),
        SourceName::GivenNames(Language::It) => Some(include_str!("../../data/names_it.csv")),
        SourceName::GivenNames(Language::En) => Some(include_str!("../../data/names_en.csv")),
        SourceName::Surnames => Some(include_str!("../../data/surnames.csv")),
    }
}

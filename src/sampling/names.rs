//! Built-in name pools and the canton language table.

use crate::reference::{Gender, Language};

/// Share of personas speaking their canton's primary language.
pub const PRIMARY_LANGUAGE_SHARE: f64 = 0.90;

/// Share split over the other official languages.
pub const OTHER_LANGUAGE_SHARE: f64 = 0.10;

/// Language categories and weights for a canton whose primary language is `primary`.
///
/// The primary comes first, then the other official languages in
/// de, fr, it order sharing the remainder evenly.
pub fn language_table(primary: Language) -> Vec<(Language, f64)> {
    let others: Vec<Language> = Language::OFFICIAL
        .iter()
        .copied()
        .filter(|l| *l != primary)
        .collect();
    let each = OTHER_LANGUAGE_SHARE / others.len() as f64;

    std::iter::once((primary, PRIMARY_LANGUAGE_SHARE))
        .chain(others.into_iter().map(|l| (l, each)))
        .collect()
}

/// Given names used when a language has no table.
pub fn fallback_given_names(language: Language, gender: Gender) -> &'static [&'static str] {
    match (language, gender) {
        (Language::De, Gender::Male) => &["Andreas", "Lukas", "Thomas", "Markus"],
        (Language::De, Gender::Female) => &["Sandra", "Anna", "Monika", "Laura"],
        (Language::Fr, Gender::Male) => &["Pierre", "Jean", "Marc", "Luc"],
        (Language::Fr, Gender::Female) => &["Marie", "Camille", "Sophie", "Claire"],
        (Language::It, Gender::Male) => &["Marco", "Luca", "Giovanni", "Stefano"],
        (Language::It, Gender::Female) => &["Maria", "Elena", "Lucia", "Francesca"],
        (Language::En, Gender::Male) => &["James", "John", "David", "Michael"],
        (Language::En, Gender::Female) => &["Sarah", "Emma", "Emily", "Laura"],
    }
}

/// Surnames used when the surname table is empty.
pub fn fallback_surnames(language: Language) -> &'static [&'static str] {
    match language {
        Language::De => &["Müller", "Meier", "Schmid", "Keller"],
        Language::Fr => &["Martin", "Dubois", "Morel", "Leroy"],
        Language::It => &["Rossi", "Bianchi", "Ferrari", "Galli"],
        Language::En => &["Smith", "Brown", "Taylor", "Wilson"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_table_official_primary() {
        let table = language_table(Language::Fr);
        assert_eq!(table.len(), 3);
        assert_eq!(table[0], (Language::Fr, 0.90));
        assert_eq!(table[1].0, Language::De);
        assert_eq!(table[2].0, Language::It);
        assert!((table[1].1 - 0.05).abs() < 1e-12);
        let total: f64 = table.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_language_table_english_primary() {
        let table = language_table(Language::En);
        assert_eq!(table.len(), 4);
        assert!((table[3].1 - 0.10 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_fallback_pools_not_empty() {
        for lang in Language::ALL {
            assert!(!fallback_surnames(lang).is_empty());
            for gender in [Gender::Male, Gender::Female] {
                assert!(!fallback_given_names(lang, gender).is_empty());
            }
        }
    }
}

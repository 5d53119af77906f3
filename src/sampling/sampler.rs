//! The weighted persona sampler.
//!
//! Draw order is fixed; changing it changes every persona produced for a
//! given seed:
//!
//! 1. canton  2. language  3. gender  4. age  5. experience  6. names
//! 7. city  8. occupation  9. seniority  10. employer  11. phone
//! 12. e-mail  13. identifier

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::contact::{draw_email, draw_phone};
use super::names::{fallback_given_names, fallback_surnames, language_table};
use super::rng::SampleRng;
use super::seniority::Seniority;
use crate::error::{Error, Result};
use crate::persona::{MAX_AGE, MIN_WORKING_AGE};
use crate::reference::{
    CantonRecord, CompanyRecord, Gender, Language, NameEntry, OccupationRecord, ReferenceData,
};

/// Ages at which formal education ends.
const EDUCATION_EXIT_AGES: [u32; 4] = [22, 23, 24, 25];

/// Career break of 0, 1 or 2 years, weighted 90/6/4.
const CAREER_BREAK_WEIGHTS: [f64; 3] = [90.0, 6.0, 4.0];

const FALLBACK_INDUSTRY: &str = "general";

/// Inputs for one persona.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleRequest {
    pub seed: u64,
    pub canton_override: Option<String>,
    pub industry_preference: Option<String>,
    pub language_override: Option<Language>,
}

impl SampleRequest {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn with_canton(mut self, code: impl Into<String>) -> Self {
        self.canton_override = Some(code.into());
        self
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry_preference = Some(industry.into());
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language_override = Some(language);
        self
    }

    /// Same filters, different seed.
    pub fn reseeded(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }
}

/// Structural fields of one persona, before assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampledPersona {
    pub id: Uuid,
    pub seed: u64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub age: u32,
    pub canton: String,
    pub canton_name: String,
    pub city: String,
    pub language: Language,
    pub years_experience: u32,
    pub seniority: Seniority,
    pub industry: String,
    pub occupation: String,
    pub employer: Option<String>,
    pub email: String,
    pub phone: String,
}

/// Inclusive age bounds for the uniform age draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    /// Bounds are clamped to the working-age range and put in order.
    pub fn new(min: u32, max: u32) -> Self {
        let min = min.clamp(MIN_WORKING_AGE, MAX_AGE);
        let max = max.clamp(MIN_WORKING_AGE, MAX_AGE);
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    fn draw(&self, rng: &mut SampleRng) -> u32 {
        let span = u64::from(self.max - self.min) + 1;
        self.min + rng.below(span) as u32
    }
}

impl Default for AgeRange {
    fn default() -> Self {
        Self { min: 18, max: 65 }
    }
}

/// Draws personas from a reference snapshot.
///
/// Pure given `(seed, snapshot)`: each request gets its own RNG, so the
/// sampler can be shared freely across threads.
#[derive(Debug, Clone)]
pub struct PersonaSampler {
    data: ReferenceData,
    ages: AgeRange,
}

impl PersonaSampler {
    pub fn new(data: ReferenceData) -> Self {
        Self {
            data,
            ages: AgeRange::default(),
        }
    }

    pub fn with_age_range(mut self, ages: AgeRange) -> Self {
        self.ages = ages;
        self
    }

    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    pub fn age_range(&self) -> AgeRange {
        self.ages
    }

    /// Draw one persona.
    pub fn sample(&self, request: &SampleRequest) -> Result<SampledPersona> {
        let mut rng = SampleRng::from_seed(request.seed);

        let canton = self.draw_canton(&mut rng, request.canton_override.as_deref())?;
        let language = match request.language_override {
            Some(language) => language,
            None => draw_language(&mut rng, canton.primary_language),
        };
        let gender = if rng.below(2) == 0 {
            Gender::Male
        } else {
            Gender::Female
        };
        let age = self.ages.draw(&mut rng);
        let years_experience = draw_experience(&mut rng, age);
        let first_name = self.draw_given_name(&mut rng, language, gender);
        let last_name = self.draw_surname(&mut rng, language);
        let city = draw_city(&mut rng, canton);
        let occupation =
            self.draw_occupation(&mut rng, request.industry_preference.as_deref());
        let seniority = Seniority::draw(&mut rng, years_experience);
        let title = seniority.apply(occupation.title_for(language), language);
        let employer = self.draw_employer(&mut rng, &canton.code, &occupation.industry);
        let phone = draw_phone(&mut rng);
        let email = draw_email(&mut rng, &first_name, &last_name);
        let id = rng.uuid();

        Ok(SampledPersona {
            id,
            seed: request.seed,
            first_name,
            last_name,
            gender,
            age,
            canton: canton.code.clone(),
            canton_name: canton.name.clone(),
            city,
            language,
            years_experience,
            seniority,
            industry: occupation.industry.clone(),
            occupation: title,
            employer,
            email,
            phone,
        })
    }

    fn draw_canton(&self, rng: &mut SampleRng, code: Option<&str>) -> Result<&CantonRecord> {
        let cantons = &self.data.cantons;
        if cantons.is_empty() {
            return Err(Error::EmptyPool("the canton table has no rows".to_string()));
        }

        if let Some(code) = code {
            return self.data.canton(code).ok_or_else(|| Error::UnknownCanton {
                code: code.to_string(),
            });
        }

        let weights: Vec<f64> = cantons.iter().map(|c| c.sampling_weight() as f64).collect();
        let index = match rng.weighted_index(&weights) {
            Some(index) => index,
            None => {
                debug!("All canton weights are zero, drawing uniformly");
                rng.index(cantons.len())
            }
        };
        Ok(&cantons[index])
    }

    fn draw_given_name(&self, rng: &mut SampleRng, language: Language, gender: Gender) -> String {
        if let Some(table) = self.data.given_names_for(language) {
            if let Some(entry) = pick_weighted(rng, &table.for_gender(gender)) {
                return entry.name.clone();
            }
        }
        let pool = fallback_given_names(language, gender);
        pool[rng.index(pool.len())].to_string()
    }

    fn draw_surname(&self, rng: &mut SampleRng, language: Language) -> String {
        let entries: Vec<&NameEntry> = self.data.surnames.entries().iter().collect();
        if let Some(entry) = pick_weighted(rng, &entries) {
            return entry.name.clone();
        }
        let pool = fallback_surnames(language);
        pool[rng.index(pool.len())].to_string()
    }

    fn draw_occupation(&self, rng: &mut SampleRng, industry: Option<&str>) -> OccupationRecord {
        let all = &self.data.occupations;
        if all.is_empty() {
            return fallback_occupation();
        }

        let mut pool: Vec<&OccupationRecord> = match industry {
            Some(wanted) => all
                .iter()
                .filter(|o| o.industry.eq_ignore_ascii_case(wanted.trim()))
                .collect(),
            None => Vec::new(),
        };
        if pool.is_empty() {
            if let Some(wanted) = industry {
                warn!(industry = wanted, "No occupations in industry, sampling from all");
            }
            pool = all.iter().collect();
        }

        pool[rng.index(pool.len())].clone()
    }

    fn draw_employer(&self, rng: &mut SampleRng, canton: &str, industry: &str) -> Option<String> {
        let companies = &self.data.companies;
        if companies.is_empty() {
            return None;
        }

        let in_canton: Vec<&CompanyRecord> = companies
            .iter()
            .filter(|c| c.canton.eq_ignore_ascii_case(canton))
            .collect();
        let in_industry: Vec<&CompanyRecord> = in_canton
            .iter()
            .copied()
            .filter(|c| c.industry.eq_ignore_ascii_case(industry))
            .collect();

        let pool = if !in_industry.is_empty() {
            in_industry
        } else if !in_canton.is_empty() {
            in_canton
        } else {
            companies.iter().collect()
        };
        Some(pool[rng.index(pool.len())].name.clone())
    }
}

fn draw_language(rng: &mut SampleRng, primary: Language) -> Language {
    let table = language_table(primary);
    let weights: Vec<f64> = table.iter().map(|(_, w)| *w).collect();
    rng.weighted_index(&weights)
        .map(|i| table[i].0)
        .unwrap_or(primary)
}

fn draw_experience(rng: &mut SampleRng, age: u32) -> u32 {
    let exit_age = EDUCATION_EXIT_AGES[rng.index(EDUCATION_EXIT_AGES.len())];
    let career_break = rng.weighted_index(&CAREER_BREAK_WEIGHTS).unwrap_or(0) as u32;
    age.saturating_sub(exit_age + career_break)
        .min(age.saturating_sub(MIN_WORKING_AGE))
}

fn draw_city(rng: &mut SampleRng, canton: &CantonRecord) -> String {
    if canton.major_cities.is_empty() {
        return canton.name.clone();
    }
    canton.major_cities[rng.index(canton.major_cities.len())].clone()
}

/// Weighted pick with a uniform fallback when every weight is zero.
fn pick_weighted<'a>(rng: &mut SampleRng, entries: &[&'a NameEntry]) -> Option<&'a NameEntry> {
    if entries.is_empty() {
        return None;
    }
    let weights: Vec<f64> = entries.iter().map(|e| e.weight).collect();
    let index = rng
        .weighted_index(&weights)
        .unwrap_or_else(|| rng.index(entries.len()));
    Some(entries[index])
}

fn fallback_occupation() -> OccupationRecord {
    OccupationRecord::new("Sachbearbeiter/in", FALLBACK_INDUSTRY)
        .with_title(Language::Fr, "Employé/e administratif/ve")
        .with_title(Language::It, "Impiegato/a amministrativo/a")
        .with_title(Language::En, "Administrative Clerk")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{NameFrequencyTable, ReferenceDataProvider};
    use std::collections::HashMap;

    fn zh_ge() -> ReferenceData {
        ReferenceData::from_cantons(vec![
            CantonRecord::new("ZH", "Zürich", 1_620_000, Language::De)
                .with_cities(&["Zürich", "Winterthur"]),
            CantonRecord::new("GE", "Genève", 530_000, Language::Fr).with_cities(&["Genève"]),
        ])
    }

    fn bundled_sampler() -> PersonaSampler {
        PersonaSampler::new(ReferenceDataProvider::bundled().snapshot().unwrap())
    }

    #[test]
    fn test_same_seed_same_persona() {
        let sampler = bundled_sampler();
        for seed in [0, 1, 42, u64::MAX] {
            let a = sampler.sample(&SampleRequest::new(seed)).unwrap();
            let b = sampler.sample(&SampleRequest::new(seed)).unwrap();
            assert_eq!(a, b);
        }
    }

    /// ZH and GE weighted by workforce (500k against 100k)
    fn zh_ge_workforce() -> ReferenceData {
        ReferenceData::from_cantons(vec![
            CantonRecord::new("ZH", "Zürich", 1_000_000, Language::De).with_workforce(500_000),
            CantonRecord::new("GE", "Genève", 500_000, Language::Fr).with_workforce(100_000),
        ])
    }

    #[test]
    fn test_seed_42_zh_ge_reproducible() {
        let first = PersonaSampler::new(zh_ge_workforce())
            .sample(&SampleRequest::new(42))
            .unwrap();
        let second = PersonaSampler::new(zh_ge_workforce())
            .sample(&SampleRequest::new(42))
            .unwrap();
        assert_eq!(first, second);

        // Pcg64Mcg::seed_from_u64(42) with the documented draw order
        assert_eq!(
            (
                first.canton.as_str(),
                first.language,
                first.age,
                first.years_experience
            ),
            ("ZH", Language::De, 41, 18)
        );
    }

    #[test]
    fn test_canton_share_follows_population_across_seeds() {
        let data = ReferenceData::from_cantons(vec![
            CantonRecord::new("AA", "Canton A", 9_000, Language::De),
            CantonRecord::new("BB", "Canton B", 1_000, Language::Fr),
        ]);
        let sampler = PersonaSampler::new(data);

        let canton_a = (0..10_000u64)
            .filter(|seed| sampler.sample(&SampleRequest::new(*seed)).unwrap().canton == "AA")
            .count();
        let share = canton_a as f64 / 10_000.0;
        assert!((0.85..=0.95).contains(&share), "share of A = {}", share);
    }

    #[test]
    fn test_zero_workforce_canton_weighted_by_population() {
        let data = ReferenceData::from_cantons(vec![
            CantonRecord::new("ZH", "Zürich", 1_000_000, Language::De).with_workforce(0),
            CantonRecord::new("GE", "Genève", 500_000, Language::Fr),
        ]);
        let sampler = PersonaSampler::new(data);

        let zurich = (0..2_000u64)
            .filter(|seed| sampler.sample(&SampleRequest::new(*seed)).unwrap().canton == "ZH")
            .count();
        let share = zurich as f64 / 2_000.0;
        assert!((0.6..=0.73).contains(&share), "share of ZH = {}", share);
    }

    #[test]
    fn test_age_and_experience_invariants() {
        let sampler = bundled_sampler();
        for seed in 0..2_000 {
            let p = sampler.sample(&SampleRequest::new(seed)).unwrap();
            assert!((18..=65).contains(&p.age), "seed {} age {}", seed, p.age);
            assert!(
                p.years_experience + MIN_WORKING_AGE <= p.age,
                "seed {}: {} years at age {}",
                seed,
                p.years_experience,
                p.age
            );
        }
    }

    #[test]
    fn test_custom_age_range() {
        let sampler = PersonaSampler::new(zh_ge()).with_age_range(AgeRange::new(16, 17));
        for seed in 0..200 {
            let p = sampler.sample(&SampleRequest::new(seed)).unwrap();
            assert!(p.age == 16 || p.age == 17);
            assert_eq!(p.years_experience, 0);
        }
    }

    #[test]
    fn test_age_range_clamped_and_ordered() {
        assert_eq!(AgeRange::new(70, 10), AgeRange { min: 16, max: 70 });
        assert_eq!(AgeRange::new(0, 500), AgeRange { min: 16, max: 100 });
    }

    #[test]
    fn test_primary_language_share() {
        let data = ReferenceData::from_cantons(vec![CantonRecord::new(
            "BE",
            "Bern",
            1_100_000,
            Language::De,
        )]);
        let sampler = PersonaSampler::new(data);

        let german = (0..10_000)
            .filter(|seed| {
                sampler.sample(&SampleRequest::new(*seed)).unwrap().language == Language::De
            })
            .count();
        let share = german as f64 / 10_000.0;
        assert!((0.85..=0.95).contains(&share), "share = {}", share);
    }

    #[test]
    fn test_geneva_override() {
        let sampler = PersonaSampler::new(zh_ge());
        let mut languages: HashMap<Language, usize> = HashMap::new();

        for seed in 0..2_000 {
            let p = sampler
                .sample(&SampleRequest::new(seed).with_canton("ge"))
                .unwrap();
            assert_eq!(p.canton, "GE");
            assert_eq!(p.city, "Genève");
            *languages.entry(p.language).or_default() += 1;
        }

        let french = languages.get(&Language::Fr).copied().unwrap_or(0) as f64 / 2_000.0;
        assert!((0.85..=0.95).contains(&french), "french = {}", french);
        assert!(!languages.contains_key(&Language::En));
    }

    #[test]
    fn test_unknown_canton_override() {
        let sampler = PersonaSampler::new(zh_ge());
        let err = sampler
            .sample(&SampleRequest::new(1).with_canton("XX"))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCanton { code } if code == "XX"));
    }

    #[test]
    fn test_empty_canton_pool() {
        let sampler = PersonaSampler::new(ReferenceData::default());
        assert!(matches!(
            sampler.sample(&SampleRequest::new(1)),
            Err(Error::EmptyPool(_))
        ));
    }

    #[test]
    fn test_zero_weights_fall_back_to_uniform() {
        let data = ReferenceData::from_cantons(vec![
            CantonRecord::new("UR", "Uri", 0, Language::De),
            CantonRecord::new("TI", "Ticino", 0, Language::It),
        ]);
        let sampler = PersonaSampler::new(data);
        let cantons: std::collections::HashSet<String> = (0..200)
            .map(|s| sampler.sample(&SampleRequest::new(s)).unwrap().canton)
            .collect();
        assert_eq!(cantons.len(), 2);
    }

    #[test]
    fn test_zero_weight_canton_never_drawn() {
        let data = ReferenceData::from_cantons(vec![
            CantonRecord::new("UR", "Uri", 0, Language::De),
            CantonRecord::new("TI", "Ticino", 390_000, Language::It),
        ]);
        let sampler = PersonaSampler::new(data);
        for seed in 0..500 {
            assert_eq!(sampler.sample(&SampleRequest::new(seed)).unwrap().canton, "TI");
        }
    }

    #[test]
    fn test_empty_surname_table_uses_builtin_pool() {
        let sampler = PersonaSampler::new(zh_ge().with_surnames(NameFrequencyTable::default()));
        for seed in 0..300 {
            let p = sampler.sample(&SampleRequest::new(seed)).unwrap();
            assert!(
                fallback_surnames(p.language).contains(&p.last_name.as_str()),
                "{} not in the {} pool",
                p.last_name,
                p.language
            );
            assert!(fallback_given_names(p.language, p.gender).contains(&p.first_name.as_str()));
        }
    }

    #[test]
    fn test_gendered_name_table() {
        let table = NameFrequencyTable::new(vec![
            NameEntry { name: "Anna".into(), weight: 1.0, gender: Some(Gender::Female) },
            NameEntry { name: "Luca".into(), weight: 1.0, gender: Some(Gender::Male) },
        ]);
        let sampler = PersonaSampler::new(zh_ge().with_given_names(Language::De, table));
        for seed in 0..300 {
            let p = sampler
                .sample(&SampleRequest::new(seed).with_language(Language::De))
                .unwrap();
            let expected = match p.gender {
                Gender::Female => "Anna",
                Gender::Male => "Luca",
            };
            assert_eq!(p.first_name, expected);
        }
    }

    #[test]
    fn test_phone_pattern() {
        let sampler = bundled_sampler();
        for seed in 0..500 {
            let phone = sampler.sample(&SampleRequest::new(seed)).unwrap().phone;
            let rest = phone.strip_prefix("+41").unwrap();
            assert_eq!(rest.len(), 9);
            assert!(["76", "77", "78", "79"].contains(&&rest[..2]));
            assert!(rest.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_industry_preference() {
        let sampler = bundled_sampler();
        for seed in 0..200 {
            let p = sampler
                .sample(&SampleRequest::new(seed).with_industry("Healthcare"))
                .unwrap();
            assert_eq!(p.industry, "healthcare");
        }

        // Unknown industry falls back to the full list instead of failing.
        assert!(sampler
            .sample(&SampleRequest::new(3).with_industry("astrology"))
            .is_ok());
    }

    #[test]
    fn test_fallback_occupation_when_table_empty() {
        let sampler = PersonaSampler::new(zh_ge());
        let p = sampler
            .sample(&SampleRequest::new(8).with_language(Language::De))
            .unwrap();
        assert_eq!(p.industry, "general");
        assert!(p.occupation.ends_with("Sachbearbeiter/in"));
        assert_eq!(p.employer, None);
    }

    #[test]
    fn test_employer_prefers_canton_and_industry() {
        let data = zh_ge()
            .with_occupations(vec![OccupationRecord::new("Chemiker/in", "pharma")])
            .with_companies(vec![
                CompanyRecord::new("Zürcher Bank", "ZH", "finance"),
                CompanyRecord::new("Zürcher Labor", "ZH", "pharma"),
                CompanyRecord::new("Genfer Labor", "GE", "pharma"),
            ]);
        let sampler = PersonaSampler::new(data);
        for seed in 0..200 {
            let p = sampler
                .sample(&SampleRequest::new(seed).with_canton("ZH"))
                .unwrap();
            assert_eq!(p.employer.as_deref(), Some("Zürcher Labor"));
        }
    }

    #[test]
    fn test_employer_falls_back_to_any_company() {
        let data = zh_ge().with_companies(vec![CompanyRecord::new("Berner Firma", "BE", "retail")]);
        let sampler = PersonaSampler::new(data);
        let p = sampler
            .sample(&SampleRequest::new(5).with_canton("GE"))
            .unwrap();
        assert_eq!(p.employer.as_deref(), Some("Berner Firma"));
    }

    #[test]
    fn test_language_override() {
        let sampler = PersonaSampler::new(zh_ge());
        for seed in 0..100 {
            let p = sampler
                .sample(&SampleRequest::new(seed).with_language(Language::It))
                .unwrap();
            assert_eq!(p.language, Language::It);
        }
    }

    #[test]
    fn test_distinct_seeds_distinct_ids() {
        let sampler = bundled_sampler();
        let ids: std::collections::HashSet<Uuid> = (0..500)
            .map(|s| sampler.sample(&SampleRequest::new(s)).unwrap().id)
            .collect();
        assert_eq!(ids.len(), 500);
    }
}

//! The assembled persona.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::reference::{Gender, Language};
use crate::sampling::Seniority;

/// Earliest age at which work experience is counted.
pub const MIN_WORKING_AGE: u32 = 16;

/// Oldest age a persona may have.
pub const MAX_AGE: u32 = 100;

/// A synthetic Swiss CV persona.
///
/// Built once by the assembler; the only later change is attaching a
/// summary through [`PersonaRecord::with_summary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredPersona")]
pub struct PersonaRecord {
    id: Uuid,
    seed: u64,
    first_name: String,
    last_name: String,
    gender: Gender,
    age: u32,
    birth_year: i32,
    canton: String,
    canton_name: String,
    city: String,
    language: Language,
    years_experience: u32,
    seniority: Seniority,
    industry: String,
    occupation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    employer: Option<String>,
    email: String,
    phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

/// Flat columns, in export order.
pub const FLAT_COLUMNS: [&str; 19] = [
    "id",
    "seed",
    "first_name",
    "last_name",
    "gender",
    "age",
    "birth_year",
    "canton",
    "canton_name",
    "city",
    "language",
    "years_experience",
    "seniority",
    "industry",
    "occupation",
    "employer",
    "email",
    "phone",
    "summary",
];

/// Field values handed to [`PersonaRecord::new`].
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PersonaFields {
    pub id: Uuid,
    pub seed: u64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub age: u32,
    pub birth_year: i32,
    pub canton: String,
    pub canton_name: String,
    pub city: String,
    pub language: Language,
    pub years_experience: u32,
    pub seniority: Seniority,
    pub industry: String,
    pub occupation: String,
    #[serde(default)]
    pub employer: Option<String>,
    pub email: String,
    pub phone: String,
}

/// A persona as written by the JSON exporter. Reading one back goes
/// through [`PersonaRecord::new`], so the invariants are checked again.
#[derive(Deserialize)]
struct StoredPersona {
    #[serde(flatten)]
    fields: PersonaFields,
    #[serde(default)]
    summary: Option<String>,
}

impl TryFrom<StoredPersona> for PersonaRecord {
    type Error = Error;

    fn try_from(stored: StoredPersona) -> Result<Self> {
        let record = PersonaRecord::new(stored.fields)?;
        Ok(match stored.summary {
            Some(summary) => record.into_summarized(summary),
            None => record,
        })
    }
}

impl PersonaRecord {
    /// Validate and build. Fails with `PersonaInvalid` when an invariant does not hold.
    pub(crate) fn new(fields: PersonaFields) -> Result<Self> {
        let record = Self {
            id: fields.id,
            seed: fields.seed,
            first_name: fields.first_name,
            last_name: fields.last_name,
            gender: fields.gender,
            age: fields.age,
            birth_year: fields.birth_year,
            canton: fields.canton,
            canton_name: fields.canton_name,
            city: fields.city,
            language: fields.language,
            years_experience: fields.years_experience,
            seniority: fields.seniority,
            industry: fields.industry,
            occupation: fields.occupation,
            employer: fields.employer,
            email: fields.email,
            phone: fields.phone,
            summary: None,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the age and experience invariants.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_WORKING_AGE..=MAX_AGE).contains(&self.age) {
            return Err(Error::PersonaInvalid(format!(
                "age {} outside [{}, {}] (seed {})",
                self.age, MIN_WORKING_AGE, MAX_AGE, self.seed
            )));
        }
        if self.years_experience + MIN_WORKING_AGE > self.age {
            return Err(Error::PersonaInvalid(format!(
                "{} years of experience at age {} (seed {})",
                self.years_experience, self.age, self.seed
            )));
        }
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return Err(Error::PersonaInvalid(format!(
                "empty name (seed {})",
                self.seed
            )));
        }
        Ok(())
    }

    /// Attach the summary. A persona takes exactly one summary.
    pub fn with_summary(self, summary: impl Into<String>) -> Result<Self> {
        if self.summary.is_some() {
            return Err(Error::PersonaInvalid(format!(
                "persona {} already has a summary",
                self.id
            )));
        }
        Ok(self.into_summarized(summary.into()))
    }

    /// Set the summary unless one is already attached.
    pub(crate) fn into_summarized(mut self, summary: String) -> Self {
        if self.summary.is_none() {
            self.summary = Some(summary);
        }
        self
    }

    /// Every field as a string, keyed by column name. Absent values are empty.
    pub fn to_flat_map(&self) -> BTreeMap<&'static str, String> {
        let mut map = BTreeMap::new();
        map.insert("id", self.id.to_string());
        map.insert("seed", self.seed.to_string());
        map.insert("first_name", self.first_name.clone());
        map.insert("last_name", self.last_name.clone());
        map.insert("gender", self.gender.to_string());
        map.insert("age", self.age.to_string());
        map.insert("birth_year", self.birth_year.to_string());
        map.insert("canton", self.canton.clone());
        map.insert("canton_name", self.canton_name.clone());
        map.insert("city", self.city.clone());
        map.insert("language", self.language.to_string());
        map.insert("years_experience", self.years_experience.to_string());
        map.insert("seniority", self.seniority.to_string());
        map.insert("industry", self.industry.clone());
        map.insert("occupation", self.occupation.clone());
        map.insert("employer", self.employer.clone().unwrap_or_default());
        map.insert("email", self.email.clone());
        map.insert("phone", self.phone.clone());
        map.insert("summary", self.summary.clone().unwrap_or_default());
        map
    }

    /// Values in [`FLAT_COLUMNS`] order.
    pub fn flat_row(&self) -> Vec<String> {
        let mut map = self.to_flat_map();
        FLAT_COLUMNS
            .iter()
            .map(|column| map.remove(column).unwrap_or_default())
            .collect()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn birth_year(&self) -> i32 {
        self.birth_year
    }

    pub fn canton(&self) -> &str {
        &self.canton
    }

    pub fn canton_name(&self) -> &str {
        &self.canton_name
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn years_experience(&self) -> u32 {
        self.years_experience
    }

    pub fn seniority(&self) -> Seniority {
        self.seniority
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }

    pub fn occupation(&self) -> &str {
        &self.occupation
    }

    pub fn employer(&self) -> Option<&str> {
        self.employer.as_deref()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }
}

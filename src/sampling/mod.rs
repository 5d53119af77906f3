//! Seeded, weighted sampling of persona fields.

mod contact;
mod names;
mod rng;
mod sampler;
mod seniority;

pub use contact::{transliterate, EMAIL_DOMAINS, MOBILE_PREFIXES};
pub use names::{fallback_given_names, fallback_surnames, language_table};
pub use rng::SampleRng;
pub use sampler::{AgeRange, PersonaSampler, SampleRequest, SampledPersona};
pub use seniority::Seniority;

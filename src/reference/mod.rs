//! Reference data: cantons, occupations, companies and name frequencies.
//!
//! Tables are read from a data directory on first access and cached by
//! the [`ReferenceDataProvider`]; a complete dataset is compiled into the
//! binary and used for any table whose file is absent.

mod bundled;
pub mod loader;
pub mod parse;
mod provider;
mod records;

pub use provider::{
    GivenNameTables, ProviderOptions, ReferenceData, ReferenceDataProvider, SourceName, TableOrigin,
};
pub use records::{
    CantonRecord, CompanyRecord, Gender, Language, NameEntry, NameFrequencyTable, OccupationRecord,
};

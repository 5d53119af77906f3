//! Lazily loaded, per-instance cached reference tables.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::bundled::bundled_text;
use super::loader;
use super::records::{
    CantonRecord, CompanyRecord, Language, NameFrequencyTable, OccupationRecord,
};
use crate::config::DataSettings;
use crate::error::{Error, Result};

/// Logical names of the reference sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceName {
    Cantons,
    Occupations,
    Companies,
    GivenNames(Language),
    Surnames,
}

impl SourceName {
    /// File name inside the data directory.
    pub fn file_name(&self) -> String {
        match self {
            SourceName::Cantons => "cantons.json".to_string(),
            SourceName::Occupations => "occupations.json".to_string(),
            SourceName::Companies => "companies.json".to_string(),
            SourceName::GivenNames(lang) => format!("names_{}.csv", lang.code()),
            SourceName::Surnames => "surnames.csv".to_string(),
        }
    }

    /// Only the canton table is required to generate anything.
    pub fn is_required(&self) -> bool {
        matches!(self, SourceName::Cantons)
    }

    /// Every source, in load order.
    pub fn all() -> Vec<SourceName> {
        let mut sources = vec![
            SourceName::Cantons,
            SourceName::Occupations,
            SourceName::Companies,
        ];
        sources.extend(Language::ALL.iter().map(|l| SourceName::GivenNames(*l)));
        sources.push(SourceName::Surnames);
        sources
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceName::Cantons => f.write_str("cantons"),
            SourceName::Occupations => f.write_str("occupations"),
            SourceName::Companies => f.write_str("companies"),
            SourceName::GivenNames(lang) => write!(f, "names_{}", lang.code()),
            SourceName::Surnames => f.write_str("surnames"),
        }
    }
}

/// Where a loaded table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOrigin {
    File(PathBuf),
    Bundled,
    Missing,
}

impl fmt::Display for TableOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableOrigin::File(path) => write!(f, "{}", path.display()),
            TableOrigin::Bundled => f.write_str("bundled"),
            TableOrigin::Missing => f.write_str("missing"),
        }
    }
}

/// Given-name tables keyed by language.
pub type GivenNameTables = BTreeMap<Language, NameFrequencyTable>;

/// A table slot that loads at most once.
///
/// The lock is held for the whole load so that concurrent first
/// accesses wait for a single read. Failures are not cached.
struct LazyTable<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> LazyTable<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn get_or_try_load(&self, load: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        let mut slot = self.slot.lock();
        if let Some(table) = slot.as_ref() {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(load()?);
        *slot = Some(Arc::clone(&table));
        Ok(table)
    }
}

/// Loading policy for a provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderOptions {
    /// Use the compiled-in dataset for any table whose file is absent
    pub bundled_fallback: bool,
    /// Fail on the first malformed row
    pub strict: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            bundled_fallback: true,
            strict: false,
        }
    }
}

/// Reads reference tables from a data directory on first use and caches them.
pub struct ReferenceDataProvider {
    data_dir: Option<PathBuf>,
    options: ProviderOptions,
    cantons: LazyTable<Vec<CantonRecord>>,
    occupations: LazyTable<Vec<OccupationRecord>>,
    companies: LazyTable<Vec<CompanyRecord>>,
    given_names: LazyTable<GivenNameTables>,
    surnames: LazyTable<NameFrequencyTable>,
}

impl ReferenceDataProvider {
    pub fn new(data_dir: impl Into<PathBuf>, options: ProviderOptions) -> Self {
        Self::with_dir(Some(data_dir.into()), options)
    }

    /// Provider backed only by the compiled-in dataset.
    pub fn bundled() -> Self {
        Self::with_dir(
            None,
            ProviderOptions {
                bundled_fallback: true,
                strict: true,
            },
        )
    }

    pub fn from_settings(settings: &DataSettings) -> Self {
        Self::new(
            &settings.dir,
            ProviderOptions {
                bundled_fallback: settings.bundled_fallback,
                strict: settings.strict,
            },
        )
    }

    fn with_dir(data_dir: Option<PathBuf>, options: ProviderOptions) -> Self {
        Self {
            data_dir,
            options,
            cantons: LazyTable::new(),
            occupations: LazyTable::new(),
            companies: LazyTable::new(),
            given_names: LazyTable::new(),
            surnames: LazyTable::new(),
        }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn cantons(&self) -> Result<Arc<Vec<CantonRecord>>> {
        self.cantons.get_or_try_load(|| {
            self.load(SourceName::Cantons, loader::parse_cantons, Vec::new)
        })
    }

    pub fn occupations(&self) -> Result<Arc<Vec<OccupationRecord>>> {
        self.occupations.get_or_try_load(|| {
            self.load(SourceName::Occupations, loader::parse_occupations, Vec::new)
        })
    }

    pub fn companies(&self) -> Result<Arc<Vec<CompanyRecord>>> {
        self.companies.get_or_try_load(|| {
            self.load(SourceName::Companies, loader::parse_companies, Vec::new)
        })
    }

    pub fn given_names(&self) -> Result<Arc<GivenNameTables>> {
        self.given_names.get_or_try_load(|| {
            let mut tables = GivenNameTables::new();
            for lang in Language::ALL {
                let source = SourceName::GivenNames(lang);
                let table = self.load(
                    source,
                    |text, strict| loader::parse_name_table(&source.to_string(), text, strict),
                    NameFrequencyTable::default,
                )?;
                tables.insert(lang, table);
            }
            Ok(tables)
        })
    }

    pub fn surnames(&self) -> Result<Arc<NameFrequencyTable>> {
        self.surnames.get_or_try_load(|| {
            self.load(
                SourceName::Surnames,
                |text, strict| loader::parse_name_table("surnames", text, strict),
                NameFrequencyTable::default,
            )
        })
    }

    /// Load every table and hand out an immutable view for sampling.
    pub fn snapshot(&self) -> Result<ReferenceData> {
        Ok(ReferenceData {
            cantons: self.cantons()?,
            occupations: self.occupations()?,
            companies: self.companies()?,
            given_names: self.given_names()?,
            surnames: self.surnames()?,
        })
    }

    /// Where `source` would be read from right now, without parsing it.
    pub fn origin(&self, source: SourceName) -> TableOrigin {
        match self.source_path(source) {
            Some(path) if path.is_file() => TableOrigin::File(path),
            _ if self.options.bundled_fallback && bundled_text(source).is_some() => {
                TableOrigin::Bundled
            }
            _ => TableOrigin::Missing,
        }
    }

    fn source_path(&self, source: SourceName) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(source.file_name()))
    }

    fn load<T>(
        &self,
        source: SourceName,
        parse: impl Fn(&str, bool) -> Result<T>,
        empty: impl FnOnce() -> T,
    ) -> Result<T> {
        if let Some(path) = self.source_path(source) {
            if let Some(text) = read_source(source, &path)? {
                info!(source = %source, path = %path.display(), "Loading reference table");
                return parse(&text, self.options.strict);
            }
        }

        if self.options.bundled_fallback {
            if let Some(text) = bundled_text(source) {
                debug!(source = %source, "Using bundled reference table");
                // The bundled dataset is known to be well-formed.
                return parse(text, true);
            }
        }

        if source.is_required() {
            let path = self
                .source_path(source)
                .unwrap_or_else(|| PathBuf::from(source.file_name()));
            return Err(Error::data_not_found(source.to_string(), path));
        }

        warn!(source = %source, "Reference table not found, using an empty table");
        Ok(empty())
    }
}

/// File contents, or `None` when the file (or its directory) does not exist.
fn read_source(source: SourceName, path: &Path) -> Result<Option<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(Error::IoRead {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| Error::data_format(source.to_string(), format!("not valid UTF-8: {}", e)))
}

/// Immutable, cheaply clonable view of every reference table.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub cantons: Arc<Vec<CantonRecord>>,
    pub occupations: Arc<Vec<OccupationRecord>>,
    pub companies: Arc<Vec<CompanyRecord>>,
    pub given_names: Arc<GivenNameTables>,
    pub surnames: Arc<NameFrequencyTable>,
}

impl ReferenceData {
    /// Data with only cantons; every other table empty.
    pub fn from_cantons(cantons: Vec<CantonRecord>) -> Self {
        Self {
            cantons: Arc::new(cantons),
            ..Self::default()
        }
    }

    pub fn with_occupations(mut self, occupations: Vec<OccupationRecord>) -> Self {
        self.occupations = Arc::new(occupations);
        self
    }

    pub fn with_companies(mut self, companies: Vec<CompanyRecord>) -> Self {
        self.companies = Arc::new(companies);
        self
    }

    pub fn with_given_names(mut self, language: Language, table: NameFrequencyTable) -> Self {
        Arc::make_mut(&mut self.given_names).insert(language, table);
        self
    }

    pub fn with_surnames(mut self, table: NameFrequencyTable) -> Self {
        self.surnames = Arc::new(table);
        self
    }

    /// Case-insensitive canton lookup.
    pub fn canton(&self, code: &str) -> Option<&CantonRecord> {
        self.cantons
            .iter()
            .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
    }

    pub fn given_names_for(&self, language: Language) -> Option<&NameFrequencyTable> {
        self.given_names.get(&language).filter(|t| !t.is_empty())
    }
}

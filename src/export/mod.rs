//! Document export: JSON, HTML and PDF per persona, a CSV index per batch.

mod csv_index;
mod html;
mod json;
mod pdf;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::persona::PersonaRecord;

pub use csv_index::{write_index, INDEX_FILE_NAME};
pub use html::render_html;
pub use json::render_json;
pub use pdf::render_pdf;

/// Output document format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Html,
    Pdf,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            "pdf" => Ok(ExportFormat::Pdf),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("Unknown format '{}'. Valid: json, html, pdf, csv", other)),
        }
    }
}

/// Writes a batch of personas to an output directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    output_dir: PathBuf,
    formats: Vec<ExportFormat>,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, formats: &[ExportFormat]) -> Self {
        let mut unique = Vec::new();
        for format in formats {
            if !unique.contains(format) {
                unique.push(*format);
            }
        }
        Self {
            output_dir: output_dir.into(),
            formats: unique,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write every requested document. Returns the paths written, in order.
    pub fn export(&self, personas: &[PersonaRecord]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::IoWrite {
            path: self.output_dir.clone(),
            source: e,
        })?;

        let mut written = Vec::new();
        for (index, persona) in personas.iter().enumerate() {
            let stem = file_stem(persona, index + 1);
            for format in &self.formats {
                let body = match format {
                    ExportFormat::Json => render_json(persona)?.into_bytes(),
                    ExportFormat::Html => render_html(persona).into_bytes(),
                    ExportFormat::Pdf => render_pdf(persona)?,
                    ExportFormat::Csv => continue,
                };
                let path = self
                    .output_dir
                    .join(format!("{}.{}", stem, format.extension()));
                write_file(&path, &body)?;
                debug!(path = %path.display(), "Persona document written");
                written.push(path);
            }
        }

        if self.formats.contains(&ExportFormat::Csv) {
            let path = self.output_dir.join(INDEX_FILE_NAME);
            write_index(&path, personas)?;
            written.push(path);
        }

        info!(
            personas = personas.len(),
            files = written.len(),
            dir = %self.output_dir.display(),
            "Export finished"
        );
        Ok(written)
    }
}

/// `<First>_<Last>_<CANTON>_<n>`, with path-hostile characters replaced.
pub fn file_stem(persona: &PersonaRecord, position: usize) -> String {
    let raw = format!(
        "{}_{}_{}_{}",
        persona.first_name(),
        persona.last_name(),
        persona.canton(),
        position
    );
    raw.chars()
        .map(|c| {
            if c.is_whitespace() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                c
            }
        })
        .collect()
}

fn write_file(path: &Path, body: &[u8]) -> Result<()> {
    fs::write(path, body).map_err(|e| Error::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::PersonaGenerator;
    use crate::reference::ReferenceDataProvider;
    use crate::sampling::{PersonaSampler, SampleRequest};
    use tempfile::TempDir;

    fn personas(count: usize) -> Vec<PersonaRecord> {
        let sampler = PersonaSampler::new(ReferenceDataProvider::bundled().snapshot().unwrap());
        PersonaGenerator::new(sampler)
            .generate_batch(&SampleRequest::new(100), count, 1)
            .unwrap()
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("HTML".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert_eq!(" Pdf ".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!("docx".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_file_stem() {
        let persona = &personas(1)[0];
        let stem = file_stem(persona, 3);
        assert!(stem.starts_with(persona.first_name()));
        assert!(stem.ends_with(&format!("_{}_3", persona.canton())));
        assert!(!stem.contains(' '));
    }

    #[test]
    fn test_export_all_formats() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let batch = personas(3);

        let exporter = Exporter::new(
            &out,
            &[ExportFormat::Json, ExportFormat::Html, ExportFormat::Csv, ExportFormat::Json],
        );
        let written = exporter.export(&batch).unwrap();

        assert_eq!(written.len(), 3 * 2 + 1);
        assert!(out.join(INDEX_FILE_NAME).exists());
        for (i, persona) in batch.iter().enumerate() {
            let stem = file_stem(persona, i + 1);
            assert!(out.join(format!("{}.json", stem)).exists());
            assert!(out.join(format!("{}.html", stem)).exists());
        }
    }

    #[test]
    fn test_export_pdf_documents() {
        let dir = TempDir::new().unwrap();
        let batch = personas(2);
        let written = Exporter::new(dir.path(), &[ExportFormat::Pdf])
            .export(&batch)
            .unwrap();

        assert_eq!(written.len(), 2);
        let first = dir.path().join(format!("{}.pdf", file_stem(&batch[0], 1)));
        assert_eq!(written[0], first);
        assert!(std::fs::read(&first).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_json_only() {
        let dir = TempDir::new().unwrap();
        let written = Exporter::new(dir.path(), &[ExportFormat::Json])
            .export(&personas(2))
            .unwrap();
        assert_eq!(written.len(), 2);
        assert!(!dir.path().join(INDEX_FILE_NAME).exists());
    }
}

//! Plain-text A4 CV rendered with the PDF standard Helvetica faces, so no
//! font files ship with the binary.

use printpdf::{BuiltinFont, Mm, PdfDocument};

use super::html::labels;
use crate::error::{Error, Result};
use crate::persona::PersonaRecord;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
/// Characters per body line at 11pt across the text column
const WRAP_COLUMNS: usize = 88;

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Title(String),
    Subtitle(String),
    Heading(String),
    Body(String),
    Gap,
}

impl Line {
    /// Font size in points and the vertical advance in millimetres
    fn metrics(&self) -> (f32, f32) {
        match self {
            Line::Title(_) => (20.0, 10.0),
            Line::Subtitle(_) => (13.0, 7.0),
            Line::Heading(_) => (13.0, 8.0),
            Line::Body(_) => (11.0, 5.5),
            Line::Gap => (0.0, 4.0),
        }
    }
}

/// One persona as a PDF document, paged when the summary runs long.
pub fn render_pdf(persona: &PersonaRecord) -> Result<Vec<u8>> {
    let title = format!("{} - {}", persona.full_name(), persona.occupation());
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "CV");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in cv_lines(persona) {
        let (size, advance) = line.metrics();
        if y - advance < MARGIN {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "CV");
            current = doc.get_page(page).get_layer(layer);
            y = PAGE_HEIGHT - MARGIN;
        }
        y -= advance;

        match line {
            Line::Title(text) | Line::Heading(text) => {
                current.use_text(text, size, Mm(MARGIN), Mm(y), &bold)
            }
            Line::Subtitle(text) | Line::Body(text) => {
                current.use_text(text, size, Mm(MARGIN), Mm(y), &regular)
            }
            Line::Gap => {}
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

fn pdf_error(e: printpdf::Error) -> Error {
    Error::export_failed("pdf", e.to_string())
}

/// The same sections as the HTML page, flattened to typeset lines.
fn cv_lines(persona: &PersonaRecord) -> Vec<Line> {
    let l = labels(persona.language());
    let mut lines = vec![
        Line::Title(persona.full_name()),
        Line::Subtitle(persona.occupation().to_string()),
    ];

    if let Some(summary) = persona.summary() {
        lines.push(Line::Gap);
        lines.push(Line::Heading(l.profile.to_string()));
        lines.extend(wrap(summary, WRAP_COLUMNS).into_iter().map(Line::Body));
    }

    lines.push(Line::Gap);
    lines.push(Line::Heading(l.personal.to_string()));
    lines.push(row(l.born, &persona.birth_year().to_string()));
    lines.push(row(l.age, &persona.age().to_string()));
    lines.push(row(
        l.residence,
        &format!("{}, {} ({})", persona.city(), persona.canton_name(), persona.canton()),
    ));

    lines.push(Line::Gap);
    lines.push(Line::Heading(l.experience.to_string()));
    lines.push(row(l.industry, persona.industry()));
    if let Some(employer) = persona.employer() {
        lines.push(row(l.employer, employer));
    }
    lines.push(row(l.years, &persona.years_experience().to_string()));

    lines.push(Line::Gap);
    lines.push(Line::Heading(l.contact.to_string()));
    lines.push(row("E-Mail", persona.email()));
    lines.push(row("Tel.", persona.phone()));

    lines
}

fn row(label: &str, value: &str) -> Line {
    Line::Body(format!("{}: {}", label, value))
}

/// Greedy word wrap; a single word longer than `width` gets its own line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
        if !current.is_empty() && needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::record::tests::sample_fields;
    use crate::reference::Language;

    #[test]
    fn test_wrap_respects_width() {
        let text = "Erfahrene Fachperson mit langjähriger Praxis in der Planung und Umsetzung";
        let lines = wrap(text, 24);

        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.chars().count() <= 24));
        assert_eq!(lines.join(" "), text);
        assert_eq!(wrap("Donaudampfschifffahrt", 5), vec!["Donaudampfschifffahrt"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_lines_follow_persona_language() {
        let mut fields = sample_fields();
        fields.language = Language::It;
        let persona = PersonaRecord::new(fields).unwrap();
        let lines = cv_lines(&persona);

        assert_eq!(lines[0], Line::Title("Anna Müller".into()));
        assert!(lines.contains(&Line::Heading("Esperienza professionale".into())));
        assert!(lines.contains(&Line::Body("Domicilio: Winterthur, Zürich (ZH)".into())));
        assert!(!lines.contains(&Line::Heading("Profilo".into())));
        assert!(!lines
            .iter()
            .any(|line| matches!(line, Line::Body(text) if text.starts_with("Datore di lavoro"))));
    }

    #[test]
    fn test_summary_and_employer_are_included() {
        let mut fields = sample_fields();
        fields.employer = Some("Muster AG".into());
        let persona = PersonaRecord::new(fields)
            .unwrap()
            .with_summary("Zuverlässig und genau.")
            .unwrap();
        let lines = cv_lines(&persona);

        assert!(lines.contains(&Line::Heading("Profil".into())));
        assert!(lines.contains(&Line::Body("Zuverlässig und genau.".into())));
        assert!(lines.contains(&Line::Body("Arbeitgeber: Muster AG".into())));
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let persona = PersonaRecord::new(sample_fields()).unwrap();
        let bytes = render_pdf(&persona).unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_long_summary_spills_onto_next_page() {
        let summary = "Sorgfältige Projektarbeit in interdisziplinären Teams. ".repeat(120);
        let persona = PersonaRecord::new(sample_fields())
            .unwrap()
            .with_summary(summary.trim())
            .unwrap();

        let body_lines = cv_lines(&persona)
            .iter()
            .filter(|line| matches!(line, Line::Body(_)))
            .count();
        assert!(body_lines as f32 * 5.5 > PAGE_HEIGHT - 2.0 * MARGIN);
        assert!(render_pdf(&persona).unwrap().starts_with(b"%PDF"));
    }
}

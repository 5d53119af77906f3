//! Prompt templates for CV summaries.

use crate::persona::PersonaRecord;
use crate::reference::Language;

/// System message sent with every summary request.
pub const SYSTEM_MESSAGE: &str =
    "You are a concise professional CV writer. Keep tone professional and neutral.";

/// A system/user message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Summary prompt in the persona's language. English personas get the German template.
pub fn summary_prompt(persona: &PersonaRecord) -> Prompt {
    let title = persona.occupation();
    let canton = persona.canton_name();
    let years = persona.years_experience();

    let user = match persona.language() {
        Language::Fr => format!(
            "Rédige un résumé professionnel concis (3–4 phrases) en français pour un/une {} de {} avec {} années d'expérience. Mets en avant les compétences techniques et les réalisations clés.",
            title, canton, years
        ),
        Language::It => format!(
            "Scrivi un riassunto professionale conciso (3–4 frasi) in italiano per un/una {} da {} con {} anni di esperienza. Metti in evidenza le competenze tecniche e i risultati professionali.",
            title, canton, years
        ),
        Language::De | Language::En => format!(
            "Schreibe eine prägnante, professionelle Zusammenfassung (3–4 Sätze) auf Deutsch für eine/n {} aus {} mit {} Jahren Berufserfahrung. Betone relevante technische Fähigkeiten und berufliche Erfolge.",
            title, canton, years
        ),
    };

    Prompt {
        system: SYSTEM_MESSAGE.to_string(),
        user,
    }
}

/// Deterministic summary used when generation fails or times out.
pub fn fallback_summary(persona: &PersonaRecord) -> String {
    let title = persona.occupation();
    let years = persona.years_experience();
    let city = persona.city();
    let industry = persona.industry();

    match persona.language() {
        Language::De => format!(
            "{} mit {} Jahren Berufserfahrung in {}. Fundierte Kenntnisse und praktische Erfahrung in der Branche {}.",
            title, years, city, industry
        ),
        Language::Fr => format!(
            "{} avec {} années d'expérience à {}. Solides connaissances et expérience pratique dans le secteur {}.",
            title, years, city, industry
        ),
        Language::It => format!(
            "{} con {} anni di esperienza a {}. Solide conoscenze ed esperienza pratica nel settore {}.",
            title, years, city, industry
        ),
        Language::En => format!(
            "{} with {} years of experience in {}. Solid knowledge and hands-on experience in the {} industry.",
            title, years, city, industry
        ),
    }
}

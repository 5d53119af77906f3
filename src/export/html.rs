use crate::persona::PersonaRecord;
use crate::reference::Language;

/// Section and field captions in one of the four CV languages
pub(super) struct Labels {
    pub(super) profile: &'static str,
    pub(super) personal: &'static str,
    pub(super) experience: &'static str,
    pub(super) contact: &'static str,
    pub(super) born: &'static str,
    pub(super) age: &'static str,
    pub(super) residence: &'static str,
    pub(super) years: &'static str,
    pub(super) employer: &'static str,
    pub(super) industry: &'static str,
}

pub(super) fn labels(lang: Language) -> Labels {
    match lang {
        Language::De => Labels {
            profile: "Profil",
            personal: "Persönliche Angaben",
            experience: "Berufserfahrung",
            contact: "Kontakt",
            born: "Jahrgang",
            age: "Alter",
            residence: "Wohnort",
            years: "Jahre Berufserfahrung",
            employer: "Arbeitgeber",
            industry: "Branche",
        },
        Language::Fr => Labels {
            profile: "Profil",
            personal: "Données personnelles",
            experience: "Expérience professionnelle",
            contact: "Contact",
            born: "Année de naissance",
            age: "Âge",
            residence: "Domicile",
            years: "Années d'expérience",
            employer: "Employeur",
            industry: "Secteur",
        },
        Language::It => Labels {
            profile: "Profilo",
            personal: "Dati personali",
            experience: "Esperienza professionale",
            contact: "Contatto",
            born: "Anno di nascita",
            age: "Età",
            residence: "Domicilio",
            years: "Anni di esperienza",
            employer: "Datore di lavoro",
            industry: "Settore",
        },
        Language::En => Labels {
            profile: "Profile",
            personal: "Personal details",
            experience: "Professional experience",
            contact: "Contact",
            born: "Year of birth",
            age: "Age",
            residence: "Residence",
            years: "Years of experience",
            employer: "Employer",
            industry: "Industry",
        },
    }
}

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;max-width:760px;margin:40px auto;color:#222;line-height:1.5}\
h1{margin-bottom:0}h2{border-bottom:2px solid #d52b1e;padding-bottom:4px;font-size:1.1em;text-transform:uppercase}\
.role{color:#555;font-size:1.2em;margin-top:4px}dl{display:grid;grid-template-columns:220px 1fr;gap:4px 12px}\
dt{font-weight:bold}dd{margin:0}";

/// Self-contained CV page in the persona's language.
pub fn render_html(persona: &PersonaRecord) -> String {
    let l = labels(persona.language());
    let mut html = String::with_capacity(4096);

    html.push_str("<!DOCTYPE html>\n");
    html.push_str(&format!("<html lang=\"{}\">\n<head>\n", persona.language().code()));
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>{} - {}</title>\n",
        html_escape(&persona.full_name()),
        html_escape(persona.occupation())
    ));
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));

    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&persona.full_name())));
    html.push_str(&format!(
        "<p class=\"role\">{}</p>\n",
        html_escape(persona.occupation())
    ));

    if let Some(summary) = persona.summary() {
        html.push_str(&format!(
            "<h2>{}</h2>\n<p>{}</p>\n",
            l.profile,
            html_escape(summary)
        ));
    }

    html.push_str(&format!("<h2>{}</h2>\n<dl>\n", l.personal));
    push_row(&mut html, l.born, &persona.birth_year().to_string());
    push_row(&mut html, l.age, &persona.age().to_string());
    push_row(
        &mut html,
        l.residence,
        &format!("{}, {} ({})", persona.city(), persona.canton_name(), persona.canton()),
    );
    html.push_str("</dl>\n");

    html.push_str(&format!("<h2>{}</h2>\n<dl>\n", l.experience));
    push_row(&mut html, l.industry, persona.industry());
    if let Some(employer) = persona.employer() {
        push_row(&mut html, l.employer, employer);
    }
    push_row(&mut html, l.years, &persona.years_experience().to_string());
    html.push_str("</dl>\n");

    html.push_str(&format!("<h2>{}</h2>\n<dl>\n", l.contact));
    push_row(&mut html, "E-Mail", persona.email());
    push_row(&mut html, "Tel.", persona.phone());
    html.push_str("</dl>\n</body>\n</html>\n");

    html
}

fn push_row(html: &mut String, label: &str, value: &str) {
    html.push_str(&format!(
        "<dt>{}</dt><dd>{}</dd>\n",
        html_escape(label),
        html_escape(value)
    ));
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

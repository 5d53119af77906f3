use crate::error::Result;
use crate::persona::PersonaRecord;

/// Pretty-printed JSON document with a trailing newline.
pub fn render_json(persona: &PersonaRecord) -> Result<String> {
    let mut body = serde_json::to_string_pretty(persona)?;
    body.push('\n');
    Ok(body)
}

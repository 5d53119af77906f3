//! Phone numbers and e-mail addresses.

use unicode_normalization::UnicodeNormalization;

use super::rng::SampleRng;

/// Swiss mobile prefixes after the +41 country code.
pub const MOBILE_PREFIXES: [&str; 4] = ["76", "77", "78", "79"];

/// Mail providers common in Switzerland.
pub const EMAIL_DOMAINS: [&str; 4] = ["gmx.ch", "bluewin.ch", "sunrise.ch", "gmail.com"];

/// Probability of a numeric suffix on the local part.
const EMAIL_SUFFIX_CHANCE: f64 = 0.10;

/// Swiss mobile number in E.164 form, e.g. `+41791234567`.
pub fn draw_phone(rng: &mut SampleRng) -> String {
    let mut phone = String::with_capacity(12);
    phone.push_str("+41");
    phone.push_str(MOBILE_PREFIXES[rng.index(MOBILE_PREFIXES.len())]);
    for _ in 0..7 {
        let digit = rng.below(10) as u32;
        phone.push(char::from_digit(digit, 10).unwrap_or('0'));
    }
    phone
}

/// `first.last[NN]@domain` built from transliterated names.
pub fn draw_email(rng: &mut SampleRng, first_name: &str, last_name: &str) -> String {
    let mut local = format!(
        "{}.{}",
        non_empty(transliterate(first_name)),
        non_empty(transliterate(last_name))
    );
    if rng.chance(EMAIL_SUFFIX_CHANCE) {
        local.push_str(&(1 + rng.below(99)).to_string());
    }
    let domain = EMAIL_DOMAINS[rng.index(EMAIL_DOMAINS.len())];
    format!("{}@{}", local, domain)
}

/// Lower-case ASCII form of a name for use in addresses.
///
/// German umlauts expand (ä→ae, ö→oe, ü→ue, ß→ss); other diacritics are
/// stripped; anything outside `[a-z0-9-]` is dropped.
pub fn transliterate(name: &str) -> String {
    let mut expanded = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        match c {
            'ä' => expanded.push_str("ae"),
            'ö' => expanded.push_str("oe"),
            'ü' => expanded.push_str("ue"),
            'ß' => expanded.push_str("ss"),
            other => expanded.push(other),
        }
    }

    expanded
        .nfkd()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

fn non_empty(part: String) -> String {
    if part.is_empty() {
        "user".to_string()
    } else {
        part
    }
}

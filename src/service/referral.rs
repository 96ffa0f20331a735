use rand::{distr::Alphanumeric, Rng};

const PREFIX_LEN: usize = 4;
const SUFFIX_LEN: usize = 4;

/// Up to four characters of the name followed by four random ones,
/// all uppercase. Uniqueness is enforced by the database.
pub fn generate_referral_code(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(PREFIX_LEN)
        .collect();

    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();

    format!("{}{}", prefix, suffix).to_uppercase()
}

pub fn generate_referral_link(frontend_url: &str, code: &str) -> String {
    format!("{}/register?ref={}", frontend_url.trim_end_matches('/'), code)
}

use rand::Rng;

/// Six digit phone verification code.
pub fn generate_otp() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}

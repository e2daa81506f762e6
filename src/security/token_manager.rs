//! Masking helpers for the Hex API key
//!
//! The key is held as a `secrecy::SecretString` everywhere it is stored. These
//! helpers cover the two places where it could still leak: log lines and
//! the output `mix` prints back.

use secrecy::{ExposeSecret, SecretString};

/// Environment variable holding the Hex API key
pub const HEX_API_KEY_ENV: &str = "HEX_API_KEY";

/// Masks a token for safe logging
///
/// Shows only the first 3 and last 3 characters for identification purposes.
/// Tokens shorter than 10 bytes are fully masked as "****".
///
/// # Examples
///
/// ```
/// use hex_publisher::security::mask_token;
///
/// assert_eq!(mask_token("abcdef123456"), "abc...456");
/// assert_eq!(mask_token("short"), "****");
/// ```
pub fn mask_token(token: &str) -> String {
    if token.len() < 10 || !token.is_ascii() {
        return "****".to_string();
    }

    let prefix = &token[..3];
    let suffix = &token[token.len() - 3..];
    format!("{}...{}", prefix, suffix)
}

/// Replaces every occurrence of `secret` inside `text` with its masked form
pub fn mask_secret_in(text: &str, secret: &SecretString) -> String {
    let token = secret.expose_secret();
    if token.is_empty() {
        return text.to_string();
    }
    text.replace(token, &mask_token(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("hex_1234567890abcdef"), "hex...def");
        assert_eq!(mask_token("123456789"), "****");
        assert_eq!(mask_token(""), "****");
    }

    #[test]
    fn test_mask_token_non_ascii_is_fully_masked() {
        assert_eq!(mask_token("ключ-ключ-ключ"), "****");
    }

    #[test]
    fn test_mask_secret_in_output() {
        let secret = SecretString::new("hex_1234567890abcdef".into());
        let output = "auth with hex_1234567890abcdef failed (hex_1234567890abcdef)";

        let masked = mask_secret_in(output, &secret);
        assert_eq!(masked, "auth with hex...def failed (hex...def)");
        assert!(!masked.contains("1234567890"));
    }

    #[test]
    fn test_mask_secret_in_with_empty_secret() {
        let secret = SecretString::new("".into());
        assert_eq!(mask_secret_in("unchanged", &secret), "unchanged");
    }
}

//! Short code generation
//!
//! Codes are derived from the origin URL alone, so the same origin always
//! maps to the same code without a storage lookup.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Number of hash bytes kept before encoding
pub const CODE_HASH_BYTES: usize = 16;

/// Length of a generated code (16 bytes, unpadded base64)
pub const CODE_LENGTH: usize = 22;

const MIN_CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator;

impl CodeGenerator {
    pub fn new() -> Self {
        Self
    }

    /// SHA-256 of the origin, truncated to 16 bytes, url-safe base64, lower-cased
    pub fn generate(&self, origin: &str) -> String {
        let digest = Sha256::digest(origin.as_bytes());
        URL_SAFE_NO_PAD
            .encode(&digest[..CODE_HASH_BYTES])
            .to_lowercase()
    }
}

/// 检查短码格式：6-22 位 `[A-Za-z0-9_-]`
pub fn is_valid_code(code: &str) -> bool {
    (MIN_CODE_LENGTH..=CODE_LENGTH).contains(&code.len())
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_deterministic() {
        let generator = CodeGenerator::new();
        let a = generator.generate("https://example.com");
        let b = generator.generate("https://example.com");
        assert_eq!(a, b);
        assert_ne!(a, generator.generate("https://example.org"));
    }

    #[test]
    fn test_generated_code_shape() {
        let code = CodeGenerator.generate("https://example.com/some/long/path?x=1");
        assert_eq!(code.len(), CODE_LENGTH);
        assert_eq!(code, code.to_lowercase());
        assert!(is_valid_code(&code));
    }

    #[test]
    fn test_generate_matches_reference_digest() {
        // sha256("") = e3b0c442 98fc1c14 9afbf4c8 996fb924 ...
        let expected = URL_SAFE_NO_PAD
            .encode([
                0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99,
                0x6f, 0xb9, 0x24,
            ])
            .to_lowercase();
        assert_eq!(CodeGenerator.generate(""), expected);
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("abc123"));
        assert!(is_valid_code("a-b_c-d_e"));
        assert!(!is_valid_code("abc"));
        assert!(!is_valid_code("abc/123"));
        assert!(!is_valid_code("abc.123"));
        assert!(!is_valid_code(&"a".repeat(23)));
    }
}

//! Tokenizer resolution.
//!
//! The BPE machinery itself lives in `tiktoken-rs`; this module only decides
//! which encoding to load. Exactly one of encoding name or model name must be
//! supplied, and encoding wins if a caller manages to set both.

use tiktoken_rs::CoreBPE;

use crate::types::{Result, TokengateError};

/// Opaque token-counting capability.
pub trait Tokenizer: Send {
    fn count(&self, text: &str) -> usize;
}

struct TiktokenTokenizer {
    bpe: CoreBPE,
}

impl Tokenizer for TiktokenTokenizer {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Resolve a tokenizer from an encoding name (e.g. `cl100k_base`) or a model
/// name (e.g. `gpt-4`). Fails fast if neither is supplied or the name is
/// unknown; callers must abort initialization on error.
pub fn resolve(encoding: Option<&str>, model: Option<&str>) -> Result<Box<dyn Tokenizer>> {
    let encoding = encoding.filter(|s| !s.is_empty());
    let model = model.filter(|s| !s.is_empty());

    let bpe = match (encoding, model) {
        (Some(name), _) => by_encoding(name)?,
        (None, Some(name)) => tiktoken_rs::get_bpe_from_model(name)
            .map_err(|e| TokengateError::Resolution(format!("unknown model {}: {}", name, e)))?,
        (None, None) => {
            return Err(TokengateError::Config(
                "either an encoding or a model name must be provided".to_string(),
            ))
        }
    };

    Ok(Box::new(TiktokenTokenizer { bpe }))
}

fn by_encoding(name: &str) -> Result<CoreBPE> {
    let loaded = match name {
        "o200k_base" => tiktoken_rs::o200k_base(),
        "cl100k_base" => tiktoken_rs::cl100k_base(),
        "p50k_base" => tiktoken_rs::p50k_base(),
        "p50k_edit" => tiktoken_rs::p50k_edit(),
        "r50k_base" => tiktoken_rs::r50k_base(),
        other => {
            return Err(TokengateError::Resolution(format!(
                "unknown encoding: {}",
                other
            )))
        }
    };
    loaded.map_err(|e| TokengateError::Resolution(format!("failed to load {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neither_encoding_nor_model_is_a_config_error() {
        assert!(matches!(
            resolve(None, None),
            Err(TokengateError::Config(_))
        ));
        // Empty strings count as absent.
        assert!(matches!(
            resolve(Some(""), Some("")),
            Err(TokengateError::Config(_))
        ));
    }

    #[test]
    fn unknown_names_are_resolution_errors() {
        assert!(matches!(
            resolve(Some("zz999_base"), None),
            Err(TokengateError::Resolution(_))
        ));
        assert!(matches!(
            resolve(None, Some("not-a-model")),
            Err(TokengateError::Resolution(_))
        ));
    }

    #[test]
    fn encoding_takes_priority_over_model() {
        // The bogus model name must never be consulted.
        let tok = resolve(Some("cl100k_base"), Some("not-a-model")).unwrap();
        assert_eq!(tok.count(""), 0);
        assert!(tok.count("Hello, world!") > 0);
    }

    #[test]
    fn resolves_by_model_name() {
        let by_model = resolve(None, Some("gpt-4")).unwrap();
        let by_encoding = resolve(Some("cl100k_base"), None).unwrap();
        let text = "The quick brown fox jumps over the lazy dog";
        assert_eq!(by_model.count(text), by_encoding.count(text));
    }
}

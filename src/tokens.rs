use tiktoken_rs::CoreBPE;

use crate::error::{AppError, Result};

/// Token counting and prefix truncation under `cl100k_base`.
pub struct Truncator {
    bpe: CoreBPE,
}

impl Truncator {
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| AppError::ConfigError(format!("failed to load cl100k_base: {e}")))?;
        Ok(Self { bpe })
    }

    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Keeps the longest token prefix of `text` that decodes cleanly and
    /// re-encodes to at most `max_tokens` tokens.
    pub fn truncate(&self, text: &str, max_tokens: usize) -> String {
        let tokens = self.bpe.encode_ordinary(text);
        if tokens.len() <= max_tokens {
            return text.to_string();
        }

        // A cut can split a multi-byte character, and a decoded prefix can
        // merge differently on re-encode. Back off until both hold.
        let mut limit = max_tokens;
        while limit > 0 {
            if let Ok(candidate) = self.bpe.decode(tokens[..limit].to_vec()) {
                if self.count(&candidate) <= max_tokens {
                    return candidate;
                }
            }
            limit -= 1;
        }
        String::new()
    }
}

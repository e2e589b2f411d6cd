use crate::Generator;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use shortlink_core::shortcode::{MAX_LENGTH, MIN_LENGTH};
use shortlink_core::{CoreError, ShortCode};

/// Length of codes produced by [`RandomGenerator::new`].
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Generates fixed-length codes from the base64url alphabet.
///
/// Every code is drawn from the thread-local CSPRNG, so codes carry no
/// sequence information and cannot be guessed from earlier ones.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    pub fn new() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
        }
    }

    /// Creates a generator producing codes of `length` characters.
    pub fn with_length(length: usize) -> Result<Self, CoreError> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(CoreError::InvalidShortCode(format!(
                "code length must be between {MIN_LENGTH} and {MAX_LENGTH}, got {length}"
            )));
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        // n bytes encode to at least n base64 characters
        let mut bytes = vec![0u8; self.length];
        rand::rng().fill_bytes(&mut bytes);

        let mut encoded = URL_SAFE_NO_PAD.encode(&bytes);
        encoded.truncate(self.length);
        ShortCode::new_unchecked(encoded)
    }
}

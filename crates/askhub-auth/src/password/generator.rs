//! Random password generation for the reset flow.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;

use askhub_core::config::AuthConfig;
use askhub_core::error::AppError;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Produces strong random passwords from the OS entropy source.
#[derive(Debug, Clone)]
pub struct PasswordGenerator {
    length: usize,
    min_digits: usize,
    alphabet: Vec<u8>,
}

impl PasswordGenerator {
    /// Creates a generator; fails if `length` cannot hold the required characters.
    pub fn new(length: usize, min_digits: usize) -> Result<Self, AppError> {
        if min_digits + 1 > length {
            return Err(AppError::configuration(format!(
                "a {length}-character password cannot hold {min_digits} digits and a symbol"
            )));
        }

        let alphabet = [LETTERS, DIGITS, PUNCTUATION].concat();
        Ok(Self {
            length,
            min_digits,
            alphabet,
        })
    }

    /// Creates a generator from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        Self::new(
            config.generated_password_length,
            config.generated_password_min_digits,
        )
    }

    /// Draw candidates until one has enough digits and a punctuation mark.
    pub fn generate(&self) -> String {
        let mut rng = OsRng;
        loop {
            let candidate: Vec<u8> = (0..self.length)
                .filter_map(|_| self.alphabet.choose(&mut rng).copied())
                .collect();

            let digits = candidate.iter().filter(|c| c.is_ascii_digit()).count();
            let has_symbol = candidate.iter().any(|c| c.is_ascii_punctuation());

            if digits >= self.min_digits && has_symbol {
                return candidate.into_iter().map(char::from).collect();
            }
        }
    }
}

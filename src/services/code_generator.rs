//! Short code generation with bounded collision retries.
//!
//! Codes are sampled uniformly from a 62-symbol alphabet and checked against
//! a [`CodeLookup`] (usually a store's `exists_by_code`). The lookup is only a
//! pre-check: the UNIQUE index on the code column stays the authority, see
//! `collection_service::insert_with_fresh_code` for the insert-time retry.

use async_trait::async_trait;
use rand::{
    Rng,
    distributions::{Distribution, Uniform},
};
use thiserror::Error;
use tracing::debug;

/// Symbols a code may contain: `a-z`, `A-Z`, `0-9`.
pub const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_CODE_LENGTH: i64 = 6;
/// Longest code the schema accepts.
pub const MAX_CODE_LENGTH: i64 = 11;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_PERSIST_ATTEMPTS: u32 = 3;

/// Answers whether a candidate code is already in use.
#[async_trait]
pub trait CodeLookup: Send + Sync {
    type Error: Send;

    async fn exists_by_code(&self, code: &str) -> Result<bool, Self::Error>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodeGenerationError<E> {
    #[error("code length must not be negative, got {0}")]
    InvalidLength(i64),
    #[error("failed to generate a free code after {0} attempts")]
    Exhausted(u32),
    #[error("code lookup failed: {0}")]
    Lookup(E),
}

/// Stateless generator; the only knob is the attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeGenerator {
    max_attempts: u32,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl CodeGenerator {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Generate a code that `lookup` reports as free, using a freshly seeded RNG.
    ///
    /// The create paths seed their own RNG and call
    /// [`generate_with_rng`](Self::generate_with_rng) directly.
    #[cfg(test)]
    pub async fn generate<L>(
        &self,
        length: i64,
        lookup: &L,
    ) -> Result<String, CodeGenerationError<L::Error>>
    where
        L: CodeLookup + ?Sized,
    {
        use rand::{SeedableRng, rngs::StdRng};

        let mut rng = StdRng::from_entropy();
        self.generate_with_rng(length, lookup, &mut rng).await
    }

    /// Draw candidates from `rng` until `lookup` reports one as free.
    ///
    /// A negative `length` fails before anything is sampled or looked up.
    /// `lookup` is called exactly once per attempt and its errors are
    /// returned as-is inside [`CodeGenerationError::Lookup`].
    pub async fn generate_with_rng<L, R>(
        &self,
        length: i64,
        lookup: &L,
        rng: &mut R,
    ) -> Result<String, CodeGenerationError<L::Error>>
    where
        L: CodeLookup + ?Sized,
        R: Rng + Send + ?Sized,
    {
        let length =
            usize::try_from(length).map_err(|_| CodeGenerationError::InvalidLength(length))?;

        for attempt in 1..=self.max_attempts {
            let code = sample_code(rng, length);
            let taken = lookup
                .exists_by_code(&code)
                .await
                .map_err(CodeGenerationError::Lookup)?;
            if !taken {
                return Ok(code);
            }
            debug!(attempt, code = %code, "generated code already taken");
        }

        Err(CodeGenerationError::Exhausted(self.max_attempts))
    }
}

/// Draw `length` symbols from [`ALPHABET`].
///
/// `Uniform` rejection-samples, so every symbol is equally likely.
pub fn sample_code<R>(rng: &mut R, length: usize) -> String
where
    R: Rng + ?Sized,
{
    let index = Uniform::from(0..ALPHABET.len());
    (0..length)
        .map(|_| char::from(ALPHABET[index.sample(rng)]))
        .collect()
}

/// Code length and retry budgets used by the create paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSettings {
    pub length: i64,
    pub generator: CodeGenerator,
    /// How many fresh codes to try when the insert itself hits the UNIQUE index.
    pub persist_attempts: u32,
}

impl Default for CodeSettings {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
            generator: CodeGenerator::default(),
            persist_attempts: DEFAULT_PERSIST_ATTEMPTS,
        }
    }
}

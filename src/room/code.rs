//! Short shareable room codes, e.g. `abc-XYZ`.

use std::sync::Arc;

use rand::{rngs::OsRng, RngCore};

use crate::store::{RecordStore, StoreError};

pub const ALPHABET: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const CODE_LEN: usize = 7;
pub const DASH_AT: usize = 3;
pub const MAX_ATTEMPTS: u32 = 10;

// Largest multiple of the alphabet size that fits in a byte; bytes at or
// above it are discarded so every letter is equally likely.
const ACCEPT_BELOW: u8 = 208;

#[derive(thiserror::Error, Debug)]
#[error("random source failed: {0}")]
pub struct SourceError(String);

impl From<rand::Error> for SourceError {
    fn from(err: rand::Error) -> Self {
        SourceError(err.to_string())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("no unique room code after {attempts} attempts ({collisions} collisions, {failures} failures)")]
pub struct ExhaustionError {
    pub attempts: u32,
    pub collisions: u32,
    pub failures: u32,
}

/// Produces candidate codes.
pub trait CodeSource: Send + Sync {
    fn draw(&self) -> Result<String, SourceError>;
}

/// Candidates from the operating system's CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsCodeSource;

impl CodeSource for OsCodeSource {
    fn draw(&self) -> Result<String, SourceError> {
        draw_code(&mut OsRng)
    }
}

/// Draw one code from `rng`: six uniform letters with a dash at index 3.
pub fn draw_code<R: RngCore + ?Sized>(rng: &mut R) -> Result<String, SourceError> {
    let mut code = String::with_capacity(CODE_LEN);
    let mut buf = [0u8; 16];
    while code.len() < CODE_LEN {
        rng.try_fill_bytes(&mut buf)?;
        for &b in buf.iter().filter(|&&b| b < ACCEPT_BELOW) {
            if code.len() == DASH_AT {
                code.push('-');
            }
            if code.len() == CODE_LEN {
                break;
            }
            code.push(char::from(ALPHABET[usize::from(b) % ALPHABET.len()]));
        }
    }
    Ok(code)
}

pub fn is_room_code(s: &str) -> bool {
    s.len() == CODE_LEN
        && s.bytes().enumerate().all(|(i, b)| if i == DASH_AT { b == b'-' } else { b.is_ascii_alphabetic() })
}

/// Generate-and-check with bounded retry against the record store.
pub struct RoomCodeGenerator<S = OsCodeSource> {
    store: Arc<dyn RecordStore>,
    source: S,
}

impl RoomCodeGenerator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_source(store, OsCodeSource)
    }
}

impl<S: CodeSource> RoomCodeGenerator<S> {
    pub fn with_source(store: Arc<dyn RecordStore>, source: S) -> Self {
        Self { store, source }
    }

    /// Returns the first candidate no stored room uses. A source failure or
    /// store error costs an attempt but does not end the loop.
    pub fn generate(&self) -> Result<String, ExhaustionError> {
        let mut collisions = 0;
        let mut failures = 0;
        for attempt in 1..=MAX_ATTEMPTS {
            let candidate = match self.source.draw() {
                Ok(candidate) => candidate,
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "room code draw failed");
                    failures += 1;
                    continue;
                }
            };
            match self.store.find_room_by_code(&candidate) {
                Err(StoreError::NotFound) => {
                    tracing::debug!(attempt, room_code = %candidate, "room code issued");
                    return Ok(candidate);
                }
                Ok(_) => {
                    tracing::debug!(attempt, room_code = %candidate, "room code collision");
                    collisions += 1;
                }
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "room lookup failed");
                    failures += 1;
                }
            }
        }
        let err = ExhaustionError { attempts: MAX_ATTEMPTS, collisions, failures };
        tracing::error!(%err, "room code generation exhausted");
        Err(err)
    }
}

//! Explicit success/skip outcomes for expected failure classes.
//!
//! Working with noisy media sources makes "nothing usable here" a frequent,
//! non-exceptional result. `Outcome` keeps those results distinguishable at
//! call sites — not found, rejected by validation, retries exhausted — where
//! a bare `Option` would collapse them all into `None`.

use std::fmt;

/// Why an operation produced no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The resource does not exist or is permanently unreachable; no amount
    /// of waiting helps.
    NotFound,
    /// A validation gate rejected the result (oversized payload, wrong
    /// format, degenerate input).
    Rejected(String),
    /// Every retry attempt failed with a transient error.
    Exhausted { attempts: u32 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Rejected(why) => write!(f, "rejected: {why}"),
            Self::Exhausted { attempts } => {
                write!(f, "exhausted after {attempts} attempts")
            }
        }
    }
}

/// Result of an operation whose expected failures are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Ok(T),
    Skipped(SkipReason),
}

impl<T> Outcome<T> {
    /// Success value, discarding the skip reason.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Skipped(_) => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Skipped(SkipReason::Rejected(reason.into()))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ok(value) => Outcome::Ok(f(value)),
            Self::Skipped(reason) => Outcome::Skipped(reason),
        }
    }

    /// Chain a fallible transformation, preserving the original skip reason.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Ok(value) => f(value),
            Self::Skipped(reason) => Outcome::Skipped(reason),
        }
    }
}

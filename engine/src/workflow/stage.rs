//! Stage outcome type
//!
//! Every workflow stage declares its contract through [`Staged`]: it
//! either produced its artifact (`Ready`) or was skipped because an
//! upstream dependency produced nothing (`Skipped`). Expected business
//! failure is always `Skipped`; `Err` is reserved for unexpected faults
//! and short-circuits the whole run.

use std::future::Future;

/// Outcome of one workflow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staged<T> {
    /// The stage ran and produced its value
    Ready(T),

    /// An upstream dependency was missing; the stage did not run
    Skipped,
}

impl<T> Staged<T> {
    /// Lift an invoker result: a produced artifact is `Ready`, an
    /// empty result is `Skipped`.
    pub fn from_option(option: Option<T>) -> Self {
        match option {
            Some(value) => Self::Ready(value),
            None => Self::Skipped,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// The produced value, if any
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Skipped => None,
        }
    }

    /// Borrowing view of the outcome
    pub fn as_ref(&self) -> Staged<&T> {
        match self {
            Self::Ready(value) => Staged::Ready(value),
            Self::Skipped => Staged::Skipped,
        }
    }

    /// Transform the produced value, preserving a skip
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Staged<U> {
        match self {
            Self::Ready(value) => Staged::Ready(f(value)),
            Self::Skipped => Staged::Skipped,
        }
    }

    /// Chain a stage that needs this stage's value
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Staged<U>) -> Staged<U> {
        match self {
            Self::Ready(value) => f(value),
            Self::Skipped => Staged::Skipped,
        }
    }

    /// Chain an async, fallible stage that needs this stage's value.
    ///
    /// A skip propagates without running the stage; stage faults
    /// propagate as `Err`.
    pub async fn and_then_stage<U, E, F, Fut>(self, f: F) -> Result<Staged<U>, E>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<Staged<U>, E>>,
    {
        match self {
            Self::Ready(value) => f(value).await,
            Self::Skipped => Ok(Staged::Skipped),
        }
    }

    /// Combine two outcomes; `Ready` only when both are
    pub fn zip<U>(self, other: Staged<U>) -> Staged<(T, U)> {
        match (self, other) {
            (Self::Ready(a), Staged::Ready(b)) => Staged::Ready((a, b)),
            _ => Staged::Skipped,
        }
    }
}

impl<T> From<Option<T>> for Staged<T> {
    fn from(option: Option<T>) -> Self {
        Self::from_option(option)
    }
}

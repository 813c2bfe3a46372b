//! The three-outcome result produced by every decoder.

use std::convert::Infallible;

/// Outcome of running a decoder.
///
/// `X` is the payload of [`DecodeResult::NotMatched`]. Entity decoders use a
/// `String` diagnostic there; every other kind of decoder uses
/// [`Infallible`], so the compiler knows they can only match or fail.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeResult<X, A> {
    /// The decoder applied and produced a value.
    Matched(A),
    /// The decoder applied but the data was wrong.
    Failed(String),
    /// The decoder does not apply to this input; another one might.
    NotMatched(X),
}

impl<X, A> DecodeResult<X, A> {
    /// Transform a matched value.
    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> DecodeResult<X, B> {
        match self {
            DecodeResult::Matched(value) => DecodeResult::Matched(f(value)),
            DecodeResult::Failed(message) => DecodeResult::Failed(message),
            DecodeResult::NotMatched(diagnostic) => DecodeResult::NotMatched(diagnostic),
        }
    }

    /// Combine two results, left-biased.
    ///
    /// If `self` did not match, its outcome wins and `other` is ignored.
    /// Otherwise `other` decides: a match is combined with `f`, a failure or
    /// non-match is passed through.
    pub fn map2<B, C>(self, other: DecodeResult<X, B>, f: impl FnOnce(A, B) -> C) -> DecodeResult<X, C> {
        match self {
            DecodeResult::Matched(left) => other.map(|right| f(left, right)),
            DecodeResult::Failed(message) => DecodeResult::Failed(message),
            DecodeResult::NotMatched(diagnostic) => DecodeResult::NotMatched(diagnostic),
        }
    }

    /// Whether this is [`DecodeResult::Matched`].
    pub fn is_matched(&self) -> bool {
        matches!(self, DecodeResult::Matched(_))
    }
}

impl<A> DecodeResult<Infallible, A> {
    /// Convert to a plain `Result`; there is no non-match case to lose.
    pub fn into_result(self) -> Result<A, String> {
        match self {
            DecodeResult::Matched(value) => Ok(value),
            DecodeResult::Failed(message) => Err(message),
            DecodeResult::NotMatched(never) => match never {},
        }
    }

    /// Reinterpret under any non-match payload type.
    pub fn lift<X>(self) -> DecodeResult<X, A> {
        match self {
            DecodeResult::Matched(value) => DecodeResult::Matched(value),
            DecodeResult::Failed(message) => DecodeResult::Failed(message),
            DecodeResult::NotMatched(never) => match never {},
        }
    }
}

impl<A> DecodeResult<String, A> {
    /// Turn a non-match into a failure carrying its diagnostic.
    ///
    /// Used wherever there is no other candidate left to try.
    pub fn commit(self) -> DecodeResult<Infallible, A> {
        match self {
            DecodeResult::Matched(value) => DecodeResult::Matched(value),
            DecodeResult::Failed(message) | DecodeResult::NotMatched(message) => {
                DecodeResult::Failed(message)
            }
        }
    }
}

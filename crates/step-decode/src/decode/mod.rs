//! Decoder combinators.
//!
//! A [`Decoder`] is a pure function from some input (a whole [`File`], an
//! [`Entity`], an attribute list or a single [`Attribute`]) to a
//! [`DecodeResult`]. Decoders are built from the primitives in this module
//! and composed with [`map2`]..[`map8`], [`and_then`] and friends.
//!
//! ```
//! use step_decode::decode::{self, EntityDecoder};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point(f64, f64, f64);
//!
//! fn point() -> EntityDecoder<Point> {
//!     decode::entity(
//!         "POINT",
//!         decode::map3(
//!             Point,
//!             decode::attribute(0, decode::float()),
//!             decode::attribute(1, decode::float()),
//!             decode::attribute(2, decode::float()),
//!         ),
//!     )
//! }
//!
//! let text = "ISO-10303-21; HEADER; ENDSEC; DATA; #1 = POINT(1., 2., 3.); ENDSEC; END-ISO-10303-21;";
//! let p = decode::file(&decode::single(point()), text).unwrap();
//! assert_eq!(p, Point(1.0, 2.0, 3.0));
//! ```
//!
//! Decoders are cheap to clone and can be shared between threads.

use std::cell::RefCell;
use std::convert::Infallible;
use std::sync::Arc;

use crate::model::{Attribute, Entity, EntityId, File};

mod aggregate;
mod attribute;
mod entity;
mod result;

pub use aggregate::{all, file, file_with, header, header_entity, run_file, single};
pub use attribute::{
    attribute, bool, derived, enumeration, float, int, list, null, optional, reference_to,
    string, tuple2, tuple3, typed,
};
pub use entity::{entity, one_of};
pub use result::DecodeResult;

type RunFn<I, X, A> = dyn Fn(&File, &I) -> DecodeResult<X, A> + Send + Sync;

/// A reusable, stateless decoder from `I` to `A`.
///
/// `X` is the non-match payload: `String` for entity decoders and
/// [`Infallible`] for everything else. The [`File`] is passed alongside the
/// input so that references can be followed.
pub struct Decoder<I: ?Sized, X, A> {
    run: Arc<RunFn<I, X, A>>,
}

/// Decodes a whole file.
pub type FileDecoder<A> = Decoder<File, Infallible, A>;
/// Decodes a single entity; may report that the entity is of another type.
pub type EntityDecoder<A> = Decoder<Entity, String, A>;
/// Decodes the attribute list of one entity record.
pub type ListDecoder<A> = Decoder<[Attribute], Infallible, A>;
/// Decodes one attribute value.
pub type AttributeDecoder<A> = Decoder<Attribute, Infallible, A>;

impl<I: ?Sized, X, A> Clone for Decoder<I, X, A> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<I: ?Sized + 'static, X: 'static, A: 'static> Decoder<I, X, A> {
    /// Wrap a decoding function.
    pub fn new(run: impl Fn(&File, &I) -> DecodeResult<X, A> + Send + Sync + 'static) -> Self {
        Self { run: Arc::new(run) }
    }

    /// Run the decoder against `input`, looking up references in `file`.
    pub fn run(&self, file: &File, input: &I) -> DecodeResult<X, A> {
        (self.run)(file, input)
    }

    /// Transform the decoded value.
    pub fn map<B: 'static>(self, f: impl Fn(A) -> B + Send + Sync + 'static) -> Decoder<I, X, B> {
        Decoder::new(move |file, input| self.run(file, input).map(&f))
    }

    /// Decode a value, then pick the next decoder based on it.
    ///
    /// The follow-up decoder runs against the same input. It cannot report
    /// a non-match: once the first decoder matched, the choice is committed.
    pub fn and_then<B: 'static>(
        self,
        f: impl Fn(A) -> Decoder<I, Infallible, B> + Send + Sync + 'static,
    ) -> Decoder<I, X, B> {
        Decoder::new(move |file, input| match self.run(file, input) {
            DecodeResult::Matched(value) => f(value).run(file, input).lift(),
            DecodeResult::Failed(message) => DecodeResult::Failed(message),
            DecodeResult::NotMatched(diagnostic) => DecodeResult::NotMatched(diagnostic),
        })
    }
}

/// Always match with `value`.
pub fn succeed<I, X, A>(value: A) -> Decoder<I, X, A>
where
    I: ?Sized + 'static,
    X: 'static,
    A: Clone + Send + Sync + 'static,
{
    Decoder::new(move |_, _| DecodeResult::Matched(value.clone()))
}

/// Always fail with `message`.
pub fn fail<I, X, A>(message: impl Into<String>) -> Decoder<I, X, A>
where
    I: ?Sized + 'static,
    X: 'static,
    A: 'static,
{
    let message = message.into();
    Decoder::new(move |_, _| DecodeResult::Failed(message.clone()))
}

/// Transform the value produced by `decoder`.
pub fn map<I, X, A, B>(f: impl Fn(A) -> B + Send + Sync + 'static, decoder: Decoder<I, X, A>) -> Decoder<I, X, B>
where
    I: ?Sized + 'static,
    X: 'static,
    A: 'static,
    B: 'static,
{
    decoder.map(f)
}

/// Run `decoder`, then run the decoder returned by `f` on the same input.
pub fn and_then<I, X, A, B>(
    f: impl Fn(A) -> Decoder<I, Infallible, B> + Send + Sync + 'static,
    decoder: Decoder<I, X, A>,
) -> Decoder<I, X, B>
where
    I: ?Sized + 'static,
    X: 'static,
    A: 'static,
    B: 'static,
{
    decoder.and_then(f)
}

/// Build the decoder only when it is run.
///
/// Needed for recursive schemas, where a decoder refers to itself through
/// [`reference_to`].
pub fn lazy<I, X, A>(thunk: impl Fn() -> Decoder<I, X, A> + Send + Sync + 'static) -> Decoder<I, X, A>
where
    I: ?Sized + 'static,
    X: 'static,
    A: 'static,
{
    Decoder::new(move |file, input| thunk().run(file, input))
}

thread_local! {
    /// Entities being decoded on this thread, outermost first.
    static ACTIVE: RefCell<Vec<EntityId>> = const { RefCell::new(Vec::new()) };
}

/// Pops the innermost active entity when dropped.
struct Leave;

impl Drop for Leave {
    fn drop(&mut self) {
        ACTIVE.with(|active| {
            active.borrow_mut().pop();
        });
    }
}

/// Run `decode` with entity `id` marked as active.
///
/// Entering an entity that is already active fails instead of recursing.
/// Entities reached twice along separate paths are not affected.
pub(crate) fn visiting<X, A>(
    id: EntityId,
    decode: impl FnOnce() -> DecodeResult<X, A>,
) -> DecodeResult<X, A> {
    let entered = ACTIVE.with(|active| {
        let mut active = active.borrow_mut();
        if active.contains(&id) {
            return false;
        }
        active.push(id);
        true
    });
    if !entered {
        return DecodeResult::Failed(format!("Reference cycle through #{id}"));
    }
    let _leave = Leave;
    decode()
}

/// Run `decoder` and return early from the enclosing closure unless it matched.
macro_rules! matched_or_return {
    ($result:expr) => {
        match $result {
            DecodeResult::Matched(value) => value,
            DecodeResult::Failed(message) => return DecodeResult::Failed(message),
            DecodeResult::NotMatched(diagnostic) => return DecodeResult::NotMatched(diagnostic),
        }
    };
}

pub(crate) use matched_or_return;

macro_rules! define_map_n {
    ($(#[$doc:meta])* $name:ident => $($arg:ident: $ty:ident),+) => {
        $(#[$doc])*
        #[allow(clippy::too_many_arguments)]
        pub fn $name<I, X, $($ty,)+ R>(
            f: impl Fn($($ty),+) -> R + Send + Sync + 'static,
            $($arg: Decoder<I, X, $ty>,)+
        ) -> Decoder<I, X, R>
        where
            I: ?Sized + 'static,
            X: 'static,
            $($ty: 'static,)+
            R: 'static,
        {
            Decoder::new(move |file, input| {
                $(let $arg = matched_or_return!($arg.run(file, input));)+
                DecodeResult::Matched(f($($arg),+))
            })
        }
    };
}

define_map_n! {
    /// Combine two decoders run against the same input.
    ///
    /// Decoders run left to right; the first one that does not match
    /// decides the outcome and the rest are skipped.
    map2 => a: T1, b: T2
}
define_map_n! {
    /// Combine three decoders; see [`map2`].
    map3 => a: T1, b: T2, c: T3
}
define_map_n! {
    /// Combine four decoders; see [`map2`].
    map4 => a: T1, b: T2, c: T3, d: T4
}
define_map_n! {
    /// Combine five decoders; see [`map2`].
    map5 => a: T1, b: T2, c: T3, d: T4, e: T5
}
define_map_n! {
    /// Combine six decoders; see [`map2`].
    map6 => a: T1, b: T2, c: T3, d: T4, e: T5, g: T6
}
define_map_n! {
    /// Combine seven decoders; see [`map2`].
    map7 => a: T1, b: T2, c: T3, d: T4, e: T5, g: T6, h: T7
}
define_map_n! {
    /// Combine eight decoders; see [`map2`].
    map8 => a: T1, b: T2, c: T3, d: T4, e: T5, g: T6, h: T7, k: T8
}

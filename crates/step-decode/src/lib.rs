#![warn(missing_docs)]

//! Typed decoding of STEP exchange files (ISO 10303-21).
//!
//! A STEP file is parsed and its references checked into a [`File`], an
//! arena of numbered entities. Decoders built with the combinators in
//! [`decode`] then walk that graph and produce application values.
//! The [`schema`] module has decoders for common geometry, topology and
//! header entities.
//!
//! # Example
//!
//! ```
//! use step_decode::{decode, schema};
//!
//! let text = "ISO-10303-21;
//! HEADER;
//! ENDSEC;
//! DATA;
//! #1 = CARTESIAN_POINT('', (0.0, 0.0, 0.0));
//! #2 = CARTESIAN_POINT('', (1.0, 2.0, 3.0));
//! ENDSEC;
//! END-ISO-10303-21;";
//!
//! let points = decode::file(&decode::all(schema::cartesian_point()), text).unwrap();
//! assert_eq!(points[1].z, 3.0);
//! ```

pub mod decode;
mod error;
mod escape;
mod lexer;
mod model;
mod parser;
mod resolve;
pub mod schema;

pub use error::StepError;
pub use escape::{decode_string, InvalidString};
pub use model::{Attribute, Entity, EntityId, EntityRecord, File, Header, TypeName};
pub use parser::{parse, RawFile};
pub use resolve::{parse_and_resolve, resolve, CyclePolicy, ResolveOptions};

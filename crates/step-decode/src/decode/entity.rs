//! Entity decoders: type matching and alternatives.

use super::{DecodeResult, EntityDecoder, ListDecoder};
use crate::model::{Entity, TypeName};

/// Decode entities of type `type_name` with `attributes`.
///
/// For a complex entity the first record of that type is decoded; later
/// records with the same type are never looked at. Entities of other types
/// produce [`DecodeResult::NotMatched`].
pub fn entity<A: 'static>(type_name: impl Into<TypeName>, attributes: ListDecoder<A>) -> EntityDecoder<A> {
    let type_name = type_name.into();
    EntityDecoder::new(move |file, entity| {
        match entity.records().iter().find(|record| record.type_name == type_name) {
            Some(record) => attributes.run(file, &record.attributes).lift(),
            None => DecodeResult::NotMatched(match entity {
                Entity::Simple(record) => {
                    format!("Expected entity of type {type_name}, found {}", record.type_name)
                }
                Entity::Complex(_) => format!(
                    "Expected entity of type {type_name}, found complex entity {}",
                    entity.describe_type()
                ),
            }),
        }
    })
}

/// Try each decoder in turn.
///
/// The first match wins. A failure means the entity had the right type but
/// bad data, so it is returned at once without trying the rest. If nothing
/// matches, the non-match diagnostics are joined with `" | "`, in order.
pub fn one_of<A: 'static>(decoders: Vec<EntityDecoder<A>>) -> EntityDecoder<A> {
    EntityDecoder::new(move |file, entity| {
        let mut diagnostics = Vec::with_capacity(decoders.len());
        for decoder in &decoders {
            match decoder.run(file, entity) {
                DecodeResult::NotMatched(diagnostic) => diagnostics.push(diagnostic),
                outcome => return outcome,
            }
        }
        if diagnostics.is_empty() {
            return DecodeResult::NotMatched(format!(
                "No alternatives to try for entity of type {}",
                entity.describe_type()
            ));
        }
        DecodeResult::NotMatched(diagnostics.join(" | "))
    })
}

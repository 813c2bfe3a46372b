//! Decoders for attribute lists and single attribute values.

use std::convert::Infallible;

use super::{matched_or_return, visiting, AttributeDecoder, DecodeResult, EntityDecoder, ListDecoder};
use crate::escape::decode_string;
use crate::model::{Attribute, TypeName};

fn failed<A>(message: impl Into<String>) -> DecodeResult<Infallible, A> {
    DecodeResult::Failed(message.into())
}

/// Decode the attribute at `index` (0-based) of an entity record.
pub fn attribute<A: 'static>(index: usize, decoder: AttributeDecoder<A>) -> ListDecoder<A> {
    ListDecoder::new(move |file, attributes| match attributes.get(index) {
        Some(value) => decoder.run(file, value),
        None => failed(format!("No attribute at index {index}")),
    })
}

/// Decode a logical (`.T.` / `.F.`).
pub fn bool() -> AttributeDecoder<bool> {
    AttributeDecoder::new(|_, attribute| match attribute {
        Attribute::Bool(value) => DecodeResult::Matched(*value),
        _ => failed("Expected a bool"),
    })
}

/// Decode an integer.
pub fn int() -> AttributeDecoder<i64> {
    AttributeDecoder::new(|_, attribute| match attribute {
        Attribute::Int(value) => DecodeResult::Matched(*value),
        _ => failed("Expected an int"),
    })
}

/// Decode a real number. Integers are not accepted.
pub fn float() -> AttributeDecoder<f64> {
    AttributeDecoder::new(|_, attribute| match attribute {
        Attribute::Float(value) => DecodeResult::Matched(*value),
        _ => failed("Expected a float"),
    })
}

/// Decode a string literal, resolving its escape sequences.
pub fn string() -> AttributeDecoder<String> {
    AttributeDecoder::new(|_, attribute| match attribute {
        Attribute::String(raw) => match decode_string(raw) {
            Ok(text) => DecodeResult::Matched(text),
            Err(err) => failed(err.to_string()),
        },
        _ => failed("Expected a string"),
    })
}

/// Decode an enumeration literal such as `.UNSPECIFIED.` to its upper-case name.
///
/// `.T.` and `.F.` are logicals, decode them with [`bool`].
pub fn enumeration() -> AttributeDecoder<String> {
    AttributeDecoder::new(|_, attribute| match attribute {
        Attribute::Enum(name) => DecodeResult::Matched(name.clone()),
        _ => failed("Expected an enum"),
    })
}

/// Decode an inline typed parameter, e.g. `LENGTH_MEASURE(2.5)`.
pub fn typed<A: 'static>(type_name: impl Into<TypeName>, decoder: AttributeDecoder<A>) -> AttributeDecoder<A> {
    let type_name = type_name.into();
    AttributeDecoder::new(move |file, attribute| match attribute {
        Attribute::Typed(name, inner) if *name == type_name => decoder.run(file, inner),
        Attribute::Typed(name, _) => failed(format!("Expected a {type_name} value, found {name}")),
        _ => failed(format!("Expected a {type_name} value")),
    })
}

/// Decode every element of a list with `item`, in order.
pub fn list<A: 'static>(item: AttributeDecoder<A>) -> AttributeDecoder<Vec<A>> {
    AttributeDecoder::new(move |file, attribute| match attribute {
        Attribute::List(elements) => {
            let mut values = Vec::with_capacity(elements.len());
            for element in elements {
                values.push(matched_or_return!(item.run(file, element)));
            }
            DecodeResult::Matched(values)
        }
        _ => failed("Expected a list"),
    })
}

fn exactly<'a>(attribute: &'a Attribute, len: usize) -> Result<&'a [Attribute], String> {
    match attribute {
        Attribute::List(elements) if elements.len() == len => Ok(elements.as_slice()),
        Attribute::List(elements) => Err(format!(
            "Expected a list of {len} items, found {}",
            elements.len()
        )),
        _ => Err("Expected a list".to_string()),
    }
}

/// Decode a two-element list.
pub fn tuple2<A: 'static, B: 'static>(
    first: AttributeDecoder<A>,
    second: AttributeDecoder<B>,
) -> AttributeDecoder<(A, B)> {
    AttributeDecoder::new(move |file, attribute| match exactly(attribute, 2) {
        Ok(elements) => {
            let a = matched_or_return!(first.run(file, &elements[0]));
            let b = matched_or_return!(second.run(file, &elements[1]));
            DecodeResult::Matched((a, b))
        }
        Err(message) => failed(message),
    })
}

/// Decode a three-element list.
pub fn tuple3<A: 'static, B: 'static, C: 'static>(
    first: AttributeDecoder<A>,
    second: AttributeDecoder<B>,
    third: AttributeDecoder<C>,
) -> AttributeDecoder<(A, B, C)> {
    AttributeDecoder::new(move |file, attribute| match exactly(attribute, 3) {
        Ok(elements) => {
            let a = matched_or_return!(first.run(file, &elements[0]));
            let b = matched_or_return!(second.run(file, &elements[1]));
            let c = matched_or_return!(third.run(file, &elements[2]));
            DecodeResult::Matched((a, b, c))
        }
        Err(message) => failed(message),
    })
}

/// Follow a reference and decode the target entity.
///
/// A target of the wrong type is a failure here: there is no other
/// candidate to fall back on. So is a reference back to an entity that is
/// still being decoded.
pub fn reference_to<A: 'static>(decoder: EntityDecoder<A>) -> AttributeDecoder<A> {
    AttributeDecoder::new(move |file, attribute| match attribute {
        Attribute::Reference(id) => match file.get(*id) {
            Some(entity) => visiting(*id, || decoder.run(file, entity).commit()),
            None => failed(format!("Dangling reference #{id}")),
        },
        _ => failed("Expected a reference"),
    })
}

/// Match the `$` marker, producing `value`.
pub fn null<A: Clone + Send + Sync + 'static>(value: A) -> AttributeDecoder<A> {
    AttributeDecoder::new(move |_, attribute| match attribute {
        Attribute::Null => DecodeResult::Matched(value.clone()),
        _ => failed("Expected null"),
    })
}

/// Match the `*` marker, producing `value`.
pub fn derived<A: Clone + Send + Sync + 'static>(value: A) -> AttributeDecoder<A> {
    AttributeDecoder::new(move |_, attribute| match attribute {
        Attribute::Derived => DecodeResult::Matched(value.clone()),
        _ => failed("Expected derived"),
    })
}

/// Decode an attribute that may be `$`.
///
/// `$` always yields `None`. Any other attribute goes through `decoder`,
/// and a failure there is reported as is.
pub fn optional<A: 'static>(decoder: AttributeDecoder<A>) -> AttributeDecoder<Option<A>> {
    AttributeDecoder::new(move |file, attribute| match attribute {
        Attribute::Null => DecodeResult::Matched(None),
        _ => decoder.run(file, attribute).map(Some),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{entity, fail, lazy, map2, succeed};
    use crate::model::{Entity, EntityRecord, File};
    use std::collections::BTreeMap;

    fn run<A: 'static>(decoder: &AttributeDecoder<A>, attribute: Attribute) -> Result<A, String> {
        decoder.run(&File::default(), &attribute).into_result()
    }

    fn string_attr(raw: &str) -> Attribute {
        Attribute::String(raw.to_string())
    }

    #[test]
    fn test_primitives() {
        assert_eq!(run(&bool(), Attribute::Bool(true)), Ok(true));
        assert_eq!(run(&int(), Attribute::Int(-4)), Ok(-4));
        assert_eq!(run(&float(), Attribute::Float(2.5)), Ok(2.5));
        assert_eq!(run(&enumeration(), Attribute::Enum("PARAMETER".into())), Ok("PARAMETER".to_string()));
    }

    #[test]
    fn test_primitive_mismatch() {
        assert_eq!(run(&bool(), Attribute::Int(1)), Err("Expected a bool".to_string()));
        assert_eq!(run(&int(), Attribute::Float(1.0)), Err("Expected an int".to_string()));
        assert_eq!(run(&float(), Attribute::Int(1)), Err("Expected a float".to_string()));
        assert_eq!(run(&string(), Attribute::Null), Err("Expected a string".to_string()));
        assert_eq!(run(&enumeration(), Attribute::Bool(true)), Err("Expected an enum".to_string()));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(run(&string(), string_attr("AB''CD")), Ok("AB'CD".to_string()));
        assert_eq!(run(&string(), string_attr(r"\X2\00E9\X0\t\X\E9")), Ok("été".to_string()));
        let err = run(&string(), string_attr(r"\X2\004")).unwrap_err();
        assert!(err.contains(r"\X2\004"), "{err}");
    }

    #[test]
    fn test_list() {
        let items = Attribute::List(vec![Attribute::Int(1), Attribute::Int(2), Attribute::Int(3)]);
        assert_eq!(run(&list(int()), items), Ok(vec![1, 2, 3]));
        assert_eq!(run(&list(int()), Attribute::List(vec![])), Ok(vec![]));

        let mixed = Attribute::List(vec![Attribute::Int(1), Attribute::Float(2.0)]);
        assert_eq!(run(&list(int()), mixed), Err("Expected an int".to_string()));
        assert_eq!(run(&list(int()), Attribute::Int(1)), Err("Expected a list".to_string()));
    }

    #[test]
    fn test_nested_list() {
        let nested = Attribute::List(vec![
            Attribute::List(vec![Attribute::Float(0.0), Attribute::Float(1.0)]),
            Attribute::List(vec![Attribute::Float(2.0)]),
        ]);
        assert_eq!(
            run(&list(list(float())), nested),
            Ok(vec![vec![0.0, 1.0], vec![2.0]])
        );
    }

    #[test]
    fn test_tuples() {
        let pair = Attribute::List(vec![Attribute::Int(1), string_attr("a")]);
        assert_eq!(run(&tuple2(int(), string()), pair.clone()), Ok((1, "a".to_string())));
        assert_eq!(
            run(&tuple3(int(), string(), int()), pair.clone()),
            Err("Expected a list of 3 items, found 2".to_string())
        );
        assert_eq!(
            run(&tuple2(string(), int()), pair),
            Err("Expected a string".to_string())
        );
        let triple = Attribute::List(vec![Attribute::Float(1.0), Attribute::Float(2.0), Attribute::Bool(false)]);
        assert_eq!(run(&tuple3(float(), float(), bool()), triple), Ok((1.0, 2.0, false)));
    }

    #[test]
    fn test_null_and_derived() {
        assert_eq!(run(&null(0), Attribute::Null), Ok(0));
        assert_eq!(run(&null(0), Attribute::Derived), Err("Expected null".to_string()));
        assert_eq!(run(&derived("d"), Attribute::Derived), Ok("d"));
        assert_eq!(run(&derived("d"), Attribute::Null), Err("Expected derived".to_string()));
    }

    #[test]
    fn test_optional() {
        assert_eq!(run(&optional(int()), Attribute::Int(3)), Ok(Some(3)));
        assert_eq!(run(&optional(int()), Attribute::Null), Ok(None));
        assert_eq!(run(&optional(int()), Attribute::Float(3.0)), Err("Expected an int".to_string()));
    }

    #[test]
    fn test_optional_null_is_absent_for_any_decoder() {
        assert_eq!(run(&optional(string()), Attribute::Null), Ok(None));
        assert_eq!(run(&optional(list(float())), Attribute::Null), Ok(None));
        assert_eq!(run(&optional(fail::<_, _, u8>("never")), Attribute::Null), Ok(None));
        assert_eq!(run(&optional(succeed(9)), Attribute::Null), Ok(None));
        assert_eq!(run(&optional(null(1)), Attribute::Null), Ok(None));
    }

    #[test]
    fn test_typed() {
        let measure = Attribute::Typed(TypeName::new("LENGTH_MEASURE"), Box::new(Attribute::Float(2.5)));
        assert_eq!(run(&typed("length_measure", float()), measure.clone()), Ok(2.5));
        assert_eq!(
            run(&typed("AREA_MEASURE", float()), measure),
            Err("Expected a AREA_MEASURE value, found LENGTH_MEASURE".to_string())
        );
        assert_eq!(
            run(&typed("AREA_MEASURE", float()), Attribute::Float(1.0)),
            Err("Expected a AREA_MEASURE value".to_string())
        );
    }

    #[test]
    fn test_attribute_index() {
        let decoder = attribute(1, int());
        let file = File::default();
        let attrs = [Attribute::Float(0.0), Attribute::Int(8)];
        assert_eq!(decoder.run(&file, &attrs).into_result(), Ok(8));
        assert_eq!(
            attribute(2, int()).run(&file, &attrs).into_result(),
            Err("No attribute at index 2".to_string())
        );
    }

    fn graph() -> File {
        let mut entities = BTreeMap::new();
        entities.insert(
            1,
            Entity::Simple(EntityRecord::new("POINT", vec![Attribute::Float(1.0), Attribute::Float(2.0)])),
        );
        entities.insert(2, Entity::Simple(EntityRecord::new("LINE", vec![Attribute::Reference(1)])));
        File::from_parts(Default::default(), entities)
    }

    #[test]
    fn test_reference_to() {
        let file = graph();
        let point = entity(
            "POINT",
            map2(|x, y| (x, y), attribute(0, float()), attribute(1, float())),
        );
        let decoder = reference_to(point);
        assert_eq!(
            decoder.run(&file, &Attribute::Reference(1)).into_result(),
            Ok((1.0, 2.0))
        );
        assert_eq!(
            decoder.run(&file, &Attribute::Reference(2)).into_result(),
            Err("Expected entity of type POINT, found LINE".to_string())
        );
        assert_eq!(
            decoder.run(&file, &Attribute::Reference(3)).into_result(),
            Err("Dangling reference #3".to_string())
        );
        assert_eq!(
            decoder.run(&file, &Attribute::Int(1)).into_result(),
            Err("Expected a reference".to_string())
        );
    }

    fn chain() -> EntityDecoder<usize> {
        entity("NODE", attribute(0, reference_to(lazy(chain))).map(|depth| depth + 1))
    }

    #[test]
    fn test_reference_to_cycle() {
        let mut entities = BTreeMap::new();
        entities.insert(1, Entity::Simple(EntityRecord::new("NODE", vec![Attribute::Reference(1)])));
        entities.insert(
            2,
            Entity::Simple(EntityRecord::new(
                "PAIR",
                vec![Attribute::Reference(3), Attribute::Reference(3)],
            )),
        );
        entities.insert(3, Entity::Simple(EntityRecord::new("LEAF", vec![])));
        let file = File::from_parts(Default::default(), entities);

        assert_eq!(
            reference_to(chain()).run(&file, &Attribute::Reference(1)).into_result(),
            Err("Reference cycle through #1".to_string())
        );

        // The failed walk leaves nothing marked as active.
        let node = reference_to(entity("NODE", succeed(0)));
        assert_eq!(node.run(&file, &Attribute::Reference(1)).into_result(), Ok(0));

        // A shared target is not a cycle.
        let leaf = reference_to(entity("LEAF", succeed(())));
        let pair = entity(
            "PAIR",
            map2(|a, b| (a, b), attribute(0, leaf.clone()), attribute(1, leaf)),
        );
        assert_eq!(
            reference_to(pair).run(&file, &Attribute::Reference(2)).into_result(),
            Ok(((), ()))
        );
    }
}

//! File-level decoders and the entry points that run them.

use tracing::trace;

use super::{visiting, DecodeResult, EntityDecoder, FileDecoder};
use crate::error::StepError;
use crate::model::{File, Header};
use crate::resolve::{self, ResolveOptions};

/// Match the file's header as-is.
pub fn header() -> FileDecoder<Header> {
    FileDecoder::new(|file, _| DecodeResult::Matched(file.header().clone()))
}

/// Decode the one entity in the file that `decoder` matches.
///
/// Entities are visited in ascending id order. The first failure aborts the
/// traversal, as does a second match.
pub fn single<A: 'static>(decoder: EntityDecoder<A>) -> FileDecoder<A> {
    FileDecoder::new(move |file, _| {
        let mut found = None;
        for (id, entity) in file.entities() {
            match visiting(id, || decoder.run(file, entity)) {
                DecodeResult::Matched(value) => {
                    if found.is_some() {
                        trace!(id, "second match");
                        return DecodeResult::Failed("More than one matching entity found".into());
                    }
                    found = Some(value);
                }
                DecodeResult::Failed(message) => {
                    trace!(id, %message, "entity failed to decode");
                    return DecodeResult::Failed(message);
                }
                DecodeResult::NotMatched(_) => {}
            }
        }
        match found {
            Some(value) => DecodeResult::Matched(value),
            None => DecodeResult::Failed("No matching entities found".into()),
        }
    })
}

/// Decode every entity that `decoder` matches, in ascending id order.
pub fn all<A: 'static>(decoder: EntityDecoder<A>) -> FileDecoder<Vec<A>> {
    FileDecoder::new(move |file, _| {
        let mut values = Vec::new();
        for (id, entity) in file.entities() {
            match visiting(id, || decoder.run(file, entity)) {
                DecodeResult::Matched(value) => values.push(value),
                DecodeResult::Failed(message) => {
                    trace!(id, %message, "entity failed to decode");
                    return DecodeResult::Failed(message);
                }
                DecodeResult::NotMatched(_) => {}
            }
        }
        trace!(matched = values.len(), "collected entities");
        DecodeResult::Matched(values)
    })
}

/// Decode the first header record that `decoder` matches.
pub fn header_entity<A: 'static>(decoder: EntityDecoder<A>) -> FileDecoder<A> {
    FileDecoder::new(move |file, _| {
        let mut diagnostics = Vec::new();
        for entity in &file.header().entities {
            match decoder.run(file, entity) {
                DecodeResult::NotMatched(diagnostic) => diagnostics.push(diagnostic),
                DecodeResult::Matched(value) => return DecodeResult::Matched(value),
                DecodeResult::Failed(message) => return DecodeResult::Failed(message),
            }
        }
        if diagnostics.is_empty() {
            DecodeResult::Failed("No matching header entity found".into())
        } else {
            DecodeResult::Failed(format!(
                "No matching header entity found: {}",
                diagnostics.join(" | ")
            ))
        }
    })
}

/// Run a file decoder against an already resolved file.
pub fn run_file<A: 'static>(decoder: &FileDecoder<A>, file: &File) -> Result<A, StepError> {
    decoder
        .run(file, file)
        .into_result()
        .map_err(StepError::DecodeFailure)
}

/// Parse, resolve and decode STEP text with default options.
pub fn file<A: 'static>(decoder: &FileDecoder<A>, text: &str) -> Result<A, StepError> {
    file_with(decoder, text, &ResolveOptions::default())
}

/// Parse, resolve and decode STEP text.
pub fn file_with<A: 'static>(
    decoder: &FileDecoder<A>,
    text: &str,
    options: &ResolveOptions,
) -> Result<A, StepError> {
    let resolved = resolve::parse_and_resolve(text, options)?;
    run_file(decoder, &resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{attribute, entity, int, map, string, succeed};
    use crate::model::Entity;
    use crate::resolve::CyclePolicy;

    fn step(data: &str) -> String {
        format!(
            "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION(('test'),'2;1');\nFILE_SCHEMA(('CONFIG_CONTROL_DESIGN'));\nENDSEC;\nDATA;\n{data}\nENDSEC;\nEND-ISO-10303-21;\n"
        )
    }

    fn count() -> EntityDecoder<i64> {
        entity("COUNT", attribute(0, int()))
    }

    #[test]
    fn test_single_none() {
        let text = step("#1=OTHER(1);");
        assert_eq!(
            file(&single(count()), &text),
            Err(StepError::DecodeFailure("No matching entities found".into()))
        );
    }

    #[test]
    fn test_single_two() {
        let text = step("#1=COUNT(1);\n#2=COUNT(2);");
        assert_eq!(
            file(&single(count()), &text),
            Err(StepError::DecodeFailure("More than one matching entity found".into()))
        );
    }

    #[test]
    fn test_single_one_among_others() {
        let text = step("#1=OTHER(1);\n#2=COUNT(7);\n#3=OTHER(2);");
        assert_eq!(file(&single(count()), &text), Ok(7));
    }

    #[test]
    fn test_single_failure_aborts() {
        let text = step("#1=COUNT('x');\n#2=COUNT(2);");
        assert_eq!(
            file(&single(count()), &text),
            Err(StepError::DecodeFailure("Expected an int".into()))
        );
    }

    #[test]
    fn test_all_in_id_order() {
        let text = step("#30=COUNT(3);\n#4=OTHER(0);\n#10=COUNT(1);\n#20=COUNT(2);");
        assert_eq!(file(&all(count()), &text), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn test_all_empty_is_matched() {
        let text = step("#1=OTHER(0);");
        assert_eq!(file(&all(count()), &text), Ok(vec![]));
    }

    #[test]
    fn test_all_failure_aborts() {
        let text = step("#1=COUNT(1);\n#2=COUNT($);");
        assert_eq!(
            file(&all(count()), &text),
            Err(StepError::DecodeFailure("Expected an int".into()))
        );
    }

    #[test]
    fn test_header_passthrough() {
        let text = step("");
        let header = file(&header(), &text).unwrap();
        assert_eq!(header.entities.len(), 2);
        assert!(matches!(
            &header.entities[1],
            Entity::Simple(record) if record.type_name.as_str() == "FILE_SCHEMA"
        ));
    }

    #[test]
    fn test_header_entity() {
        let text = step("");
        let level = entity("FILE_DESCRIPTION", attribute(1, string()));
        assert_eq!(file(&header_entity(level), &text), Ok("2;1".to_string()));

        let missing = entity("FILE_NAME", map(|name: String| name.len(), attribute(0, string())));
        let err = file(&header_entity(missing), &text).unwrap_err();
        assert_eq!(
            err,
            StepError::DecodeFailure(
                "No matching header entity found: Expected entity of type FILE_NAME, found FILE_DESCRIPTION | Expected entity of type FILE_NAME, found FILE_SCHEMA".into()
            )
        );
    }

    #[test]
    fn test_upstream_errors_pass_through() {
        let text = step("#1=COUNT(#2);");
        assert_eq!(file(&all(count()), &text), Err(StepError::DanglingReference(2)));

        let text = step("#1=COUNT(1)");
        assert!(matches!(file(&all(count()), &text), Err(StepError::ParseFailure(_))));
    }

    #[test]
    fn test_file_with_cycle_policy() {
        let text = step("#1=NODE(#2);\n#2=NODE(#1);");
        let nodes = entity("NODE", succeed(()));
        assert_eq!(file(&all(nodes.clone()), &text), Ok(vec![(), ()]));

        let options = ResolveOptions {
            cycles: CyclePolicy::Reject,
        };
        assert_eq!(
            file_with(&all(nodes), &text, &options),
            Err(StepError::ReferenceCycle(vec![1, 2, 1]))
        );
    }
}

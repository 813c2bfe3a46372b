//! The three mandatory header entities.

use crate::decode::{self, EntityDecoder, FileDecoder};

/// FILE_DESCRIPTION header record.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDescription {
    /// Free-form description lines.
    pub description: Vec<String>,
    /// Conformance level, e.g. `2;1`.
    pub implementation_level: String,
}

/// FILE_NAME header record.
#[derive(Debug, Clone, PartialEq)]
pub struct FileName {
    /// Name of the exchange file.
    pub name: String,
    /// ISO 8601 creation time, unparsed.
    pub time_stamp: String,
    /// Authors.
    pub author: Vec<String>,
    /// Organizations of the authors.
    pub organization: Vec<String>,
    /// System that wrote the file.
    pub preprocessor_version: String,
    /// System the data came from.
    pub originating_system: String,
    /// Who approved the file.
    pub authorization: String,
}

/// FILE_SCHEMA header record.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSchema {
    /// Schema identifiers, e.g. `AUTOMOTIVE_DESIGN`.
    pub schemas: Vec<String>,
}

/// All three header records of a file.
#[derive(Debug, Clone, PartialEq)]
pub struct StepHeader {
    /// FILE_DESCRIPTION record.
    pub description: FileDescription,
    /// FILE_NAME record.
    pub name: FileName,
    /// FILE_SCHEMA record.
    pub schema: FileSchema,
}

/// Decode a FILE_DESCRIPTION record.
pub fn file_description() -> EntityDecoder<FileDescription> {
    decode::entity(
        "FILE_DESCRIPTION",
        decode::map2(
            |description, implementation_level| FileDescription {
                description,
                implementation_level,
            },
            decode::attribute(0, decode::list(decode::string())),
            decode::attribute(1, decode::string()),
        ),
    )
}

/// Decode a FILE_NAME record.
pub fn file_name() -> EntityDecoder<FileName> {
    decode::entity(
        "FILE_NAME",
        decode::map7(
            |name, time_stamp, author, organization, preprocessor_version, originating_system, authorization| {
                FileName {
                    name,
                    time_stamp,
                    author,
                    organization,
                    preprocessor_version,
                    originating_system,
                    authorization,
                }
            },
            decode::attribute(0, decode::string()),
            decode::attribute(1, decode::string()),
            decode::attribute(2, decode::list(decode::string())),
            decode::attribute(3, decode::list(decode::string())),
            decode::attribute(4, decode::string()),
            decode::attribute(5, decode::string()),
            decode::attribute(6, decode::string()),
        ),
    )
}

/// Decode a FILE_SCHEMA record.
pub fn file_schema() -> EntityDecoder<FileSchema> {
    decode::entity(
        "FILE_SCHEMA",
        decode::attribute(0, decode::list(decode::string())).map(|schemas| FileSchema { schemas }),
    )
}

/// Decode all three header records.
pub fn step_header() -> FileDecoder<StepHeader> {
    decode::map3(
        |description, name, schema| StepHeader {
            description,
            name,
            schema,
        },
        decode::header_entity(file_description()),
        decode::header_entity(file_name()),
        decode::header_entity(file_schema()),
    )
}

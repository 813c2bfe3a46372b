//! Error types for STEP decoding.

use thiserror::Error;

use crate::model::EntityId;

/// Errors that can occur while loading or decoding a STEP file.
///
/// The first three variants come from building the entity graph; only
/// [`StepError::DecodeFailure`] is produced by running a decoder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepError {
    /// Malformed exchange-structure text.
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// An attribute references an entity id that does not exist.
    #[error("Dangling reference: #{0}")]
    DanglingReference(EntityId),

    /// A chain of references loops back on itself.
    #[error("Reference cycle: {}", format_chain(.0))]
    ReferenceCycle(Vec<EntityId>),

    /// A decoder rejected the file.
    #[error("Decode failure: {0}")]
    DecodeFailure(String),
}

impl StepError {
    /// Create a parse failure located at a line and column (both 1-indexed).
    pub fn lexer(line: usize, col: usize, message: impl Into<String>) -> Self {
        Self::ParseFailure(format!(
            "line {line}, column {col}: {}",
            message.into()
        ))
    }

    /// Create a parse failure, optionally attributed to an entity instance.
    pub fn parser(entity_id: Option<EntityId>, message: impl Into<String>) -> Self {
        let message = message.into();
        match entity_id {
            Some(id) => Self::ParseFailure(format!("at entity #{id}: {message}")),
            None => Self::ParseFailure(message),
        }
    }
}

fn format_chain(ids: &[EntityId]) -> String {
    ids.iter()
        .map(|id| format!("#{id}"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            StepError::lexer(3, 7, "unterminated string").to_string(),
            "Parse failure: line 3, column 7: unterminated string"
        );
        assert_eq!(
            StepError::parser(Some(12), "expected type name").to_string(),
            "Parse failure: at entity #12: expected type name"
        );
        assert_eq!(
            StepError::DanglingReference(2).to_string(),
            "Dangling reference: #2"
        );
        assert_eq!(
            StepError::ReferenceCycle(vec![1, 4, 1]).to_string(),
            "Reference cycle: #1 -> #4 -> #1"
        );
    }
}

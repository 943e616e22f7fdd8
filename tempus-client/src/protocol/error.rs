//! Wire-level error types.

use crate::domain::DomainError;
use crate::expr::ExprError;

/// Errors from building or decoding protocol messages.
///
/// Decoding is all-or-nothing: any of these aborts the whole message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    /// The document is not well-formed XML
    #[error(transparent)]
    Expr(#[from] ExprError),

    /// An element outside the set allowed at this position
    #[error("unexpected <{found}> inside <{context}>")]
    UnexpectedTag { context: String, found: String },

    /// A required attribute or child element is absent
    #[error("<{element}> is missing required {field}")]
    MissingField { element: String, field: String },

    /// A field is present but does not parse
    #[error("invalid value {value:?} for {field} in <{element}>")]
    InvalidValue {
        element: String,
        field: String,
        value: String,
    },

    /// A cost code outside the known cost dimensions
    #[error("unknown cost code {0:?}")]
    UnknownCostCode(String),

    /// An option value element whose tag names no known value type
    #[error("unsupported option value type <{0}>")]
    UnsupportedOptionType(String),

    /// The request or options were rejected before encoding
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ProtocolError {
    pub(crate) fn missing(element: &str, field: &str) -> Self {
        ProtocolError::MissingField {
            element: element.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn unexpected(context: &str, found: &str) -> Self {
        ProtocolError::UnexpectedTag {
            context: context.to_string(),
            found: found.to_string(),
        }
    }

    pub(crate) fn invalid(element: &str, field: &str, value: &str) -> Self {
        ProtocolError::InvalidValue {
            element: element.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::missing("road_step", "attribute end_movement");
        assert_eq!(
            err.to_string(),
            "<road_step> is missing required attribute end_movement"
        );

        let err = ProtocolError::unexpected("result", "bus_step");
        assert_eq!(err.to_string(), "unexpected <bus_step> inside <result>");

        let err = ProtocolError::invalid("cost", "value", "abc");
        assert_eq!(err.to_string(), "invalid value \"abc\" for value in <cost>");

        let err = ProtocolError::UnknownCostCode("99".into());
        assert_eq!(err.to_string(), "unknown cost code \"99\"");

        let err = ProtocolError::Domain(DomainError::InvalidRequest("no steps"));
        assert_eq!(err.to_string(), "invalid request: no steps");
    }
}

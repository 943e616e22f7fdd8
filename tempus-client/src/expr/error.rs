//! Codec error types.

/// Errors from decoding an XML document into an [`Expr`](super::Expr).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    /// The input is not a single well-formed XML element
    #[error("malformed XML document: {0}")]
    MalformedDocument(String),
}

impl From<quick_xml::Error> for ExprError {
    fn from(err: quick_xml::Error) -> Self {
        ExprError::MalformedDocument(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ExprError::MalformedDocument("unexpected end of input".into());
        assert_eq!(
            err.to_string(),
            "malformed XML document: unexpected end of input"
        );
    }
}

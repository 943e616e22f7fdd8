//! Client error types.

use crate::expr::ExprError;
use crate::protocol::ProtocolError;

/// Errors from talking to the routing service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an `ows:ExceptionReport`
    #[error("server fault {code}: {message}")]
    ServerFault { code: String, message: String },

    /// Non-200 status whose body is not an exception report
    #[error("transport failure (status {status}): {body}")]
    TransportFailure { status: u16, body: String },

    /// HTTP request failed (connection, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A process output the operation needs is absent from the answer
    #[error("missing output {0:?} in server answer")]
    MissingOutput(String),

    /// An answer or request did not match the message layout
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Transport settings are unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ExprError> for ClientError {
    fn from(err: ExprError) -> Self {
        ClientError::Protocol(ProtocolError::Expr(err))
    }
}

impl From<crate::domain::DomainError> for ClientError {
    fn from(err: crate::domain::DomainError) -> Self {
        ClientError::Protocol(ProtocolError::Domain(err))
    }
}

impl ClientError {
    /// Whether the server answered but its itinerary data could not be
    /// decoded, as opposed to failing outright.
    ///
    /// An empty result list is not an error at all; callers show "no
    /// result" for that and "unusable data" for this.
    pub fn is_unusable_itinerary_data(&self) -> bool {
        matches!(
            self,
            ClientError::Protocol(
                ProtocolError::Expr(_)
                    | ProtocolError::UnexpectedTag { .. }
                    | ProtocolError::MissingField { .. }
                    | ProtocolError::InvalidValue { .. }
                    | ProtocolError::UnknownCostCode(_)
            ) | ClientError::MissingOutput(_)
        )
    }

    /// Cut a response body down for error reporting.
    pub(crate) fn transport_failure(status: u16, body: &str) -> Self {
        ClientError::TransportFailure {
            status,
            body: body.chars().take(500).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ClientError::ServerFault {
            code: "NoApplicableCode".into(),
            message: "No plugin loaded".into(),
        };
        assert_eq!(err.to_string(), "server fault NoApplicableCode: No plugin loaded");

        let err = ClientError::TransportFailure {
            status: 502,
            body: "Bad Gateway".into(),
        };
        assert_eq!(err.to_string(), "transport failure (status 502): Bad Gateway");

        let err = ClientError::MissingOutput("results".into());
        assert_eq!(err.to_string(), "missing output \"results\" in server answer");
    }

    #[test]
    fn transport_failure_truncates_body() {
        let body = "x".repeat(2000);
        match ClientError::transport_failure(500, &body) {
            ClientError::TransportFailure { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body.len(), 500);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unusable_itinerary_data() {
        let decode_failure = ClientError::from(ExprError::MalformedDocument("eof".into()));
        assert!(decode_failure.is_unusable_itinerary_data());

        let bad_leg = ClientError::Protocol(ProtocolError::UnexpectedTag {
            context: "result".into(),
            found: "teleport_step".into(),
        });
        assert!(bad_leg.is_unusable_itinerary_data());

        let fault = ClientError::ServerFault {
            code: "X".into(),
            message: "boom".into(),
        };
        assert!(!fault.is_unusable_itinerary_data());
        assert!(!ClientError::InvalidConfig("url".into()).is_unusable_itinerary_data());
    }
}

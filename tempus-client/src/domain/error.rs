//! Domain error types.
//!
//! These errors represent invalid requests or option sets, detected before
//! anything is sent to the server. They are distinct from wire and I/O
//! errors.

/// Domain-level validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// The request breaks an invariant the server relies on
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),

    /// No plugin with this name is registered
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    /// The plugin declares no option with this name
    #[error("plugin {plugin} has no option named {option}")]
    UnknownOption { plugin: String, option: String },

    /// The value's type differs from the option's declared type
    #[error("option {option} expects a {expected} value, got {found}")]
    UnsupportedOptionType {
        option: String,
        expected: &'static str,
        found: &'static str,
    },
}

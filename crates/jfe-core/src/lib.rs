//! Shared primitives used across the font enlarger crates.

/// Result alias used across the workspace.
pub type EnlargeResult<T> = Result<T, EnlargeError>;

/// Top-level error type.
///
/// Every variant maps to a stable dotted code (see [`EnlargeError::code`]) so
/// callers can match on failures without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnlargeError {
    #[error("node {0} does not exist in this document")]
    UnknownNode(usize),

    #[error("node {0} is not an element")]
    NotAnElement(usize),

    #[error("node {child} cannot be attached: {reason}")]
    InvalidAttach { child: usize, reason: &'static str },

    #[error("failed to parse page URL `{input}`: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("pass request queue is closed")]
    QueueClosed,
}

impl EnlargeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownNode(_) => "dom.unknown_node",
            Self::NotAnElement(_) => "dom.not_an_element",
            Self::InvalidAttach { .. } => "dom.invalid_attach",
            Self::InvalidUrl { .. } => "page.url.invalid",
            Self::Config(_) => "config.invalid",
            Self::QueueClosed => "trigger.queue_closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::EnlargeError;

    #[test]
    fn codes_are_stable_and_dotted() {
        assert_eq!(EnlargeError::UnknownNode(4).code(), "dom.unknown_node");
        assert_eq!(EnlargeError::QueueClosed.code(), "trigger.queue_closed");
        assert_eq!(
            EnlargeError::Config("zero size".to_owned()).code(),
            "config.invalid"
        );
    }

    #[test]
    fn display_includes_context() {
        let error = EnlargeError::InvalidUrl {
            input: "::".to_owned(),
            reason: "relative URL without a base".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "failed to parse page URL `::`: relative URL without a base"
        );
    }
}

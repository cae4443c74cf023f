use crate::record::FailureKind;

/// Why an upstream response could not be normalized.
///
/// These never reach callers of [`crate::Normalizer`]; each one is folded into
/// a degraded [`crate::FactCheckRecord`]. They carry the untruncated payload so
/// the normalizer can apply its own snippet limits.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("received an HTML page instead of a JSON response")]
    HtmlBody { body: String },

    #[error("received a non-JSON response body: {reason}")]
    NonJsonBody { reason: String, body: String },

    #[error("invalid response format: {reason}")]
    Schema { reason: String, dump: String },

    #[error("failed to parse the verification response: {message}")]
    Parse { message: String, text: String },
}

impl NormalizeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::HtmlBody { .. } | Self::NonJsonBody { .. } => FailureKind::TransportFormat,
            Self::Schema { .. } => FailureKind::Schema,
            Self::Parse { .. } => FailureKind::Parse,
        }
    }

    /// Reader-facing explanation placed in the degraded record.
    pub fn explanation(&self) -> String {
        match self {
            Self::HtmlBody { .. } => "Transport error: the verification service returned an HTML page \
                 instead of JSON. This usually means a proxy or server configuration problem."
                .to_string(),
            Self::NonJsonBody { reason, .. } => format!(
                "Transport error: the verification service returned a body that is not JSON ({reason})."
            ),
            Self::Schema { reason, .. } => format!(
                "Invalid response format from the verification service: {reason}."
            ),
            Self::Parse { message, .. } => {
                format!("Error while parsing the verification response: {message}")
            }
        }
    }
}

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, RankError>;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub operation: String,
    pub trace_id: String,
}

impl RankError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Compression(_) => "COMPRESSION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_payload(&self, operation: impl Into<String>) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            operation: operation.into(),
            trace_id: Uuid::new_v4().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable_per_variant() {
        assert_eq!(
            RankError::Validation("x".to_string()).code(),
            "VALIDATION_FAILED"
        );
        assert_eq!(
            RankError::Compression(std::io::Error::other("boom")).code(),
            "COMPRESSION_ERROR"
        );
        assert_eq!(RankError::Internal("x".to_string()).code(), "INTERNAL_ERROR");
    }

    #[test]
    fn payload_carries_operation_message_and_fresh_trace_id() {
        let err = RankError::Validation("unknown codec: lz4".to_string());
        let first = err.to_payload("rank");
        let second = err.to_payload("rank");

        assert_eq!(first.code, "VALIDATION_FAILED");
        assert_eq!(first.operation, "rank");
        assert_eq!(first.message, "validation failed: unknown codec: lz4");
        assert!(Uuid::parse_str(&first.trace_id).is_ok());
        assert_ne!(first.trace_id, second.trace_id);

        let value = serde_json::to_value(&first).expect("serialize payload");
        let mut keys = value
            .as_object()
            .expect("payload object")
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        keys.sort();
        assert_eq!(keys, ["code", "message", "operation", "trace_id"]);
    }
}

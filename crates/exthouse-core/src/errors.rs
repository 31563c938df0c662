use thiserror::Error;

/// Errors surfaced by the measurement pipeline.
///
/// `AuditFailure` and `NoValidSamples` are absorbed at run / extension level;
/// `MissingBaseline` and `InvalidConfiguration` abort the batch.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExthouseError {
    #[error("audit failed for '{extension}' (run {run_index}): {message}")]
    AuditFailure {
        extension: String,
        run_index: u32,
        message: String,
    },

    #[error("no valid samples for extension '{extension}'")]
    NoValidSamples { extension: String },

    #[error("missing baseline: {0}")]
    MissingBaseline(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl ExthouseError {
    pub fn invalid_config(detail: impl Into<String>) -> Self {
        Self::InvalidConfiguration(detail.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_extension() {
        let e = ExthouseError::NoValidSamples {
            extension: "Grammarly".into(),
        };
        assert_eq!(e.to_string(), "no valid samples for extension 'Grammarly'");
        let e = ExthouseError::AuditFailure {
            extension: "Grammarly".into(),
            run_index: 2,
            message: "boom".into(),
        };
        assert_eq!(e.to_string(), "audit failed for 'Grammarly' (run 2): boom");
    }
}

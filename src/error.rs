use thiserror::Error;

/// Track-indexed issue severity, shared by `QualityReport` and `CoreError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Fatal failures of the composition core, per spec §7.
///
/// Only `PlanError` (when unrecoverable) and `SerializationError` are fatal;
/// every other kind named in §7 is folded into `QualityReport::issues`
/// instead of being raised here.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("track planner could not satisfy constraints: {0}")]
    PlanError(String),

    #[error("midi serialization failed: {0}")]
    SerializationError(String),
}

impl CoreError {
    /// Stage tag used to build the `fatal_{stage}` issue kind from §7.
    pub fn stage(&self) -> &'static str {
        match self {
            CoreError::PlanError(_) => "plan",
            CoreError::SerializationError(_) => "serialization",
        }
    }
}

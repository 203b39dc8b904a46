//! Crate-level error surface returned from every service entry point.
//!
//! The five caller-facing kinds of failure are modeled as variants; the
//! transport layer maps them to status codes. Where a game exists, errors
//! carry the current `state_version` so callers can refresh and retry.

use thiserror::Error;

use crate::errors::domain::{DomainError, RuleViolation};
use crate::errors::ErrorCode;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Caller-supplied data is malformed. Not retryable.
    #[error("invalid payload: {detail}")]
    InvalidPayload { code: ErrorCode, detail: String },

    /// Caller identity is unknown.
    #[error("unauthorized: {detail}")]
    Unauthorized { detail: String },

    /// Caller lacks the required role for the operation.
    #[error("forbidden: {detail}")]
    Forbidden { detail: String },

    /// Named resource does not exist.
    #[error("not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },

    /// Caller's expected state version does not match the game's current
    /// version. Carries the current version; refresh and retry.
    #[error("version conflict: current state version is {current}")]
    VersionConflict { current: u64 },

    /// The rules kernel rejected the action. Carries the specific
    /// violations and, where known, the current state version.
    #[error("illegal move")]
    IllegalMove {
        violations: Vec<RuleViolation>,
        state_version: Option<u64>,
    },

    /// Internal invariant violation; the affected game has been aborted.
    #[error("internal error: {detail}")]
    Internal { detail: String },
}

impl AppError {
    pub fn invalid_payload(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::InvalidPayload {
            code,
            detail: detail.into(),
        }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            detail: detail.into(),
        }
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::Forbidden {
            detail: detail.into(),
        }
    }

    pub fn not_found(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            detail: detail.into(),
        }
    }

    pub fn version_conflict(current: u64) -> Self {
        Self::VersionConflict { current }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    /// Primary error code for transport mapping.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::InvalidPayload { code, .. } => *code,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::NotFound { code, .. } => *code,
            AppError::VersionConflict { .. } => ErrorCode::VersionConflict,
            AppError::IllegalMove { violations, .. } => violations
                .first()
                .map(RuleViolation::code)
                .unwrap_or(ErrorCode::InvalidPayload),
            AppError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Attach the game's current state version to rule rejections.
    pub(crate) fn with_state_version(self, version: u64) -> Self {
        match self {
            AppError::IllegalMove { violations, .. } => AppError::IllegalMove {
                violations,
                state_version: Some(version),
            },
            other => other,
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidPayload(code, detail) => AppError::InvalidPayload { code, detail },
            DomainError::IllegalMove(violations) => AppError::IllegalMove {
                violations,
                state_version: None,
            },
            DomainError::OutOfTurn { expected } => AppError::Forbidden {
                detail: format!("not your turn: seat {expected} is expected to act"),
            },
            DomainError::PhaseMismatch { detail } => AppError::InvalidPayload {
                code: ErrorCode::PhaseMismatch,
                detail,
            },
            DomainError::Invariant(detail) => AppError::Internal { detail },
        }
    }
}

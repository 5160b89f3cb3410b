//! The error taxonomy shared by every engine crate: a flat enum with manual
//! `Display`/`std::error::Error`, no `thiserror`, carrying a machine-readable
//! `code` so an HTTP boundary can translate it losslessly.

use std::fmt;

/// Structured error returned by every engine operation. Boundaries (an HTTP
/// layer, a CLI, a test) translate this into their own representation;
/// nothing in this crate assumes any particular transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed/invalid argument (400).
    Input { code: &'static str, message: String },
    /// Precondition not met (409/429 depending on code).
    State { code: &'static str, message: String },
    /// Entity absent (404).
    NotFound { message: String },
    /// Ownership mismatch (403).
    Forbidden { message: String },
    /// Daily cap / insufficient questions / stock exhausted (400/429).
    Capacity { code: &'static str, message: String },
    /// Optimistic concurrency or unique-index collision (409).
    Conflict { message: String },
    /// Capability failure; `retriable` drives Workflow Engine retry policy.
    External { message: String, retriable: bool },
    /// Violated invariant — logged, alerted, fails the request (500).
    Fatal { message: String },
}

impl Error {
    pub fn input(message: impl Into<String>) -> Self {
        Error::Input { code: "INVALID_INPUT", message: message.into() }
    }

    pub fn invalid_forge_set(message: impl Into<String>) -> Self {
        Error::Input { code: "INVALID_FORGE_SET", message: message.into() }
    }

    pub fn insufficient_questions() -> Self {
        Error::Capacity {
            code: "INSUFFICIENT_QUESTIONS",
            message: "fewer than ten questions were selectable for this draw".into(),
        }
    }

    pub fn active_session_exists() -> Self {
        Error::State {
            code: "ACTIVE_SESSION_EXISTS",
            message: "an active session already exists for this identity".into(),
        }
    }

    pub fn daily_limit_reached() -> Self {
        Error::Capacity {
            code: "DAILY_LIMIT_REACHED",
            message: "the daily session cap has been reached for this identity".into(),
        }
    }

    pub fn cooldown_active() -> Self {
        Error::State {
            code: "COOLDOWN_ACTIVE",
            message: "a cooldown is active for this identity".into(),
        }
    }

    pub fn session_not_found() -> Self {
        Error::NotFound { message: "session not found".into() }
    }

    pub fn session_not_active() -> Self {
        Error::State { code: "SESSION_NOT_ACTIVE", message: "session is not active".into() }
    }

    pub fn wrong_question_index() -> Self {
        Error::Input { code: "WRONG_QUESTION_INDEX", message: "questionIndex does not match the session cursor".into() }
    }

    pub fn answer_timeout() -> Self {
        Error::Input { code: "ANSWER_TIMEOUT", message: "timeMs exceeds the 10000ms answer budget".into() }
    }

    pub fn expired() -> Self {
        Error::State { code: "EXPIRED", message: "entitlement has expired".into() }
    }

    pub fn already_used() -> Self {
        Error::State { code: "ALREADY_USED", message: "entitlement has already been used".into() }
    }

    pub fn no_stock() -> Self {
        Error::Capacity { code: "NO_STOCK", message: "no unminted catalog stock for this category".into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Error::Forbidden { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict { message: message.into() }
    }

    pub fn external(message: impl Into<String>, retriable: bool) -> Self {
        Error::External { message: message.into(), retriable }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Error::Fatal { message: message.into() }
    }

    /// Whether the Workflow Engine should retry this failure with backoff:
    /// transient ExternalError retries, everything else terminates the
    /// instance immediately.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::External { retriable: true, .. })
    }

    /// Machine-readable code, where this variant carries one. Used by a
    /// (not-built-here) HTTP boundary to translate errors to responses.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Error::Input { code, .. } => Some(code),
            Error::State { code, .. } => Some(code),
            Error::Capacity { code, .. } => Some(code),
            Error::NotFound { .. }
            | Error::Forbidden { .. }
            | Error::Conflict { .. }
            | Error::External { .. }
            | Error::Fatal { .. } => None,
        }
    }

    /// Suggested HTTP status for a boundary to use.
    /// This crate has no axum dependency; callers map this `u16` themselves.
    pub fn suggested_status(&self) -> u16 {
        match self {
            Error::Input { .. } => 400,
            Error::State { code, .. } if *code == "COOLDOWN_ACTIVE" => 429,
            Error::State { code, .. } if *code == "ACTIVE_SESSION_EXISTS" => 409,
            Error::State { .. } => 409,
            Error::NotFound { .. } => 404,
            Error::Forbidden { .. } => 403,
            Error::Capacity { code, .. } if *code == "DAILY_LIMIT_REACHED" => 429,
            Error::Capacity { .. } => 400,
            Error::Conflict { .. } => 409,
            Error::External { .. } => 502,
            Error::Fatal { .. } => 500,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Input { code, message } => write!(f, "input error [{code}]: {message}"),
            Error::State { code, message } => write!(f, "state error [{code}]: {message}"),
            Error::NotFound { message } => write!(f, "not found: {message}"),
            Error::Forbidden { message } => write!(f, "forbidden: {message}"),
            Error::Capacity { code, message } => write!(f, "capacity error [{code}]: {message}"),
            Error::Conflict { message } => write!(f, "conflict: {message}"),
            Error::External { message, retriable } => {
                write!(f, "external error (retriable={retriable}): {message}")
            }
            Error::Fatal { message } => write!(f, "fatal: {message}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_retriable_flag_drives_retry_decision() {
        assert!(Error::external("timeout", true).is_retriable());
        assert!(!Error::external("bad signature", false).is_retriable());
        assert!(!Error::invalid_forge_set("wrong shape").is_retriable());
    }

    #[test]
    fn codes_match_http_surface_table() {
        assert_eq!(Error::insufficient_questions().code(), Some("INSUFFICIENT_QUESTIONS"));
        assert_eq!(Error::active_session_exists().code(), Some("ACTIVE_SESSION_EXISTS"));
        assert_eq!(Error::daily_limit_reached().code(), Some("DAILY_LIMIT_REACHED"));
        assert_eq!(Error::cooldown_active().code(), Some("COOLDOWN_ACTIVE"));
    }

    #[test]
    fn suggested_statuses_map_to_expected_http_codes() {
        assert_eq!(Error::insufficient_questions().suggested_status(), 400);
        assert_eq!(Error::active_session_exists().suggested_status(), 409);
        assert_eq!(Error::daily_limit_reached().suggested_status(), 429);
        assert_eq!(Error::cooldown_active().suggested_status(), 429);
        assert_eq!(Error::session_not_found().suggested_status(), 404);
        assert_eq!(Error::forbidden("not yours").suggested_status(), 403);
    }
}

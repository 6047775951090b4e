//! Builder methods for constructing LError instances

use super::types::{ErrorKind, LError};
use crate::vm::EvalError;

impl LError {
    pub fn unresolved(names: Vec<String>) -> Self {
        LError::new(ErrorKind::UnresolvedIdentifier { names })
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        LError::new(ErrorKind::Syntax {
            message: message.into(),
        })
    }

    pub fn internal(message: impl Into<String>) -> Self {
        LError::new(ErrorKind::Internal {
            message: message.into(),
        })
    }

    pub fn io(message: impl Into<String>) -> Self {
        LError::new(ErrorKind::Io {
            message: message.into(),
        })
    }
}

impl From<EvalError> for LError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::Io(message) => LError::io(message),
            other => LError::internal(other.to_string()),
        }
    }
}

//! Evaluation environments
//!
//! Inside a lambda body index 0 is the argument and index `i > 0` is
//! captured slot `i - 1`. Rather than copying the captured vector with the
//! argument pushed in front, the argument is kept as an overlay over the
//! closure's environment. The statement level has no argument: its indices
//! address the bound globals directly.

use super::types::EvalError;
use crate::value::Closure;
use std::sync::Arc;

/// Borrowed environment for the sequential evaluator
#[derive(Debug, Clone, Copy)]
pub struct ShadowEnv<'a> {
    overlay: Option<&'a Closure>,
    base: &'a [Closure],
}

impl<'a> ShadowEnv<'a> {
    /// Statement level: index `i` is `base[i]`
    pub fn flat(base: &'a [Closure]) -> Self {
        ShadowEnv {
            overlay: None,
            base,
        }
    }

    /// Lambda body: index 0 is `arg`, index `i` is `base[i - 1]`
    pub fn with_overlay(arg: &'a Closure, base: &'a [Closure]) -> Self {
        ShadowEnv {
            overlay: Some(arg),
            base,
        }
    }

    #[inline]
    pub fn get(&self, index: usize) -> Result<&'a Closure, EvalError> {
        let found = match self.overlay {
            Some(arg) if index == 0 => Some(arg),
            Some(_) => self.base.get(index - 1),
            None => self.base.get(index),
        };
        found.ok_or(EvalError::UnboundIndex {
            index,
            len: self.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.overlay.is_some() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned environment, sendable to another worker
#[derive(Debug, Clone)]
pub struct OwnedEnv {
    overlay: Option<Closure>,
    base: Arc<[Closure]>,
}

impl OwnedEnv {
    pub fn flat(base: impl Into<Arc<[Closure]>>) -> Self {
        OwnedEnv {
            overlay: None,
            base: base.into(),
        }
    }

    pub fn with_overlay(arg: Closure, base: Arc<[Closure]>) -> Self {
        OwnedEnv {
            overlay: Some(arg),
            base,
        }
    }

    pub fn as_shadow(&self) -> ShadowEnv<'_> {
        ShadowEnv {
            overlay: self.overlay.as_ref(),
            base: &self.base,
        }
    }

    pub fn get(&self, index: usize) -> Result<&Closure, EvalError> {
        self.as_shadow().get(index)
    }
}

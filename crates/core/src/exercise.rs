//! # Exercise Module
//!
//! An Exercise is a fiscal period. It fixes the code length of every
//! sub-account created inside it.

use crate::code::code_len;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// State of an Exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseState {
    /// Accepting new accounting data
    Open,
    /// Closed fiscal period
    Closed,
}

impl ExerciseState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseState::Open => "open",
            ExerciseState::Closed => "closed",
        }
    }
}

impl FromStr for ExerciseState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" | "abierto" => Ok(ExerciseState::Open),
            "closed" | "cerrado" => Ok(ExerciseState::Closed),
            _ => Err(CoreError::invalid_value("exercise state", s)),
        }
    }
}

impl fmt::Display for ExerciseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fiscal period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    /// Exercise code (e.g. "2026")
    pub code: String,
    pub name: String,
    pub state: ExerciseState,
    /// Exact length of every sub-account code in this exercise
    pub subaccount_code_length: usize,
}

impl Exercise {
    pub fn new(code: &str, name: &str, subaccount_code_length: usize) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            state: ExerciseState::Open,
            subaccount_code_length,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == ExerciseState::Open
    }

    pub fn close(&mut self) {
        self.state = ExerciseState::Closed;
    }

    /// Whether `code` has the sub-account length of this exercise
    pub fn fits_code(&self, code: &str) -> bool {
        code_len(code) == self.subaccount_code_length
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exercise {} ({}, {}, code length {})",
            self.code, self.name, self.state, self.subaccount_code_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_state_parse() {
        assert_eq!("open".parse::<ExerciseState>().unwrap(), ExerciseState::Open);
        assert_eq!("CERRADO".parse::<ExerciseState>().unwrap(), ExerciseState::Closed);
        assert!("archived".parse::<ExerciseState>().is_err());
    }

    #[test]
    fn test_exercise_fits_code() {
        let mut exercise = Exercise::new("2026", "Fiscal year 2026", 10);
        assert!(exercise.is_open());
        assert!(exercise.fits_code("5700000001"));
        assert!(!exercise.fits_code("570000001"));
        assert!(!exercise.fits_code("570.1"));

        exercise.close();
        assert!(!exercise.is_open());
        assert_eq!(exercise.state.to_string(), "closed");
    }
}

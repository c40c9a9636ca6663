//! Business layer errors
//!
//! Every failure the allocator and quick-create services can report, as a
//! typed kind the caller can match on.

use thiserror::Error;

/// Business operation errors
#[derive(Debug, Error)]
pub enum BusinessError {
    // === Code validation errors ===
    #[error("Sub-account code is required")]
    EmptyCode,

    #[error("Invalid code length for {code}: expected {expected}, got {actual}")]
    InvalidCodeLength {
        code: String,
        expected: usize,
        actual: usize,
    },

    #[error("Sub-account already exists: {code} in exercise {exercise}")]
    DuplicateCode { code: String, exercise: String },

    #[error("Sub-account code {code} does not belong to account {parent}")]
    CodeOutsideParent { code: String, parent: String },

    // === Not found errors ===
    #[error("Parent account not found for {0}")]
    ParentNotFound(String),

    #[error("Account {parent} does not exist in exercise {exercise}")]
    ParentNotFoundInExercise { parent: String, exercise: String },

    #[error("Exercise not found: {0}")]
    ExerciseNotFound(String),

    // === Allocation errors ===
    #[error("No free sub-account code left under {parent} in exercise {exercise}")]
    CodeSpaceExhausted { parent: String, exercise: String },

    #[error("Account code {parent} leaves no room for a suffix in {length} characters")]
    ParentCodeTooLong { parent: String, length: usize },

    // === Product errors ===
    #[error("Product reference is required")]
    ReferenceRequired,

    #[error("Product reference already exists: {0}")]
    DuplicateReference(String),

    #[error("Unknown {kind}: {code}")]
    UnknownLookup { kind: String, code: String },

    // === Wrapped errors ===
    #[error("Persistence error: {0}")]
    Persistence(#[from] quickcreate_persistence::PersistenceError),

    #[error("Core error: {0}")]
    Core(#[from] quickcreate_core::CoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for business operations
pub type BusinessResult<T> = Result<T, BusinessError>;

impl BusinessError {
    /// Create invalid code length error
    pub fn invalid_code_length(code: &str, expected: usize, actual: usize) -> Self {
        Self::InvalidCodeLength {
            code: code.to_string(),
            expected,
            actual,
        }
    }

    /// Create duplicate code error
    pub fn duplicate_code(code: &str, exercise: &str) -> Self {
        Self::DuplicateCode {
            code: code.to_string(),
            exercise: exercise.to_string(),
        }
    }

    pub fn parent_not_found_in_exercise(parent: &str, exercise: &str) -> Self {
        Self::ParentNotFoundInExercise {
            parent: parent.to_string(),
            exercise: exercise.to_string(),
        }
    }

    /// Create code space exhausted error
    pub fn exhausted(parent: &str, exercise: &str) -> Self {
        Self::CodeSpaceExhausted {
            parent: parent.to_string(),
            exercise: exercise.to_string(),
        }
    }

    pub fn is_duplicate_code(&self) -> bool {
        matches!(self, Self::DuplicateCode { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ParentNotFound(_)
                | Self::ParentNotFoundInExercise { .. }
                | Self::ExerciseNotFound(_)
        )
    }

    /// Stable message key for API responses
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::EmptyCode => "account-code-required",
            Self::InvalidCodeLength { .. } => "account-code-wrong-length",
            Self::DuplicateCode { .. } => "account-already-exists",
            Self::CodeOutsideParent { .. } => "account-code-outside-parent",
            Self::ParentNotFound(_) => "parent-account-not-found",
            Self::ParentNotFoundInExercise { .. } => "parent-account-not-found-in-exercise",
            Self::ExerciseNotFound(_) => "exercise-not-found",
            Self::CodeSpaceExhausted { .. } => "code-space-exhausted",
            Self::ParentCodeTooLong { .. } => "account-code-too-long",
            Self::ReferenceRequired => "reference-required",
            Self::DuplicateReference(_) => "reference-already-exists",
            Self::UnknownLookup { .. } => "invalid-product-option",
            Self::Persistence(_) | Self::Core(_) | Self::Serialization(_) => "internal-error",
        }
    }
}

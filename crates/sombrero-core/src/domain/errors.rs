use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SombreroResult<T> = Result<T, SombreroError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SombreroErrorCategory {
    Success,
    InputValidationError,
    NotFoundError,
    PreconditionConflict,
    IoSystemError,
    UnresolvableSource,
    InternalError,
}

impl SombreroErrorCategory {
    pub const fn exit_mapping(self) -> ExitMapping {
        match self {
            Self::Success => ExitMapping {
                exit_code: 0,
                rust_category: "Success",
            },
            Self::InputValidationError => ExitMapping {
                exit_code: 2,
                rust_category: "InputValidationError",
            },
            Self::NotFoundError => ExitMapping {
                exit_code: 3,
                rust_category: "NotFoundError",
            },
            Self::PreconditionConflict => ExitMapping {
                exit_code: 4,
                rust_category: "PreconditionConflict",
            },
            Self::IoSystemError => ExitMapping {
                exit_code: 5,
                rust_category: "IoSystemError",
            },
            Self::UnresolvableSource => ExitMapping {
                exit_code: 6,
                rust_category: "UnresolvableSource",
            },
            Self::InternalError => ExitMapping {
                exit_code: 7,
                rust_category: "InternalError",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_mapping().exit_code
    }

    pub const fn rust_category(self) -> &'static str {
        self.exit_mapping().rust_category
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitMapping {
    pub exit_code: i32,
    pub rust_category: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SombreroError {
    category: SombreroErrorCategory,
    code: &'static str,
    message: String,
}

impl SombreroError {
    pub fn new(
        category: SombreroErrorCategory,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn input_validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(SombreroErrorCategory::InputValidationError, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(SombreroErrorCategory::NotFoundError, code, message)
    }

    pub fn precondition_conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(SombreroErrorCategory::PreconditionConflict, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(SombreroErrorCategory::IoSystemError, code, message)
    }

    pub fn unresolvable_source(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(SombreroErrorCategory::UnresolvableSource, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(SombreroErrorCategory::InternalError, code, message)
    }

    pub const fn category(&self) -> SombreroErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "INFO"
        };
        format!("{}: [{}] {}", severity, self.code, self.message)
    }
}

impl Display for SombreroError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.rust_category(),
            self.code,
            self.message
        )
    }
}

impl Error for SombreroError {}

use std::fmt::{Display, Formatter};

pub type DssatResult<T> = Result<T, DssatError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DssatErrorCategory {
    InputValidation,
    IoSystem,
    Computation,
    Database,
    Internal,
}

impl DssatErrorCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidation => "INPUT",
            Self::IoSystem => "IO",
            Self::Computation => "RUN",
            Self::Database => "DB",
            Self::Internal => "SYS",
        }
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidation => 2,
            Self::IoSystem => 3,
            Self::Computation => 4,
            Self::Database => 5,
            Self::Internal => 6,
        }
    }
}

impl Display for DssatErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Structured failure carried through every fallible operation in the
/// bridge. The placeholder is a stable machine-readable code naming the
/// failure site; the message carries the human diagnostic.
#[derive(Debug, Clone, thiserror::Error)]
#[error("[{placeholder}] {message}")]
pub struct DssatError {
    category: DssatErrorCategory,
    placeholder: String,
    message: String,
}

impl DssatError {
    fn new(
        category: DssatErrorCategory,
        placeholder: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder: placeholder.into(),
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DssatErrorCategory::InputValidation, placeholder, message)
    }

    pub fn io_system(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DssatErrorCategory::IoSystem, placeholder, message)
    }

    pub fn computation(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DssatErrorCategory::Computation, placeholder, message)
    }

    pub fn database(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DssatErrorCategory::Database, placeholder, message)
    }

    pub fn internal(placeholder: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DssatErrorCategory::Internal, placeholder, message)
    }

    pub fn category(&self) -> DssatErrorCategory {
        self.category
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR [{}] {}", self.placeholder, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::{DssatError, DssatErrorCategory};

    #[test]
    fn constructors_tag_the_expected_category() {
        let error = DssatError::database("DB.CULTIVAR_QUERY", "connection refused");
        assert_eq!(error.category(), DssatErrorCategory::Database);
        assert_eq!(error.placeholder(), "DB.CULTIVAR_QUERY");
        assert_eq!(error.exit_code(), 5);
    }

    #[test]
    fn diagnostic_line_carries_placeholder_and_message() {
        let error = DssatError::io_system("IO.RUN_ARTIFACT_RENAME", "missing PlantGro.OUT");
        assert_eq!(
            error.diagnostic_line(),
            "ERROR [IO.RUN_ARTIFACT_RENAME] missing PlantGro.OUT"
        );
        assert_eq!(error.to_string(), "[IO.RUN_ARTIFACT_RENAME] missing PlantGro.OUT");
    }

    #[test]
    fn exit_codes_are_distinct_per_category() {
        let codes = [
            DssatErrorCategory::InputValidation.exit_code(),
            DssatErrorCategory::IoSystem.exit_code(),
            DssatErrorCategory::Computation.exit_code(),
            DssatErrorCategory::Database.exit_code(),
            DssatErrorCategory::Internal.exit_code(),
        ];
        for (index, code) in codes.iter().enumerate() {
            assert_eq!(codes.iter().filter(|candidate| *candidate == code).count(), 1, "duplicate exit code at {index}");
        }
    }
}

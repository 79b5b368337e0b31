use thiserror::Error;

/// Requests rejected before the assessment core runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Variant file is empty")]
    EmptyFile,
    #[error("Variant file is too large: {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("Failed to read variant file {path}: {message}")]
    Unreadable { path: String, message: String },
    #[error("No drug names were provided")]
    NoDrugs,
    #[error("Unsupported drug(s): {}", .0.join(", "))]
    UnsupportedDrugs(Vec<String>),
}

impl From<InputError> for String {
    fn from(err: InputError) -> Self {
        err.to_string()
    }
}

use thiserror::Error;

pub type NsResult<T> = Result<T, NsError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NsError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Value out of range for {what}")]
    OutOfRange { what: &'static str },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },

    #[error("Convergence failed: {what}")]
    Convergence { what: &'static str },
}

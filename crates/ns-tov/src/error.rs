use ns_core::Real;
use thiserror::Error;

pub type TovResult<T> = Result<T, TovError>;

#[derive(Error, Debug)]
pub enum TovError {
    #[error("Integration diverged: {what}")]
    Diverged { what: &'static str },

    #[error("Solved mass {mass} misses target {target} beyond the requested tolerance")]
    Convergence { mass: Real, target: Real },

    #[error(transparent)]
    Eos(#[from] ns_eos::EosError),

    #[error(transparent)]
    Core(#[from] ns_core::NsError),

    #[error(transparent)]
    Table(#[from] ns_table::TableError),
}

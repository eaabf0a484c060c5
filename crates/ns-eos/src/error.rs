use thiserror::Error;

pub type EosResult<T> = Result<T, EosError>;

#[derive(Error, Debug)]
pub enum EosError {
    #[error("No core table loaded")]
    NoCoreTable,

    #[error("No low-density (crust) EOS loaded")]
    NoCrust,

    #[error("Malformed EOS data: {what}")]
    Data { what: &'static str },

    #[error(transparent)]
    Core(#[from] ns_core::NsError),

    #[error(transparent)]
    Table(#[from] ns_table::TableError),
}

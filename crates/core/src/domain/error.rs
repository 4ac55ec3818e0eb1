// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid crate count: {0} (must be between 0 and {max})", max = u32::MAX)]
    InvalidCrateCount(i64),

    #[error("Duplicate machine id in roster: {0}")]
    DuplicateMachine(u32),

    #[error("Machine {0} has a blank name")]
    BlankMachineName(u32),

    #[error("Machine roster is empty")]
    EmptyRoster,

    #[error("Unknown search field: {0}")]
    UnknownSearchField(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

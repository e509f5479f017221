//! Error kinds shared by the map and its collaborators.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("invalid {what}: {value}")]
    InvalidArgument { what: &'static str, value: String },
    #[error("key not found")]
    KeyNotFound,
    #[error("duplicate key")]
    DuplicateKey,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

impl Error {
    pub(crate) fn out_of_bounds(index: usize, len: usize) -> Self {
        Error::IndexOutOfBounds { index, len }
    }

    pub(crate) fn invalid(what: &'static str, value: impl ToString) -> Self {
        Error::InvalidArgument {
            what,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        assert_eq!(
            Error::out_of_bounds(4, 2).to_string(),
            "index 4 out of bounds for length 2"
        );
        assert_eq!(
            Error::invalid("load factor", -1.0).to_string(),
            "invalid load factor: -1"
        );
        assert_eq!(Error::KeyNotFound.to_string(), "key not found");
        assert_eq!(Error::DuplicateKey.to_string(), "duplicate key");
    }
}

use std::num::ParseIntError;

use snafu::Snafu;

use super::ids::MessageIndex;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    #[snafu(display("message {index} is out of range for a store of {len} messages"))]
    OutOfRange {
        stage: &'static str,
        index: MessageIndex,
        len: usize,
    },
    #[snafu(display("store id '{raw}' is invalid for {id_type}"))]
    InvalidId {
        stage: &'static str,
        id_type: &'static str,
        raw: String,
        source: ParseIntError,
    },
    #[snafu(display("store invariant violation: {details}"))]
    InvariantViolation {
        stage: &'static str,
        details: String,
    },
}

impl StoreError {
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

use std::fmt;
use std::str::FromStr;

use snafu::ResultExt;

use super::error::{InvalidIdSnafu, StoreError, StoreResult};

// Macro keeps the positional wrappers structurally identical.
macro_rules! define_store_id {
    ($name:ident, $raw:ty, $id_type:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub $raw);

        impl $name {
            pub const fn new(raw: $raw) -> Self {
                Self(raw)
            }

            pub fn parse(raw: &str) -> StoreResult<Self> {
                let parsed = raw.trim().parse::<$raw>().context(InvalidIdSnafu {
                    stage: "parse-store-id",
                    id_type: $id_type,
                    raw: raw.to_string(),
                })?;
                Ok(Self(parsed))
            }

            pub const fn get(&self) -> $raw {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }

        impl From<$raw> for $name {
            fn from(value: $raw) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for $raw {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = StoreError;

            fn from_str(raw: &str) -> StoreResult<Self> {
                Self::parse(raw)
            }
        }
    };
}

// Positional identity: a message's index is assigned on append and never reused.
define_store_id!(MessageIndex, usize, "message-index");
define_store_id!(RequestSeq, u64, "request-seq");

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ExecutionError;

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a random (version 4) identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ExecutionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|e| {
                    ExecutionError::invalid(format!("{} `{s}`: {e}", stringify!($name)))
                })
            }
        }
    };
}

define_id_type!(JobId);
define_id_type!(NodeId);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionResult;

    #[test]
    fn test_id_parse() -> ExecutionResult<()> {
        let id = JobId::generate();
        assert_eq!(id.to_string().parse::<JobId>()?, id);
        assert!(matches!(
            "not-a-uuid".parse::<NodeId>(),
            Err(ExecutionError::InvalidArgument(_))
        ));
        Ok(())
    }

    #[test]
    fn test_id_serde_transparent() -> ExecutionResult<()> {
        let id = JobId::generate();
        assert_eq!(serde_json::to_string(&id)?, format!("\"{id}\""));
        Ok(())
    }
}

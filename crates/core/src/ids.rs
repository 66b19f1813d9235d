use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &self.0.to_string()[..8])
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(UndoActionId);

/// Row identifier assigned by the persistence layer.
pub type SampleId = i64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_action_ids_are_time_ordered() {
        let a = UndoActionId::new();
        let b = UndoActionId::new();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn debug_shows_short_prefix() {
        let id = UndoActionId::new();
        let debug = format!("{id:?}");
        assert!(debug.starts_with("UndoActionId("));
        assert_eq!(debug.len(), "UndoActionId()".len() + 8);
    }
}

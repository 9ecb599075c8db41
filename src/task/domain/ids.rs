//! Identifier types for the task workflow domain.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a service request task.
    TaskId
);

uuid_identifier!(
    /// Identifier of a customer account.
    CustomerId
);

uuid_identifier!(
    /// Identifier of a fulfilling company account.
    CompanyId
);

uuid_identifier!(
    /// Identifier of a professional account.
    ProfessionalId
);

uuid_identifier!(
    /// Identifier of a catalog service a task is requested for.
    ServiceId
);

uuid_identifier!(
    /// Identifier of an uploaded document record.
    DocumentId
);

uuid_identifier!(
    /// Identifier of a status ledger entry.
    StatusUpdateId
);

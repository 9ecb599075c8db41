//! Acting identities and their roles.
//!
//! The identity context is supplied by an already-authenticated caller. The
//! workflow trusts it completely and only uses it for role and ownership
//! decisions.

use super::{CompanyId, CustomerId, ParseActorRoleError, ProfessionalId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Role an actor holds in the fulfilment workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorRole {
    /// Requests a service.
    Customer,
    /// Executes assigned work.
    Professional,
    /// Triages and assigns requests.
    Company,
}

impl ActorRole {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Professional => "Professional",
            Self::Company => "Company",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ActorRole {
    type Error = ParseActorRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "professional" => Ok(Self::Professional),
            "company" => Ok(Self::Company),
            _ => Err(ParseActorRoleError(value.to_owned())),
        }
    }
}

/// Authenticated caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "id")]
pub enum Actor {
    /// A customer acting on their own requests.
    Customer(CustomerId),
    /// A professional acting on tasks assigned to them.
    Professional(ProfessionalId),
    /// A company acting on tasks routed to it.
    Company(CompanyId),
}

impl Actor {
    /// Returns the role projection of this actor.
    #[must_use]
    pub const fn role(self) -> ActorRole {
        match self {
            Self::Customer(_) => ActorRole::Customer,
            Self::Professional(_) => ActorRole::Professional,
            Self::Company(_) => ActorRole::Company,
        }
    }

    /// Returns the raw identifier regardless of role.
    #[must_use]
    pub const fn id(self) -> Uuid {
        match self {
            Self::Customer(id) => id.into_inner(),
            Self::Professional(id) => id.into_inner(),
            Self::Company(id) => id.into_inner(),
        }
    }

    /// Rebuilds an actor from its persisted role and identifier.
    #[must_use]
    pub const fn from_parts(role: ActorRole, id: Uuid) -> Self {
        match role {
            ActorRole::Customer => Self::Customer(CustomerId::from_uuid(id)),
            ActorRole::Professional => Self::Professional(ProfessionalId::from_uuid(id)),
            ActorRole::Company => Self::Company(CompanyId::from_uuid(id)),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role(), self.id())
    }
}

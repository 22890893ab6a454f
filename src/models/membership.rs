//! Membership model - the user/organization edge and its role semantics.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Membership lifecycle. Wire codes are fixed by the client protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipStatus {
    Invited,
    Accepted,
    Confirmed,
}

impl MembershipStatus {
    pub fn code(self) -> i32 {
        match self {
            MembershipStatus::Invited => 0,
            MembershipStatus::Accepted => 1,
            MembershipStatus::Confirmed => 2,
        }
    }
}

/// Organization role. Wire codes (Owner=0, Admin=1, User=2, Manager=3) are
/// fixed by the client protocol and deliberately non-monotonic in privilege,
/// so every check below is an explicit set; ordinal comparison of these
/// codes is never meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipRole {
    Owner,
    Admin,
    User,
    Manager,
}

impl MembershipRole {
    pub fn code(self) -> i32 {
        match self {
            MembershipRole::Owner => 0,
            MembershipRole::Admin => 1,
            MembershipRole::User => 2,
            MembershipRole::Manager => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(MembershipRole::Owner),
            1 => Some(MembershipRole::Admin),
            2 => Some(MembershipRole::User),
            3 => Some(MembershipRole::Manager),
            _ => None,
        }
    }

    /// Roles allowed through the admin gate and granted blanket cipher
    /// access: Owner and Admin.
    pub fn is_admin_or_owner(self) -> bool {
        matches!(self, MembershipRole::Owner | MembershipRole::Admin)
    }

    /// Roles allowed through the manager gates: Owner, Admin, Manager.
    pub fn is_manager_or_better(self) -> bool {
        matches!(
            self,
            MembershipRole::Owner | MembershipRole::Admin | MembershipRole::Manager
        )
    }
}

/// The user/organization edge.
#[derive(Debug, Clone)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub org_id: Uuid,

    /// Blanket access to every collection of the organization, bypassing
    /// per-collection grants.
    pub access_all: bool,
    /// Organization symmetric key, encrypted to this user.
    pub akey: Option<String>,

    pub status: MembershipStatus,
    pub role: MembershipRole,
}

impl Membership {
    pub fn new(user_id: Uuid, org_id: Uuid, role: MembershipRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            org_id,
            access_all: false,
            akey: None,
            status: MembershipStatus::Invited,
            role,
        }
    }
}

/// Store query filter; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct MembershipFilter {
    pub user_id: Option<Uuid>,
    pub org_id: Option<Uuid>,
    pub status: Option<MembershipStatus>,
    pub role: Option<MembershipRole>,
}

impl MembershipFilter {
    pub fn matches(&self, m: &Membership) -> bool {
        self.user_id.map_or(true, |u| m.user_id == u)
            && self.org_id.map_or(true, |o| m.org_id == o)
            && self.status.map_or(true, |s| m.status == s)
            && self.role.map_or(true, |r| m.role == r)
    }
}

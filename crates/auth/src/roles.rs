//! Role model for the three nested scopes (platform, community, group).
//!
//! Roles are scope-local: a platform role never implies a community or group
//! role. Each scope has exactly one override role that satisfies any
//! requirement at that scope, and only at that scope.

use serde::{Deserialize, Serialize};

use guildhall_core::{CommunityId, GroupId};

/// Platform-wide role carried in session tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformRole {
    #[default]
    Member,
    Admin,
    /// Universal override: passes every platform-role check.
    SuperAdmin,
}

/// Membership role inside a single community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommunityRole {
    Member,
    LeaderCandidate,
    /// Community-local override.
    Admin,
}

/// Membership role inside a single group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupRole {
    Member,
    CoLeader,
    /// Group-local override.
    Leader,
}

/// Normalize user input: case-insensitive, `_` and `-` interchangeable.
fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase().replace('_', "-")
}

impl PlatformRole {
    pub const OVERRIDE: Self = Self::SuperAdmin;

    /// `true` iff this role satisfies `required` (exact match or override).
    pub fn permits(self, required: Self) -> bool {
        self == required || self == Self::OVERRIDE
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::SuperAdmin => "super-admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match normalize(s).as_str() {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            "super-admin" | "superadmin" => Some(Self::SuperAdmin),
            _ => None,
        }
    }
}

impl CommunityRole {
    pub const OVERRIDE: Self = Self::Admin;

    pub fn permits(self, required: Self) -> bool {
        self == required || self == Self::OVERRIDE
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::LeaderCandidate => "leader-candidate",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match normalize(s).as_str() {
            "member" => Some(Self::Member),
            "leader-candidate" => Some(Self::LeaderCandidate),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl GroupRole {
    pub const OVERRIDE: Self = Self::Leader;

    pub fn permits(self, required: Self) -> bool {
        self == required || self == Self::OVERRIDE
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::CoLeader => "co-leader",
            Self::Leader => "leader",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match normalize(s).as_str() {
            "member" => Some(Self::Member),
            "co-leader" => Some(Self::CoLeader),
            "leader" => Some(Self::Leader),
            _ => None,
        }
    }
}

macro_rules! impl_role_display {
    ($($t:ty),*) => {
        $(
            impl core::fmt::Display for $t {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

impl_role_display!(PlatformRole, CommunityRole, GroupRole);

/// Kind of a nested scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Community,
    Group,
}

impl core::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ScopeKind::Community => f.write_str("community"),
            ScopeKind::Group => f.write_str("group"),
        }
    }
}

/// A concrete nested scope a role is evaluated in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Scope {
    Community(CommunityId),
    Group(GroupId),
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            Scope::Community(_) => ScopeKind::Community,
            Scope::Group(_) => ScopeKind::Group,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Scope::Community(id) => id.as_str(),
            Scope::Group(id) => id.as_str(),
        }
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// A role held in a nested scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "role", rename_all = "snake_case")]
pub enum ScopeRole {
    Community(CommunityRole),
    Group(GroupRole),
}

impl ScopeRole {
    pub fn kind(&self) -> ScopeKind {
        match self {
            ScopeRole::Community(_) => ScopeKind::Community,
            ScopeRole::Group(_) => ScopeKind::Group,
        }
    }

    pub fn as_community(&self) -> Option<CommunityRole> {
        match self {
            ScopeRole::Community(r) => Some(*r),
            ScopeRole::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<GroupRole> {
        match self {
            ScopeRole::Group(r) => Some(*r),
            ScopeRole::Community(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeRole::Community(r) => r.as_str(),
            ScopeRole::Group(r) => r.as_str(),
        }
    }
}

pub mod auth;

pub use auth::{
    require_admin_auth, require_auth, require_manager_auth, require_manager_loose_auth,
    require_org_auth, require_owner_auth, AuthDevice, AuthUser, OrgMembership,
};

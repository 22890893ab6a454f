//! Cipher access resolution.
//!
//! Pure given a storage snapshot: no writes, and callers may serialize
//! repeated calls per request without the answer shifting under them.

use uuid::Uuid;

use crate::models::{Cipher, MembershipStatus};
use crate::store::{CollectionGrantStore, MembershipStore};

use super::error::ServiceError;

/// The access tier for one (cipher, user) pair. `None` from the resolver
/// means no access at all; callers must never read absence as full access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherAccess {
    pub read_only: bool,
    pub hide_passwords: bool,
}

impl CipherAccess {
    pub const FULL: CipherAccess = CipherAccess {
        read_only: false,
        hide_passwords: false,
    };
}

/// Resolve what `user_id` may do to `cipher`.
///
/// 1. Personal ownership grants full access.
/// 2. A Confirmed org membership grants full access when it carries
///    `access_all` or an elevated role. Elevated means Owner or Admin - the
///    same set the admin gate uses; Manager goes through collection grants
///    like a plain User.
/// 3. Otherwise the per-collection grant decides, verbatim; no grant means
///    no access.
pub async fn cipher_access(
    cipher: &Cipher,
    user_id: Uuid,
    memberships: &dyn MembershipStore,
    grants: &dyn CollectionGrantStore,
) -> Result<Option<CipherAccess>, ServiceError> {
    if cipher.user_id == Some(user_id) {
        return Ok(Some(CipherAccess::FULL));
    }

    if let Some(org_id) = cipher.org_id {
        if let Some(membership) = memberships.find_by_user_and_org(user_id, org_id).await? {
            if membership.status == MembershipStatus::Confirmed
                && (membership.access_all || membership.role.is_admin_or_owner())
            {
                return Ok(Some(CipherAccess::FULL));
            }
        }
    }

    let grant = grants.find_by_user_and_cipher(user_id, cipher.id).await?;
    Ok(grant.map(|g| CipherAccess {
        read_only: g.read_only,
        hide_passwords: g.hide_passwords,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CollectionGrant, Membership, MembershipRole};
    use crate::store::{MemoryGrantStore, MemoryMembershipStore};

    struct Fixture {
        memberships: MemoryMembershipStore,
        grants: MemoryGrantStore,
        org_id: Uuid,
        collection_id: Uuid,
    }

    fn fixture() -> Fixture {
        let grants = MemoryGrantStore::new();
        let org_id = Uuid::new_v4();
        let collection_id = Uuid::new_v4();
        grants.register_collection(collection_id, org_id);
        Fixture {
            memberships: MemoryMembershipStore::new(),
            grants,
            org_id,
            collection_id,
        }
    }

    async fn member(
        fx: &Fixture,
        role: MembershipRole,
        status: MembershipStatus,
        access_all: bool,
    ) -> Uuid {
        let user_id = Uuid::new_v4();
        let mut membership = Membership::new(user_id, fx.org_id, role);
        membership.status = status;
        membership.access_all = access_all;
        fx.memberships.save(&membership).await.unwrap();
        user_id
    }

    #[tokio::test]
    async fn owner_of_a_personal_cipher_has_full_access() {
        let fx = fixture();
        let user_id = Uuid::new_v4();
        let cipher = Cipher::personal(user_id, "my login".to_string());

        let access = cipher_access(&cipher, user_id, &fx.memberships, &fx.grants)
            .await
            .unwrap();
        assert_eq!(access, Some(CipherAccess::FULL));
    }

    #[tokio::test]
    async fn stranger_gets_no_access_not_full_access() {
        let fx = fixture();
        let cipher = Cipher::personal(Uuid::new_v4(), "someone else's".to_string());

        let access = cipher_access(&cipher, Uuid::new_v4(), &fx.memberships, &fx.grants)
            .await
            .unwrap();
        assert_eq!(access, None);
    }

    #[tokio::test]
    async fn access_all_beats_any_conflicting_grant() {
        let fx = fixture();
        let user_id = member(&fx, MembershipRole::User, MembershipStatus::Confirmed, true).await;
        let cipher = Cipher::organizational(fx.org_id, "shared".to_string());
        fx.grants.link_cipher(cipher.id, fx.collection_id);
        fx.grants
            .save(&CollectionGrant {
                collection_id: fx.collection_id,
                user_id,
                read_only: true,
                hide_passwords: true,
            })
            .await
            .unwrap();

        let access = cipher_access(&cipher, user_id, &fx.memberships, &fx.grants)
            .await
            .unwrap();
        assert_eq!(access, Some(CipherAccess::FULL));
    }

    #[tokio::test]
    async fn elevated_roles_are_owner_and_admin_only() {
        let fx = fixture();
        let cipher = Cipher::organizational(fx.org_id, "shared".to_string());

        for role in [MembershipRole::Owner, MembershipRole::Admin] {
            let user_id = member(&fx, role, MembershipStatus::Confirmed, false).await;
            let access = cipher_access(&cipher, user_id, &fx.memberships, &fx.grants)
                .await
                .unwrap();
            assert_eq!(access, Some(CipherAccess::FULL), "role {role:?}");
        }

        // Manager and User fall through to collection grants; with none,
        // they get nothing - regression pin for the role policy.
        for role in [MembershipRole::Manager, MembershipRole::User] {
            let user_id = member(&fx, role, MembershipStatus::Confirmed, false).await;
            let access = cipher_access(&cipher, user_id, &fx.memberships, &fx.grants)
                .await
                .unwrap();
            assert_eq!(access, None, "role {role:?}");
        }
    }

    #[tokio::test]
    async fn unconfirmed_membership_grants_nothing() {
        let fx = fixture();
        let user_id = member(&fx, MembershipRole::Admin, MembershipStatus::Invited, true).await;
        let cipher = Cipher::organizational(fx.org_id, "shared".to_string());

        let access = cipher_access(&cipher, user_id, &fx.memberships, &fx.grants)
            .await
            .unwrap();
        assert_eq!(access, None);
    }

    #[tokio::test]
    async fn collection_grant_flags_are_returned_verbatim() {
        let fx = fixture();
        let user_id = member(&fx, MembershipRole::User, MembershipStatus::Confirmed, false).await;
        let cipher = Cipher::organizational(fx.org_id, "shared".to_string());
        fx.grants.link_cipher(cipher.id, fx.collection_id);
        fx.grants
            .save(&CollectionGrant {
                collection_id: fx.collection_id,
                user_id,
                read_only: true,
                hide_passwords: false,
            })
            .await
            .unwrap();

        let access = cipher_access(&cipher, user_id, &fx.memberships, &fx.grants)
            .await
            .unwrap();
        assert_eq!(
            access,
            Some(CipherAccess {
                read_only: true,
                hide_passwords: false,
            })
        );
    }
}

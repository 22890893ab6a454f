//! Organization member management: role edits and removals.
//!
//! Privilege rules here mirror the gates: Admin-level actors manage plain
//! members, Owners manage everyone, and the organization must always retain
//! at least one Confirmed Owner.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::models::{
    CollectionAssignment, CollectionGrant, Membership, MembershipFilter, MembershipRole,
    MembershipStatus, UserUpdate,
};
use crate::store::{CollectionGrantStore, MembershipStore, UserStore};

use super::error::ServiceError;

/// A role/access change for one member, with the collection grants that
/// replace their current ones when `access_all` is off.
#[derive(Debug, Clone)]
pub struct EditMembership {
    pub role: MembershipRole,
    pub access_all: bool,
    pub collections: Vec<CollectionAssignment>,
}

#[derive(Clone)]
pub struct MembershipService {
    users: Arc<dyn UserStore>,
    memberships: Arc<dyn MembershipStore>,
    grants: Arc<dyn CollectionGrantStore>,
}

impl MembershipService {
    pub fn new(
        users: Arc<dyn UserStore>,
        memberships: Arc<dyn MembershipStore>,
        grants: Arc<dyn CollectionGrantStore>,
    ) -> Self {
        Self {
            users,
            memberships,
            grants,
        }
    }

    pub async fn edit(
        &self,
        actor_role: MembershipRole,
        org_id: Uuid,
        membership_id: Uuid,
        change: EditMembership,
    ) -> Result<(), ServiceError> {
        let mut target = self
            .memberships
            .find_by_id(membership_id)
            .await?
            .filter(|m| m.org_id == org_id)
            .ok_or(ServiceError::MembershipNotFound)?;

        if (target.role.is_admin_or_owner() || change.role.is_admin_or_owner())
            && actor_role != MembershipRole::Owner
        {
            return Err(ServiceError::PermissionDenied(
                "Only Owners can grant and remove Admin or Owner privileges",
            ));
        }

        if target.role == MembershipRole::Owner && actor_role != MembershipRole::Owner {
            return Err(ServiceError::PermissionDenied(
                "Only Owners can edit Owner users",
            ));
        }

        if target.role == MembershipRole::Owner && change.role != MembershipRole::Owner {
            self.ensure_not_last_owner(org_id, &target).await?;
        }

        target.role = change.role;
        target.access_all = change.access_all;

        self.grants
            .delete_all_by_user_and_org(target.user_id, org_id)
            .await?;
        if !change.access_all {
            for assignment in &change.collections {
                self.grants
                    .save(&CollectionGrant {
                        collection_id: assignment.id,
                        user_id: target.user_id,
                        read_only: assignment.read_only,
                        hide_passwords: assignment.hide_passwords,
                    })
                    .await?;
            }
        }

        self.memberships.save(&target).await?;
        Ok(())
    }

    pub async fn remove(
        &self,
        actor_role: MembershipRole,
        org_id: Uuid,
        membership_id: Uuid,
    ) -> Result<(), ServiceError> {
        let target = self
            .memberships
            .find_by_id(membership_id)
            .await?
            .filter(|m| m.org_id == org_id)
            .ok_or(ServiceError::MembershipNotFound)?;

        if target.role != MembershipRole::User && actor_role != MembershipRole::Owner {
            return Err(ServiceError::PermissionDenied(
                "Only Owners can delete Admins or Owners",
            ));
        }

        if target.role == MembershipRole::Owner {
            self.ensure_not_last_owner(org_id, &target).await?;
        }

        // Bump the member's revision so their clients resync.
        self.users
            .update(&UserUpdate {
                updated_at: Some(Utc::now()),
                ..UserUpdate::new(target.user_id)
            })
            .await?;

        self.grants
            .delete_all_by_user_and_org(target.user_id, org_id)
            .await?;
        self.memberships.delete(target.id).await?;
        Ok(())
    }

    /// Reject the operation if it would leave the organization without a
    /// Confirmed Owner.
    async fn ensure_not_last_owner(
        &self,
        org_id: Uuid,
        target: &Membership,
    ) -> Result<(), ServiceError> {
        let owners = self
            .memberships
            .find(&MembershipFilter {
                org_id: Some(org_id),
                role: Some(MembershipRole::Owner),
                status: Some(MembershipStatus::Confirmed),
                ..Default::default()
            })
            .await?;

        let remaining = owners.iter().filter(|m| m.id != target.id).count();
        if remaining == 0 {
            return Err(ServiceError::LastOwner);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::store::{MemoryGrantStore, MemoryMembershipStore, MemoryUserStore};

    struct Fixture {
        memberships: Arc<MemoryMembershipStore>,
        grants: Arc<MemoryGrantStore>,
        service: MembershipService,
        org_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let users = Arc::new(MemoryUserStore::new());
        let memberships = Arc::new(MemoryMembershipStore::new());
        let grants = Arc::new(MemoryGrantStore::new());
        let service =
            MembershipService::new(users.clone(), memberships.clone(), grants.clone());

        Fixture {
            memberships,
            grants,
            service,
            org_id: Uuid::new_v4(),
        }
    }

    async fn confirmed_member(fx: &Fixture, role: MembershipRole) -> Membership {
        let user = User::new(format!("{}@example.com", Uuid::new_v4()), "member".into());
        let mut membership = Membership::new(user.id, fx.org_id, role);
        membership.status = MembershipStatus::Confirmed;
        fx.memberships.save(&membership).await.unwrap();
        membership
    }

    fn demote_to(role: MembershipRole) -> EditMembership {
        EditMembership {
            role,
            access_all: false,
            collections: Vec::new(),
        }
    }

    #[tokio::test]
    async fn last_confirmed_owner_cannot_be_demoted() {
        let fx = fixture().await;
        let owner = confirmed_member(&fx, MembershipRole::Owner).await;

        let err = fx
            .service
            .edit(
                MembershipRole::Owner,
                fx.org_id,
                owner.id,
                demote_to(MembershipRole::Admin),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::LastOwner));
    }

    #[tokio::test]
    async fn last_confirmed_owner_cannot_be_removed() {
        let fx = fixture().await;
        let owner = confirmed_member(&fx, MembershipRole::Owner).await;
        // A second, merely invited owner does not satisfy the invariant.
        let user = User::new("invited@example.com".into(), "invited".into());
        let invited = Membership::new(user.id, fx.org_id, MembershipRole::Owner);
        fx.memberships.save(&invited).await.unwrap();

        let err = fx
            .service
            .remove(MembershipRole::Owner, fx.org_id, owner.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::LastOwner));
    }

    #[tokio::test]
    async fn owner_can_be_demoted_when_another_confirmed_owner_remains() {
        let fx = fixture().await;
        let first = confirmed_member(&fx, MembershipRole::Owner).await;
        confirmed_member(&fx, MembershipRole::Owner).await;

        fx.service
            .edit(
                MembershipRole::Owner,
                fx.org_id,
                first.id,
                demote_to(MembershipRole::User),
            )
            .await
            .unwrap();

        let edited = fx.memberships.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(edited.role, MembershipRole::User);
    }

    #[tokio::test]
    async fn only_owners_touch_admin_privileges() {
        let fx = fixture().await;
        confirmed_member(&fx, MembershipRole::Owner).await;
        let admin = confirmed_member(&fx, MembershipRole::Admin).await;
        let plain = confirmed_member(&fx, MembershipRole::User).await;

        // An admin actor may not demote another admin...
        let err = fx
            .service
            .edit(
                MembershipRole::Admin,
                fx.org_id,
                admin.id,
                demote_to(MembershipRole::User),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));

        // ...nor promote a plain member to admin.
        let err = fx
            .service
            .edit(
                MembershipRole::Admin,
                fx.org_id,
                plain.id,
                demote_to(MembershipRole::Admin),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));

        // Managing plain members is fine.
        fx.service
            .edit(
                MembershipRole::Admin,
                fx.org_id,
                plain.id,
                demote_to(MembershipRole::Manager),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn removing_a_manager_requires_owner() {
        let fx = fixture().await;
        confirmed_member(&fx, MembershipRole::Owner).await;
        let manager = confirmed_member(&fx, MembershipRole::Manager).await;

        let err = fx
            .service
            .remove(MembershipRole::Admin, fx.org_id, manager.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));

        fx.service
            .remove(MembershipRole::Owner, fx.org_id, manager.id)
            .await
            .unwrap();
        assert!(fx
            .memberships
            .find_by_id(manager.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn edit_replaces_collection_grants() {
        let fx = fixture().await;
        confirmed_member(&fx, MembershipRole::Owner).await;
        let member = confirmed_member(&fx, MembershipRole::User).await;

        let old_collection = Uuid::new_v4();
        let new_collection = Uuid::new_v4();
        fx.grants.register_collection(old_collection, fx.org_id);
        fx.grants.register_collection(new_collection, fx.org_id);
        fx.grants
            .save(&CollectionGrant {
                collection_id: old_collection,
                user_id: member.user_id,
                read_only: false,
                hide_passwords: false,
            })
            .await
            .unwrap();

        fx.service
            .edit(
                MembershipRole::Admin,
                fx.org_id,
                member.id,
                EditMembership {
                    role: MembershipRole::User,
                    access_all: false,
                    collections: vec![CollectionAssignment {
                        id: new_collection,
                        read_only: true,
                        hide_passwords: false,
                    }],
                },
            )
            .await
            .unwrap();

        assert!(fx
            .grants
            .find_by_collection_and_user(old_collection, member.user_id)
            .await
            .unwrap()
            .is_none());
        let grant = fx
            .grants
            .find_by_collection_and_user(new_collection, member.user_id)
            .await
            .unwrap()
            .unwrap();
        assert!(grant.read_only);
    }

    #[tokio::test]
    async fn membership_from_another_org_is_not_found() {
        let fx = fixture().await;
        let foreign = {
            let user = User::new("other@example.com".into(), "other".into());
            let mut m = Membership::new(user.id, Uuid::new_v4(), MembershipRole::User);
            m.status = MembershipStatus::Confirmed;
            fx.memberships.save(&m).await.unwrap();
            m
        };

        let err = fx
            .service
            .remove(MembershipRole::Owner, fx.org_id, foreign.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::MembershipNotFound));
    }
}

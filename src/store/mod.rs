//! Store contracts consumed by the auth core.
//!
//! Persistence is a collaborator, not part of this crate's job: the services
//! and middleware only ever see these traits. Absence is modeled as
//! `Ok(None)`; `StoreError` is reserved for backend failures, which abort the
//! request unmodified.

mod memory;

pub use memory::{MemoryDeviceStore, MemoryGrantStore, MemoryMembershipStore, MemoryUserStore};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CollectionGrant, Device, Membership, MembershipFilter, User, UserUpdate,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup; email comparison is case-sensitive.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn create(&self, user: &User) -> StoreResult<()>;
    /// Sparse patch: only the `Some` fields of the update are applied.
    async fn update(&self, update: &UserUpdate) -> StoreResult<()>;
}

#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Device>>;
    async fn find_by_refresh_token(&self, token: &str) -> StoreResult<Option<Device>>;
    /// Upsert; must succeed whether or not a row pre-exists.
    async fn save(&self, device: &Device) -> StoreResult<()>;
    async fn delete(&self, id: Uuid) -> StoreResult<()>;
    async fn delete_all_by_user(&self, user_id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Membership>>;
    async fn find_by_user_and_org(
        &self,
        user_id: Uuid,
        org_id: Uuid,
    ) -> StoreResult<Option<Membership>>;
    async fn find(&self, filter: &MembershipFilter) -> StoreResult<Vec<Membership>>;
    /// Upsert keyed on the membership id.
    async fn save(&self, membership: &Membership) -> StoreResult<()>;
    async fn delete(&self, id: Uuid) -> StoreResult<()>;
    async fn delete_all_by_user(&self, user_id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait CollectionGrantStore: Send + Sync {
    async fn find_by_collection_and_user(
        &self,
        collection_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<CollectionGrant>>;
    /// Grant lookup through the cipher's collection links: the first grant
    /// the user holds on any collection containing the cipher.
    async fn find_by_user_and_cipher(
        &self,
        user_id: Uuid,
        cipher_id: Uuid,
    ) -> StoreResult<Option<CollectionGrant>>;
    async fn save(&self, grant: &CollectionGrant) -> StoreResult<()>;
    async fn delete_by_collection_and_user(
        &self,
        collection_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<()>;
    /// Remove every grant the user holds on the organization's collections.
    async fn delete_all_by_user_and_org(&self, user_id: Uuid, org_id: Uuid) -> StoreResult<()>;
}

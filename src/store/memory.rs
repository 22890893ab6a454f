//! DashMap-backed stores.
//!
//! Used by the binary wiring and throughout the test suites; a SQL-backed
//! implementation of the same traits can be swapped in without touching the
//! auth core.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{
    CollectionGrant, Device, Membership, MembershipFilter, User, UserUpdate,
};

use super::{
    CollectionGrantStore, DeviceStore, MembershipStore, StoreResult, UserStore,
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.email == email)
            .map(|entry| entry.clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn create(&self, user: &User) -> StoreResult<()> {
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, update: &UserUpdate) -> StoreResult<()> {
        if let Some(mut user) = self.users.get_mut(&update.id) {
            if let Some(name) = &update.name {
                user.name = name.clone();
            }
            if let Some(hash) = &update.password_hash {
                user.password_hash = hash.clone();
            }
            if let Some(salt) = &update.salt {
                user.salt = salt.clone();
            }
            if let Some(iterations) = update.password_iterations {
                user.password_iterations = iterations;
            }
            if let Some(hint) = &update.password_hint {
                user.password_hint = hint.clone();
            }
            if let Some(akey) = &update.akey {
                user.akey = Some(akey.clone());
            }
            if let Some(private_key) = &update.private_key {
                user.private_key = Some(private_key.clone());
            }
            if let Some(public_key) = &update.public_key {
                user.public_key = Some(public_key.clone());
            }
            if let Some(kdf_type) = update.kdf_type {
                user.kdf_type = kdf_type;
            }
            if let Some(kdf_iterations) = update.kdf_iterations {
                user.kdf_iterations = kdf_iterations;
            }
            if let Some(stamp) = &update.security_stamp {
                user.security_stamp = stamp.clone();
            }
            if let Some(exception) = &update.stamp_exception {
                user.stamp_exception = exception.clone();
            }
            if let Some(verified_at) = update.verified_at {
                user.verified_at = Some(verified_at);
            }
            if let Some(enabled) = update.enabled {
                user.enabled = enabled;
            }
            if let Some(updated_at) = update.updated_at {
                user.updated_at = updated_at;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDeviceStore {
    devices: DashMap<Uuid, Device>,
}

impl MemoryDeviceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Device>> {
        Ok(self.devices.get(&id).map(|entry| entry.clone()))
    }

    async fn find_by_refresh_token(&self, token: &str) -> StoreResult<Option<Device>> {
        Ok(self
            .devices
            .iter()
            .find(|entry| entry.refresh_token.as_deref() == Some(token))
            .map(|entry| entry.clone()))
    }

    async fn save(&self, device: &Device) -> StoreResult<()> {
        self.devices.insert(device.id, device.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.devices.remove(&id);
        Ok(())
    }

    async fn delete_all_by_user(&self, user_id: Uuid) -> StoreResult<()> {
        self.devices.retain(|_, device| device.user_id != user_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMembershipStore {
    memberships: DashMap<Uuid, Membership>,
}

impl MemoryMembershipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipStore for MemoryMembershipStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Membership>> {
        Ok(self.memberships.get(&id).map(|entry| entry.clone()))
    }

    async fn find_by_user_and_org(
        &self,
        user_id: Uuid,
        org_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        Ok(self
            .memberships
            .iter()
            .find(|entry| entry.user_id == user_id && entry.org_id == org_id)
            .map(|entry| entry.clone()))
    }

    async fn find(&self, filter: &MembershipFilter) -> StoreResult<Vec<Membership>> {
        Ok(self
            .memberships
            .iter()
            .filter(|entry| filter.matches(entry))
            .map(|entry| entry.clone())
            .collect())
    }

    async fn save(&self, membership: &Membership) -> StoreResult<()> {
        self.memberships.insert(membership.id, membership.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.memberships.remove(&id);
        Ok(())
    }

    async fn delete_all_by_user(&self, user_id: Uuid) -> StoreResult<()> {
        self.memberships.retain(|_, m| m.user_id != user_id);
        Ok(())
    }
}

/// Grants plus the two link tables a SQL backend would join through:
/// cipher -> collections and collection -> organization.
#[derive(Default)]
pub struct MemoryGrantStore {
    grants: DashMap<(Uuid, Uuid), CollectionGrant>,
    cipher_collections: DashMap<Uuid, Vec<Uuid>>,
    collection_orgs: DashMap<Uuid, Uuid>,
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection as belonging to an organization.
    pub fn register_collection(&self, collection_id: Uuid, org_id: Uuid) {
        self.collection_orgs.insert(collection_id, org_id);
    }

    /// Record that a cipher is shared into a collection.
    pub fn link_cipher(&self, cipher_id: Uuid, collection_id: Uuid) {
        self.cipher_collections
            .entry(cipher_id)
            .or_default()
            .push(collection_id);
    }
}

#[async_trait]
impl CollectionGrantStore for MemoryGrantStore {
    async fn find_by_collection_and_user(
        &self,
        collection_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<CollectionGrant>> {
        Ok(self
            .grants
            .get(&(collection_id, user_id))
            .map(|entry| entry.clone()))
    }

    async fn find_by_user_and_cipher(
        &self,
        user_id: Uuid,
        cipher_id: Uuid,
    ) -> StoreResult<Option<CollectionGrant>> {
        let collections = match self.cipher_collections.get(&cipher_id) {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };

        for collection_id in collections {
            if let Some(grant) = self.grants.get(&(collection_id, user_id)) {
                return Ok(Some(grant.clone()));
            }
        }
        Ok(None)
    }

    async fn save(&self, grant: &CollectionGrant) -> StoreResult<()> {
        self.grants
            .insert((grant.collection_id, grant.user_id), grant.clone());
        Ok(())
    }

    async fn delete_by_collection_and_user(
        &self,
        collection_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<()> {
        self.grants.remove(&(collection_id, user_id));
        Ok(())
    }

    async fn delete_all_by_user_and_org(&self, user_id: Uuid, org_id: Uuid) -> StoreResult<()> {
        self.grants.retain(|(collection_id, grant_user), _| {
            if *grant_user != user_id {
                return true;
            }
            self.collection_orgs
                .get(collection_id)
                .map_or(true, |org| *org != org_id)
        });
        Ok(())
    }
}

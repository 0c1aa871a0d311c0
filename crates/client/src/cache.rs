//! Address collection cache.
//!
//! Holds the local copy of the current user and their addresses. The cache
//! is **fire-and-confirm**: it never changes before the service confirms an
//! operation, and every change is computed by a reducer from the prior state
//! and the confirmed response. A failed operation leaves it untouched.
//!
//! # Generations
//!
//! The cache is bound to the token it was loaded for. Every `load` and every
//! `discard` starts a new generation; a response that comes back for an
//! older generation is dropped with [`ClientError::SessionChanged`]. This is
//! what keeps a late reply from reaching a cache that belongs to a newer (or
//! no) session.

use addressbook_core::{Address, AddressFields, AddressId, ProfileUpdate, SessionToken, User};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::AccountApi;
use crate::error::{ClientError, Precondition};

/// What the cache currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing loaded; no session, or the session was just discarded.
    #[default]
    Empty,
    /// A load is in flight.
    Loading,
    /// The confirmed user.
    Ready(User),
    /// The last load failed; nothing from it was kept.
    Failed(String),
}

impl CacheState {
    /// The cached user, if loaded.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Ready(user) => Some(user),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reducers
// ─────────────────────────────────────────────────────────────────────────────

/// A confirmed change to the address set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressChange {
    /// The service created this address.
    Created(Address),
    /// The service stored new content for `id`.
    Updated {
        /// The address that was targeted.
        id: AddressId,
        /// The service's representation after the update.
        address: Address,
    },
    /// The service deleted `id`.
    Deleted(AddressId),
}

/// Apply a confirmed profile update: name and email come from the service,
/// everything else is kept.
#[must_use]
pub fn reduce_profile(mut user: User, confirmed: ProfileUpdate) -> User {
    user.name = confirmed.name;
    user.email = confirmed.email;
    user
}

/// Apply a confirmed change to the address set.
///
/// Creation appends; update replaces in place and keeps the targeted id;
/// deletion removes. Entries not targeted by the change are never touched
/// and the order of the rest is preserved.
#[must_use]
pub fn reduce_addresses(mut addresses: Vec<Address>, change: AddressChange) -> Vec<Address> {
    match change {
        AddressChange::Created(address) => addresses.push(address),
        AddressChange::Updated { id, address } => {
            if address.id != id {
                warn!(
                    requested = %id,
                    returned = %address.id,
                    "Service returned a different address id; keeping the requested one"
                );
            }
            for entry in addresses.iter_mut().filter(|entry| entry.id == id) {
                entry.fields = address.fields.clone();
            }
        }
        AddressChange::Deleted(id) => addresses.retain(|entry| entry.id != id),
    }
    addresses
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct CacheSlot {
    token: Option<SessionToken>,
    generation: u64,
    state: CacheState,
}

/// Local copy of the user and their addresses, kept in step with the
/// service.
///
/// All methods take `&self`; the state lock is never held across a network
/// call, so independent operations may be in flight at the same time and
/// complete in any order.
#[derive(Debug)]
pub struct AddressCache<A> {
    api: A,
    slot: RwLock<CacheSlot>,
}

impl<A: AccountApi> AddressCache<A> {
    /// Create an empty cache that talks to `api`.
    pub fn new(api: A) -> Self {
        Self {
            api,
            slot: RwLock::new(CacheSlot::default()),
        }
    }

    /// The service adapter.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> CacheState {
        self.slot.read().await.state.clone()
    }

    /// The current generation.
    pub async fn generation(&self) -> u64 {
        self.slot.read().await.generation
    }

    /// Fetch the user for `token` and replace the whole cache with it.
    ///
    /// On failure the cache is left in [`CacheState::Failed`] with nothing
    /// from the failed call stored.
    ///
    /// # Errors
    ///
    /// [`Precondition::Unauthenticated`] without a token, the service error
    /// on failure, or [`ClientError::SessionChanged`] if the cache was
    /// rebound or discarded while the request was in flight.
    pub async fn load(&self, token: Option<&SessionToken>) -> Result<User, ClientError> {
        let token = token.ok_or(Precondition::Unauthenticated)?;

        let generation = {
            let mut slot = self.slot.write().await;
            slot.generation += 1;
            slot.token = Some(token.clone());
            slot.state = CacheState::Loading;
            slot.generation
        };

        let result = self.api.get_user(token).await;

        let mut slot = self.slot.write().await;
        if slot.generation != generation {
            debug!(generation, current = slot.generation, "Discarding stale user load");
            return Err(ClientError::SessionChanged);
        }

        match result {
            Ok(user) => {
                info!(user_id = %user.id, addresses = user.addresses.len(), "User loaded");
                slot.state = CacheState::Ready(user.clone());
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load user");
                slot.state = CacheState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Drop everything and start a new generation, as on logout.
    pub async fn discard(&self) {
        let mut slot = self.slot.write().await;
        slot.generation += 1;
        slot.token = None;
        slot.state = CacheState::Empty;
        debug!(generation = slot.generation, "Cache discarded");
    }

    /// Change name and email; on success the cache takes the service's
    /// values, not the submitted ones.
    ///
    /// # Errors
    ///
    /// Precondition failures, the service error, or
    /// [`ClientError::SessionChanged`]. The cache is unchanged on every
    /// error.
    pub async fn update_user(
        &self,
        token: Option<&SessionToken>,
        profile: &ProfileUpdate,
    ) -> Result<User, ClientError> {
        let (token, generation) = self.dispatch(token, |_| Ok(())).await?;

        let confirmed = self.api.update_user(&token, profile).await?;

        self.commit(generation, |user| reduce_profile(user, confirmed))
            .await
    }

    /// Delete the account on the service.
    ///
    /// The cache is not modified; ending the session is the
    /// caller's job.
    ///
    /// # Errors
    ///
    /// [`Precondition::Unauthenticated`] without a token, the service
    /// error, or [`ClientError::SessionChanged`] if the cache was rebound
    /// or discarded while the request was in flight. In that case the
    /// confirmation belongs to a session that has already ended.
    pub async fn delete_user(&self, token: Option<&SessionToken>) -> Result<(), ClientError> {
        let token = token.ok_or(Precondition::Unauthenticated)?;
        let generation = self.generation().await;

        self.api.delete_user(token).await?;

        self.ensure_current(generation).await
    }

    /// Create an address and append the service's representation.
    ///
    /// # Errors
    ///
    /// Precondition failures, the service error, or
    /// [`ClientError::SessionChanged`]. The cache is unchanged on every
    /// error.
    pub async fn add_address(
        &self,
        token: Option<&SessionToken>,
        fields: &AddressFields,
    ) -> Result<Address, ClientError> {
        let (token, generation) = self.dispatch(token, |_| Ok(())).await?;

        let created = self.api.create_address(&token, fields).await?;

        let change = AddressChange::Created(created.clone());
        self.commit(generation, |user| with_addresses(user, change))
            .await?;
        Ok(created)
    }

    /// Update an address and replace its cache entry with the service's
    /// representation.
    ///
    /// # Errors
    ///
    /// [`Precondition::UnknownAddress`] if `id` is not cached, other
    /// precondition failures, the service error, or
    /// [`ClientError::SessionChanged`]. The cache is unchanged on every
    /// error.
    pub async fn update_address(
        &self,
        token: Option<&SessionToken>,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Address, ClientError> {
        let (token, generation) = self.dispatch(token, |user| require_address(user, id)).await?;

        let returned = self.api.update_address(&token, id, fields).await?;
        let confirmed = Address::new(id, returned.fields.clone());

        let change = AddressChange::Updated { id, address: returned };
        self.commit(generation, |user| with_addresses(user, change))
            .await?;
        Ok(confirmed)
    }

    /// Delete an address and remove it from the cache.
    ///
    /// # Errors
    ///
    /// [`Precondition::UnknownAddress`] if `id` is not cached, other
    /// precondition failures, the service error, or
    /// [`ClientError::SessionChanged`]. The cache is unchanged on every
    /// error.
    pub async fn delete_address(
        &self,
        token: Option<&SessionToken>,
        id: AddressId,
    ) -> Result<(), ClientError> {
        let (token, generation) = self.dispatch(token, |user| require_address(user, id)).await?;

        self.api.delete_address(&token, id).await?;

        self.commit(generation, |user| with_addresses(user, AddressChange::Deleted(id)))
            .await?;
        Ok(())
    }

    /// Check preconditions before a mutation is sent and capture the
    /// generation it belongs to.
    async fn dispatch(
        &self,
        token: Option<&SessionToken>,
        check: impl FnOnce(&User) -> Result<(), Precondition>,
    ) -> Result<(SessionToken, u64), ClientError> {
        let token = token.ok_or(Precondition::Unauthenticated)?;
        let slot = self.slot.read().await;

        if slot.token.as_ref() != Some(token) {
            return Err(Precondition::TokenMismatch.into());
        }
        let user = slot.state.user().ok_or(Precondition::NotLoaded)?;
        check(user)?;

        Ok((token.clone(), slot.generation))
    }

    /// Fail with [`ClientError::SessionChanged`] if the generation moved on.
    async fn ensure_current(&self, generation: u64) -> Result<(), ClientError> {
        let current = self.slot.read().await.generation;
        if current == generation {
            Ok(())
        } else {
            debug!(generation, current, "Discarding stale confirmation");
            Err(ClientError::SessionChanged)
        }
    }

    /// Apply a confirmed change, unless the generation moved on meanwhile.
    async fn commit(
        &self,
        generation: u64,
        reduce: impl FnOnce(User) -> User,
    ) -> Result<User, ClientError> {
        let mut slot = self.slot.write().await;
        if slot.generation != generation {
            debug!(generation, current = slot.generation, "Discarding stale confirmation");
            return Err(ClientError::SessionChanged);
        }

        match std::mem::take(&mut slot.state) {
            CacheState::Ready(user) => {
                let user = reduce(user);
                slot.state = CacheState::Ready(user.clone());
                Ok(user)
            }
            other => {
                // Only load and discard leave Ready, and both bump the generation.
                slot.state = other;
                Err(ClientError::SessionChanged)
            }
        }
    }
}

fn with_addresses(mut user: User, change: AddressChange) -> User {
    user.addresses = reduce_addresses(std::mem::take(&mut user.addresses), change);
    user
}

fn require_address(user: &User, id: AddressId) -> Result<(), Precondition> {
    if user.has_address(id) {
        Ok(())
    } else {
        Err(Precondition::UnknownAddress(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;
    use crate::error::FailureKind;
    use crate::test_support::{ScriptedApi, address, fields, token, user};

    async fn ready_cache(api: ScriptedApi) -> AddressCache<ScriptedApi> {
        let cache = AddressCache::new(api);
        cache.load(Some(&token("t1"))).await.unwrap();
        cache
    }

    #[test]
    fn test_reduce_profile_takes_service_values() {
        let before = user(vec![address(1, "Porto Alegre")]);
        let after = reduce_profile(
            before.clone(),
            ProfileUpdate {
                name: "JOHN".to_string(),
                email: "john@x.com".to_string(),
            },
        );
        assert_eq!(after.name, "JOHN");
        assert_eq!(after.email, "john@x.com");
        assert_eq!(after.addresses, before.addresses);
        assert_eq!(after.id, before.id);
    }

    #[test]
    fn test_reduce_addresses_update_keeps_requested_id() {
        let before = vec![address(1, "A"), address(2, "B")];
        let after = reduce_addresses(
            before,
            AddressChange::Updated {
                id: AddressId::new(2),
                address: address(0, "C"),
            },
        );
        assert_eq!(after, vec![address(1, "A"), address(2, "C")]);
    }

    #[test]
    fn test_reduce_addresses_unknown_targets_are_no_ops() {
        let before = vec![address(1, "A")];
        let updated = reduce_addresses(
            before.clone(),
            AddressChange::Updated {
                id: AddressId::new(9),
                address: address(9, "Z"),
            },
        );
        assert_eq!(updated, before);
        let deleted = reduce_addresses(before.clone(), AddressChange::Deleted(AddressId::new(9)));
        assert_eq!(deleted, before);
    }

    #[tokio::test]
    async fn test_load_is_idempotent() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A"), address(2, "B")]));
        let cache = AddressCache::new(api);

        let first = cache.load(Some(&token("t1"))).await.unwrap();
        let second = cache.load(Some(&token("t1"))).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.snapshot().await, CacheState::Ready(second));
    }

    #[tokio::test]
    async fn test_load_failure_stores_nothing() {
        let api = ScriptedApi::with_user(user(vec![]));
        api.fail_next_with_status(500);
        let cache = AddressCache::new(api);

        let err = cache.load(Some(&token("t1"))).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::RejectedByServer);
        assert!(matches!(cache.snapshot().await, CacheState::Failed(_)));
    }

    #[tokio::test]
    async fn test_load_requires_token() {
        let api = ScriptedApi::with_user(user(vec![]));
        let cache = AddressCache::new(api.clone());

        let err = cache.load(None).await.unwrap_err();
        assert!(matches!(err, ClientError::Precondition(Precondition::Unauthenticated)));
        assert_eq!(api.call_count(), 0);
    }

    #[tokio::test]
    async fn test_add_address_is_additive() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A"), address(2, "B")]));
        let cache = ready_cache(api.clone()).await;
        api.assign_next_id(7);

        let created = cache
            .add_address(Some(&token("t1")), &fields("C"))
            .await
            .unwrap();

        assert_eq!(created.id, AddressId::new(7));
        let state = cache.snapshot().await;
        let ids: Vec<_> = state.user().unwrap().addresses.iter().map(|a| a.id.as_u64()).collect();
        assert_eq!(ids, vec![1, 2, 7]);
        assert_eq!(state.user().unwrap().addresses[0], address(1, "A"));
    }

    #[tokio::test]
    async fn test_unauthenticated_add_makes_no_call() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A")]));
        let cache = ready_cache(api.clone()).await;
        let calls_before = api.call_count();

        let err = cache.add_address(None, &fields("C")).await.unwrap_err();

        assert!(matches!(err, ClientError::Precondition(Precondition::Unauthenticated)));
        assert_eq!(api.call_count(), calls_before);
    }

    #[tokio::test]
    async fn test_mutators_leave_cache_untouched_on_failure() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A"), address(2, "B")]));
        let cache = ready_cache(api.clone()).await;
        let before = cache.snapshot().await;
        let t = token("t1");

        api.fail_next_with_status(500);
        assert!(cache
            .update_user(Some(&t), &ProfileUpdate::default())
            .await
            .is_err());
        assert_eq!(cache.snapshot().await, before);

        api.fail_next_with_status(401);
        assert!(cache.add_address(Some(&t), &fields("C")).await.is_err());
        assert_eq!(cache.snapshot().await, before);

        api.fail_next_network();
        assert!(cache
            .update_address(Some(&t), AddressId::new(1), &fields("Z"))
            .await
            .is_err());
        assert_eq!(cache.snapshot().await, before);

        api.fail_next_with_status(404);
        assert!(cache.delete_address(Some(&t), AddressId::new(2)).await.is_err());
        assert_eq!(cache.snapshot().await, before);

        api.fail_next_with_status(500);
        assert!(cache.delete_user(Some(&t)).await.is_err());
        assert_eq!(cache.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_update_address_targets_only_its_id() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A"), address(3, "B"), address(5, "C")]));
        let cache = ready_cache(api).await;

        cache
            .update_address(Some(&token("t1")), AddressId::new(3), &fields("NewCity"))
            .await
            .unwrap();

        let state = cache.snapshot().await;
        let addresses = &state.user().unwrap().addresses;
        assert_eq!(addresses[0], address(1, "A"));
        assert_eq!(addresses[1], address(3, "NewCity"));
        assert_eq!(addresses[2], address(5, "C"));
    }

    #[tokio::test]
    async fn test_update_single_address_scenario() {
        let mut john = user(vec![address(1, "OldCity")]);
        john.name = "John".to_string();
        john.email = "j@x.com".to_string();
        let cache = ready_cache(ScriptedApi::with_user(john)).await;

        let confirmed = cache
            .update_address(Some(&token("t1")), AddressId::new(1), &fields("NewCity"))
            .await
            .unwrap();

        assert_eq!(confirmed, address(1, "NewCity"));
        let state = cache.snapshot().await;
        let cached = state.user().unwrap();
        assert_eq!(cached.addresses, vec![address(1, "NewCity")]);
        assert_eq!(cached.name, "John");
    }

    #[tokio::test]
    async fn test_update_unknown_address_is_precondition() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A")]));
        let cache = ready_cache(api.clone()).await;
        let calls_before = api.call_count();

        let err = cache
            .update_address(Some(&token("t1")), AddressId::new(42), &fields("X"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ClientError::Precondition(Precondition::UnknownAddress(id)) if id == AddressId::new(42)
        ));
        assert_eq!(api.call_count(), calls_before);
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A"), address(3, "B"), address(5, "C")]));
        let cache = ready_cache(api).await;

        cache
            .delete_address(Some(&token("t1")), AddressId::new(3))
            .await
            .unwrap();

        let state = cache.snapshot().await;
        assert_eq!(
            state.user().unwrap().addresses,
            vec![address(1, "A"), address(5, "C")]
        );
    }

    #[tokio::test]
    async fn test_update_user_uses_service_values() {
        let api = ScriptedApi::with_user(user(vec![]));
        api.normalize_profiles();
        let cache = ready_cache(api).await;

        let updated = cache
            .update_user(
                Some(&token("t1")),
                &ProfileUpdate {
                    name: "  Johnny ".to_string(),
                    email: "JOHNNY@X.COM".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Johnny");
        assert_eq!(updated.email, "johnny@x.com");
    }

    #[tokio::test]
    async fn test_delete_user_keeps_cache() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A")]));
        let cache = ready_cache(api).await;
        let before = cache.snapshot().await;

        cache.delete_user(Some(&token("t1"))).await.unwrap();

        assert_eq!(cache.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_mutation_with_other_token_is_rejected() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A")]));
        let cache = ready_cache(api).await;

        let err = cache
            .delete_address(Some(&token("someone-else")), AddressId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Precondition(Precondition::TokenMismatch)));
    }

    #[tokio::test]
    async fn test_mutation_before_load_is_rejected() {
        let cache = AddressCache::new(ScriptedApi::with_user(user(vec![])));
        let err = cache
            .add_address(Some(&token("t1")), &fields("A"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Precondition(Precondition::TokenMismatch)));
    }

    #[tokio::test]
    async fn test_late_confirmation_after_discard_is_dropped() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A")]));
        let cache = ready_cache(api.clone()).await;
        let (release, gate) = oneshot::channel();
        api.hold_next(gate);

        let t = token("t1");
        let pending = cache.delete_address(Some(&t), AddressId::new(1));
        let logout = async {
            tokio::task::yield_now().await;
            cache.discard().await;
            release.send(()).unwrap();
        };
        let (result, ()) = tokio::join!(pending, logout);

        assert!(matches!(result, Err(ClientError::SessionChanged)));
        assert_eq!(cache.snapshot().await, CacheState::Empty);
    }

    #[tokio::test]
    async fn test_stale_load_after_discard_is_dropped() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A")]));
        let cache = AddressCache::new(api.clone());
        let (release, gate) = oneshot::channel();
        api.hold_next(gate);

        let t = token("t1");
        let pending = cache.load(Some(&t));
        let logout = async {
            tokio::task::yield_now().await;
            cache.discard().await;
            release.send(()).unwrap();
        };
        let (result, ()) = tokio::join!(pending, logout);

        assert!(matches!(result, Err(ClientError::SessionChanged)));
        assert_eq!(cache.snapshot().await, CacheState::Empty);
    }

    #[tokio::test]
    async fn test_stale_load_does_not_overwrite_newer_load() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A")]));
        let cache = AddressCache::new(api.clone());
        let (release, gate) = oneshot::channel();
        api.hold_next(gate);

        let first_token = token("t1");
        let second_token = token("t2");
        let first = cache.load(Some(&first_token));
        let second_then_release = async {
            tokio::task::yield_now().await;
            let loaded = cache.load(Some(&second_token)).await;
            release.send(()).unwrap();
            loaded
        };
        let (first, second) = tokio::join!(first, second_then_release);

        assert!(matches!(first, Err(ClientError::SessionChanged)));
        assert_eq!(cache.snapshot().await, CacheState::Ready(second.unwrap()));
        // The cache stays bound to the newer token.
        let err = cache
            .delete_address(Some(&first_token), AddressId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Precondition(Precondition::TokenMismatch)));
        cache
            .delete_address(Some(&second_token), AddressId::new(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_late_mutation_after_relogin_is_dropped() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A")]));
        let cache = ready_cache(api.clone()).await;
        api.assign_next_id(9);
        let (release, gate) = oneshot::channel();
        api.hold_next(gate);

        let old_token = token("t1");
        let new_token = token("t2");
        let new_fields = fields("C");
        let pending = cache.add_address(Some(&old_token), &new_fields);
        let relogin = async {
            tokio::task::yield_now().await;
            cache.discard().await;
            let reloaded = cache.load(Some(&new_token)).await.unwrap();
            release.send(()).unwrap();
            reloaded
        };
        let (result, reloaded) = tokio::join!(pending, relogin);

        assert!(matches!(result, Err(ClientError::SessionChanged)));
        assert_eq!(cache.snapshot().await, CacheState::Ready(reloaded));
        let ids: Vec<_> = cache
            .snapshot()
            .await
            .user()
            .unwrap()
            .addresses
            .iter()
            .map(|a| a.id.as_u64())
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_late_delete_user_after_relogin_is_dropped() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A")]));
        let cache = ready_cache(api.clone()).await;
        let (release, gate) = oneshot::channel();
        api.hold_next(gate);

        let old_token = token("t1");
        let new_token = token("t2");
        let pending = cache.delete_user(Some(&old_token));
        let relogin = async {
            tokio::task::yield_now().await;
            cache.discard().await;
            cache.load(Some(&new_token)).await.unwrap();
            release.send(()).unwrap();
        };
        let (result, ()) = tokio::join!(pending, relogin);

        assert!(matches!(result, Err(ClientError::SessionChanged)));
        assert!(cache.snapshot().await.user().is_some());
    }

    #[tokio::test]
    async fn test_independent_operations_commute() {
        let api = ScriptedApi::with_user(user(vec![address(1, "A"), address(2, "B")]));
        let cache = ready_cache(api.clone()).await;
        let t = token("t1");
        api.assign_next_id(9);
        let (release, gate) = oneshot::channel();
        api.hold_next(gate);

        // The add is issued first but completes after the delete.
        let new_fields = fields("C");
        let add = cache.add_address(Some(&t), &new_fields);
        let delete_then_release = async {
            tokio::task::yield_now().await;
            let deleted = cache.delete_address(Some(&t), AddressId::new(1)).await;
            release.send(()).unwrap();
            deleted
        };
        let (added, deleted) = tokio::join!(add, delete_then_release);

        added.unwrap();
        deleted.unwrap();
        let state = cache.snapshot().await;
        let ids: Vec<_> = state.user().unwrap().addresses.iter().map(|a| a.id.as_u64()).collect();
        assert_eq!(ids, vec![2, 9]);
    }
}

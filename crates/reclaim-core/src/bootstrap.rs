//! Account bootstrap coordinator.
//!
//! Given a reactive three-valued read of "does a user document exist for
//! this identity" ([`Lookup`]), ensure the create mutation fires at most
//! once per Absent period, tolerating duplicate deliveries while a create
//! is in flight and a second device winning the create race.
//!
//! The in-flight guard is a plain [`AtomicBool`], deliberately outside the
//! snapshot mutex: its value must be visible synchronously across
//! re-entrant observations, which is the whole correctness property.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::analytics::{track_event, Analytics};
use crate::error::{AuthError, CoreError, Result, StoreError};
use crate::events::Event;
use crate::model::{NewUserRecord, UserRecord};
use crate::store::{Lookup, UserStore};

/// Snapshot of the external identity provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityState {
    /// Whether the provider has finished resolving.
    pub loaded: bool,
    /// Whether a user is signed in (meaningful only once loaded).
    pub signed_in: bool,
    /// Opaque stable identity token, present when signed in.
    pub token: Option<String>,
}

impl IdentityState {
    /// Provider still resolving.
    pub fn resolving() -> Self {
        Self::default()
    }

    pub fn signed_in(token: impl Into<String>) -> Self {
        Self {
            loaded: true,
            signed_in: true,
            token: Some(token.into()),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            loaded: true,
            signed_in: false,
            token: None,
        }
    }
}

/// External identity provider boundary.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current provider state.
    fn snapshot(&self) -> IdentityState;

    /// Initiate the OAuth-style sign-in flow.
    async fn sign_in(&self) -> Result<IdentityState, AuthError>;

    /// Drop the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

/// Identity provider with a fixed, always-signed-in token. Used by the
/// CLI (single local user) and by tests.
pub struct StaticIdentity {
    token: String,
}

impl StaticIdentity {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    fn snapshot(&self) -> IdentityState {
        IdentityState::signed_in(self.token.clone())
    }

    async fn sign_in(&self) -> Result<IdentityState, AuthError> {
        Ok(self.snapshot())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

/// What consumers see. A record is always handed out whole -- there is no
/// partially-populated `Ready`.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapStatus {
    /// Identity unresolved, or signed in but the record read is still
    /// `Unknown`/being created.
    Loading,
    /// Identity resolved to signed-out.
    Unauthenticated,
    /// Signed in with an existing user document.
    Ready(UserRecord),
}

#[derive(Default)]
struct Snapshot {
    identity: IdentityState,
    lookup: Lookup<UserRecord>,
}

/// Coordinates "create the user document if missing" over the reactive
/// store read.
pub struct AuthBootstrap<S: UserStore> {
    store: Arc<S>,
    /// At most one create in flight. See module docs.
    in_flight: AtomicBool,
    snapshot: Mutex<Snapshot>,
    analytics: Option<Arc<dyn Analytics>>,
}

impl<S: UserStore> AuthBootstrap<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            in_flight: AtomicBool::new(false),
            snapshot: Mutex::new(Snapshot::default()),
            analytics: None,
        }
    }

    /// Attach a fire-and-forget analytics sink.
    pub fn with_analytics(mut self, analytics: Arc<dyn Analytics>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    /// Feed an identity-provider update. Sign-out clears the in-flight
    /// guard and forgets the cached lookup.
    pub fn observe_identity(&self, identity: IdentityState) {
        let mut snapshot = self.snapshot.lock().unwrap();
        let signed_out = identity.loaded && !identity.signed_in;
        snapshot.identity = identity;
        if signed_out {
            snapshot.lookup = Lookup::Unknown;
            self.in_flight.store(false, Ordering::SeqCst);
            if let Some(analytics) = &self.analytics {
                analytics.reset();
            }
        }
    }

    /// Feed a store read. On `Absent`, issues the create mutation unless
    /// one is already in flight. A conflict from the backend means another
    /// writer created the record first; the desired postcondition holds,
    /// so it is success. Any other create failure is returned and the
    /// guard cleared, so the next `Absent` delivery may retry.
    pub async fn observe(&self, lookup: Lookup<UserRecord>) -> Result<()> {
        let token = {
            let mut snapshot = self.snapshot.lock().unwrap();
            snapshot.lookup = lookup.clone();
            match &lookup {
                Lookup::Present(_) => {
                    self.in_flight.store(false, Ordering::SeqCst);
                    return Ok(());
                }
                Lookup::Unknown => return Ok(()),
                Lookup::Absent => {
                    if !snapshot.identity.signed_in {
                        return Err(CoreError::Auth(AuthError::NotSignedIn));
                    }
                    match snapshot.identity.token.clone() {
                        Some(token) => token,
                        None => return Err(CoreError::Auth(AuthError::NotSignedIn)),
                    }
                }
            }
        };

        // Synchronous claim; a duplicate Absent delivered while the create
        // below is awaited lands here and backs off.
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(());
        }

        let result = self.store.create_user(NewUserRecord::new(&token)).await;

        // Re-check identity before acting on the result: a create that
        // resolves after sign-out must not resurrect session state.
        let still_signed_in = {
            let snapshot = self.snapshot.lock().unwrap();
            snapshot.identity.signed_in && snapshot.identity.token.as_deref() == Some(&*token)
        };
        self.in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(_) => {
                if still_signed_in {
                    if let Some(analytics) = &self.analytics {
                        analytics.identify(&token);
                        track_event(
                            analytics.as_ref(),
                            &Event::UserCreated {
                                identity_token: token.clone(),
                                at: crate::store::now(),
                            },
                        );
                    }
                }
                Ok(())
            }
            // Conflict-as-success: the record exists, which is all we want.
            Err(StoreError::Conflict) => Ok(()),
            Err(err) => Err(CoreError::Store(err)),
        }
    }

    /// Current consumer-facing status.
    pub fn status(&self) -> BootstrapStatus {
        let snapshot = self.snapshot.lock().unwrap();
        if !snapshot.identity.loaded {
            return BootstrapStatus::Loading;
        }
        if !snapshot.identity.signed_in {
            return BootstrapStatus::Unauthenticated;
        }
        match &snapshot.lookup {
            Lookup::Present(record) => BootstrapStatus::Ready(record.clone()),
            Lookup::Unknown | Lookup::Absent => BootstrapStatus::Loading,
        }
    }

    /// Drive the coordinator from a store subscription until the status
    /// settles at `Ready` (or the subscription ends). Create failures are
    /// returned; the caller decides whether to re-drive.
    pub async fn drive(
        &self,
        mut rx: watch::Receiver<Lookup<UserRecord>>,
    ) -> Result<BootstrapStatus> {
        loop {
            let lookup = rx.borrow_and_update().clone();
            self.observe(lookup).await?;
            match self.status() {
                status @ (BootstrapStatus::Ready(_) | BootstrapStatus::Unauthenticated) => {
                    return Ok(status);
                }
                BootstrapStatus::Loading => {}
            }
            if rx.changed().await.is_err() {
                return Ok(self.status());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, UserPatch};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Store wrapper that counts creates and can hold them open until
    /// released, to model an in-flight mutation.
    struct GatedStore {
        inner: MemoryStore,
        creates: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl GatedStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                creates: AtomicUsize::new(0),
                gate: None,
            }
        }

        fn gated() -> (Self, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            (
                Self {
                    inner: MemoryStore::new(),
                    creates: AtomicUsize::new(0),
                    gate: Some(Arc::clone(&gate)),
                },
                gate,
            )
        }

        fn create_count(&self) -> usize {
            self.creates.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserStore for GatedStore {
        async fn lookup_user(&self, token: &str) -> Result<Lookup<UserRecord>, StoreError> {
            self.inner.lookup_user(token).await
        }

        fn subscribe_user(&self, token: &str) -> watch::Receiver<Lookup<UserRecord>> {
            self.inner.subscribe_user(token)
        }

        async fn create_user(&self, new: NewUserRecord) -> Result<UserRecord, StoreError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.inner.create_user(new).await
        }

        async fn patch_user(
            &self,
            id: &crate::model::DocumentId,
            patch: UserPatch,
        ) -> Result<UserRecord, StoreError> {
            self.inner.patch_user(id, patch).await
        }
    }

    fn coordinator(store: Arc<GatedStore>) -> AuthBootstrap<GatedStore> {
        let bootstrap = AuthBootstrap::new(store);
        bootstrap.observe_identity(IdentityState::signed_in("u1"));
        bootstrap
    }

    #[tokio::test]
    async fn absent_triggers_exactly_one_create() {
        let store = Arc::new(GatedStore::new());
        let bootstrap = coordinator(Arc::clone(&store));

        bootstrap.observe(Lookup::Absent).await.unwrap();
        assert_eq!(store.create_count(), 1);
        assert!(store.lookup_user("u1").await.unwrap().is_present());
    }

    #[tokio::test]
    async fn duplicate_absent_while_in_flight_creates_once() {
        let (store, gate) = GatedStore::gated();
        let store = Arc::new(store);
        let bootstrap = Arc::new(coordinator(Arc::clone(&store)));

        // First observation parks inside create_user on the gate.
        let first = {
            let bootstrap = Arc::clone(&bootstrap);
            tokio::spawn(async move { bootstrap.observe(Lookup::Absent).await })
        };
        tokio::task::yield_now().await;

        // Rapid re-delivery while the first create is still in flight.
        bootstrap.observe(Lookup::Absent).await.unwrap();
        bootstrap.observe(Lookup::Absent).await.unwrap();

        gate.notify_one();
        first.await.unwrap().unwrap();

        assert_eq!(store.create_count(), 1);
    }

    #[tokio::test]
    async fn conflict_is_success_and_ready_follows_present() {
        let store = Arc::new(GatedStore::new());
        // Another device already created the record.
        store
            .inner
            .create_user(NewUserRecord::new("u1"))
            .await
            .unwrap();
        let bootstrap = coordinator(Arc::clone(&store));

        // Stale Absent observation races the other writer; the conflict is
        // not surfaced as a failure.
        bootstrap.observe(Lookup::Absent).await.unwrap();
        assert_eq!(store.create_count(), 1);

        // The reactive read then re-delivers Present.
        let lookup = store.lookup_user("u1").await.unwrap();
        bootstrap.observe(lookup).await.unwrap();
        assert!(matches!(bootstrap.status(), BootstrapStatus::Ready(_)));
    }

    #[tokio::test]
    async fn create_failure_clears_guard_for_next_absent() {
        let store = Arc::new(GatedStore::new());
        store.inner.fail_creates(true);
        let bootstrap = coordinator(Arc::clone(&store));

        let err = bootstrap.observe(Lookup::Absent).await.unwrap_err();
        assert!(matches!(err, CoreError::Store(StoreError::Backend(_))));
        assert_eq!(store.create_count(), 1);

        // Next Absent delivery retries; no tight loop in between.
        store.inner.fail_creates(false);
        bootstrap.observe(Lookup::Absent).await.unwrap();
        assert_eq!(store.create_count(), 2);
    }

    #[tokio::test]
    async fn status_progression() {
        let store = Arc::new(GatedStore::new());
        let bootstrap = AuthBootstrap::new(Arc::clone(&store));

        assert_eq!(bootstrap.status(), BootstrapStatus::Loading);

        bootstrap.observe_identity(IdentityState::signed_out());
        assert_eq!(bootstrap.status(), BootstrapStatus::Unauthenticated);

        bootstrap.observe_identity(IdentityState::signed_in("u1"));
        assert_eq!(bootstrap.status(), BootstrapStatus::Loading);

        bootstrap.observe(Lookup::Unknown).await.unwrap();
        assert_eq!(bootstrap.status(), BootstrapStatus::Loading);

        bootstrap.observe(Lookup::Absent).await.unwrap();
        let lookup = store.lookup_user("u1").await.unwrap();
        bootstrap.observe(lookup).await.unwrap();
        match bootstrap.status() {
            BootstrapStatus::Ready(record) => {
                assert_eq!(record.identity_token, "u1");
                assert!(!record.onboarded);
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn sign_out_clears_guard_and_cached_record() {
        let store = Arc::new(GatedStore::new());
        let bootstrap = coordinator(Arc::clone(&store));

        bootstrap.observe(Lookup::Absent).await.unwrap();
        let lookup = store.lookup_user("u1").await.unwrap();
        bootstrap.observe(lookup).await.unwrap();
        assert!(matches!(bootstrap.status(), BootstrapStatus::Ready(_)));

        bootstrap.observe_identity(IdentityState::signed_out());
        assert_eq!(bootstrap.status(), BootstrapStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn create_reports_user_created_event() {
        let store = Arc::new(GatedStore::new());
        let analytics = Arc::new(crate::analytics::RecordingAnalytics::new());
        let bootstrap = AuthBootstrap::new(Arc::clone(&store))
            .with_analytics(Arc::clone(&analytics) as Arc<dyn Analytics>);
        bootstrap.observe_identity(IdentityState::signed_in("u1"));

        bootstrap.observe(Lookup::Absent).await.unwrap();
        assert_eq!(analytics.event_names(), vec!["user_created"]);

        // A conflicting create reports nothing further.
        bootstrap.observe(Lookup::Absent).await.unwrap();
        assert_eq!(analytics.event_names(), vec!["user_created"]);
    }

    #[tokio::test]
    async fn absent_while_signed_out_is_an_auth_error() {
        let store = Arc::new(GatedStore::new());
        let bootstrap = AuthBootstrap::new(Arc::clone(&store));
        bootstrap.observe_identity(IdentityState::signed_out());

        let err = bootstrap.observe(Lookup::Absent).await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(AuthError::NotSignedIn)));
        assert_eq!(store.create_count(), 0);
    }
}

//! Session lifecycle: refresh token in, access tokens out, logout on failure.
//!
//! A `SessionManager` is a cheap `Clone` handle over one shared session. The
//! session is populated from the post-login redirect or from durable storage,
//! exchanges its refresh token for an access token right away, then renews the
//! access token on a fixed interval from a background task. Any renewal
//! failure ends the session; there is no retry.
//!
//! Every login and logout starts a new epoch. Renewal results that arrive for
//! an older epoch are dropped, so a logout can never be undone by a slow
//! response.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;

use super::claims::{decode_identity, Identity};
use super::navigation::{login_redirect_url, refresh_token_param, without_refresh_token, Navigator};
use super::storage::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use super::AuthError;

/// Exchanges a refresh token for an access token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub login_url: String,
    pub app_origin: String,
    pub renewal_interval: Duration,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            login_url: config.login_url.clone(),
            app_origin: config.app_origin.clone(),
            renewal_interval: config.renewal_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    Initializing,
    Authenticated,
}

/// Read-only view of the session for UI consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub identity: Option<Identity>,
    pub has_access_token: bool,
    /// Set once `initialize` has finished, including its first renewal
    pub initialized: bool,
    pub last_renewed_at: Option<DateTime<Utc>>,
    /// Why the last session ended or failed to start, for display
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }
}

struct RenewalTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RenewalTask {
    fn spawn(session: Weak<Inner>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_renewal(session, period, cancel.clone()));
        Self { cancel, handle }
    }

    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

struct SessionState {
    phase: SessionPhase,
    identity: Option<Identity>,
    refresh_token: Option<String>,
    access_token: Option<String>,
    epoch: u64,
    initialized: bool,
    last_renewed_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    renewal: Option<RenewalTask>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::Unauthenticated,
            identity: None,
            refresh_token: None,
            access_token: None,
            epoch: 0,
            initialized: false,
            last_renewed_at: None,
            last_error: None,
            renewal: None,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            identity: self.identity.clone(),
            has_access_token: self.access_token.is_some(),
            initialized: self.initialized,
            last_renewed_at: self.last_renewed_at,
            last_error: self.last_error.clone(),
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch && self.phase != SessionPhase::Unauthenticated
    }

    fn stop_renewal(&mut self) {
        if let Some(task) = self.renewal.take() {
            debug!("Stopping access token renewal");
            task.stop();
        }
    }
}

/// Storage change that goes with a state change.
enum StoreWrite {
    Keep,
    Set(&'static str, String),
    Clear,
}

struct Inner {
    state: Mutex<SessionState>,
    store: Arc<dyn TokenStore>,
    /// Held across a state change and its storage write; never taken while
    /// `state` is held
    store_lock: Mutex<()>,
    refresher: Arc<dyn TokenRefresher>,
    navigator: Arc<dyn Navigator>,
    options: SessionOptions,
    updates: watch::Sender<SessionSnapshot>,
    init_started: AtomicBool,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        state.stop_renewal();
    }
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        navigator: Arc<dyn Navigator>,
        options: SessionOptions,
    ) -> Self {
        let state = SessionState::new();
        let (updates, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                store,
                store_lock: Mutex::new(()),
                refresher,
                navigator,
                options,
                updates,
                init_started: AtomicBool::new(false),
            }),
        }
    }

    // =========================================================================
    // Observers
    // =========================================================================

    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock_state().snapshot()
    }

    /// Receive a new snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.updates.subscribe()
    }

    /// Resolve once `initialize` has completed
    pub async fn wait_initialized(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `inner`, which we hold, so this cannot close
        let _ = rx.wait_for(|s| s.initialized).await;
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_state().phase == SessionPhase::Authenticated
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock_state().identity.clone()
    }

    /// Bearer token for protected API calls
    pub fn access_token(&self) -> Option<String> {
        self.lock_state().access_token.clone()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Restore or establish the session at process start.
    ///
    /// Looks for a refresh token on the incoming redirect first, then in
    /// storage. When one is found the first access token is fetched before
    /// this returns, so callers never observe a half-initialized session.
    /// Only the first call does anything.
    pub async fn initialize(&self) {
        if self.inner.init_started.swap(true, Ordering::SeqCst) {
            warn!("Session already initialized, ignoring");
            return;
        }

        self.update(|s| s.phase = SessionPhase::Initializing);

        let adopted = match self.adopt_from_redirect() {
            Some(adopted) => Some(adopted),
            None => self.adopt_from_storage(),
        };

        match adopted {
            Some((epoch, refresh_token)) => self.start_renewal(epoch, refresh_token).await,
            None => self.update(|s| {
                if s.phase == SessionPhase::Initializing {
                    s.phase = SessionPhase::Unauthenticated;
                }
            }),
        }

        let snapshot = self.update(|s| {
            s.initialized = true;
            s.snapshot()
        });
        info!(authenticated = snapshot.is_authenticated(), "Session initialized");
    }

    /// Send the user to the account service's login page.
    ///
    /// The login page returns to the application root with the refresh token
    /// appended; no local state changes here.
    pub fn request_login(&self) -> Result<Url, AuthError> {
        let url = login_redirect_url(&self.inner.options.login_url, &self.inner.options.app_origin)?;
        info!(url = %url, "Redirecting to login");
        self.inner.navigator.navigate(&url)?;
        Ok(url)
    }

    /// Complete a login from a post-login redirect URL received after start-up.
    ///
    /// The current session is left untouched unless the URL carries a
    /// decodable refresh token, in which case it is replaced.
    pub async fn accept_redirect(&self, callback: &str) -> Result<SessionSnapshot, AuthError> {
        let url = Url::parse(callback.trim())
            .map_err(|e| AuthError::Navigation(format!("Invalid callback URL: {}", e)))?;
        let token = refresh_token_param(&url).ok_or_else(|| {
            AuthError::Navigation("Callback URL has no refresh_token parameter".to_string())
        })?;
        let identity = decode_identity(&token)?;

        self.end_session(None, None);
        self.inner.navigator.replace(without_refresh_token(&url));
        let epoch = self.adopt(token.clone(), identity, true);
        self.start_renewal(epoch, token).await;
        Ok(self.snapshot())
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Returns whether a new token was stored. Failure logs the session out.
    pub async fn renew_access_token(&self) -> bool {
        let current = {
            let state = self.lock_state();
            state
                .refresh_token
                .clone()
                .filter(|_| state.phase != SessionPhase::Unauthenticated)
                .map(|token| (state.epoch, token))
        };
        match current {
            Some((epoch, token)) => self.renew(epoch, &token).await,
            None => {
                debug!("No refresh token, skipping renewal");
                false
            }
        }
    }

    /// End the session: stop renewal, forget identity and both tokens.
    ///
    /// Calling it again is harmless.
    pub fn logout(&self) {
        self.end_session(None, None);
        info!("Logged out");
    }

    /// Stop background renewal without touching the stored session
    pub fn shutdown(&self) {
        self.lock_state().stop_renewal();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mutate state and publish the resulting snapshot.
    fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = self.lock_state();
        let out = f(&mut state);
        self.inner.updates.send_replace(state.snapshot());
        out
    }

    /// Mutate state, then apply the storage change it asks for.
    ///
    /// Storage calls can block (a keyring may prompt to unlock), so they run
    /// after the state lock is released. `store_lock` keeps the writes in the
    /// same order as the state changes they belong to.
    fn update_stored<R>(&self, f: impl FnOnce(&mut SessionState) -> (R, StoreWrite)) -> R {
        let _io = self.inner.store_lock.lock().unwrap_or_else(|e| e.into_inner());
        let (out, write) = self.update(f);
        match write {
            StoreWrite::Keep => {}
            StoreWrite::Set(key, value) => {
                if let Err(e) = self.inner.store.set(key, &value) {
                    warn!(error = %e, key, "Failed to persist token");
                }
            }
            StoreWrite::Clear => self.clear_store(),
        }
        out
    }

    fn record_error(&self, message: String) {
        self.update(|s| s.last_error = Some(message));
    }

    /// Consume a refresh token from the incoming navigation target.
    fn adopt_from_redirect(&self) -> Option<(u64, String)> {
        let current = self.inner.navigator.current()?;
        let token = refresh_token_param(&current)?;

        // The parameter is consumed whether or not it decodes
        self.inner.navigator.replace(without_refresh_token(&current));

        match decode_identity(&token) {
            Ok(identity) => {
                info!(username = %identity.username, "Logged in from redirect");
                Some((self.adopt(token.clone(), identity, true), token))
            }
            Err(e) => {
                warn!(error = %e, "Ignoring refresh token on redirect");
                self.record_error(e.to_string());
                None
            }
        }
    }

    fn adopt_from_storage(&self) -> Option<(u64, String)> {
        let token = match self.inner.store.get(REFRESH_TOKEN_KEY) {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No stored refresh token");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored refresh token");
                return None;
            }
        };

        match decode_identity(&token) {
            Ok(identity) => {
                info!(username = %identity.username, "Resumed stored session");
                Some((self.adopt(token.clone(), identity, false), token))
            }
            Err(e) => {
                warn!(error = %e, "Discarding malformed stored refresh token");
                self.update_stored(|s| {
                    s.last_error = Some(e.to_string());
                    ((), StoreWrite::Clear)
                });
                None
            }
        }
    }

    /// Make `token` the session's refresh token and start a new epoch.
    fn adopt(&self, token: String, identity: Identity, persist: bool) -> u64 {
        self.update_stored(|s| {
            let write = if persist {
                StoreWrite::Set(REFRESH_TOKEN_KEY, token.clone())
            } else {
                StoreWrite::Keep
            };
            s.stop_renewal();
            s.epoch += 1;
            s.phase = SessionPhase::Authenticated;
            s.identity = Some(identity);
            s.refresh_token = Some(token);
            s.access_token = None;
            s.last_renewed_at = None;
            s.last_error = None;
            (s.epoch, write)
        })
    }

    /// First renewal, then the recurring timer if the session survived it.
    async fn start_renewal(&self, epoch: u64, refresh_token: String) {
        if self.renew(epoch, &refresh_token).await {
            self.arm_renewal(epoch);
        }
    }

    async fn renew(&self, epoch: u64, refresh_token: &str) -> bool {
        let result = self.inner.refresher.refresh(refresh_token).await;

        match result {
            Ok(access_token) => self.update_stored(|s| {
                if !s.is_current(epoch) {
                    debug!(epoch, "Discarding access token for a finished session");
                    return (false, StoreWrite::Keep);
                }
                s.access_token = Some(access_token.clone());
                s.last_renewed_at = Some(Utc::now());
                debug!("Access token renewed");
                (true, StoreWrite::Set(ACCESS_TOKEN_KEY, access_token))
            }),
            Err(e) => {
                let ended = self.end_session(Some(epoch), Some(format!("Session expired: {}", e)));
                if ended {
                    warn!(error = %e, "Access token renewal failed, logged out");
                } else {
                    debug!(error = %e, "Ignoring renewal failure for a finished session");
                }
                false
            }
        }
    }

    /// Arm the recurring renewal, replacing any task already running.
    fn arm_renewal(&self, epoch: u64) {
        let mut state = self.lock_state();
        if !state.is_current(epoch) {
            return;
        }
        state.stop_renewal();
        state.renewal = Some(RenewalTask::spawn(
            Arc::downgrade(&self.inner),
            self.inner.options.renewal_interval,
        ));
        debug!(period_secs = self.inner.options.renewal_interval.as_secs(), "Access token renewal armed");
    }

    /// Reset to an empty session. With `only_epoch`, only if that session is
    /// still the current one. Returns whether anything was reset.
    fn end_session(&self, only_epoch: Option<u64>, reason: Option<String>) -> bool {
        self.update_stored(|s| {
            if let Some(epoch) = only_epoch {
                if !s.is_current(epoch) {
                    return (false, StoreWrite::Keep);
                }
            }
            s.stop_renewal();
            if s.phase != SessionPhase::Unauthenticated || s.refresh_token.is_some() {
                s.epoch += 1;
            }
            s.phase = SessionPhase::Unauthenticated;
            s.identity = None;
            s.refresh_token = None;
            s.access_token = None;
            s.last_renewed_at = None;
            s.last_error = reason;
            (true, StoreWrite::Clear)
        })
    }

    fn clear_store(&self) {
        for key in [REFRESH_TOKEN_KEY, ACCESS_TOKEN_KEY] {
            if let Err(e) = self.inner.store.remove(key) {
                warn!(error = %e, key, "Failed to remove stored token");
            }
        }
    }
}

/// Renewal loop. Holds only a weak reference so it never keeps a dropped
/// session alive; each tick's call runs on its own task so a slow response
/// neither delays the next tick nor gets cancelled with the loop.
async fn run_renewal(session: Weak<Inner>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(inner) = session.upgrade() else {
            break;
        };
        let manager = SessionManager { inner };
        tokio::spawn(async move {
            manager.renew_access_token().await;
        });
    }
    debug!("Renewal loop stopped");
}

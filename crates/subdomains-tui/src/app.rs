//! Application state management for the subdomain client.
//!
//! This module contains the core `App` struct that owns the UI state, the
//! fetched subdomain lists, the order form and the login overlay. Network
//! work runs on spawned tasks and reports back through an MPSC channel that
//! the main loop drains every frame.

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use subdomains_core::models::{
    filter_subdomains, full_domain, name_taken, NewSubdomain, Subdomain, UserId,
};
use subdomains_core::{ApiClient, Config, SessionManager, SessionSnapshot};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// A DNS label is at most 63 octets.
const MAX_NAME_LENGTH: usize = 63;

const MAX_PURPOSE_LENGTH: usize = 500;

/// Callback URLs carry a JWT, which can run long.
const MAX_CALLBACK_LENGTH: usize = 4096;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Order,
    Profile,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Order => "Order",
            Tab::Profile => "Profile",
        }
    }

    /// Order and Profile are only reachable with a session
    pub fn requires_login(&self) -> bool {
        !matches!(self, Tab::Home)
    }

    pub fn next(&self) -> Self {
        match self {
            Tab::Home => Tab::Order,
            Tab::Order => Tab::Profile,
            Tab::Profile => Tab::Home,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Tab::Home => Tab::Profile,
            Tab::Order => Tab::Home,
            Tab::Profile => Tab::Order,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    ConfirmingLogout,
    ConfirmingQuit,
    Quitting,
}

/// Order form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFocus {
    Name,
    Purpose,
    Submit,
}

impl OrderFocus {
    pub fn next(&self) -> Self {
        match self {
            OrderFocus::Name => OrderFocus::Purpose,
            OrderFocus::Purpose => OrderFocus::Submit,
            OrderFocus::Submit => OrderFocus::Name,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            OrderFocus::Name => OrderFocus::Submit,
            OrderFocus::Purpose => OrderFocus::Name,
            OrderFocus::Submit => OrderFocus::Purpose,
        }
    }
}

/// Loading state of a remote list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned tasks back to the main loop.
enum FetchResult {
    /// Public subdomain list
    Subdomains(Result<Vec<Subdomain>, String>),
    /// Subdomains ordered by one user
    UserSubdomains(UserId, Result<Vec<Subdomain>, String>),
    /// Outcome of an order submission
    Created(Result<Subdomain, String>),
    /// Outcome of a pasted post-login callback
    LoginCompleted(Result<(), String>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionManager,
    pub api: ApiClient,

    // Last session snapshot seen by the UI
    pub session_view: SessionSnapshot,
    session_rx: watch::Receiver<SessionSnapshot>,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub search_query: String,
    pub home_selection: usize,
    pub profile_selection: usize,

    // Home
    pub subdomains: Vec<Subdomain>,
    pub subdomains_state: LoadState,

    // Profile
    pub user_subdomains: Vec<Subdomain>,
    pub user_subdomains_state: LoadState,

    // Order form state
    pub order_name: String,
    pub order_purpose: String,
    pub order_focus: OrderFocus,
    pub submitting: bool,

    // Login overlay state
    pub login_url: Option<String>,
    pub login_callback: String,
    pub login_error: Option<String>,
    pub login_pending: bool,

    // Background task channel
    fetch_rx: mpsc::Receiver<FetchResult>,
    fetch_tx: mpsc::Sender<FetchResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: Config, session: SessionManager, api: ApiClient) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let session_rx = session.subscribe();
        let session_view = session.snapshot();

        Self {
            config,
            session,
            api,
            session_view,
            session_rx,
            state: AppState::Normal,
            current_tab: Tab::Home,
            search_query: String::new(),
            home_selection: 0,
            profile_selection: 0,
            subdomains: Vec::new(),
            subdomains_state: LoadState::Idle,
            user_subdomains: Vec::new(),
            user_subdomains_state: LoadState::Idle,
            order_name: String::new(),
            order_purpose: String::new(),
            order_focus: OrderFocus::Name,
            submitting: false,
            login_url: None,
            login_callback: String::new(),
            login_error: None,
            login_pending: false,
            fetch_rx: rx,
            fetch_tx: tx,
            status_message: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_view.is_authenticated()
    }

    /// Username for the title bar greeting
    pub fn username(&self) -> Option<&str> {
        self.session_view
            .identity
            .as_ref()
            .map(|i| i.username.as_str())
    }

    /// Left side of the status bar when there is no message to show
    pub fn session_status(&self) -> String {
        let view = &self.session_view;
        if !view.is_authenticated() {
            return "Not logged in".to_string();
        }
        match view.last_renewed_at {
            Some(renewed) if view.has_access_token => {
                format!("Token renewed {}", renewed.with_timezone(&chrono::Local).format("%H:%M"))
            }
            _ => "Waiting for access token".to_string(),
        }
    }

    /// Whether `?` opens help. Order form fields take `?` as text.
    pub fn help_available(&self) -> bool {
        self.current_tab != Tab::Order || self.order_focus == OrderFocus::Submit
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Switch tabs. Protected tabs fall back to Home without a session.
    pub fn set_tab(&mut self, tab: Tab) {
        if tab.requires_login() && !self.is_authenticated() {
            self.current_tab = Tab::Home;
            self.status_message = Some(format!("Log in to open {}. Press [l] to log in.", tab.title()));
            return;
        }

        self.current_tab = tab;
        match tab {
            Tab::Home => {}
            Tab::Order => {
                // Duplicate checks need the full list
                if self.subdomains_state == LoadState::Idle {
                    self.refresh_subdomains();
                }
            }
            Tab::Profile => self.refresh_user_subdomains(),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Open the login overlay and record where the login page lives.
    pub fn start_login(&mut self) {
        self.login_error = None;
        self.login_callback.clear();
        match self.session.request_login() {
            Ok(url) => self.login_url = Some(url.to_string()),
            Err(e) => {
                warn!(error = %e, "Could not build login URL");
                self.login_url = None;
                self.login_error = Some(e.to_string());
            }
        }
        self.state = AppState::LoggingIn;
    }

    /// Hand the pasted callback URL to the session on a background task.
    pub fn submit_login_callback(&mut self) {
        if self.login_pending {
            return;
        }
        let callback = self.login_callback.trim().to_string();
        if callback.is_empty() {
            self.login_error = Some("Paste the address your browser landed on after login.".to_string());
            return;
        }

        self.login_pending = true;
        self.login_error = None;
        let session = self.session.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = match session.accept_redirect(&callback).await {
                Ok(snapshot) if snapshot.is_authenticated() => Ok(()),
                Ok(snapshot) => Err(snapshot
                    .last_error
                    .unwrap_or_else(|| "Login could not be completed.".to_string())),
                Err(e) => Err(e.to_string()),
            };
            Self::send_result(&tx, FetchResult::LoginCompleted(result)).await;
        });
    }

    pub fn logout(&mut self) {
        self.session.logout();
        // Apply now rather than waiting for the next frame
        let snapshot = self.session.snapshot();
        self.apply_session(snapshot);
        self.status_message = Some("Logged out".to_string());
    }

    /// React to a session change published by the session manager.
    pub fn apply_session(&mut self, snapshot: SessionSnapshot) {
        let was_authenticated = self.is_authenticated();
        let previous_user = self
            .session_view
            .identity
            .as_ref()
            .map(|i| i.user_id.clone());
        self.session_view = snapshot;

        let current_user = self
            .session_view
            .identity
            .as_ref()
            .map(|i| i.user_id.clone());
        if current_user != previous_user {
            self.user_subdomains.clear();
            self.user_subdomains_state = LoadState::Idle;
            self.profile_selection = 0;
        }

        if was_authenticated && !self.is_authenticated() {
            debug!("Session ended, leaving protected screens");
            self.reset_order_form();
            if self.current_tab.requires_login() {
                self.current_tab = Tab::Home;
            }
            if matches!(self.state, AppState::ConfirmingLogout) {
                self.state = AppState::Normal;
            }
            if let Some(ref reason) = self.session_view.last_error {
                self.status_message = Some(reason.clone());
            }
        } else if !was_authenticated && self.is_authenticated() {
            if matches!(self.state, AppState::LoggingIn) {
                self.state = AppState::Normal;
            }
            self.login_callback.clear();
            self.login_error = None;
            if let Some(name) = self.username() {
                self.status_message = Some(format!("Logged in as {}", name));
            }
        }
    }

    // =========================================================================
    // Background fetches
    // =========================================================================

    /// Helper to send results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<FetchResult>, result: FetchResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send fetch result - channel closed");
        }
    }

    /// Reload the public subdomain list
    pub fn refresh_subdomains(&mut self) {
        if self.subdomains_state.is_loading() {
            return;
        }
        self.subdomains_state = LoadState::Loading;
        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = api.list_subdomains().await.map_err(|e| {
                warn!(error = %e, "Failed to fetch subdomains");
                e.user_message()
            });
            Self::send_result(&tx, FetchResult::Subdomains(result)).await;
        });
    }

    /// Reload the signed-in user's subdomains
    pub fn refresh_user_subdomains(&mut self) {
        let Some(user_id) = self
            .session_view
            .identity
            .as_ref()
            .map(|i| i.user_id.clone())
        else {
            return;
        };
        if self.user_subdomains_state.is_loading() {
            return;
        }
        self.user_subdomains_state = LoadState::Loading;
        let api = self.api.with_token(self.session.access_token());
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = api.list_user_subdomains(&user_id).await.map_err(|e| {
                warn!(error = %e, user_id = %user_id, "Failed to fetch user subdomains");
                e.user_message()
            });
            Self::send_result(&tx, FetchResult::UserSubdomains(user_id, result)).await;
        });
    }

    /// Drain finished background work and pick up session changes
    pub fn check_background_tasks(&mut self) {
        if self.session_rx.has_changed().unwrap_or(false) {
            let snapshot = self.session_rx.borrow_and_update().clone();
            self.apply_session(snapshot);
        }

        let mut results = Vec::new();
        while let Ok(result) = self.fetch_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_fetch_result(result);
        }
    }

    fn process_fetch_result(&mut self, result: FetchResult) {
        match result {
            FetchResult::Subdomains(Ok(list)) => {
                debug!(count = list.len(), "Subdomains loaded");
                self.subdomains = list;
                self.subdomains_state = LoadState::Loaded;
                self.clamp_home_selection();
            }
            FetchResult::Subdomains(Err(msg)) => {
                self.subdomains_state = LoadState::Failed(msg);
            }
            FetchResult::UserSubdomains(user_id, result) => {
                let current = self.session_view.identity.as_ref().map(|i| &i.user_id);
                if current != Some(&user_id) {
                    debug!(user_id = %user_id, "Dropping subdomains for a previous user");
                    return;
                }
                match result {
                    Ok(list) => {
                        self.user_subdomains = list;
                        self.user_subdomains_state = LoadState::Loaded;
                        self.profile_selection = self
                            .profile_selection
                            .min(self.user_subdomains.len().saturating_sub(1));
                    }
                    Err(msg) => self.user_subdomains_state = LoadState::Failed(msg),
                }
            }
            FetchResult::Created(Ok(created)) => {
                self.submitting = false;
                let domain = full_domain(&created.name, &self.config.domain_suffix);
                info!(domain = %domain, "Subdomain ordered");
                self.status_message = Some(format!("Ordered {} - awaiting review", domain));
                self.reset_order_form();
                self.current_tab = Tab::Home;
                self.subdomains_state = LoadState::Idle;
                self.refresh_subdomains();
                self.user_subdomains_state = LoadState::Idle;
            }
            FetchResult::Created(Err(msg)) => {
                self.submitting = false;
                self.status_message = Some(format!("Submission failed: {}", msg));
            }
            FetchResult::LoginCompleted(Ok(())) => {
                self.login_pending = false;
            }
            FetchResult::LoginCompleted(Err(msg)) => {
                self.login_pending = false;
                self.login_error = Some(msg);
            }
        }
    }

    // =========================================================================
    // Home
    // =========================================================================

    /// Subdomains matching the current search
    pub fn filtered_subdomains(&self) -> Vec<&Subdomain> {
        filter_subdomains(&self.subdomains, self.search_query.trim())
    }

    pub fn clamp_home_selection(&mut self) {
        let len = self.filtered_subdomains().len();
        self.home_selection = self.home_selection.min(len.saturating_sub(1));
    }

    // =========================================================================
    // Order form
    // =========================================================================

    /// Whether the typed name collides with an existing subdomain
    pub fn order_is_duplicate(&self) -> bool {
        name_taken(&self.subdomains, &self.order_name)
    }

    pub fn can_submit_order(&self) -> bool {
        self.is_authenticated()
            && !self.submitting
            && !self.order_is_duplicate()
            && !self.order_name.trim().is_empty()
            && !self.order_purpose.trim().is_empty()
    }

    /// Preview of the full domain being ordered
    pub fn order_preview(&self) -> String {
        let name = self.order_name.trim();
        let name = if name.is_empty() { "<name>" } else { name };
        full_domain(name, &self.config.domain_suffix)
    }

    pub fn submit_order(&mut self) {
        let Some(user_id) = self
            .session_view
            .identity
            .as_ref()
            .filter(|_| self.is_authenticated())
            .map(|i| i.user_id.clone())
        else {
            self.current_tab = Tab::Home;
            return;
        };
        if self.submitting {
            return;
        }
        if self.order_name.trim().is_empty() {
            self.status_message = Some("Enter a subdomain name".to_string());
            self.order_focus = OrderFocus::Name;
            return;
        }
        if self.order_is_duplicate() {
            self.status_message =
                Some("This subdomain already exists. Please choose another one.".to_string());
            return;
        }
        if self.order_purpose.trim().is_empty() {
            self.status_message = Some("Describe the purpose of this subdomain".to_string());
            self.order_focus = OrderFocus::Purpose;
            return;
        }

        self.submitting = true;
        self.status_message = Some("Submitting...".to_string());
        let order = NewSubdomain::new(self.order_name.as_str(), user_id, self.order_purpose.trim());
        let api = self.api.with_token(self.session.access_token());
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = api.create_subdomain(&order).await.map_err(|e| e.user_message());
            Self::send_result(&tx, FetchResult::Created(result)).await;
        });
    }

    pub fn reset_order_form(&mut self) {
        self.order_name.clear();
        self.order_purpose.clear();
        self.order_focus = OrderFocus::Name;
        self.submitting = false;
    }

    /// Insert pasted text into whichever field has focus
    pub fn handle_paste(&mut self, text: &str) {
        match (self.state, self.current_tab) {
            (AppState::LoggingIn, _) => {
                for c in text.chars() {
                    if can_add_callback_char(self.login_callback.len(), c) {
                        self.login_callback.push(c);
                    }
                }
            }
            (AppState::Searching, _) => {
                self.search_query.extend(text.chars().filter(|c| !c.is_control()));
                self.home_selection = 0;
            }
            (AppState::Normal, Tab::Order) => match self.order_focus {
                OrderFocus::Name => {
                    for c in text.trim().chars() {
                        if can_add_name_char(self.order_name.len(), c) {
                            self.order_name.push(c);
                        }
                    }
                }
                OrderFocus::Purpose => {
                    for c in text.chars() {
                        if can_add_purpose_char(self.order_purpose.chars().count(), c) {
                            self.order_purpose.push(c);
                        }
                    }
                }
                OrderFocus::Submit => {}
            },
            _ => {}
        }
    }

    /// Stop background renewal before the process exits
    pub fn shutdown(&self) {
        self.session.shutdown();
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Subdomain names: letters, digits and hyphens
pub fn can_add_name_char(current_len: usize, c: char) -> bool {
    current_len < MAX_NAME_LENGTH && (c.is_ascii_alphanumeric() || c == '-')
}

pub fn can_add_purpose_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PURPOSE_LENGTH && !c.is_control()
}

pub fn can_add_callback_char(current_len: usize, c: char) -> bool {
    current_len < MAX_CALLBACK_LENGTH && !c.is_control() && !c.is_whitespace()
}

// ============================================================================
// Tests
// ============================================================================

/// App and session fixtures shared by the TUI tests
#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use subdomains_core::auth::{CallbackNavigator, Identity, MemoryStore};
    use subdomains_core::models::UserId;
    use subdomains_core::{ApiClient, Config, SessionManager, SessionOptions, SessionPhase, SessionSnapshot};

    use super::App;

    pub(crate) fn test_app() -> App {
        let config = Config::default();
        // Nothing listens on the discard port; fetches fail fast
        let api = ApiClient::new("http://127.0.0.1:9/api", Duration::from_secs(1)).unwrap();
        let session = SessionManager::new(
            Arc::new(MemoryStore::new()),
            Arc::new(api.clone()),
            Arc::new(CallbackNavigator::default()),
            SessionOptions::from_config(&config),
        );
        App::new(config, session, api)
    }

    pub(crate) fn signed_in(user_id: i64, username: &str) -> SessionSnapshot {
        SessionSnapshot {
            phase: SessionPhase::Authenticated,
            identity: Some(Identity {
                username: username.to_string(),
                email: format!("{}@example.org", username),
                user_id: UserId::from(user_id),
                expires_at: None,
            }),
            has_access_token: true,
            initialized: true,
            last_renewed_at: None,
            last_error: None,
        }
    }

    pub(crate) fn signed_out(reason: Option<&str>) -> SessionSnapshot {
        SessionSnapshot {
            phase: SessionPhase::Unauthenticated,
            identity: None,
            has_access_token: false,
            initialized: true,
            last_renewed_at: None,
            last_error: reason.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{signed_in, signed_out, test_app};
    use super::*;

    fn sample_subdomains() -> Vec<Subdomain> {
        serde_json::from_str(
            r#"[
                {"id": 1, "name": "blog", "purpose": "Team blog", "status": "active", "user": 7},
                {"id": 2, "name": "shop", "purpose": "Merch store", "status": "pending", "user": 9},
                {"id": 3, "name": "wiki", "purpose": "Internal docs", "status": "inactive", "user": 7}
            ]"#,
        )
        .unwrap()
    }

    // -------------------------------------------------------------------------
    // Tab Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tab_next() {
        assert_eq!(Tab::Home.next(), Tab::Order);
        assert_eq!(Tab::Order.next(), Tab::Profile);
        assert_eq!(Tab::Profile.next(), Tab::Home);
    }

    #[test]
    fn test_tab_prev() {
        assert_eq!(Tab::Home.prev(), Tab::Profile);
        assert_eq!(Tab::Profile.prev(), Tab::Order);
        assert_eq!(Tab::Order.prev(), Tab::Home);
    }

    #[test]
    fn test_protected_tabs_redirect_home() {
        let mut app = test_app();
        app.set_tab(Tab::Order);
        assert_eq!(app.current_tab, Tab::Home);
        app.set_tab(Tab::Profile);
        assert_eq!(app.current_tab, Tab::Home);
        assert!(app.status_message.as_deref().unwrap().contains("Log in"));
    }

    #[tokio::test]
    async fn test_session_end_leaves_protected_tab() {
        let mut app = test_app();
        app.apply_session(signed_in(7, "alice"));
        app.set_tab(Tab::Profile);
        assert_eq!(app.current_tab, Tab::Profile);

        app.order_name = "draft".to_string();
        app.apply_session(signed_out(Some("Session expired: refresh rejected")));
        assert_eq!(app.current_tab, Tab::Home);
        assert!(app.order_name.is_empty());
        assert_eq!(
            app.status_message.as_deref(),
            Some("Session expired: refresh rejected")
        );
    }

    // -------------------------------------------------------------------------
    // Session Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_login_closes_overlay() {
        let mut app = test_app();
        app.start_login();
        assert_eq!(app.state, AppState::LoggingIn);
        let url = app.login_url.clone().unwrap();
        assert!(url.starts_with("https://accounts.dovuchcha.uz/login"));
        assert!(url.contains("redirection="));

        app.apply_session(signed_in(7, "alice"));
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.username(), Some("alice"));
        assert_eq!(app.status_message.as_deref(), Some("Logged in as alice"));
    }

    #[test]
    fn test_empty_callback_is_rejected_locally() {
        let mut app = test_app();
        app.start_login();
        app.submit_login_callback();
        assert!(!app.login_pending);
        assert!(app.login_error.is_some());
    }

    #[test]
    fn test_user_change_clears_profile_list() {
        let mut app = test_app();
        app.apply_session(signed_in(7, "alice"));
        app.user_subdomains = sample_subdomains();
        app.user_subdomains_state = LoadState::Loaded;

        app.apply_session(signed_in(9, "bob"));
        assert!(app.user_subdomains.is_empty());
        assert_eq!(app.user_subdomains_state, LoadState::Idle);
    }

    #[test]
    fn test_stale_user_subdomains_are_dropped() {
        let mut app = test_app();
        app.apply_session(signed_in(9, "bob"));
        app.process_fetch_result(FetchResult::UserSubdomains(
            UserId::from(7),
            Ok(sample_subdomains()),
        ));
        assert!(app.user_subdomains.is_empty());
    }

    // -------------------------------------------------------------------------
    // Fetch Result Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_subdomain_results() {
        let mut app = test_app();
        app.process_fetch_result(FetchResult::Subdomains(Err("Server error: boom".to_string())));
        assert_eq!(app.subdomains_state, LoadState::Failed("Server error: boom".to_string()));

        app.home_selection = 10;
        app.process_fetch_result(FetchResult::Subdomains(Ok(sample_subdomains())));
        assert_eq!(app.subdomains_state, LoadState::Loaded);
        assert_eq!(app.subdomains.len(), 3);
        assert_eq!(app.home_selection, 2);
    }

    #[test]
    fn test_failed_order_keeps_form() {
        let mut app = test_app();
        app.order_name = "blog2".to_string();
        app.submitting = true;
        app.process_fetch_result(FetchResult::Created(Err("Failed to create subdomain.".to_string())));
        assert!(!app.submitting);
        assert_eq!(app.order_name, "blog2");
        assert_eq!(
            app.status_message.as_deref(),
            Some("Submission failed: Failed to create subdomain.")
        );
    }

    #[test]
    fn test_login_failure_is_shown() {
        let mut app = test_app();
        app.login_pending = true;
        app.process_fetch_result(FetchResult::LoginCompleted(Err("Malformed token".to_string())));
        assert!(!app.login_pending);
        assert_eq!(app.login_error.as_deref(), Some("Malformed token"));
    }

    // -------------------------------------------------------------------------
    // Search and Order Form Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_search_filters_list() {
        let mut app = test_app();
        app.subdomains = sample_subdomains();
        app.search_query = "MERCH".to_string();
        let hits = app.filtered_subdomains();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "shop");
    }

    #[test]
    fn test_duplicate_blocks_submit() {
        let mut app = test_app();
        app.apply_session(signed_in(7, "alice"));
        app.subdomains = sample_subdomains();
        app.order_name = "Blog".to_string();
        app.order_purpose = "Another blog".to_string();
        assert!(app.order_is_duplicate());
        assert!(!app.can_submit_order());

        app.submit_order();
        assert!(!app.submitting);

        app.order_name = "blog2".to_string();
        assert!(!app.order_is_duplicate());
        assert!(app.can_submit_order());
    }

    #[test]
    fn test_submit_requires_purpose() {
        let mut app = test_app();
        app.apply_session(signed_in(7, "alice"));
        app.order_name = "api".to_string();
        app.order_focus = OrderFocus::Submit;
        app.submit_order();
        assert!(!app.submitting);
        assert_eq!(app.order_focus, OrderFocus::Purpose);
    }

    #[test]
    fn test_order_preview() {
        let mut app = test_app();
        assert_eq!(app.order_preview(), "<name>.dovuchcha.uz");
        app.order_name = "api".to_string();
        assert_eq!(app.order_preview(), "api.dovuchcha.uz");
    }

    #[test]
    fn test_paste_into_order_name() {
        let mut app = test_app();
        app.current_tab = Tab::Order;
        app.handle_paste(" my-app.example \n");
        assert_eq!(app.order_name, "my-appexample");
    }

    #[test]
    fn test_paste_callback() {
        let mut app = test_app();
        app.state = AppState::LoggingIn;
        app.handle_paste("http://localhost:5173/?refresh_token=abc\n");
        assert_eq!(app.login_callback, "http://localhost:5173/?refresh_token=abc");
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_name_char() {
        assert!(can_add_name_char(0, 'a'));
        assert!(can_add_name_char(0, '7'));
        assert!(can_add_name_char(0, '-'));
        assert!(!can_add_name_char(0, '.'));
        assert!(!can_add_name_char(0, ' '));
        assert!(!can_add_name_char(MAX_NAME_LENGTH, 'a'));
    }

    #[test]
    fn test_can_add_purpose_char() {
        assert!(can_add_purpose_char(0, 'a'));
        assert!(can_add_purpose_char(0, ' '));
        assert!(!can_add_purpose_char(0, '\n'));
        assert!(!can_add_purpose_char(MAX_PURPOSE_LENGTH, 'a'));
    }

    // -------------------------------------------------------------------------
    // Status Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_session_status_tracks_access_token() {
        let mut app = test_app();
        app.apply_session(signed_out(None));
        assert_eq!(app.session_status(), "Not logged in");

        let mut waiting = signed_in(7, "alice");
        waiting.has_access_token = false;
        app.apply_session(waiting);
        assert_eq!(app.session_status(), "Waiting for access token");

        let mut renewed = signed_in(7, "alice");
        renewed.last_renewed_at = Some(chrono::Utc::now());
        app.apply_session(renewed);
        assert!(app.session_status().starts_with("Token renewed "));
    }

    #[test]
    fn test_help_available_off_order_fields() {
        let mut app = test_app();
        assert!(app.help_available());

        app.current_tab = Tab::Order;
        app.order_focus = OrderFocus::Name;
        assert!(!app.help_available());
        app.order_focus = OrderFocus::Purpose;
        assert!(!app.help_available());
        app.order_focus = OrderFocus::Submit;
        assert!(app.help_available());
    }
}

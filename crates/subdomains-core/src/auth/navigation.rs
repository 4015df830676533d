//! Navigation targets for the login round trip.
//!
//! The account service sends the user back to the application origin with a
//! `refresh_token` query parameter. A `Navigator` exposes that incoming target,
//! lets the session rewrite it once the parameter is consumed, and carries the
//! outbound trip to the login page.

use std::sync::Mutex;

use reqwest::Url;

use super::AuthError;

/// Query parameter carrying the refresh token on the post-login redirect
pub const REFRESH_TOKEN_PARAM: &str = "refresh_token";

/// Query parameter the login page reads the return address from
const REDIRECTION_PARAM: &str = "redirection";

pub trait Navigator: Send + Sync {
    /// The target this process was opened with, if any
    fn current(&self) -> Option<Url>;
    /// Replace the visible target without navigating
    fn replace(&self, url: Url);
    /// Send the user somewhere else
    fn navigate(&self, url: &Url) -> Result<(), AuthError>;
}

/// Login page address with the application's root as the return address.
pub fn login_redirect_url(login_url: &str, app_origin: &str) -> Result<Url, AuthError> {
    let mut url = Url::parse(login_url)
        .map_err(|e| AuthError::Navigation(format!("Invalid login URL {}: {}", login_url, e)))?;
    let return_to = format!("{}/", app_origin.trim_end_matches('/'));
    url.query_pairs_mut().append_pair(REDIRECTION_PARAM, &return_to);
    Ok(url)
}

/// The refresh token carried by a post-login redirect, if any.
pub fn refresh_token_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, v)| k == REFRESH_TOKEN_PARAM && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

/// `url` at the root path with the refresh token parameter removed.
pub fn without_refresh_token(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != REFRESH_TOKEN_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut cleaned = url.clone();
    cleaned.set_path("/");
    cleaned.set_fragment(None);
    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }
    cleaned
}

/// Navigator for clients without a browser: the incoming target is whatever
/// callback URL the process was handed, and outbound navigations are recorded
/// so the UI can show the user where to go.
#[derive(Default)]
pub struct CallbackNavigator {
    current: Mutex<Option<Url>>,
    outbound: Mutex<Option<Url>>,
}

impl CallbackNavigator {
    pub fn new(current: Option<Url>) -> Self {
        Self {
            current: Mutex::new(current),
            outbound: Mutex::new(None),
        }
    }

    pub fn from_callback(callback: Option<&str>) -> Result<Self, AuthError> {
        let current = callback
            .map(|c| {
                Url::parse(c.trim())
                    .map_err(|e| AuthError::Navigation(format!("Invalid callback URL: {}", e)))
            })
            .transpose()?;
        Ok(Self::new(current))
    }

    /// The last outbound target, e.g. the login page
    pub fn outbound(&self) -> Option<Url> {
        self.outbound.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Navigator for CallbackNavigator {
    fn current(&self) -> Option<Url> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn replace(&self, url: Url) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(url);
    }

    fn navigate(&self, url: &Url) -> Result<(), AuthError> {
        *self.outbound.lock().unwrap_or_else(|e| e.into_inner()) = Some(url.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_url() {
        let url = login_redirect_url("https://accounts.dovuchcha.uz/login", "http://localhost:5173").unwrap();
        assert_eq!(
            url.as_str(),
            "https://accounts.dovuchcha.uz/login?redirection=http%3A%2F%2Flocalhost%3A5173%2F"
        );
        assert!(login_redirect_url("not a url", "http://localhost").is_err());
    }

    #[test]
    fn test_refresh_token_param() {
        let url = Url::parse("http://localhost:5173/?refresh_token=abc.def.ghi").unwrap();
        assert_eq!(refresh_token_param(&url).as_deref(), Some("abc.def.ghi"));

        let empty = Url::parse("http://localhost:5173/?refresh_token=").unwrap();
        assert_eq!(refresh_token_param(&empty), None);

        let none = Url::parse("http://localhost:5173/profile").unwrap();
        assert_eq!(refresh_token_param(&none), None);
    }

    #[test]
    fn test_without_refresh_token() {
        let url = Url::parse("http://localhost:5173/callback?refresh_token=abc&lang=uz#top").unwrap();
        assert_eq!(without_refresh_token(&url).as_str(), "http://localhost:5173/?lang=uz");

        let only = Url::parse("http://localhost:5173/?refresh_token=abc").unwrap();
        assert_eq!(without_refresh_token(&only).as_str(), "http://localhost:5173/");
    }

    #[test]
    fn test_callback_navigator_records_outbound() {
        let nav = CallbackNavigator::from_callback(Some("http://localhost:5173/?refresh_token=x")).unwrap();
        assert!(nav.current().is_some());
        assert!(nav.outbound().is_none());

        let login = Url::parse("https://accounts.dovuchcha.uz/login").unwrap();
        nav.navigate(&login).unwrap();
        assert_eq!(nav.outbound(), Some(login));

        assert!(CallbackNavigator::from_callback(Some("::nope")).is_err());
    }
}

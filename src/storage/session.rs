use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::storage::local::{LocalStorage, StorageError};

pub const SESSION_KEY: &str = "polypro-mock-user";
pub const RETURN_URL_KEY: &str = "polypro-return-url";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub tier: Tier,
}

/// Paid features gated by tier
pub struct FeatureAccess;

impl FeatureAccess {
    pub fn has_arbitrage(user: Option<&User>) -> bool {
        matches!(user.map(|u| u.tier), Some(Tier::Pro | Tier::Premium))
    }
}

/// Mock login state kept in local storage. There is no credential check.
#[derive(Clone)]
pub struct SessionStore {
    storage: LocalStorage,
}

impl SessionStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    pub fn current_user(&self) -> Option<User> {
        let raw = match self.storage.get_item(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read session: {}", e);
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| warn!("Ignoring corrupt session: {}", e))
            .ok()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    pub fn login(&self, user: &User) -> Result<(), StorageError> {
        self.storage.set_item(SESSION_KEY, &serde_json::to_string(user)?)?;
        info!("Logged in as {} ({:?})", user.email, user.tier);
        Ok(())
    }

    pub fn logout(&self) -> Result<(), StorageError> {
        self.storage.remove_item(SESSION_KEY)?;
        info!("Logged out");
        Ok(())
    }

    /// Page the user tried to open before being sent to login, consumed once
    pub fn take_return_url(&self) -> Result<Option<String>, StorageError> {
        let url = self.storage.get_item(RETURN_URL_KEY)?;
        if url.is_some() {
            self.storage.remove_item(RETURN_URL_KEY)?;
        }
        Ok(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allowed,
    /// Protected page: go to the login path, return URL already stored
    Redirect(String),
    /// Open page: show it but offer a login prompt
    PromptLogin,
}

pub struct AuthGuard {
    session: SessionStore,
    login_path: String,
}

impl AuthGuard {
    pub fn new(session: SessionStore, login_path: impl Into<String>) -> Self {
        Self {
            session,
            login_path: login_path.into(),
        }
    }

    pub fn check(&self, path: &str, protected: bool) -> Result<Access, StorageError> {
        if self.session.is_authenticated() {
            return Ok(Access::Allowed);
        }
        if !protected {
            return Ok(Access::PromptLogin);
        }

        let return_url = if path.is_empty() { "/" } else { path };
        self.session.storage.set_item(RETURN_URL_KEY, return_url)?;
        Ok(Access::Redirect(self.login_path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session() -> (TempDir, SessionStore) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::open(dir.path()).unwrap();
        (dir, SessionStore::new(storage))
    }

    fn trader(tier: Tier) -> User {
        User {
            id: "u-1".to_string(),
            name: "Demo Trader".to_string(),
            email: "demo@polypro.app".to_string(),
            avatar: None,
            tier,
        }
    }

    #[test]
    fn test_login_logout() {
        let (_dir, session) = session();
        assert!(!session.is_authenticated());

        session.login(&trader(Tier::Pro)).unwrap();
        assert_eq!(session.current_user(), Some(trader(Tier::Pro)));

        session.logout().unwrap();
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn test_corrupt_session_is_logged_out() {
        let (_dir, session) = session();
        session.storage.set_item(SESSION_KEY, "not json").unwrap();
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn test_guard_redirects_protected_pages() {
        let (_dir, session) = session();
        let guard = AuthGuard::new(session.clone(), "/login");

        assert_eq!(guard.check("/portfolio", true).unwrap(), Access::Redirect("/login".to_string()));
        assert_eq!(session.take_return_url().unwrap().as_deref(), Some("/portfolio"));
        assert_eq!(session.take_return_url().unwrap(), None);

        assert_eq!(guard.check("/markets", false).unwrap(), Access::PromptLogin);

        session.login(&trader(Tier::Free)).unwrap();
        assert_eq!(guard.check("/portfolio", true).unwrap(), Access::Allowed);
    }

    #[test]
    fn test_arbitrage_access_by_tier() {
        assert!(!FeatureAccess::has_arbitrage(None));
        assert!(!FeatureAccess::has_arbitrage(Some(&trader(Tier::Free))));
        assert!(FeatureAccess::has_arbitrage(Some(&trader(Tier::Pro))));
        assert!(FeatureAccess::has_arbitrage(Some(&trader(Tier::Premium))));
    }
}

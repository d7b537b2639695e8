//! Session service: who, if anyone, is logged in
//!
//! A session lives in exactly one of two scopes, chosen at login by the
//! "remember me" flag. All reads and writes of the token and user snapshot
//! go through [`SessionStore`]; listeners registered with
//! [`SessionStore::subscribe`] observe sign-in, user refresh and sign-out.

use crate::models::{Session, StoredUser};
use crate::storage::{KeyValueStore, StorageError, TOKEN_KEY, USER_KEY};
use std::sync::{Arc, Mutex};

/// Storage scope holding the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Survives restarts
    Durable,
    /// Tab-scoped, gone when the tab closes
    Ephemeral,
}

impl Persistence {
    pub fn from_remember(remember: bool) -> Self {
        if remember {
            Persistence::Durable
        } else {
            Persistence::Ephemeral
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Stored user record is malformed: {0}")]
    MalformedUser(#[source] serde_json::Error),

    #[error("Failed to encode user record: {0}")]
    Encoding(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(StoredUser),
    UserUpdated(StoredUser),
    SignedOut,
}

type Listener = Box<dyn Fn(&SessionEvent) + Send + Sync>;

pub struct SessionStore {
    durable: Arc<dyn KeyValueStore>,
    ephemeral: Arc<dyn KeyValueStore>,
    listeners: Mutex<Vec<Listener>>,
}

impl SessionStore {
    pub fn new(durable: Arc<dyn KeyValueStore>, ephemeral: Arc<dyn KeyValueStore>) -> Self {
        Self {
            durable,
            ephemeral,
            listeners: Mutex::new(Vec::new()),
        }
    }

    fn scope(&self, persistence: Persistence) -> &dyn KeyValueStore {
        match persistence {
            Persistence::Durable => self.durable.as_ref(),
            Persistence::Ephemeral => self.ephemeral.as_ref(),
        }
    }

    fn other(persistence: Persistence) -> Persistence {
        match persistence {
            Persistence::Durable => Persistence::Ephemeral,
            Persistence::Ephemeral => Persistence::Durable,
        }
    }

    /// Bearer token from whichever scope holds one
    pub fn access_token(&self) -> Option<String> {
        self.durable
            .get(TOKEN_KEY)
            .or_else(|| self.ephemeral.get(TOKEN_KEY))
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    /// Scope currently holding the token
    pub fn persistence(&self) -> Option<Persistence> {
        if self.durable.get(TOKEN_KEY).is_some() {
            Some(Persistence::Durable)
        } else if self.ephemeral.get(TOKEN_KEY).is_some() {
            Some(Persistence::Ephemeral)
        } else {
            None
        }
    }

    /// The user snapshot, or `Ok(None)` when nobody is logged in.
    ///
    /// A record that is present but cannot be parsed is reported as
    /// [`SessionError::MalformedUser`]; callers choose how to degrade.
    pub fn stored_user(&self) -> Result<Option<StoredUser>, SessionError> {
        let raw = match self
            .durable
            .get(USER_KEY)
            .or_else(|| self.ephemeral.get(USER_KEY))
        {
            Some(raw) => raw,
            None => return Ok(None),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(SessionError::MalformedUser)
    }

    /// Write a session into `persistence` and make sure the other scope holds none
    pub fn save(&self, session: &Session, persistence: Persistence) -> Result<(), SessionError> {
        let user_json = serde_json::to_string(&session.user).map_err(SessionError::Encoding)?;

        let target = self.scope(persistence);
        let other = self.scope(Self::other(persistence));

        // Token goes last: a token without a user must never be visible.
        let written = target
            .set(USER_KEY, &user_json)
            .and_then(|_| other.remove(TOKEN_KEY))
            .and_then(|_| other.remove(USER_KEY))
            .and_then(|_| target.set(TOKEN_KEY, &session.access_token));

        if let Err(e) = written {
            log::warn!("Session write failed, discarding partial session: {}", e);
            for key in [TOKEN_KEY, USER_KEY] {
                if let Err(cleanup) = target.remove(key) {
                    log::warn!("Failed to remove {} after aborted save: {}", key, cleanup);
                }
            }
            return Err(e.into());
        }

        log::info!(
            "Session stored for {} ({}, {:?})",
            session.user.username,
            session.user.role,
            persistence
        );
        self.notify(&SessionEvent::SignedIn(session.user.clone()));
        Ok(())
    }

    /// Replace the user snapshot in the scope that holds the session
    pub fn update_user(&self, user: &StoredUser) -> Result<(), SessionError> {
        let Some(persistence) = self.persistence() else {
            log::debug!("Ignoring user update without an active session");
            return Ok(());
        };

        let user_json = serde_json::to_string(user).map_err(SessionError::Encoding)?;
        self.scope(persistence).set(USER_KEY, &user_json)?;
        self.notify(&SessionEvent::UserUpdated(user.clone()));
        Ok(())
    }

    /// Remove token and user from both scopes. Idempotent.
    pub fn clear(&self) {
        let had_session = self.is_authenticated();

        for scope in [self.durable.as_ref(), self.ephemeral.as_ref()] {
            for key in [TOKEN_KEY, USER_KEY] {
                if let Err(e) = scope.remove(key) {
                    log::warn!("Failed to remove {} from session storage: {}", key, e);
                }
            }
        }

        if had_session {
            log::info!("Session cleared");
            self.notify(&SessionEvent::SignedOut);
        }
    }

    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Box::new(listener));
    }

    fn notify(&self, event: &SessionEvent) {
        let listeners = self
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for listener in listeners.iter() {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::storage::MemoryStore;

    fn stores() -> (Arc<MemoryStore>, Arc<MemoryStore>, SessionStore) {
        let durable = Arc::new(MemoryStore::new());
        let ephemeral = Arc::new(MemoryStore::new());
        let store = SessionStore::new(durable.clone(), ephemeral.clone());
        (durable, ephemeral, store)
    }

    fn session(role: Role) -> Session {
        Session {
            access_token: "tok-1".to_string(),
            user: StoredUser {
                id: "7".to_string(),
                username: "hana".to_string(),
                email: Some("hana@example.com".to_string()),
                avatar_url: None,
                role,
            },
        }
    }

    #[test]
    fn test_empty_store_is_unauthenticated() {
        let (_, _, store) = stores();
        assert!(!store.is_authenticated());
        assert_eq!(store.persistence(), None);
        assert_eq!(store.stored_user().unwrap(), None);
    }

    #[test]
    fn test_save_durable() {
        let (durable, ephemeral, store) = stores();
        store.save(&session(Role::Uploader), Persistence::Durable).unwrap();

        assert!(store.is_authenticated());
        assert_eq!(store.persistence(), Some(Persistence::Durable));
        assert_eq!(durable.get(TOKEN_KEY).as_deref(), Some("tok-1"));
        assert_eq!(ephemeral.get(TOKEN_KEY), None);
        assert_eq!(store.stored_user().unwrap().unwrap().role, Role::Uploader);
    }

    #[test]
    fn test_save_never_leaves_both_scopes_populated() {
        let (durable, ephemeral, store) = stores();
        store.save(&session(Role::Reader), Persistence::Durable).unwrap();
        store.save(&session(Role::Reader), Persistence::Ephemeral).unwrap();

        assert_eq!(durable.get(TOKEN_KEY), None);
        assert_eq!(durable.get(USER_KEY), None);
        assert!(ephemeral.get(TOKEN_KEY).is_some());
        assert_eq!(store.persistence(), Some(Persistence::Ephemeral));
    }

    #[test]
    fn test_malformed_user_is_reported() {
        let (durable, _, store) = stores();
        durable.set(TOKEN_KEY, "tok").unwrap();
        durable.set(USER_KEY, "{broken").unwrap();

        assert!(store.is_authenticated());
        assert!(matches!(
            store.stored_user(),
            Err(SessionError::MalformedUser(_))
        ));
    }

    #[test]
    fn test_clear_is_idempotent_and_notifies_once() {
        let (_, _, store) = stores();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        store.save(&session(Role::Admin), Persistence::Ephemeral).unwrap();
        store.clear();
        store.clear();

        assert!(!store.is_authenticated());
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SessionEvent::SignedIn(_)));
        assert_eq!(events[1], SessionEvent::SignedOut);
    }

    #[test]
    fn test_update_user_keeps_scope() {
        let (durable, ephemeral, store) = stores();
        store.save(&session(Role::Reader), Persistence::Ephemeral).unwrap();

        let mut promoted = session(Role::Uploader).user;
        promoted.username = "hana2".to_string();
        store.update_user(&promoted).unwrap();

        assert_eq!(durable.get(USER_KEY), None);
        assert!(ephemeral.get(USER_KEY).unwrap().contains("hana2"));
        assert_eq!(store.stored_user().unwrap().unwrap().role, Role::Uploader);
    }

    #[test]
    fn test_update_user_without_session_is_noop() {
        let (durable, ephemeral, store) = stores();
        store.update_user(&session(Role::Admin).user).unwrap();
        assert_eq!(durable.get(USER_KEY), None);
        assert_eq!(ephemeral.get(USER_KEY), None);
    }

    /// Store that refuses writes to one key
    struct RefusingStore {
        inner: MemoryStore,
        refused: &'static str,
    }

    impl KeyValueStore for RefusingStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.refused {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn refusing(refused: &'static str) -> (Arc<RefusingStore>, SessionStore) {
        let durable = Arc::new(RefusingStore {
            inner: MemoryStore::new(),
            refused,
        });
        let store = SessionStore::new(durable.clone(), Arc::new(MemoryStore::new()));
        (durable, store)
    }

    #[test]
    fn test_failed_user_write_leaves_no_session() {
        let (durable, store) = refusing(USER_KEY);

        let err = store.save(&session(Role::Admin), Persistence::Durable).unwrap_err();

        assert!(matches!(err, SessionError::Storage(_)));
        assert!(!store.is_authenticated());
        assert_eq!(store.stored_user().unwrap(), None);
        assert_eq!(durable.get(TOKEN_KEY), None);
    }

    #[test]
    fn test_failed_token_write_rolls_back_user() {
        let (durable, store) = refusing(TOKEN_KEY);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        assert!(store.save(&session(Role::Reader), Persistence::Durable).is_err());

        assert!(!store.is_authenticated());
        assert_eq!(durable.get(USER_KEY), None);
        assert!(events.lock().unwrap().is_empty());
    }
}

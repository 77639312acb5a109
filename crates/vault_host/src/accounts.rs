//! Local accounts, per-user record namespaces and the persisted session.

use std::{collections::BTreeMap, rc::Rc};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::blob::BlobStore;
use crate::records::{CatalogError, FileCatalog, NewRecord, SerialPolicy};
use crate::storage::{
    build_envelope, decode_envelope_payload, load_json_with, save_json_with, KeyValueStore,
    StoreEnvelope,
};
use crate::time::unix_time_ms_now;

/// Key holding the account map.
pub const USERS_KEY: &str = "USERS";
/// Key holding the signed-in username.
pub const SESSION_KEY: &str = "sessionUser";
/// Schema version of the persisted account map.
pub const ACCOUNTS_SCHEMA_VERSION: u32 = 1;
/// Name of the record seeded into new accounts.
pub const WELCOME_RECORD_NAME: &str = "Welcome.txt";
/// Declared size of the seeded welcome record.
pub const WELCOME_RECORD_SIZE: u64 = 512;

/// Storage key of a user's record list.
pub fn records_key_for(username: &str) -> String {
    format!("uploaded_{username}")
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Account operation failures.
pub enum AccountError {
    /// Username or password was blank.
    #[error("Please fill in all fields")]
    MissingFields,
    /// Usernames become storage keys and are limited to `[A-Za-z0-9._-]`.
    #[error("username `{0}` may only contain letters, digits, `.`, `_` and `-`")]
    InvalidUsername(String),
    /// The username is already registered.
    #[error("Username already exists")]
    UsernameTaken,
    /// Unknown user or wrong password; both share one message.
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// Account or session storage failed.
    #[error("account store failed: {0}")]
    Store(String),
    /// Seeding or clearing the user's records failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredAccount {
    username: String,
    salt: String,
    password_sha256: String,
    created_at_unix_ms: u64,
}

impl StoredAccount {
    fn matches(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.password_sha256
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public view of a registered account.
pub struct Account {
    /// Login name.
    pub username: String,
    /// Registration time in unix milliseconds.
    pub created_at_unix_ms: u64,
}

impl From<&StoredAccount> for Account {
    fn from(stored: &StoredAccount) -> Self {
        Self {
            username: stored.username.clone(),
            created_at_unix_ms: stored.created_at_unix_ms,
        }
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

fn valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
}

/// Sign-up, login and session handling over a [`KeyValueStore`].
///
/// Passwords are stored as salted SHA-256 digests. Each user's records live under
/// [`records_key_for`] in the same store.
#[derive(Clone)]
pub struct AccountService {
    store: Rc<dyn KeyValueStore>,
    blobs: Rc<dyn BlobStore>,
    serials: SerialPolicy,
    seed_welcome_record: bool,
}

impl AccountService {
    /// Creates a service; new accounts get a welcome record.
    pub fn new(store: Rc<dyn KeyValueStore>, blobs: Rc<dyn BlobStore>) -> Self {
        Self {
            store,
            blobs,
            serials: SerialPolicy::default(),
            seed_welcome_record: true,
        }
    }

    /// Toggles the welcome record seeded on sign-up.
    pub fn with_welcome_record(mut self, enabled: bool) -> Self {
        self.seed_welcome_record = enabled;
        self
    }

    /// Replaces the serial policy used by per-user catalogs.
    pub fn with_serial_policy(mut self, serials: SerialPolicy) -> Self {
        self.serials = serials;
        self
    }

    /// Catalog holding `username`'s records.
    pub fn catalog_for(&self, username: &str) -> FileCatalog {
        FileCatalog::new(
            Rc::clone(&self.store),
            Rc::clone(&self.blobs),
            records_key_for(username),
        )
        .with_serial_policy(self.serials.clone())
    }

    async fn load_accounts(&self) -> Result<BTreeMap<String, StoredAccount>, AccountError> {
        let envelope: Option<StoreEnvelope> = load_json_with(&*self.store, USERS_KEY)
            .await
            .map_err(AccountError::Store)?;
        match envelope {
            Some(envelope) => decode_envelope_payload(&envelope, ACCOUNTS_SCHEMA_VERSION)
                .map_err(AccountError::Store),
            None => Ok(BTreeMap::new()),
        }
    }

    async fn save_accounts(
        &self,
        accounts: &BTreeMap<String, StoredAccount>,
    ) -> Result<(), AccountError> {
        let envelope = build_envelope(USERS_KEY, ACCOUNTS_SCHEMA_VERSION, accounts)
            .map_err(AccountError::Store)?;
        save_json_with(&*self.store, USERS_KEY, &envelope)
            .await
            .map_err(AccountError::Store)
    }

    async fn set_session(&self, username: &str) -> Result<(), AccountError> {
        save_json_with(&*self.store, SESSION_KEY, &username)
            .await
            .map_err(AccountError::Store)
    }

    /// Registers a user, signs them in and optionally seeds the welcome record.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::MissingFields`], [`AccountError::InvalidUsername`] or
    /// [`AccountError::UsernameTaken`] for bad input, and storage errors otherwise.
    pub async fn sign_up(&self, username: &str, password: &str) -> Result<Account, AccountError> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(AccountError::MissingFields);
        }
        if !valid_username(username) {
            return Err(AccountError::InvalidUsername(username.to_string()));
        }

        let mut accounts = self.load_accounts().await?;
        if accounts.contains_key(username) {
            return Err(AccountError::UsernameTaken);
        }

        let salt = uuid::Uuid::new_v4().to_string();
        let stored = StoredAccount {
            username: username.to_string(),
            password_sha256: hash_password(&salt, password),
            salt,
            created_at_unix_ms: unix_time_ms_now(),
        };
        let account = Account::from(&stored);
        accounts.insert(username.to_string(), stored);
        self.save_accounts(&accounts).await?;

        if self.seed_welcome_record {
            self.catalog_for(username)
                .add_record(NewRecord::metadata_only(
                    WELCOME_RECORD_NAME,
                    WELCOME_RECORD_SIZE,
                ))
                .await?;
        }
        self.set_session(username).await?;
        log::info!("registered account `{username}`");
        Ok(account)
    }

    /// Checks credentials and persists the session.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] for an unknown user or wrong password.
    pub async fn login(&self, username: &str, password: &str) -> Result<Account, AccountError> {
        let username = username.trim();
        let accounts = self.load_accounts().await?;
        let stored = accounts
            .get(username)
            .filter(|stored| stored.matches(password))
            .ok_or(AccountError::InvalidCredentials)?;
        self.set_session(username).await?;
        Ok(Account::from(stored))
    }

    /// Clears the persisted session.
    ///
    /// # Errors
    ///
    /// Returns a store error when the session key cannot be removed.
    pub async fn logout(&self) -> Result<(), AccountError> {
        self.store
            .delete(SESSION_KEY)
            .await
            .map_err(AccountError::Store)
    }

    /// Returns the signed-in account, if the persisted session still names a registered user.
    ///
    /// Sessions written as a bare (unquoted) username are accepted as well.
    ///
    /// # Errors
    ///
    /// Returns storage errors only; a stale or unreadable session yields `Ok(None)`.
    pub async fn restore_session(&self) -> Result<Option<Account>, AccountError> {
        let Some(raw) = self
            .store
            .load(SESSION_KEY)
            .await
            .map_err(AccountError::Store)?
        else {
            return Ok(None);
        };
        let username = serde_json::from_str::<String>(&raw)
            .unwrap_or_else(|_| raw.trim().to_string());
        if username.is_empty() {
            return Ok(None);
        }

        let accounts = self.load_accounts().await?;
        match accounts.get(&username) {
            Some(stored) => Ok(Some(Account::from(stored))),
            None => {
                log::debug!("discarding session for unknown user `{username}`");
                Ok(None)
            }
        }
    }

    /// Removes an account together with its records and their bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] when the password does not match.
    pub async fn delete_account(
        &self,
        username: &str,
        password: &str,
    ) -> Result<usize, AccountError> {
        let username = username.trim();
        let mut accounts = self.load_accounts().await?;
        if !accounts
            .get(username)
            .is_some_and(|stored| stored.matches(password))
        {
            return Err(AccountError::InvalidCredentials);
        }

        let removed = self.catalog_for(username).clear().await?;
        accounts.remove(username);
        self.save_accounts(&accounts).await?;
        if self.restore_session().await?.is_none() {
            self.logout().await?;
        }
        log::info!("deleted account `{username}` and {removed} record(s)");
        Ok(removed)
    }

    /// Registered usernames in sorted order.
    ///
    /// # Errors
    ///
    /// Returns storage errors.
    pub async fn usernames(&self) -> Result<Vec<String>, AccountError> {
        Ok(self.load_accounts().await?.into_keys().collect())
    }
}

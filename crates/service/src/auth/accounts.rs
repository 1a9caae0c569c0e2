use serde_json::Value;
use tracing::warn;

use super::domain::Account;
use super::errors::AuthError;
use crate::collections::{registry::ACCOUNTS, CollectionStore};

/// Snapshot of the `accounts` collection.
///
/// Raw elements are kept as loaded so entries that do not parse as an
/// [`Account`] survive a rewrite.
#[derive(Debug, Clone, Default)]
pub struct AccountList {
    raw: Vec<Value>,
}

impl AccountList {
    pub fn is_empty(&self) -> bool { self.raw.is_empty() }

    pub fn len(&self) -> usize { self.raw.len() }

    fn parse(idx: usize, v: &Value) -> Option<Account> {
        match serde_json::from_value::<Account>(v.clone()) {
            Ok(a) => Some(a),
            Err(e) => {
                warn!(index = idx, err = %e, "skipping malformed account entry");
                None
            }
        }
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.raw.iter().enumerate().filter_map(|(i, v)| Self::parse(i, v)).collect()
    }

    fn position(&self, pred: impl Fn(&Account) -> bool) -> Option<(usize, Account)> {
        self.raw
            .iter()
            .enumerate()
            .filter_map(|(i, v)| Self::parse(i, v).map(|a| (i, a)))
            .find(|(_, a)| pred(a))
    }

    /// Usernames compare exactly.
    pub fn find_by_username(&self, username: &str) -> Option<Account> {
        self.position(|a| a.username == username).map(|(_, a)| a)
    }

    pub fn find_by_id(&self, id: &str) -> Option<Account> {
        self.position(|a| a.id.matches(id)).map(|(_, a)| a)
    }

    pub fn push(&mut self, account: &Account) -> Result<(), AuthError> {
        let v = serde_json::to_value(account).map_err(|e| AuthError::Repository(e.to_string()))?;
        self.raw.push(v);
        Ok(())
    }

    /// Replace the stored entry with the same id.
    pub fn replace(&mut self, account: &Account) -> Result<(), AuthError> {
        let id = account.id.to_string();
        let (idx, _) = self.position(|a| a.id.matches(&id)).ok_or(AuthError::NotFound)?;
        self.raw[idx] = serde_json::to_value(account).map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(())
    }
}

/// Loads and saves the account list through the collection store.
#[derive(Clone)]
pub struct AccountBook {
    store: CollectionStore,
}

impl AccountBook {
    pub fn new(store: CollectionStore) -> Self { Self { store } }

    pub async fn load(&self) -> Result<AccountList, AuthError> {
        Ok(AccountList { raw: self.store.get_array(ACCOUNTS).await? })
    }

    pub async fn save(&self, list: &AccountList) -> Result<(), AuthError> {
        self.store.set(ACCOUNTS, &Value::Array(list.raw.clone())).await?;
        Ok(())
    }
}

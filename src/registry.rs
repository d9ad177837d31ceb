// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! A user's accounts keyed by id.
//!
//! The registry holds no notion of a "current" account. The caller carries
//! the active selection and passes it to [`AccountRegistry::resolve`].

use crate::errors::{Error, Result};
use crate::models::Account;
use crate::store::TradeStore;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: BTreeMap<i64, Account>,
}

impl AccountRegistry {
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        AccountRegistry {
            accounts: accounts.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    pub fn load<S: TradeStore + ?Sized>(store: &S, user_id: &str) -> Result<Self> {
        Ok(Self::new(store.list_accounts(user_id)?))
    }

    pub fn get(&self, id: i64) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Account> {
        let name = name.trim();
        self.accounts.values().find(|a| a.name == name)
    }

    /// Look up by name, or by numeric id when no name matches.
    pub fn lookup(&self, key: &str) -> Option<&Account> {
        self.by_name(key)
            .or_else(|| key.trim().parse::<i64>().ok().and_then(|id| self.get(id)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Pick the account to act on.
    ///
    /// An explicit `key` wins and must exist. Otherwise the `active` id is
    /// used if it still exists, falling back to the oldest account.
    pub fn resolve(&self, key: Option<&str>, active: Option<i64>) -> Result<&Account> {
        if let Some(k) = key {
            return self
                .lookup(k)
                .ok_or_else(|| Error::not_found(format!("Account '{}'", k.trim())));
        }
        active
            .and_then(|id| self.get(id))
            .or_else(|| self.accounts.values().next())
            .ok_or_else(|| Error::not_found("Any account (create one with `account add`)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn acc(id: i64, name: &str) -> Account {
        Account {
            id,
            user_id: "u1".into(),
            name: name.into(),
            initial_balance: dec!(1000),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn resolve_prefers_explicit_key_then_active_then_first() {
        let reg = AccountRegistry::new(vec![acc(7, "Funded"), acc(3, "Binance")]);
        assert_eq!(reg.resolve(Some("Funded"), Some(3)).unwrap().id, 7);
        assert_eq!(reg.resolve(Some("3"), None).unwrap().id, 3);
        assert_eq!(reg.resolve(None, Some(7)).unwrap().id, 7);
        // stale selection falls back to the oldest account
        assert_eq!(reg.resolve(None, Some(99)).unwrap().id, 3);
        assert_eq!(reg.resolve(None, None).unwrap().id, 3);
    }

    #[test]
    fn resolve_unknown_key_is_not_found() {
        let reg = AccountRegistry::new(vec![acc(1, "Main")]);
        assert!(reg.resolve(Some("Nope"), Some(1)).unwrap_err().is_not_found());
        assert!(AccountRegistry::default().resolve(None, None).is_err());
    }
}

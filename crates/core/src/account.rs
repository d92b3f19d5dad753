//! Account master records referenced by postings.
//!
//! Accounts are maintained outside the posting engine. The engine only reads
//! them to check that every posted account exists and is active.

use oasis_shared::types::AccountId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building an account record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// The account code is empty.
    #[error("Account code must not be empty")]
    EmptyCode,

    /// The account name is empty.
    #[error("Account name must not be empty")]
    EmptyName,

    /// The active flag is neither `Y` nor `N`.
    #[error("Invalid active flag: {0}")]
    InvalidActiveFlag(char),
}

/// Whether an account accepts postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActiveFlag {
    /// Active.
    #[serde(rename = "Y")]
    Y,
    /// Inactive.
    #[serde(rename = "N")]
    N,
}

impl ActiveFlag {
    /// Returns the stored single character form.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Y => 'Y',
            Self::N => 'N',
        }
    }

    /// Returns true for `Y`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Y)
    }
}

impl TryFrom<char> for ActiveFlag {
    type Error = AccountError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'Y' => Ok(Self::Y),
            'N' => Ok(Self::N),
            other => Err(AccountError::InvalidActiveFlag(other)),
        }
    }
}

/// A chart of accounts entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identity.
    pub account_id: AccountId,
    /// Account type.
    pub account_type_id: i64,
    /// Parent in the account hierarchy.
    pub parent_account_id: Option<AccountId>,
    /// Short code.
    pub account_code: String,
    /// Display name.
    pub account_name: String,
    /// Whether the account accepts postings.
    pub active_flag: ActiveFlag,
}

impl Account {
    /// Creates an active root account, trimming code and name.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCode` or `EmptyName` if either is blank.
    pub fn new(
        account_id: AccountId,
        account_type_id: i64,
        account_code: &str,
        account_name: &str,
    ) -> Result<Self, AccountError> {
        let account_code = account_code.trim();
        if account_code.is_empty() {
            return Err(AccountError::EmptyCode);
        }
        let account_name = account_name.trim();
        if account_name.is_empty() {
            return Err(AccountError::EmptyName);
        }

        Ok(Self {
            account_id,
            account_type_id,
            parent_account_id: None,
            account_code: account_code.to_string(),
            account_name: account_name.to_string(),
            active_flag: ActiveFlag::Y,
        })
    }

    /// Sets the parent account.
    #[must_use]
    pub fn with_parent(mut self, parent_account_id: AccountId) -> Self {
        self.parent_account_id = Some(parent_account_id);
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active_flag(mut self, active_flag: ActiveFlag) -> Self {
        self.active_flag = active_flag;
        self
    }

    /// Returns true if the account accepts postings.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active_flag.is_active()
    }
}

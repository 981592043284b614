//! Form payloads for each endpoint and their validation.
//!
//! Every field is deserialized as a plain string (missing fields become
//! empty), then `validate` turns the raw form into a typed command or an
//! `AppError::Validation` naming the first problem found.

use crate::error::AppError;
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(self) -> Result<Registration, AppError> {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::Validation("must provide username"));
        }
        if self.password.is_empty() {
            return Err(AppError::Validation("must provide password"));
        }
        if self.password != self.confirmation {
            return Err(AppError::Validation("password not match"));
        }
        Ok(Registration {
            username,
            password: self.password,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    /// Missing credentials are an authentication failure, not a validation one.
    pub fn validate(self) -> Result<Credentials, AppError> {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::Auth("must provide username"));
        }
        if self.password.is_empty() {
            return Err(AppError::Auth("must provide password"));
        }
        Ok(Credentials {
            username,
            password: self.password,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub currentpassword: String,
    #[serde(default)]
    pub newpassword: String,
    #[serde(default)]
    pub confirmation: String,
}

#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
}

impl ChangePasswordForm {
    pub fn validate(self) -> Result<PasswordChange, AppError> {
        if self.currentpassword.is_empty() {
            return Err(AppError::Validation("must provide your current password"));
        }
        if self.newpassword.is_empty() {
            return Err(AppError::Validation("must provide your new password"));
        }
        if self.newpassword != self.confirmation {
            return Err(AppError::Validation("password not match"));
        }
        Ok(PasswordChange {
            current: self.currentpassword,
            new: self.newpassword,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct QuoteForm {
    #[serde(default)]
    pub symbol: String,
}

/// A normalized ticker symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolQuery(pub String);

impl QuoteForm {
    pub fn validate(self) -> Result<SymbolQuery, AppError> {
        normalize_symbol(&self.symbol).map(SymbolQuery)
    }
}

/// Shared by `/buy` and `/sell`.
#[derive(Debug, Deserialize, Default)]
pub struct TradeForm {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub shares: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeOrder {
    pub symbol: String,
    pub shares: i64,
}

impl TradeForm {
    pub fn validate(self) -> Result<TradeOrder, AppError> {
        let symbol = normalize_symbol(&self.symbol)?;
        if self.shares.trim().is_empty() {
            return Err(AppError::Validation("must provide number of shares"));
        }
        let shares = parse_positive(&self.shares)
            .ok_or(AppError::Validation("invalid number of shares"))?;
        Ok(TradeOrder {
            symbol,
            shares: i64::from(shares),
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct AddCashForm {
    #[serde(default)]
    pub addcash: String,
}

/// A deposit in whole dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CashDeposit {
    pub dollars: u32,
}

impl CashDeposit {
    pub fn cents(self) -> i64 {
        i64::from(self.dollars) * 100
    }
}

impl AddCashForm {
    pub fn validate(self) -> Result<CashDeposit, AppError> {
        if self.addcash.trim().is_empty() {
            return Err(AppError::Validation("must provide your added cash amount"));
        }
        let dollars =
            parse_positive(&self.addcash).ok_or(AppError::Validation("invalid cash amount"))?;
        Ok(CashDeposit { dollars })
    }
}

fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("must provide stock symbol"));
    }
    Ok(symbol)
}

/// Accepts only plain decimal digits; signs, fractions and zero are rejected.
fn parse_positive(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|n| *n > 0)
}

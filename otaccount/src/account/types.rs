use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::storage::{Params, Row, Value};

use super::errors::AccountError;
use super::field::AccountField;
use super::password::{hash_password, verify_password};

pub const MIN_ACCOUNT_TYPE: i64 = 1;
pub const MAX_ACCOUNT_TYPE: i64 = 5;
pub const MAX_PREMDAYS: i64 = 65535;

/// A value accepted for `creation`: epoch milliseconds or a calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationTime {
    Millis(i64),
    Date(DateTime<Utc>),
}

impl CreationTime {
    pub fn epoch_millis(self) -> i64 {
        match self {
            CreationTime::Millis(ms) => ms,
            CreationTime::Date(date) => date.timestamp_millis(),
        }
    }

    /// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
    fn parse(s: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(CreationTime::Date(dt.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .map(CreationTime::from)
    }
}

impl From<i64> for CreationTime {
    fn from(ms: i64) -> Self {
        CreationTime::Millis(ms)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for CreationTime {
    fn from(date: DateTime<Tz>) -> Self {
        CreationTime::Date(date.with_timezone(&Utc))
    }
}

impl From<NaiveDate> for CreationTime {
    fn from(date: NaiveDate) -> Self {
        CreationTime::Date(date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

/// A game server login account
///
/// Fields are private; every mutation goes through a setter so the
/// constraints hold from construction onwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    id: i64,
    name: String,
    #[serde(skip)]
    password: Option<String>,
    #[serde(rename = "type")]
    account_type: i64,
    premdays: i64,
    lastday: i64,
    email: String,
    creation: i64,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            password: None,
            account_type: MIN_ACCOUNT_TYPE,
            premdays: 0,
            lastday: 0,
            email: String::new(),
            creation: 0,
        }
    }
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a brand new account stamped with the current time.
    pub fn create(name: &str, password: &str) -> Result<Self, AccountError> {
        if name.is_empty() {
            return Err(AccountError::validation("name", "New account name not set"));
        }
        if password.is_empty() {
            return Err(AccountError::validation(
                "password",
                "New account password not set",
            ));
        }

        let mut account = Self::new();
        account.set_name(name);
        account.set_password(password);
        account.set_creation(Utc::now());
        Ok(account)
    }

    /// Build an account from a property bag.
    ///
    /// Keys that are not account fields are ignored, as are `null` values.
    /// Every recognised value goes through its field's setter, so `password`
    /// is hashed and range checks apply.
    pub fn from_properties(properties: &Map<String, JsonValue>) -> Result<Self, AccountError> {
        let mut account = Self::new();
        for field in AccountField::ALL {
            if let Some(value) = properties.get(field.column()) {
                account.apply(field, json_to_value(field, value)?)?;
            }
        }
        Ok(account)
    }

    /// Rehydrate a persisted row. The stored password hash is kept verbatim.
    pub(crate) fn from_row(row: &Row) -> Result<Self, AccountError> {
        let mut account = Self::new();
        for field in AccountField::ALL {
            match (field, row.get(field.column())) {
                (_, None) | (_, Some(Value::Null)) => {}
                (AccountField::Password, Some(Value::Text(hash))) => {
                    account.password = Some(hash.clone());
                }
                (_, Some(value)) => account.apply(field, value.clone())?,
            }
        }
        Ok(account)
    }

    /// Assign one field from a loosely typed value.
    pub fn apply(&mut self, field: AccountField, value: Value) -> Result<(), AccountError> {
        match (field, value) {
            (_, Value::Null) => Ok(()),
            (AccountField::Id, Value::Int(v)) => self.set_id(v),
            (AccountField::Name, Value::Text(v)) => {
                self.set_name(v);
                Ok(())
            }
            (AccountField::Password, Value::Text(v)) => {
                self.set_password(&v);
                Ok(())
            }
            (AccountField::Type, Value::Int(v)) => self.set_type(v),
            (AccountField::Premdays, Value::Int(v)) => self.set_premdays(v),
            (AccountField::Lastday, Value::Int(v)) => {
                self.set_lastday(v);
                Ok(())
            }
            (AccountField::Email, Value::Text(v)) => {
                self.set_email(v);
                Ok(())
            }
            (AccountField::Creation, Value::Int(v)) => {
                self.set_creation(v);
                Ok(())
            }
            (AccountField::Creation, Value::Text(v)) => {
                let creation = CreationTime::parse(&v).ok_or_else(|| {
                    AccountError::validation(
                        "creation",
                        format!("Account creation must be a timestamp or date, got {v:?}"),
                    )
                })?;
                self.set_creation(creation);
                Ok(())
            }
            (field, value) => Err(type_mismatch(field, &value.to_string())),
        }
    }

    /// Every field as named statement parameters
    pub fn to_params(&self) -> Params {
        AccountField::ALL
            .into_iter()
            .map(|field| (field.column().to_string(), self.value_of(field)))
            .collect()
    }

    pub fn value_of(&self, field: AccountField) -> Value {
        match field {
            AccountField::Id => Value::Int(self.id),
            AccountField::Name => Value::from(self.name.as_str()),
            AccountField::Password => Value::from(self.password.clone()),
            AccountField::Type => Value::Int(self.account_type),
            AccountField::Premdays => Value::Int(self.premdays),
            AccountField::Lastday => Value::Int(self.lastday),
            AccountField::Email => Value::from(self.email.as_str()),
            AccountField::Creation => Value::Int(self.creation),
        }
    }

    /// 0 until the account has been persisted
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Set the id. Succeeds once; any later call fails.
    pub fn set_id(&mut self, id: i64) -> Result<(), AccountError> {
        if self.id != 0 {
            return Err(AccountError::validation("id", "Account id can not be set"));
        }
        if id < 0 {
            return Err(AccountError::validation(
                "id",
                format!("Account id must be positive, got {id}"),
            ));
        }
        self.id = id;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The stored hash, never the plaintext
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn set_password(&mut self, plaintext: &str) {
        self.password = Some(hash_password(plaintext));
    }

    pub fn verify_password(&self, plaintext: &str) -> bool {
        self.password
            .as_deref()
            .is_some_and(|stored| verify_password(plaintext, stored))
    }

    pub fn account_type(&self) -> i64 {
        self.account_type
    }

    pub fn set_type(&mut self, account_type: i64) -> Result<(), AccountError> {
        if !(MIN_ACCOUNT_TYPE..=MAX_ACCOUNT_TYPE).contains(&account_type) {
            return Err(AccountError::validation(
                "type",
                format!(
                    "Account type must be between {MIN_ACCOUNT_TYPE} and {MAX_ACCOUNT_TYPE}, got {account_type}"
                ),
            ));
        }
        self.account_type = account_type;
        Ok(())
    }

    pub fn premdays(&self) -> i64 {
        self.premdays
    }

    pub fn set_premdays(&mut self, premdays: i64) -> Result<(), AccountError> {
        if !(0..=MAX_PREMDAYS).contains(&premdays) {
            return Err(AccountError::validation(
                "premdays",
                format!("Account premium days must be between 0 and {MAX_PREMDAYS}, got {premdays}"),
            ));
        }
        self.premdays = premdays;
        Ok(())
    }

    pub fn lastday(&self) -> i64 {
        self.lastday
    }

    pub fn set_lastday(&mut self, lastday: i64) {
        self.lastday = lastday;
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    /// Creation time in epoch milliseconds
    pub fn creation(&self) -> i64 {
        self.creation
    }

    pub fn set_creation(&mut self, creation: impl Into<CreationTime>) {
        self.creation = creation.into().epoch_millis();
    }
}

fn type_mismatch(field: AccountField, got: &str) -> AccountError {
    let expected = match field {
        AccountField::Name | AccountField::Password | AccountField::Email => "a string",
        AccountField::Creation => "a timestamp or date",
        _ => "an integer",
    };
    AccountError::Validation {
        field: field.column(),
        message: format!("Account {field} must be {expected}, got {got}"),
    }
}

pub(crate) fn json_to_value(
    field: AccountField,
    value: &JsonValue,
) -> Result<Value, AccountError> {
    match value {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::String(s) => Ok(Value::Text(s.clone())),
        JsonValue::Number(n) => match n.as_i64() {
            Some(v) => Ok(Value::Int(v)),
            // 3.0 is an integer, 3.5 is not
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(Value::Int(f as i64))
                }
                _ => Err(type_mismatch(field, &n.to_string())),
            },
        },
        other => Err(type_mismatch(field, &other.to_string())),
    }
}

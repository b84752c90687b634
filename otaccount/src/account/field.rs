use std::fmt;
use std::str::FromStr;

use super::errors::AccountError;

/// The persisted fields of an account, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountField {
    Id,
    Name,
    Password,
    Type,
    Premdays,
    Lastday,
    Email,
    Creation,
}

impl AccountField {
    pub const ALL: [AccountField; 8] = [
        AccountField::Id,
        AccountField::Name,
        AccountField::Password,
        AccountField::Type,
        AccountField::Premdays,
        AccountField::Lastday,
        AccountField::Email,
        AccountField::Creation,
    ];

    /// Column name, also used as the placeholder name in statements
    pub const fn column(self) -> &'static str {
        match self {
            AccountField::Id => "id",
            AccountField::Name => "name",
            AccountField::Password => "password",
            AccountField::Type => "type",
            AccountField::Premdays => "premdays",
            AccountField::Lastday => "lastday",
            AccountField::Email => "email",
            AccountField::Creation => "creation",
        }
    }
}

impl fmt::Display for AccountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for AccountField {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountField::ALL
            .into_iter()
            .find(|field| field.column() == s)
            .ok_or_else(|| AccountError::UnknownField(s.to_string()))
    }
}

use serde_json::{Map, Value as JsonValue};

use crate::storage::Value;

use super::errors::AccountError;
use super::field::AccountField;
use super::types::json_to_value;

/// Lookup criteria for [`super::AccountStore::find`]
///
/// A bare integer looks up by id and a bare string by name; a field list
/// matches rows where every listed field equals its value.
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Id(i64),
    Name(String),
    Fields(Vec<(AccountField, Value)>),
}

impl Criteria {
    pub fn fields<I, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (AccountField, V)>,
        V: Into<Value>,
    {
        Criteria::Fields(pairs.into_iter().map(|(f, v)| (f, v.into())).collect())
    }

    /// Build criteria from a property bag. Unknown keys are rejected.
    pub fn from_properties(properties: &Map<String, JsonValue>) -> Result<Self, AccountError> {
        let mut filter = Vec::with_capacity(properties.len());
        for (key, value) in properties {
            let field: AccountField = key.parse()?;
            let value = json_to_value(field, value)?;
            filter.push((field, value));
        }
        Ok(Criteria::Fields(filter))
    }

    /// Equality filter as (field, value) pairs, joined with AND by the caller
    pub(crate) fn into_filter(self) -> Result<Vec<(AccountField, Value)>, AccountError> {
        let filter = match self {
            Criteria::Id(id) => vec![(AccountField::Id, Value::Int(id))],
            Criteria::Name(name) => vec![(AccountField::Name, Value::Text(name))],
            Criteria::Fields(fields) => fields,
        };
        if filter.is_empty() {
            return Err(AccountError::Precondition(
                "No account lookup criteria given".to_string(),
            ));
        }
        Ok(filter)
    }
}

impl From<i64> for Criteria {
    fn from(id: i64) -> Self {
        Criteria::Id(id)
    }
}

impl From<i32> for Criteria {
    fn from(id: i32) -> Self {
        Criteria::Id(i64::from(id))
    }
}

impl From<&str> for Criteria {
    fn from(name: &str) -> Self {
        Criteria::Name(name.to_string())
    }
}

impl From<String> for Criteria {
    fn from(name: String) -> Self {
        Criteria::Name(name)
    }
}

impl From<Vec<(AccountField, Value)>> for Criteria {
    fn from(fields: Vec<(AccountField, Value)>) -> Self {
        Criteria::Fields(fields)
    }
}

mod criteria;
mod errors;
mod field;
mod password;
mod storage;
mod types;

pub use criteria::Criteria;
pub use errors::AccountError;
pub use field::AccountField;
pub use storage::AccountStore;
pub use types::{Account, CreationTime, MAX_ACCOUNT_TYPE, MAX_PREMDAYS, MIN_ACCOUNT_TYPE};

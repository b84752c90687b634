mod postgres;
mod queries;
mod sqlite;
mod store_type;

pub use store_type::AccountStore;

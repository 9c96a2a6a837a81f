pub mod domain;
pub mod error;
pub mod pagination;
pub mod protocol;
pub mod query;

//! Auth module: domain types, password hashing, tokens, the account list
//! kept in the `accounts` collection, and the service tying them together.

pub mod accounts;
pub mod domain;
pub mod errors;
pub mod password;
pub mod service;
pub mod token;

pub use service::AuthService;

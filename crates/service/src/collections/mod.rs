//! Collection persistence: registry of names, repository seam, JSON-aware
//! store and the request-level service on top.

pub mod registry;
pub mod repository;
pub mod repo;
pub mod store;
pub mod service;

pub use service::CollectionService;
pub use store::CollectionStore;

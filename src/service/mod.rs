pub mod blob_store;
pub mod cache;
pub mod error;
pub mod escrow_service;
pub mod intent_service;
pub mod invalidation;
pub mod job_service;
pub mod profile_service;
pub mod resolver;
pub mod role_service;

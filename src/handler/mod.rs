pub mod blobs;
pub mod cache_handler;
pub mod escrows;
pub mod intents;
pub mod jobs;
pub mod profiles;
pub mod roles;

pub mod accounts;
pub mod api_client;
pub mod database;
pub mod memory;
pub mod placeholder;
pub mod seed;
pub mod sessions;

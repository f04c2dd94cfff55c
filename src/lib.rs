pub mod application;
pub mod browser;
pub mod config;
pub mod domain;
pub mod handlers;
pub mod infrastructure;
pub mod state;

// Re-export commonly used types
pub use application::{ResourceCatalog, ResourceError};
pub use browser::{BrowseQuery, ResourceBrowser, ResourceCache, SortKey, SortOrder, SortSpec};
pub use config::Config;
pub use domain::{Resource, ResourceCategory, ResourceFilter};
pub use infrastructure::database::{ResourceRepository, SqliteRepository};
pub use infrastructure::memory::InMemoryRepository;
pub use state::AppState;

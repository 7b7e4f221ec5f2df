//! Clutch - a headless WordPress client.
//!
//! Fetches posts, terms, users, media and menus from a WordPress site running
//! the Clutch plugin, and resolves every reference embedded in the responses
//! (authors, terms, related posts, links) into complete objects.
//!
//! ```ignore
//! let config = ClientConfig::from_path(Path::new("clutch.toml"))?;
//! let client = Client::new(&config)?;
//!
//! let post = client.fetch_post_by_slug("hello-world", "post").await;
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod link;
pub mod logger;
pub mod query;
pub mod resolver;
pub mod transport;
pub mod utils;

pub use client::{Client, Session};
pub use config::ClientConfig;
pub use entity::{MediaItem, Menu, MenuItem, Post, SearchResult, TaxonomyTerm, User};
pub use error::ClientError;
pub use fetch::Paginated;
pub use query::{Order, PostQuery, SearchQuery, TermQuery, UserQuery};

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod euroinvestor;
pub mod events;
pub mod marketdata;
pub mod normalize;
pub mod schema;
pub mod watchlist;

pub use error::{BackendError, Result};
pub use events::BackendEvent;
pub use watchlist::Watchlist;

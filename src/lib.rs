pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::{Config, SharedConfig};
pub use crate::core::catalog::QuoteCatalog;
pub use crate::core::display::DisplayController;
pub use crate::core::scale::ScaleReader;
pub use crate::core::session::SessionLoop;
pub use crate::utils::error::{Result, ZitatError};

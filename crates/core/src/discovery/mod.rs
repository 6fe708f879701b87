//! Discovery module for finding work in the source directory.
//!
//! A [`Scanner`] lists the files currently present in the watched directory
//! and turns them into [`WorkItem`]s. The listing is non-recursive and applies
//! no extension filter: every regular file is considered work.
//!
//! # Example
//!
//! ```ignore
//! use transcoder_core::discovery::{DirScanner, DiscoveryConfig, Scanner};
//!
//! let scanner = DirScanner::new(DiscoveryConfig::new("/movies/incoming"));
//! let queue = scanner.scan().await?;
//! println!("Found {} files to convert.", queue.len());
//! ```

mod config;
mod dir_scanner;
mod error;
mod traits;
mod types;

pub use config::DiscoveryConfig;
pub use dir_scanner::DirScanner;
pub use error::DiscoveryError;
pub use traits::Scanner;
pub use types::{WorkItem, WorkQueue};

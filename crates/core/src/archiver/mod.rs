//! Archiver module for moving finished sources into the archive directory.
//!
//! After a file has been converted its original is moved out of the source
//! directory so the next scan does not pick it up again.
//!
//! # Features
//!
//! - Atomic rename when source and archive share a filesystem
//! - Copy fallback across filesystems, with SHA-256 verification before the
//!   source is removed
//! - Name collisions resolved by moving the previously archived file into a
//!   `backup` subdirectory before the new one takes its place
//! - Rollback of the backup step if the replacement cannot complete
//!
//! # Example
//!
//! ```ignore
//! use transcoder_core::archiver::{Archiver, ArchiverConfig, FsArchiver};
//! use transcoder_core::discovery::WorkItem;
//!
//! let archiver = FsArchiver::new(ArchiverConfig::new("/movies/archive"));
//! let outcome = archiver.archive(&WorkItem::new("/movies/incoming/a.mov")).await?;
//! if let Some(backup) = outcome.backup {
//!     println!("Previous version kept at {}", backup.display());
//! }
//! ```

mod config;
mod error;
mod fs_archiver;
mod traits;
mod types;

pub use config::ArchiverConfig;
pub use error::ArchiverError;
pub use fs_archiver::FsArchiver;
pub use traits::Archiver;
pub use types::{ArchiveOutcome, MoveMethod};

//! Reverter
//!
//! A transactional checkpoint/rollback facility for configuration files
//! mutated by an automated certificate-provisioning agent. Every mutation
//! is captured into a checkpoint before it happens; checkpoints finalize
//! atomically and roll back in LIFO order, with a recovery routine that
//! repairs whatever a crash mid-run left behind.
//!
//! # Example
//!
//! ```no_run
//! use reverter::{Reverter, ReverterConfig};
//!
//! let config = ReverterConfig::load();
//! let reverter = Reverter::new(&config);
//! reverter.add_to_temp_checkpoint(&["/etc/nginx/nginx.conf"], "before edit")?;
//! // ... mutate the file ...
//! reverter.revert_temporary_config()?;
//! # Ok::<(), reverter::ReverterError>(())
//! ```

pub mod cli;
pub mod config;
pub mod enhancements;
pub mod reverter;

pub use config::ReverterConfig;
pub use enhancements::{ask as ask_enhancement, Enhancement, EnhancementPrompt};
pub use reverter::error::{ReverterError, Result};
pub use reverter::{CheckpointSummary, RollbackCount, Reverter};

//! Asynchronous Linux inotify bindings for tokio.
//!
//! Register interest in directory paths and consume an ordered stream of
//! filesystem-change events without polling. The crate decodes the kernel's
//! packed event records itself and bridges the fd's readiness into an
//! awaitable pull-based API; it deliberately adds nothing on top of what
//! inotify provides (no recursive-watch emulation, no de-duplication, no
//! cross-platform fallback).
//!
//! # Example
//!
//! ```no_run
//! use async_inotify::{Inotify, Mask};
//!
//! # async fn demo() -> async_inotify::Result<()> {
//! let mut inotify = Inotify::new()?;
//! inotify.add_watch("/tmp", Mask::CREATE | Mask::DELETE | Mask::MOVE)?;
//!
//! loop {
//!     let event = inotify.next().await?;
//!     if let Some(path) = event.path() {
//!         println!("{:?}: {}", event.mask(), path.display());
//!     }
//! }
//! # }
//! ```

mod error;
mod event;
mod handle;
mod mask;
mod watch;

pub use error::{Error, Result};
pub use event::Event;
pub use handle::{Inotify, DEFAULT_CACHE_SIZE};
pub use mask::Mask;
pub use watch::{Watch, WatchDescriptor};

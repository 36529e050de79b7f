//! The notification handle: owns the inotify fd, the watch registry, the
//! read buffer, and the queue of decoded-but-unconsumed events.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::os::fd::OwnedFd;
use std::path::Path;
use std::sync::Arc;

use futures_core::Stream;
use rustix::fs::inotify::{self, CreateFlags, WatchFlags};
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;

use crate::error::{Error, Result};
use crate::event::{decode_events, Event, HEADER_SIZE, NAME_MAX};
use crate::mask::Mask;
use crate::watch::{Watch, WatchDescriptor, WatchRegistry};

/// Read-ahead batch size used by [`Inotify::new`].
pub const DEFAULT_CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(n) => n,
    None => panic!("default cache size must be non-zero"),
};

/// An asynchronous inotify instance.
///
/// Fetches events from the kernel in bulk where possible and hands them out
/// one at a time through [`Inotify::next`]. The underlying fd is released
/// when the handle is dropped or on the first call to [`Inotify::close`],
/// whichever comes first.
///
/// All methods take `&mut self`: a handle has a single logical consumer, and
/// concurrent use is ruled out at compile time rather than by locking.
#[derive(Debug)]
pub struct Inotify {
    /// `None` once the handle has been closed.
    fd: Option<AsyncFd<OwnedFd>>,
    registry: WatchRegistry,
    queue: VecDeque<Event>,
    buffer: Vec<u8>,
    cache_size: NonZeroUsize,
}

impl Inotify {
    /// Creates an inotify instance with the default cache size.
    ///
    /// The fd is created close-on-exec and non-blocking and registered with
    /// the current tokio reactor, so this must be called from within a tokio
    /// runtime with I/O enabled.
    ///
    /// # Errors
    ///
    /// [`Error::Init`] if the kernel refuses the instance (for example when
    /// the per-user inotify instance limit is exhausted); [`Error::Io`] if
    /// reactor registration fails.
    pub fn new() -> Result<Self> {
        Self::with_cache_size(DEFAULT_CACHE_SIZE)
    }

    /// Creates an inotify instance sized to read up to `cache_size`
    /// full-size events per wakeup.
    ///
    /// The actual number of events per bulk read is usually higher, because
    /// most records carry names far shorter than the maximum. Larger values
    /// amortize read syscalls at the cost of a larger buffer.
    ///
    /// # Errors
    ///
    /// Same as [`Inotify::new`].
    pub fn with_cache_size(cache_size: NonZeroUsize) -> Result<Self> {
        let fd = inotify::init(CreateFlags::CLOEXEC | CreateFlags::NONBLOCK)
            .map_err(|errno| Error::Init {
                source: errno.into(),
            })?;
        let fd = AsyncFd::with_interest(fd, Interest::READABLE)?;
        Ok(Self {
            fd: Some(fd),
            registry: WatchRegistry::default(),
            queue: VecDeque::new(),
            buffer: vec![0; Self::buffer_len(cache_size)],
            cache_size,
        })
    }

    fn buffer_len(cache_size: NonZeroUsize) -> usize {
        (HEADER_SIZE + NAME_MAX + 1) * cache_size.get()
    }

    /// Current read-ahead batch size.
    #[must_use]
    pub fn cache_size(&self) -> usize {
        self.cache_size.get()
    }

    /// Changes the read-ahead batch size. Takes effect on the next bulk
    /// read.
    pub fn set_cache_size(&mut self, cache_size: NonZeroUsize) {
        self.cache_size = cache_size;
        self.buffer.resize(Self::buffer_len(cache_size), 0);
    }

    /// Registers interest in `path` under `mask` and returns the resulting
    /// watch.
    ///
    /// The registry keeps one strong reference to the watch for as long as
    /// it is live; the returned reference is the caller's to keep or drop.
    /// Non-UTF-8 paths are supported.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMask`] if `mask` selects no filesystem events;
    /// [`Error::Watch`] if the kernel rejects the registration (missing
    /// path, permission denied, watch limit); [`Error::Closed`] after
    /// [`Inotify::close`]. A failed registration leaves existing watches and
    /// the event stream untouched.
    pub fn add_watch(&mut self, path: impl AsRef<Path>, mask: Mask) -> Result<Arc<Watch>> {
        let path = path.as_ref();
        if (mask & Mask::EVENT_BITS).is_empty() {
            return Err(Error::InvalidMask { mask });
        }
        let fd = self.fd.as_ref().ok_or(Error::Closed)?;

        let wd = inotify::add_watch(fd.get_ref(), path, WatchFlags::from_bits_retain(mask.bits()))
            .map_err(|errno| Error::Watch {
                path: path.to_path_buf(),
                source: errno.into(),
            })?;

        tracing::debug!(wd, path = %path.display(), ?mask, "watch registered");
        let watch = Arc::new(Watch::new(WatchDescriptor(wd), path.to_path_buf(), mask));
        self.registry.insert(Arc::clone(&watch));
        Ok(watch)
    }

    /// Removes a watch registered through [`Inotify::add_watch`].
    ///
    /// The registry entry is evicted immediately; the kernel still queues
    /// one final [`Mask::IGNORED`] event for the descriptor, which will
    /// resolve to an absent watch.
    ///
    /// # Errors
    ///
    /// [`Error::Watch`] if the kernel rejects the removal (the descriptor is
    /// no longer valid); [`Error::Closed`] after [`Inotify::close`].
    pub fn rm_watch(&mut self, watch: &Watch) -> Result<()> {
        let fd = self.fd.as_ref().ok_or(Error::Closed)?;
        inotify::remove_watch(fd.get_ref(), watch.descriptor().as_raw()).map_err(|errno| {
            Error::Watch {
                path: watch.path().to_path_buf(),
                source: errno.into(),
            }
        })?;
        self.registry.evict(watch.descriptor());
        tracing::debug!(wd = watch.descriptor().as_raw(), "watch removed");
        Ok(())
    }

    /// Returns the next event, suspending until one is available.
    ///
    /// Pops from the internal queue when events are already buffered;
    /// otherwise waits for the fd to become readable, performs one bulk
    /// read, decodes the whole batch into the queue, and pops the front.
    /// Events are delivered strictly in kernel order.
    ///
    /// Cancel-safe: dropping the future mid-wait deregisters the readiness
    /// interest and leaves the handle fully usable.
    ///
    /// # Errors
    ///
    /// [`Error::Closed`] after [`Inotify::close`] (even if decoded events
    /// were still queued); [`Error::Decode`] if the kernel stream is
    /// truncated mid-record; [`Error::Io`] if waiting on or reading from the
    /// fd fails.
    pub async fn next(&mut self) -> Result<Event> {
        let Self {
            fd,
            registry,
            queue,
            buffer,
            ..
        } = self;

        loop {
            let fd = fd.as_ref().ok_or(Error::Closed)?;
            if let Some(event) = queue.pop_front() {
                return Ok(event);
            }

            let mut guard = fd.readable().await?;
            match guard.try_io(|inner| {
                rustix::io::read(inner.get_ref(), buffer.as_mut_slice())
                    .map_err(std::io::Error::from)
            }) {
                Ok(Ok(n)) => {
                    queue.extend(decode_events(&buffer[..n], registry)?);
                }
                Ok(Err(err)) => return Err(Error::Io(err)),
                // Readiness was stale; try_io already cleared it.
                Err(_would_block) => {}
            }
        }
    }

    /// Closes the handle, releasing the inotify fd.
    ///
    /// Idempotent: closing an already-closed handle is a no-op. Any events
    /// still buffered are discarded; every subsequent call to
    /// [`Inotify::next`] fails with [`Error::Closed`]. Dropping the handle
    /// has the same effect on the fd, so explicit closing is only needed to
    /// release the resource early.
    pub fn close(&mut self) {
        if let Some(fd) = self.fd.take() {
            drop(fd);
            self.queue.clear();
            tracing::debug!("inotify handle closed");
        }
    }

    /// Consumes the handle and yields its events forever.
    ///
    /// This is a live stream, not a replay: each item is produced by an
    /// internal [`Inotify::next`] call. The stream ends after yielding the
    /// first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Event>> {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut handle = state?;
            match handle.next().await {
                Ok(event) => Some((Ok(event), Some(handle))),
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sized_for_full_size_events() {
        let one = NonZeroUsize::new(1).unwrap();
        assert_eq!(Inotify::buffer_len(one), HEADER_SIZE + NAME_MAX + 1);
        assert_eq!(
            Inotify::buffer_len(DEFAULT_CACHE_SIZE),
            (HEADER_SIZE + NAME_MAX + 1) * 10
        );
    }
}

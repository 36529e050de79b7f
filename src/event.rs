//! Decoded events and the kernel wire format.
//!
//! The kernel delivers a packed stream of variable-length records on the
//! inotify fd. Each record is a fixed 16-byte native-endian header
//! (`wd: i32, mask: u32, cookie: u32, len: u32`) followed by exactly `len`
//! bytes of NUL-padded name data. [`decode_events`] splits one bulk read
//! into caller-facing [`Event`]s, preserving kernel delivery order.

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};
use crate::mask::Mask;
use crate::watch::{Watch, WatchDescriptor, WatchRegistry};

/// Size of the fixed `inotify_event` header.
pub(crate) const HEADER_SIZE: usize = 16;

/// Maximum filename length the kernel will place in a record's trailer.
pub(crate) const NAME_MAX: usize = 255;

/// One decoded filesystem-change notification.
///
/// Events reference their originating [`Watch`] weakly: if the watch has been
/// removed (or the event is a queue-overflow notification, which carries
/// descriptor -1), [`Event::watch`] resolves to `None`.
#[derive(Debug)]
pub struct Event {
    watch: Weak<Watch>,
    mask: Mask,
    cookie: u32,
    name: Option<OsString>,
}

impl Event {
    /// The watch this event belongs to, if it is still registered.
    #[must_use]
    pub fn watch(&self) -> Option<Arc<Watch>> {
        self.watch.upgrade()
    }

    /// Event category bits. Unknown kernel bits are passed through unchanged.
    #[must_use]
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Rename-correlation token pairing a `MOVED_FROM` with its `MOVED_TO`.
    ///
    /// Zero when the event is not part of a rename.
    #[must_use]
    pub fn cookie(&self) -> u32 {
        self.cookie
    }

    /// Name of the affected entry, relative to the watched directory.
    ///
    /// Absent for events on the watched path itself. Non-UTF-8 filenames are
    /// passed through byte-for-byte.
    #[must_use]
    pub fn name(&self) -> Option<&OsStr> {
        self.name.as_deref()
    }

    /// Full path of the affected entry: the watch's path joined with
    /// [`Event::name`]. Absent unless both resolve.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        let watch = self.watch()?;
        let name = self.name.as_ref()?;
        Some(watch.path().join(name))
    }
}

struct RawHeader {
    wd: i32,
    mask: u32,
    cookie: u32,
    len: u32,
}

fn field(buf: &[u8], offset: usize) -> [u8; 4] {
    [
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ]
}

/// Caller guarantees `buf` holds at least [`HEADER_SIZE`] bytes.
fn parse_header(buf: &[u8]) -> RawHeader {
    RawHeader {
        wd: i32::from_ne_bytes(field(buf, 0)),
        mask: u32::from_ne_bytes(field(buf, 4)),
        cookie: u32::from_ne_bytes(field(buf, 8)),
        len: u32::from_ne_bytes(field(buf, 12)),
    }
}

/// Extracts the semantic name from a record's trailing bytes.
///
/// The kernel NUL-pads the trailer to a word boundary; only bytes up to the
/// first NUL are meaningful. A leading NUL (or an empty trailer) means the
/// event has no name.
fn extract_name(raw: &[u8]) -> Option<OsString> {
    match raw.first() {
        None | Some(0) => None,
        Some(_) => {
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            Some(OsStr::from_bytes(&raw[..end]).to_os_string())
        }
    }
}

/// Decodes one bulk read into an ordered batch of events.
///
/// Stops cleanly only at the exact end of the populated region. A partial
/// header or a trailer shorter than its header claims is a protocol
/// violation and fails the whole batch with [`Error::Decode`], since
/// resynchronizing after a bad record boundary is impossible.
///
/// Descriptors are resolved against `registry`; unknown descriptors
/// (including -1 for queue overflow) resolve to an absent watch, never an
/// error. Observing [`Mask::IGNORED`] evicts the descriptor's registry entry,
/// dropping the registry's strong reference; the IGNORED event itself
/// resolves only while the caller still holds the watch returned from
/// registration.
pub(crate) fn decode_events(buf: &[u8], registry: &mut WatchRegistry) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    let mut offset = 0;

    while offset < buf.len() {
        let remaining = buf.len() - offset;
        if remaining < HEADER_SIZE {
            return Err(Error::Decode { offset, remaining });
        }

        let header = parse_header(&buf[offset..]);
        offset += HEADER_SIZE;

        let len = header.len as usize;
        if buf.len() - offset < len {
            return Err(Error::Decode {
                offset,
                remaining: buf.len() - offset,
            });
        }
        let name = extract_name(&buf[offset..offset + len]);
        offset += len;

        let descriptor = WatchDescriptor(header.wd);
        let mask = Mask::from_bits_retain(header.mask);
        let watch = registry
            .lookup(descriptor)
            .map_or_else(Weak::new, Arc::downgrade);

        if mask.contains(Mask::IGNORED) && registry.evict(descriptor).is_some() {
            tracing::debug!(wd = header.wd, "watch ignored by kernel, evicted from registry");
        }

        events.push(Event {
            watch,
            mask,
            cookie: header.cookie,
            name,
        });
    }

    tracing::trace!(count = events.len(), bytes = buf.len(), "decoded event batch");
    Ok(events)
}

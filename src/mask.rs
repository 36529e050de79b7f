//! Interest and event bitset for inotify watches.
//!
//! Bit values follow `include/uapi/linux/inotify.h`. The same type is used
//! both when registering interest with [`crate::Inotify::add_watch`] and when
//! inspecting the mask of a received [`crate::Event`].

use bitflags::bitflags;

bitflags! {
    /// Bit-mask for adding a watch and for analyzing watch events.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Mask: u32 {
        /// File was accessed (read).
        const ACCESS = 0x0000_0001;
        /// File was modified.
        const MODIFY = 0x0000_0002;
        /// Metadata changed (permissions, timestamps, ownership, ...).
        const ATTRIB = 0x0000_0004;
        /// File opened for writing was closed.
        const CLOSE_WRITE = 0x0000_0008;
        /// File not opened for writing was closed.
        const CLOSE_NOWRITE = 0x0000_0010;
        /// File was opened.
        const OPEN = 0x0000_0020;
        /// File was moved out of the watched directory.
        const MOVED_FROM = 0x0000_0040;
        /// File was moved into the watched directory.
        const MOVED_TO = 0x0000_0080;
        /// File or directory was created in the watched directory.
        const CREATE = 0x0000_0100;
        /// File or directory was deleted from the watched directory.
        const DELETE = 0x0000_0200;
        /// The watched path itself was deleted.
        const DELETE_SELF = 0x0000_0400;
        /// The watched path itself was moved.
        const MOVE_SELF = 0x0000_0800;

        /// Backing filesystem was unmounted.
        const UNMOUNT = 0x0000_2000;
        /// Kernel event queue overflowed; events were lost.
        const Q_OVERFLOW = 0x0000_4000;
        /// Watch was removed, explicitly or because the target vanished.
        const IGNORED = 0x0000_8000;

        /// Only watch the path if it is a directory.
        const ONLYDIR = 0x0100_0000;
        /// Do not follow the path if it is a symlink.
        const DONT_FOLLOW = 0x0200_0000;
        /// Drop events for children that have been unlinked.
        const EXCL_UNLINK = 0x0400_0000;
        /// OR this mask into an existing watch instead of replacing it.
        const MASK_ADD = 0x2000_0000;
        /// Subject of this event is a directory.
        const ISDIR = 0x4000_0000;
        /// Remove the watch after the first event.
        const ONESHOT = 0x8000_0000;

        /// Either close event.
        const CLOSE = Self::CLOSE_WRITE.bits() | Self::CLOSE_NOWRITE.bits();
        /// Either move event.
        const MOVE = Self::MOVED_FROM.bits() | Self::MOVED_TO.bits();
    }
}

impl Mask {
    /// The subset of bits that select actual filesystem events when adding a
    /// watch. A registration mask must contain at least one of these; the
    /// remaining bits only modulate watch behavior.
    pub(crate) const EVENT_BITS: Mask = Self::ACCESS
        .union(Self::MODIFY)
        .union(Self::ATTRIB)
        .union(Self::CLOSE_WRITE)
        .union(Self::CLOSE_NOWRITE)
        .union(Self::OPEN)
        .union(Self::MOVED_FROM)
        .union(Self::MOVED_TO)
        .union(Self::CREATE)
        .union(Self::DELETE)
        .union(Self::DELETE_SELF)
        .union(Self::MOVE_SELF);
}

//! Real-time-safe logging.
//!
//! Parameter changes can land on the audio thread, where calling into the
//! `log` facade (or anything that formats into a `String`) is off limits.
//! The `lm_log!` macro instead formats into a fixed stack buffer and pushes
//! it onto a bounded lock-free ring; a control thread drains the ring into
//! the ordinary `log` facade whenever convenient. With the `debug` feature
//! off the macro compiles to nothing.

use std::fmt;

#[cfg(feature = "debug")]
pub mod rt {
    use std::cell::UnsafeCell;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;

    /// Ring slots; writes are dropped when the ring is full.
    const SLOTS: usize = 64;
    /// Bytes per message; longer messages are truncated.
    const MSG_BYTES: usize = 160;

    #[derive(Copy, Clone)]
    struct Entry {
        len: usize,
        bytes: [u8; MSG_BYTES],
    }

    impl Entry {
        const EMPTY: Entry = Entry { len: 0, bytes: [0; MSG_BYTES] };
    }

    struct Ring {
        head: AtomicUsize,
        tail: AtomicUsize,
        slots: [UnsafeCell<Entry>; SLOTS],
    }

    // Single producer (audio thread), single consumer (drain caller).
    unsafe impl Sync for Ring {}

    impl Ring {
        fn new() -> Self {
            Self {
                head: AtomicUsize::new(0),
                tail: AtomicUsize::new(0),
                slots: [const { UnsafeCell::new(Entry::EMPTY) }; SLOTS],
            }
        }

        fn push(&self, entry: Entry) {
            let head = self.head.load(Ordering::Relaxed);
            let next = (head + 1) % SLOTS;
            if next == self.tail.load(Ordering::Acquire) {
                return; // full; dropping beats blocking
            }
            unsafe {
                *self.slots[head].get() = entry;
            }
            self.head.store(next, Ordering::Release);
        }

        fn pop(&self) -> Option<Entry> {
            let tail = self.tail.load(Ordering::Relaxed);
            if tail == self.head.load(Ordering::Acquire) {
                return None;
            }
            let entry = unsafe { *self.slots[tail].get() };
            self.tail.store((tail + 1) % SLOTS, Ordering::Release);
            Some(entry)
        }
    }

    static RING: OnceLock<Ring> = OnceLock::new();

    struct StackWriter {
        entry: Entry,
    }

    impl fmt::Write for StackWriter {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let avail = MSG_BYTES - self.entry.len;
            let n = s.len().min(avail);
            self.entry.bytes[self.entry.len..self.entry.len + n]
                .copy_from_slice(&s.as_bytes()[..n]);
            self.entry.len += n;
            Ok(())
        }
    }

    /// Format onto the stack and enqueue. Called from the macro only.
    pub fn push_args(args: fmt::Arguments) {
        let ring = RING.get_or_init(Ring::new);
        let mut w = StackWriter { entry: Entry::EMPTY };
        let _ = fmt::write(&mut w, args);
        ring.push(w.entry);
    }

    /// Forward everything queued so far to the `log` facade. Call from a
    /// control thread, never from the audio callback.
    pub fn drain() {
        let ring = match RING.get() {
            Some(r) => r,
            None => return,
        };
        while let Some(entry) = ring.pop() {
            if let Ok(msg) = std::str::from_utf8(&entry.bytes[..entry.len]) {
                log::debug!(target: "loopmix", "{msg}");
            }
        }
    }
}

#[cfg(feature = "debug")]
pub(crate) fn lm_log_inner(args: fmt::Arguments) {
    rt::push_args(args);
}

#[cfg(not(feature = "debug"))]
pub(crate) fn lm_log_inner(_args: fmt::Arguments) {}

#[macro_export]
macro_rules! lm_log {
    ($($arg:tt)*) => {
        $crate::debug::lm_log_inner(format_args!($($arg)*))
    };
}

#[cfg(all(test, feature = "debug"))]
mod tests {
    #[test]
    fn test_ring_round_trip() {
        crate::lm_log!("hello {}", 42);
        // Draining must not panic and must not loop forever.
        super::rt::drain();
    }
}

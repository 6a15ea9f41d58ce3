//! The region descriptor: bounds, list heads, the next-fit cursor, and
//! running statistics for a single managed region.

use crate::error::InitError;
use crate::header::Header;
use crate::secret::SecretPtr;
use crate::stats::Stats;
use core::ptr;

/// Manages one fixed-size contiguous region of bytes, servicing `malloc`
/// and `free` requests from bookkeeping stored in-band.
///
/// A `Heap` does not own or acquire its backing bytes; the caller provides
/// them to [`Heap::init`] and is responsible for keeping that memory valid,
/// writable, and exclusive to this allocator for as long as the `Heap`
/// lives. This mirrors the allocator's role as a pure block-graph manager:
/// obtaining memory from the operating system is the caller's concern.
///
/// Not `Send` or `Sync`: a `Heap` is single-threaded and non-reentrant by
/// design. Sharing one across threads is the caller's responsibility and
/// requires external synchronization.
pub struct Heap {
    pub(crate) top: usize,
    pub(crate) bottom: usize,
    pub(crate) free_head: *mut Header,
    pub(crate) used_head: *mut Header,
    pub(crate) next_fit: *mut Header,
    pub(crate) stats: Stats,
    initialized: bool,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    /// Constructs an empty, uninitialized heap. Call [`Self::init`] before
    /// any allocation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            top: 0,
            bottom: 0,
            free_head: ptr::null_mut(),
            used_head: ptr::null_mut(),
            next_fit: ptr::null_mut(),
            stats: Stats {
                curr_free_mem: 0,
                curr_used_mem: 0,
                peak_used_mem: 0,
                curr_num_free_blocks: 0,
                curr_num_used_blocks: 0,
                peak_num_used_blocks: 0,
            },
            initialized: false,
        }
    }

    /// Whether [`Self::init`] has run.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Brings the heap up over `[start, start + len)`, writing a single
    /// Free header spanning the whole region.
    ///
    /// Idempotent only in the sense that calling it twice simply discards
    /// and replaces all prior bookkeeping; any live allocations from a
    /// previous `init` are silently invalidated. Callers should call this
    /// exactly once per region.
    ///
    /// # Errors
    /// Returns [`InitError::RegionTooSmall`] if `len` cannot hold even one
    /// header.
    ///
    /// # Safety
    /// `[start, start + len)` must denote writable memory, valid for the
    /// lifetime of this `Heap`, and not concurrently accessed by anyone
    /// else. `start` must be sufficiently aligned for `Header`.
    pub unsafe fn init(&mut self, start: usize, len: usize) -> Result<(), InitError> {
        if len < Header::SIZE {
            return Err(InitError::RegionTooSmall {
                len,
                header: Header::SIZE,
            });
        }

        let payload_size = (len - Header::SIZE) as u32;
        unsafe {
            let initial = Header::place_free(start as *mut u8, payload_size, false);
            SecretPtr::write_trailer(initial);

            self.top = start;
            self.bottom = start + len;
            self.free_head = initial;
            self.used_head = ptr::null_mut();
            self.next_fit = initial;
        }
        self.stats.reset_to_single_free_block(payload_size);
        self.initialized = true;

        log::debug!(
            "heap initialized: {len} bytes at {start:#x}, one free block of {payload_size} bytes"
        );
        Ok(())
    }

    /// Current usage statistics.
    #[must_use]
    pub const fn stats(&self) -> Stats {
        self.stats
    }

    /// The region's `[top, bottom)` address bounds.
    #[must_use]
    pub const fn bounds(&self) -> (usize, usize) {
        (self.top, self.bottom)
    }

    /// Allocates `size` payload bytes via next-fit search, splitting the
    /// chosen free block if it is larger than needed.
    ///
    /// Returns a pointer to the payload, or null if no free block is large
    /// enough. `size == 0` is not validated against; per the allocator's
    /// general contract, misuse is undefined rather than checked.
    ///
    /// # Safety
    /// `self` must be initialized via [`Self::init`].
    pub unsafe fn malloc(&mut self, size: u32) -> *mut u8 {
        unsafe { crate::alloc::malloc(self, size) }
    }

    /// Releases a payload previously returned by [`Self::malloc`] on this
    /// heap, coalescing with free neighbors where possible.
    ///
    /// # Safety
    /// `payload` must equal a value previously returned by [`Self::malloc`]
    /// on this heap and not yet released.
    pub unsafe fn free(&mut self, payload: *mut u8) {
        unsafe { crate::release::free(self, payload) }
    }

    pub(crate) fn is_top(&self, header: *mut Header) -> bool {
        header as usize == self.top
    }

    pub(crate) fn is_in_region(&self, addr: *mut u8) -> bool {
        (addr as usize) < self.bottom
    }
}

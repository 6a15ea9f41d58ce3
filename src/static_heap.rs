//! Statically sized backing storage bundled with the region descriptor that
//! manages it.

use core::marker::PhantomPinned;
use core::pin::Pin;

use crate::region::Heap;
use crate::HEAP_SIZE;

/// Heap storage with a minimum alignment suitable for headers and common
/// payload types.
#[repr(align(16))]
struct Storage([u8; HEAP_SIZE]);

/// A [`Heap`] paired with its own statically sized backing storage.
///
/// Scoped acquisition: the storage's lifetime is bound to this instance —
/// there is no separate "acquire the region" step visible to callers, and no
/// way to detach the `Heap` from its storage. Once [`Self::ensure_init`] has
/// run, the embedded `Heap` holds absolute addresses (`top`, `bottom`,
/// `free_head`, `used_head`, the next-fit cursor) captured against this
/// instance's own storage. Relocating a `StaticHeap` after that point —
/// `let h2 = h;`, moving it into a `Vec`, returning it by value out of a
/// function that already called `ensure_init` — leaves those addresses
/// pointing at the old location; any `malloc`/`free` reached through the
/// moved value is then use of invalid memory.
///
/// `StaticHeap` is neither `Clone` nor `Copy`, and is `!Unpin`: the only way
/// to reach [`Self::ensure_init`] or [`Self::heap_mut`] is through
/// `Pin<&mut Self>`, which will not compile if the value could still move.
/// Pin it once, near construction — `core::pin::pin!(StaticHeap::new())` on
/// the stack, or `Box::pin` on the heap — and thread the `Pin` through from
/// there.
pub struct StaticHeap {
    storage: Storage,
    heap: Heap,
    _pin: PhantomPinned,
}

impl StaticHeap {
    /// Constructs zeroed, uninitialized storage and an uninitialized heap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            storage: Storage([0; HEAP_SIZE]),
            heap: Heap::new(),
            _pin: PhantomPinned,
        }
    }

    /// Brings the heap up over this instance's own storage, if it has not
    /// been already.
    ///
    /// # Panics
    /// Panics if `HEAP_SIZE` is too small to hold a single block header.
    /// `HEAP_SIZE` is a crate-wide constant sized well past that floor, so
    /// this is unreachable in practice.
    pub fn ensure_init(mut self: Pin<&mut Self>) {
        if self.heap.is_initialized() {
            return;
        }
        // Safe: we only write through the fields in place and never move
        // `*self`, which is exactly what the `Pin` contract requires.
        let this = unsafe { self.as_mut().get_unchecked_mut() };
        let start = core::ptr::addr_of_mut!(this.storage.0).cast::<u8>() as usize;
        unsafe {
            this.heap
                .init(start, HEAP_SIZE)
                .expect("HEAP_SIZE always exceeds one header");
        }
    }

    /// The managed heap, initializing it on first use.
    ///
    /// # Panics
    /// See [`Self::ensure_init`].
    pub fn heap_mut(mut self: Pin<&mut Self>) -> &mut Heap {
        self.as_mut().ensure_init();
        // Safe: same justification as in `ensure_init`.
        &mut unsafe { self.get_unchecked_mut() }.heap
    }
}

impl Default for StaticHeap {
    fn default() -> Self {
        Self::new()
    }
}

//! The free list: an address-sorted intrusive doubly linked list of Free
//! headers.
//!
//! Sorting by address is what lets the release path find a block's
//! predecessor-in-the-list in the same position its memory-predecessor
//! would occupy, and is what the next-fit cursor rotates over.

use crate::header::Header;
use crate::region::Heap;

/// Inserts `node` into the free list in address order.
///
/// Does not write the node's trailer and does not update statistics; callers
/// own both (§4.4 draws this boundary so insertion can be reused from the
/// allocator's split path and the releaser's case-a path alike).
///
/// # Safety
/// `node` must point to a freshly placed Free header not already linked
/// into any list.
pub(crate) unsafe fn insert_sorted(heap: &mut Heap, node: *mut Header) {
    unsafe {
        if heap.free_head.is_null() {
            (*node).prev = core::ptr::null_mut();
            (*node).next = core::ptr::null_mut();
            heap.free_head = node;
            heap.next_fit = node;
            return;
        }

        if (node as usize) < (heap.free_head as usize) {
            (*node).prev = core::ptr::null_mut();
            (*node).next = heap.free_head;
            (*heap.free_head).prev = node;
            heap.free_head = node;
            return;
        }

        let mut current = heap.free_head;
        while !(*current).next.is_null() && ((*current).next as usize) < (node as usize) {
            current = (*current).next;
        }

        let next = (*current).next;
        (*node).prev = current;
        (*node).next = next;
        (*current).next = node;
        if !next.is_null() {
            (*next).prev = node;
        }
    }
}

/// Removes `node` from the free list, fixing up `free_head` and `next_fit`
/// so both remain valid (§3 invariants 4 and 8) even when `node` was either.
///
/// # Safety
/// `node` must currently be linked into `heap`'s free list.
pub(crate) unsafe fn unlink(heap: &mut Heap, node: *mut Header) {
    unsafe {
        let prev = (*node).prev;
        let next = (*node).next;

        if !prev.is_null() {
            (*prev).next = next;
        } else {
            heap.free_head = next;
        }

        if !next.is_null() {
            (*next).prev = prev;
        }

        if core::ptr::eq(heap.next_fit, node) {
            heap.next_fit = if !next.is_null() { next } else { heap.free_head };
        }
    }
}

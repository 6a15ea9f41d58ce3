//! The release path: classify a freed block's neighbors and coalesce
//! according to whichever of the four cases applies.

use crate::free_list;
use crate::header::{Header, Kind};
use crate::region::Heap;
use crate::secret::SecretPtr;
use crate::used_list;

/// Releases a previously allocated payload back to the heap, coalescing
/// with adjacent free neighbors where possible.
///
/// # Safety
/// `payload` must equal a value previously returned by a `malloc` call on
/// this `heap` and not yet released.
pub(crate) unsafe fn free(heap: &mut Heap, payload: *mut u8) {
    unsafe {
        let u = Header::header_of(payload);
        let size = (*u).size;

        let below_hdr = Header::below_addr(u).cast::<Header>();
        let below_in_region = heap.is_in_region(below_hdr.cast::<u8>());
        let below_free = below_in_region && (*below_hdr).kind == Kind::Free;
        let above_free = !heap.is_top(u) && (*u).above_is_free;

        match (above_free, below_free) {
            (false, false) => release_no_neighbors(heap, u, size, below_in_region, below_hdr),
            (false, true) => release_below_free(heap, u, size, below_hdr),
            (true, false) => release_above_free(heap, u, size, below_in_region, below_hdr),
            (true, true) => release_both_free(heap, u, size, below_hdr),
        }
    }
}

/// §4.3.a: neither neighbor is free. `u` simply becomes a standalone Free
/// block.
unsafe fn release_no_neighbors(
    heap: &mut Heap,
    u: *mut Header,
    size: u32,
    below_in_region: bool,
    below: *mut Header,
) {
    unsafe {
        let above_is_free = (*u).above_is_free;
        used_list::unlink(heap, u);
        heap.stats.remove_used(size);

        let freed = Header::place_free(u.cast::<u8>(), size, above_is_free);
        SecretPtr::write_trailer(freed);
        free_list::insert_sorted(heap, freed);
        heap.stats.add_free(size);

        if below_in_region {
            (*below).above_is_free = true;
        }
    }
}

/// §4.3.b: the lower neighbor is free. `u` absorbs it, splicing into the
/// free list at the position `below` occupied.
unsafe fn release_below_free(heap: &mut Heap, u: *mut Header, size: u32, below: *mut Header) {
    unsafe {
        let above_is_free = (*u).above_is_free;
        used_list::unlink(heap, u);
        heap.stats.remove_used(size);

        let below_size = (*below).size;
        let saved_prev = (*below).prev;
        let saved_next = (*below).next;

        let merged_size = size + Header::SIZE as u32 + below_size;
        let merged = Header::place_free(u.cast::<u8>(), merged_size, above_is_free);
        SecretPtr::write_trailer(merged);

        (*merged).prev = saved_prev;
        (*merged).next = saved_next;
        if !saved_prev.is_null() {
            (*saved_prev).next = merged;
        } else {
            heap.free_head = merged;
        }
        if !saved_next.is_null() {
            (*saved_next).prev = merged;
        }
        if heap.is_top(merged) {
            heap.free_head = merged;
        }
        if heap.next_fit.is_null() || core::ptr::eq(heap.next_fit, below) {
            heap.next_fit = merged;
        }

        heap.stats.remove_free(below_size);
        heap.stats.add_free(merged_size);
    }
}

/// §4.3.c: the upper neighbor is free. `u` is absorbed into it; `u` itself
/// never becomes a live Free header.
unsafe fn release_above_free(
    heap: &mut Heap,
    u: *mut Header,
    size: u32,
    below_in_region: bool,
    below: *mut Header,
) {
    unsafe {
        let above = SecretPtr::read_for_upper_neighbor(u);
        let above_size = (*above).size;

        used_list::unlink(heap, u);
        heap.stats.remove_used(size);

        let merged_size = above_size + Header::SIZE as u32 + size;
        (*above).size = merged_size;
        SecretPtr::write_trailer(above);

        heap.stats.remove_free(above_size);
        heap.stats.add_free(merged_size);

        if below_in_region {
            (*below).above_is_free = true;
        }
    }
}

/// §4.3.d: both neighbors are free. `above` absorbs both `u` and `below` in
/// one merge; nothing lies between them in address order, so `above.next`
/// is always `below` before the splice.
unsafe fn release_both_free(heap: &mut Heap, u: *mut Header, size: u32, below: *mut Header) {
    unsafe {
        let above = SecretPtr::read_for_upper_neighbor(u);
        let above_size = (*above).size;
        let below_size = (*below).size;
        let saved_next = (*below).next;

        used_list::unlink(heap, u);
        heap.stats.remove_used(size);

        let new_size = above_size + Header::SIZE as u32 + size + Header::SIZE as u32 + below_size;
        (*above).size = new_size;
        SecretPtr::write_trailer(above);

        (*above).next = saved_next;
        if !saved_next.is_null() {
            (*saved_next).prev = above;
        }

        heap.stats.remove_free(above_size);
        heap.stats.remove_free(below_size);
        heap.stats.add_free(new_size);

        if heap.is_top(above) {
            heap.free_head = above;
        }
        heap.next_fit = above;
    }
}

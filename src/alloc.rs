//! The allocation path: next-fit search over the free list, then either a
//! perfect-fit conversion or a split.

use crate::free_list;
use crate::header::Header;
use crate::region::Heap;
use crate::secret::SecretPtr;
use crate::used_list;
use core::ptr;

/// Finds the first free header at or after `heap.next_fit` (wrapping through
/// `free_head`) whose size is at least `size`, visiting each free header at
/// most once.
///
/// # Safety
/// `heap` must be initialized.
unsafe fn find_fit(heap: &Heap, size: u32) -> *mut Header {
    let start = heap.next_fit;
    if start.is_null() {
        return ptr::null_mut();
    }

    let mut current = start;
    unsafe {
        loop {
            if (*current).size >= size {
                return current;
            }
            let next = (*current).next;
            current = if next.is_null() { heap.free_head } else { next };
            if ptr::eq(current, start) {
                return ptr::null_mut();
            }
        }
    }
}

/// Services an allocation request of `size` payload bytes, returning a
/// payload pointer on success or null if no free block is large enough.
///
/// # Safety
/// `heap` must be initialized via [`crate::region::Heap::init`].
pub(crate) unsafe fn malloc(heap: &mut Heap, size: u32) -> *mut u8 {
    unsafe {
        let chosen = find_fit(heap, size);
        if chosen.is_null() {
            log::trace!("malloc({size}): no fit found");
            return ptr::null_mut();
        }

        let chosen_size = (*chosen).size;
        let above_is_free = (*chosen).above_is_free;

        free_list::unlink(heap, chosen);
        heap.stats.remove_free(chosen_size);

        let used_addr = chosen.cast::<u8>();
        let used = Header::place_used(used_addr, size, above_is_free);
        used_list::push_front(heap, used);
        heap.stats.add_used(size);

        if chosen_size == size {
            log::trace!("malloc({size}): perfect fit at {used_addr:?}");
            return Header::payload_ptr(used);
        }

        let remainder_size = chosen_size - size - Header::SIZE as u32;
        let remainder_addr = Header::below_addr(used);
        let remainder = Header::place_free(remainder_addr, remainder_size, false);
        SecretPtr::write_trailer(remainder);

        heap.next_fit = remainder;
        free_list::insert_sorted(heap, remainder);
        heap.stats.add_free(remainder_size);

        let below = Header::below_addr(remainder);
        if heap.is_in_region(below) {
            (*below.cast::<Header>()).above_is_free = true;
        }

        log::trace!(
            "malloc({size}): split at {used_addr:?}, remainder {remainder_size} bytes"
        );
        Header::payload_ptr(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Heap;

    fn init_heap(region: &mut [u8]) -> Heap {
        let mut heap = Heap::new();
        unsafe {
            heap.init(region.as_mut_ptr() as usize, region.len()).unwrap();
        }
        heap
    }

    #[test]
    fn perfect_fit_consumes_the_only_free_block() {
        let mut region = [0u8; 256];
        let payload_size = 256 - Header::SIZE as u32;
        let mut heap = init_heap(&mut region);

        let ptr = unsafe { malloc(&mut heap, payload_size) };
        assert!(!ptr.is_null());
        let stats = heap.stats();
        assert_eq!(stats.curr_num_free_blocks, 0);
        assert_eq!(stats.curr_num_used_blocks, 1);
        assert_eq!(stats.curr_used_mem, payload_size);
    }

    #[test]
    fn split_leaves_a_remainder_free_block_of_the_expected_size() {
        let mut region = [0u8; 256];
        let mut heap = init_heap(&mut region);
        let total_free = heap.stats().curr_free_mem;

        let ptr = unsafe { malloc(&mut heap, 32) };
        assert!(!ptr.is_null());

        let stats = heap.stats();
        assert_eq!(stats.curr_num_free_blocks, 1);
        assert_eq!(stats.curr_num_used_blocks, 1);
        assert_eq!(stats.curr_used_mem, 32);
        assert_eq!(stats.curr_free_mem, total_free - 32 - Header::SIZE as u32);
    }

    #[test]
    fn split_sets_the_cursor_to_the_remainder_not_the_carved_used_block() {
        let mut region = [0u8; 256];
        let mut heap = init_heap(&mut region);

        unsafe { malloc(&mut heap, 32) };
        // The remainder is the only free block left, so the cursor can only
        // be pointing at it.
        assert_eq!(heap.next_fit, heap.free_head);
        assert_eq!(heap.stats().curr_num_free_blocks, 1);
    }

    #[test]
    fn next_fit_wraps_past_a_too_small_block_to_find_a_fit() {
        // Three free blocks in address order: small, small, big. Cursor starts
        // on the first small block; a request too big for it must skip the
        // second small block too and wrap-find the big one, without revisiting
        // the first.
        let mut a = [0u8; 64];
        let mut b = [0u8; 64];
        let mut c = [0u8; 64];
        let mut ptrs = [a.as_mut_ptr(), b.as_mut_ptr(), c.as_mut_ptr()];
        ptrs.sort_unstable();
        let [p_low, p_mid, p_high] = ptrs;

        unsafe {
            let low = Header::place_free(p_low, 8, false);
            let mid = Header::place_free(p_mid, 8, false);
            let high = Header::place_free(p_high, 40, false);

            let mut heap = Heap::new();
            free_list::insert_sorted(&mut heap, low);
            free_list::insert_sorted(&mut heap, mid);
            free_list::insert_sorted(&mut heap, high);
            heap.next_fit = low;

            assert_eq!(find_fit(&heap, 40), high);
        }
    }

    #[test]
    fn exhaustion_returns_null_once_the_region_cannot_fit_the_request() {
        let mut region = [0u8; 256];
        let mut heap = init_heap(&mut region);

        let huge = unsafe { malloc(&mut heap, 256) };
        assert!(huge.is_null());

        let exact = unsafe { malloc(&mut heap, 256 - Header::SIZE as u32) };
        assert!(!exact.is_null());

        let one_more = unsafe { malloc(&mut heap, 1) };
        assert!(one_more.is_null());
    }
}

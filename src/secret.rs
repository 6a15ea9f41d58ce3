//! The secret pointer: a back-pointer hidden in the tail of every free
//! block's payload, letting a block discover the free header of its
//! address-predecessor without a third list.
//!
//! The trailer is well-defined exactly when the block is Free; it is never
//! written into, or read from, a Used block's payload. Access is
//! encapsulated behind [`SecretPtr::write_trailer`] and
//! [`SecretPtr::read_for_upper_neighbor`] so the release path never pokes at
//! the raw bytes directly.

use crate::header::Header;
use core::mem::size_of;
use core::ptr;

/// A pointer-sized back-pointer to a free block's own header, stored in the
/// last bytes of that block's payload.
#[repr(transparent)]
pub(crate) struct SecretPtr(*mut Header);

impl SecretPtr {
    const SIZE: usize = size_of::<Self>();

    /// Writes `free`'s trailer, identifying `free` as the owner of its own
    /// payload's tail bytes.
    ///
    /// # Safety
    /// `free` must point to a live Free header whose payload is at least
    /// [`Self::SIZE`] bytes.
    pub unsafe fn write_trailer(free: *mut Header) {
        unsafe {
            let trailer_addr = trailer_addr(free);
            ptr::write(trailer_addr, SecretPtr(free));
        }
    }

    /// Reads the trailer of the free block immediately above `lower`,
    /// recovering that block's header address.
    ///
    /// # Safety
    /// The four (pointer-sized) bytes immediately preceding `lower` must
    /// hold a trailer written by [`Self::write_trailer`] — i.e. `lower`'s
    /// address-predecessor must currently be Free.
    pub unsafe fn read_for_upper_neighbor(lower: *mut Header) -> *mut Header {
        unsafe {
            let trailer_addr = lower.cast::<u8>().sub(Self::SIZE).cast::<SecretPtr>();
            (*trailer_addr).0
        }
    }
}

/// # Safety
/// `free` must point to a live Free header whose payload is at least
/// `SecretPtr::SIZE` bytes.
unsafe fn trailer_addr(free: *mut Header) -> *mut SecretPtr {
    unsafe {
        let size = (*free).size as usize;
        Header::payload_ptr(free).add(size).sub(SecretPtr::SIZE).cast::<SecretPtr>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;

    #[test]
    fn trailer_roundtrips_through_lower_neighbor() {
        let mut buf = [0u8; 128];
        let addr = buf.as_mut_ptr();
        unsafe {
            let free = Header::place_free(addr, 64, false);
            SecretPtr::write_trailer(free);

            let lower = Header::below_addr(free).cast::<Header>();
            let recovered = SecretPtr::read_for_upper_neighbor(lower);
            assert_eq!(recovered, free);
        }
    }
}

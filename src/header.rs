//! In-band block headers.
//!
//! Every block — free or used — begins with a [`Header`] of identical size
//! and layout. The two states differ only in the `kind` tag and in which
//! list the `next`/`prev` links belong to (free-list links for `Free`,
//! used-list links for `Used`). Because both states share one physical
//! shape, converting a block between them is a single in-place rewrite
//! rather than a reinterpretation across incompatible types.

use core::mem::size_of;
use core::ptr;

/// Tag distinguishing a block's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Kind {
    Free,
    Used,
}

/// Fixed-size metadata prefix shared by free and used blocks.
///
/// `next`/`prev` link the block into whichever list matches `kind`; reading
/// them against the wrong list is a logic error the header itself cannot
/// prevent.
#[repr(C)]
pub(crate) struct Header {
    pub next: *mut Header,
    pub prev: *mut Header,
    pub size: u32,
    pub kind: Kind,
    pub above_is_free: bool,
    _reserved: u16,
}

impl Header {
    pub const SIZE: usize = size_of::<Header>();

    /// Writes a Free header in place at `addr`. Does not touch the trailer;
    /// callers write it separately via [`super::secret::SecretPtr::write_trailer`].
    ///
    /// # Safety
    /// `addr` must be valid for `Self::SIZE` writable bytes and suitably
    /// aligned for `Header`.
    pub unsafe fn place_free(addr: *mut u8, size: u32, above_is_free: bool) -> *mut Header {
        let header = addr.cast::<Header>();
        unsafe {
            ptr::write(
                header,
                Header {
                    next: ptr::null_mut(),
                    prev: ptr::null_mut(),
                    size,
                    kind: Kind::Free,
                    above_is_free,
                    _reserved: 0,
                },
            );
        }
        header
    }

    /// Writes a Used header in place at `addr`.
    ///
    /// # Safety
    /// Same requirements as [`Self::place_free`].
    pub unsafe fn place_used(addr: *mut u8, size: u32, above_is_free: bool) -> *mut Header {
        let header = addr.cast::<Header>();
        unsafe {
            ptr::write(
                header,
                Header {
                    next: ptr::null_mut(),
                    prev: ptr::null_mut(),
                    size,
                    kind: Kind::Used,
                    above_is_free,
                    _reserved: 0,
                },
            );
        }
        header
    }

    /// Address of the payload, immediately following the header.
    ///
    /// # Safety
    /// `header` must point to a live, initialized `Header`.
    #[inline]
    pub unsafe fn payload_ptr(header: *mut Header) -> *mut u8 {
        unsafe { header.add(1).cast::<u8>() }
    }

    /// Recovers the header pointer from a payload pointer previously
    /// returned by [`Self::payload_ptr`].
    ///
    /// # Safety
    /// `payload` must equal a value returned by [`Self::payload_ptr`] for a
    /// still-live header.
    #[inline]
    pub unsafe fn header_of(payload: *mut u8) -> *mut Header {
        unsafe { payload.cast::<Header>().sub(1) }
    }

    /// Address one past this block's payload, i.e. the start of the next
    /// block in address order ("the block below").
    ///
    /// # Safety
    /// `header` must point to a live, initialized `Header`.
    #[inline]
    pub unsafe fn below_addr(header: *mut Header) -> *mut u8 {
        unsafe {
            let size = (*header).size as usize;
            header.cast::<u8>().add(Self::SIZE).add(size)
        }
    }
}

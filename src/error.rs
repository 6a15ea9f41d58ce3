//! Error types for the allocator's narrow set of fallible operations.
//!
//! `malloc` itself never errors in the Rust sense — out-of-memory is
//! reported through a null return, matching the source system's contract —
//! so the only checked failure is setting up the region in the first place.

/// Failure to bring a heap up over a caller-provided region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    /// The region is too small to hold even a single header.
    #[error("region of {len} bytes is too small to hold a header ({header} bytes required)")]
    RegionTooSmall {
        /// Length of the region that was offered.
        len: usize,
        /// Size of a single header, in bytes.
        header: usize,
    },
}

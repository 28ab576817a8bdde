//! A fixed-capacity bit allocator written in pure Rust.  
//! `no_std` with `alloc`, no `unsafe`.
//!
//! Tracks which of a fixed number of units are in use and hands out the
//! lowest free one. The units are whatever the caller says they are: page
//! frames, block numbers, inode numbers, slots in a table.
//!
//! [`BitAllocator`] is the main struct in this library. Its
//! [features](#features) are listed below.
//!
//! # Examples
//! ```
//! use bit_alloc::BitAllocator;
//!
//! let mut frames = BitAllocator::new(10)?;
//! assert_eq!(frames.free_count(), 10);
//! frames.mark(0);
//! assert_eq!(frames.mark_next(), Some(1));
//! assert!(frames.is_marked(1));
//! assert_eq!(frames.free_count(), 8);
//! # Ok::<(), bit_alloc::BitAllocError>(())
//! ```
//!
//! # Use Cases
//!
//! - Physical page frame allocators
//! - Block and inode bitmaps
//! - Id and handle pools
//! - Not meant for runs of contiguous bits or for sharing between threads
//!   without an outer lock
//!
//! # Features
//!
//! - `#![no_std]` compatible, needs `alloc`
//! - Capacity chosen at runtime, fixed afterwards
//! - Lowest-free-bit search that skips full 64-bit words
//! - O(1) free count
//! - Raw byte access for copying the map in and out: `as_raw`,
//!   `as_raw_mut`, `from_raw`, `recount`
//! - Iteration over used bits: `iter_marked`
//! - Diagnostics through the [`log`](https://docs.rs/log) facade

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod allocator;
mod error;

pub use allocator::{BitAllocator, IterMarked, WORD_BITS, byte_count};
pub use error::BitAllocError;

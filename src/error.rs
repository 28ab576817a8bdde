use core::fmt::{Display, Formatter};

/// Errors returned when building a [`BitAllocator`](crate::BitAllocator).
///
/// Running out of free bits is not an error; [`mark_next`] reports it by
/// returning `None`.
///
/// [`mark_next`]: crate::BitAllocator::mark_next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitAllocError {
    /// The backing buffer could not be reserved.
    OutOfMemory {
        /// Size of the requested buffer.
        bytes: usize,
    },
    /// A raw map did not have the length required by the capacity.
    LengthMismatch {
        /// Bytes needed for the requested capacity.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
}

impl Display for BitAllocError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfMemory { bytes } => {
                write!(f, "failed to reserve {bytes} bytes for the bit map")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "raw bit map is {actual} bytes long, expected {expected}")
            }
        }
    }
}

impl core::error::Error for BitAllocError {}

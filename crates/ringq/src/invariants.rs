//! Debug assertion macros for the cursor protocols.
//!
//! Active only in debug builds (`debug_assertions`), so release builds pay
//! nothing. A failed assertion here means a broken protocol, not a full or
//! empty queue.

/// Assert that the number of live elements never exceeds the usable
/// capacity (`write - read <= N - 1`).
macro_rules! debug_assert_bounded {
    ($count:expr, $usable:expr) => {
        debug_assert!(
            $count <= $usable,
            "cursor protocol violated: {} live elements exceed usable capacity {}",
            $count,
            $usable
        )
    };
}

/// Assert the cursor ordering `read <= committed <= write`.
///
/// The single-producer backend passes its write cursor for both `committed`
/// and `write`, collapsing the three-cursor relation to two.
macro_rules! debug_assert_cursor_order {
    ($read:expr, $committed:expr, $write:expr) => {
        debug_assert!(
            $read <= $committed && $committed <= $write,
            "cursor protocol violated: read {} / committed {} / write {} out of order",
            $read,
            $committed,
            $write
        )
    };
}

/// Assert that a cursor only moves forward.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "cursor protocol violated: {} moved backwards from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

pub(crate) use debug_assert_bounded;
pub(crate) use debug_assert_cursor_order;
pub(crate) use debug_assert_monotonic;

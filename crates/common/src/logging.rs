//! Logging helpers shared by the library modules.
//!
//! The library only talks to the [`log`] facade; hosts decide where records
//! go (see the `bebop-sim` binary for a `fern` based setup).

/// Emits an advisory warning.
///
/// Advisory warnings describe configuration that works but is probably not
/// what the page intended. They are compiled out of release builds.
macro_rules! advisory {
    ($($arg:tt)+) => {
        if cfg!(debug_assertions) {
            log::warn!($($arg)+);
        }
    };
}

pub(crate) use advisory;

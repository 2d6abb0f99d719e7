//! Precondition checks.
//!
//! A failed [`engine_assert!`] is logged at error level. Debug builds then
//! panic; release builds carry on and the call site degrades to a no-op.

/// Checks an engine precondition and evaluates to whether it held.
///
/// ```ignore
/// if !engine_assert!(self.scene.is_some(), "submit called outside a scene") {
///     return;
/// }
/// ```
#[macro_export]
macro_rules! engine_assert {
    ($cond:expr, $($arg:tt)+) => {{
        let ok: bool = $cond;
        if !ok {
            $crate::core::assert_failed(stringify!($cond), format_args!($($arg)+));
        }
        ok
    }};
}

#[doc(hidden)]
#[track_caller]
pub fn assert_failed(cond: &str, message: std::fmt::Arguments<'_>) {
    let location = std::panic::Location::caller();
    log::error!("assertion `{cond}` failed at {location}: {message}");
    if cfg!(debug_assertions) {
        panic!("assertion `{cond}` failed: {message}");
    }
}

//! Diagnostic macros.

/// Internal: log through the `log` facade when the feature is enabled.
macro_rules! mw_log {
    ($level:ident, $($arg:tt)+) => {{
        #[cfg(feature = "log")]
        {
            log::$level!($($arg)+);
        }
        #[cfg(not(feature = "log"))]
        {
            let _ = format_args!($($arg)+);
        }
    }};
}

pub(crate) use mw_log;

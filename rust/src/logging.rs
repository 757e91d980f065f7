//! Logging macros with verbosity level control.
//!
//! Every option object carries its own `verbosity`; nothing here reads global
//! state. Output goes to stderr and costs nothing when verbosity is 0.
//! - 0: SILENT
//! - 1: WARNINGS (excluded articles, ignored progress, clamped inputs)
//! - 2: CHANGES (phase placement, buffers, bottlenecks, leveling moves)
//! - 3: DEBUG (forward/backward pass internals)

/// Verbosity level constants.
pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_WARNINGS: u8 = 1;
pub const VERBOSITY_CHANGES: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at WARNINGS level (verbosity >= 1).
///
/// Used for: locally recovered input problems.
#[macro_export]
macro_rules! log_warn {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_WARNINGS {
            eprintln!("[buildplan] warning: {}", format_args!($($arg)*));
        }
    };
}

/// Log at CHANGES level (verbosity >= 2).
///
/// Used for: dates assigned to phases, buffers inserted, bottlenecks found.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels_are_ordered() {
        assert!(VERBOSITY_SILENT < VERBOSITY_WARNINGS);
        assert!(VERBOSITY_WARNINGS < VERBOSITY_CHANGES);
        assert!(VERBOSITY_CHANGES < VERBOSITY_DEBUG);
    }

    #[test]
    fn test_log_macros_compile() {
        // Silent verbosity must not panic or print
        let verbosity = VERBOSITY_SILENT;
        log_warn!(verbosity, "article {} excluded", "01.02");
        log_changes!(verbosity, "phase {} placed", 2);
        log_debug!(verbosity, "ES={}", 3);
    }
}

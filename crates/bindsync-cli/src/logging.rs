// Logging and verbosity control

use std::sync::atomic::{AtomicU8, Ordering};

use tracing::Level;

/// Global verbosity level
static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Verbosity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    /// Quiet mode - errors only
    Quiet = 0,
    /// Normal mode - standard output
    Normal = 1,
    /// Verbose mode - detailed output
    Verbose = 2,
}

impl VerbosityLevel {
    /// Get the current verbosity level
    pub fn current() -> Self {
        match VERBOSITY.load(Ordering::Relaxed) {
            0 => VerbosityLevel::Quiet,
            1 => VerbosityLevel::Normal,
            _ => VerbosityLevel::Verbose,
        }
    }

    /// Set the verbosity level
    pub fn set(level: Self) {
        VERBOSITY.store(level as u8, Ordering::Relaxed);
    }

    /// Check if we should output at this level
    pub fn should_output(&self) -> bool {
        self <= &Self::current()
    }
}

/// Tracing level from flags, falling back to the configured `log_level`
pub fn resolve_level(verbose: bool, quiet: bool, configured: Option<&str>) -> Level {
    if quiet {
        return Level::ERROR;
    }
    if verbose {
        return Level::DEBUG;
    }
    configured
        .and_then(|level| level.trim().parse::<Level>().ok())
        .unwrap_or(Level::WARN)
}

/// Initialize logging based on CLI flags and configuration
pub fn init_logging(verbose: bool, quiet: bool, configured: Option<&str>) {
    let verbosity = if quiet {
        VerbosityLevel::Quiet
    } else if verbose {
        VerbosityLevel::Verbose
    } else {
        VerbosityLevel::Normal
    };
    VerbosityLevel::set(verbosity);

    // Ignored when a subscriber is already installed (tests)
    let _ = tracing_subscriber::fmt()
        .with_max_level(resolve_level(verbose, quiet, configured))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

//! Output formatting module

pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
    /// Whether to suppress non-error output.
    pub quiet: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();

        let mut styles = Styles::default();
        if use_colors(no_color, is_tty) {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    /// Print the app URL on its own line. Never suppressed, so
    /// `--quiet` output is just the URL.
    pub fn url(&self, url: &str) {
        println!("{}", url.style(self.styles.bold));
    }
}

/// Whether a stream should carry ANSI styling.
///
/// Colors need a terminal on the other end and no opt-out from `--no-color`
/// or a non-empty `NO_COLOR`.
#[must_use]
pub fn use_colors(no_color: bool, is_tty: bool) -> bool {
    let env_opt_out = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    !no_color && is_tty && !env_opt_out
}

/// ANSI styling for the stderr log stream.
#[must_use]
pub fn log_ansi(no_color: bool) -> bool {
    use_colors(no_color, Term::stderr().is_term())
}

//! Cross-platform helpers and console output.
//!
//! - [`console`] - the [`ConsoleSink`](console::ConsoleSink) seam for
//!   everything shown to the operator
//! - [`platform`] - shell selection and `PATH` handling for script execution

pub mod console;
pub mod platform;

pub use console::{ConsoleSink, TerminalSink};
pub use platform::{get_shell_command, is_windows, prepend_to_path};

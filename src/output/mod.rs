//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress bars and spinners
//! - Statistics reporting

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{
    print_authorization_url, print_banner, print_config_summary, print_error, print_info,
    print_success, print_warning,
};
pub use progress::{create_download_bar, create_spinner};
pub use stats::{format_bytes, print_relay_stats};

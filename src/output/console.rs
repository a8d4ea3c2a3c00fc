//! Console output utilities.

use console::style;

use crate::config::Config;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Twitter Media Backup                              ║
║     Relays new tweet media to your destinations       ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Ask the operator to open the consent page.
pub fn print_authorization_url(url: &str) {
    println!();
    println!(
        "{}",
        style("Google Photos needs your permission. Open this URL in a browser:").bold()
    );
    println!("  {}", style(url).underlined());
    println!();
}

/// Print configuration summary.
pub fn print_config_summary(config: &Config) {
    let account = config
        .twitter
        .screen_name
        .as_deref()
        .unwrap_or("(authenticated account)");
    let since = config
        .poller
        .since_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "latest tweet".to_string());

    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Account:  {}", account);
    println!("  Since:    {}", since);
    println!("  Interval: {}s", config.poller.interval_seconds);
    if config.local.enabled {
        println!("  Local:    {}", config.local.root_path.display());
    }
    if config.gphotos.enabled {
        println!("  Album:    {}", config.gphotos.album);
    }
    println!();
}

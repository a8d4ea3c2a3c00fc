//! Statistics reporting.

use console::style;

use crate::relay::RelayStats;

/// Print what a relay session delivered.
pub fn print_relay_stats(stats: &RelayStats) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Session Statistics:").bold());
    println!("  Photos:   {}", stats.photos);
    println!("  Videos:   {}", stats.videos);
    if stats.animated_gifs > 0 {
        println!("  GIFs:     {}", stats.animated_gifs);
    }
    println!("  Data:     {}", format_bytes(stats.bytes));
    for (destination, count) in &stats.exported {
        println!("  {:<9} {} exported", format!("{}:", destination), count);
    }
    println!("  Cursor:   {}", stats.cursor);
    println!("  Uptime:   {}s", stats.elapsed().as_secs());
    println!("{}", style("═".repeat(50)).dim());
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(20 * 1024 * 1024), "20.0 MiB");
    }
}

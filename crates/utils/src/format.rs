//! Human readable sizes and transfer rates for log lines and CLI output

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count using base-1024 units, e.g. `1.5 KB` or `5 MB`
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    // Two decimals, trailing zeros trimmed
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Format a transfer rate from a byte count and an elapsed time in milliseconds
pub fn format_speed(bytes: u64, elapsed_ms: u64) -> String {
    if elapsed_ms == 0 {
        return "-- B/s".to_string();
    }

    let per_second = (bytes as f64 / elapsed_ms as f64) * 1000.0;
    if per_second < 1024.0 {
        format!("{per_second:.0} B/s")
    } else if per_second < 1024.0 * 1024.0 {
        format!("{:.1} KB/s", per_second / 1024.0)
    } else {
        format!("{:.1} MB/s", per_second / (1024.0 * 1024.0))
    }
}

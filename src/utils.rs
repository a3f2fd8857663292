use chrono::{Datelike, Local, NaiveDateTime};

/// Format a byte count for status lines: "512 B", "1.5K", "3.2G"
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1}T", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1}G", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1}M", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1}K", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a timestamp the way `ls -l` does: time of day within the current
/// year, the year otherwise. Missing timestamps render as blanks.
pub fn format_date(time: Option<NaiveDateTime>) -> String {
    format_date_in(time, Local::now().year())
}

fn format_date_in(time: Option<NaiveDateTime>, current_year: i32) -> String {
    let Some(time) = time else {
        return " ".repeat(12);
    };

    if time.year() == current_year {
        time.format("%b %e %H:%M").to_string()
    } else {
        format!("{}  {}", time.format("%b %e"), time.year())
    }
}

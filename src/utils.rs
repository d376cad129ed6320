use chrono::Local;

/// Rounds to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// File name stamped with the local time, e.g. `data_20250101_120000.csv`
pub fn timestamped_filename(prefix: &str, extension: &str) -> String {
    format!("{}_{}.{}", prefix, Local::now().format("%Y%m%d_%H%M%S"), extension)
}

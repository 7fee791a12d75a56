//! Bitrate formatting

/// Format a bitrate in bits per second as a human readable string.
///
/// Values above 1 000 are shown in whole `kbps`, values above 1 000 000 in
/// whole `mbps`; everything else keeps the raw `bps` figure.
pub fn format_bitrate(bitrate: u64) -> String {
    if bitrate > 1_000_000 {
        format!("{}mbps", bitrate / 1_000_000)
    } else if bitrate > 1_000 {
        format!("{}kbps", bitrate / 1_000)
    } else {
        format!("{}bps", bitrate)
    }
}

/// Short label carried in `QualityLevel::bitrate_str`, e.g. `"1171k"` for 1.2 Mbit/s.
pub fn short_label(bitrate: u64) -> String {
    format!("{}k", bitrate / 1024)
}

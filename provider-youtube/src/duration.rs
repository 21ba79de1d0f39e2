//! ISO-8601 duration parsing for the provider's `contentDetails.duration`.

/// Parse a `PT#H#M#S` duration into whole seconds.
///
/// Malformed input yields `0` rather than an error — upstream data is noisy
/// and a zero-length video is dropped by the pipeline's duration window
/// anyway.
pub fn parse_iso8601_duration(raw: &str) -> u64 {
    let rest = match raw.strip_prefix("PT") {
        Some(rest) if !rest.is_empty() => rest,
        _ => return 0,
    };

    let mut total: u64 = 0;
    let mut number = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            number.push(ch);
            continue;
        }
        let Ok(value) = number.parse::<u64>() else {
            return 0;
        };
        number.clear();
        let multiplier = match ch {
            'H' => 3_600,
            'M' => 60,
            'S' => 1,
            _ => return 0,
        };
        total += value * multiplier;
    }
    if !number.is_empty() {
        // Trailing digits without a unit designator.
        return 0;
    }
    total
}

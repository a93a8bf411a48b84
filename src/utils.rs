use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// 最大公约数
pub fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// 最小公倍数，任一参数为 0 时结果为 0；溢出时返回 `None`
pub fn lcm(a: usize, b: usize) -> Option<usize> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// Rounds a sampling-interval ratio to the nearest integer divisor
///
/// Returns `None` for non-finite ratios and for ratios that round to zero.
pub fn ratio_to_divisor(ratio: f64) -> Option<usize> {
    if !ratio.is_finite() {
        return None;
    }
    let rounded = ratio.round();
    if rounded < 1.0 || rounded > u32::MAX as f64 {
        return None;
    }
    Some(rounded as usize)
}

/// One line of the imported annotation listing
pub fn format_annotation(position: usize, sample_rate: f64, description: &str) -> String {
    format!("{:.6} s:\t{}\n", position as f64 / sample_rate, description)
}

pub fn format_date(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

pub fn format_time(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%H:%M:%S").to_string()
}

/// Parses `YYYY-MM-DD` and `HH:MM:SS` into a timestamp
///
/// An empty time string means midnight.
pub fn parse_start(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = time.trim();
    let time = if time.is_empty() {
        NaiveTime::from_hms_opt(0, 0, 0)?
    } else {
        NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?
    };
    Some(date.and_time(time))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lcm() {
        assert_eq!(lcm(1, 3), Some(3));
        assert_eq!(lcm(4, 6), Some(12));
        assert_eq!(lcm(5, 5), Some(5));
        assert_eq!(lcm(0, 7), Some(0));
        assert_eq!(lcm(usize::MAX, usize::MAX - 1), None);
        assert_eq!(gcd(12, 18), 6);
    }

    #[test]
    fn test_ratio_to_divisor() {
        assert_eq!(ratio_to_divisor(1.0), Some(1));
        assert_eq!(ratio_to_divisor(2.9999999), Some(3));
        assert_eq!(ratio_to_divisor(0.4), None);
        assert_eq!(ratio_to_divisor(f64::INFINITY), None);
        assert_eq!(ratio_to_divisor(f64::NAN), None);
    }

    #[test]
    fn test_format_annotation() {
        assert_eq!(format_annotation(200, 1000.0, "stim"), "0.200000 s:\tstim\n");
        assert_eq!(format_annotation(15, 10.0, "wash-in"), "1.500000 s:\twash-in\n");
    }

    #[test]
    fn test_parse_start() {
        let start = parse_start("2013-04-09", "14:05:59").unwrap();
        assert_eq!(format_date(&start), "2013-04-09");
        assert_eq!(format_time(&start), "14:05:59");

        let midnight = parse_start("2013-04-09", "").unwrap();
        assert_eq!(format_time(&midnight), "00:00:00");

        assert!(parse_start("09.04.13", "14:05:59").is_none());
        assert!(parse_start("2013-04-09", "late").is_none());
    }
}

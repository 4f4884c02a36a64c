use chrono::{Datelike, NaiveDate};

const SEQUENCE_WIDTH: usize = 4;

/// `PAY-202610-` for payments issued in October 2026.
pub fn month_prefix(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{:04}{:02}-", prefix, date.year(), date.month())
}

/// Postgres regex matching only the numbers of that month whose suffix is
/// all digits (at most 18, so it fits a bigint). Hand-entered numbers such as `INV-202610-0001-R` are skipped.
pub fn suffix_pattern(prefix: &str, date: NaiveDate) -> String {
    let mut pattern = String::from("^");
    for c in month_prefix(prefix, date).chars() {
        if !c.is_ascii_alphanumeric() && c != '-' {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push_str("[0-9]{1,18}$");
    pattern
}

/// Next number in the month of `date`, one past `highest`, the largest
/// numeric suffix already issued that month.
pub fn next_number(prefix: &str, date: NaiveDate, highest: Option<i64>) -> String {
    let next = highest.unwrap_or(0).max(0) + 1;
    format!("{}{:0width$}", month_prefix(prefix, date), next, width = SEQUENCE_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oct() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn first_number_of_the_month() {
        assert_eq!(next_number("PAY", oct(), None), "PAY-202610-0001");
    }

    #[test]
    fn increments_highest_suffix() {
        assert_eq!(next_number("INV", oct(), Some(41)), "INV-202610-0042");
    }

    #[test]
    fn sequence_widens_past_four_digits() {
        assert_eq!(next_number("PAY", oct(), Some(9999)), "PAY-202610-10000");
    }

    #[test]
    fn suffix_pattern_only_matches_numeric_suffixes() {
        assert_eq!(suffix_pattern("INV", oct()), "^INV-202610-[0-9]{1,18}$");
    }

    #[test]
    fn suffix_pattern_escapes_regex_metacharacters() {
        assert_eq!(suffix_pattern("A.B", oct()), "^A\\.B-202610-[0-9]{1,18}$");
        assert_eq!(suffix_pattern("X+", oct()), "^X\\+-202610-[0-9]{1,18}$");
    }
}

/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use chrono::format::Numeric::*;
use chrono::format::{Fixed, Item, Pad, Parsed, parse};
use chrono::{DateTime, ParseResult, Utc};

/// `YYYYMMDDHHMMSS[.sss]`, as used by MDTM replies and MLSD time facts.
const RFC3659: &[Item<'static>] = &[
    Item::Numeric(Year, Pad::Zero),
    Item::Numeric(Month, Pad::Zero),
    Item::Numeric(Day, Pad::Zero),
    Item::Numeric(Hour, Pad::Zero),
    Item::Numeric(Minute, Pad::Zero),
    Item::Numeric(Second, Pad::Zero),
    Item::Fixed(Fixed::Nanosecond),
];

#[inline]
pub fn parse_from_str(s: &str) -> ParseResult<DateTime<Utc>> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, s, RFC3659.iter())?;
    parsed.to_datetime_with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_no_dot() {
        let dt = parse_from_str("20230101120000").unwrap();
        let expected = DateTime::parse_from_rfc3339("2023-01-01T12:00:00+00:00").unwrap();
        assert_eq!(dt, expected.with_timezone(&Utc));
    }

    #[test]
    fn parse_dot_3() {
        let dt = parse_from_str("20211201102030.123").unwrap();
        let expected = DateTime::parse_from_rfc3339("2021-12-01T10:20:30.123+00:00").unwrap();
        assert_eq!(dt, expected.with_timezone(&Utc));
    }

    #[test]
    fn parse_invalid() {
        assert!(parse_from_str("2021-12-01").is_err());
        assert!(parse_from_str("").is_err());
    }
}

//! Conversions between machine values and the strings the CRM renders

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};

/// Date format used by every date picker in the CRM
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Date-time format used by the callback picker
pub const DATE_TIME_FORMAT: &str = "%d/%m/%Y %I:%M %p";

/// Round a currency value to pence, half away from zero
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render an amount the way the CRM does: `£ 1,234.50`.
///
/// The space after the pound sign is part of the UI's rendering and must be
/// reproduced exactly.
pub fn format_currency_gbp(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = format!("{:.2}", rounded.abs());
    let (whole, pence) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}£ {grouped}.{pence}")
}

/// Replace every `/` with `-`.
///
/// Some CRM views print dates with hyphens; apply this only where the
/// surface being asserted does.
pub fn slash_to_hyphen(date: &str) -> String {
    date.replace('/', "-")
}

pub fn format_date_ddmmyyyy(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `DD/MM/YYYY hh:mm AM/PM`, 12-hour clock
pub fn format_date_time(at: NaiveDateTime) -> String {
    at.format(DATE_TIME_FORMAT).to_string()
}

/// Value typed into an amount input
pub fn amount_input(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

/// Extract the start and end dates from a subscription period text such as
/// `Subscription: 01/01/1999 - 01/01/2000`.
///
/// Both slash and hyphen separated dates are accepted; anything other than
/// exactly two dates is an error.
pub fn parse_subscription_period(text: &str) -> Result<(NaiveDate, NaiveDate)> {
    let pattern = Regex::new(r"\b(\d{2})[/-](\d{2})[/-](\d{4})\b")
        .map_err(|e| Error::SubscriptionFormat(e.to_string()))?;

    let dates = pattern
        .captures_iter(text)
        .map(|caps| {
            let day = caps[1].parse::<u32>().unwrap_or(0);
            let month = caps[2].parse::<u32>().unwrap_or(0);
            let year = caps[3].parse::<i32>().unwrap_or(0);
            NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| Error::SubscriptionFormat(text.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    match dates.as_slice() {
        [start, end] => Ok((*start, *end)),
        _ => Err(Error::SubscriptionFormat(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use test_case::test_case;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test_case("0", "£ 0.00")]
    #[test_case("1234.5", "£ 1,234.50")]
    #[test_case("999.999", "£ 1,000.00")]
    #[test_case("83333.33", "£ 83,333.33")]
    #[test_case("1000000", "£ 1,000,000.00")]
    #[test_case("0.005", "£ 0.01")]
    #[test_case("-12.5", "-£ 12.50")]
    fn test_format_currency_gbp(input: &str, expected: &str) {
        assert_eq!(format_currency_gbp(dec(input)), expected);
    }

    #[test]
    fn test_slash_to_hyphen_is_stable() {
        let once = slash_to_hyphen("05/11/2026");
        assert_eq!(once, "05-11-2026");
        assert_eq!(slash_to_hyphen(&once), once);
    }

    #[test]
    fn test_format_date_zero_pads() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_date_ddmmyyyy(date), "07/03/2026");
    }

    #[test]
    fn test_format_date_time_twelve_hour_clock() {
        let at = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(0, 5, 0)
            .unwrap();
        assert_eq!(format_date_time(at), "19/10/2026 12:05 AM");

        let at = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();
        assert_eq!(format_date_time(at), "19/10/2026 01:45 PM");
    }

    #[test]
    fn test_parse_subscription_period() {
        let (start, end) = parse_subscription_period("Subscription: 01/01/1999 - 01-01-2000").unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(1999, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_subscription_period_rejects_other_shapes() {
        assert!(matches!(
            parse_subscription_period("Subscription: 01/01/1999"),
            Err(Error::SubscriptionFormat(_))
        ));
        assert!(parse_subscription_period("no dates here").is_err());
        assert!(parse_subscription_period("31/02/2020 - 01/03/2020").is_err());
    }

    #[test]
    fn test_amount_input_has_two_decimals() {
        assert_eq!(amount_input(dec("12.5")), "12.50");
    }
}

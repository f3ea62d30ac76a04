//! Human-facing order numbers.

use std::fmt;

use crate::error::OrderError;

/// Constant prefix of every order number.
pub const ORDER_NUMBER_PREFIX: &str = "PED";

/// Minimum digits of the numeric suffix; longer suffixes are written in full.
pub const ORDER_NUMBER_WIDTH: usize = 6;

/// An order number such as `PED-000042`.
///
/// Numbers compare by their numeric suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderNumber(u64);

impl OrderNumber {
    /// The number given to the very first order.
    pub fn first() -> Self {
        Self(1)
    }

    pub fn suffix(&self) -> u64 {
        self.0
    }

    /// Parses a stored order number.
    ///
    /// Anything other than the exact form [`Display`](fmt::Display) produces
    /// (`PED-` plus a positive suffix padded to six digits, with no extra
    /// leading zeros) means the orders table holds data we didn't write, so it
    /// is reported as `Fatal`. Non-canonical padding would break the
    /// length-then-lexical ordering the stores use to find the greatest number.
    pub fn parse(value: &str) -> Result<Self, OrderError> {
        let corrupt = || OrderError::fatal(format!("malformed order number {value:?}"));

        let digits = value
            .strip_prefix(ORDER_NUMBER_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or_else(corrupt)?;

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(corrupt());
        }

        let number = match digits.parse::<u64>() {
            Ok(0) | Err(_) => return Err(corrupt()),
            Ok(suffix) => Self(suffix),
        };

        if number.to_string() != value {
            return Err(corrupt());
        }
        Ok(number)
    }

    /// The number that follows this one.
    pub fn next(&self) -> Result<Self, OrderError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or_else(|| OrderError::fatal("order number sequence exhausted"))
    }

    /// Next number given the greatest one issued so far, if any.
    pub fn next_after(last: Option<&str>) -> Result<Self, OrderError> {
        match last {
            None => Ok(Self::first()),
            Some(last) => Self::parse(last)?.next(),
        }
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:0width$}",
            ORDER_NUMBER_PREFIX,
            self.0,
            width = ORDER_NUMBER_WIDTH
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_number_is_padded() {
        assert_eq!(OrderNumber::first().to_string(), "PED-000001");
        assert_eq!(OrderNumber::next_after(None).unwrap(), OrderNumber::first());
    }

    #[test]
    fn increments_from_last_issued() {
        let next = OrderNumber::next_after(Some("PED-000041")).unwrap();
        assert_eq!(next.to_string(), "PED-000042");
        assert_eq!(next.suffix(), 42);
    }

    #[test]
    fn grows_past_the_padding_width() {
        let next = OrderNumber::next_after(Some("PED-999999")).unwrap();
        assert_eq!(next.to_string(), "PED-1000000");
        assert!(next > OrderNumber::parse("PED-999999").unwrap());
    }

    #[test]
    fn parse_round_trips_display() {
        let number = OrderNumber::parse("PED-000123").unwrap();
        assert_eq!(number.to_string(), "PED-000123");
    }

    #[test]
    fn malformed_numbers_are_fatal() {
        for bad in [
            "",
            "PED",
            "PED-",
            "PED-abc",
            "PED-+12",
            "PED-000000",
            "ORD-000001",
            "PED000001",
            "PED-12 ",
            "PED-12",
            "PED-0000005",
            "PED-01000000",
        ] {
            let result = OrderNumber::parse(bad);
            assert!(
                matches!(result, Err(OrderError::Fatal { .. })),
                "{bad:?} should be fatal"
            );
        }
    }

    #[test]
    fn long_suffixes_parse_without_padding() {
        let number = OrderNumber::parse("PED-1000000").unwrap();
        assert_eq!(number.suffix(), 1_000_000);
    }

    #[test]
    fn suffix_overflow_is_fatal() {
        let last = format!("PED-{}", u64::MAX);
        assert!(matches!(
            OrderNumber::next_after(Some(&last)),
            Err(OrderError::Fatal { .. })
        ));
    }
}

//! SQL rendering for the two supported warehouse dialects.
//!
//! Every statement the pipeline sends is rendered here at call time from typed inputs:
//! - [`tables`]: column descriptors for the seven tables and their DROP/CREATE DDL.
//! - [`copy`]: the Redshift `COPY ... JSON` bulk-load statement.
//! - [`insert`]: the five INSERT...SELECT statements building the star schema.
//!
//! Values spliced into statement text go through [`Dialect::quote_literal`].

pub mod copy;
pub mod insert;
pub mod tables;

use std::fmt;

use thiserror::Error;

/// SQL flavour statements are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Amazon Redshift, reached over the Postgres wire protocol.
    Redshift,
    /// Local SQLite database used for development and tests.
    Sqlite,
}

/// Calendar part extracted into `dimtime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    /// Hour of day, 0-23.
    Hour,
    /// Day of month, 1-31.
    Day,
    /// Week of year; numbering is dialect specific, see [`Dialect::date_part`].
    Week,
    /// Month, 1-12.
    Month,
    /// Four digit year.
    Year,
    /// Day of week, 0 = Sunday.
    Weekday,
}

/// A value that cannot be embedded in a string literal for the target dialect.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{reason} in SQL literal {value:?}")]
pub struct LiteralError {
    /// The offending value.
    pub value: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

impl Dialect {
    /// Render `value` as a single-quoted string literal.
    ///
    /// Quotes are doubled in both dialects. NUL is rejected everywhere. Redshift literals
    /// additionally reject backslashes and control characters: whether a backslash escapes
    /// depends on session settings there, and storage URIs and role ARNs never need one.
    pub fn quote_literal(self, value: &str) -> Result<String, LiteralError> {
        let reject = |reason| {
            Err(LiteralError {
                value: value.to_string(),
                reason,
            })
        };
        if value.contains('\0') {
            return reject("NUL character");
        }
        if self == Dialect::Redshift {
            if value.contains('\\') {
                return reject("backslash");
            }
            if value.chars().any(char::is_control) {
                return reject("control character");
            }
        }

        let mut out = String::with_capacity(value.len() + 2);
        out.push('\'');
        for c in value.chars() {
            if c == '\'' {
                out.push('\'');
            }
            out.push(c);
        }
        out.push('\'');
        Ok(out)
    }

    /// Expression converting an epoch-millisecond column into a timestamp.
    ///
    /// The division is integer division in both engines, so sub-second precision is
    /// truncated: `ts = 0` and `ts = 999` both map to `1970-01-01 00:00:00`.
    pub fn epoch_millis_to_timestamp(self, column: &str) -> String {
        match self {
            Dialect::Redshift => {
                format!("'1970-01-01'::date + {column} / 1000 * interval '1 second'")
            }
            Dialect::Sqlite => format!("datetime({column} / 1000, 'unixepoch')"),
        }
    }

    /// Expression extracting `part` from a timestamp expression.
    ///
    /// Week and weekday conventions are pinned per engine:
    /// - Redshift `week` is the ISO-8601 week (1-53), `weekday` is 0 = Sunday .. 6 = Saturday.
    /// - SQLite `week` is `%W` (00-53, weeks start on Monday, days before the first Monday
    ///   of the year are week 0), `weekday` is `%w` (0 = Sunday).
    pub fn date_part(self, part: DatePart, expr: &str) -> String {
        match self {
            Dialect::Redshift => {
                let name = match part {
                    DatePart::Hour => "hour",
                    DatePart::Day => "day",
                    DatePart::Week => "week",
                    DatePart::Month => "month",
                    DatePart::Year => "year",
                    DatePart::Weekday => "weekday",
                };
                format!("EXTRACT({name} FROM {expr})")
            }
            Dialect::Sqlite => {
                let format = match part {
                    DatePart::Hour => "%H",
                    DatePart::Day => "%d",
                    DatePart::Week => "%W",
                    DatePart::Month => "%m",
                    DatePart::Year => "%Y",
                    DatePart::Weekday => "%w",
                };
                format!("CAST(strftime('{format}', {expr}) AS INTEGER)")
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dialect::Redshift => "redshift",
            Dialect::Sqlite => "sqlite",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unquote(lit: &str) -> String {
        lit[1..lit.len() - 1].replace("''", "'")
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(
            Dialect::Redshift.quote_literal("s3://bucket/o'neil").unwrap(),
            "'s3://bucket/o''neil'"
        );
    }

    #[test]
    fn redshift_rejects_backslash_and_control() {
        let err = Dialect::Redshift.quote_literal(r"arn:aws\x").unwrap_err();
        assert_eq!(err.reason, "backslash");
        let err = Dialect::Redshift.quote_literal("arn\nx").unwrap_err();
        assert_eq!(err.reason, "control character");
    }

    #[test]
    fn sqlite_keeps_backslash_and_newline() {
        assert_eq!(
            Dialect::Sqlite.quote_literal("a\\b\nc").unwrap(),
            "'a\\b\nc'"
        );
        assert!(Dialect::Sqlite.quote_literal("a\0b").is_err());
    }

    #[test]
    fn date_parts_render_per_dialect() {
        assert_eq!(
            Dialect::Redshift.date_part(DatePart::Weekday, "start_time"),
            "EXTRACT(weekday FROM start_time)"
        );
        assert_eq!(
            Dialect::Sqlite.date_part(DatePart::Week, "start_time"),
            "CAST(strftime('%W', start_time) AS INTEGER)"
        );
    }

    proptest! {
        #[test]
        fn sqlite_literal_round_trips(s in "[^\\x00]*") {
            let lit = Dialect::Sqlite.quote_literal(&s).unwrap();
            prop_assert!(lit.starts_with('\'') && lit.ends_with('\''));
            prop_assert_eq!(unquote(&lit), s);
        }

        #[test]
        fn redshift_literal_has_no_lone_quote(s in "[ -\\[\\]-~]*") {
            let lit = Dialect::Redshift.quote_literal(&s).unwrap();
            let inner = &lit[1..lit.len() - 1];
            prop_assert_eq!(inner.matches('\'').count() % 2, 0);
            prop_assert!(!inner.replace("''", "").contains('\''));
        }
    }
}

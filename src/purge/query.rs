//! Batch-delete query documents.
//!
//! The store's filter language matches statements by actor account name
//! against an alias set, bounded by a timestamp window. Queries are built
//! fresh per deletion request from explicit fields; there is no shared
//! template.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timestamp format the store's filter language expects: seconds
/// precision, no timezone suffix.
const STORE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Formats tried after RFC 3339, in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// A request's start or end date could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unparseable date {value:?}")]
pub struct DateParseError {
    pub value: String,
}

/// Alias set matched against the statement actor's account name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameSet {
    #[serde(rename = "$in")]
    pub any_of: Vec<String>,
}

/// Filter on the statement actor's account name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorAccountFilter {
    #[serde(rename = "statement.actor.account.name")]
    pub account_name: NameSet,
}

/// A store timestamp literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTimestamp {
    #[serde(rename = "$dte")]
    pub value: String,
}

/// Timestamp window: inclusive lower bound, exclusive-style upper bound,
/// per the store's filter semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampWindow {
    #[serde(rename = "$gt")]
    pub after: StoreTimestamp,
    #[serde(rename = "$lt")]
    pub before: StoreTimestamp,
}

/// One batch-delete filter document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementFilter {
    pub filter: ActorAccountFilter,
    pub timestamp: TimestampWindow,
}

/// The outbound batch-delete query: a single-element list of filter
/// documents. The wire body is the bare inner object — the outer list is
/// stripped before sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchDeleteQuery {
    filters: Vec<StatementFilter>,
}

impl BatchDeleteQuery {
    /// Build the query for one deletion request.
    ///
    /// Fails with [`DateParseError`] when either date cannot be parsed.
    pub fn build(
        identities: Vec<String>,
        start: &str,
        end: &str,
    ) -> Result<Self, DateParseError> {
        let after = format_store_timestamp(parse_permissive(start)?);
        let before = format_store_timestamp(parse_permissive(end)?);

        Ok(Self {
            filters: vec![StatementFilter {
                filter: ActorAccountFilter {
                    account_name: NameSet { any_of: identities },
                },
                timestamp: TimestampWindow {
                    after: StoreTimestamp { value: after },
                    before: StoreTimestamp { value: before },
                },
            }],
        })
    }

    /// The bare filter object sent as the request body.
    pub fn wire_body(&self) -> &StatementFilter {
        // Built with exactly one element.
        &self.filters[0]
    }
}

/// Parse a calendar timestamp in any of the accepted formats.
///
/// Timezone offsets are dropped, not converted: the clock time is kept
/// exactly as written. The store format has no timezone suffix, so the
/// conversion is lossy on purpose.
fn parse_permissive(value: &str) -> Result<NaiveDateTime, DateParseError> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }

    Err(DateParseError {
        value: value.to_string(),
    })
}

fn format_store_timestamp(dt: NaiveDateTime) -> String {
    dt.format(STORE_TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn aliases() -> Vec<String> {
        vec!["S1".to_string(), "V1".to_string(), "H1".to_string()]
    }

    #[test]
    fn test_wire_shape() {
        let query = BatchDeleteQuery::build(aliases(), "2020-01-01", "2020-01-02").unwrap();

        let body = serde_json::to_value(query.wire_body()).unwrap();
        assert_eq!(
            body,
            json!({
                "filter": {
                    "statement.actor.account.name": { "$in": ["S1", "V1", "H1"] }
                },
                "timestamp": {
                    "$gt": { "$dte": "2020-01-01T00:00:00" },
                    "$lt": { "$dte": "2020-01-02T00:00:00" }
                }
            })
        );

        // The full query serializes as a one-element list; only the wire
        // body is a bare object.
        let listed = serde_json::to_value(&query).unwrap();
        assert_eq!(listed, json!([body]));
    }

    #[test]
    fn test_build_is_idempotent() {
        let a = BatchDeleteQuery::build(aliases(), "2020-06-01 12:30:45", "2020-06-02").unwrap();
        let b = BatchDeleteQuery::build(aliases(), "2020-06-01 12:30:45", "2020-06-02").unwrap();

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_round_trip() {
        let query = BatchDeleteQuery::build(aliases(), "2020-01-01", "2020-01-02").unwrap();

        let serialized = serde_json::to_string(&query).unwrap();
        let parsed: BatchDeleteQuery = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, query);
    }

    #[test]
    fn test_timezone_offset_is_dropped_not_converted() {
        let query = BatchDeleteQuery::build(
            aliases(),
            "2020-01-01T10:30:00+05:00",
            "2020-01-02T23:59:59Z",
        )
        .unwrap();

        let body = serde_json::to_value(query.wire_body()).unwrap();
        // Clock time kept as written; the +05:00 offset is not applied.
        assert_eq!(body["timestamp"]["$gt"]["$dte"], "2020-01-01T10:30:00");
        assert_eq!(body["timestamp"]["$lt"]["$dte"], "2020-01-02T23:59:59");
    }

    #[test]
    fn test_accepted_date_formats() {
        for input in [
            "2020-03-04",
            "04/03/2020",
            "2020-03-04 15:00:00",
            "2020-03-04T15:00:00",
            "2020-03-04T15:00:00.123",
            "2020-03-04T15:00:00+0000",
            " 2020-03-04 ",
        ] {
            assert!(parse_permissive(input).is_ok(), "rejected {input:?}");
        }

        assert_eq!(
            format_store_timestamp(parse_permissive("04/03/2020").unwrap()),
            "2020-03-04T00:00:00"
        );
    }

    #[test]
    fn test_unparseable_date() {
        let err = BatchDeleteQuery::build(aliases(), "not a date", "2020-01-02").unwrap_err();
        assert_eq!(err.value, "not a date");

        assert!(parse_permissive("").is_err());
        assert!(parse_permissive("2020-13-40").is_err());
    }
}

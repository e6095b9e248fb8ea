//! Field Schema Registry
//!
//! Static per-service mapping between human field names and the streamer's
//! numeric wire indices.
//!
//! The streamer never sends field names. A subscription lists the wanted
//! fields as an index CSV (`"0,1,4"`) and every record in a data frame is
//! keyed by those same indices:
//!
//! ```json
//! {"1": 318.01, "2": 318.15, "7": 1594425540000, "seq": 707, "key": "SPY"}
//! ```
//!
//! Each [`Service`] carries its own table, so identical indices in unrelated
//! services never collide. `key` and `seq` are schema-independent and pass
//! through decoding untouched.

mod tables;

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while translating between field names and wire indices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The field name is not part of the service's schema.
    #[error("unknown field '{field}' for service {service}")]
    UnknownField {
        /// Wire name of the service.
        service: &'static str,
        /// Offending field name.
        field: String,
    },

    /// No schema is registered for the service.
    #[error("no field schema registered for service '{0}'")]
    UnknownService(String),
}

// =============================================================================
// Records
// =============================================================================

/// A content record: wire index (or pass-through name) to value.
pub type Record = Map<String, Value>;

/// Returns true if `key` looks like a wire index (`"0"`, `"17"`, ...).
#[must_use]
pub fn is_wire_index(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// Field Schema
// =============================================================================

/// One entry in a field table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    /// Wire index as sent by the streamer.
    pub index: &'static str,
    /// Application-facing field name.
    pub name: &'static str,
}

impl Field {
    /// Create a table entry.
    #[must_use]
    pub const fn new(index: &'static str, name: &'static str) -> Self {
        Self { index, name }
    }
}

/// Ordered name ↔ index bijection for one record layout.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    service: Service,
    fields: &'static [Field],
}

impl FieldSchema {
    /// The service this schema belongs to.
    #[must_use]
    pub const fn service(&self) -> Service {
        self.service
    }

    /// All fields in wire-index order.
    #[must_use]
    pub const fn fields(&self) -> &'static [Field] {
        self.fields
    }

    /// Look up the wire index for a field name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<&'static str> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.index)
    }

    /// Look up the field name for a wire index.
    #[must_use]
    pub fn name_of(&self, index: &str) -> Option<&'static str> {
        self.fields.iter().find(|f| f.index == index).map(|f| f.name)
    }

    /// Default subscription field set: every field, in table order.
    #[must_use]
    pub fn default_indices(&self) -> String {
        self.fields
            .iter()
            .map(|f| f.index)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Translate field names into a comma-joined index list.
    ///
    /// The caller's order is kept as given. `None` or an empty slice selects
    /// the default field set.
    pub fn indices_for(&self, field_names: Option<&[&str]>) -> Result<String, SchemaError> {
        let names = match field_names {
            Some(names) if !names.is_empty() => names,
            _ => return Ok(self.default_indices()),
        };

        let indices = names
            .iter()
            .map(|name| {
                self.index_of(name).ok_or_else(|| SchemaError::UnknownField {
                    service: self.service.as_str(),
                    field: (*name).to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(indices.join(","))
    }

    /// Replace wire indices in a record with field names.
    ///
    /// Pass-through and other non-numeric keys are kept as-is. Indices the
    /// table does not know are dropped.
    #[must_use]
    pub fn names_for(&self, record: Record) -> Record {
        let mut decoded = Record::with_capacity(record.len());

        for (key, value) in record {
            if !is_wire_index(&key) {
                decoded.insert(key, value);
                continue;
            }

            match self.name_of(&key) {
                Some(name) => {
                    decoded.insert(name.to_string(), value);
                }
                None => {
                    tracing::trace!(
                        service = self.service.as_str(),
                        index = %key,
                        "Dropping unknown field index"
                    );
                }
            }
        }

        decoded
    }
}

// =============================================================================
// Services
// =============================================================================

/// Streamer data services with a registered field schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Account activity (order fills, cancels, ...).
    AcctActivity,
    /// Equity minute charts.
    ChartEquity,
    /// Futures minute charts.
    ChartFutures,
    /// Option minute charts (futures chart layout).
    ChartOptions,
    /// News headlines.
    NewsHeadline,
    /// Equity time & sales.
    TimesaleEquity,
    /// Futures time & sales.
    TimesaleFutures,
    /// Options time & sales.
    TimesaleOptions,
    /// Forex time & sales.
    TimesaleForex,
    /// Level-one equity quotes.
    Quote,
    /// Level-one futures quotes.
    LevelOneFutures,
    /// Level-one forex quotes.
    LevelOneForex,
}

impl Service {
    /// Every service with a registered schema.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::AcctActivity,
            Self::ChartEquity,
            Self::ChartFutures,
            Self::ChartOptions,
            Self::NewsHeadline,
            Self::TimesaleEquity,
            Self::TimesaleFutures,
            Self::TimesaleOptions,
            Self::TimesaleForex,
            Self::Quote,
            Self::LevelOneFutures,
            Self::LevelOneForex,
        ]
    }

    /// Wire name of the service.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AcctActivity => "ACCT_ACTIVITY",
            Self::ChartEquity => "CHART_EQUITY",
            Self::ChartFutures => "CHART_FUTURES",
            Self::ChartOptions => "CHART_OPTIONS",
            Self::NewsHeadline => "NEWS_HEADLINE",
            Self::TimesaleEquity => "TIMESALE_EQUITY",
            Self::TimesaleFutures => "TIMESALE_FUTURES",
            Self::TimesaleOptions => "TIMESALE_OPTIONS",
            Self::TimesaleForex => "TIMESALE_FOREX",
            Self::Quote => "QUOTE",
            Self::LevelOneFutures => "LEVELONE_FUTURES",
            Self::LevelOneForex => "LEVELONE_FOREX",
        }
    }

    /// Field schema for this service.
    #[must_use]
    pub const fn schema(self) -> FieldSchema {
        let fields = match self {
            Self::AcctActivity => tables::ACCT_ACTIVITY,
            Self::ChartEquity => tables::CHART_EQUITY,
            Self::ChartFutures | Self::ChartOptions => tables::CHART_FUTURES,
            Self::NewsHeadline => tables::NEWS_HEADLINE,
            Self::TimesaleEquity
            | Self::TimesaleFutures
            | Self::TimesaleOptions
            | Self::TimesaleForex => tables::TIMESALE,
            Self::Quote => tables::QUOTE,
            Self::LevelOneFutures => tables::LEVELONE_FUTURES,
            Self::LevelOneForex => tables::LEVELONE_FOREX,
        };

        FieldSchema {
            service: self,
            fields,
        }
    }

    /// Event category that decoded frames of this service are emitted under.
    #[must_use]
    pub const fn category(self) -> EventCategory {
        match self {
            Self::AcctActivity => EventCategory::AccountActivity,
            Self::ChartEquity | Self::ChartFutures | Self::ChartOptions => EventCategory::Chart,
            Self::NewsHeadline => EventCategory::NewsHeadline,
            Self::TimesaleEquity
            | Self::TimesaleFutures
            | Self::TimesaleOptions
            | Self::TimesaleForex => EventCategory::Timesale,
            Self::Quote => EventCategory::Quote,
            Self::LevelOneFutures => EventCategory::LevelOneFutures,
            Self::LevelOneForex => EventCategory::LevelOneForex,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownService(s.to_string()))
    }
}

/// Semantic grouping of services for event delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// `account_activity`
    AccountActivity,
    /// `chart`
    Chart,
    /// `news_headline`
    NewsHeadline,
    /// `timesale`
    Timesale,
    /// `quote`
    Quote,
    /// `levelone_futures`
    LevelOneFutures,
    /// `levelone_forex`
    LevelOneForex,
}

impl EventCategory {
    /// Event name used when emitting decoded frames.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccountActivity => "account_activity",
            Self::Chart => "chart",
            Self::NewsHeadline => "news_headline",
            Self::Timesale => "timesale",
            Self::Quote => "quote",
            Self::LevelOneFutures => "levelone_futures",
            Self::LevelOneForex => "levelone_forex",
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Stateless lookup over every registered [`FieldSchema`], keyed by wire
/// service name.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldSchemaRegistry;

impl FieldSchemaRegistry {
    /// Create a registry.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolve a wire service name to its schema.
    pub fn schema(&self, service: &str) -> Result<FieldSchema, SchemaError> {
        service.parse::<Service>().map(Service::schema)
    }

    /// Comma-joined wire indices for `field_names`, in the caller's order.
    pub fn indices_for(
        &self,
        service: &str,
        field_names: Option<&[&str]>,
    ) -> Result<String, SchemaError> {
        self.schema(service)?.indices_for(field_names)
    }

    /// Record with wire indices replaced by field names.
    pub fn names_for(&self, service: &str, record: Record) -> Result<Record, SchemaError> {
        Ok(self.schema(service)?.names_for(record))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn every_schema_is_a_bijection() {
        for service in Service::all() {
            let schema = service.schema();
            let names: HashSet<_> = schema.fields().iter().map(|f| f.name).collect();
            let indices: HashSet<_> = schema.fields().iter().map(|f| f.index).collect();
            assert_eq!(names.len(), schema.fields().len(), "{service} names");
            assert_eq!(indices.len(), schema.fields().len(), "{service} indices");
            assert!(schema.fields().iter().all(|f| is_wire_index(f.index)));
        }
    }

    #[test]
    fn service_round_trips_through_wire_name() {
        for service in Service::all() {
            assert_eq!(service.as_str().parse::<Service>().unwrap(), *service);
        }
    }

    #[test]
    fn unknown_service_is_rejected() {
        let registry = FieldSchemaRegistry::new();
        let err = registry.indices_for("LEVELTWO_BOOK", None).unwrap_err();
        assert_eq!(err, SchemaError::UnknownService("LEVELTWO_BOOK".to_string()));
    }

    #[test_case("ACCT_ACTIVITY", "0,1,2,3")]
    #[test_case("CHART_EQUITY", "0,1,2,3,4,5,6,7")]
    #[test_case("CHART_FUTURES", "0,1,2,3,4,5,6")]
    #[test_case("CHART_OPTIONS", "0,1,2,3,4,5,6")]
    #[test_case("NEWS_HEADLINE", "0,1,2,3,4,5,6,7,8,9,10")]
    #[test_case("TIMESALE_EQUITY", "0,1,2,3,4")]
    #[test_case("TIMESALE_FOREX", "0,1,2,3,4")]
    fn default_field_sets(service: &str, expected: &str) {
        let registry = FieldSchemaRegistry::new();
        assert_eq!(registry.indices_for(service, None).unwrap(), expected);
        assert_eq!(registry.indices_for(service, Some(&[][..])).unwrap(), expected);
    }

    #[test_case("ACCT_ACTIVITY", &["accountNumber", "messageData", "subscriptionKey"], "1,3,0")]
    #[test_case("CHART_EQUITY", &["key", "openPrice", "closePrice"], "0,1,4")]
    #[test_case("CHART_FUTURES", &["key", "openPrice", "closePrice"], "0,2,5")]
    #[test_case("NEWS_HEADLINE", &["symbol", "headline"], "0,5")]
    #[test_case("TIMESALE_OPTIONS", &["symbol", "lastPrice"], "0,2")]
    #[test_case("QUOTE", &["mark", "symbol", "bidPrice"], "49,0,1")]
    fn indices_keep_caller_order(service: &str, fields: &[&str], expected: &str) {
        let registry = FieldSchemaRegistry::new();
        assert_eq!(registry.indices_for(service, Some(fields)).unwrap(), expected);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Service::ChartEquity
            .schema()
            .indices_for(Some(&["openPrice", "bidPrice"][..]))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownField {
                service: "CHART_EQUITY",
                field: "bidPrice".to_string(),
            }
        );
    }

    #[test]
    fn decodes_chart_equity_record() {
        let raw = record(json!({
            "1": 318.01, "2": 318.15, "3": 318.01, "4": 318.1,
            "5": 4460, "7": 1_594_425_540_000_i64, "8": 18453,
            "seq": 707, "key": "SPY"
        }));

        let decoded = Service::ChartEquity.schema().names_for(raw);

        assert_eq!(
            Value::Object(decoded),
            json!({
                "key": "SPY",
                "seq": 707,
                "chartTime": 1_594_425_540_000_i64,
                "openPrice": 318.01,
                "highPrice": 318.15,
                "lowPrice": 318.01,
                "closePrice": 318.1,
                "volume": 4460
            })
        );
    }

    #[test]
    fn decoding_keeps_non_numeric_extras_and_order() {
        let raw = record(json!({"key": "/ES", "delayed": false, "2": 3178.25, "99": 1, "seq": 3}));

        let decoded = Service::ChartFutures.schema().names_for(raw);
        let keys: Vec<_> = decoded.keys().cloned().collect();

        assert_eq!(keys, vec!["key", "delayed", "openPrice", "seq"]);
    }

    #[test]
    fn default_field_set_round_trips_for_every_service() {
        for service in Service::all() {
            let schema = service.schema();
            let csv = schema.indices_for(None).unwrap();
            let raw: Record = csv
                .split(',')
                .map(|index| (index.to_string(), Value::from(index)))
                .collect();

            let decoded = schema.names_for(raw);
            let expected: HashSet<_> = schema.fields().iter().map(|f| f.name).collect();
            let actual: HashSet<_> = decoded.keys().map(String::as_str).collect();
            assert_eq!(actual, expected, "{service}");
        }
    }

    #[test]
    fn category_names() {
        assert_eq!(Service::ChartOptions.category().as_str(), "chart");
        assert_eq!(Service::TimesaleForex.category().as_str(), "timesale");
        assert_eq!(Service::NewsHeadline.category().as_str(), "news_headline");
        assert_eq!(
            Service::AcctActivity.category().as_str(),
            "account_activity"
        );
    }

    proptest! {
        #[test]
        fn requested_order_is_preserved(picks in proptest::collection::vec(0usize..53, 1..20)) {
            let schema = Service::Quote.schema();
            let names: Vec<&str> = picks.iter().map(|&i| schema.fields()[i].name).collect();
            let expected: Vec<&str> = picks.iter().map(|&i| schema.fields()[i].index).collect();

            let csv = schema.indices_for(Some(names.as_slice())).unwrap();

            prop_assert_eq!(csv, expected.join(","));
        }

        #[test]
        fn requested_names_round_trip(picks in proptest::collection::vec(0usize..11, 1..11)) {
            let schema = Service::NewsHeadline.schema();
            let names: Vec<&str> = picks.iter().map(|&i| schema.fields()[i].name).collect();

            let csv = schema.indices_for(Some(names.as_slice())).unwrap();
            let raw: Record = csv.split(',').map(|i| (i.to_string(), Value::Null)).collect();
            let decoded = schema.names_for(raw);

            let expected: HashSet<&str> = names.iter().copied().collect();
            let actual: HashSet<&str> = decoded.keys().map(String::as_str).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}

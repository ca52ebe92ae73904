//! Typed front-matter values.
//!
//! Collection-specific front-matter fields are kept in a typed
//! [`FieldValue`] map instead of an untyped property bag, so that the
//! query stage can decide up front whether a field is orderable.
//!
//! # Ordering
//!
//! | Left      | Right     | Comparison              |
//! |-----------|-----------|-------------------------|
//! | `Text`    | `Text`    | lexicographic           |
//! | `Integer` | `Float`   | numeric (both ways)     |
//! | `Bool`    | `Bool`    | `false < true`          |
//! | `Date`    | `Date`    | underlying instant      |
//! | `List`    | anything  | not orderable           |
//! | `Map`     | anything  | not orderable           |

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{cmp::Ordering, collections::BTreeMap, fmt};

/// A single typed front-matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Timestamp with its original offset; compared by instant.
    Date(DateTime<FixedOffset>),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
}

/// Coarse kind of a [`FieldValue`], used in query diagnostics.
///
/// Integers and floats share the `Number` kind because they compare
/// with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Number,
    Bool,
    Date,
    List,
    Map,
}

impl ValueKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::List => "list",
            Self::Map => "map",
        }
    }

    /// Whether values of this kind can be totally ordered among themselves.
    pub const fn is_orderable(self) -> bool {
        !matches!(self, Self::List | Self::Map)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FieldValue {
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Integer(_) | Self::Float(_) => ValueKind::Number,
            Self::Bool(_) => ValueKind::Bool,
            Self::Date(_) => ValueKind::Date,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    /// True for a float that cannot take part in a total order.
    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Float(f) if f.is_nan())
    }

    /// Compare two values of compatible kinds.
    ///
    /// Returns `None` when the pair has no total order (different kinds,
    /// lists, maps, or NaN).
    pub fn try_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Integer(b)) => Some(a.cmp(b)),
            (Self::Integer(a), Self::Float(b)) => cmp_int_float(*a, *b),
            (Self::Float(a), Self::Integer(b)) => cmp_int_float(*b, *a).map(Ordering::reverse),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Loose equality used by query filters.
    ///
    /// - numbers compare numerically, dates by instant
    /// - a text literal matches a date when it parses to the same instant
    /// - a list matches a scalar literal when any element matches
    pub fn matches(&self, literal: &Self) -> bool {
        match (self, literal) {
            (Self::Date(d), Self::Text(s)) => parse_date(s).is_some_and(|lit| lit == *d),
            (Self::List(items), lit) if !matches!(lit, Self::List(_)) => {
                items.iter().any(|item| item.matches(lit))
            }
            (a, b) => a.try_cmp(b) == Some(Ordering::Equal) || a == b,
        }
    }

    /// Convert into a JSON value for template contexts.
    ///
    /// Dates become RFC 3339 strings; non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Integer(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::Bool(b) => Value::Bool(*b),
            Self::Date(d) => Value::String(d.to_rfc3339()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Exact comparison of an integer with a float, `None` for NaN.
///
/// Casting the integer to `f64` loses precision above 2^53 and breaks
/// transitivity, so the float is split into integral and fractional parts.
#[allow(clippy::cast_possible_truncation)]
fn cmp_int_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63, the first float above i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return None;
    }
    if float >= LIMIT {
        return Some(Ordering::Less);
    }
    if float < -LIMIT {
        return Some(Ordering::Greater);
    }

    let whole = float.trunc();
    let ord = int.cmp(&(whole as i64)).then_with(|| {
        // int equals the integral part; the fraction decides.
        0.0_f64.partial_cmp(&(float - whole)).unwrap_or(Ordering::Equal)
    });
    Some(ord)
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::Date(value)
    }
}

// ============================================================================
// Date parsing
// ============================================================================

/// Parse a front-matter timestamp.
///
/// Accepted forms:
/// - `YYYY-MM-DD` (midnight UTC)
/// - `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`, optionally with
///   fractional seconds (UTC)
/// - RFC 3339 (`2020-01-03T10:00:00+02:00`)
pub fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    let utc = FixedOffset::east_opt(0)?;
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(utc.from_utc_datetime(&naive));
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?).fixed_offset())
}

// ============================================================================
// Serde
// ============================================================================

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Date(d) => serializer.serialize_str(&d.to_rfc3339()),
            Self::List(items) => serializer.collect_seq(items),
            Self::Map(map) => serializer.collect_map(map),
        }
    }
}

/// Literals in configuration files deserialize without date detection:
/// a quoted date stays `Text` and is matched against dates by [`FieldValue::matches`].
impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, boolean, list or table")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FieldValue, E> {
        Ok(FieldValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldValue, E> {
        Ok(FieldValue::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldValue, E> {
        i64::try_from(v)
            .map(FieldValue::Integer)
            .map_err(|_| E::custom(format!("integer {v} is out of range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FieldValue, E> {
        Ok(FieldValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FieldValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(FieldValue::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldValue, A::Error> {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = access.next_entry::<String, FieldValue>()? {
            map.insert(key, value);
        }
        Ok(FieldValue::Map(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> FieldValue {
        FieldValue::Date(parse_date(s).unwrap())
    }

    #[test]
    fn test_parse_date_forms() {
        let day = parse_date("2020-01-03").unwrap();
        assert_eq!(day.to_rfc3339(), "2020-01-03T00:00:00+00:00");

        let spaced = parse_date("2020-01-03 10:30:00").unwrap();
        assert_eq!(spaced.to_rfc3339(), "2020-01-03T10:30:00+00:00");

        let offset = parse_date("2020-01-03T10:30:00+02:00").unwrap();
        assert_eq!(offset.to_rfc3339(), "2020-01-03T10:30:00+02:00");

        let fraction = parse_date("2020-01-02 10:00:00.123").unwrap();
        assert_eq!(fraction.to_rfc3339(), "2020-01-02T10:00:00.123+00:00");
        assert_eq!(
            parse_date("2020-01-02T10:00:00.5"),
            parse_date("2020-01-02T10:00:00.5Z")
        );

        assert!(parse_date("January 3rd").is_none());
        assert!(parse_date("2020-13-01").is_none());
    }

    #[test]
    fn test_dates_compare_by_instant() {
        let utc = date("2020-01-03T08:00:00Z");
        let shifted = date("2020-01-03T10:00:00+02:00");
        assert_eq!(utc.try_cmp(&shifted), Some(Ordering::Equal));
        assert_eq!(
            date("2020-01-01").try_cmp(&date("2020-01-02")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_numbers_compare_across_representations() {
        let int = FieldValue::Integer(2);
        let float = FieldValue::Float(2.5);
        assert_eq!(int.try_cmp(&float), Some(Ordering::Less));
        assert_eq!(float.try_cmp(&int), Some(Ordering::Greater));
        assert_eq!(int.kind(), float.kind());
    }

    #[test]
    fn test_large_integers_compare_exactly_with_floats() {
        let two_53 = 1_i64 << 53;
        let float = FieldValue::Float(two_53 as f64);
        let above = FieldValue::Integer(two_53 + 1);

        assert_eq!(FieldValue::Integer(two_53).try_cmp(&float), Some(Ordering::Equal));
        assert_eq!(above.try_cmp(&float), Some(Ordering::Greater));
        assert_eq!(float.try_cmp(&above), Some(Ordering::Less));

        let neg = FieldValue::Float(-2.5);
        assert_eq!(FieldValue::Integer(-2).try_cmp(&neg), Some(Ordering::Greater));
        assert_eq!(FieldValue::Integer(-3).try_cmp(&neg), Some(Ordering::Less));

        let huge = FieldValue::Float(1e19);
        assert_eq!(FieldValue::Integer(i64::MAX).try_cmp(&huge), Some(Ordering::Less));
        assert_eq!(
            FieldValue::Integer(i64::MIN).try_cmp(&FieldValue::Float(f64::NEG_INFINITY)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            FieldValue::Integer(i64::MIN).try_cmp(&FieldValue::Float(i64::MIN as f64)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_incompatible_kinds_have_no_order() {
        let text = FieldValue::from("2020-01-01");
        assert_eq!(text.try_cmp(&date("2020-01-01")), None);
        assert_eq!(FieldValue::Float(f64::NAN).try_cmp(&FieldValue::Float(1.0)), None);
        let list = FieldValue::List(vec![]);
        assert_eq!(list.try_cmp(&list), None);
        assert!(!ValueKind::List.is_orderable());
    }

    #[test]
    fn test_matches_literals() {
        assert!(date("2020-01-03").matches(&FieldValue::from("2020-01-03")));
        assert!(FieldValue::Integer(1).matches(&FieldValue::Float(1.0)));

        let tags = FieldValue::List(vec!["rust".into(), "web".into()]);
        assert!(tags.matches(&"web".into()));
        assert!(!tags.matches(&"go".into()));
        assert!(tags.matches(&FieldValue::List(vec!["rust".into(), "web".into()])));
    }

    #[test]
    fn test_to_json() {
        let mut map = BTreeMap::new();
        map.insert("n".to_string(), FieldValue::Integer(3));
        map.insert("when".to_string(), date("2020-01-03"));
        let json = FieldValue::Map(map).to_json();
        assert_eq!(json["n"], 3);
        assert_eq!(json["when"], "2020-01-03T00:00:00+00:00");
        assert_eq!(FieldValue::Float(f64::INFINITY).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_deserialize_from_json() {
        let value: FieldValue =
            serde_json::from_str(r#"{"draft": true, "tags": ["a", 1], "weight": 1.5}"#).unwrap();
        let FieldValue::Map(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(map["draft"], FieldValue::Bool(true));
        assert_eq!(
            map["tags"],
            FieldValue::List(vec!["a".into(), FieldValue::Integer(1)])
        );
        assert_eq!(map["weight"], FieldValue::Float(1.5));
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Value coercion: turns source-side values into store-native [`Value`]s.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use smol_str::SmolStr;

use crate::model::{Identifier, PropertyType, SourceValue, Value};
use crate::store::StoreError;

/// Lexical timestamp layouts accepted for `date` properties, tried in order after RFC 3339.
///
/// The second layout covers offsets written without a colon (`+0200`).
const TIMESTAMP_LAYOUTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

pub fn coerce(value: SourceValue) -> Value {
    match value {
        SourceValue::Integer(v) => Value::Long(v),
        SourceValue::DateTime(v) => Value::Date(v),
        SourceValue::Float(v) => Value::Double(v),
        SourceValue::Boolean(v) => Value::Boolean(v),
        SourceValue::Binary(v) => Value::Binary(v),
        SourceValue::Text(v) => Value::String(v),
    }
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, StoreError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed);
    }
    TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| DateTime::parse_from_str(trimmed, layout).ok())
        .ok_or_else(|| StoreError::ValueFormat {
            value: raw.to_owned(),
            expected: PropertyType::Date,
        })
}

/// Milliseconds since the Unix epoch, in UTC.
pub fn date_from_millis(millis: i64) -> Option<DateTime<FixedOffset>> {
    Utc.timestamp_millis_opt(millis).single().map(|utc| utc.fixed_offset())
}

/// Converts a lexical value into a store value of type `ty`.
///
/// Reference values are resolved by the importer, not here; a `reference` lexical value is
/// only accepted when it already is a durable identity.
pub fn parse_lexical(raw: &str, ty: PropertyType) -> Result<Value, StoreError> {
    let format_error = || StoreError::ValueFormat { value: raw.to_owned(), expected: ty };
    let value = match ty {
        PropertyType::Undefined | PropertyType::String => Value::String(raw.to_owned()),
        PropertyType::Binary => Value::Binary(raw.as_bytes().to_vec()),
        PropertyType::Long => Value::Long(raw.trim().parse().map_err(|_| format_error())?),
        PropertyType::Double => Value::Double(raw.trim().parse().map_err(|_| format_error())?),
        PropertyType::Decimal => {
            let trimmed = raw.trim();
            trimmed.parse::<f64>().map_err(|_| format_error())?;
            Value::Decimal(trimmed.to_owned())
        }
        PropertyType::Date => Value::Date(parse_timestamp(raw)?),
        PropertyType::Boolean => Value::Boolean(raw.trim().eq_ignore_ascii_case("true")),
        PropertyType::Name => {
            if raw.is_empty() || raw.contains('/') {
                return Err(format_error());
            }
            Value::Name(SmolStr::new(raw))
        }
        PropertyType::Path => Value::Path(raw.to_owned()),
        PropertyType::Reference => {
            Value::Reference(Identifier::new(raw).map_err(|_| format_error())?)
        }
        PropertyType::Uri => Value::Uri(raw.to_owned()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use rstest::rstest;

    use super::{coerce, date_from_millis, parse_lexical, parse_timestamp};
    use crate::model::{PropertyType, SourceValue, Value};
    use crate::store::StoreError;

    #[test]
    fn coerce_maps_every_source_kind() {
        assert_eq!(coerce(SourceValue::Integer(7)), Value::Long(7));
        assert_eq!(coerce(SourceValue::Float(1.5)), Value::Double(1.5));
        assert_eq!(coerce(SourceValue::Boolean(true)), Value::Boolean(true));
        assert_eq!(coerce(SourceValue::Binary(vec![1, 2])), Value::Binary(vec![1, 2]));
        assert_eq!(coerce(SourceValue::Text("x".into())), Value::String("x".into()));

        let date = parse_timestamp("2024-03-01T10:00:00.000+01:00").expect("date");
        assert_eq!(coerce(SourceValue::DateTime(date)), Value::Date(date));
    }

    #[rstest]
    #[case("2024-03-01T10:15:30.000+01:00")]
    #[case("2024-03-01T10:15:30+01:00")]
    #[case("2024-03-01T10:15:30.000+0100")]
    fn parses_timestamp_layouts(#[case] raw: &str) {
        let parsed = parse_timestamp(raw).expect("timestamp");
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.minute(), 15);
        assert_eq!(parsed.offset().local_minus_utc(), 3600);
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let err = parse_timestamp("yesterday").unwrap_err();
        assert!(matches!(err, StoreError::ValueFormat { expected: PropertyType::Date, .. }));
    }

    #[rstest]
    #[case("42", PropertyType::Long, Value::Long(42))]
    #[case("2.5", PropertyType::Double, Value::Double(2.5))]
    #[case("TRUE", PropertyType::Boolean, Value::Boolean(true))]
    #[case("nope", PropertyType::Boolean, Value::Boolean(false))]
    #[case("plain", PropertyType::Undefined, Value::String("plain".into()))]
    #[case("10.25", PropertyType::Decimal, Value::Decimal("10.25".into()))]
    fn parses_lexical_values(#[case] raw: &str, #[case] ty: PropertyType, #[case] expected: Value) {
        assert_eq!(parse_lexical(raw, ty).expect("parse"), expected);
    }

    #[test]
    fn lexical_long_rejects_text() {
        let err = parse_lexical("abc", PropertyType::Long).unwrap_err();
        assert_eq!(
            err,
            StoreError::ValueFormat { value: "abc".into(), expected: PropertyType::Long }
        );
    }

    #[test]
    fn millis_convert_to_utc_dates() {
        let date = date_from_millis(0).expect("epoch");
        assert_eq!(date.timestamp_millis(), 0);
        assert_eq!(date.offset().local_minus_utc(), 0);
    }
}

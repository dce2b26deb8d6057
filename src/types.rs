//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::result::Result;
use std::sync::OnceLock;

pub use filemaker_rust_sdk_derive::*;

use crate::error::FMError;
use crate::record::Record;

/// The field data of a single record: a map of field name to [`FieldValue`].
pub type FieldData = BTreeMap<String, FieldValue>;

/// A single field value as stored by the FileMaker host.
///
/// The Data API only distinguishes between text and numbers in `fieldData`;
/// dates, times and timestamps arrive as text and are parsed on demand (see
/// [`Record::time()`]). Array or object values (which the host does not normally
/// send in `fieldData`) are kept as their JSON text.
///
/// `FieldValue` instances are created from native Rust values through the
/// [`ToFieldValue`] trait, and converted back through [`FromFieldValue`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    #[default]
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns `true` for `Null` and for empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Number(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        if let FieldValue::Text(s) = self {
            return Some(s);
        }
        None
    }

    pub fn as_number(&self) -> Option<f64> {
        if let FieldValue::Number(n) = self {
            return Some(*n);
        }
        None
    }

    pub(crate) fn from_json(v: &serde_json::Value) -> FieldValue {
        match v {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Text(n.to_string()),
            },
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{}", s),
            // f64 Display is already the shortest round-trip form ("5", "2.5")
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Null => Ok(()),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    return serializer.serialize_i64(*n as i64);
                }
                serializer.serialize_f64(*n)
            }
            FieldValue::Null => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let v = serde_json::Value::deserialize(deserializer)?;
        Ok(FieldValue::from_json(&v))
    }
}

/// Conversion of native Rust values into a [`FieldValue`].
///
/// All integer widths, floats and `bool` become [`FieldValue::Number`]
/// (`true` is 1, `false` is 0). Strings become [`FieldValue::Text`], and
/// `None` becomes [`FieldValue::Null`].
pub trait ToFieldValue {
    fn to_field_value(&self) -> FieldValue;
}

impl ToFieldValue for FieldValue {
    fn to_field_value(&self) -> FieldValue {
        self.clone()
    }
}

macro_rules! tfv_number {
    ($($t:ty),*) => {
        $(
            impl ToFieldValue for $t {
                fn to_field_value(&self) -> FieldValue {
                    FieldValue::Number(*self as f64)
                }
            }
        )*
    };
}

tfv_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl ToFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        if *self {
            return FieldValue::Number(1.0);
        }
        FieldValue::Number(0.0)
    }
}
impl ToFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }
}
impl ToFieldValue for &str {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Text(self.to_string())
    }
}
impl<T: ToFieldValue> ToFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(v) => v.to_field_value(),
            None => FieldValue::Null,
        }
    }
}
impl<T: ToFieldValue> ToFieldValue for &T {
    fn to_field_value(&self) -> FieldValue {
        (*self).to_field_value()
    }
}

/// Conversion of a record's [`FieldValue`] into a native Rust value.
///
/// `field` is the name of the record field being converted and is used for
/// error reporting. `tz` is the offset used to interpret date and time text.
pub trait FromFieldValue {
    fn from_field(field: &str, fv: &FieldValue, tz: &FixedOffset) -> Result<Self, FMError>
    where
        Self: Sized;
}

impl FromFieldValue for FieldValue {
    fn from_field(_field: &str, fv: &FieldValue, _tz: &FixedOffset) -> Result<Self, FMError> {
        Ok(fv.clone())
    }
}

impl FromFieldValue for String {
    fn from_field(_field: &str, fv: &FieldValue, _tz: &FixedOffset) -> Result<Self, FMError> {
        Ok(fv.to_string())
    }
}

// Number-only conversions. Fractions truncate toward zero; values outside the
// target range (or not finite) are a type mismatch.
macro_rules! ffv_integer {
    ($($t:ty),*) => {$(
        impl FromFieldValue for $t {
            fn from_field(field: &str, fv: &FieldValue, _tz: &FixedOffset) -> Result<Self, FMError> {
                if let FieldValue::Number(n) = fv {
                    let t = n.trunc();
                    let signed = if <$t>::MIN == 0 { 0 } else { 1 };
                    // exclusive upper bound, exact in f64 for every width
                    let hi = 2f64.powi(<$t>::BITS as i32 - signed);
                    if n.is_finite() && t >= <$t>::MIN as f64 && t < hi {
                        return Ok(t as $t);
                    }
                }
                Err(FMError::type_mismatch(field, "an integer", fv))
            }
        }
    )*};
}

ffv_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! ffv_float {
    ($($t:ty),*) => {$(
        impl FromFieldValue for $t {
            fn from_field(field: &str, fv: &FieldValue, _tz: &FixedOffset) -> Result<Self, FMError> {
                if let FieldValue::Number(n) = fv {
                    return Ok(*n as $t);
                }
                Err(FMError::type_mismatch(field, "a number", fv))
            }
        }
    )*};
}

ffv_float!(f32, f64);

impl FromFieldValue for bool {
    fn from_field(_field: &str, fv: &FieldValue, _tz: &FixedOffset) -> Result<Self, FMError> {
        Ok(field_to_bool(fv))
    }
}

impl FromFieldValue for DateTime<FixedOffset> {
    fn from_field(field: &str, fv: &FieldValue, tz: &FixedOffset) -> Result<Self, FMError> {
        match fv {
            FieldValue::Text(s) => parse_time(field, s, tz),
            FieldValue::Null => Err(FMError::unknown_format(field, "")),
            FieldValue::Number(_) => Err(FMError::type_mismatch(field, "a date/time", fv)),
        }
    }
}

impl<T: FromFieldValue> FromFieldValue for Option<T> {
    fn from_field(field: &str, fv: &FieldValue, tz: &FixedOffset) -> Result<Self, FMError> {
        if fv.is_empty() {
            return Ok(None);
        }
        Ok(Some(T::from_field(field, fv, tz)?))
    }
}

/// A struct that can be filled from the field data of a [`Record`].
///
/// This is normally implemented with `#[derive(FMRecord)]`. Every mapped field
/// is attempted; fields that fail to convert keep their value (`Option` fields
/// become `None`) and the first error is returned at the end:
///
///```no_run
/// use filemaker_rust_sdk::{FMRecord, Record, FixedOffset};
/// use chrono::DateTime;
///
/// #[derive(Default, Debug, FMRecord)]
/// struct Contact {
///     #[fm(field = "First Name")]
///     first_name: String,
///     #[fm(field = "Age")]
///     age: Option<i32>,
///     #[fm(field = "Created")]
///     created: Option<DateTime<FixedOffset>>,
///     #[fm(field = "VIP")]
///     vip: bool,
///     // not mapped
///     notes: Vec<String>,
/// }
///
/// # fn run(record: &Record) -> Result<(), Box<dyn std::error::Error>> {
/// let mut c = Contact::default();
/// record.map_to(&mut c, &FixedOffset::east_opt(0).unwrap())?;
/// # Ok(())
/// # }
///```
pub trait FMRecord {
    fn map_from(&mut self, record: &Record, tz: &FixedOffset) -> Result<(), FMError>;
}

pub(crate) fn field_to_bool(fv: &FieldValue) -> bool {
    match fv {
        FieldValue::Text(s) => !s.is_empty(),
        FieldValue::Number(n) => *n > 0.0,
        FieldValue::Null => false,
    }
}

struct TimeFormat {
    shape: &'static str,
    format: &'static str,
    has_time: bool,
}

const TIME_FORMATS: [TimeFormat; 4] = [
    TimeFormat {
        shape: r"^\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2}$",
        format: "%m/%d/%Y %H:%M:%S",
        has_time: true,
    },
    TimeFormat {
        shape: r"^\d{2}/\d{2}/\d{4}$",
        format: "%m/%d/%Y",
        has_time: false,
    },
    TimeFormat {
        shape: r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$",
        format: "%Y-%m-%d %H:%M:%S",
        has_time: true,
    },
    TimeFormat {
        shape: r"^\d{4}-\d{2}-\d{2}$",
        format: "%Y-%m-%d",
        has_time: false,
    },
];

fn time_shapes() -> &'static Vec<Regex> {
    static SHAPES: OnceLock<Vec<Regex>> = OnceLock::new();
    SHAPES.get_or_init(|| {
        TIME_FORMATS
            .iter()
            .filter_map(|f| Regex::new(f.shape).ok())
            .collect()
    })
}

/// Parse date/time text as written by the FileMaker host.
///
/// Recognized formats are `MM/dd/yyyy HH:mm:ss`, `MM/dd/yyyy`,
/// `yyyy-MM-dd HH:mm:ss` and `yyyy-MM-dd`. The value is read as wall time in `tz`.
pub fn parse_time(field: &str, s: &str, tz: &FixedOffset) -> Result<DateTime<FixedOffset>, FMError> {
    for (tf, shape) in TIME_FORMATS.iter().zip(time_shapes().iter()) {
        if !shape.is_match(s) {
            continue;
        }
        let ndt = if tf.has_time {
            NaiveDateTime::parse_from_str(s, tf.format).ok()
        } else {
            NaiveDate::parse_from_str(s, tf.format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        };
        if let Some(ndt) = ndt {
            if let Some(dt) = tz.from_local_datetime(&ndt).single() {
                return Ok(dt);
            }
        }
        break;
    }
    Err(FMError::unknown_format(field, s))
}

//! Schema-driven decoding of untyped JSON trees into typed records.
//!
//! Every record type declares a static field table ([`FieldSpec`]) and a
//! builder ([`Decode::from_fields`]). [`decode`] checks the table against the
//! JSON object before the builder runs, so a caller either gets a complete
//! record or a [`DecodeError`], never a half-filled value.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Default bound on record nesting below the decoded root.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Smallest accepted nesting bound: update -> message -> reply -> chat.
pub const MIN_MAX_DEPTH: usize = 4;

/// JSON value kinds a field table can ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Integer,
    Real,
    String,
    Bool,
    Object,
    Array,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => JsonKind::Integer,
            Value::Number(_) => JsonKind::Real,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Integer => "integer",
            JsonKind::Real => "real",
            JsonKind::String => "string",
            JsonKind::Bool => "bool",
            JsonKind::Object => "object",
            JsonKind::Array => "array",
        }
    }

    /// Integers are valid reals; nothing else widens.
    fn accepts(self, actual: JsonKind) -> bool {
        self == actual || (self == JsonKind::Real && actual == JsonKind::Integer)
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a record's field table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: JsonKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: JsonKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: JsonKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// What to do with an optional field that is present but malformed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptionalFieldPolicy {
    /// Fail the enclosing record, exactly like a malformed mandatory field.
    #[default]
    Strict,
    /// Treat the field as absent.
    Lenient,
}

impl OptionalFieldPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "lenient" | "permissive" => Some(Self::Lenient),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    pub optional_fields: OptionalFieldPolicy,
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            optional_fields: OptionalFieldPolicy::Strict,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    pub fn lenient() -> Self {
        Self {
            optional_fields: OptionalFieldPolicy::Lenient,
            ..Self::default()
        }
    }
}

/// A mandatory field is missing, or a field has the wrong JSON kind.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("field `{}`: expected {expected}, found {}", field_label(.field), found_label(.actual))]
pub struct SchemaError {
    /// Dotted path from the decoded root (`message.chat.id`); empty for the root itself.
    pub field: String,
    pub expected: JsonKind,
    /// `None` when the field is absent.
    pub actual: Option<JsonKind>,
}

impl SchemaError {
    pub fn new(field: impl Into<String>, expected: JsonKind, actual: Option<JsonKind>) -> Self {
        Self {
            field: field.into(),
            expected,
            actual,
        }
    }
}

fn field_label(field: &str) -> &str {
    if field.is_empty() {
        "<root>"
    } else {
        field
    }
}

fn found_label(actual: &Option<JsonKind>) -> &'static str {
    actual.map(JsonKind::as_str).unwrap_or("nothing")
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("field `{}`: integer out of range", field_label(.field))]
    OutOfRange { field: String },

    #[error("field `{}`: records nested deeper than {limit} levels", field_label(.field))]
    DepthExceeded { field: String, limit: usize },
}

impl DecodeError {
    pub fn field(&self) -> &str {
        match self {
            DecodeError::Schema(e) => &e.field,
            DecodeError::OutOfRange { field } | DecodeError::DepthExceeded { field, .. } => field,
        }
    }

    fn within(self, parent: &str) -> Self {
        match self {
            DecodeError::Schema(mut e) => {
                e.field = join_path(parent, &e.field);
                DecodeError::Schema(e)
            }
            DecodeError::OutOfRange { field } => DecodeError::OutOfRange {
                field: join_path(parent, &field),
            },
            DecodeError::DepthExceeded { field, limit } => DecodeError::DepthExceeded {
                field: join_path(parent, &field),
                limit,
            },
        }
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else if child.starts_with('[') {
        format!("{parent}{child}")
    } else {
        format!("{parent}.{child}")
    }
}

/// Raw JSON kept for fields the model does not interpret (media, payments, ...).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Opaque(pub Value);

/// A record decodable from a JSON object through its field table.
pub trait Decode: Sized {
    const SCHEMA: &'static [FieldSpec];

    fn from_fields(fields: &Fields<'_>) -> Result<Self, DecodeError>;
}

/// Decode one record from `value`.
pub fn decode<T: Decode>(value: &Value, options: &DecodeOptions) -> Result<T, DecodeError> {
    decode_at(value, options, 0)
}

/// Decode an array of records, skipping (and logging) elements that fail.
///
/// Only a non-array `value` fails the whole call.
pub fn decode_batch<T: Decode>(
    value: &Value,
    options: &DecodeOptions,
) -> Result<Vec<T>, DecodeError> {
    let Value::Array(items) = value else {
        return Err(SchemaError::new("", JsonKind::Array, Some(JsonKind::of(value))).into());
    };

    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match decode::<T>(item, options) {
            Ok(record) => out.push(record),
            Err(error) => {
                let error = error.within(&format!("[{index}]"));
                tracing::warn!(index, %error, "failed to decode batch element, skipped");
                tracing::debug!(element = %item, "skipped element");
            }
        }
    }
    Ok(out)
}

fn decode_at<T: Decode>(
    value: &Value,
    options: &DecodeOptions,
    depth: usize,
) -> Result<T, DecodeError> {
    let Value::Object(map) = value else {
        return Err(SchemaError::new("", JsonKind::Object, Some(JsonKind::of(value))).into());
    };

    let mut dropped = Vec::new();
    for spec in T::SCHEMA {
        let Some(found) = present(map, spec.name) else {
            if spec.required {
                return Err(SchemaError::new(spec.name, spec.kind, None).into());
            }
            continue;
        };

        let actual = JsonKind::of(found);
        if spec.kind.accepts(actual) {
            continue;
        }
        if spec.required || options.optional_fields == OptionalFieldPolicy::Strict {
            return Err(SchemaError::new(spec.name, spec.kind, Some(actual)).into());
        }
        tracing::debug!(
            field = spec.name,
            expected = %spec.kind,
            found = %actual,
            "mistyped optional field treated as absent"
        );
        dropped.push(spec.name);
    }

    T::from_fields(&Fields {
        map,
        options,
        depth,
        dropped,
    })
}

/// JSON `null` reads the same as a missing key.
fn present<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    map.get(name).filter(|v| !v.is_null())
}

/// Validated view of one JSON object, handed to [`Decode::from_fields`].
pub struct Fields<'a> {
    map: &'a Map<String, Value>,
    options: &'a DecodeOptions,
    depth: usize,
    dropped: Vec<&'static str>,
}

impl<'a> Fields<'a> {
    fn get(&self, name: &str) -> Option<&'a Value> {
        if self.dropped.iter().any(|dropped| *dropped == name) {
            return None;
        }
        present(self.map, name)
    }

    fn require(&self, name: &str, kind: JsonKind) -> Result<&'a Value, DecodeError> {
        self.get(name)
            .ok_or_else(|| SchemaError::new(name, kind, None).into())
    }

    /// Shared optional-field path: absent is `None`; a failure obeys the policy.
    fn optional<T>(
        &self,
        name: &str,
        read: impl FnOnce(&'a Value) -> Result<T, DecodeError>,
    ) -> Result<Option<T>, DecodeError> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        match read(value) {
            Ok(v) => Ok(Some(v)),
            Err(error) if self.options.optional_fields == OptionalFieldPolicy::Lenient => {
                tracing::debug!(%error, "malformed optional field treated as absent");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    pub fn int<I: TryFrom<i64>>(&self, name: &str) -> Result<I, DecodeError> {
        read_int(name, self.require(name, JsonKind::Integer)?)
    }

    pub fn opt_int<I: TryFrom<i64>>(&self, name: &str) -> Result<Option<I>, DecodeError> {
        self.optional(name, |v| read_int(name, v))
    }

    pub fn string(&self, name: &str) -> Result<String, DecodeError> {
        read_string(name, self.require(name, JsonKind::String)?)
    }

    pub fn opt_string(&self, name: &str) -> Result<Option<String>, DecodeError> {
        self.optional(name, |v| read_string(name, v))
    }

    pub fn flag(&self, name: &str) -> Result<bool, DecodeError> {
        read_bool(name, self.require(name, JsonKind::Bool)?)
    }

    pub fn opt_flag(&self, name: &str) -> Result<Option<bool>, DecodeError> {
        self.optional(name, |v| read_bool(name, v))
    }

    pub fn real(&self, name: &str) -> Result<f64, DecodeError> {
        read_real(name, self.require(name, JsonKind::Real)?)
    }

    pub fn opt_real(&self, name: &str) -> Result<Option<f64>, DecodeError> {
        self.optional(name, |v| read_real(name, v))
    }

    pub fn record<T: Decode>(&self, name: &str) -> Result<T, DecodeError> {
        let value = self.require(name, JsonKind::Object)?;
        self.nested(name, value)
    }

    pub fn opt_record<T: Decode>(&self, name: &str) -> Result<Option<T>, DecodeError> {
        self.optional(name, |v| self.nested(name, v))
    }

    /// Optional record of a recursive type (a message inside a message).
    pub fn opt_boxed<T: Decode>(&self, name: &str) -> Result<Option<Box<T>>, DecodeError> {
        Ok(self.opt_record::<T>(name)?.map(Box::new))
    }

    /// Optional array of records. Inside a record, one bad element fails the field.
    pub fn opt_records<T: Decode>(&self, name: &str) -> Result<Option<Vec<T>>, DecodeError> {
        self.optional(name, |v| {
            let Value::Array(items) = v else {
                return Err(SchemaError::new(name, JsonKind::Array, Some(JsonKind::of(v))).into());
            };
            items
                .iter()
                .enumerate()
                .map(|(index, item)| self.nested(&format!("{name}[{index}]"), item))
                .collect()
        })
    }

    /// Optional field kept as raw JSON; its kind was checked against the table.
    pub fn opt_opaque(&self, name: &str) -> Option<Opaque> {
        self.get(name).cloned().map(Opaque)
    }

    fn nested<T: Decode>(&self, name: &str, value: &Value) -> Result<T, DecodeError> {
        let depth = self.depth + 1;
        let limit = self.options.max_depth.max(MIN_MAX_DEPTH);
        if depth > limit {
            return Err(DecodeError::DepthExceeded {
                field: name.to_string(),
                limit,
            });
        }
        decode_at::<T>(value, self.options, depth).map_err(|e| e.within(name))
    }
}

fn read_int<I: TryFrom<i64>>(name: &str, value: &Value) -> Result<I, DecodeError> {
    let Some(n) = value.as_i64() else {
        return match JsonKind::of(value) {
            JsonKind::Integer => Err(DecodeError::OutOfRange {
                field: name.to_string(),
            }),
            other => Err(SchemaError::new(name, JsonKind::Integer, Some(other)).into()),
        };
    };
    I::try_from(n).map_err(|_| DecodeError::OutOfRange {
        field: name.to_string(),
    })
}

fn read_string(name: &str, value: &Value) -> Result<String, DecodeError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| SchemaError::new(name, JsonKind::String, Some(JsonKind::of(value))).into())
}

fn read_bool(name: &str, value: &Value) -> Result<bool, DecodeError> {
    value
        .as_bool()
        .ok_or_else(|| SchemaError::new(name, JsonKind::Bool, Some(JsonKind::of(value))).into())
}

fn read_real(name: &str, value: &Value) -> Result<f64, DecodeError> {
    value
        .as_f64()
        .ok_or_else(|| SchemaError::new(name, JsonKind::Real, Some(JsonKind::of(value))).into())
}

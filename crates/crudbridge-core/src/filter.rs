// ── Filter composition ──
//
// Turns a caller's nested filter object into flat `FilterTerm`s.
//
// Key convention:
// - `field||operator` selects the comparison; no suffix means `cont`.
// - Nested objects flatten to dotted paths (`{author: {name: x}}` is
//   `author.name`).
// - A field that starts with `_` and contains a `.` loses everything up
//   to the first dot (`_or.name` is `name`). This grouping convention has
//   no documented producer; keep it exactly as is.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

const OPERATOR_DELIM: &str = "||";
const GROUP_PREFIX: char = '_';

// ── Operators ───────────────────────────────────────────────────────

/// Comparison operators understood by the backend.
///
/// The `*Low` variants are the case-insensitive forms and only exist with
/// the `$` sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, EnumIter)]
pub enum CondOperator {
    #[strum(serialize = "eq")]
    Equals,
    #[strum(serialize = "ne")]
    NotEquals,
    #[strum(serialize = "gt")]
    GreaterThan,
    #[strum(serialize = "lt")]
    LowerThan,
    #[strum(serialize = "gte")]
    GreaterThanEquals,
    #[strum(serialize = "lte")]
    LowerThanEquals,
    #[strum(serialize = "starts")]
    Starts,
    #[strum(serialize = "ends")]
    Ends,
    #[strum(serialize = "cont")]
    Contains,
    #[strum(serialize = "excl")]
    Excludes,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "notin")]
    NotIn,
    #[strum(serialize = "isnull")]
    IsNull,
    #[strum(serialize = "notnull")]
    NotNull,
    #[strum(serialize = "between")]
    Between,
    #[strum(serialize = "eqL")]
    EqualsLow,
    #[strum(serialize = "neL")]
    NotEqualsLow,
    #[strum(serialize = "startsL")]
    StartsLow,
    #[strum(serialize = "endsL")]
    EndsLow,
    #[strum(serialize = "contL")]
    ContainsLow,
    #[strum(serialize = "exclL")]
    ExcludesLow,
    #[strum(serialize = "inL")]
    InLow,
    #[strum(serialize = "notinL")]
    NotInLow,
}

impl CondOperator {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Case-insensitive operators have no legacy bare spelling.
    pub fn is_case_insensitive(self) -> bool {
        matches!(
            self,
            Self::EqualsLow
                | Self::NotEqualsLow
                | Self::StartsLow
                | Self::EndsLow
                | Self::ContainsLow
                | Self::ExcludesLow
                | Self::InLow
                | Self::NotInLow
        )
    }

    /// Every accepted spelling: legacy bare names first, then `$` forms.
    pub fn spellings() -> Vec<String> {
        let legacy = Self::iter()
            .filter(|op| !op.is_case_insensitive())
            .map(|op| op.name().to_owned());
        let sigil = Self::iter().map(|op| format!("${}", op.name()));
        legacy.chain(sigil).collect()
    }
}

/// An operator as written by the caller.
///
/// Known operators remember whether they carried the `$` sigil so the
/// query string reproduces the caller's spelling (`cont` vs `$cont`).
/// Anything else is kept as `Custom` and rejected when the query is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Known { op: CondOperator, sigil: bool },
    Custom(String),
}

impl Operator {
    /// `$`-prefixed form, e.g. `$eq`.
    pub fn canonical(op: CondOperator) -> Self {
        Self::Known { op, sigil: true }
    }

    /// Bare legacy form, e.g. `cont`.
    pub fn legacy(op: CondOperator) -> Self {
        Self::Known { op, sigil: false }
    }

    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix('$') {
            if let Ok(op) = rest.parse::<CondOperator>() {
                return Self::canonical(op);
            }
        } else if let Ok(op) = raw.parse::<CondOperator>() {
            if !op.is_case_insensitive() {
                return Self::legacy(op);
            }
        }
        Self::Custom(raw.to_owned())
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl Default for Operator {
    fn default() -> Self {
        Self::legacy(CondOperator::Contains)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known { op, sigil: true } => write!(f, "${}", op.name()),
            Self::Known { op, sigil: false } => f.write_str(op.name()),
            Self::Custom(s) => f.write_str(s),
        }
    }
}

impl Serialize for Operator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

// ── FilterTerm ──────────────────────────────────────────────────────

/// One `(field, operator, value)` comparison sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterTerm {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl FilterTerm {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Parse a flattened `field||operator` key.
    fn from_key(key: &str, value: Value) -> Self {
        let mut parts = key.split(OPERATOR_DELIM);
        let raw_field = parts.next().unwrap_or_default();
        let operator = parts
            .next()
            .filter(|op| !op.is_empty())
            .map(Operator::parse)
            .unwrap_or_default();

        Self {
            field: ungroup_field(raw_field).to_owned(),
            operator,
            value,
        }
    }
}

/// `_group.rest` becomes `rest`; an empty rest yields an empty field.
fn ungroup_field(field: &str) -> &str {
    if !field.starts_with(GROUP_PREFIX) {
        return field;
    }
    match field.split_once('.') {
        Some((_, rest)) => rest,
        None => field,
    }
}

// ── Composition ─────────────────────────────────────────────────────

/// Whether a filter value means "no filter at all".
pub fn is_empty_filter(filter: &Value) -> bool {
    match filter {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(map) => matches!(map.get("q"), Some(Value::String(q)) if q.is_empty()),
        _ => false,
    }
}

/// Flatten a caller filter into ordered `FilterTerm`s.
///
/// Never fails. Non-object inputs other than the empty forms produce no
/// terms.
pub fn compose_filter(filter: &Value) -> Vec<FilterTerm> {
    if is_empty_filter(filter) {
        return Vec::new();
    }
    let Value::Object(map) = filter else {
        return Vec::new();
    };

    let mut flat = Vec::new();
    flatten_into(map, "", &mut flat);

    flat.into_iter()
        .map(|(key, value)| FilterTerm::from_key(&key, value))
        .collect()
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten_into(inner, &path, out),
            leaf => out.push((path, leaf.clone())),
        }
    }
}

/// Whether `filter["0"]` holds a truthy OR-group.
pub fn or_group(filter: &Value) -> Option<&Value> {
    filter.get("0").filter(|v| is_truthy(v))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ── Query-string builder ──
//
// Produces the query grammar the @nestjsx/crud backend parses:
//
//   filter[0]=field||op||value   (AND conditions)
//   or[0]=field||op||value       (OR conditions)
//   sort[0]=field,ASC
//   limit=10&page=2&offset=10
//
// Parameters serialize in the order they were first set, list parameters
// with indexed keys, everything percent-encoded per RFC 3986. Empty lists
// are dropped. The backend is strict about this shape; keep it bit-exact.

use std::collections::HashMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Number, Value};
use strum::AsRefStr;

use crate::action::Sort;
use crate::error::CoreError;
use crate::filter::{CondOperator, FilterTerm};

const DELIM: &str = "||";
const DELIM_STR: &str = ",";

/// Everything but RFC 3986 unreserved characters.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr)]
#[strum(serialize_all = "lowercase")]
enum ParamName {
    Filter,
    Or,
    Limit,
    Offset,
    Page,
    Sort,
}

/// Chainable builder for backend query strings.
#[derive(Debug, Clone, Default)]
pub struct RequestQueryBuilder {
    /// Parameter names in first-set order.
    order: Vec<ParamName>,
    numbers: HashMap<ParamName, u64>,
    lists: HashMap<ParamName, Vec<String>>,
}

impl RequestQueryBuilder {
    pub fn create() -> Self {
        Self::default()
    }

    // ── Conditions ───────────────────────────────────────────────────

    /// Append AND conditions.
    pub fn set_filter(&mut self, terms: &[FilterTerm]) -> Result<&mut Self, CoreError> {
        self.push_conditions(ParamName::Filter, terms)?;
        Ok(self)
    }

    /// Append OR conditions.
    pub fn set_or(&mut self, terms: &[FilterTerm]) -> Result<&mut Self, CoreError> {
        self.push_conditions(ParamName::Or, terms)?;
        Ok(self)
    }

    fn push_conditions(&mut self, name: ParamName, terms: &[FilterTerm]) -> Result<(), CoreError> {
        let rendered = terms
            .iter()
            .map(|t| render_condition(name, t))
            .collect::<Result<Vec<_>, _>>()?;
        self.list_mut(name).extend(rendered);
        Ok(())
    }

    // ── Paging ───────────────────────────────────────────────────────

    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.set_number(ParamName::Limit, limit);
        self
    }

    pub fn set_offset(&mut self, offset: u64) -> &mut Self {
        self.set_number(ParamName::Offset, offset);
        self
    }

    pub fn set_page(&mut self, page: u64) -> &mut Self {
        self.set_number(ParamName::Page, page);
        self
    }

    // ── Sorting ──────────────────────────────────────────────────────

    /// Append sort clauses. Passing `None` leaves the query untouched.
    pub fn sort_by<'a>(
        &mut self,
        sorts: impl IntoIterator<Item = &'a Sort>,
    ) -> Result<&mut Self, CoreError> {
        let rendered = sorts
            .into_iter()
            .map(render_sort)
            .collect::<Result<Vec<_>, _>>()?;
        if !rendered.is_empty() {
            self.list_mut(ParamName::Sort).extend(rendered);
        }
        Ok(self)
    }

    // ── Output ───────────────────────────────────────────────────────

    /// Serialize to a query string (without the leading `?`).
    pub fn query(&self) -> String {
        let mut pairs = Vec::new();
        for name in &self.order {
            if let Some(n) = self.numbers.get(name) {
                pairs.push(format!("{}={n}", encode(name.as_ref())));
            }
            for (i, item) in self.lists.get(name).into_iter().flatten().enumerate() {
                let key = format!("{}[{i}]", name.as_ref());
                pairs.push(format!("{}={}", encode(&key), encode(item)));
            }
        }
        pairs.join("&")
    }

    // ── Internals ────────────────────────────────────────────────────

    fn touch(&mut self, name: ParamName) {
        if !self.order.contains(&name) {
            self.order.push(name);
        }
    }

    fn set_number(&mut self, name: ParamName, n: u64) {
        self.touch(name);
        self.numbers.insert(name, n);
    }

    fn list_mut(&mut self, name: ParamName) -> &mut Vec<String> {
        self.touch(name);
        self.lists.entry(name).or_default()
    }
}

// ── Rendering ───────────────────────────────────────────────────────

fn render_condition(name: ParamName, term: &FilterTerm) -> Result<String, CoreError> {
    if term.field.is_empty() {
        return Err(CoreError::invalid_query(format!(
            "Invalid field type in {} condition. String expected",
            name.as_ref()
        )));
    }
    if term.operator.is_custom() {
        return Err(CoreError::invalid_query(format!(
            "Invalid comparison operator. {} expected",
            CondOperator::spellings().join(",")
        )));
    }

    let mut out = format!("{}{DELIM}{}", term.field, term.operator);
    if let Some(value) = condition_value(&term.value) {
        out.push_str(DELIM);
        out.push_str(&value);
    }
    Ok(out)
}

fn render_sort(sort: &Sort) -> Result<String, CoreError> {
    if sort.field.is_empty() {
        return Err(CoreError::invalid_query("Invalid sort field. String expected"));
    }
    Ok(format!("{}{DELIM_STR}{}", sort.field, sort.order))
}

/// Condition values are omitted entirely when null.
fn condition_value(value: &Value) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(js_string(value))
    }
}

/// String conversion matching JavaScript's `String(value)`.
pub(crate) fn js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => js_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_owned(),
    }
}

fn js_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    n.as_f64().map_or_else(|| n.to_string(), js_float)
}

/// JavaScript `Number.prototype.toString()` for a finite float: plain
/// decimal for exponents in `[-7, 21)`, `d.ddde±x` outside it.
#[allow(clippy::float_cmp)]
fn js_float(f: f64) -> String {
    if f == 0.0 {
        return "0".to_owned();
    }
    // `{:e}` yields the shortest round-trip digits, e.g. `1.2345e2`.
    let sci = format!("{:e}", f.abs());
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return f.to_string();
    };
    let Ok(exp) = exp.parse::<i64>() else {
        return f.to_string();
    };

    let digits = mantissa.replace('.', "");
    let k = i64::try_from(digits.len()).unwrap_or(i64::MAX);
    let n = exp + 1;
    let zeros = |count: i64| "0".repeat(usize::try_from(count).unwrap_or(0));

    let body = if k <= n && n <= 21 {
        format!("{digits}{}", zeros(n - k))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(usize::try_from(n).unwrap_or(0));
        format!("{int}.{frac}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", zeros(-n))
    } else {
        let sign = if n >= 1 { '+' } else { '-' };
        let (lead, rest) = digits.split_at(1);
        let exponent = (n - 1).abs();
        if rest.is_empty() {
            format!("{lead}e{sign}{exponent}")
        } else {
            format!("{lead}.{rest}e{sign}{exponent}")
        }
    };

    if f < 0.0 { format!("-{body}") } else { body }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_COMPONENT).to_string()
}

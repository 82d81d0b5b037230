// ── Typed action model ──
//
// Every action the provider understands, as a tagged union keyed by
// `ActionKind`. Each variant carries exactly the params its kind needs.
// Untyped callers go through `Action::from_params`, which validates the
// JSON shape at the boundary.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::CoreError;

// ── ActionKind ──────────────────────────────────────────────────────

/// The operation a caller asks the provider to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    GetList,
    GetOne,
    GetMany,
    GetManyReference,
    Create,
    Update,
    UpdateMany,
    Delete,
    DeleteMany,
}

impl ActionKind {
    /// Parse a kind name such as `"GET_LIST"`.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        raw.parse().map_err(|_| CoreError::unsupported(raw))
    }

    /// Kinds answered with `{ data, total }`.
    pub fn is_list(self) -> bool {
        matches!(self, Self::GetList | Self::GetManyReference)
    }

    /// Kinds the dispatcher fans out into one request per id.
    pub fn is_bulk(self) -> bool {
        matches!(self, Self::UpdateMany | Self::DeleteMany)
    }
}

// ── Identifier ──────────────────────────────────────────────────────

/// Record identifier: a JSON number or a JSON string.
///
/// Renders the way the backend expects it in paths (`/posts/5`) and in
/// comma-joined id lists (`1,2,3`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(Number),
    String(String),
}

impl Identifier {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Identifier {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for Identifier {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

/// Render ids the way a JavaScript array stringifies: `1,2,abc`.
pub fn join_ids(ids: &[Identifier]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

// ── Pagination & sort ───────────────────────────────────────────────

/// One-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Pagination {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self { page, per_page }
    }

    /// Rows to skip: `(page - 1) * perPage`.
    pub fn offset(self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    fn validate(self, kind: ActionKind) -> Result<(), CoreError> {
        if self.page == 0 {
            return Err(CoreError::invalid_params(kind, "pagination.page must be at least 1"));
        }
        if self.per_page == 0 {
            return Err(CoreError::invalid_params(
                kind,
                "pagination.perPage must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum SortOrder {
    #[serde(rename = "ASC")]
    #[strum(serialize = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    #[strum(serialize = "DESC")]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

// ── Per-kind params ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetListParams {
    pub pagination: Pagination,
    #[serde(default)]
    pub sort: Option<Sort>,
    /// Raw filter object; see [`crate::filter::compose_filter`].
    #[serde(default)]
    pub filter: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOneParams {
    pub id: Identifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetManyParams {
    pub ids: Vec<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetManyReferenceParams {
    /// Foreign-key field on `resource` that must equal `id`.
    pub target: String,
    pub id: Identifier,
    pub pagination: Pagination,
    #[serde(default)]
    pub sort: Option<Sort>,
    #[serde(default)]
    pub filter: Value,
}

/// Payload of a create: one record, or an array for bulk create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatePayload {
    Bulk(Vec<Value>),
    One(Map<String, Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateParams {
    pub data: CreatePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateParams {
    pub id: Identifier,
    pub data: Value,
}

/// One payload applied to every id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateManyParams {
    pub ids: Vec<Identifier>,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteParams {
    pub id: Identifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteManyParams {
    pub ids: Vec<Identifier>,
}

// ── Action ──────────────────────────────────────────────────────────

/// A fully typed provider action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    GetList(GetListParams),
    GetOne(GetOneParams),
    GetMany(GetManyParams),
    GetManyReference(GetManyReferenceParams),
    Create(CreateParams),
    Update(UpdateParams),
    UpdateMany(UpdateManyParams),
    Delete(DeleteParams),
    DeleteMany(DeleteManyParams),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::GetList(_) => ActionKind::GetList,
            Self::GetOne(_) => ActionKind::GetOne,
            Self::GetMany(_) => ActionKind::GetMany,
            Self::GetManyReference(_) => ActionKind::GetManyReference,
            Self::Create(_) => ActionKind::Create,
            Self::Update(_) => ActionKind::Update,
            Self::UpdateMany(_) => ActionKind::UpdateMany,
            Self::Delete(_) => ActionKind::Delete,
            Self::DeleteMany(_) => ActionKind::DeleteMany,
        }
    }

    /// Build a typed action from a kind and untyped JSON params.
    ///
    /// Unknown fields are ignored, so callers may pass extra context
    /// (e.g. `previousData`) without breaking anything.
    pub fn from_params(kind: ActionKind, params: Value) -> Result<Self, CoreError> {
        let action = match kind {
            ActionKind::GetList => Self::GetList(parse(kind, params)?),
            ActionKind::GetOne => Self::GetOne(parse(kind, params)?),
            ActionKind::GetMany => Self::GetMany(parse(kind, params)?),
            ActionKind::GetManyReference => Self::GetManyReference(parse(kind, params)?),
            ActionKind::Create => Self::Create(parse(kind, params)?),
            ActionKind::Update => Self::Update(parse(kind, params)?),
            ActionKind::UpdateMany => Self::UpdateMany(parse(kind, params)?),
            ActionKind::Delete => Self::Delete(parse(kind, params)?),
            ActionKind::DeleteMany => Self::DeleteMany(parse(kind, params)?),
        };
        action.validate()?;
        Ok(action)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), CoreError> {
        let kind = self.kind();
        match self {
            Self::GetList(p) => {
                p.pagination.validate(kind)?;
                validate_sort(kind, p.sort.as_ref())
            }
            Self::GetManyReference(p) => {
                p.pagination.validate(kind)?;
                if p.target.is_empty() {
                    return Err(CoreError::invalid_params(kind, "target must not be empty"));
                }
                validate_sort(kind, p.sort.as_ref())
            }
            _ => Ok(()),
        }
    }
}

fn parse<T: DeserializeOwned>(kind: ActionKind, params: Value) -> Result<T, CoreError> {
    serde_json::from_value(params).map_err(|e| CoreError::invalid_params(kind, e.to_string()))
}

fn validate_sort(kind: ActionKind, sort: Option<&Sort>) -> Result<(), CoreError> {
    match sort {
        Some(s) if s.field.is_empty() => {
            Err(CoreError::invalid_params(kind, "sort.field must not be empty"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in ActionKind::iter() {
            assert_eq!(ActionKind::parse(kind.as_ref()).unwrap(), kind);
        }
        assert_eq!(ActionKind::GetManyReference.to_string(), "GET_MANY_REFERENCE");
    }

    #[test]
    fn unknown_kind_is_unsupported() {
        let err = ActionKind::parse("GET_EVERYTHING").unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedAction { ref action } if action == "GET_EVERYTHING"));
        assert!(ActionKind::parse("get_list").is_err());
    }

    #[test]
    fn identifier_renders_like_js() {
        let ids = vec![Identifier::from(1), Identifier::from("abc"), Identifier::from(3_u64)];
        assert_eq!(join_ids(&ids), "1,abc,3");
        assert_eq!(join_ids(&[]), "");
    }

    #[test]
    fn identifier_deserializes_numbers_and_strings() {
        let ids: Vec<Identifier> = serde_json::from_value(json!([5, "x", 1.5])).unwrap();
        assert_eq!(ids[0], Identifier::from(5));
        assert_eq!(ids[1], Identifier::from("x"));
        assert_eq!(ids[2].to_string(), "1.5");
    }

    #[test]
    fn offset_is_page_minus_one_times_per_page() {
        for page in 1..=5_u64 {
            for per_page in 1..=50_u64 {
                assert_eq!(Pagination::new(page, per_page).offset(), (page - 1) * per_page);
            }
        }
    }

    #[test]
    fn get_list_params_parse() {
        let action = Action::from_params(
            ActionKind::GetList,
            json!({
                "pagination": { "page": 2, "perPage": 25 },
                "sort": { "field": "title", "order": "DESC" },
                "filter": { "title": "hello" }
            }),
        )
        .unwrap();

        let Action::GetList(params) = action else {
            panic!("expected GetList");
        };
        assert_eq!(params.pagination, Pagination::new(2, 25));
        assert_eq!(params.sort, Some(Sort::new("title", SortOrder::Desc)));
        assert_eq!(params.filter, json!({"title": "hello"}));
    }

    #[test]
    fn missing_filter_defaults_to_null() {
        let action = Action::from_params(
            ActionKind::GetList,
            json!({ "pagination": { "page": 1, "perPage": 10 } }),
        )
        .unwrap();
        let Action::GetList(params) = action else {
            panic!("expected GetList");
        };
        assert_eq!(params.filter, Value::Null);
        assert!(params.sort.is_none());
    }

    #[test]
    fn zero_page_is_rejected() {
        let err = Action::from_params(
            ActionKind::GetList,
            json!({ "pagination": { "page": 0, "perPage": 10 } }),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidParams { action: ActionKind::GetList, .. }));
    }

    #[test]
    fn bad_sort_order_is_rejected() {
        let err = Action::from_params(
            ActionKind::GetList,
            json!({
                "pagination": { "page": 1, "perPage": 10 },
                "sort": { "field": "id", "order": "UP" }
            }),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidParams { .. }));
    }

    #[test]
    fn reference_requires_target() {
        let err = Action::from_params(
            ActionKind::GetManyReference,
            json!({
                "target": "",
                "id": 1,
                "pagination": { "page": 1, "perPage": 10 }
            }),
        )
        .unwrap_err();
        assert!(err.to_string().contains("target"));
    }

    #[test]
    fn create_payload_distinguishes_bulk() {
        let one: CreateParams = serde_json::from_value(json!({"data": {"title": "a"}})).unwrap();
        assert!(matches!(one.data, CreatePayload::One(_)));

        let bulk: CreateParams =
            serde_json::from_value(json!({"data": [{"title": "a"}, {"title": "b"}]})).unwrap();
        assert!(matches!(bulk.data, CreatePayload::Bulk(ref items) if items.len() == 2));

        let err = Action::from_params(ActionKind::Create, json!({"data": 42})).unwrap_err();
        assert!(matches!(err, CoreError::InvalidParams { action: ActionKind::Create, .. }));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let action = Action::from_params(
            ActionKind::Update,
            json!({"id": 7, "data": {"title": "b"}, "previousData": {"title": "a"}}),
        )
        .unwrap();
        assert_eq!(action.kind(), ActionKind::Update);
    }

    #[test]
    fn bulk_and_list_classification() {
        assert!(ActionKind::UpdateMany.is_bulk());
        assert!(ActionKind::DeleteMany.is_bulk());
        assert!(!ActionKind::Delete.is_bulk());
        assert!(ActionKind::GetManyReference.is_list());
        assert!(!ActionKind::GetMany.is_list());
    }
}

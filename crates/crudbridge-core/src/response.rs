// ── Response normalizer ──
//
// Pulls the fields a caller expects out of the backend's JSON:
// list kinds read `data` + `total`, create merges the server id into the
// submitted payload, everything else hands the JSON back as-is.

use crudbridge_api::HttpResponse;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::action::{Action, CreatePayload};

/// What the provider hands back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub data: Value,
    /// The server's `total` exactly as sent. Only present for list kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Value>,
}

impl ProviderResult {
    pub fn data(data: Value) -> Self {
        Self { data, total: None }
    }

    pub fn page(data: Value, total: Option<Value>) -> Self {
        Self { data, total }
    }
}

/// Shape a raw response for the action that produced it.
pub fn normalize_response(response: HttpResponse, action: &Action) -> ProviderResult {
    let HttpResponse { json, .. } = response;

    match action {
        Action::GetList(_) | Action::GetManyReference(_) => normalize_page(json),
        Action::Create(params) => ProviderResult::data(merge_created(&params.data, &json)),
        _ => ProviderResult::data(json),
    }
}

/// Submitted payload plus the server's `id`. A bulk payload spreads into
/// index keys (`"0"`, `"1"`, ...). Without a server `id` the key is removed.
fn merge_created(payload: &CreatePayload, json: &Value) -> Value {
    let mut merged = match payload {
        CreatePayload::One(record) => record.clone(),
        CreatePayload::Bulk(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (i.to_string(), item.clone()))
            .collect::<Map<_, _>>(),
    };
    match json.get("id") {
        Some(id) => {
            merged.insert("id".to_owned(), id.clone());
        }
        None => {
            merged.remove("id");
        }
    }
    Value::Object(merged)
}

fn normalize_page(mut json: Value) -> ProviderResult {
    let total = json.get("total").cloned();
    if total.is_none() {
        warn!("list response has no `total`; is the endpoint paginated?");
    }
    let data = json
        .as_object_mut()
        .and_then(|obj| obj.remove("data"))
        .unwrap_or(Value::Null);
    ProviderResult::page(data, total)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::action::ActionKind;

    fn action(kind: ActionKind, params: Value) -> Action {
        Action::from_params(kind, params).unwrap()
    }

    fn list_action() -> Action {
        action(ActionKind::GetList, json!({"pagination": {"page": 1, "perPage": 10}}))
    }

    #[test]
    fn list_extracts_data_and_total() {
        let resp = HttpResponse::from_json(json!({
            "data": [{"id": 1}, {"id": 2}],
            "count": 2,
            "total": 12,
            "page": 1,
            "pageCount": 6
        }));
        let result = normalize_response(resp, &list_action());
        assert_eq!(
            result,
            ProviderResult::page(json!([{"id": 1}, {"id": 2}]), Some(json!(12)))
        );
    }

    #[test]
    fn reference_is_shaped_like_list() {
        let reference = action(
            ActionKind::GetManyReference,
            json!({"target": "postId", "id": 1, "pagination": {"page": 1, "perPage": 5}}),
        );
        let resp = HttpResponse::from_json(json!({"data": [], "total": 0}));
        let result = normalize_response(resp, &reference);
        assert_eq!(result.data, json!([]));
        assert_eq!(result.total, Some(json!(0)));
    }

    #[test]
    fn non_integer_total_is_passed_through() {
        for total in [json!("12"), json!(12.5), json!(-1), Value::Null] {
            let resp = HttpResponse::from_json(json!({"data": [], "total": total.clone()}));
            let result = normalize_response(resp, &list_action());
            assert_eq!(result.total, Some(total));
        }
    }

    #[test]
    fn unpaginated_list_has_no_total() {
        let resp = HttpResponse::from_json(json!([{"id": 1}]));
        let result = normalize_response(resp, &list_action());
        assert_eq!(result.data, Value::Null);
        assert_eq!(result.total, None);
    }

    #[test]
    fn create_merges_server_id_only() {
        let create = action(
            ActionKind::Create,
            json!({"data": {"title": "  Hello ", "tags": ["a"]}}),
        );
        let resp = HttpResponse::from_json(json!({
            "id": 42,
            "title": "Hello",
            "createdAt": "2024-01-01"
        }));
        let result = normalize_response(resp, &create);
        assert_eq!(
            result,
            ProviderResult::data(json!({"title": "  Hello ", "tags": ["a"], "id": 42}))
        );
    }

    #[test]
    fn create_without_server_id_drops_id() {
        let create = action(ActionKind::Create, json!({"data": {"id": 1, "title": "x"}}));
        let result = normalize_response(HttpResponse::from_json(json!({})), &create);
        assert_eq!(result.data, json!({"title": "x"}));
    }

    #[test]
    fn bulk_create_spreads_items_and_takes_server_id() {
        let create = action(
            ActionKind::Create,
            json!({"data": [{"title": "a"}, {"title": "b"}]}),
        );
        let resp = HttpResponse::from_json(json!({"id": 9, "junk": 1}));
        let result = normalize_response(resp, &create);
        assert_eq!(
            result,
            ProviderResult::data(json!({"0": {"title": "a"}, "1": {"title": "b"}, "id": 9}))
        );
    }

    #[test]
    fn bulk_create_without_server_id() {
        let create = action(ActionKind::Create, json!({"data": [{"title": "a"}]}));
        let resp = HttpResponse::from_json(json!([{"id": 1, "title": "a"}]));
        let result = normalize_response(resp, &create);
        assert_eq!(result.data, json!({"0": {"title": "a"}}));
    }

    #[test]
    fn other_kinds_pass_json_through() {
        let get_one = action(ActionKind::GetOne, json!({"id": 5}));
        let resp = HttpResponse::from_json(json!({"id": 5, "title": "x"}));
        assert_eq!(
            normalize_response(resp, &get_one),
            ProviderResult::data(json!({"id": 5, "title": "x"}))
        );

        let delete = action(ActionKind::Delete, json!({"id": 5}));
        let result = normalize_response(HttpResponse::default(), &delete);
        assert_eq!(result, ProviderResult::data(Value::Null));
    }

    #[test]
    fn total_is_omitted_when_serialized_without_it() {
        let json = serde_json::to_value(ProviderResult::data(json!({"id": 1}))).unwrap();
        assert_eq!(json, json!({"data": {"id": 1}}));
        let json = serde_json::to_value(ProviderResult::page(json!([]), Some(json!(3)))).unwrap();
        assert_eq!(json, json!({"data": [], "total": 3}));
    }
}

// ── Request builder ──
//
// Maps one action onto one HTTP request. Bulk update/delete never come
// through here; the dispatcher fans those out itself.

use crudbridge_api::{HttpMethod, HttpRequest};
use serde_json::{Value, json};

use crate::action::{
    Action, CreatePayload, GetListParams, GetManyReferenceParams, Identifier, join_ids,
};
use crate::error::CoreError;
use crate::filter::{CondOperator, FilterTerm, Operator, compose_filter, or_group};
use crate::query::RequestQueryBuilder;

/// Collection URL: `{api_url}/{resource}`.
pub fn collection_url(api_url: &str, resource: &str) -> String {
    format!("{api_url}/{resource}")
}

/// Record URL: `{api_url}/{resource}/{id}`.
pub fn record_url(api_url: &str, resource: &str, id: &Identifier) -> String {
    format!("{api_url}/{resource}/{id}")
}

/// Translate an action into the HTTP request the backend expects.
///
/// `api_url` must not end with `/`.
pub fn build_request(
    api_url: &str,
    resource: &str,
    action: &Action,
) -> Result<HttpRequest, CoreError> {
    let collection = collection_url(api_url, resource);

    let request = match action {
        Action::GetList(params) => HttpRequest::get(with_query(&collection, &list_query(params)?)),
        Action::GetOne(params) => HttpRequest::get(record_url(api_url, resource, &params.id)),
        Action::GetMany(params) => {
            let term = FilterTerm::new(
                "id",
                Operator::canonical(CondOperator::In),
                join_ids(&params.ids),
            );
            let query = RequestQueryBuilder::create().set_filter(&[term])?.query();
            HttpRequest::get(with_query(&collection, &query))
        }
        Action::GetManyReference(params) => {
            HttpRequest::get(with_query(&collection, &reference_query(params)?))
        }
        Action::Update(params) => HttpRequest::with_body(
            HttpMethod::Patch,
            record_url(api_url, resource, &params.id),
            params.data.to_string(),
        ),
        Action::Create(params) => match &params.data {
            CreatePayload::Bulk(items) => HttpRequest::with_body(
                HttpMethod::Post,
                format!("{collection}/bulk"),
                json!({ "bulk": items }).to_string(),
            ),
            CreatePayload::One(record) => HttpRequest::with_body(
                HttpMethod::Post,
                collection,
                Value::Object(record.clone()).to_string(),
            ),
        },
        Action::Delete(params) => HttpRequest::delete(record_url(api_url, resource, &params.id)),
        Action::UpdateMany(_) | Action::DeleteMany(_) => {
            return Err(CoreError::unsupported(action.kind().as_ref()));
        }
    };

    Ok(request)
}

fn with_query(url: &str, query: &str) -> String {
    format!("{url}?{query}")
}

/// `filter` or `or` group, then limit, page, sort, offset.
fn list_query(params: &GetListParams) -> Result<String, CoreError> {
    let pagination = params.pagination;
    let mut qb = RequestQueryBuilder::create();

    match or_group(&params.filter) {
        Some(group) => qb.set_or(&compose_filter(group))?,
        None => qb.set_filter(&compose_filter(&params.filter))?,
    };

    Ok(qb
        .set_limit(pagination.per_page)
        .set_page(pagination.page)
        .sort_by(params.sort.as_ref())?
        .set_offset(pagination.offset())
        .query())
}

/// Caller filter plus `target = id`, then sort, limit, offset.
fn reference_query(params: &GetManyReferenceParams) -> Result<String, CoreError> {
    let pagination = params.pagination;
    let mut terms = compose_filter(&params.filter);
    terms.push(FilterTerm::new(
        params.target.clone(),
        Operator::canonical(CondOperator::Equals),
        params.id.to_json(),
    ));

    Ok(RequestQueryBuilder::create()
        .set_filter(&terms)?
        .sort_by(params.sort.as_ref())?
        .set_limit(pagination.per_page)
        .set_offset(pagination.offset())
        .query())
}

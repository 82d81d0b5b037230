//! CRUD data provider for REST backends speaking the `@nestjsx/crud`
//! query convention.
//!
//! The crate is a two-way shape translator:
//!
//! - **Requests.** An [`Action`] (list, get-one, get-many, reference list,
//!   create, update, delete, plus bulk update/delete) becomes an
//!   [`HttpRequest`](crudbridge_api::HttpRequest). Filters go through
//!   [`compose_filter`], which reads the `field||operator` key convention,
//!   and [`RequestQueryBuilder`], which emits the backend's
//!   `filter[0]=field||$op||value` grammar.
//!
//! - **Responses.** [`normalize_response`] extracts `{ data, total }` for
//!   list kinds, merges the server id into created records, and passes
//!   everything else through as [`ProviderResult`].
//!
//! - **Dispatch.** [`DataProvider`] ties both together over any
//!   [`HttpClient`](crudbridge_api::HttpClient). Bulk update and delete fan
//!   out one request per id concurrently and join the results in id order.
//!
//! Nothing here retries, caches, or authenticates; those belong to the
//! HTTP client handed to the provider.

pub mod action;
pub mod error;
pub mod filter;
pub mod provider;
pub mod query;
pub mod request;
pub mod response;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{
    Action, ActionKind, CreateParams, CreatePayload, DeleteManyParams, DeleteParams,
    GetListParams, GetManyParams, GetManyReferenceParams, GetOneParams, Identifier, Pagination,
    Sort, SortOrder, UpdateManyParams, UpdateParams,
};
pub use error::CoreError;
pub use filter::{CondOperator, FilterTerm, Operator, compose_filter};
pub use provider::DataProvider;
pub use query::RequestQueryBuilder;
pub use request::build_request;
pub use response::{ProviderResult, normalize_response};

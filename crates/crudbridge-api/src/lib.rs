// crudbridge-api: HTTP collaborator for the crudbridge data provider
//
// Plain-data request/response types, the `HttpClient` seam the provider
// calls through, and a reqwest-backed `FetchClient` with fetch-json
// semantics (JSON in, JSON out, non-2xx is an error).

pub mod client;
pub mod error;
pub mod http;
pub mod transport;

pub use client::{FetchClient, HttpClient};
pub use error::Error;
pub use http::{HeaderMap, HttpMethod, HttpRequest, HttpResponse};
pub use transport::{TlsMode, TransportConfig};

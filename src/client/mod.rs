//! REST plumbing: transports, cache busting and per-resource clients

pub mod cache_buster;
pub mod http;
pub mod resource;
pub mod transport;

pub use cache_buster::CacheBuster;
pub use http::HttpTransport;
pub use resource::{Page, ResourceClient, parse_total_count};
pub use transport::{ApiRequest, ApiResponse, Method, TOTAL_COUNT_HEADER, Transport};

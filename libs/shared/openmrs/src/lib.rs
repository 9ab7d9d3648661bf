pub mod cache;
pub mod client;
pub mod fetcher;

pub use cache::{QueryClient, QueryObserver, QueryResult};
pub use client::OpenmrsClient;
pub use fetcher::{FetchResponse, Fetcher};

// onevisitor-api: Async Rust client for the OneVisitor REST backend
//
// Bearer-token auth with a single refresh-and-retry on HTTP 401,
// tenant scoping through `X-Tenant-ID`, and the multipart kiosk check-in.

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

mod permissions;
mod sites;
mod tenants;
mod users;
mod visitors;

pub use auth::{MemoryTokenStore, TokenStore};
pub use client::ApiClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{CheckInForm, PhotoPart};

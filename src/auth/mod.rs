//! JWT authentication with server-side revocation.
//!
//! Dual-token system: short-lived access tokens (stateless, authority in the
//! claims) and long-lived refresh tokens (one per member, tracked in the
//! session table). Logout blacklists both tokens for their residual
//! lifetimes, so a structurally valid token is still rejected after
//! revocation.

mod error;
mod identity;
mod middleware;
mod policy;
mod service;

pub use error::AuthError;
pub use identity::{Auth, AuthenticatedMember, BEARER_PREFIX, bearer_token};
pub use middleware::{AuthState, authenticate};
pub use policy::{Access, RoutePolicy, route_access};
pub use service::{TokenPair, TokenService};

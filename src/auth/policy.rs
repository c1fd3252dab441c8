//! Static route-permission table.
//!
//! A data-driven allow-list keyed by (method, path pattern), consulted once
//! per request by the authentication filter. Keeping the policy in one table
//! makes it auditable and testable independently of the filter.

use axum::http::Method;

/// Who may reach a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No identity required; the request skips the filter entirely
    Public,
    /// A valid access token is required
    Member,
}

/// One entry in the route-permission table. Patterns use `{param}` for a
/// single wildcard segment.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub method: Method,
    pub pattern: &'static str,
    pub access: Access,
}

/// Routes reachable without identity. Everything not listed here requires a
/// valid access token.
const PUBLIC_ROUTES: &[RoutePolicy] = &[
    RoutePolicy {
        method: Method::POST,
        pattern: "/auth/signup",
        access: Access::Public,
    },
    RoutePolicy {
        method: Method::POST,
        pattern: "/auth/login",
        access: Access::Public,
    },
    // Reissue carries a refresh token in the Authorization header; the
    // handler verifies it itself, so the filter must not treat it as an
    // access token.
    RoutePolicy {
        method: Method::POST,
        pattern: "/auth/reissue",
        access: Access::Public,
    },
    RoutePolicy {
        method: Method::GET,
        pattern: "/posts",
        access: Access::Public,
    },
    RoutePolicy {
        method: Method::GET,
        pattern: "/posts/{uuid}",
        access: Access::Public,
    },
    RoutePolicy {
        method: Method::GET,
        pattern: "/posts/{uuid}/comments",
        access: Access::Public,
    },
];

/// Decide the access level for a request. Consulted once per request.
pub fn route_access(method: &Method, path: &str) -> Access {
    for entry in PUBLIC_ROUTES {
        if entry.method == *method && pattern_matches(entry.pattern, path) {
            return entry.access;
        }
    }
    Access::Member
}

/// Segment-wise pattern match; `{param}` matches exactly one segment.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let path = path.strip_suffix('/').unwrap_or(path);
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (None, Some(_)) | (Some(_), None) => return false,
            (Some(p), Some(s)) => {
                let is_param = p.starts_with('{') && p.ends_with('}');
                if !is_param && p != s {
                    return false;
                }
                if is_param && s.is_empty() {
                    return false;
                }
            }
        }
    }
}

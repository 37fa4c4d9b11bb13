//! Route access rules.
//!
//! An ordered table of `(methods, path pattern) -> access` rules. The auth
//! gate evaluates the first rule that matches a request; unmatched `/api/**`
//! paths require authentication and everything else is public.
//!
//! Patterns are `/`-separated: `*` matches exactly one segment and a trailing
//! `**` matches any remaining segments (including none).

use axum::http::Method;
use modish_core::Role;

/// What a route requires from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Anyone, authenticated or not.
    Public,
    /// Any authenticated caller.
    Authenticated,
    /// An authenticated caller with exactly this role.
    Role(Role),
}

/// HTTP methods a rule applies to.
#[derive(Debug, Clone, Copy)]
pub enum Methods {
    Any,
    Only(&'static [&'static str]),
}

impl Methods {
    fn contains(self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(methods) => methods.contains(&method.as_str()),
        }
    }
}

/// One entry of the rule table.
#[derive(Debug, Clone, Copy)]
pub struct AccessRule {
    pub methods: Methods,
    pub patterns: &'static [&'static str],
    pub access: Access,
}

impl AccessRule {
    fn matches(&self, method: &Method, path: &str) -> bool {
        self.methods.contains(method) && self.patterns.iter().any(|p| path_matches(p, path))
    }
}

const GET: Methods = Methods::Only(&["GET"]);
const POST: Methods = Methods::Only(&["POST"]);
const PUT: Methods = Methods::Only(&["PUT"]);
const ADMIN: Access = Access::Role(Role::Admin);

/// The rule table, first match wins.
pub static RULES: &[AccessRule] = &[
    AccessRule {
        methods: Methods::Any,
        patterns: &["/api/admin/**"],
        access: ADMIN,
    },
    AccessRule {
        methods: GET,
        patterns: &["/api/banner/admin"],
        access: ADMIN,
    },
    AccessRule {
        methods: Methods::Only(&["POST", "PUT", "DELETE"]),
        patterns: &["/api/banner/**"],
        access: ADMIN,
    },
    AccessRule {
        methods: Methods::Only(&["GET", "PUT"]),
        patterns: &["/api/auth/me"],
        access: Access::Authenticated,
    },
    AccessRule {
        methods: PUT,
        patterns: &["/api/auth/password"],
        access: Access::Authenticated,
    },
    AccessRule {
        methods: Methods::Any,
        patterns: &["/api/auth/**"],
        access: Access::Public,
    },
    AccessRule {
        methods: GET,
        patterns: &["/api/item/favorite", "/api/item/cart"],
        access: Access::Authenticated,
    },
    AccessRule {
        methods: GET,
        patterns: &["/api/item", "/api/item/*"],
        access: Access::Public,
    },
    AccessRule {
        methods: GET,
        patterns: &[
            "/api/board/list",
            "/api/board/*",
            "/api/board/file/*",
            "/api/board/image/*",
        ],
        access: Access::Public,
    },
    AccessRule {
        methods: GET,
        patterns: &["/api/comments/board/*"],
        access: Access::Public,
    },
    AccessRule {
        methods: GET,
        patterns: &["/api/review/*"],
        access: Access::Public,
    },
    AccessRule {
        methods: GET,
        patterns: &["/api/banner", "/api/banner/*"],
        access: Access::Public,
    },
    AccessRule {
        methods: POST,
        patterns: &["/api/ai/proxy"],
        access: Access::Public,
    },
    AccessRule {
        methods: Methods::Any,
        patterns: &["/api/**"],
        access: Access::Authenticated,
    },
];

/// Access required for a request.
#[must_use]
pub fn required_access(method: &Method, path: &str) -> Access {
    RULES
        .iter()
        .find(|rule| rule.matches(method, path))
        .map_or(Access::Public, |rule| rule.access)
}

/// Match `path` against a pattern (see module docs).
fn path_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = segments(pattern);
    let mut path_segments = segments(path);

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (Some("**"), _) => return true,
            (Some("*"), Some(_)) => {}
            (Some(expected), Some(actual)) if expected == actual => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matches() {
        assert!(path_matches("/api/item", "/api/item"));
        assert!(path_matches("/api/item", "/api/item/"));
        assert!(!path_matches("/api/item", "/api/item/3"));

        assert!(path_matches("/api/item/*", "/api/item/3"));
        assert!(!path_matches("/api/item/*", "/api/item"));
        assert!(!path_matches("/api/item/*", "/api/item/cart/3"));

        assert!(path_matches("/api/admin/**", "/api/admin"));
        assert!(path_matches("/api/admin/**", "/api/admin/item/5"));
        assert!(!path_matches("/api/admin/**", "/api/administrator"));
    }

    #[test]
    fn test_admin_routes_require_admin_role() {
        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
            assert_eq!(
                required_access(&method, "/api/admin/item/1"),
                Access::Role(Role::Admin)
            );
        }
        assert_eq!(
            required_access(&Method::GET, "/api/banner/admin"),
            Access::Role(Role::Admin)
        );
        assert_eq!(
            required_access(&Method::DELETE, "/api/banner/4"),
            Access::Role(Role::Admin)
        );
    }

    #[test]
    fn test_auth_routes() {
        assert_eq!(
            required_access(&Method::POST, "/api/auth/login"),
            Access::Public
        );
        assert_eq!(
            required_access(&Method::GET, "/api/auth/check-email"),
            Access::Public
        );
        assert_eq!(
            required_access(&Method::GET, "/api/auth/me"),
            Access::Authenticated
        );
        assert_eq!(
            required_access(&Method::PUT, "/api/auth/password"),
            Access::Authenticated
        );
    }

    #[test]
    fn test_catalog_routes() {
        assert_eq!(required_access(&Method::GET, "/api/item"), Access::Public);
        assert_eq!(required_access(&Method::GET, "/api/item/12"), Access::Public);
        assert_eq!(
            required_access(&Method::GET, "/api/item/favorite"),
            Access::Authenticated
        );
        assert_eq!(
            required_access(&Method::GET, "/api/item/cart"),
            Access::Authenticated
        );
        assert_eq!(
            required_access(&Method::POST, "/api/item/cart/12"),
            Access::Authenticated
        );
    }

    #[test]
    fn test_board_and_public_reads() {
        assert_eq!(
            required_access(&Method::GET, "/api/board/list"),
            Access::Public
        );
        assert_eq!(required_access(&Method::GET, "/api/board/7"), Access::Public);
        assert_eq!(
            required_access(&Method::GET, "/api/board/file/3"),
            Access::Public
        );
        assert_eq!(
            required_access(&Method::POST, "/api/board/write"),
            Access::Authenticated
        );
        assert_eq!(
            required_access(&Method::DELETE, "/api/board/7"),
            Access::Authenticated
        );
        assert_eq!(
            required_access(&Method::GET, "/api/comments/board/7"),
            Access::Public
        );
        assert_eq!(
            required_access(&Method::GET, "/api/review/2"),
            Access::Public
        );
        assert_eq!(
            required_access(&Method::POST, "/api/review/2"),
            Access::Authenticated
        );
        assert_eq!(
            required_access(&Method::GET, "/api/banner"),
            Access::Public
        );
        assert_eq!(
            required_access(&Method::POST, "/api/ai/proxy"),
            Access::Public
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(
            required_access(&Method::GET, "/api/order"),
            Access::Authenticated
        );
        assert_eq!(
            required_access(&Method::POST, "/api/payment/confirm"),
            Access::Authenticated
        );
        assert_eq!(
            required_access(&Method::GET, "/api/unknown"),
            Access::Authenticated
        );
        assert_eq!(required_access(&Method::GET, "/health"), Access::Public);
        assert_eq!(
            required_access(&Method::GET, "/product/abc.png"),
            Access::Public
        );
        assert_eq!(
            required_access(&Method::GET, "/oauth2/authorization/google"),
            Access::Public
        );
    }
}

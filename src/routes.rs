//! Route table for the reading site and the dashboards
//!
//! Patterns use `:name` segments for parameters. Paths are matched after
//! dropping any query string, fragment and trailing slash.

use crate::guard::RouteAuthorizationRequest;
use crate::models::Role;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

impl Access {
    /// `None` for public routes, which skip the guard entirely
    pub fn authorization_request(&self) -> Option<RouteAuthorizationRequest> {
        match self {
            Access::Public => None,
            Access::Authenticated => Some(RouteAuthorizationRequest::authenticated()),
            Access::Role(role) => Some(RouteAuthorizationRequest::role(*role)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub name: &'static str,
    pub pattern: &'static str,
    pub access: Access,
}

const fn route(name: &'static str, pattern: &'static str, access: Access) -> RouteEntry {
    RouteEntry {
        name,
        pattern,
        access,
    }
}

pub static ROUTES: &[RouteEntry] = &[
    route("home", "/", Access::Public),
    route("search", "/search", Access::Public),
    route("manga_detail", "/manga/:id", Access::Public),
    route("reader", "/manga/:id/chapter/:chapter_id", Access::Public),
    route("login", "/login", Access::Public),
    route("register", "/register", Access::Public),
    route("profile", "/profile", Access::Authenticated),
    route("following", "/following", Access::Authenticated),
    route("history", "/history", Access::Authenticated),
    route("uploader_mangas", "/uploader/mangas", Access::Role(Role::Uploader)),
    route("uploader_manga_new", "/uploader/mangas/new", Access::Role(Role::Uploader)),
    route("uploader_manga_edit", "/uploader/mangas/:id/edit", Access::Role(Role::Uploader)),
    route("uploader_chapters", "/uploader/mangas/:id/chapters", Access::Role(Role::Uploader)),
    route("uploader_translations", "/uploader/translations", Access::Role(Role::Uploader)),
    route("admin_overview", "/admin/overview", Access::Role(Role::Admin)),
    route("admin_mangas", "/admin/mangas", Access::Role(Role::Admin)),
    route("admin_users", "/admin/users", Access::Role(Role::Admin)),
    route("admin_reports", "/admin/reports", Access::Role(Role::Admin)),
    route("admin_statistics", "/admin/statistics", Access::Role(Role::Admin)),
    route("admin_translations", "/admin/translations", Access::Role(Role::Admin)),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub entry: &'static RouteEntry,
    pub params: HashMap<String, String>,
}

fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn match_pattern(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_segments: Vec<&str> = segments(pattern).collect();
    let path_segments: Vec<&str> = segments(path).collect();
    if pattern_segments.len() != path_segments.len() {
        return None;
    }

    let mut params = HashMap::new();
    for (expected, actual) in pattern_segments.iter().zip(path_segments.iter()) {
        if let Some(name) = expected.strip_prefix(':') {
            params.insert(name.to_string(), (*actual).to_string());
        } else if expected != actual {
            return None;
        }
    }
    Some(params)
}

/// Find the route for `path`. Literal patterns win over parameterised ones.
pub fn lookup(path: &str) -> Option<RouteMatch> {
    let path = normalize_path(path);
    let mut best: Option<(usize, RouteMatch)> = None;

    for entry in ROUTES {
        if let Some(params) = match_pattern(entry.pattern, path) {
            let literal = params.is_empty() as usize;
            let replace = match &best {
                Some((score, _)) => literal > *score,
                None => true,
            };
            if replace {
                best = Some((literal, RouteMatch { entry, params }));
            }
        }
    }

    best.map(|(_, m)| m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_routes() {
        assert_eq!(lookup("/").unwrap().entry.name, "home");
        assert_eq!(lookup("").unwrap().entry.name, "home");
        assert_eq!(lookup("/admin/overview/").unwrap().entry.name, "admin_overview");
        assert_eq!(lookup("/search?q=one+piece").unwrap().entry.name, "search");
    }

    #[test]
    fn test_parameterised_routes() {
        let m = lookup("/manga/42/chapter/7#page-3").unwrap();
        assert_eq!(m.entry.name, "reader");
        assert_eq!(m.params["id"], "42");
        assert_eq!(m.params["chapter_id"], "7");

        let m = lookup("/uploader/mangas/9/edit").unwrap();
        assert_eq!(m.entry.name, "uploader_manga_edit");
        assert_eq!(m.entry.access, Access::Role(Role::Uploader));
    }

    #[test]
    fn test_literal_beats_parameter() {
        let m = lookup("/uploader/mangas/new").unwrap();
        assert_eq!(m.entry.name, "uploader_manga_new");
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_unknown_path() {
        assert!(lookup("/admin").is_none());
        assert!(lookup("/manga/1/chapter").is_none());
    }

    #[test]
    fn test_access_requests() {
        assert_eq!(Access::Public.authorization_request(), None);
        assert_eq!(
            Access::Role(Role::Admin).authorization_request(),
            Some(RouteAuthorizationRequest::role(Role::Admin))
        );
    }
}

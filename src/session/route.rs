//! Hash routes: `#/` (post list), `#/new` and `#/edit/<encoded id>`.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Route {
    #[default]
    List,
    New,
    Edit(String),
}

impl Route {
    /// Parse a location hash. Anything unrecognized is the list.
    pub fn parse(hash: &str) -> Self {
        if hash.starts_with("#/new") {
            return Route::New;
        }
        if let Some(encoded) = hash.strip_prefix("#/edit/") {
            let id = urlencoding::decode(encoded)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| encoded.to_string());
            return Route::Edit(id);
        }
        Route::List
    }

    pub fn to_hash(&self) -> String {
        match self {
            Route::List => "#/".to_string(),
            Route::New => "#/new".to_string(),
            Route::Edit(id) => format!("#/edit/{}", urlencoding::encode(id)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_routes() {
        assert_eq!(Route::parse(""), Route::List);
        assert_eq!(Route::parse("#/"), Route::List);
        assert_eq!(Route::parse("#/new"), Route::New);
        assert_eq!(
            Route::parse("#/edit/drafts%2Fhello.md"),
            Route::Edit("drafts/hello.md".to_string())
        );
        assert_eq!(Route::parse("#/unknown"), Route::List);
    }

    #[test]
    fn test_edit_hash_encodes_id() {
        let route = Route::Edit("posts/2024-01-01-a b.md".to_string());
        assert_eq!(route.to_hash(), "#/edit/posts%2F2024-01-01-a%20b.md");
        assert_eq!(Route::parse(&route.to_hash()), route);
    }
}

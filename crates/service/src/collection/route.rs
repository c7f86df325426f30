use std::borrow::Cow;

use crate::errors::CollectionError;

/// Collection name and optional id token taken from a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath {
    pub collection: String,
    pub id_token: Option<String>,
}

impl RoutePath {
    /// Percent-decode, trim `/` on both ends, split on `/`.
    ///
    /// Segment 0 is the collection (empty for `/`), segment 1 the id token;
    /// anything after that is ignored.
    pub fn parse(path: &str) -> Self {
        let decoded = urlencoding::decode(path).unwrap_or(Cow::Borrowed(path));
        let mut segments = decoded.trim_matches('/').split('/');
        let collection = segments.next().unwrap_or("").to_string();
        let id_token = segments.next().map(str::to_string);
        Self { collection, id_token }
    }
}

/// Identifier tokens are base-10 integers with an optional sign.
pub fn parse_id(token: &str) -> Result<i64, CollectionError> {
    token.parse().map_err(|_| CollectionError::InvalidId)
}

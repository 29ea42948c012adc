//! Entity API descriptors and URL construction.

use url::Url;

use crate::error::Error;

/// Path prefix of every entity endpoint.
pub const BASE_PATH: &str = "api/atlas/v2";

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// One endpoint: method, path template and its nominal success status.
///
/// Path templates use `{name}` for identifier segments. Any 2xx reply is
/// accepted as success; `expected_status` is what the service normally
/// answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiInfo {
    /// Request method.
    pub method: Method,
    /// Path template relative to [`BASE_PATH`].
    pub path: &'static str,
    /// Nominal status of a successful response.
    pub expected_status: u16,
}

impl ApiInfo {
    /// Describe an endpoint.
    pub const fn new(method: Method, path: &'static str, expected_status: u16) -> Self {
        Self {
            method,
            path,
            expected_status,
        }
    }

    /// Build the request URL under `base`.
    ///
    /// `params` fill the template's `{..}` segments in order and are
    /// percent-encoded as single path segments; `query` pairs are appended
    /// in order, so repeated keys are kept.
    pub fn url(&self, base: &Url, params: &[&str], query: &[(String, String)]) -> Result<Url, Error> {
        let mut url = base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidArgument(format!("'{}' cannot be a base URL", base)))?;
            segments.pop_if_empty();
            segments.extend(BASE_PATH.split('/'));

            let mut params = params.iter();
            for part in self.path.split('/') {
                if part.starts_with('{') && part.ends_with('}') {
                    let value = params.next().ok_or_else(|| {
                        Error::InvalidArgument(format!("missing {} for {}", part, self.path))
                    })?;
                    if value.is_empty() {
                        return Err(Error::InvalidArgument(format!("{} must not be empty", part)));
                    }
                    segments.push(value);
                } else {
                    segments.push(part);
                }
            }
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}

/// Fetch one entity.
pub const GET_ENTITY_BY_GUID: ApiInfo = ApiInfo::new(Method::Get, "entity/guid/{guid}", 200);
/// Create one entity.
pub const CREATE_ENTITY: ApiInfo = ApiInfo::new(Method::Post, "entity", 200);
/// Replace the attributes of one entity.
pub const UPDATE_ENTITY: ApiInfo = ApiInfo::new(Method::Put, "entity/guid/{guid}", 200);
/// Delete one entity.
pub const DELETE_ENTITY_BY_GUID: ApiInfo = ApiInfo::new(Method::Delete, "entity/guid/{guid}", 200);

/// List the classifications of an entity.
pub const GET_CLASSIFICATIONS: ApiInfo =
    ApiInfo::new(Method::Get, "entity/guid/{guid}/classifications", 200);
/// Attach classifications to an entity.
pub const ADD_CLASSIFICATIONS: ApiInfo =
    ApiInfo::new(Method::Post, "entity/guid/{guid}/classifications", 200);
/// Update classifications attached to an entity.
pub const UPDATE_CLASSIFICATIONS: ApiInfo =
    ApiInfo::new(Method::Put, "entity/guid/{guid}/classifications", 200);
/// Detach every classification; same path as the listing.
pub const DELETE_CLASSIFICATIONS: ApiInfo =
    ApiInfo::new(Method::Delete, "entity/guid/{guid}/classifications", 200);
/// Detach one classification by name.
pub const DELETE_CLASSIFICATION: ApiInfo = ApiInfo::new(
    Method::Delete,
    "entity/guid/{guid}/classification/{classification}",
    200,
);

/// Fetch several entities; guids go in repeated `guid` query pairs.
pub const GET_ENTITIES_BY_GUIDS: ApiInfo = ApiInfo::new(Method::Get, "entities/guids", 200);
/// Create several entities.
pub const CREATE_ENTITIES: ApiInfo = ApiInfo::new(Method::Post, "entities", 200);
/// Update several entities.
pub const UPDATE_ENTITIES: ApiInfo = ApiInfo::new(Method::Put, "entities", 200);
/// Delete several entities; guids go in repeated `guid` query pairs.
pub const DELETE_ENTITIES_BY_GUIDS: ApiInfo = ApiInfo::new(Method::Delete, "entities/guids", 200);
/// Search entities; filter params become query pairs.
pub const SEARCH_ENTITIES: ApiInfo = ApiInfo::new(Method::Get, "entities", 200);

/// Query pairs selecting `guids`, one `guid=` pair each.
pub fn guid_query(guids: &[String]) -> Vec<(String, String)> {
    guids.iter().map(|g| ("guid".to_string(), g.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:21000/").unwrap()
    }

    #[test]
    fn test_simple_path() {
        let url = CREATE_ENTITY.url(&base(), &[], &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:21000/api/atlas/v2/entity");
    }

    #[test]
    fn test_identifier_is_one_encoded_segment() {
        let url = GET_ENTITY_BY_GUID.url(&base(), &["a b/c"], &[]).unwrap();
        assert_eq!(url.path(), "/api/atlas/v2/entity/guid/a%20b%2Fc");
    }

    #[test]
    fn test_base_with_path_prefix() {
        let base = Url::parse("https://gateway.example/catalog").unwrap();
        let url = DELETE_CLASSIFICATION.url(&base, &["g-1", "PII"], &[]).unwrap();
        assert_eq!(
            url.path(),
            "/catalog/api/atlas/v2/entity/guid/g-1/classification/PII"
        );
    }

    #[test]
    fn test_delete_all_uses_list_path() {
        let list = GET_CLASSIFICATIONS.url(&base(), &["g-1"], &[]).unwrap();
        let delete = DELETE_CLASSIFICATIONS.url(&base(), &["g-1"], &[]).unwrap();
        assert_eq!(list, delete);
        assert_ne!(GET_CLASSIFICATIONS.method, DELETE_CLASSIFICATIONS.method);
    }

    #[test]
    fn test_repeated_guid_query() {
        let query = guid_query(&["g1".to_string(), "g 2".to_string()]);
        let url = GET_ENTITIES_BY_GUIDS.url(&base(), &[], &query).unwrap();
        assert_eq!(url.query(), Some("guid=g1&guid=g+2"));
    }

    #[test]
    fn test_missing_or_empty_identifier() {
        assert!(matches!(
            GET_ENTITY_BY_GUID.url(&base(), &[], &[]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            GET_ENTITY_BY_GUID.url(&base(), &[""], &[]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_cannot_be_base() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        assert!(CREATE_ENTITY.url(&base, &[], &[]).is_err());
    }
}

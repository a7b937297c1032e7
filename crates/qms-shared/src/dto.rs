//! Data Transfer Objects - request/response types for the API.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of the `login` endpoint.
///
/// Both fields are optional on the wire; the session store decides what a
/// usable response is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Pagination and search parameters of list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListParams {
    pub search: String,
    pub page: u32,
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
            per_page: 25,
        }
    }
}

impl ListParams {
    pub fn page(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Query pairs in the order the backend documents them.
    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            ("search".to_string(), self.search.clone()),
            ("per_page".to_string(), self.per_page.to_string()),
            ("page".to_string(), self.page.to_string()),
        ]
    }
}

/// One page of records plus the totals needed by pagination controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub current_page: u32,
    pub per_page: u32,
    pub last_page: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("Unrecognized list payload: {0}")]
pub struct PageError(String);

impl<T: DeserializeOwned> Page<T> {
    /// Read a page out of a list response.
    ///
    /// Accepts the paginated envelope `{ data: { data: [...], total, ... } }`,
    /// an unpaginated `{ data: [...] }` and a bare array. Unpaginated lists
    /// are reported as a single page holding every record.
    pub fn from_response(value: &Value) -> Result<Self, PageError> {
        let data = value.get("data").unwrap_or(value);

        if let Some(records) = data.get("data").and_then(Value::as_array) {
            let items = Self::items(records)?;
            let total = data
                .get("total")
                .and_then(Value::as_u64)
                .unwrap_or(items.len() as u64);
            let current_page = Self::number(data, "current_page").unwrap_or(1);
            let per_page = Self::number(data, "per_page").unwrap_or_else(|| Self::count(&items));
            let last_page = Self::number(data, "last_page").unwrap_or(1);
            return Ok(Self {
                items,
                total,
                current_page,
                per_page,
                last_page,
            });
        }

        match data.as_array() {
            Some(records) => {
                let items = Self::items(records)?;
                Ok(Self {
                    total: items.len() as u64,
                    per_page: Self::count(&items),
                    current_page: 1,
                    last_page: 1,
                    items,
                })
            }
            None => Err(PageError("expected a list of records".to_string())),
        }
    }

    fn items(records: &[Value]) -> Result<Vec<T>, PageError> {
        records
            .iter()
            .map(|r| serde_json::from_value(r.clone()).map_err(|e| PageError(e.to_string())))
            .collect()
    }

    fn number(data: &Value, key: &str) -> Option<u32> {
        let field = data.get(key)?;
        field
            .as_u64()
            .or_else(|| field.as_str().and_then(|s| s.parse().ok()))
            .and_then(|n| u32::try_from(n).ok())
    }

    fn count(items: &[T]) -> u32 {
        u32::try_from(items.len()).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paginated_envelope() {
        let body = json!({
            "status": true,
            "data": {
                "data": [{"id": 1}, {"id": 2}],
                "total": 140,
                "current_page": 1,
                "per_page": "25",
                "last_page": 6
            }
        });

        let page: Page<Value> = Page::from_response(&body).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 140);
        assert_eq!(page.per_page, 25);
        assert_eq!(page.last_page, 6);
    }

    #[test]
    fn test_out_of_range_page_numbers_fall_back() {
        let body = json!({
            "data": {
                "data": [{"id": 1}],
                "current_page": 4_294_967_297u64,
                "per_page": "99999999999",
                "last_page": 4_294_967_296u64
            }
        });

        let page: Page<Value> = Page::from_response(&body).unwrap();
        assert_eq!(page.current_page, 1);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn test_unpaginated_list() {
        let body = json!({"data": [{"id": 1}, {"id": 2}, {"id": 3}]});

        let page: Page<Value> = Page::from_response(&body).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn test_object_is_not_a_page() {
        let body = json!({"data": {"id": 1}});
        assert!(Page::<Value>::from_response(&body).is_err());
    }

    #[test]
    fn test_list_params_query_order() {
        let params = ListParams::page(1, 25).with_search("rahul");
        let keys: Vec<_> = params.to_query().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["search", "per_page", "page"]);
    }
}

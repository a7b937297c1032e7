use std::fmt;

use serde::Serialize;

/// Identity of one cache entry: resource, endpoint and the serialized arguments.
///
/// Two calls with equal arguments always produce equal keys because the
/// arguments are serialized field by field in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    resource: &'static str,
    endpoint: &'static str,
    args: String,
}

impl CacheKey {
    pub fn new<A: Serialize + ?Sized>(resource: &'static str, endpoint: &'static str, args: &A) -> Self {
        let args = match serde_json::to_string(args) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(resource, endpoint, error = %e, "Query arguments are not serializable");
                String::new()
            }
        };
        Self {
            resource,
            endpoint,
            args,
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    /// Arguments as JSON text.
    pub fn args(&self) -> &str {
        &self.args
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.resource, self.endpoint, self.args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qms_shared::ListParams;

    #[test]
    fn test_equal_arguments_give_equal_keys() {
        let a = CacheKey::new("users", "getUsers", &ListParams::default());
        let b = CacheKey::new("users", "getUsers", &ListParams::page(1, 25));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), r#"users.getUsers({"search":"","page":1,"per_page":25})"#);
    }

    #[test]
    fn test_arguments_and_endpoint_distinguish_keys() {
        let page_one = CacheKey::new("users", "getUsers", &ListParams::page(1, 25));
        let page_two = CacheKey::new("users", "getUsers", &ListParams::page(2, 25));
        let details = CacheKey::new("users", "getUsersDetails", &7u64);

        assert_ne!(page_one, page_two);
        assert_ne!(page_one, details);
        assert_eq!(details.args(), "7");
    }
}

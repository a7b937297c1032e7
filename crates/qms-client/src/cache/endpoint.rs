//! Endpoint declarations.
//!
//! Every resource module declares its endpoints as constants of these types.
//! The request builder is a plain function pointer so a declaration stays a
//! pure description of the call, with no captured state.

use std::fmt;

use serde::Serialize;

use qms_core::domain::{HttpRequest, Tag};

use super::CacheKey;

/// A cached read, keyed by its arguments.
pub struct QueryEndpoint<A> {
    pub resource: &'static str,
    pub name: &'static str,
    build: fn(&A) -> HttpRequest,
    /// Tags attached to the entry this query fills.
    pub provides: &'static [Tag],
}

impl<A> QueryEndpoint<A> {
    pub const fn new(
        resource: &'static str,
        name: &'static str,
        build: fn(&A) -> HttpRequest,
        provides: &'static [Tag],
    ) -> Self {
        Self {
            resource,
            name,
            build,
            provides,
        }
    }

    pub fn request(&self, args: &A) -> HttpRequest {
        (self.build)(args)
    }
}

impl<A: Serialize> QueryEndpoint<A> {
    pub fn key(&self, args: &A) -> CacheKey {
        CacheKey::new(self.resource, self.name, args)
    }
}

// Manual impls: a derive would require `A: Clone`.
impl<A> Clone for QueryEndpoint<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for QueryEndpoint<A> {}

impl<A> fmt::Debug for QueryEndpoint<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEndpoint")
            .field("resource", &self.resource)
            .field("name", &self.name)
            .field("provides", &self.provides)
            .finish()
    }
}

/// A write. Its result is never cached; on success it invalidates tags.
pub struct MutationEndpoint<A> {
    pub resource: &'static str,
    pub name: &'static str,
    build: fn(&A) -> HttpRequest,
    pub invalidates: &'static [Tag],
}

impl<A> MutationEndpoint<A> {
    pub const fn new(
        resource: &'static str,
        name: &'static str,
        build: fn(&A) -> HttpRequest,
        invalidates: &'static [Tag],
    ) -> Self {
        Self {
            resource,
            name,
            build,
            invalidates,
        }
    }

    pub fn request(&self, args: &A) -> HttpRequest {
        (self.build)(args)
    }
}

impl<A> Clone for MutationEndpoint<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A> Copy for MutationEndpoint<A> {}

impl<A> fmt::Debug for MutationEndpoint<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationEndpoint")
            .field("resource", &self.resource)
            .field("name", &self.name)
            .field("invalidates", &self.invalidates)
            .finish()
    }
}

//! Domain types - the session model and the request description.

mod request;
mod session;
mod tag;

pub use request::{FilePart, FormData, FormPart, FormValue, HttpMethod, HttpRequest, RequestBody};
pub use session::{Credentials, Identity, Session};
pub use tag::Tag;

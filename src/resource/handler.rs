//! Handler capability served by routes.

use std::fmt;

use crate::resource::error::ResourceError;
use crate::resource::request::{Request, Response};

/// A resource that can serve requests routed to its prefix.
pub trait Handler: Send + Sync {
    /// Handle one request, returning a response or a typed failure.
    fn handle(&self, request: Request) -> Result<Response, ResourceError>;
}

/// Handler backed by a closure.
pub struct FnHandler<F> {
    f: F,
}

impl<F> Handler for FnHandler<F>
where
    F: Fn(Request) -> Result<Response, ResourceError> + Send + Sync,
{
    fn handle(&self, request: Request) -> Result<Response, ResourceError> {
        (self.f)(request)
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Wrap a closure as a [`Handler`].
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Result<Response, ResourceError> + Send + Sync,
{
    FnHandler { f }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Method;
    use serde_json::json;

    #[test]
    fn test_handler_fn() {
        let h = handler_fn(|req: Request| Ok(json!({ "id": req.id() })));
        let res = h.handle(Request::new(Method::Read, Some("/a/b"))).unwrap();
        assert_eq!(res["id"], "/a/b");
    }
}

//! Server-side resource id generation.
//!
//! # Design Decisions
//! - Only `create` into a collection (id ending with the separator) gets an id
//! - Ids are random UUID v4, never sequential, so concurrent creators cannot collide

use uuid::Uuid;

use crate::resource::{Method, Request, ID_SEPARATOR};

/// Append a generated id to a collection-style create. Returns the new id if one was assigned.
pub fn assign_id(method: Method, request: &mut Request) -> Option<String> {
    if method != Method::Create {
        return None;
    }
    let collection = request.id().filter(|id| id.ends_with(ID_SEPARATOR))?;
    let id = format!("{}{}", collection, Uuid::new_v4());
    request.set_id(id.clone());
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_into_collection() {
        let mut request = Request::new(Method::Create, Some("/users/"));
        let id = assign_id(Method::Create, &mut request).unwrap();

        assert!(id.starts_with("/users/"));
        assert!(Uuid::parse_str(&id["/users/".len()..]).is_ok());
        assert_eq!(request.id(), Some(id.as_str()));
    }

    #[test]
    fn test_explicit_id_kept() {
        let mut request = Request::new(Method::Create, Some("/users/bjensen"));
        assert_eq!(assign_id(Method::Create, &mut request), None);
        assert_eq!(request.id(), Some("/users/bjensen"));

        let mut request = Request::new(Method::Create, None);
        assert_eq!(assign_id(Method::Create, &mut request), None);
    }

    #[test]
    fn test_only_create() {
        let mut request = Request::new(Method::Update, Some("/users/"));
        assert_eq!(assign_id(Method::Update, &mut request), None);
        assert_eq!(request.id(), Some("/users/"));
    }
}

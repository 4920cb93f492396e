//! Request attributes.
//!
//! # Responsibilities
//! - Carry out-of-band string attributes on a request (set by routing,
//!   read by the dispatch stage)
//! - Expose them through an extension trait on `Request<B>`
//!
//! # Design Decisions
//! - Attributes live in the request extensions, not in headers, so clients
//!   cannot forge them
//! - Absent and empty are different states: an empty string is still a value

use axum::http::Request;
use std::collections::HashMap;

/// Attribute holding the action identifier chosen by routing.
pub const ACTION_ATTRIBUTE: &str = "action";

/// Attribute holding the name of the route being served.
pub const ROUTE_ATTRIBUTE: &str = "route";

/// String attributes attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: HashMap<String, String>,
}

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Attribute access on any `http::Request`.
pub trait RequestAttributesExt {
    /// Read an attribute, `None` when it was never set.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Set an attribute in place.
    fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>);

    /// Builder-style variant of [`set_attribute`](Self::set_attribute).
    fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.set_attribute(name, value);
        self
    }

    /// The action identifier, if routing attached one.
    fn action_id(&self) -> Option<&str> {
        self.attribute(ACTION_ATTRIBUTE)
    }

    /// The route name, if routing attached one.
    fn route_name(&self) -> Option<&str> {
        self.attribute(ROUTE_ATTRIBUTE)
    }
}

impl<B> RequestAttributesExt for Request<B> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.extensions()
            .get::<Attributes>()
            .and_then(|attrs| attrs.get(name))
    }

    fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        match self.extensions_mut().get_mut::<Attributes>() {
            Some(attrs) => attrs.insert(name, value),
            None => {
                let mut attrs = Attributes::default();
                attrs.insert(name, value);
                self.extensions_mut().insert(attrs);
            }
        }
    }
}

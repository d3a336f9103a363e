//! Event type parsing.

use std::fmt;

/// Optional namespace segment in front of `<resource>.<action>`.
pub const NAMESPACE: &str = "commerce";

/// The `(resource, action)` pair encoded in an inbound event type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    pub resource: String,
    pub action: String,
}

impl Route {
    /// Split `resource.action`, `resource:action`, or either form behind a
    /// leading `commerce` segment. Anything else yields `None`.
    ///
    /// Segments are kept verbatim. Bus patterns match event types exactly,
    /// so a type that would not reach a worker must not route here either.
    pub fn parse(event_type: &str) -> Option<Self> {
        let mut parts: Vec<&str> = event_type.split(['.', ':']).collect();
        if parts.len() == 3 && parts[0] == NAMESPACE {
            parts.remove(0);
        }
        match parts.as_slice() {
            [resource, action] if !resource.is_empty() && !action.is_empty() => Some(Self {
                resource: resource.to_string(),
                action: action.to_string(),
            }),
            _ => None,
        }
    }

    /// Patterns a worker for `resource` subscribes with.
    pub fn patterns(resource: &str) -> [String; 4] {
        [
            format!("{resource}.*"),
            format!("{resource}:*"),
            format!("{NAMESPACE}.{resource}.*"),
            format!("{NAMESPACE}:{resource}:*"),
        ]
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.action)
    }
}

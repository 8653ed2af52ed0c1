//! Verb and path to operation mapping.
//!
//! [`ROUTES`] is the wire contract of the store; the web router is built from
//! it. Paths are relative to the API prefix and use `{name}` for the file name
//! segment.

use std::fmt;

/// HTTP verbs used by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Put,
    Post,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Put => "PUT",
            Verb::Post => "POST",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Put,
    Append,
    Delete,
    Copy,
    Move,
}

/// One row of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub verb: Verb,
    pub path: &'static str,
    pub operation: Operation,
}

/// Placeholder for the file name segment.
pub const NAME_PARAM: &str = "{name}";

/// The route table. Static paths take priority over `{name}`.
pub const ROUTES: &[Route] = &[
    Route {
        verb: Verb::Get,
        path: "/files",
        operation: Operation::List,
    },
    Route {
        verb: Verb::Post,
        path: "/files/copy",
        operation: Operation::Copy,
    },
    Route {
        verb: Verb::Post,
        path: "/files/move",
        operation: Operation::Move,
    },
    Route {
        verb: Verb::Get,
        path: "/files/{name}",
        operation: Operation::Get,
    },
    Route {
        verb: Verb::Put,
        path: "/files/{name}",
        operation: Operation::Put,
    },
    Route {
        verb: Verb::Post,
        path: "/files/{name}",
        operation: Operation::Append,
    },
    Route {
        verb: Verb::Delete,
        path: "/files/{name}",
        operation: Operation::Delete,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operation_has_one_route() {
        for op in [
            Operation::List,
            Operation::Get,
            Operation::Put,
            Operation::Append,
            Operation::Delete,
            Operation::Copy,
            Operation::Move,
        ] {
            assert_eq!(ROUTES.iter().filter(|r| r.operation == op).count(), 1);
        }
    }

    #[test]
    fn test_static_routes_precede_name_routes() {
        let first_named = ROUTES
            .iter()
            .position(|r| r.path.contains(NAME_PARAM))
            .unwrap();
        assert!(ROUTES[first_named..]
            .iter()
            .all(|r| r.path.contains(NAME_PARAM)));
    }

    #[test]
    fn test_name_routes_share_one_path() {
        let verbs: Vec<Verb> = ROUTES
            .iter()
            .filter(|r| r.path == "/files/{name}")
            .map(|r| r.verb)
            .collect();
        assert_eq!(verbs, [Verb::Get, Verb::Put, Verb::Post, Verb::Delete]);
    }

    #[test]
    fn test_verb_display() {
        assert_eq!(Verb::Get.as_str(), "GET");
        assert_eq!(Verb::Post.to_string(), "POST");
    }
}

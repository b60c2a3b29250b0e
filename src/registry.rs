//! Lookup registries built from a scenario's flattened mocks.
//!
//! Both registries keep the first-registration position of a key but the
//! value of its last registration, so a descendant scenario replaces an
//! inherited mock in place.

use indexmap::IndexMap;

use crate::scenario::{GraphQlMock, HttpMethod, HttpMock, Mock, Operation, OperationType};

/// HTTP mocks keyed by path pattern and method.
#[derive(Debug, Default)]
pub struct HttpRegistry<'a> {
    mocks: IndexMap<(String, HttpMethod), &'a HttpMock>,
}

impl<'a> HttpRegistry<'a> {
    pub fn build<I>(mocks: I) -> Self
    where
        I: IntoIterator<Item = &'a Mock>,
    {
        let mut registry = Self::default();
        for mock in mocks {
            if let Mock::Http(http) = mock {
                registry.mocks.insert((http.path.key(), http.method), http);
            }
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.mocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mocks.is_empty()
    }

    /// Mocks in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &'a HttpMock> + '_ {
        self.mocks.values().copied()
    }
}

/// Operations of one GraphQL path keyed by kind and name.
pub type GraphQlOperations<'a> = IndexMap<(OperationType, String), &'a Operation>;

/// GraphQL operations keyed by path, merged across every mock on that path.
#[derive(Debug, Default)]
pub struct GraphQlRegistry<'a> {
    paths: IndexMap<String, GraphQlOperations<'a>>,
}

impl<'a> GraphQlRegistry<'a> {
    pub fn build<I>(mocks: I) -> Self
    where
        I: IntoIterator<Item = &'a Mock>,
    {
        let mut registry = Self::default();
        for mock in mocks {
            if let Mock::GraphQl(GraphQlMock { path, operations }) = mock {
                let entry = registry.paths.entry(path.clone()).or_default();
                for operation in operations {
                    entry.insert(
                        (operation.operation_type, operation.name.clone()),
                        operation,
                    );
                }
            }
        }
        registry
    }

    /// Operations registered on `path`, if it is a GraphQL path.
    pub fn operations(&self, path: &str) -> Option<&GraphQlOperations<'a>> {
        self.paths.get(path)
    }

    pub fn operation(
        &self,
        path: &str,
        operation_type: OperationType,
        name: &str,
    ) -> Option<&'a Operation> {
        self.operations(path)?
            .get(&(operation_type, name.to_string()))
            .copied()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }
}

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::completion::Suggestion;
use crate::tree::NodeId;

/// A command whose arguments can only be suggested by asking a backend,
/// e.g. "list known instance ids".
#[async_trait]
pub trait RemoteCompletable: Send + Sync {
    /// The command this descriptor is registered for
    fn command(&self) -> NodeId;

    /// Fetch the current suggestions. Expected to be an idempotent read.
    async fn fetch(&self) -> anyhow::Result<Vec<Suggestion>>;

    /// Other commands whose arguments are served from this command's cache
    fn completable_children(&self) -> &[NodeId] {
        &[]
    }
}

/// Serves a fixed list. Mostly useful for wiring and tests.
#[derive(Debug, Clone)]
pub struct StaticCompletable {
    command: NodeId,
    suggestions: Vec<Suggestion>,
    children: Vec<NodeId>,
}

impl StaticCompletable {
    pub fn new(command: NodeId, suggestions: Vec<Suggestion>) -> Self {
        Self {
            command,
            suggestions,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }
}

#[async_trait]
impl RemoteCompletable for StaticCompletable {
    fn command(&self) -> NodeId {
        self.command
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Suggestion>> {
        Ok(self.suggestions.clone())
    }

    fn completable_children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Boxed future returned by `FnCompletable` closures
pub type FetchFuture = Pin<Box<dyn Future<Output = anyhow::Result<Vec<Suggestion>>> + Send>>;

/// Wraps an async closure, typically a call into an API client.
pub struct FnCompletable<F> {
    command: NodeId,
    fetch: F,
    children: Vec<NodeId>,
}

impl<F> FnCompletable<F>
where
    F: Fn() -> FetchFuture + Send + Sync,
{
    pub fn new(command: NodeId, fetch: F) -> Self {
        Self {
            command,
            fetch,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }
}

#[async_trait]
impl<F> RemoteCompletable for FnCompletable<F>
where
    F: Fn() -> FetchFuture + Send + Sync,
{
    fn command(&self) -> NodeId {
        self.command
    }

    async fn fetch(&self) -> anyhow::Result<Vec<Suggestion>> {
        (self.fetch)().await
    }

    fn completable_children(&self) -> &[NodeId] {
        &self.children
    }
}

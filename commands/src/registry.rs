use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, Semaphore};

use crate::cache::SuggestionCache;
use crate::completable::RemoteCompletable;
use crate::completion::{Completer, Suggestion, drop_already_typed, filter_suggestions};
use crate::document::Document;
use crate::error::CompletionError;
use crate::gate::{CompletabilityGate, DEFAULT_ARITY_PROBE_LIMIT};
use crate::tree::CommandTree;

/// Tuning knobs of the completion engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound of the positional-count probe in the gate
    pub arity_probe_limit: usize,

    /// Cap on background fetches running at once; None is unbounded
    pub max_in_flight_fetches: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            arity_probe_limit: DEFAULT_ARITY_PROBE_LIMIT,
            max_in_flight_fetches: None,
        }
    }
}

/// Registry of commands completed from a live backend.
///
/// Holds the registered descriptors by command path and the last-known
/// results of each. Keystrokes read the cache; fetches refresh it in
/// detached tasks, so results show up on a later keystroke.
pub struct RemoteRegistry {
    tree: Arc<CommandTree>,
    gate: CompletabilityGate,
    descriptors: RwLock<HashMap<String, Arc<dyn RemoteCompletable>>>,
    cache: SuggestionCache,
    /// Paths that already had their one inline fetch
    cold_attempts: RwLock<HashSet<String>>,
    fetch_slots: Option<Arc<Semaphore>>,
}

impl RemoteRegistry {
    pub fn new(tree: Arc<CommandTree>) -> Self {
        Self::with_options(tree, EngineOptions::default())
    }

    pub fn with_options(tree: Arc<CommandTree>, options: EngineOptions) -> Self {
        Self {
            tree,
            gate: CompletabilityGate::new(options.arity_probe_limit),
            descriptors: RwLock::new(HashMap::new()),
            cache: SuggestionCache::new(),
            cold_attempts: RwLock::new(HashSet::new()),
            fetch_slots: options
                .max_in_flight_fetches
                .map(|n| Arc::new(Semaphore::new(n.clamp(1, Semaphore::MAX_PERMITS)))),
        }
    }

    pub fn tree(&self) -> &Arc<CommandTree> {
        &self.tree
    }

    pub fn cache(&self) -> &SuggestionCache {
        &self.cache
    }

    /// Register a descriptor under a command path. The program name may be
    /// included; a second registration for the same path replaces the first.
    pub async fn register(&self, path: &str, descriptor: Arc<dyn RemoteCompletable>) {
        let path = self.tree.normalize_path(path);
        if self.tree.find(&path).is_none() {
            tracing::warn!(path = %path, "registering remote completion for an unknown command");
        }

        let owner = descriptor.command();
        for &child in descriptor.completable_children() {
            if child == owner || !self.tree.ancestry(child).any(|a| a == owner) {
                tracing::warn!(
                    path = %path,
                    child = %self.tree.path(child),
                    "completable child is not below its command and will never be served"
                );
            }
        }

        let previous = self.descriptors.write().await.insert(path.clone(), descriptor);
        if previous.is_some() {
            tracing::debug!(path = %path, "replaced remote completion descriptor");
        }
    }

    /// Register a descriptor under the path of the command it names
    pub async fn register_command(&self, descriptor: Arc<dyn RemoteCompletable>) {
        let path = self.tree.path(descriptor.command());
        self.register(&path, descriptor).await;
    }

    pub async fn is_registered(&self, path: &str) -> bool {
        let path = self.tree.normalize_path(path);
        self.descriptors.read().await.contains_key(&path)
    }

    /// Current cached suggestions of a path, unfiltered
    pub async fn cached(&self, path: &str) -> Option<Vec<Suggestion>> {
        self.cache.suggestions(&self.tree.normalize_path(path)).await
    }

    /// Write count of a path's cache entry, 0 when never written
    pub async fn generation(&self, path: &str) -> u64 {
        self.cache.generation(&self.tree.normalize_path(path)).await
    }

    pub async fn suggest(&self, document: &Document) -> Vec<Suggestion> {
        let (tokens, _) = document.split_filter();
        let Some(resolution) = self.tree.resolve(tokens) else {
            return Vec::new();
        };
        if !self.gate.is_completable(&self.tree, document, &resolution) {
            return Vec::new();
        }

        let node = resolution.node;
        let path = self.tree.path(node);

        let (own, ancestor) = {
            let descriptors = self.descriptors.read().await;
            let own = descriptors.get(&path).cloned();
            let ancestor = self.tree.ancestry(node).skip(1).find_map(|a| {
                let ancestor_path = self.tree.path(a);
                descriptors
                    .get(&ancestor_path)
                    .filter(|d| d.completable_children().contains(&node))
                    .map(|d| (ancestor_path, Arc::clone(d)))
            });
            (own, ancestor)
        };

        if let Some(descriptor) = own {
            self.refresh_in_background(path.clone(), descriptor);
            let cached = self.cache.suggestions(&path).await.unwrap_or_default();
            return Self::present(&cached, document);
        }

        if let Some((ancestor_path, descriptor)) = ancestor {
            if let Some(cached) = self.cache.suggestions(&ancestor_path).await {
                return Self::present(&cached, document);
            }
            let first_attempt = self.cold_attempts.write().await.insert(ancestor_path.clone());
            if first_attempt {
                let cached = self.fetch_cold(&ancestor_path, descriptor.as_ref()).await;
                return Self::present(&cached, document);
            }
            self.refresh_in_background(ancestor_path, descriptor);
        }

        Vec::new()
    }

    fn present(suggestions: &[Suggestion], document: &Document) -> Vec<Suggestion> {
        let filtered = filter_suggestions(suggestions, document.word_before_cursor());
        drop_already_typed(filtered, document.text())
    }

    /// First request for a path with no cache entry yet: fetch inline once so
    /// the dropdown is not empty. A failure stores nothing; later keystrokes
    /// retry in the background instead of blocking again.
    async fn fetch_cold(&self, path: &str, descriptor: &dyn RemoteCompletable) -> Vec<Suggestion> {
        let ticket = self.cache.ticket();
        tracing::debug!(path = %path, ticket, "cold cache, fetching inline");
        Self::fetch_into(&self.cache, path, descriptor, ticket).await;
        self.cache.suggestions(path).await.unwrap_or_default()
    }

    /// Spawn a detached fetch that overwrites the path's cache entry when it
    /// lands. Never awaited by the caller; skipped outside a tokio runtime.
    fn refresh_in_background(&self, path: String, descriptor: Arc<dyn RemoteCompletable>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(path = %path, "no tokio runtime, skipping background fetch");
            return;
        };
        let cache = self.cache.clone();
        let slots = self.fetch_slots.clone();

        runtime.spawn(async move {
            let _permit = match slots {
                Some(slots) => match slots.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(_) => return,
                },
                None => None,
            };
            let ticket = cache.ticket();
            tracing::debug!(path = %path, ticket, "background fetch started");
            Self::fetch_into(&cache, &path, descriptor.as_ref(), ticket).await;
        });
    }

    /// Run one fetch and store a non-empty result. Returns whether the cache
    /// was written; failures and empty results keep the previous value.
    async fn fetch_into(
        cache: &SuggestionCache,
        path: &str,
        descriptor: &dyn RemoteCompletable,
        ticket: u64,
    ) -> bool {
        match descriptor.fetch().await {
            Ok(suggestions) => {
                let suggestions: Vec<Suggestion> =
                    suggestions.into_iter().filter(|s| !s.is_blank()).collect();
                if suggestions.is_empty() {
                    tracing::debug!(
                        path = %path,
                        ticket,
                        "fetch returned nothing, keeping previous suggestions"
                    );
                    return false;
                }
                let count = suggestions.len();
                let generation = cache.store(path, suggestions, ticket).await;
                tracing::debug!(
                    path = %path,
                    ticket,
                    generation,
                    count,
                    "cached fetched suggestions"
                );
                true
            }
            Err(source) => {
                let err = CompletionError::FetchFailure {
                    path: path.to_string(),
                    source,
                };
                tracing::warn!(error = %err, "remote completion fetch failed");
                false
            }
        }
    }
}

#[async_trait]
impl Completer for RemoteRegistry {
    async fn complete(&self, document: &Document) -> Vec<Suggestion> {
        self.suggest(document).await
    }
}

#[cfg(test)]
mod tests {
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    use super::*;
    use crate::command::CommandSpec;
    use crate::completable::StaticCompletable;

    fn tree() -> Arc<CommandTree> {
        Arc::new(CommandTree::from_spec(
            CommandSpec::new("cloud").command(
                CommandSpec::new("instance")
                    .command(CommandSpec::new("show"))
                    .command(CommandSpec::new("delete")),
            ),
        ))
    }

    #[tokio::test]
    async fn test_register_normalizes_program_name() {
        let tree = tree();
        let registry = RemoteRegistry::new(Arc::clone(&tree));
        let show = tree.find("instance show").unwrap();

        registry
            .register("cloud  instance show", Arc::new(StaticCompletable::new(show, vec![])))
            .await;

        assert!(registry.is_registered("instance show").await);
        assert!(registry.is_registered("cloud instance show").await);
        assert!(!registry.is_registered("instance").await);
    }

    #[tokio::test]
    async fn test_register_command_uses_node_path() {
        let tree = tree();
        let registry = RemoteRegistry::new(Arc::clone(&tree));
        let delete = tree.find("instance delete").unwrap();

        registry
            .register_command(Arc::new(StaticCompletable::new(delete, vec![])))
            .await;
        assert!(registry.is_registered("instance delete").await);
    }

    /// Drive a future without any runtime; tokio locks resolve immediately
    /// when uncontended.
    fn poll_without_runtime<F: Future>(fut: F) -> F::Output {
        let mut fut = pin!(fut);
        let mut cx = Context::from_waker(Waker::noop());
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(output) => output,
            Poll::Pending => panic!("future did not complete in one poll"),
        }
    }

    #[test]
    fn test_suggest_outside_runtime_skips_refresh() {
        let tree = tree();
        let registry = RemoteRegistry::new(Arc::clone(&tree));
        let show = tree.find("instance show").unwrap();
        let descriptor = StaticCompletable::new(show, vec![Suggestion::new("web-1", "")]);

        poll_without_runtime(registry.register("instance show", Arc::new(descriptor)));
        let got = poll_without_runtime(registry.suggest(&Document::new("instance show ")));

        assert!(got.is_empty());
        assert_eq!(poll_without_runtime(registry.generation("instance show")), 0);
    }

    #[test]
    fn test_oversized_fetch_bound_is_clamped() {
        let options = EngineOptions {
            max_in_flight_fetches: Some(usize::MAX),
            ..EngineOptions::default()
        };
        let registry = RemoteRegistry::with_options(tree(), options);
        let slots = registry.fetch_slots.as_ref().unwrap();
        assert_eq!(slots.available_permits(), Semaphore::MAX_PERMITS);
    }

    #[tokio::test]
    async fn test_unregistered_command_is_empty() {
        let registry = RemoteRegistry::new(tree());
        assert!(registry.suggest(&Document::new("instance show ")).await.is_empty());
        assert!(registry.cache().is_empty().await);
    }
}

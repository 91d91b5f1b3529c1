use std::sync::Arc;

use async_trait::async_trait;

use crate::completion::{Completer, Suggestion};
use crate::document::Document;
use crate::registry::{EngineOptions, RemoteRegistry};
use crate::structural::StructuralCompleter;
use crate::tree::CommandTree;

/// What the line editor calls once per redraw: structural suggestions
/// followed by remote ones.
pub struct CompositeCompleter {
    structural: StructuralCompleter,
    remote: Arc<RemoteRegistry>,
}

impl CompositeCompleter {
    pub fn new(structural: StructuralCompleter, remote: Arc<RemoteRegistry>) -> Self {
        Self { structural, remote }
    }

    /// Build both halves over one tree
    pub fn for_tree(tree: Arc<CommandTree>, options: EngineOptions) -> Self {
        let structural = StructuralCompleter::new(Arc::clone(&tree));
        let remote = Arc::new(RemoteRegistry::with_options(tree, options));
        Self::new(structural, remote)
    }

    pub fn structural(&self) -> &StructuralCompleter {
        &self.structural
    }

    pub fn remote(&self) -> &Arc<RemoteRegistry> {
        &self.remote
    }
}

#[async_trait]
impl Completer for CompositeCompleter {
    async fn complete(&self, document: &Document) -> Vec<Suggestion> {
        let mut suggestions = self.structural.suggest(document);
        suggestions.extend(self.remote.suggest(document).await);
        suggestions
    }
}

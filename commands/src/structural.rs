use std::sync::Arc;

use async_trait::async_trait;

use crate::completion::{Completer, Suggestion, filter_suggestions};
use crate::document::Document;
use crate::parsed_args::ParsedArgs;
use crate::tree::{CommandTree, NodeId};

/// Suggests subcommands and flags from the static command tree alone.
///
/// Pure and synchronous: the same tree and document always give the same
/// list, and nothing here touches the network.
#[derive(Clone, Debug)]
pub struct StructuralCompleter {
    tree: Arc<CommandTree>,
}

impl StructuralCompleter {
    pub fn new(tree: Arc<CommandTree>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn suggest(&self, document: &Document) -> Vec<Suggestion> {
        let tree = &*self.tree;
        let (tokens, filter) = document.split_filter();

        let Some(resolution) = tree.resolve(tokens) else {
            return Vec::new();
        };
        let node = resolution.node;

        let flags = self.flag_candidates(document, node);
        if !flags.is_empty() {
            return filter_suggestions(&flags, filter);
        }

        let candidates: Vec<Suggestion> = tree
            .visible_children(node)
            .map(|child| Suggestion::new(child.name(), child.short()))
            .collect();

        let unmatched = ParsedArgs::parse(tree, node, tokens, &resolution.leftover);
        let Some(&first) = unmatched.positional_indexes.first() else {
            return filter_suggestions(&candidates, filter);
        };

        // Positionals were typed after the command: only candidates that
        // continue the whole typed remainder can still apply.
        let composite = format!("{} {}", tokens[first..].join(" "), filter);
        filter_suggestions(&candidates, &composite)
    }

    /// Unused visible flags in the dash style of the word being typed
    fn flag_candidates(&self, document: &Document, node: NodeId) -> Vec<Suggestion> {
        let word = document.word_before_cursor();
        if !word.starts_with('-') {
            return Vec::new();
        }
        let line = document.text();
        let long_style = word.starts_with("--");

        self.tree
            .visible_flags(node)
            .into_iter()
            .filter(|flag| !already_used(line, &flag.long_token()))
            .filter(|flag| flag.short_token().is_none_or(|short| !already_used(line, &short)))
            .filter_map(|flag| {
                let token = if long_style {
                    flag.long_token()
                } else {
                    flag.short_token()?
                };
                Some(Suggestion::new(token, flag.usage.clone()))
            })
            .collect()
    }
}

/// The flag was written out as a completed word, with or without `=value`
fn already_used(line: &str, flag_token: &str) -> bool {
    line.contains(&format!("{} ", flag_token)) || line.contains(&format!("{}=", flag_token))
}

#[async_trait]
impl Completer for StructuralCompleter {
    async fn complete(&self, document: &Document) -> Vec<Suggestion> {
        self.suggest(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandSpec, Flag};

    fn completer() -> StructuralCompleter {
        let spec = CommandSpec::new("cloud")
            .flag(Flag::bool("verbose", "Verbose output").with_short('v').persistent())
            .command(
                CommandSpec::new("instance")
                    .short("Manage instances")
                    .command(
                        CommandSpec::new("create")
                            .short("Create an instance")
                            .flag(Flag::value("size", "", "Instance size").with_short('s'))
                            .flag(Flag::value("region", "", "Region")),
                    )
                    .command(CommandSpec::new("list").short("List instances"))
                    .command(CommandSpec::new("debug").hidden()),
            )
            .command(CommandSpec::new("volume").short("Manage volumes"));
        StructuralCompleter::new(Arc::new(CommandTree::from_spec(spec)))
    }

    fn texts(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_empty_line_lists_top_level() {
        let c = completer();
        assert_eq!(texts(&c.suggest(&Document::new(""))), vec!["instance", "volume"]);
    }

    #[test]
    fn test_children_with_descriptions() {
        let c = completer();
        let got = c.suggest(&Document::new("instance "));
        assert_eq!(
            got,
            vec![
                Suggestion::new("create", "Create an instance"),
                Suggestion::new("list", "List instances"),
            ]
        );
    }

    #[test]
    fn test_partial_word_filters() {
        let c = completer();
        assert_eq!(texts(&c.suggest(&Document::new("instance LI"))), vec!["list"]);
        assert_eq!(texts(&c.suggest(&Document::new("vol"))), vec!["volume"]);
    }

    #[test]
    fn test_long_and_short_flag_styles() {
        let c = completer();
        assert_eq!(
            texts(&c.suggest(&Document::new("instance create --"))),
            vec!["--size", "--region", "--verbose"]
        );
        assert_eq!(
            texts(&c.suggest(&Document::new("instance create -"))),
            vec!["-s", "-v"]
        );
        assert_eq!(texts(&c.suggest(&Document::new("instance create --r"))), vec!["--region"]);
    }

    #[test]
    fn test_inline_value_marks_flag_used() {
        let c = completer();
        let got = c.suggest(&Document::new("instance create --size=g3 --"));
        assert_eq!(texts(&got), vec!["--region", "--verbose"]);
    }

    #[test]
    fn test_positionals_hide_children() {
        let c = completer();
        assert!(c.suggest(&Document::new("instance foo ")).is_empty());
        assert!(c.suggest(&Document::new("instance foo l")).is_empty());
    }

    #[test]
    fn test_leaf_without_children_is_empty() {
        let c = completer();
        assert!(c.suggest(&Document::new("instance list ")).is_empty());
    }
}

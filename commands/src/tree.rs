use crate::command::{ArgsValidator, CommandSpec, Flag};
use crate::error::CompletionError;

/// Index of a node inside its `CommandTree`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A frozen command. Only reachable through the tree that owns it.
#[derive(Debug)]
pub struct CommandNode {
    name: String,
    aliases: Vec<String>,
    short: String,
    hidden: bool,
    flags: Vec<Flag>,
    args: ArgsValidator,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl CommandNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn short(&self) -> &str {
        &self.short
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn args(&self) -> &ArgsValidator {
        &self.args
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn answers_to(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|a| a == token)
    }
}

/// Where a token list lands in the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Deepest command the tokens name
    pub node: NodeId,

    /// Token indexes consumed as command names, in order
    pub path: Vec<usize>,

    /// Token indexes the walk could not classify as command names
    pub leftover: Vec<usize>,
}

/// Immutable command hierarchy. The root is the program itself.
#[derive(Debug)]
pub struct CommandTree {
    nodes: Vec<CommandNode>,
}

impl CommandTree {
    pub const ROOT: NodeId = NodeId(0);

    /// Freeze a spec into an arena, depth first
    pub fn from_spec(spec: CommandSpec) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.insert(spec, None);
        tree
    }

    fn insert(&mut self, spec: CommandSpec, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(CommandNode {
            name: spec.name,
            aliases: spec.aliases,
            short: spec.short,
            hidden: spec.hidden,
            flags: spec.flags,
            args: spec.args,
            children: Vec::new(),
            parent,
        });

        let children: Vec<NodeId> = spec
            .commands
            .into_iter()
            .map(|child| self.insert(child, Some(id)))
            .collect();
        self.nodes[id.0].children = children;
        id
    }

    pub fn root(&self) -> &CommandNode {
        &self.nodes[Self::ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    /// Program name, as typed in front of every command path
    pub fn program_name(&self) -> &str {
        self.root().name()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn child(&self, id: NodeId, token: &str) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|c| self.node(*c).answers_to(token))
    }

    pub fn visible_children(&self, id: NodeId) -> impl Iterator<Item = &CommandNode> + '_ {
        self.node(id)
            .children
            .iter()
            .map(|c| self.node(*c))
            .filter(|c| !c.hidden)
    }

    /// Walk from `id` to the root, `id` first
    pub fn ancestry(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), |n| self.node(*n).parent())
    }

    /// Command path below the root, e.g. "instance show". Empty for the root.
    pub fn path(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = self
            .ancestry(id)
            .filter(|n| *n != Self::ROOT)
            .map(|n| self.node(n).name())
            .collect();
        names.reverse();
        names.join(" ")
    }

    /// Trim the program name off a user-supplied path and normalize spacing
    pub fn normalize_path(&self, path: &str) -> String {
        let mut words = path.split_whitespace().peekable();
        if words.peek() == Some(&self.program_name()) {
            words.next();
        }
        words.collect::<Vec<_>>().join(" ")
    }

    /// Look up a node by its path (program name optional)
    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.normalize_path(path)
            .split_whitespace()
            .try_fold(Self::ROOT, |node, word| self.child(node, word))
    }

    /// Every non-hidden flag usable on `id`: its own flags, then persistent
    /// flags inherited from ancestors, nearest first. A long name is only
    /// reported once.
    pub fn visible_flags(&self, id: NodeId) -> Vec<&Flag> {
        let mut flags: Vec<&Flag> = Vec::new();
        for (depth, node) in self.ancestry(id).enumerate() {
            for flag in &self.node(node).flags {
                let inherited = depth > 0;
                if inherited && !flag.persistent {
                    continue;
                }
                if flags.iter().any(|f| f.name == flag.name) {
                    continue;
                }
                flags.push(flag);
            }
        }
        flags.retain(|f| !f.hidden);
        flags
    }

    /// Find the flag a dash token refers to, hidden flags included.
    pub fn lookup_flag(&self, id: NodeId, token: &str) -> Option<&Flag> {
        let name = token.split_once('=').map_or(token, |(name, _)| name);
        self.ancestry(id)
            .enumerate()
            .flat_map(|(depth, node)| {
                self.node(node)
                    .flags
                    .iter()
                    .filter(move |f| depth == 0 || f.persistent)
            })
            .find(|f| f.is_named_by(name))
    }

    /// Greedily consume tokens as subcommand names.
    ///
    /// Dash tokens are stepped over (together with the value of a value flag
    /// written as `--flag value`); the first other token that names no child
    /// ends the walk. Returns None when the walk stops at the root although
    /// the root has visible subcommands and positionals remain.
    pub fn resolve(&self, tokens: &[String]) -> Option<Resolution> {
        let mut node = Self::ROOT;
        let mut path = Vec::new();
        let mut leftover = Vec::new();
        let mut walking = true;
        let mut positional_leftover = false;

        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i].as_str();
            if is_flag_token(token) {
                leftover.push(i);
                let consumes_next = !token.contains('=')
                    && self.lookup_flag(node, token).is_some_and(Flag::takes_value);
                if consumes_next && i + 1 < tokens.len() {
                    i += 1;
                    leftover.push(i);
                }
            } else if let Some(child) = self.child(node, token).filter(|_| walking) {
                node = child;
                path.push(i);
            } else {
                walking = false;
                positional_leftover = true;
                leftover.push(i);
            }
            i += 1;
        }

        let root_has_children = self.visible_children(node).next().is_some();
        if node == Self::ROOT && positional_leftover && root_has_children {
            let err = CompletionError::TreeMismatch(tokens.join(" "));
            tracing::trace!(error = %err, "walk stopped at the root");
            return None;
        }

        Some(Resolution { node, path, leftover })
    }
}

/// `-x`, `--name`, `--name=value`; a lone `-` is a positional.
pub(crate) fn is_flag_token(token: &str) -> bool {
    token.len() > 1 && token.starts_with('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn tree() -> CommandTree {
        CommandTree::from_spec(
            CommandSpec::new("cloud")
                .flag(Flag::bool("verbose", "Verbose output").with_short('v').persistent())
                .flag(Flag::value("profile", "default", "Profile").persistent().hidden())
                .command(
                    CommandSpec::new("instance")
                        .alias("instances")
                        .short("Manage instances")
                        .flag(Flag::value("region", "", "Region").with_short('r').persistent())
                        .command(CommandSpec::new("show").short("Show an instance"))
                        .command(CommandSpec::new("delete").short("Delete an instance")),
                )
                .command(CommandSpec::new("secret").hidden()),
        )
    }

    #[test]
    fn test_paths() {
        let tree = tree();
        let show = tree.find("instance show").unwrap();
        assert_eq!(tree.path(show), "instance show");
        assert_eq!(tree.find("cloud instance show"), Some(show));
        assert_eq!(tree.path(CommandTree::ROOT), "");
        assert_eq!(tree.normalize_path("  cloud   instance  show "), "instance show");
        assert_eq!(tree.find("instance nope"), None);

        let instance = tree.find("instances").unwrap();
        assert_eq!(tree.node(show).parent(), Some(instance));
        assert_eq!(tree.node(instance).aliases(), ["instances"]);
        assert_eq!(tree.root().parent(), None);
    }

    #[test]
    fn test_resolve_through_flags_and_aliases() {
        let tree = tree();
        let res = tree.resolve(&tokens("instances -r nyc1 show abc")).unwrap();
        assert_eq!(res.node, tree.find("instance show").unwrap());
        assert_eq!(res.path, vec![0, 3]);
        assert_eq!(res.leftover, vec![1, 2, 4]);
    }

    #[test]
    fn test_resolve_inline_value_does_not_consume() {
        let tree = tree();
        let res = tree.resolve(&tokens("instance --region=nyc1 show")).unwrap();
        assert_eq!(res.node, tree.find("instance show").unwrap());
        assert_eq!(res.leftover, vec![1]);
    }

    #[test]
    fn test_resolve_unknown_root_command() {
        let tree = tree();
        assert_eq!(tree.resolve(&tokens("zzz")), None);
        // Flags alone still resolve to the root
        assert_eq!(tree.resolve(&tokens("-v")).unwrap().node, CommandTree::ROOT);
    }

    #[test]
    fn test_walk_stops_at_first_unknown_word() {
        let tree = tree();
        let res = tree.resolve(&tokens("instance foo show")).unwrap();
        assert_eq!(res.node, tree.find("instance").unwrap());
        assert_eq!(res.leftover, vec![1, 2]);
    }

    #[test]
    fn test_visible_flags_inherit_and_hide() {
        let tree = tree();
        let show = tree.find("instance show").unwrap();
        let names: Vec<&str> = tree.visible_flags(show).iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["region", "verbose"]);

        assert!(tree.lookup_flag(show, "--profile").is_some());
        assert!(tree.lookup_flag(show, "--region=x").is_some());
        assert!(tree.lookup_flag(CommandTree::ROOT, "--region").is_none());
    }

    #[test]
    fn test_hidden_children_are_walkable_but_not_visible() {
        let tree = tree();
        assert!(tree.find("secret").is_some());
        let names: Vec<&str> = tree.visible_children(CommandTree::ROOT).map(|c| c.name()).collect();
        assert_eq!(names, vec!["instance"]);
    }
}

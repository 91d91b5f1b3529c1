use crate::document::Document;
use crate::error::{CompletionError, ParseError};
use crate::parsed_args::ParsedArgs;
use crate::tree::{CommandTree, Resolution};

/// Largest positional count probed against a command's validator
pub const DEFAULT_ARITY_PROBE_LIMIT: usize = 20;

/// Why the gate refused remote completion for a keystroke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refusal {
    /// The last word is still being typed
    InProgressToken,
    /// The leftover tokens do not parse as flags of the command
    MalformedFlags(ParseError),
    /// The previous word is a flag still waiting for its value
    DanglingFlag(String),
    /// The command accepts no further positional argument
    ArityExhausted,
}

/// Decides whether remote suggestions are worth attempting.
///
/// Only gates the remote registry; structural completion always runs.
#[derive(Debug, Clone, Copy)]
pub struct CompletabilityGate {
    probe_limit: usize,
}

impl Default for CompletabilityGate {
    fn default() -> Self {
        Self::new(DEFAULT_ARITY_PROBE_LIMIT)
    }
}

impl CompletabilityGate {
    pub fn new(probe_limit: usize) -> Self {
        Self { probe_limit }
    }

    pub fn is_completable(
        &self,
        tree: &CommandTree,
        document: &Document,
        resolution: &Resolution,
    ) -> bool {
        match self.check(tree, document, resolution) {
            Ok(()) => true,
            Err(Refusal::MalformedFlags(e)) => {
                let err = CompletionError::from(e);
                tracing::trace!(error = %err, line = document.text(), "remote completion gated");
                false
            }
            Err(refusal) => {
                tracing::trace!(?refusal, line = document.text(), "remote completion gated");
                false
            }
        }
    }

    pub fn check(
        &self,
        tree: &CommandTree,
        document: &Document,
        resolution: &Resolution,
    ) -> Result<(), Refusal> {
        if !document.ends_with_space() {
            return Err(Refusal::InProgressToken);
        }

        let node = resolution.node;
        let parsed = ParsedArgs::parse_strict(tree, node, document.tokens(), &resolution.leftover)
            .map_err(Refusal::MalformedFlags)?;

        if let Some(last) = document.last_token() {
            let dangling = tree
                .visible_flags(node)
                .into_iter()
                .find(|flag| flag.is_named_by(last) && flag.expects_scalar());
            if let Some(flag) = dangling {
                return Err(Refusal::DanglingFlag(flag.name.clone()));
            }
        }

        let current = parsed.len();
        let args = tree.node(node).args();
        if !(current + 1..=self.probe_limit).any(|n| args.accepts_count(n)) {
            return Err(Refusal::ArityExhausted);
        }

        Ok(())
    }
}

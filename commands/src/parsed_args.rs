use crate::error::ParseError;
use crate::tree::{CommandTree, NodeId, is_flag_token};

/// Leftover tokens of a resolution, split into flags and positionals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    /// Positional arguments, in typed order
    pub positionals: Vec<String>,

    /// Token indexes (into the resolved token list) of the positionals
    pub positional_indexes: Vec<usize>,

    /// Flag tokens as typed, values excluded
    pub flags: Vec<String>,
}

impl ParsedArgs {
    /// Parse leniently: unknown dash tokens are dropped as flags.
    pub fn parse(tree: &CommandTree, node: NodeId, tokens: &[String], leftover: &[usize]) -> Self {
        Self::parse_inner(tree, node, tokens, leftover, false).unwrap_or_default()
    }

    /// Parse strictly: a dash token naming no flag on `node` is an error.
    pub fn parse_strict(
        tree: &CommandTree,
        node: NodeId,
        tokens: &[String],
        leftover: &[usize],
    ) -> Result<Self, ParseError> {
        Self::parse_inner(tree, node, tokens, leftover, true)
    }

    fn parse_inner(
        tree: &CommandTree,
        node: NodeId,
        tokens: &[String],
        leftover: &[usize],
        strict: bool,
    ) -> Result<Self, ParseError> {
        let mut parsed = Self::default();
        let mut iter = leftover.iter().copied().peekable();

        while let Some(i) = iter.next() {
            let token = &tokens[i];
            if !is_flag_token(token) {
                parsed.positionals.push(token.clone());
                parsed.positional_indexes.push(i);
                continue;
            }

            parsed.flags.push(token.clone());
            // A bare "--" ends flag parsing; everything after is positional
            if token == "--" {
                for j in iter.by_ref() {
                    parsed.positionals.push(tokens[j].clone());
                    parsed.positional_indexes.push(j);
                }
                break;
            }

            match tree.lookup_flag(node, token) {
                Some(flag) => {
                    let inline = token.split_once('=').map(|(_, v)| v);
                    match inline {
                        Some(value)
                            if !flag.takes_value() && strict && value.parse::<bool>().is_err() =>
                        {
                            return Err(ParseError::InvalidBool {
                                flag: flag.name.clone(),
                                value: value.to_string(),
                            });
                        }
                        Some(_) => {}
                        None if flag.takes_value() => {
                            // The value is the next token, when it has been typed
                            iter.next_if_eq(&(i + 1));
                        }
                        None => {}
                    }
                }
                None if strict => return Err(ParseError::UnknownFlag(token.clone())),
                None => {}
            }
        }

        Ok(parsed)
    }

    /// Number of positionals already typed
    pub fn len(&self) -> usize {
        self.positionals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positionals.is_empty()
    }
}

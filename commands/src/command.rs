use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ArgsError;

/// Whether a flag stands alone or expects a value
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    Bool,
    #[default]
    Value,
}

/// A flag declared on a command
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    /// Long name without the leading dashes
    pub name: String,

    /// Optional single-character short name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,

    /// Default value as it would be printed in help output
    #[serde(default)]
    pub default: String,

    /// Help text, shown as the suggestion description
    #[serde(default)]
    pub usage: String,

    #[serde(default)]
    pub hidden: bool,

    /// Persistent flags are inherited by every descendant command
    #[serde(default)]
    pub persistent: bool,

    #[serde(default)]
    pub kind: FlagKind,
}

impl Flag {
    /// A flag that takes a value
    pub fn value(
        name: impl Into<String>,
        default: impl Into<String>,
        usage: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            short: None,
            default: default.into(),
            usage: usage.into(),
            hidden: false,
            persistent: false,
            kind: FlagKind::Value,
        }
    }

    /// A switch, defaulting to "false"
    pub fn bool(name: impl Into<String>, usage: impl Into<String>) -> Self {
        Self {
            kind: FlagKind::Bool,
            ..Self::value(name, "false", usage)
        }
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn long_token(&self) -> String {
        format!("--{}", self.name)
    }

    pub fn short_token(&self) -> Option<String> {
        self.short.map(|c| format!("-{}", c))
    }

    pub fn takes_value(&self) -> bool {
        self.kind == FlagKind::Value
    }

    /// Whether `token` names this flag exactly, in long or short form
    pub fn is_named_by(&self, token: &str) -> bool {
        if let Some(long) = token.strip_prefix("--") {
            return long == self.name;
        }
        match (token.strip_prefix('-'), self.short) {
            (Some(rest), Some(short)) => {
                let mut chars = rest.chars();
                chars.next() == Some(short) && chars.next().is_none()
            }
            _ => false,
        }
    }

    /// Heuristic for "the user still owes this flag a value": its default is
    /// empty or the literal "0".
    pub fn expects_scalar(&self) -> bool {
        self.default.is_empty() || self.default == "0"
    }
}

type ValidateFn = dyn Fn(&[String]) -> Result<(), ArgsError> + Send + Sync;

/// Positional-argument arity rule of a command
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgsValidator {
    /// Any number of positionals
    #[default]
    Arbitrary,

    /// No positionals at all
    NoArgs,

    Exact { count: usize },

    Min { count: usize },

    Max { count: usize },

    Range { min: usize, max: usize },

    /// Programmatic rule, only available when building trees in code
    #[serde(skip)]
    Custom(Arc<ValidateFn>),
}

impl ArgsValidator {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[String]) -> Result<(), ArgsError> + Send + Sync + 'static,
    {
        ArgsValidator::Custom(Arc::new(f))
    }

    pub fn validate(&self, args: &[String]) -> Result<(), ArgsError> {
        let received = args.len();
        match self {
            ArgsValidator::Arbitrary => Ok(()),
            ArgsValidator::NoArgs if received > 0 => Err(ArgsError::NoArgs(received)),
            ArgsValidator::NoArgs => Ok(()),
            ArgsValidator::Exact { count } if received != *count => Err(ArgsError::Exact {
                expected: *count,
                received,
            }),
            ArgsValidator::Exact { .. } => Ok(()),
            ArgsValidator::Min { count } if received < *count => Err(ArgsError::TooFew {
                min: *count,
                received,
            }),
            ArgsValidator::Min { .. } => Ok(()),
            ArgsValidator::Max { count } if received > *count => Err(ArgsError::TooMany {
                max: *count,
                received,
            }),
            ArgsValidator::Max { .. } => Ok(()),
            ArgsValidator::Range { min, .. } if received < *min => Err(ArgsError::TooFew {
                min: *min,
                received,
            }),
            ArgsValidator::Range { max, .. } if received > *max => Err(ArgsError::TooMany {
                max: *max,
                received,
            }),
            ArgsValidator::Range { .. } => Ok(()),
            ArgsValidator::Custom(f) => f(args),
        }
    }

    /// Probe the validator with `count` synthetic positionals
    pub fn accepts_count(&self, count: usize) -> bool {
        let synthetic = vec![String::from("_"); count];
        self.validate(&synthetic).is_ok()
    }
}

impl fmt::Debug for ArgsValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsValidator::Arbitrary => write!(f, "Arbitrary"),
            ArgsValidator::NoArgs => write!(f, "NoArgs"),
            ArgsValidator::Exact { count } => write!(f, "Exact({})", count),
            ArgsValidator::Min { count } => write!(f, "Min({})", count),
            ArgsValidator::Max { count } => write!(f, "Max({})", count),
            ArgsValidator::Range { min, max } => write!(f, "Range({}..={})", min, max),
            ArgsValidator::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Declarative description of a command and its subcommands.
///
/// Specs are plain data; `CommandTree::from_spec` freezes them into the
/// immutable tree the completers walk.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// One-line description
    #[serde(default)]
    pub short: String,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default)]
    pub flags: Vec<Flag>,

    #[serde(default)]
    pub args: ArgsValidator,

    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn short(mut self, short: impl Into<String>) -> Self {
        self.short = short.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn args(mut self, args: ArgsValidator) -> Self {
        self.args = args;
        self
    }

    pub fn command(mut self, child: CommandSpec) -> Self {
        self.commands.push(child);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(n: usize) -> Vec<String> {
        vec!["x".to_string(); n]
    }

    #[test]
    fn test_flag_is_named_by() {
        let flag = Flag::value("region", "", "Region").with_short('r');
        assert!(flag.is_named_by("--region"));
        assert!(flag.is_named_by("-r"));
        assert!(!flag.is_named_by("--reg"));
        assert!(!flag.is_named_by("-rx"));
        assert!(!flag.is_named_by("region"));
    }

    #[test]
    fn test_expects_scalar() {
        assert!(Flag::value("name", "", "").expects_scalar());
        assert!(Flag::value("count", "0", "").expects_scalar());
        assert!(!Flag::value("size", "g3.small", "").expects_scalar());
        assert!(!Flag::bool("yes", "").expects_scalar());
    }

    #[test]
    fn test_validators() {
        assert!(ArgsValidator::Arbitrary.validate(&args(7)).is_ok());
        assert_eq!(ArgsValidator::NoArgs.validate(&args(1)), Err(ArgsError::NoArgs(1)));
        assert!(ArgsValidator::Exact { count: 2 }.validate(&args(2)).is_ok());
        assert!(ArgsValidator::Exact { count: 2 }.validate(&args(1)).is_err());
        assert!(ArgsValidator::Min { count: 1 }.validate(&args(0)).is_err());
        assert!(ArgsValidator::Max { count: 1 }.validate(&args(2)).is_err());
        assert!(ArgsValidator::Range { min: 1, max: 2 }.validate(&args(2)).is_ok());
        assert!(ArgsValidator::Range { min: 1, max: 2 }.validate(&args(3)).is_err());
    }

    #[test]
    fn test_custom_validator_sees_synthetic_tokens() {
        let even = ArgsValidator::custom(|args| {
            if args.len() % 2 == 0 {
                Ok(())
            } else {
                Err(ArgsError::Custom("pairs only".into()))
            }
        });
        assert!(!even.accepts_count(1));
        assert!(even.accepts_count(2));
    }

    #[test]
    fn test_spec_from_toml() {
        let spec: CommandSpec = toml::from_str(
            r#"
            name = "cloud"

            [[flags]]
            name = "verbose"
            short = "v"
            kind = "bool"
            persistent = true

            [[commands]]
            name = "instance"
            short = "Manage instances"
            aliases = ["instances"]

            [[commands.commands]]
            name = "show"
            args = { kind = "exact", count = 1 }
            "#,
        )
        .unwrap();

        assert_eq!(spec.flags[0].short, Some('v'));
        assert_eq!(spec.flags[0].kind, FlagKind::Bool);
        assert_eq!(spec.commands[0].aliases, ["instances"]);
        let show = &spec.commands[0].commands[0];
        assert!(show.args.accepts_count(1));
        assert!(!show.args.accepts_count(2));
    }
}

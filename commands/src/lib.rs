pub mod cache;
pub mod command;
pub mod completable;
pub mod completion;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod gate;
pub mod parsed_args;
pub mod registry;
pub mod structural;
pub mod tree;

// Re-export main types
pub use cache::{CacheEntry, SuggestionCache};
pub use command::{ArgsValidator, CommandSpec, Flag, FlagKind};
pub use completable::{FetchFuture, FnCompletable, RemoteCompletable, StaticCompletable};
pub use completion::{Completer, Suggestion, drop_already_typed, filter_suggestions};
pub use dispatcher::CompositeCompleter;
pub use document::Document;
pub use error::{ArgsError, CompletionError, ParseError};
pub use gate::{CompletabilityGate, Refusal};
pub use parsed_args::ParsedArgs;
pub use registry::{EngineOptions, RemoteRegistry};
pub use structural::StructuralCompleter;
pub use tree::{CommandNode, CommandTree, NodeId, Resolution};

// Re-export async_trait for implementors of RemoteCompletable
pub use async_trait;

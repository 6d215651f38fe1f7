//! External collaborators
//!
//! The workflow engine never parses code, drafts documentation, or edits files
//! on its own. Each of those jobs sits behind a trait here, with one shipped
//! implementation that shells out or works on plain files:
//!
//! | Trait            | Shipped implementation |
//! |------------------|------------------------|
//! | `Analyzer`       | `CommandAnalyzer`      |
//! | `Suggester`      | `CommandSuggester`     |
//! | `TransactionLog` | `FileTransactionLog`   |
//! | `DocWriter`      | `CommentWriter`        |
//! | `ValidationHook` | `CommandHook`          |
//! | `ItemPrompt`     | `TerminalPrompt`       |

mod analyzer;
mod hooks;
mod prompt;
mod runner;
mod suggester;
mod transaction;
mod writer;

pub use analyzer::{analyze_files, Analyzer, CommandAnalyzer};
pub use hooks::{run_validation_hooks, CommandHook, HookInput, HookVerdict, Rejection, ValidationHook};
pub use prompt::{ItemPrompt, Progress, RatingChoice, ReviewChoice, TerminalPrompt};
pub use runner::{CommandOutput, CommandRunner};
pub use suggester::{CommandSuggester, SuggestionRequest, Suggester};
pub use transaction::{
    FileTransactionLog, RollbackReport, RollbackTarget, TransactionLog, TransactionStatus,
    TransactionSummary, WriteEntry,
};
pub use writer::{CommentWriter, DocWriter};

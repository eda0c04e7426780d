//! Command-line front end.
//!
//! - [`args`] parses process arguments
//! - [`commands`] parses slash commands typed at the prompt
//! - [`repl`] runs those commands against a [`ChatController`](crate::controller::ChatController)
//!
//! ```ignore
//! use clinic_chat::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args());
//! if let Some(chat) = run_cli_command(command) {
//!     // start the prompt with `chat`
//! }
//! ```

pub mod args;
pub mod commands;
pub mod repl;
pub mod version;

pub use args::{parse_args, CliCommand, USAGE};
pub use commands::{parse_command, ReplCommand, HELP};
pub use repl::{execute, format_message, format_session, ReplOutcome, StreamEcho};
pub use version::{handle_version_command, VERSION};

/// Options for the interactive chat.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    pub streaming: bool,
    pub specialty: Option<String>,
}

/// Handle commands that finish without starting the prompt.
///
/// Returns the chat options when the prompt should run. The `Version`
/// command never returns.
pub fn run_cli_command(command: CliCommand) -> Option<ChatOptions> {
    match command {
        CliCommand::Version => handle_version_command(),
        CliCommand::Help => {
            println!("{}", USAGE);
            None
        }
        CliCommand::Chat {
            streaming,
            specialty,
        } => Some(ChatOptions {
            streaming,
            specialty,
        }),
    }
}

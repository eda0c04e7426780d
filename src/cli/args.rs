//! Command-line argument parsing for the clinic-chat binary.

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Print usage
    Help,
    /// Run the interactive chat (default)
    Chat {
        /// Force the streaming transport regardless of `CLINIC_CHAT_STREAMING`
        streaming: bool,
        /// Specialty attached to new sessions
        specialty: Option<String>,
    },
}

pub const USAGE: &str = "\
Usage: clinic-chat [--stream] [--specialty <name>]

Options:
  --stream              Use the streaming channel instead of REST sends
  --specialty <name>    Specialty for new sessions (e.g. cardiology)
  -V, --version         Print version
  -h, --help            Print this help";

/// Parse command-line arguments and return the appropriate command.
///
/// The first item is the program name and is skipped. Unknown flags are
/// ignored.
///
/// # Examples
///
/// ```
/// use clinic_chat::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["clinic-chat".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut streaming = false;
    let mut specialty = None;

    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--stream" => streaming = true,
            "--specialty" => specialty = args.next(),
            _ => {}
        }
    }
    CliCommand::Chat {
        streaming,
        specialty,
    }
}

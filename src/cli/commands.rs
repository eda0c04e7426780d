//! Slash commands understood by the interactive prompt.

use crate::models::{FeedbackType, MessageId, SessionId};

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Plain text, sent as a chat message
    Send(String),
    NewSession,
    ListSessions,
    LoadSession(SessionId),
    DeleteSession(SessionId),
    Feedback {
        message_id: MessageId,
        feedback_type: FeedbackType,
        comment: Option<String>,
    },
    ClearMessages,
    Help,
    Quit,
    /// Blank line
    Empty,
    /// Malformed command, with the reason
    Invalid(String),
}

pub const HELP: &str = "\
Commands:
  /new                              start a new session
  /sessions                         list recent sessions
  /load <session-id>                open a session and its history
  /delete <session-id>              delete a session
  /feedback <message-id> <type> [comment]
                                    rate a reply (helpful, not_helpful, incorrect, inappropriate)
  /clear                            clear the conversation on screen
  /help                             show this help
  /quit                             exit
Anything else is sent to the assistant.";

/// Parse a line typed at the prompt.
pub fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ReplCommand::Send(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    match name {
        "new" => ReplCommand::NewSession,
        "sessions" | "ls" => ReplCommand::ListSessions,
        "load" => match parse_id(parts.next()) {
            Ok(id) => ReplCommand::LoadSession(id),
            Err(e) => ReplCommand::Invalid(format!("/load: {}", e)),
        },
        "delete" | "rm" => match parse_id(parts.next()) {
            Ok(id) => ReplCommand::DeleteSession(id),
            Err(e) => ReplCommand::Invalid(format!("/delete: {}", e)),
        },
        "feedback" => {
            let message_id = match parse_id(parts.next()) {
                Ok(id) => id,
                Err(e) => return ReplCommand::Invalid(format!("/feedback: {}", e)),
            };
            let feedback_type = match parts.next().map(str::parse::<FeedbackType>) {
                Some(Ok(t)) => t,
                Some(Err(e)) => return ReplCommand::Invalid(format!("/feedback: {}", e)),
                None => return ReplCommand::Invalid("/feedback: missing type".to_string()),
            };
            let comment = parts.collect::<Vec<_>>().join(" ");
            ReplCommand::Feedback {
                message_id,
                feedback_type,
                comment: (!comment.is_empty()).then_some(comment),
            }
        }
        "clear" => ReplCommand::ClearMessages,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => ReplCommand::Invalid(format!("Unknown command: /{}", other)),
    }
}

fn parse_id(arg: Option<&str>) -> Result<i64, String> {
    let arg = arg.ok_or_else(|| "missing id".to_string())?;
    arg.parse()
        .map_err(|_| format!("'{}' is not a numeric id", arg))
}

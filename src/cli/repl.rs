//! Interactive prompt on top of [`ChatController`].

use std::io::Write;

use color_eyre::Result;

use super::commands::{ReplCommand, HELP};
use crate::config::TransportMode;
use crate::controller::ChatController;
use crate::models::{Message, MessageRole, Session};
use crate::state::ChatState;

/// Whether the prompt loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplOutcome {
    Continue,
    Quit,
}

/// Run one command against the controller, writing results to `out`.
///
/// Chat failures are printed, not returned; only write errors abort.
pub async fn execute<W: Write>(
    controller: &ChatController,
    command: ReplCommand,
    out: &mut W,
) -> Result<ReplOutcome> {
    match command {
        ReplCommand::Empty => {}
        ReplCommand::Send(text) => match controller.send_message(&text).await {
            Ok(()) if controller.transport() == TransportMode::Rest => {
                if let Some(reply) = controller.messages().last() {
                    writeln!(out, "{}", format_message(reply))?;
                }
            }
            Ok(()) => {}
            Err(e) => writeln!(out, "! {}", e.user_message())?,
        },
        ReplCommand::NewSession => {
            let config = controller.config();
            match controller
                .create_session(&config.context_type, config.specialty.as_deref())
                .await
            {
                Ok(session) => writeln!(out, "Started session {}", session.id)?,
                Err(e) => writeln!(out, "! {}", e.user_message())?,
            }
        }
        ReplCommand::ListSessions => match controller.list_sessions().await {
            Ok(sessions) if sessions.is_empty() => writeln!(out, "No sessions yet")?,
            Ok(sessions) => {
                let current = controller.current_session().map(|s| s.id);
                for session in &sessions {
                    writeln!(out, "{}", format_session(session, current == Some(session.id)))?;
                }
            }
            Err(e) => writeln!(out, "! {}", e.user_message())?,
        },
        ReplCommand::LoadSession(id) => match controller.load_session(id).await {
            Ok(()) => {
                for message in controller.messages() {
                    writeln!(out, "{}", format_message(&message))?;
                }
            }
            Err(e) => writeln!(out, "! {}", e.user_message())?,
        },
        ReplCommand::DeleteSession(id) => match controller.delete_session(id).await {
            Ok(()) => writeln!(out, "Deleted session {}", id)?,
            Err(e) => writeln!(out, "! {}", e.user_message())?,
        },
        ReplCommand::Feedback {
            message_id,
            feedback_type,
            comment,
        } => match controller
            .send_feedback(message_id, feedback_type, comment.as_deref())
            .await
        {
            Ok(()) => writeln!(out, "Thanks for the feedback")?,
            Err(e) => writeln!(out, "Feedback not recorded: {}", e.user_message())?,
        },
        ReplCommand::ClearMessages => {
            controller.clear_messages();
            controller.clear_error();
        }
        ReplCommand::Help => writeln!(out, "{}", HELP)?,
        ReplCommand::Invalid(reason) => writeln!(out, "{}", reason)?,
        ReplCommand::Quit => return Ok(ReplOutcome::Quit),
    }
    Ok(ReplOutcome::Continue)
}

pub fn format_session(session: &Session, current: bool) -> String {
    let marker = if current { '*' } else { ' ' };
    let specialty = session
        .specialty
        .as_deref()
        .map(|s| format!(" ({})", s))
        .unwrap_or_default();
    format!(
        "{} {:>6}  {}{}  {}",
        marker,
        session.id,
        session.context_type,
        specialty,
        session.created_at.format("%Y-%m-%d %H:%M")
    )
}

pub fn format_message(message: &Message) -> String {
    let who = match message.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "assistant",
    };
    let mut line = format!("[{}] {}: {}", message.id, who, message.content);

    let mut meta = Vec::new();
    if let Some(provider) = &message.provider {
        meta.push(provider.clone());
    }
    if let Some(tokens) = message.tokens_used {
        meta.push(format!("{} tokens", tokens));
    }
    if message.was_cached == Some(true) {
        meta.push("cached".to_string());
    }
    if !meta.is_empty() {
        line.push_str(&format!("  ({})", meta.join(", ")));
    }
    line
}

/// Turns successive state snapshots into text to print while a reply
/// streams in.
#[derive(Debug, Default)]
pub struct StreamEcho {
    index: Option<usize>,
    printed: usize,
    last_error: Option<String>,
}

impl StreamEcho {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text not yet printed for the state, if any.
    ///
    /// Emits new fragments of the streaming reply, a newline once it
    /// settles, and any newly surfaced error.
    pub fn update(&mut self, state: &ChatState) -> Option<String> {
        let mut out = String::new();

        if let Some((idx, msg)) = state
            .messages
            .iter()
            .enumerate()
            .rev()
            .find(|(_, m)| m.role == MessageRole::Assistant)
        {
            let tracked = self.index == Some(idx);
            if msg.streaming || tracked {
                if !tracked || msg.content.len() < self.printed {
                    self.index = Some(idx);
                    self.printed = 0;
                    out.push_str("assistant: ");
                }
                if let Some(fresh) = msg.content.get(self.printed..) {
                    out.push_str(fresh);
                    self.printed = msg.content.len();
                }
                if !msg.streaming {
                    out.push('\n');
                    self.index = None;
                    self.printed = 0;
                }
            }
        } else {
            self.index = None;
            self.printed = 0;
        }

        if state.error != self.last_error {
            self.last_error = state.error.clone();
            if let Some(error) = &state.error {
                out.push_str(&format!("! {}\n", error));
            }
        }

        (!out.is_empty()).then_some(out)
    }
}

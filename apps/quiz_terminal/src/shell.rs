//! Text rendering of controller views and parsing of typed commands into intents.

use std::fmt;

use quiz_core::{FeedbackKind, Intent, Score, View};
use shared::domain::OptionLabel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Intent(Intent),
    Help,
    Quit,
    Busy,
    Unknown(String),
}

/// One screen of text for a view.
pub struct Frame<'a>(pub &'a View);

impl fmt::Display for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            View::Auth(auth) => {
                writeln!(f, "== {} ==", auth.title)?;
                writeln!(f, "Username: {}", or_not_set(&auth.username))?;
                writeln!(
                    f,
                    "Password: {}",
                    if auth.has_password { "(set)" } else { "(not set)" }
                )?;
                writeln!(f, "[submit] {}", auth.submit_label)?;
                writeln!(f, "[toggle] {}", auth.toggle_label)?;
                write_notice(f, auth.error.as_deref())
            }
            View::Prompt {
                button_label,
                score,
                notice,
                ..
            } => {
                writeln!(f, "== QA Session ==")?;
                write_score(f, *score)?;
                writeln!(f, "[next] {button_label}")?;
                write_notice(f, notice.as_deref())
            }
            View::Feedback {
                kind,
                message,
                score,
                notice,
                ..
            } => {
                writeln!(f, "== QA Session ==")?;
                write_score(f, *score)?;
                let marker = match kind {
                    FeedbackKind::Success => "+",
                    FeedbackKind::Danger => "x",
                };
                writeln!(f, "{marker} {message}")?;
                writeln!(f, "[next] Next Question")?;
                write_notice(f, notice.as_deref())
            }
            View::Question {
                text,
                options,
                score,
                notice,
                ..
            } => {
                writeln!(f, "== QA Session ==")?;
                write_score(f, *score)?;
                writeln!(f, "{text}")?;
                for option in options {
                    writeln!(f, "  {}. {}", option.label, option.text)?;
                }
                write_notice(f, notice.as_deref())
            }
            View::Completed { final_score } => {
                writeln!(f, "== Quiz Completed! ==")?;
                writeln!(f, "You have answered all available questions.")?;
                writeln!(f, "Final Score: {final_score}")
            }
        }
    }
}

pub fn render(view: &View) -> String {
    Frame(view).to_string()
}

fn or_not_set(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn write_score(f: &mut fmt::Formatter<'_>, score: Option<Score>) -> fmt::Result {
    match score {
        Some(score) => writeln!(f, "Score: {score}"),
        None => Ok(()),
    }
}

fn write_notice(f: &mut fmt::Formatter<'_>, notice: Option<&str>) -> fmt::Result {
    match notice {
        Some(notice) => writeln!(f, "! {notice}"),
        None => Ok(()),
    }
}

pub fn help(view: &View) -> &'static str {
    match view {
        View::Auth(_) => "commands: user <name>, pass <password> (the password is echoed as typed), submit, toggle, quit",
        View::Prompt { .. } | View::Feedback { .. } => "commands: next (or empty line), quit",
        View::Question { .. } => "commands: a, b, c, d, quit",
        View::Completed { .. } => "commands: quit",
    }
}

/// Maps one input line to a command for the view currently on screen.
pub fn parse_command(view: &View, line: &str) -> Command {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "quit" | "exit" | "q" => return Command::Quit,
        "help" | "?" => return Command::Help,
        _ => {}
    }

    let intent = match view {
        View::Auth(_) => match word.to_ascii_lowercase().as_str() {
            "user" | "username" if !rest.is_empty() => Intent::EditUsername(rest.to_string()),
            "pass" | "password" if !rest.is_empty() => Intent::EditPassword(rest.to_string()),
            "submit" | "go" => Intent::SubmitCredentials,
            "toggle" | "switch" => Intent::ToggleAuthMode,
            _ => return Command::Unknown(line.to_string()),
        },
        View::Prompt { .. } | View::Feedback { .. } => match word.to_ascii_lowercase().as_str() {
            "" | "next" | "n" => Intent::RequestQuestion,
            _ => return Command::Unknown(line.to_string()),
        },
        View::Question { .. } => match (word.parse::<OptionLabel>(), rest.is_empty()) {
            (Ok(label), true) => Intent::PickOption(label),
            _ => return Command::Unknown(line.to_string()),
        },
        View::Completed { .. } => return Command::Unknown(line.to_string()),
    };

    if view.controls_enabled() {
        Command::Intent(intent)
    } else {
        Command::Busy
    }
}

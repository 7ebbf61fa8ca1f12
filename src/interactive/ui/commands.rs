use crate::backend::Credentials;
use crate::interactive::application::fetch_service::FetchJob;
use std::time::Duration;

/// Side effects requested by [`super::app_state::AppState::update`]. The
/// runtime carries them out; the state never does I/O itself.
#[derive(Clone, Debug)]
pub enum Command {
    None,
    Fetch(FetchJob),
    ScheduleTick(Duration),
    CopyToClipboard(String),
    OpenUrl(String),
    ApplyCredentials(Credentials),
    Quit,
    Batch(Vec<Command>),
}

impl Command {
    /// Combine commands, dropping the `None`s.
    pub fn batch(commands: impl IntoIterator<Item = Command>) -> Command {
        let mut commands: Vec<Command> = commands
            .into_iter()
            .filter(|command| !matches!(command, Command::None))
            .collect();
        match commands.len() {
            0 => Command::None,
            1 => commands.pop().unwrap_or(Command::None),
            _ => Command::Batch(commands),
        }
    }
}

#[cfg(test)]
impl Command {
    /// Request kinds this command would start, in order.
    pub fn fetch_kinds(&self) -> Vec<crate::interactive::domain::models::RequestKind> {
        match self {
            Command::Fetch(job) => vec![job.request.kind()],
            Command::Batch(commands) => commands.iter().flat_map(Command::fetch_kinds).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_quit(&self) -> bool {
        match self {
            Command::Quit => true,
            Command::Batch(commands) => commands.iter().any(Command::is_quit),
            _ => false,
        }
    }
}

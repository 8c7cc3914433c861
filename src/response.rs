use crate::command::Command;
use crate::error::{Error, Result};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiStatus {
    Ok,
    Created,
    Accepted,
    NoContent,
    BadRequest,
    Unauthorized,
    NotFound,
    Other(u16),
}

impl From<u16> for ApiStatus {
    fn from(code: u16) -> Self {
        match code {
            200 => ApiStatus::Ok,
            201 => ApiStatus::Created,
            202 => ApiStatus::Accepted,
            204 => ApiStatus::NoContent,
            400 => ApiStatus::BadRequest,
            401 => ApiStatus::Unauthorized,
            404 => ApiStatus::NotFound,
            other => ApiStatus::Other(other),
        }
    }
}

impl ApiStatus {
    pub fn code(self) -> u16 {
        match self {
            ApiStatus::Ok => 200,
            ApiStatus::Created => 201,
            ApiStatus::Accepted => 202,
            ApiStatus::NoContent => 204,
            ApiStatus::BadRequest => 400,
            ApiStatus::Unauthorized => 401,
            ApiStatus::NotFound => 404,
            ApiStatus::Other(code) => code,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub tone: Tone,
    pub text: String,
}

impl Notice {
    fn new(tone: Tone, text: impl Into<String>) -> Self {
        Notice {
            tone,
            text: text.into(),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Action {
    /// 200: the body goes to the renderer.
    Render(Value),
    /// Anything else: print the notice, if any, and stop.
    Halt {
        status: ApiStatus,
        notice: Option<Notice>,
    },
}

impl Action {
    pub fn should_render(&self) -> bool {
        matches!(self, Action::Render(_))
    }
}

pub fn interpret(code: u16, command: Command, body: &str) -> Result<Action> {
    let status = ApiStatus::from(code);
    tracing::debug!(code = status.code(), %command, "interpreting response");
    let notice = match status {
        ApiStatus::Ok => return parse_body(body).map(Action::Render),
        ApiStatus::Created => match command {
            Command::Stashes => Some(Notice::new(Tone::Plain, "The stash has been created.")),
            _ => None,
        },
        ApiStatus::Accepted => Some(Notice::new(
            Tone::Plain,
            "The item was submitted for processing.",
        )),
        ApiStatus::NoContent => match command {
            Command::Health => Some(Notice::new(Tone::Plain, "Sensu is healthy")),
            Command::Aggregates | Command::Stashes => Some(Notice::new(
                Tone::Plain,
                "The item was successfully deleted.",
            )),
            _ => None,
        },
        ApiStatus::BadRequest => Some(Notice::new(Tone::Error, "The payload is malformed.")),
        ApiStatus::Unauthorized => Some(Notice::new(
            Tone::Error,
            "The request requires user authentication.",
        )),
        ApiStatus::NotFound => Some(Notice::new(Tone::Warning, "The item did not exist.")),
        ApiStatus::Other(code) => match command {
            Command::Health => Some(Notice::new(Tone::Error, "Sensu is not healthy.")),
            _ => Some(Notice::new(
                Tone::Error,
                format!(
                    "There was an error while trying to complete your request. Response code: {}",
                    code
                ),
            )),
        },
    };
    Ok(Action::Halt { status, notice })
}

fn parse_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(Error::MalformedResponse)
}

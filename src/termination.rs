use crate::error::Error;
use crate::render::{Palette, Renderer};
use crate::response::{Action, Tone};
use std::io::{self, StderrLock, StdoutLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    ApiStatus = 1,
    Transport = 2,
    Config = 3,
    Failure = 4,
}

pub trait Termination {
    fn exitcode(&self) -> ExitCode;

    /// `color` is the user's preference; each stream decides on its own.
    fn report(&self, color: bool) -> io::Result<()>;
}

impl Termination for Action {
    fn exitcode(&self) -> ExitCode {
        if self.should_render() {
            ExitCode::Ok
        } else {
            ExitCode::ApiStatus
        }
    }

    fn report(&self, color: bool) -> io::Result<()> {
        match self {
            Action::Render(value) => stdout(color).render(value),
            Action::Halt { status, notice } => {
                tracing::debug!(code = status.code(), "request did not succeed");
                match notice {
                    Some(notice) if notice.tone == Tone::Error => stderr(color).notice(notice),
                    Some(notice) => stdout(color).notice(notice),
                    None => Ok(()),
                }
            }
        }
    }
}

impl Termination for Error {
    fn exitcode(&self) -> ExitCode {
        match self {
            Error::Timeout | Error::Http(_) => ExitCode::Transport,
            Error::Config { .. } | Error::ConfigCreated(_) => ExitCode::Config,
            Error::Invalid { .. }
            | Error::MalformedResponse(_)
            | Error::Editor(_)
            | Error::Io(_) => ExitCode::Failure,
        }
    }

    fn report(&self, color: bool) -> io::Result<()> {
        stderr(color).error(&self.to_string())
    }
}

fn stdout(color: bool) -> Renderer<StdoutLock<'static>> {
    let stream = io::stdout();
    let palette = Palette::detect(color, &stream);
    Renderer::new(stream.lock(), palette)
}

fn stderr(color: bool) -> Renderer<StderrLock<'static>> {
    let stream = io::stderr();
    let palette = Palette::detect(color, &stream);
    Renderer::new(stream.lock(), palette)
}

/// Reports the outcome of the invocation and exits with its code.
pub fn terminate<T, E>(result: Result<T, E>, color: bool) -> !
where
    T: Termination,
    E: Termination,
{
    let code = match result {
        Ok(outcome) => finish(&outcome, color),
        Err(error) => finish(&error, color),
    };
    std::process::exit(code as i32);
}

fn finish(termination: &dyn Termination, color: bool) -> ExitCode {
    if let Err(error) = termination.report(color) {
        tracing::debug!(%error, "failed to write output");
    }
    termination.exitcode()
}

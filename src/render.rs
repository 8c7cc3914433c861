use crate::response::{Notice, Tone};
use crossterm::style::{style, Color, Stylize};
use crossterm::tty::IsTty;
use serde_json::{Map, Value};
use std::io::{self, Write};

pub const SEPARATOR: &str = "-------";
pub const NO_VALUES: &str = "no values for this request";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    /// Colors only when allowed and `stream` is a terminal. Stdout and
    /// stderr are checked separately, either may be redirected.
    pub fn detect<S: IsTty>(allowed: bool, stream: &S) -> Self {
        if allowed && stream.is_tty() {
            Palette { enabled: true }
        } else {
            Palette::plain()
        }
    }

    pub fn plain() -> Self {
        Palette { enabled: false }
    }

    pub fn paint(self, text: &str, color: Color) -> String {
        if self.enabled {
            style(text).with(color).to_string()
        } else {
            text.to_owned()
        }
    }

    fn tone(self, text: &str, tone: Tone) -> String {
        match tone {
            Tone::Plain => text.to_owned(),
            Tone::Warning => self.paint(text, Color::Cyan),
            Tone::Error => self.paint(text, Color::Red),
        }
    }
}

pub struct Renderer<W> {
    out: W,
    palette: Palette,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, palette: Palette) -> Self {
        Renderer { out, palette }
    }

    /// Writes `value` line by line, followed by the item count for
    /// non-empty objects and arrays.
    pub fn render(&mut self, value: &Value) -> io::Result<()> {
        if is_empty(value) {
            return writeln!(self.out, "{}", self.palette.paint(NO_VALUES, Color::Cyan));
        }
        match value {
            Value::Object(map) => self.pairs(map)?,
            Value::Array(items) => {
                for item in items {
                    writeln!(self.out, "{}", self.palette.paint(SEPARATOR, Color::Yellow))?;
                    match item {
                        Value::Object(map) => self.pairs(map)?,
                        other => writeln!(
                            self.out,
                            "{}",
                            self.palette.paint(&display(other), Color::Cyan)
                        )?,
                    }
                }
            }
            other => writeln!(
                self.out,
                "{}",
                self.palette.paint(&display(other), Color::Cyan)
            )?,
        }
        if let Some(count) = item_count(value) {
            let line = format!("{} total items", count);
            writeln!(self.out, "{}", self.palette.paint(&line, Color::Yellow))?;
        }
        Ok(())
    }

    pub fn notice(&mut self, notice: &Notice) -> io::Result<()> {
        writeln!(self.out, "{}", self.palette.tone(&notice.text, notice.tone))
    }

    pub fn error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{}", self.palette.tone(message, Tone::Error))
    }

    fn pairs(&mut self, map: &Map<String, Value>) -> io::Result<()> {
        for (key, value) in map {
            writeln!(
                self.out,
                "{}{}",
                self.palette.paint(&format!("{}:  ", key), Color::Cyan),
                self.palette.paint(&display(value), Color::Green)
            )?;
        }
        Ok(())
    }
}

/// Keys of an object or elements of an array; `None` for scalars.
pub fn item_count(value: &Value) -> Option<usize> {
    match value {
        Value::Object(map) => Some(map.len()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

// Strings print without quotes, everything else as compact JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

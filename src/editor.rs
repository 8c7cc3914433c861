use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::io::{self, BufRead, BufReader, Write};

/// Source of the payload for `stash create`.
pub trait StashEditor {
    fn create_stash(&mut self, path: &str) -> Result<Value>;
}

/// Asks for the stash content one key/value pair at a time.
pub struct PromptEditor<R, W> {
    input: R,
    output: W,
}

impl PromptEditor<BufReader<io::Stdin>, io::Stdout> {
    pub fn stdio() -> Self {
        PromptEditor::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptEditor<R, W> {
    pub fn new(input: R, output: W) -> Self {
        PromptEditor { input, output }
    }

    // None on a blank line or EOF.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(line.to_owned()))
        }
    }
}

impl<R: BufRead, W: Write> StashEditor for PromptEditor<R, W> {
    fn create_stash(&mut self, path: &str) -> Result<Value> {
        writeln!(
            self.output,
            "Creating stash '{}'. Leave the key empty to finish.",
            path
        )?;

        let mut content = Map::new();
        while let Some(key) = self.prompt("key")? {
            let value = self.prompt("value")?.unwrap_or_default();
            content.insert(key, typed_value(&value));
        }
        if content.is_empty() {
            return Err(Error::Editor(format!("stash '{}' has no content", path)));
        }

        let mut stash = Map::new();
        stash.insert("path".to_owned(), Value::String(path.to_owned()));
        stash.insert("content".to_owned(), Value::Object(content));
        if let Some(expire) = self.prompt("expire in seconds (empty for never)")? {
            let seconds = expire
                .parse::<u64>()
                .map_err(|_| Error::Editor(format!("invalid expire value '{}'", expire)))?;
            stash.insert("expire".to_owned(), Value::from(seconds));
        }
        Ok(Value::Object(stash))
    }
}

fn typed_value(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw) {
        Ok(value @ Value::Number(_)) | Ok(value @ Value::Bool(_)) | Ok(value @ Value::Null) => {
            value
        }
        _ => Value::String(raw.to_owned()),
    }
}

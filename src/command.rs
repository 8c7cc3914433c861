use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Clients,
    Info,
    Health,
    Stashes,
    Checks,
    Events,
    Resolve,
    Silence,
    Aggregates,
}

impl Command {
    #[cfg(test)]
    pub const ALL: [Command; 9] = [
        Command::Clients,
        Command::Info,
        Command::Health,
        Command::Stashes,
        Command::Checks,
        Command::Events,
        Command::Resolve,
        Command::Silence,
        Command::Aggregates,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Clients => "clients",
            Command::Info => "info",
            Command::Health => "health",
            Command::Stashes => "stashes",
            Command::Checks => "checks",
            Command::Events => "events",
            Command::Resolve => "resolve",
            Command::Silence => "silence",
            Command::Aggregates => "aggregates",
        }
    }

    /// Only these endpoints accept `limit`/`offset`.
    pub fn paginated(self) -> bool {
        matches!(
            self,
            Command::Stashes | Command::Clients | Command::Aggregates
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    Text(String),
    Int(u64),
    Flag(bool),
    List(Vec<String>),
}

impl Field {
    pub fn as_int(&self) -> Option<u64> {
        match self {
            Field::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Field::Text(text) => Value::String(text.clone()),
            Field::Int(value) => Value::from(*value),
            Field::Flag(flag) => Value::Bool(*flag),
            Field::List(items) => Value::from(items.clone()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Text(text) => write!(f, "{}", text),
            Field::Int(value) => write!(f, "{}", value),
            Field::Flag(flag) => write!(f, "{}", flag),
            Field::List(items) => write!(f, "{}", items.join(",")),
        }
    }
}

impl From<&str> for Field {
    fn from(text: &str) -> Self {
        Field::Text(text.to_owned())
    }
}

impl From<String> for Field {
    fn from(text: String) -> Self {
        Field::Text(text)
    }
}

impl From<u64> for Field {
    fn from(value: u64) -> Self {
        Field::Int(value)
    }
}

impl From<bool> for Field {
    fn from(flag: bool) -> Self {
        Field::Flag(flag)
    }
}

impl From<Vec<String>> for Field {
    fn from(items: Vec<String>) -> Self {
        Field::List(items)
    }
}

/// What the user asked for, as parsed from the command line.
///
/// Built once through the consuming `with*` methods and read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    command: Command,
    method: Method,
    fields: IndexMap<String, Field>,
}

impl Descriptor {
    pub fn new(command: Command, method: Method) -> Self {
        Descriptor {
            command,
            method,
            fields: IndexMap::new(),
        }
    }

    pub fn with<V: Into<Field>>(mut self, key: &str, value: V) -> Self {
        self.fields.insert(key.to_owned(), value.into());
        self
    }

    pub fn with_opt<V: Into<Field>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.fields.get(key), Some(Field::Flag(true)))
    }
}

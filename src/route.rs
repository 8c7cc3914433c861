use crate::command::{Command, Descriptor, Field, Method};
use crate::editor::StashEditor;
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, PartialEq)]
pub struct RequestPlan {
    path: String,
    method: Method,
    payload: Option<String>,
}

impl RequestPlan {
    fn new(path: String, method: Method, payload: Option<Value>) -> Self {
        let payload = match (method, payload) {
            (Method::Post, payload) => payload.map(|payload| payload.to_string()),
            (method, Some(_)) => {
                tracing::warn!(?method, %path, "dropping payload of a non-POST request");
                None
            }
            (_, None) => None,
        };
        RequestPlan {
            path,
            method,
            payload,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

/// Seconds since the epoch, the clock used for silence timestamps.
pub fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// Maps a descriptor to the request the API expects.
///
/// The path is assembled from an ordered list of optional segments, the
/// pagination suffix always last. `editor` is only asked for a payload when a
/// stash is being created.
pub fn build(
    descriptor: &Descriptor,
    now: u64,
    editor: &mut dyn StashEditor,
) -> Result<RequestPlan> {
    let field = |key: &str| descriptor.field(key);

    let (mut segments, payload) = match descriptor.command() {
        Command::Clients => {
            let history = field("name")
                .filter(|_| descriptor.flag("history"))
                .map(|_| "/history".to_owned());
            (
                vec![literal("/clients"), segment(field("name")), history],
                None,
            )
        }
        Command::Info => (vec![literal("/info")], None),
        Command::Health => (
            vec![
                literal("/health"),
                query(&[
                    ("consumers", field("consumers")),
                    ("messages", field("messages")),
                ]),
            ],
            None,
        ),
        Command::Stashes => {
            let payload = if descriptor.flag("create") {
                let target = field("create_path")
                    .map(|path| path.to_string())
                    .unwrap_or_default();
                Some(editor.create_stash(&target)?)
            } else {
                None
            };
            (vec![literal("/stashes"), segment(field("path"))], payload)
        }
        Command::Checks => match (field("name"), field("subscribers")) {
            (Some(name), _) => (vec![Some(format!("/check/{}", name))], None),
            (None, Some(subscribers)) => (
                vec![literal("/check/request")],
                Some(object(vec![
                    ("check", json_or_null(field("check"))),
                    ("subscribers", subscribers.to_json()),
                ])),
            ),
            (None, None) => (vec![literal("/checks")], None),
        },
        Command::Events => (
            vec![
                literal("/events"),
                segment(field("client")),
                segment(field("check")),
            ],
            None,
        ),
        Command::Resolve => (
            vec![literal("/event/resolve")],
            Some(object(vec![
                ("client", json_or_null(field("client"))),
                ("check", json_or_null(field("check"))),
            ])),
        ),
        Command::Silence => {
            let mut entries = vec![("timestamp", Value::from(now))];
            if let Some(reason) = field("reason") {
                entries.push(("reason", reason.to_json()));
            }
            if let Some(minutes) = field("expires").and_then(Field::as_int) {
                let expires = minutes
                    .checked_mul(60)
                    .and_then(|seconds| now.checked_add(seconds))
                    .ok_or_else(|| Error::Invalid {
                        message: format!("expiry of {} minutes is out of range", minutes),
                    })?;
                entries.push(("expires", Value::from(expires)));
            }
            (
                vec![
                    literal("/stashes/silence"),
                    segment(field("client")),
                    segment(field("check")),
                ],
                Some(object(entries)),
            )
        }
        Command::Aggregates => (
            vec![
                literal("/aggregates"),
                segment(field("check")),
                segment(field("id")),
            ],
            None,
        ),
    };

    if descriptor.command().paginated() {
        segments.push(pagination(field("limit"), field("offset")));
    }

    let path: String = segments.into_iter().flatten().collect();
    tracing::debug!(command = %descriptor.command(), %path, "built request plan");
    Ok(RequestPlan::new(path, descriptor.method(), payload))
}

fn literal(text: &str) -> Option<String> {
    Some(text.to_owned())
}

fn segment(value: Option<&Field>) -> Option<String> {
    value.map(|value| format!("/{}", value))
}

fn query(pairs: &[(&str, Option<&Field>)]) -> Option<String> {
    let present: Vec<String> = pairs
        .iter()
        .filter_map(|(key, value)| value.map(|value| format!("{}={}", key, value)))
        .collect();
    if present.is_empty() {
        None
    } else {
        Some(format!("?{}", present.join("&")))
    }
}

// An offset without a limit is ignored by the API, so it is not sent.
fn pagination(limit: Option<&Field>, offset: Option<&Field>) -> Option<String> {
    match (limit, offset) {
        (Some(limit), Some(offset)) => Some(format!("?limit={}&offset={}", limit, offset)),
        (Some(limit), None) => Some(format!("?limit={}", limit)),
        (None, _) => None,
    }
}

fn json_or_null(value: Option<&Field>) -> Value {
    value.map(Field::to_json).unwrap_or(Value::Null)
}

fn object(entries: Vec<(&str, Value)>) -> Value {
    let map: Map<String, Value> = entries
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::{build, RequestPlan};
    use crate::command::{Command, Descriptor, Method};
    use crate::editor::StashEditor;
    use crate::error::{Error, Result};
    use serde_json::{json, Value};

    const NOW: u64 = 1_600_000_000;

    /// Hands out a fixed stash and remembers which path it was asked for.
    struct FixedEditor {
        requested: Vec<String>,
    }

    impl StashEditor for FixedEditor {
        fn create_stash(&mut self, path: &str) -> Result<Value> {
            self.requested.push(path.to_owned());
            Ok(json!({"path": path, "content": {"owner": "ops"}}))
        }
    }

    struct FailingEditor;

    impl StashEditor for FailingEditor {
        fn create_stash(&mut self, _path: &str) -> Result<Value> {
            Err(Error::Editor("aborted".to_owned()))
        }
    }

    fn plan(descriptor: Descriptor) -> RequestPlan {
        let mut editor = FixedEditor {
            requested: Vec::new(),
        };
        build(&descriptor, NOW, &mut editor).unwrap()
    }

    fn get(command: Command) -> Descriptor {
        Descriptor::new(command, Method::Get)
    }

    fn payload(plan: &RequestPlan) -> Value {
        serde_json::from_str(plan.payload().unwrap()).unwrap()
    }

    #[test]
    fn test_every_command_has_absolute_path() {
        for command in Command::ALL.iter() {
            let plan = plan(get(*command));
            assert!(plan.path().starts_with('/'), "{}", plan.path());
            assert!(plan.path().len() > 1);
        }
    }

    #[test]
    fn test_clients_paths() {
        assert_eq!(plan(get(Command::Clients)).path(), "/clients");
        assert_eq!(
            plan(get(Command::Clients).with("name", "web-01")).path(),
            "/clients/web-01"
        );
        assert_eq!(
            plan(get(Command::Clients).with("name", "web-01").with("history", true)).path(),
            "/clients/web-01/history"
        );
        // history needs a client
        assert_eq!(
            plan(get(Command::Clients).with("history", true)).path(),
            "/clients"
        );
    }

    #[test]
    fn test_pagination_suffix() {
        assert_eq!(
            plan(get(Command::Clients).with("limit", 10u64).with("offset", 20u64)).path(),
            "/clients?limit=10&offset=20"
        );
        assert_eq!(
            plan(get(Command::Stashes).with("limit", 5u64)).path(),
            "/stashes?limit=5"
        );
        assert_eq!(
            plan(get(Command::Stashes).with("offset", 5u64)).path(),
            "/stashes"
        );
        assert_eq!(
            plan(
                get(Command::Aggregates)
                    .with("check", "disk")
                    .with("id", 42u64)
                    .with("limit", 1u64)
            )
            .path(),
            "/aggregates/disk/42?limit=1"
        );
    }

    #[test]
    fn test_pagination_only_for_paginated_commands() {
        let events = get(Command::Events)
            .with("limit", 10u64)
            .with("offset", 1u64);
        assert_eq!(plan(events).path(), "/events");

        let health = get(Command::Health)
            .with("consumers", 2u64)
            .with("messages", 100u64)
            .with("limit", 10u64);
        assert_eq!(plan(health).path(), "/health?consumers=2&messages=100");
    }

    #[test]
    fn test_health_query_omits_absent_fields() {
        assert_eq!(
            plan(get(Command::Health).with("messages", 3u64)).path(),
            "/health?messages=3"
        );
        assert_eq!(plan(get(Command::Health)).path(), "/health");
    }

    #[test]
    fn test_checks_routing() {
        let show = plan(get(Command::Checks).with("name", "cpu").with("subscribers", vec!["web".to_owned()]));
        assert_eq!(show.path(), "/check/cpu");
        assert_eq!(show.payload(), None);

        let request = plan(
            Descriptor::new(Command::Checks, Method::Post)
                .with("check", "cpu")
                .with("subscribers", vec!["web".to_owned(), "db".to_owned()]),
        );
        assert_eq!(request.path(), "/check/request");
        assert_eq!(request.method(), Method::Post);
        assert_eq!(
            payload(&request),
            json!({"check": "cpu", "subscribers": ["web", "db"]})
        );

        assert_eq!(plan(get(Command::Checks)).path(), "/checks");
    }

    #[test]
    fn test_events_paths() {
        assert_eq!(
            plan(get(Command::Events).with("client", "web-01")).path(),
            "/events/web-01"
        );
        let delete = plan(
            Descriptor::new(Command::Events, Method::Delete)
                .with("client", "web-01")
                .with("check", "cpu"),
        );
        assert_eq!(delete.path(), "/events/web-01/cpu");
        assert_eq!(delete.method(), Method::Delete);
    }

    #[test]
    fn test_resolve_payload() {
        let resolve = plan(
            Descriptor::new(Command::Resolve, Method::Post)
                .with("client", "web-01")
                .with("check", "cpu"),
        );
        assert_eq!(resolve.path(), "/event/resolve");
        assert_eq!(payload(&resolve), json!({"client": "web-01", "check": "cpu"}));
        assert_eq!(resolve.payload(), Some(r#"{"client":"web-01","check":"cpu"}"#));
    }

    #[test]
    fn test_silence_payload() {
        let silence = plan(
            Descriptor::new(Command::Silence, Method::Post)
                .with("client", "web-01")
                .with("check", "cpu")
                .with("reason", "maintenance")
                .with("expires", 5u64),
        );
        assert_eq!(silence.path(), "/stashes/silence/web-01/cpu");
        assert_eq!(
            payload(&silence),
            json!({"timestamp": NOW, "reason": "maintenance", "expires": NOW + 300})
        );
        assert_eq!(
            silence.payload(),
            Some(r#"{"timestamp":1600000000,"reason":"maintenance","expires":1600000300}"#)
        );

        let bare = plan(Descriptor::new(Command::Silence, Method::Post).with("client", "web-01"));
        assert_eq!(bare.path(), "/stashes/silence/web-01");
        assert_eq!(payload(&bare), json!({ "timestamp": NOW }));
    }

    #[test]
    fn test_silence_expiry_out_of_range() {
        let mut editor = FailingEditor;
        let descriptor = Descriptor::new(Command::Silence, Method::Post)
            .with("client", "web-01")
            .with("expires", u64::MAX / 30);
        let result = build(&descriptor, NOW, &mut editor);
        assert!(matches!(result, Err(Error::Invalid { .. })));

        let largest = (u64::MAX - NOW) / 60;
        let silence = plan(
            Descriptor::new(Command::Silence, Method::Post).with("expires", largest),
        );
        assert_eq!(payload(&silence)["expires"], json!(NOW + largest * 60));
    }

    #[test]
    fn test_stash_create_uses_editor() {
        let descriptor = Descriptor::new(Command::Stashes, Method::Post)
            .with("create", true)
            .with("create_path", "maintenance/web-01");
        let mut editor = FixedEditor {
            requested: Vec::new(),
        };
        let plan = build(&descriptor, NOW, &mut editor).unwrap();
        assert_eq!(editor.requested, ["maintenance/web-01"]);
        assert_eq!(plan.path(), "/stashes");
        assert_eq!(
            payload(&plan),
            json!({"path": "maintenance/web-01", "content": {"owner": "ops"}})
        );
    }

    #[test]
    fn test_stash_show_skips_editor() {
        let descriptor = get(Command::Stashes).with("path", "silence/web-01");
        let plan = build(&descriptor, NOW, &mut FailingEditor).unwrap();
        assert_eq!(plan.path(), "/stashes/silence/web-01");
        assert_eq!(plan.payload(), None);
    }

    #[test]
    fn test_stash_editor_failure_propagates() {
        let descriptor = Descriptor::new(Command::Stashes, Method::Post)
            .with("create", true)
            .with("create_path", "a");
        let result = build(&descriptor, NOW, &mut FailingEditor);
        assert!(matches!(result, Err(Error::Editor(_))));
    }

    #[test]
    fn test_payload_only_for_post() {
        let resolve = plan(
            Descriptor::new(Command::Resolve, Method::Get)
                .with("client", "web-01")
                .with("check", "cpu"),
        );
        assert_eq!(resolve.method(), Method::Get);
        assert_eq!(resolve.payload(), None);
    }
}

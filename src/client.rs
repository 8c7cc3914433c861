use crate::command::Method;
use crate::config::Config;
use crate::error::Result;
use crate::route::RequestPlan;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const READ_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

pub struct SensuApiClient {
    base_url: String,
    credentials: Option<(String, String)>,
    http: Client,
}

impl SensuApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        SensuApiClient::with_timeouts(config, CONNECT_TIMEOUT, READ_TIMEOUT)
    }

    pub fn with_timeouts(config: &Config, connect: Duration, read: Duration) -> Result<Self> {
        if config.accepts_invalid_certs() {
            tracing::warn!(
                host = %config.host,
                "TLS certificate verification is disabled, set verify_tls = true to enable it"
            );
        }
        let http = Client::builder()
            .danger_accept_invalid_certs(config.accepts_invalid_certs())
            .connect_timeout(connect)
            .timeout(read)
            .build()?;

        Ok(SensuApiClient {
            base_url: config.base_url(),
            credentials: config
                .credentials()
                .map(|(user, password)| (user.to_owned(), password.to_owned())),
            http,
        })
    }

    /// Performs the planned request. Any status code is a successful send;
    /// only timeouts and connection level failures are errors.
    pub fn send(&self, plan: &RequestPlan) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, plan.path());
        let mut request = match plan.method() {
            Method::Get => self.http.get(&url),
            Method::Delete => self.http.delete(&url),
            Method::Post => self
                .http
                .post(&url)
                .header(CONTENT_TYPE, "application/json")
                .body(plan.payload().unwrap_or_default().to_owned()),
        };
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        tracing::debug!(method = ?plan.method(), %url, "sending request");
        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        tracing::debug!(status, bytes = body.len(), "received response");

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiResponse, SensuApiClient};
    use crate::command::{Command, Descriptor, Method};
    use crate::config::Config;
    use crate::editor::StashEditor;
    use crate::error::{Error, Result};
    use crate::route::{build, RequestPlan};
    use serde_json::Value;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Duration;

    struct NoEditor;

    impl StashEditor for NoEditor {
        fn create_stash(&mut self, _path: &str) -> Result<Value> {
            Err(Error::Editor("not interactive".to_owned()))
        }
    }

    fn plan(descriptor: Descriptor) -> RequestPlan {
        build(&descriptor, 1_600_000_000, &mut NoEditor).unwrap()
    }

    fn reply(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answers a single request with `response` and hands back what it read.
    fn serve_once(response: String) -> (Config, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        let config = Config {
            host: "127.0.0.1".to_owned(),
            port,
            ..Config::default()
        };
        (config, handle)
    }

    #[test]
    fn test_get_request() {
        let (config, server) = serve_once(reply("200 OK", r#"{"version":"0.29"}"#));
        let client = SensuApiClient::new(&config).unwrap();
        let response = client
            .send(&plan(Descriptor::new(Command::Info, Method::Get)))
            .unwrap();
        assert_eq!(
            response,
            ApiResponse {
                status: 200,
                body: r#"{"version":"0.29"}"#.to_owned()
            }
        );

        let request = server.join().unwrap().to_lowercase();
        assert!(request.starts_with("get /info http/1.1\r\n"));
        assert!(!request.contains("authorization:"));
    }

    #[test]
    fn test_post_request_with_basic_auth() {
        let (mut config, server) = serve_once(reply("202 Accepted", ""));
        config.user = Some("admin".to_owned());
        config.password = Some("secret".to_owned());

        let client = SensuApiClient::new(&config).unwrap();
        let resolve = Descriptor::new(Command::Resolve, Method::Post)
            .with("client", "web-01")
            .with("check", "cpu");
        let response = client.send(&plan(resolve)).unwrap();
        assert_eq!(response.status, 202);
        assert_eq!(response.body, "");

        let request = server.join().unwrap();
        let lowered = request.to_lowercase();
        assert!(lowered.starts_with("post /event/resolve http/1.1\r\n"));
        assert!(lowered.contains("content-type: application/json\r\n"));
        assert!(request.contains("Basic YWRtaW46c2VjcmV0"));
        assert!(request.ends_with(r#"{"client":"web-01","check":"cpu"}"#));
    }

    #[test]
    fn test_basic_auth_needs_both_credentials() {
        let (mut config, server) = serve_once(reply("204 No Content", ""));
        config.user = Some("admin".to_owned());

        let client = SensuApiClient::new(&config).unwrap();
        let delete = Descriptor::new(Command::Stashes, Method::Delete).with("path", "silence/web-01");
        let response = client.send(&plan(delete)).unwrap();
        assert_eq!(response.status, 204);

        let request = server.join().unwrap().to_lowercase();
        assert!(request.starts_with("delete /stashes/silence/web-01 http/1.1\r\n"));
        assert!(!request.contains("authorization:"));
    }

    #[test]
    fn test_error_status_is_not_a_transport_failure() {
        let (config, server) = serve_once(reply("404 Not Found", ""));
        let client = SensuApiClient::new(&config).unwrap();
        let show = Descriptor::new(Command::Clients, Method::Get).with("name", "gone");
        let response = client.send(&plan(show)).unwrap();
        assert_eq!(response.status, 404);
        server.join().unwrap();
    }

    #[test]
    fn test_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            thread::sleep(Duration::from_secs(2));
        });

        let config = Config {
            port,
            ..Config::default()
        };
        let client = SensuApiClient::with_timeouts(
            &config,
            Duration::from_secs(1),
            Duration::from_millis(200),
        )
        .unwrap();
        let result = client.send(&plan(Descriptor::new(Command::Info, Method::Get)));
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[test]
    fn test_connection_refused() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = Config {
            port,
            ..Config::default()
        };
        let client = SensuApiClient::new(&config).unwrap();
        let result = client.send(&plan(Descriptor::new(Command::Info, Method::Get)));
        match result {
            Err(Error::Http(message)) => assert!(!message.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }
}

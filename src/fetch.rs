use crate::config::Config;
use rand::Rng;
use regex::Regex;
use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Too many redirects (limit {limit}) while downloading \"{url}\"")]
    TooManyRedirects { url: String, limit: usize },
    #[error("Redirect from \"{0}\" has no Location header")]
    MissingLocation(String),
    #[error("Could not download file from \"{url}\": HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Could not download file from \"{url}\": {reason}")]
    Transport { url: String, reason: String },
    #[error("Could not create temporary file for download: {0}")]
    TempFile(#[source] io::Error),
}

/// One HTTP response, redirects not followed.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub status: u16,
    pub location: Option<String>,
    pub body: Vec<u8>,
}

pub trait Transport {
    fn get(&self, url: &str) -> Result<Reply, FetchError>;
}

pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .redirects(0)
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(&config.user_agent)
            .build();

        Self { agent }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Reply, FetchError> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Ok(Reply {
                    status,
                    ..Reply::default()
                })
            }
            Err(e) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        let status = response.status();
        let location = response.header("Location").map(str::to_string);
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Reply {
            status,
            location,
            body,
        })
    }
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^https?://.+").expect("valid URL pattern"))
}

fn origin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(https?://[^/?#]+)").expect("valid origin pattern"))
}

pub fn is_url(text: &str) -> bool {
    url_pattern().is_match(text)
}

/// Makes control characters in a URL visible in log output.
fn escape_control(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            '\0' => escaped.push_str("\\0"),
            '\x1b' => escaped.push_str("\\033"),
            c if c.is_control() => escaped.push_str(&format!("\\x{:02x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

fn resolve_location(current: &str, location: &str) -> String {
    if is_url(location) {
        return location.to_string();
    }

    let origin = origin_pattern()
        .captures(current)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("");

    if location.starts_with('/') {
        format!("{}{}", origin, location)
    } else {
        let base = match current.rfind('/') {
            Some(index) if index >= origin.len() => &current[..=index],
            _ => return format!("{}/{}", origin, location),
        };
        format!("{}{}", base, location)
    }
}

pub struct Fetcher {
    transport: Box<dyn Transport>,
    max_redirects: usize,
    debug: bool,
}

impl Fetcher {
    pub fn new(config: &Config) -> Self {
        Self::with_transport(Box::new(HttpTransport::new(config)), config)
    }

    pub fn with_transport(transport: Box<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            max_redirects: config.max_redirects,
            debug: config.debug,
        }
    }

    fn trace(&self, hop: usize, message: String) {
        if self.debug {
            log::debug!("{}{}", " ".repeat((hop + 1) * 2), message);
        }
    }

    /// Downloads `url` into a fresh temporary file and returns its path.
    /// Removing the file is up to the caller.
    pub fn fetch(&self, url: &str) -> Result<PathBuf, FetchError> {
        let mut current = url.to_string();
        let mut hop = 0;

        let body = loop {
            self.trace(hop, format!("Downloading file from \"{}\".", escape_control(&current)));
            let reply = self.transport.get(&current)?;

            match reply.status {
                301 | 302 | 303 | 307 | 308 => {
                    let location = reply
                        .location
                        .ok_or_else(|| FetchError::MissingLocation(current.clone()))?;
                    let next = resolve_location(&current, &location);

                    hop += 1;
                    if hop > self.max_redirects {
                        return Err(FetchError::TooManyRedirects {
                            url: url.to_string(),
                            limit: self.max_redirects,
                        });
                    }

                    self.trace(hop, format!("Redirecting to \"{}\".", escape_control(&next)));
                    current = next;
                }
                200..=299 => break reply.body,
                status => {
                    return Err(FetchError::Status {
                        url: current,
                        status,
                    })
                }
            }
        };

        let path = write_temp_file(&body)?;
        self.trace(hop, format!("Saved to: {}", path.display()));
        Ok(path)
    }
}

fn write_temp_file(body: &[u8]) -> Result<PathBuf, FetchError> {
    let mut rng = rand::thread_rng();

    loop {
        let path = std::env::temp_dir().join(format!("axilang-{:016x}", rng.gen::<u64>()));
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(FetchError::TempFile(e)),
        };

        file.write_all(body).map_err(FetchError::TempFile)?;
        return Ok(path);
    }
}

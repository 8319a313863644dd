use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Append-only capture of raw HTTP exchanges, kept for troubleshooting.
/// Write failures are logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct DumpFile {
    path: PathBuf,
}

impl DumpFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, text: &str) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(text.as_bytes()));

        if let Err(err) = result {
            warn!(path = %self.path().display(), error = %err, "failed to write dump file");
        }
    }
}

/// Render a request the way it goes on the wire: request line, headers, blank line.
/// The authorization value is never written out.
pub fn format_request(request: &reqwest::Request) -> String {
    let url = request.url();
    let mut target = url.path().to_string();
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }

    let mut out = format!("{} {} HTTP/1.1\n", request.method(), target);
    if let Some(host) = url.host_str() {
        out.push_str(&format!("host: {}\n", host));
    }
    for (name, value) in request.headers() {
        let value = if *name == reqwest::header::AUTHORIZATION {
            "[redacted]"
        } else {
            value.to_str().unwrap_or("[binary]")
        };
        out.push_str(&format!("{}: {}\n", name, value));
    }
    out.push('\n');
    out
}

/// Render a response status line, headers and body.
pub fn format_response(
    version: reqwest::Version,
    status: reqwest::StatusCode,
    headers: &reqwest::header::HeaderMap,
    body: &str,
) -> String {
    let mut out = format!("{:?} {}\n", version, status);
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\n", name, value.to_str().unwrap_or("[binary]")));
    }
    out.push('\n');
    out.push_str(body);
    out.push_str("\n\n");
    out
}

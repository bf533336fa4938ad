//! Shared fixtures for integration tests.
#![allow(dead_code)]

use deskvfs::backend::LocalBackend;
use deskvfs::config::AppConfig;
use deskvfs::desktop::Desktop;
use deskvfs::notes::NotesSurface;
use deskvfs::session::Session;
use deskvfs::shell::Shell;
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Desktop over a sled store in a temporary directory
pub struct TestDesktop {
    pub dir: TempDir,
    pub desktop: Desktop,
}

impl TestDesktop {
    pub fn new() -> Self {
        Self::with(AppConfig::default(), None)
    }

    pub fn with(config: AppConfig, session: Option<Session>) -> Self {
        let dir = TempDir::new().unwrap();
        let local = LocalBackend::open(&dir.path().join("store")).unwrap();
        let desktop = Desktop::with_local(config, session, local).unwrap();
        Self { dir, desktop }
    }

    /// Terminal over the seeded tree, without a background sync loop
    pub async fn shell(&self) -> Shell {
        self.desktop.sync_loop().load().await.unwrap();
        self.bare_shell()
    }

    /// Terminal over whatever the tree holds now
    pub fn bare_shell(&self) -> Shell {
        Shell::new(
            self.desktop.tree().clone(),
            self.desktop.selector().clone(),
            &self.desktop.config().shell,
        )
    }

    /// Notes view over the same tree, without a background sync loop
    pub fn notes(&self) -> NotesSurface {
        NotesSurface::new(
            self.desktop.tree().clone(),
            self.desktop.selector().clone(),
            self.desktop.tracker().clone(),
            &self.desktop.config().shell,
        )
    }

    pub fn exists(&self, path: &str) -> bool {
        self.desktop.tree().read().get(path).is_some()
    }

    pub fn child_names(&self, dir: &str) -> Vec<String> {
        self.desktop
            .tree()
            .read()
            .children_of(dir)
            .into_iter()
            .map(|n| n.name.clone())
            .collect()
    }
}

/// Run lines in order and return the last output.
pub async fn run(shell: &mut Shell, lines: &[&str]) -> String {
    let mut last = String::new();
    for line in lines {
        last = shell.submit(line).await;
    }
    last
}

/// Canned response for one method and path
#[derive(Clone)]
pub struct Route {
    pub method: &'static str,
    pub path: String,
    pub status: u16,
    pub body: String,
}

impl Route {
    pub fn new(method: &'static str, path: &str, status: u16, body: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            status,
            body: body.to_string(),
        }
    }
}

/// Minimal HTTP/1.1 server answering from a fixed route table
pub struct FakeRemote {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl FakeRemote {
    pub async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = routes.clone();
                let seen = seen.clone();
                tokio::spawn(async move { answer(stream, &routes, &seen).await });
            }
        });
        Self {
            base_url: format!("http://{}", addr),
            requests,
            task,
        }
    }

    /// `"METHOD /path"` for every request received, in arrival order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.remote.base_url = self.base_url.clone();
        config.remote.timeout_secs = 5;
        config
    }
}

impl Drop for FakeRemote {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Server that accepts connections and never answers
pub struct SilentRemote {
    pub base_url: String,
    task: JoinHandle<()>,
}

impl SilentRemote {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        Self {
            base_url: format!("http://{}", addr),
            task,
        }
    }

    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.remote.base_url = self.base_url.clone();
        config.remote.timeout_secs = 2;
        config
    }
}

impl Drop for SilentRemote {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

async fn answer(mut stream: TcpStream, routes: &[Route], seen: &Mutex<Vec<String>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head = loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            if buf.len() >= end + 4 + content_length(&head) {
                break head;
            }
        }
    };

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    seen.lock().push(format!("{} {}", method, path));

    let (status, body) = routes
        .iter()
        .find(|r| r.method == method && r.path == path)
        .map(|r| (r.status, r.body.clone()))
        .unwrap_or((404, r#"{"error":"no such route"}"#.to_string()));
    let response = format!(
        "HTTP/1.1 {} Fake\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

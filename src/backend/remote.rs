//! REST client for the remote file store.

use super::{BackendKind, FileBackend, HistoryEntry};
use crate::config::RemoteConfig;
use crate::error::{ApiError, BackendError};
use crate::session::Session;
use crate::types::{FileNode, NewNode, NodeId, NodePatch};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const FILES_ENDPOINT: &str = "/api/desktop/files";
const HISTORY_ENDPOINT: &str = "/api/desktop/terminal-history";

/// `code` the store sends when a create collides with an existing path
const PATH_EXISTS_CODE: &str = "PATH_EXISTS";

/// Shared HTTP client; cheap to clone
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bind the client to a credential
    pub fn with_session(&self, session: Session) -> RemoteBackend {
        RemoteBackend {
            client: self.clone(),
            session,
        }
    }
}

/// Remote store as seen by one signed-in owner
#[derive(Clone)]
pub struct RemoteBackend {
    client: RemoteClient,
    session: Session,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody {
    Bare(Vec<FileNode>),
    Wrapped { files: Vec<FileNode> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NodeBody {
    Bare(FileNode),
    Wrapped { file: FileNode },
}

impl NodeBody {
    fn into_node(self) -> FileNode {
        match self {
            NodeBody::Bare(node) | NodeBody::Wrapped { file: node } => node,
        }
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Deserialize)]
struct HistoryRow {
    command: String,
}

/// What a request was about, for mapping error statuses
enum Subject<'a> {
    Listing,
    Path(&'a str),
    Node(NodeId),
}

impl RemoteBackend {
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.client.base_url, endpoint)
    }

    fn node_url(&self, id: NodeId) -> String {
        format!("{}{}/{}", self.client.base_url, FILES_ENDPOINT, id)
    }

    fn identity(node: &FileNode) -> Result<NodeId, BackendError> {
        node.id
            .ok_or_else(|| BackendError::MissingIdentity(node.path.clone()))
    }

    /// Pass successful responses through; map everything else to a `BackendError`.
    async fn check(response: Response, subject: Subject<'_>) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

        match subject {
            Subject::Node(id) if status == StatusCode::NOT_FOUND => Err(BackendError::NotFound(id)),
            Subject::Path(path)
                if status == StatusCode::BAD_REQUEST
                    && body.code.as_deref() == Some(PATH_EXISTS_CODE) =>
            {
                Err(BackendError::PathExists(path.to_string()))
            }
            _ => Err(BackendError::Status {
                status: status.as_u16(),
                message: body.error.unwrap_or(text),
            }),
        }
    }
}

#[async_trait]
impl FileBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn addresses(&self, node: &FileNode) -> bool {
        node.id.is_some()
    }

    async fn list(&self) -> Result<Vec<FileNode>, BackendError> {
        let response = self
            .client
            .http
            .get(self.url(FILES_ENDPOINT))
            .bearer_auth(&self.session.token)
            .send()
            .await?;
        let response = Self::check(response, Subject::Listing).await?;
        let nodes = match response.json::<ListBody>().await? {
            ListBody::Bare(nodes) | ListBody::Wrapped { files: nodes } => nodes,
        };
        debug!(count = nodes.len(), "listed remote files");
        Ok(nodes)
    }

    async fn create(&self, node: NewNode) -> Result<FileNode, BackendError> {
        let response = self
            .client
            .http
            .post(self.url(FILES_ENDPOINT))
            .bearer_auth(&self.session.token)
            .json(&node)
            .send()
            .await?;
        let response = Self::check(response, Subject::Path(&node.path)).await?;
        Ok(response.json::<NodeBody>().await?.into_node())
    }

    async fn update(&self, target: &FileNode, patch: NodePatch) -> Result<FileNode, BackendError> {
        let id = Self::identity(target)?;
        let response = self
            .client
            .http
            .put(self.node_url(id))
            .bearer_auth(&self.session.token)
            .json(&patch)
            .send()
            .await?;
        let response = Self::check(response, Subject::Node(id)).await?;
        Ok(response.json::<NodeBody>().await?.into_node())
    }

    async fn delete(&self, target: &FileNode) -> Result<(), BackendError> {
        let id = Self::identity(target)?;
        let response = self
            .client
            .http
            .delete(self.node_url(id))
            .bearer_auth(&self.session.token)
            .send()
            .await?;
        Self::check(response, Subject::Node(id)).await?;
        Ok(())
    }

    async fn record_command(&self, entry: &HistoryEntry) -> Result<(), BackendError> {
        let response = self
            .client
            .http
            .post(self.url(HISTORY_ENDPOINT))
            .bearer_auth(&self.session.token)
            .json(entry)
            .send()
            .await?;
        Self::check(response, Subject::Listing).await?;
        Ok(())
    }

    async fn load_history(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .http
            .get(self.url(HISTORY_ENDPOINT))
            .bearer_auth(&self.session.token)
            .send()
            .await?;
        let response = Self::check(response, Subject::Listing).await?;
        // Newest first on the wire
        let rows: Vec<HistoryRow> = response.json().await?;
        Ok(rows.into_iter().rev().map(|r| r.command).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_body_accepts_bare_and_wrapped_arrays() {
        let node = r#"{"path":"/home","name":"home","type":"directory"}"#;
        let bare: ListBody = serde_json::from_str(&format!("[{}]", node)).unwrap();
        let wrapped: ListBody = serde_json::from_str(&format!(r#"{{"files":[{}]}}"#, node)).unwrap();
        for body in [bare, wrapped] {
            match body {
                ListBody::Bare(nodes) | ListBody::Wrapped { files: nodes } => {
                    assert_eq!(nodes[0].path, "/home")
                }
            }
        }
    }

    #[test]
    fn node_body_unwraps_file_envelope() {
        let wrapped: NodeBody = serde_json::from_str(
            r#"{"file":{"id":3,"path":"/home/a","name":"a","type":"file","content":"x"}}"#,
        )
        .unwrap();
        let node = wrapped.into_node();
        assert_eq!(node.id, Some(3));
        assert_eq!(node.text(), "x");
    }

    #[test]
    fn unpersisted_nodes_are_not_addressable() {
        let client = RemoteClient::new(&RemoteConfig::default()).unwrap();
        let backend = client.with_session(Session::new("t"));
        let mut node = FileNode::file("/home/a.txt", "");
        assert!(!backend.addresses(&node));
        node.id = Some(1);
        assert!(backend.addresses(&node));
    }

    #[tokio::test]
    async fn update_without_identity_fails_before_any_request() {
        let client = RemoteClient::new(&RemoteConfig::default()).unwrap();
        let backend = client.with_session(Session::new("t"));
        let err = backend
            .update(&FileNode::file("/home/a.txt", ""), NodePatch::content("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::MissingIdentity(p) if p == "/home/a.txt"));
    }
}

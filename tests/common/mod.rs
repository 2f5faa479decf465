//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use quill::error::GenerationError;
use quill::llm::{GenerationRequest, Generator, PromptKind};

/// Get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Get the path to a diff fixture.
pub fn diff_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("diffs").join(name)
}

/// Read a fixture file as a string.
pub fn read_fixture(path: PathBuf) -> String {
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {:?}: {}", path, e))
}

/// Create a temporary directory for test output.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open config");
            config.set_str("user.name", "Test User").expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file in the working tree, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Write a file and add it to the index.
    pub fn stage(&self, rel: &str, content: &str) {
        self.write(rel, content);
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(rel)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Remove a file from the working tree and the index.
    pub fn stage_removal(&self, rel: &str) {
        std::fs::remove_file(self.dir.path().join(rel)).expect("Failed to remove file");
        let mut index = self.repo.index().expect("Failed to get index");
        index.remove_path(Path::new(rel)).expect("Failed to remove from index");
        index.write().expect("Failed to write index");
    }

    /// Commit whatever is staged. Returns the commit OID.
    pub fn commit_staged(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Message of the commit HEAD points at.
    pub fn head_message(&self) -> String {
        self.repo
            .head()
            .expect("No HEAD")
            .peel_to_commit()
            .expect("HEAD is not a commit")
            .message()
            .unwrap_or_default()
            .to_string()
    }
}

/// A generator that answers from per-kind queues and records every request.
///
/// When a queue holds one reply it is repeated for every later request of
/// that kind.
pub struct ScriptedGenerator {
    replies: Mutex<Vec<(PromptKind, VecDeque<Result<String, String>>)>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply for `kind`.
    pub fn reply(self, kind: PromptKind, text: &str) -> Self {
        self.push(kind, Ok(text.to_string()))
    }

    /// Queue a service failure for `kind`.
    pub fn fail(self, kind: PromptKind, message: &str) -> Self {
        self.push(kind, Err(message.to_string()))
    }

    fn push(self, kind: PromptKind, reply: Result<String, String>) -> Self {
        {
            let mut replies = self.replies.lock().unwrap();
            match replies.iter_mut().find(|(k, _)| *k == kind) {
                Some((_, queue)) => queue.push_back(reply),
                None => replies.push((kind, VecDeque::from([reply]))),
            }
        }
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, kind: PromptKind) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut replies = self.replies.lock().unwrap();
        let queue = replies
            .iter_mut()
            .find(|(k, _)| *k == request.kind)
            .map(|(_, q)| q)
            .unwrap_or_else(|| panic!("No scripted reply for {}", request.kind.as_str()));

        let reply = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        };
        reply.map_err(GenerationError::ServiceUnavailable)
    }
}

/// A file-purpose reply.
pub fn purpose_reply(purpose: &str, change_type: &str, breaking: bool) -> String {
    serde_json::json!({
        "purpose": purpose,
        "change_type": change_type,
        "breaking": breaking,
    })
    .to_string()
}

/// A semantic review reply.
pub fn review_reply(is_valid: bool, reasons: &[&str]) -> String {
    serde_json::json!({ "is_valid": is_valid, "reasons": reasons }).to_string()
}

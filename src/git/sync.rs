//! Project sync workflow.
//!
//! Brings a project's working copy in sync with its configured origin,
//! covering the three realistic states: no origin configured, origin but no
//! local clone, origin with an existing local clone.
//!
//! Destructive steps (deleting an existing repository, force checkout) never
//! run directly: the workflow suspends by returning
//! `SyncOutcome::ConfirmationNeeded` with a resumable continuation, and the
//! presentation layer resolves it with `proceed` or `cancel`. Nothing is
//! locked or touched while suspended.

use std::fmt;
use std::fs;
use std::sync::Arc;

use super::client::{GitClient, PullOutcome};
use super::error::SyncError;
use crate::project::Project;

/// Origins shorter than this (trimmed) are treated as unset.
const MIN_ORIGIN_LEN: usize = 4;

/// Shared fallback origin for cloud projects, threaded through calls
/// instead of living in process-global state.
#[derive(Debug, Clone, Default)]
pub struct SharedOriginPolicy {
    pub default_origin: Option<String>,
}

impl SharedOriginPolicy {
    /// Effective origin for a project. Cloud projects prefer the shared
    /// default; everything else uses the project's own setting.
    pub fn effective_origin<'a>(&'a self, project: &'a Project) -> Option<&'a str> {
        if project.is_cloud()
            && let Some(shared) = self.default_origin.as_deref()
        {
            return Some(shared);
        }
        project.settings().git_origin.as_deref()
    }
}

/// Terminal (or suspended) result of a sync invocation.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Working copy matches the remote origin.
    Success,
    /// No usable origin configured; nothing was touched.
    EmptyOrigin,
    /// A destructive step needs an explicit go-ahead from the user.
    ConfirmationNeeded(PendingConfirmation),
    /// The user declined the destructive step; nothing was touched.
    Cancelled,
    /// The git layer failed. For remote failures, `message` and
    /// `description` carry the git layer's text verbatim.
    GitError { message: String, description: String },
}

enum PendingAction {
    /// Delete the existing local repository, then clone and pull.
    Reclone,
    /// Force the working tree to the local default branch.
    ForceCheckout,
}

/// Suspended destructive step. Holds the client handle and the resolved
/// origin, but no lock on the repository directory.
pub struct PendingConfirmation {
    client: Arc<dyn GitClient>,
    origin: String,
    action: PendingAction,
}

impl fmt::Debug for PendingConfirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.action {
            PendingAction::Reclone => "reclone",
            PendingAction::ForceCheckout => "force_checkout",
        };
        f.debug_struct("PendingConfirmation")
            .field("action", &action)
            .finish()
    }
}

impl PendingConfirmation {
    /// The user confirmed: run the destructive step and the rest of the
    /// state machine. Consumes the continuation.
    pub fn proceed(self, project: &Project) -> SyncOutcome {
        match self.action {
            PendingAction::Reclone => {
                let repo_dir = project.repo_dir();
                if let Err(e) = fs::remove_dir_all(&repo_dir) {
                    // Best-effort cleanup: a failed delete makes the clone
                    // fail, which is then reported normally.
                    tracing::warn!(
                        dir = %repo_dir.display(),
                        "failed to remove local repository: {e}"
                    );
                }
                clone_and_pull(self.client.as_ref(), project, &self.origin)
            }
            PendingAction::ForceCheckout => {
                match self.client.force_checkout_local(project) {
                    Ok(()) => SyncOutcome::Success,
                    Err(e) => outcome_from(e),
                }
            }
        }
    }

    /// The user declined: terminal no-op, nothing was touched.
    pub fn cancel(self) -> SyncOutcome {
        SyncOutcome::Cancelled
    }
}

/// Orchestrates clone/pull/checkout for a single project's remote origin.
///
/// Callers serialize invocations per project (at most one in-flight sync);
/// the workflow itself keeps no per-project state across the suspension
/// point.
pub struct ProjectSyncWorkflow {
    client: Arc<dyn GitClient>,
}

impl ProjectSyncWorkflow {
    pub fn new(client: Arc<dyn GitClient>) -> Self {
        Self { client }
    }

    /// Record `origin` on the project's settings. Cloud projects mirror it
    /// into the shared policy so other cloud projects inherit it.
    ///
    /// Persisting the change stays an explicit `SettingsStore::save` at the
    /// call site; no hidden write happens here.
    pub fn ensure_origin(
        &self,
        project: &mut Project,
        origin: &str,
        policy: &mut SharedOriginPolicy,
    ) {
        let origin = origin.trim();
        project.settings_mut().git_origin = if origin.is_empty() {
            None
        } else {
            Some(origin.to_string())
        };
        if project.is_cloud() && !origin.is_empty() {
            policy.default_origin = Some(origin.to_string());
        }
    }

    /// Bring the working copy in sync with the configured origin.
    ///
    /// Returns `EmptyOrigin` before any filesystem or network I/O when no
    /// usable origin is configured. Returns `ConfirmationNeeded` before any
    /// deletion when a local repository already exists.
    pub fn clone_or_pull(&self, project: &Project, policy: &SharedOriginPolicy) -> SyncOutcome {
        let Some(origin) = policy.effective_origin(project) else {
            return SyncOutcome::EmptyOrigin;
        };
        let origin = origin.trim();
        if origin.len() < MIN_ORIGIN_LEN {
            return SyncOutcome::EmptyOrigin;
        }

        if project.is_repo_exist() {
            tracing::debug!(
                project = %project.location().display(),
                "local repository exists, reclone needs confirmation"
            );
            return SyncOutcome::ConfirmationNeeded(PendingConfirmation {
                client: Arc::clone(&self.client),
                origin: origin.to_string(),
                action: PendingAction::Reclone,
            });
        }

        clone_and_pull(self.client.as_ref(), project, origin)
    }

    /// Force the working copy to match the local default branch, used after
    /// manual conflict resolution. Discards local edits, so it passes the
    /// same confirmation gate as the reclone path.
    pub fn force_checkout_local(&self, project: &Project) -> SyncOutcome {
        tracing::debug!(
            project = %project.location().display(),
            "force checkout needs confirmation"
        );
        SyncOutcome::ConfirmationNeeded(PendingConfirmation {
            client: Arc::clone(&self.client),
            origin: String::new(),
            action: PendingAction::ForceCheckout,
        })
    }
}

// =============================================================================
// State machine body
// =============================================================================

fn clone_and_pull(client: &dyn GitClient, project: &Project, origin: &str) -> SyncOutcome {
    match client.pull(project, origin) {
        Ok(PullOutcome::Completed) => match client.force_checkout_local(project) {
            Ok(()) => SyncOutcome::Success,
            Err(e) => outcome_from(e),
        },
        Ok(PullOutcome::EmptyRemote) => {
            // Expected state for a brand-new shared project: publish local
            // notes instead of reporting a missing ref.
            tracing::debug!(
                project = %project.location().display(),
                "remote is empty, pushing local state"
            );
            if let Err(e) = client.commit_all(project) {
                return outcome_from(e);
            }
            match client.push(project, origin) {
                Ok(()) => SyncOutcome::Success,
                Err(e) => outcome_from(e),
            }
        }
        Err(e) => outcome_from(e),
    }
}

fn outcome_from(e: SyncError) -> SyncOutcome {
    match e {
        SyncError::Transport {
            message,
            description,
        } => SyncOutcome::GitError {
            message,
            description,
        },
        other => SyncOutcome::GitError {
            message: "git operation failed".to_string(),
            description: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct FakeClient {
        calls: Mutex<Vec<&'static str>>,
        pull_result: Mutex<Option<Result<PullOutcome, SyncError>>>,
        push_result: Mutex<Option<Result<(), SyncError>>>,
    }

    impl FakeClient {
        fn with_pull(result: Result<PullOutcome, SyncError>) -> Self {
            let client = Self::default();
            *client.pull_result.lock().unwrap() = Some(result);
            client
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl GitClient for FakeClient {
        fn pull(&self, _project: &Project, _origin: &str) -> Result<PullOutcome, SyncError> {
            self.calls.lock().unwrap().push("pull");
            self.pull_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Ok(PullOutcome::Completed))
        }

        fn force_checkout_local(&self, _project: &Project) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push("checkout");
            Ok(())
        }

        fn commit_all(&self, _project: &Project) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push("commit");
            Ok(())
        }

        fn push(&self, _project: &Project, _origin: &str) -> Result<(), SyncError> {
            self.calls.lock().unwrap().push("push");
            self.push_result.lock().unwrap().take().unwrap_or(Ok(()))
        }
    }

    fn workflow(client: FakeClient) -> (ProjectSyncWorkflow, Arc<FakeClient>) {
        let client = Arc::new(client);
        (
            ProjectSyncWorkflow::new(client.clone() as Arc<dyn GitClient>),
            client,
        )
    }

    fn project_with_origin(location: &std::path::Path, origin: &str) -> Project {
        let mut project = Project::new(location);
        project.settings_mut().git_origin = Some(origin.to_string());
        project
    }

    #[test]
    fn blank_origin_is_rejected_before_any_io() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (workflow, client) = workflow(FakeClient::default());
        let policy = SharedOriginPolicy::default();

        for origin in ["", "   ", "git"] {
            let project = project_with_origin(dir.path(), origin);
            assert!(matches!(
                workflow.clone_or_pull(&project, &policy),
                SyncOutcome::EmptyOrigin
            ));
        }

        let unset = Project::new(dir.path());
        assert!(matches!(
            workflow.clone_or_pull(&unset, &policy),
            SyncOutcome::EmptyOrigin
        ));
        assert!(client.calls().is_empty());
    }

    #[test]
    fn fresh_project_pulls_without_confirmation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (workflow, client) = workflow(FakeClient::default());
        let project = project_with_origin(dir.path(), "https://example.com/repo.git");

        let outcome = workflow.clone_or_pull(&project, &SharedOriginPolicy::default());
        assert!(matches!(outcome, SyncOutcome::Success));
        assert_eq!(client.calls(), vec!["pull", "checkout"]);
    }

    #[test]
    fn existing_repo_requires_confirmation_before_deletion() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = project_with_origin(dir.path(), "https://example.com/repo.git");
        fs::create_dir_all(project.repo_dir()).expect("create repo dir");

        let (workflow, client) = workflow(FakeClient::default());
        let outcome = workflow.clone_or_pull(&project, &SharedOriginPolicy::default());
        let SyncOutcome::ConfirmationNeeded(pending) = outcome else {
            panic!("expected confirmation");
        };
        assert!(client.calls().is_empty());
        assert!(project.repo_dir().exists());

        // Declining leaves the directory untouched.
        assert!(matches!(pending.cancel(), SyncOutcome::Cancelled));
        assert!(project.repo_dir().exists());
        assert!(client.calls().is_empty());
    }

    #[test]
    fn confirmed_reclone_deletes_and_pulls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = project_with_origin(dir.path(), "https://example.com/repo.git");
        fs::create_dir_all(project.repo_dir()).expect("create repo dir");

        let (workflow, client) = workflow(FakeClient::default());
        let SyncOutcome::ConfirmationNeeded(pending) =
            workflow.clone_or_pull(&project, &SharedOriginPolicy::default())
        else {
            panic!("expected confirmation");
        };

        let outcome = pending.proceed(&project);
        assert!(matches!(outcome, SyncOutcome::Success));
        assert!(!project.repo_dir().exists());
        assert_eq!(client.calls(), vec!["pull", "checkout"]);
    }

    #[test]
    fn empty_remote_publishes_local_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = project_with_origin(dir.path(), "https://example.com/repo.git");

        let (workflow, client) = workflow(FakeClient::with_pull(Ok(PullOutcome::EmptyRemote)));
        let outcome = workflow.clone_or_pull(&project, &SharedOriginPolicy::default());
        assert!(matches!(outcome, SyncOutcome::Success));
        assert_eq!(client.calls(), vec!["pull", "commit", "push"]);
    }

    #[test]
    fn transport_error_is_surfaced_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = project_with_origin(dir.path(), "https://example.com/repo.git");

        let (workflow, _client) = workflow(FakeClient::with_pull(Err(SyncError::Transport {
            message: "fetch from origin failed".to_string(),
            description: "authentication required".to_string(),
        })));
        let outcome = workflow.clone_or_pull(&project, &SharedOriginPolicy::default());
        let SyncOutcome::GitError {
            message,
            description,
        } = outcome
        else {
            panic!("expected git error");
        };
        assert_eq!(message, "fetch from origin failed");
        assert_eq!(description, "authentication required");
    }

    #[test]
    fn cloud_project_prefers_shared_origin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut project = Project::cloud(dir.path());
        project.settings_mut().git_origin = Some("https://example.com/own.git".to_string());

        let policy = SharedOriginPolicy {
            default_origin: Some("https://example.com/shared.git".to_string()),
        };
        assert_eq!(
            policy.effective_origin(&project),
            Some("https://example.com/shared.git")
        );

        let plain = project_with_origin(dir.path(), "https://example.com/own.git");
        assert_eq!(
            policy.effective_origin(&plain),
            Some("https://example.com/own.git")
        );
    }

    #[test]
    fn ensure_origin_mirrors_into_policy_for_cloud_projects() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (workflow, _client) = workflow(FakeClient::default());
        let mut policy = SharedOriginPolicy::default();

        let mut plain = Project::new(dir.path().join("plain"));
        workflow.ensure_origin(&mut plain, " https://example.com/a.git ", &mut policy);
        assert_eq!(
            plain.settings().git_origin.as_deref(),
            Some("https://example.com/a.git")
        );
        assert!(policy.default_origin.is_none());

        let mut cloud = Project::cloud(dir.path().join("cloud"));
        workflow.ensure_origin(&mut cloud, "https://example.com/b.git", &mut policy);
        assert_eq!(
            policy.default_origin.as_deref(),
            Some("https://example.com/b.git")
        );
    }

    #[test]
    fn force_checkout_passes_the_confirmation_gate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let project = Project::new(dir.path());
        let (workflow, client) = workflow(FakeClient::default());

        let SyncOutcome::ConfirmationNeeded(pending) = workflow.force_checkout_local(&project)
        else {
            panic!("expected confirmation");
        };
        assert!(client.calls().is_empty());

        let outcome = pending.proceed(&project);
        assert!(matches!(outcome, SyncOutcome::Success));
        assert_eq!(client.calls(), vec!["checkout"]);
    }
}

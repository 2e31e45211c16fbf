//! Git collaborator contract and its git2-backed implementation.
//!
//! The workflow consumes the `GitClient` trait; `Git2Client` is the real
//! implementation. The one interpretation decision lives here: a fetch that
//! completes without producing the remote default branch ref means the
//! remote is empty, reported as `PullOutcome::EmptyRemote` rather than as an
//! error for callers to pattern-match on.

use git2::build::CheckoutBuilder;
use git2::{ErrorCode, FetchOptions, PushOptions, RemoteCallbacks, Repository, Signature};

use super::error::SyncError;
use crate::project::Project;

/// Branch both sides converge on for a shared project.
pub const DEFAULT_BRANCH: &str = "master";

/// Result of a pull, decided once inside the git layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// Remote state fetched and the local branch fast-forwarded.
    Completed,
    /// The remote exists but its default branch has no commits yet.
    EmptyRemote,
}

/// External git library contract consumed by the sync workflow.
///
/// Network operations (`pull`, `push`) may block for unbounded time; callers
/// run them off any latency-sensitive thread.
pub trait GitClient: Send + Sync {
    /// Fetch from `origin` and fast-forward the local default branch.
    fn pull(&self, project: &Project, origin: &str) -> Result<PullOutcome, SyncError>;

    /// Force the working tree to match the local default branch, discarding
    /// local edits.
    fn force_checkout_local(&self, project: &Project) -> Result<(), SyncError>;

    /// Stage everything under the project and commit it to the default
    /// branch.
    fn commit_all(&self, project: &Project) -> Result<(), SyncError>;

    /// Push the local default branch to `origin`.
    fn push(&self, project: &Project, origin: &str) -> Result<(), SyncError>;
}

/// git2-backed implementation of the collaborator contract.
pub struct Git2Client {
    signature_name: String,
    signature_email: String,
}

impl Git2Client {
    pub fn new() -> Self {
        Self {
            signature_name: "notegit".to_string(),
            signature_email: "notegit@localhost".to_string(),
        }
    }

    pub fn with_signature(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            signature_name: name.into(),
            signature_email: email.into(),
        }
    }

    /// Open the repository at the project location, initializing one if the
    /// directory is not a repository yet. Notes already live there, so a
    /// plain clone into the directory is not an option.
    fn open_or_init(&self, project: &Project) -> Result<Repository, SyncError> {
        match Repository::open(project.location()) {
            Ok(repo) => Ok(repo),
            Err(e) if e.code() == ErrorCode::NotFound => Repository::init(project.location())
                .map_err(|e| SyncError::OpenRepo(project.location().to_owned(), e)),
            Err(e) => Err(SyncError::OpenRepo(project.location().to_owned(), e)),
        }
    }

    /// Find the `origin` remote, creating it or repointing its URL as
    /// needed.
    fn origin_remote<'r>(
        &self,
        repo: &'r Repository,
        url: &str,
    ) -> Result<git2::Remote<'r>, SyncError> {
        match repo.find_remote("origin") {
            Ok(remote) => {
                if remote.url() == Some(url) {
                    Ok(remote)
                } else {
                    repo.remote_set_url("origin", url)?;
                    Ok(repo.find_remote("origin")?)
                }
            }
            Err(_) => Ok(repo.remote("origin", url)?),
        }
    }
}

impl Default for Git2Client {
    fn default() -> Self {
        Self::new()
    }
}

fn credential_callbacks(cfg: Option<git2::Config>) -> RemoteCallbacks<'static> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed| {
        if allowed.is_ssh_key()
            && let Some(user) = username_from_url
        {
            return git2::Cred::ssh_key_from_agent(user);
        }
        if allowed.is_user_pass_plaintext()
            && let Some(ref cfg) = cfg
            && let Ok(cred) = git2::Cred::credential_helper(cfg, url, username_from_url)
        {
            return Ok(cred);
        }
        git2::Cred::default()
    });
    callbacks
}

impl GitClient for Git2Client {
    fn pull(&self, project: &Project, origin: &str) -> Result<PullOutcome, SyncError> {
        let repo = self.open_or_init(project)?;
        let mut remote = self.origin_remote(&repo, origin)?;

        let cfg = repo.config().ok();
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(credential_callbacks(cfg));
        remote
            .fetch(
                &["+refs/heads/*:refs/remotes/origin/*"],
                Some(&mut fetch_options),
                None,
            )
            .map_err(|e| SyncError::Transport {
                message: "fetch from origin failed".to_string(),
                description: e.message().to_string(),
            })?;

        // An empty remote fetches fine but yields no tracking ref for the
        // default branch.
        let tracking = format!("refs/remotes/origin/{DEFAULT_BRANCH}");
        let remote_oid = match repo.refname_to_id(&tracking) {
            Ok(oid) => oid,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(PullOutcome::EmptyRemote),
            Err(e) => return Err(SyncError::Git(e)),
        };

        let local_ref = format!("refs/heads/{DEFAULT_BRANCH}");
        repo.reference(&local_ref, remote_oid, true, "pull: fast-forward to origin")?;
        repo.set_head(&local_ref)?;
        Ok(PullOutcome::Completed)
    }

    fn force_checkout_local(&self, project: &Project) -> Result<(), SyncError> {
        let repo = Repository::open(project.location())
            .map_err(|e| SyncError::OpenRepo(project.location().to_owned(), e))?;
        let branch = repo
            .find_branch(DEFAULT_BRANCH, git2::BranchType::Local)
            .map_err(|_| SyncError::NoLocalBranch)?;
        let commit = branch
            .into_reference()
            .peel_to_commit()
            .map_err(SyncError::Checkout)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        repo.checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(SyncError::Checkout)?;
        repo.set_head(&format!("refs/heads/{DEFAULT_BRANCH}"))
            .map_err(SyncError::Checkout)?;
        Ok(())
    }

    fn commit_all(&self, project: &Project) -> Result<(), SyncError> {
        let repo = self.open_or_init(project)?;

        let mut index = repo.index().map_err(SyncError::Commit)?;
        index
            .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
            .map_err(SyncError::Commit)?;
        index.write().map_err(SyncError::Commit)?;
        let tree_oid = index.write_tree().map_err(SyncError::Commit)?;
        let tree = repo.find_tree(tree_oid).map_err(SyncError::Commit)?;

        let sig = Signature::now(&self.signature_name, &self.signature_email)
            .map_err(SyncError::Commit)?;

        let local_ref = format!("refs/heads/{DEFAULT_BRANCH}");
        let parent = match repo.refname_to_id(&local_ref) {
            Ok(oid) => Some(repo.find_commit(oid).map_err(SyncError::Commit)?),
            Err(_) => None,
        };
        let parents: Vec<_> = parent.iter().collect();

        repo.commit(
            Some(&local_ref),
            &sig,
            &sig,
            "notegit: publish local notes",
            &tree,
            &parents,
        )
        .map_err(SyncError::Commit)?;
        Ok(())
    }

    fn push(&self, project: &Project, origin: &str) -> Result<(), SyncError> {
        let repo = Repository::open(project.location())
            .map_err(|e| SyncError::OpenRepo(project.location().to_owned(), e))?;
        let mut remote = self.origin_remote(&repo, origin)?;

        let cfg = repo.config().ok();
        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(credential_callbacks(cfg));

        let refspec = format!("refs/heads/{DEFAULT_BRANCH}:refs/heads/{DEFAULT_BRANCH}");
        remote
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(|e| SyncError::Transport {
                message: "push to origin failed".to_string(),
                description: e.message().to_string(),
            })
    }
}

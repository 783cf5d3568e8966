//! libgit2-backed history and rollback.
//!
//! `git2::Repository` is not `Send`, so both collaborators keep only the
//! working-directory path and open a fresh repository per call.

use super::{CommitSummary, Rollback, VcsLog};
use crate::errors::{Error, Result};
use chrono::{TimeZone, Utc};
use git2::build::CheckoutBuilder;
use git2::{Commit, DiffOptions, Repository, Sort};
use std::path::{Path, PathBuf};

fn discover_workdir(path: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(path)?;
    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::collaborator("git", "bare repositories are not supported"))
}

/// Path of `path` inside the working directory `root`.
///
/// Relative paths are taken from the current directory, which need not be
/// the repository root.
fn relative_to(root: &Path, path: &Path) -> Result<PathBuf> {
    let base = std::env::current_dir().map_err(|e| Error::io(".", e))?;
    relative_from(root, &base, path)
}

fn relative_from(root: &Path, base: &Path, path: &Path) -> Result<PathBuf> {
    let absolute = base.join(path);
    let absolute = absolute.canonicalize().unwrap_or(absolute);
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    absolute
        .strip_prefix(&root)
        .map(Path::to_path_buf)
        .map_err(|_| {
            Error::collaborator(
                "git",
                format!(
                    "{} is outside the repository at {}",
                    absolute.display(),
                    root.display()
                ),
            )
        })
}

fn commit_touches(repo: &Repository, commit: &Commit, relative: &Path) -> bool {
    let Ok(tree) = commit.tree() else {
        return false;
    };
    let parent_tree = commit.parents().next().and_then(|p| p.tree().ok());

    let mut opts = DiffOptions::new();
    opts.pathspec(relative.to_string_lossy().as_ref());

    repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))
        .map(|diff| diff.deltas().len() > 0)
        .unwrap_or(false)
}

/// Commit history for a file, newest first.
#[derive(Debug, Clone)]
pub struct Git2Log {
    repo_path: PathBuf,
}

impl Git2Log {
    /// Discover the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            repo_path: discover_workdir(path)?,
        })
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}

impl VcsLog for Git2Log {
    fn recent_log(&self, path: &Path, limit: usize) -> Result<Vec<CommitSummary>> {
        let repo = Repository::open(&self.repo_path)?;
        let relative = relative_to(&self.repo_path, path)?;

        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TIME)?;

        let commits = revwalk
            .filter_map(|oid| oid.ok())
            .filter_map(|oid| repo.find_commit(oid).ok())
            .filter(|commit| commit_touches(&repo, commit, &relative))
            .take(limit)
            .map(|commit| {
                let id = commit.id().to_string();
                CommitSummary {
                    id: id.chars().take(7).collect(),
                    summary: commit.summary().unwrap_or_default().to_string(),
                    author: commit.author().name().unwrap_or("unknown").to_string(),
                    time: Utc
                        .timestamp_opt(commit.time().seconds(), 0)
                        .single()
                        .unwrap_or_default(),
                }
            })
            .collect();
        Ok(commits)
    }
}

/// Restores a file to its content at HEAD.
#[derive(Debug, Clone)]
pub struct GitCheckoutRollback {
    repo_path: PathBuf,
}

impl GitCheckoutRollback {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            repo_path: discover_workdir(path)?,
        })
    }
}

impl Rollback for GitCheckoutRollback {
    fn rollback(&self, path: &Path) -> Result<()> {
        let repo = Repository::open(&self.repo_path)?;
        let relative = relative_to(&self.repo_path, path)?;
        if repo.head()?.peel_to_tree()?.get_path(&relative).is_err() {
            return Err(Error::collaborator(
                "git",
                format!("{} is not tracked at HEAD", relative.display()),
            ));
        }

        let mut checkout = CheckoutBuilder::new();
        checkout.force().path(&relative);
        repo.checkout_head(Some(&mut checkout))?;
        log::info!("Restored {} from HEAD", relative.display());
        Ok(())
    }
}

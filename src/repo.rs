//! Source-control facts used to annotate source locations.
//!
//! Everything here is best effort: a missing `git` binary, a directory that
//! is not a checkout, or a detached remote all degrade to `None`.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    /// Fetch URL of the first listed remote
    pub remote: Option<String>,
    pub branch: Option<String>,
    /// Top-level directory of the working tree
    pub root: Option<PathBuf>,
}

impl RepoInfo {
    /// Probe the repository containing `dir`.
    pub fn discover(dir: &Path) -> Self {
        let remote = run_git(dir, &["remote", "-v"]).and_then(|out| parse_remote(&out));
        let branch = run_git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
            .map(|out| out.trim().to_string())
            .filter(|b| !b.is_empty());
        let root = run_git(dir, &["rev-parse", "--show-toplevel"])
            .map(|out| out.trim().to_string())
            .filter(|r| !r.is_empty())
            .map(PathBuf::from);

        debug!(
            "Repository info: remote={:?} branch={:?} root={:?}",
            remote, branch, root
        );

        Self {
            remote,
            branch,
            root,
        }
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Option<String> {
    let output = match Command::new("git").args(args).current_dir(dir).output() {
        Ok(output) => output,
        Err(e) => {
            debug!("Failed to run git {}: {}", args.join(" "), e);
            return None;
        }
    };

    if !output.status.success() {
        debug!(
            "git {} exited with {}: {}",
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Pull the URL out of `git remote -v` output (`name<TAB>url (fetch)`).
pub fn parse_remote(output: &str) -> Option<String> {
    let first_line = output.lines().next()?;
    let (_, rest) = first_line.split_once('\t')?;
    let url = rest.split(' ').next()?.trim();
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote() {
        let output = "origin\thttps://github.com/example/project.git (fetch)\n\
                      origin\thttps://github.com/example/project.git (push)\n";
        assert_eq!(
            parse_remote(output),
            Some("https://github.com/example/project.git".to_string())
        );
    }

    #[test]
    fn test_parse_remote_empty() {
        assert_eq!(parse_remote(""), None);
        assert_eq!(parse_remote("fatal: not a git repository"), None);
    }

    #[test]
    fn test_discover_outside_repository() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let info = RepoInfo::discover(temp_dir.path());
        // A fresh temp dir is not a checkout; nothing should be invented.
        assert_eq!(info.remote, None);
    }
}

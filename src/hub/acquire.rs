use std::fs;
use std::path::{Component, Path, PathBuf};

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use tracing::{debug, info};

use crate::error::HubtrailError;

use super::{ArtifactReference, HubConfig, RepoKind, RepoRef};

/// Download every file of a repository and materialize it under `local_dir`.
///
/// Files land in the `hf-hub` cache first and are then copied, keeping the
/// repository's relative layout.
pub fn snapshot(
    config: &HubConfig,
    repo_ref: &RepoRef,
    local_dir: &Path,
) -> Result<ArtifactReference, HubtrailError> {
    let mut builder = ApiBuilder::new()
        .with_progress(false)
        .with_endpoint(config.endpoint.clone());

    if config.token.is_some() {
        builder = builder.with_token(config.token.clone());
    }
    if let Some(cache_dir) = config.cache_dir.as_ref() {
        builder = builder.with_cache_dir(cache_dir.clone());
    }

    let api = builder
        .build()
        .map_err(|source| HubtrailError::HubApiError {
            repo_id: repo_ref.repo_id.clone(),
            message: source.to_string(),
        })?;

    let repo_type = match repo_ref.kind {
        RepoKind::Model => RepoType::Model,
        RepoKind::Dataset => RepoType::Dataset,
    };
    let repo = if let Some(revision) = repo_ref.revision.as_ref() {
        api.repo(Repo::with_revision(
            repo_ref.repo_id.clone(),
            repo_type,
            revision.clone(),
        ))
    } else {
        api.repo(Repo::new(repo_ref.repo_id.clone(), repo_type))
    };

    let repo_info = repo.info().map_err(|source| HubtrailError::HubApiError {
        repo_id: repo_ref.repo_id.clone(),
        message: source.to_string(),
    })?;

    fs::create_dir_all(local_dir)?;

    let mut files = Vec::with_capacity(repo_info.siblings.len());
    for sibling in &repo_info.siblings {
        let remote_path = sibling.rfilename.as_str();
        let Some(target) = local_target(local_dir, remote_path) else {
            return Err(HubtrailError::HubAcquireError {
                repo_id: repo_ref.repo_id.clone(),
                message: format!("refusing to write '{}' outside the snapshot dir", remote_path),
            });
        };

        let cached = repo
            .get(remote_path)
            .map_err(|source| HubtrailError::HubAcquireError {
                repo_id: repo_ref.repo_id.clone(),
                message: format!("failed downloading '{}': {}", remote_path, source),
            })?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&cached, &target)?;
        debug!(file = %target.display(), "materialized");
        files.push(target);
    }

    info!(
        repo_id = %repo_ref.repo_id,
        kind = %repo_ref.kind,
        files = files.len(),
        dir = %local_dir.display(),
        "downloaded snapshot"
    );

    Ok(ArtifactReference {
        repo_id: repo_ref.repo_id.clone(),
        kind: repo_ref.kind,
        local_dir: local_dir.to_path_buf(),
        files,
    })
}

/// Joins a repo-relative file name onto `local_dir`.
///
/// Returns `None` for absolute paths or names that climb out with `..`.
fn local_target(local_dir: &Path, remote_path: &str) -> Option<PathBuf> {
    let relative = Path::new(remote_path);
    if remote_path.is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return None;
    }
    Some(local_dir.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_target_keeps_layout() {
        let dir = Path::new("models/org/model");
        assert_eq!(
            local_target(dir, "onnx/model.onnx"),
            Some(PathBuf::from("models/org/model/onnx/model.onnx"))
        );
        assert_eq!(
            local_target(dir, "config.json"),
            Some(PathBuf::from("models/org/model/config.json"))
        );
    }

    #[test]
    fn local_target_rejects_escapes() {
        let dir = Path::new("models/m");
        assert_eq!(local_target(dir, "../secrets"), None);
        assert_eq!(local_target(dir, "/etc/passwd"), None);
        assert_eq!(local_target(dir, ""), None);
    }
}

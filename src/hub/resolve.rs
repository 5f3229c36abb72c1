use crate::error::HubtrailError;

use super::{RepoKind, RepoRef};

const HUB_HOST: &str = "huggingface.co";

/// Parse a user-supplied hub reference (repo ID or hub URL).
///
/// Plain ids are interpreted as `kind`. URLs decide the kind themselves:
/// `https://huggingface.co/datasets/<id>` is a dataset, anything else a model.
pub fn parse_repo_input(
    input: &str,
    kind: RepoKind,
    revision: Option<&str>,
) -> Result<RepoRef, HubtrailError> {
    let (repo_id, kind, revision_from_url) =
        if input.starts_with("http://") || input.starts_with("https://") {
            parse_repo_url(input)?
        } else {
            (validate_repo_id(input)?, kind, None)
        };

    let merged_revision = match (revision, revision_from_url) {
        (Some(arg), Some(url_rev)) if arg != url_rev => {
            return Err(HubtrailError::HubResolveError {
                input: input.to_string(),
                message: format!(
                    "conflicting revisions: --revision='{}' but URL encodes revision='{}'",
                    arg, url_rev
                ),
            });
        }
        (Some(arg), _) => Some(arg.to_string()),
        (None, Some(url_rev)) => Some(url_rev),
        (None, None) => None,
    };

    Ok(RepoRef {
        repo_id,
        kind,
        revision: merged_revision,
    })
}

fn parse_repo_url(input: &str) -> Result<(String, RepoKind, Option<String>), HubtrailError> {
    let url = url::Url::parse(input).map_err(|source| HubtrailError::HubResolveError {
        input: input.to_string(),
        message: format!("invalid URL: {source}"),
    })?;

    let host = url
        .host_str()
        .ok_or_else(|| HubtrailError::HubResolveError {
            input: input.to_string(),
            message: "URL is missing a host".to_string(),
        })?
        .to_ascii_lowercase();

    if host != HUB_HOST {
        return Err(HubtrailError::HubResolveError {
            input: input.to_string(),
            message: format!("expected host '{HUB_HOST}', found '{}'", host),
        });
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|iter| iter.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let (kind, rest) = match segments.split_first() {
        Some((&"datasets", rest)) => (RepoKind::Dataset, rest),
        _ => (RepoKind::Model, segments.as_slice()),
    };

    let marker = rest
        .iter()
        .position(|seg| matches!(*seg, "tree" | "blob" | "resolve"));
    let name_segments = &rest[..marker.unwrap_or(rest.len())];

    if name_segments.is_empty() || name_segments.len() > 2 {
        return Err(HubtrailError::HubResolveError {
            input: input.to_string(),
            message: format!(
                "expected URL like https://{HUB_HOST}/[datasets/]<namespace>/<name>"
            ),
        });
    }

    let repo_id = validate_repo_id(&name_segments.join("/"))?;
    let revision = marker
        .filter(|idx| rest[*idx] == "tree")
        .and_then(|idx| rest.get(idx + 1))
        .map(|value| (*value).to_string());

    Ok((repo_id, kind, revision))
}

/// Checks that `repo_id` is `<name>` or `<namespace>/<name>`.
///
/// Ids double as local directory names, so each part is limited to ASCII
/// alphanumerics plus `-`, `_`, `.` and may not be `.` or `..`.
pub fn validate_repo_id(repo_id: &str) -> Result<String, HubtrailError> {
    let trimmed = repo_id.trim();
    let parts: Vec<&str> = trimmed.split('/').collect();

    let invalid = |message: &str| HubtrailError::HubResolveError {
        input: repo_id.to_string(),
        message: message.to_string(),
    };

    if trimmed.is_empty() || parts.len() > 2 {
        return Err(invalid("expected repo id in '<name>' or '<namespace>/<name>' form"));
    }

    for part in &parts {
        if part.is_empty() || *part == "." || *part == ".." {
            return Err(invalid("repo id contains an empty or relative path segment"));
        }
        if !part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(invalid(
                "repo id may only contain ASCII letters, digits, '-', '_' and '.'",
            ));
        }
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_ids() {
        let parsed = parse_repo_input("bert-base-uncased", RepoKind::Model, None).expect("parse");
        assert_eq!(parsed, RepoRef::model("bert-base-uncased"));

        let parsed = parse_repo_input("org/squad_v2", RepoKind::Dataset, None).expect("parse");
        assert_eq!(parsed.repo_id, "org/squad_v2");
        assert_eq!(parsed.kind, RepoKind::Dataset);
    }

    #[test]
    fn parse_model_url() {
        let parsed = parse_repo_input(
            "https://huggingface.co/google/flan-t5-base",
            RepoKind::Dataset,
            None,
        )
        .expect("parse");
        assert_eq!(parsed.repo_id, "google/flan-t5-base");
        assert_eq!(parsed.kind, RepoKind::Model);
    }

    #[test]
    fn parse_dataset_url_tree_revision() {
        let parsed = parse_repo_input(
            "https://huggingface.co/datasets/org/dataset/tree/release-v1",
            RepoKind::Model,
            None,
        )
        .expect("parse");
        assert_eq!(parsed.repo_id, "org/dataset");
        assert_eq!(parsed.kind, RepoKind::Dataset);
        assert_eq!(parsed.revision.as_deref(), Some("release-v1"));
    }

    #[test]
    fn revision_conflict_is_error() {
        let err = parse_repo_input(
            "https://huggingface.co/org/model/tree/main",
            RepoKind::Model,
            Some("dev"),
        )
        .expect_err("should fail");

        match err {
            HubtrailError::HubResolveError { message, .. } => {
                assert!(message.contains("conflicting revisions"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn foreign_host_is_rejected() {
        assert!(parse_repo_input("https://example.com/org/model", RepoKind::Model, None).is_err());
    }

    #[test]
    fn relative_segments_are_rejected() {
        assert!(validate_repo_id("../etc").is_err());
        assert!(validate_repo_id("org/..").is_err());
        assert!(validate_repo_id("a/b/c").is_err());
        assert!(validate_repo_id("org/with space").is_err());
        assert_eq!(validate_repo_id(" org/model.v2 ").expect("valid"), "org/model.v2");
    }
}

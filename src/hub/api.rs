use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::HubtrailError;
use crate::record::CatalogRecord;

use super::resolve::validate_repo_id;
use super::{acquire, ArtifactReference, DatasetQuery, Hub, HubConfig, ModelQuery, RepoKind, RepoRef};

/// Largest page the hub list endpoints serve.
const MAX_PAGE_SIZE: usize = 1000;

/// [`Hub`] backed by the Hugging Face REST API.
///
/// Metadata comes from `<endpoint>/api/...` JSON endpoints; snapshots are
/// fetched through `hf-hub` (see [`acquire`]).
pub struct HfHub {
    config: HubConfig,
    agent: ureq::Agent,
}

impl HfHub {
    pub fn new(config: HubConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build();
        let agent: ureq::Agent = agent_config.into();
        Self { config, agent }
    }

    fn api_base(&self, kind: RepoKind) -> String {
        format!(
            "{}/api/{}",
            self.config.endpoint.trim_end_matches('/'),
            kind.api_segment()
        )
    }

    /// Issues one GET and returns the JSON body plus the `rel="next"` link.
    fn get_json(&self, url: &str, context: &str) -> Result<(Value, Option<String>), ureq::Error> {
        let mut request = self.agent.get(url);
        if let Some(token) = self.config.token.as_deref() {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }

        debug!(url, context, "hub request");
        let mut response = request.call()?;
        let next = response
            .headers()
            .get("link")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_next_link);
        let body = response.body_mut().read_json::<Value>()?;
        Ok((body, next))
    }

    fn list(
        &self,
        kind: RepoKind,
        params: Vec<(&'static str, String)>,
        limit: Option<usize>,
        context: &str,
    ) -> Result<Vec<CatalogRecord>, HubtrailError> {
        let mut url = url::Url::parse(&self.api_base(kind)).map_err(|source| {
            HubtrailError::HubApiError {
                repo_id: context.to_string(),
                message: format!("invalid endpoint: {source}"),
            }
        })?;

        {
            let mut query = url.query_pairs_mut();
            for (key, value) in &params {
                query.append_pair(key, value);
            }
            let page_size = limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
            query.append_pair("limit", &page_size.to_string());
        }

        let mut records = Vec::new();
        let mut next_url = Some(url.to_string());

        while let Some(page_url) = next_url.take() {
            let (body, next) =
                self.get_json(&page_url, context)
                    .map_err(|source| HubtrailError::HubApiError {
                        repo_id: context.to_string(),
                        message: source.to_string(),
                    })?;

            let items = match body {
                Value::Array(items) => items,
                other => {
                    return Err(HubtrailError::HubApiError {
                        repo_id: context.to_string(),
                        message: format!("expected a JSON array, found {}", json_kind(&other)),
                    })
                }
            };

            records.extend(items.into_iter().filter_map(CatalogRecord::from_value));

            if let Some(limit) = limit {
                if records.len() >= limit {
                    records.truncate(limit);
                    break;
                }
            }
            next_url = next;
        }

        Ok(records)
    }

    fn info(
        &self,
        kind: RepoKind,
        repo_id: &str,
        params: &[(&str, &str)],
    ) -> Result<Option<CatalogRecord>, HubtrailError> {
        let repo_id = validate_repo_id(repo_id)?;
        let mut url = format!("{}/{}", self.api_base(kind), repo_id);
        if !params.is_empty() {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }

        match self.get_json(&url, &repo_id) {
            Ok((body, _)) => Ok(CatalogRecord::from_value(body)),
            Err(ureq::Error::StatusCode(status))
                if status_means_missing(status, self.config.token.is_some()) =>
            {
                debug!(repo_id = %repo_id, status, "{kind} not found on hub");
                Ok(None)
            }
            Err(source) => Err(HubtrailError::HubApiError {
                repo_id,
                message: source.to_string(),
            }),
        }
    }
}

impl Hub for HfHub {
    fn list_models(&self, query: &ModelQuery) -> Result<Vec<CatalogRecord>, HubtrailError> {
        let context = query.task.as_deref().unwrap_or("models");
        self.list(RepoKind::Model, model_query_params(query), query.limit, context)
    }

    fn list_datasets(&self, query: &DatasetQuery) -> Result<Vec<CatalogRecord>, HubtrailError> {
        let context = query.task_category.as_deref().unwrap_or("datasets");
        self.list(
            RepoKind::Dataset,
            dataset_query_params(query),
            query.limit,
            context,
        )
    }

    fn model_info(&self, repo_id: &str) -> Result<Option<CatalogRecord>, HubtrailError> {
        self.info(RepoKind::Model, repo_id, &[])
    }

    fn dataset_info(&self, repo_id: &str) -> Result<Option<CatalogRecord>, HubtrailError> {
        self.info(RepoKind::Dataset, repo_id, &[("full", "true")])
    }

    fn snapshot(
        &self,
        repo: &RepoRef,
        local_dir: &Path,
    ) -> Result<ArtifactReference, HubtrailError> {
        acquire::snapshot(&self.config, repo, local_dir)
    }
}

fn model_query_params(query: &ModelQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(task) = &query.task {
        params.push(("pipeline_tag", task.clone()));
    }
    if let Some(search) = &query.search {
        params.push(("search", search.clone()));
    }
    if query.card_data {
        params.push(("cardData", "true".to_string()));
    }
    if query.fetch_config {
        params.push(("config", "true".to_string()));
    }
    params.push(("sort", query.sort.clone()));
    params.push(("direction", "-1".to_string()));
    params
}

fn dataset_query_params(query: &DatasetQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(task) = &query.task_category {
        params.push(("filter", format!("task_categories:{task}")));
    }
    if let Some(size) = &query.size_category {
        params.push(("filter", format!("size_categories:{size}")));
    }
    if let Some(search) = &query.search {
        params.push(("search", search.clone()));
    }
    if query.card_data {
        params.push(("cardData", "true".to_string()));
    }
    if query.full {
        params.push(("full", "true".to_string()));
    }
    params
}

/// Whether an info lookup status means the repo does not exist.
///
/// Anonymous requests for unknown or private repos get 401. With a token,
/// 401 means the token itself was rejected.
fn status_means_missing(status: u16, authenticated: bool) -> bool {
    match status {
        404 => true,
        401 => !authenticated,
        _ => false,
    }
}

/// Extracts the `rel="next"` target from an RFC 8288 `Link` header.
fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, attrs) = part.split_once(';')?;
        let is_next = attrs
            .split(';')
            .map(str::trim)
            .any(|attr| attr == "rel=\"next\"" || attr == "rel=next");
        if !is_next {
            return None;
        }
        let target = target.trim();
        target
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Fuzz-only entrypoint for `Link` header parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_next_link(header: &str) -> Option<String> {
    parse_next_link(header)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_link_is_extracted() {
        let header = "<https://huggingface.co/api/models?cursor=abc&limit=1000>; rel=\"next\"";
        assert_eq!(
            parse_next_link(header).as_deref(),
            Some("https://huggingface.co/api/models?cursor=abc&limit=1000")
        );
    }

    #[test]
    fn next_link_ignores_other_relations() {
        let header = "<https://a/prev>; rel=\"prev\", <https://a/next>; rel=\"next\"";
        assert_eq!(parse_next_link(header).as_deref(), Some("https://a/next"));
        assert_eq!(parse_next_link("<https://a/prev>; rel=\"prev\""), None);
        assert_eq!(parse_next_link(""), None);
    }

    #[test]
    fn missing_status_depends_on_token() {
        assert!(status_means_missing(404, false));
        assert!(status_means_missing(404, true));
        assert!(status_means_missing(401, false));
        assert!(!status_means_missing(401, true));
        assert!(!status_means_missing(403, false));
        assert!(!status_means_missing(500, true));
    }

    #[test]
    fn model_params_follow_query() {
        let query = ModelQuery {
            task: Some("summarization".to_string()),
            fetch_config: false,
            ..Default::default()
        };
        let params = model_query_params(&query);
        assert!(params.contains(&("pipeline_tag", "summarization".to_string())));
        assert!(params.contains(&("cardData", "true".to_string())));
        assert!(params.contains(&("sort", "downloads".to_string())));
        assert!(!params.iter().any(|(key, _)| *key == "config"));
    }

    #[test]
    fn dataset_params_repeat_filter() {
        let query = DatasetQuery {
            task_category: Some("question-answering".to_string()),
            size_category: Some("100M<n<1B".to_string()),
            ..Default::default()
        };
        let filters: Vec<String> = dataset_query_params(&query)
            .into_iter()
            .filter(|(key, _)| *key == "filter")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(
            filters,
            vec![
                "task_categories:question-answering".to_string(),
                "size_categories:100M<n<1B".to_string()
            ]
        );
    }

    #[test]
    fn api_base_trims_trailing_slash() {
        let hub = HfHub::new(HubConfig {
            endpoint: "https://hub.example/".to_string(),
            ..Default::default()
        });
        assert_eq!(
            hub.api_base(RepoKind::Dataset),
            "https://hub.example/api/datasets"
        );
    }
}

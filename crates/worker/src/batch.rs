use anyhow::Context;
use fba_core::domain::product::ProductCandidate;
use fba_core::scanner::AnalyzeRequest;
use serde::Deserialize;
use std::path::Path;

/// Everything one worker run evaluates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchInput {
    pub requests: Vec<AnalyzeRequest>,
    pub candidates: Vec<ProductCandidate>,
}

/// Shape of a `--input` file. Either list may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct BatchFile {
    #[serde(default)]
    requests: Vec<AnalyzeRequest>,
    #[serde(default)]
    candidates: Vec<ProductCandidate>,
}

impl BatchInput {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let file: BatchFile =
            serde_json::from_str(text).context("batch input is not valid JSON for the batch schema")?;
        Ok(Self {
            requests: file.requests,
            candidates: file.candidates,
        })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read batch input {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Adds bare URLs from the command line; they rely on the extractor's own price match.
    pub fn with_urls(mut self, urls: &[String]) -> Self {
        self.requests
            .extend(urls.iter().map(|u| AnalyzeRequest::for_url(u.as_str())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty() && self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len() + self.candidates.len()
    }
}

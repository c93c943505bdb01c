//! Shared fixtures for unit tests

use crate::acquire::{AudioSource, SearchRequest};
use crate::error::TrackError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;

/// In-process [`AudioSource`] that writes a small file per query
///
/// Queries containing any of the `fail_on` patterns leave a partial
/// `<title>.webm.part` behind and fail with [`TrackError::NoResult`]. The
/// file is named after the query without its trailing " audio" and contains
/// the query text.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    fail_on: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub(crate) fn failing_on(patterns: &[&str]) -> Self {
        Self {
            fail_on: patterns.iter().map(|p| p.to_string()).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every query received so far, in order
    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioSource for ScriptedSource {
    async fn acquire(&self, request: &SearchRequest) -> Result<Vec<PathBuf>, TrackError> {
        self.queries.lock().unwrap().push(request.query.clone());

        let title = request
            .query
            .strip_suffix(" audio")
            .unwrap_or(&request.query);

        if self.fail_on.iter().any(|p| request.query.contains(p.as_str())) {
            let partial = request.output_dir.join(format!("{title}.webm.part"));
            tokio::fs::write(&partial, b"partial").await?;
            return Err(TrackError::NoResult);
        }

        let path = request.output_dir.join(format!("{title}.mp3"));
        tokio::fs::write(&path, request.query.as_bytes()).await?;
        Ok(vec![path])
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

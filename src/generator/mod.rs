//! Documentation generation: prompt, call, interpret.
//!
//! README requests are one call for the whole input. Comment requests
//! are one independent call per file, run concurrently up to a limit and
//! reassembled in input order; a failed file is reported, never dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::models::{CommentBatch, ContentMap, FileFailure, GenerationRequest};
use crate::progress::{ProgressTracker, TaskStatus};
use crate::prompt;
use crate::providers::{CompletionProvider, ProviderError};
use crate::response;

/// Drives README and comment generation against a completion provider.
pub struct DocGenerator {
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
    max_concurrent: usize,
    progress: Option<Arc<ProgressTracker>>,
}

impl DocGenerator {
    pub fn new(provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            max_concurrent: 1,
            progress: None,
        }
    }

    /// Allow up to `n` comment calls in flight at once (minimum 1).
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Report per-file status of comment generation to `progress`.
    pub fn with_progress(mut self, progress: Arc<ProgressTracker>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run one request: build the prompt, call the model, interpret.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        generate_with(self.provider.as_ref(), request, self.timeout).await
    }

    /// Add comments to every file independently.
    ///
    /// The returned batch holds the commented files that succeeded, in
    /// input order, and one failure entry for each file that did not.
    pub async fn generate_comments(
        &self,
        files: &ContentMap,
        custom_instructions: &str,
    ) -> CommentBatch {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut join_set = JoinSet::new();

        for (index, (path, code)) in files.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let sem = Arc::clone(&semaphore);
            let progress = self.progress.clone();
            let request = GenerationRequest::comment(path.clone(), code.clone(), custom_instructions);
            let timeout = self.timeout;

            join_set.spawn(async move {
                let Ok(_permit) = sem.acquire().await else {
                    return (index, Err("concurrency limiter closed".to_string()));
                };
                if let Some(p) = &progress {
                    p.update(&request.name, TaskStatus::InProgress);
                }

                let result = generate_with(provider.as_ref(), &request, timeout)
                    .await
                    .map_err(|e| e.to_string());

                if let Some(p) = &progress {
                    let status = match &result {
                        Ok(_) => TaskStatus::Done,
                        Err(e) => TaskStatus::Failed(e.clone()),
                    };
                    p.update(&request.name, status);
                }
                (index, result)
            });
        }

        let mut slots: Vec<Option<Result<String, String>>> = vec![None; files.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::warn!(error = %e, "comment task panicked"),
            }
        }

        let mut batch = CommentBatch::default();
        for ((path, _), slot) in files.iter().zip(slots) {
            match slot {
                Some(Ok(commented)) => {
                    batch.commented.insert(path.clone(), commented);
                }
                Some(Err(error)) => batch.failures.push(FileFailure {
                    path: path.clone(),
                    error,
                }),
                None => batch.failures.push(FileFailure {
                    path: path.clone(),
                    error: "generation task aborted".to_string(),
                }),
            }
        }

        tracing::info!(
            succeeded = batch.commented.len(),
            failed = batch.failures.len(),
            "comment generation finished"
        );
        batch
    }
}

async fn generate_with(
    provider: &dyn CompletionProvider,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<String, ProviderError> {
    let prompt = prompt::build_generation_prompt(request);
    tracing::debug!(
        purpose = %request.purpose,
        name = %request.name,
        prompt_len = prompt.len(),
        "generating"
    );
    let raw = provider.complete(&prompt, timeout).await?;
    Ok(response::interpret(&raw, request.purpose))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceInput;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers with a fenced block; fails for prompts that mention `fail`.
    struct EchoProvider {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CompletionProvider for EchoProvider {
        async fn complete(&self, prompt: &str, _timeout: Duration) -> Result<String, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if prompt.contains("fail") {
                return Err(ProviderError::Upstream {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(format!("Here:\n```\n// commented\n{}\n```", prompt.len()))
        }
    }

    fn echo() -> Arc<EchoProvider> {
        Arc::new(EchoProvider {
            prompts: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn readme_is_one_call_returned_verbatim() {
        let provider = echo();
        let generator = DocGenerator::new(provider.clone(), Duration::from_secs(5));
        let files = ContentMap::from([
            ("a.py".to_string(), "print(1)".to_string()),
            ("b.py".to_string(), "print(2)".to_string()),
        ]);
        let request = GenerationRequest::readme(SourceInput::Files(files), "Demo", "");
        let readme = generator.generate(&request).await.unwrap();

        assert!(readme.starts_with("Here:\n```"));
        assert_eq!(provider.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn comments_collect_failures_in_order() {
        let provider = echo();
        let tracker = Arc::new(ProgressTracker::silent(&[
            "a.rs".to_string(),
            "fail.rs".to_string(),
            "c.rs".to_string(),
        ]));
        let generator = DocGenerator::new(provider.clone(), Duration::from_secs(5))
            .with_max_concurrent(2)
            .with_progress(Arc::clone(&tracker));

        let files = ContentMap::from([
            ("a.rs".to_string(), "fn a() {}".to_string()),
            ("fail.rs".to_string(), "fn fail() {}".to_string()),
            ("c.rs".to_string(), "fn c() {}".to_string()),
        ]);
        let batch = generator.generate_comments(&files, "").await;

        assert_eq!(batch.commented.keys().collect::<Vec<_>>(), vec!["a.rs", "c.rs"]);
        assert!(batch.commented["a.rs"].starts_with("// commented"));
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].path, "fail.rs");
        assert!(batch.failures[0].error.contains("500"));
        assert!(!batch.is_complete());

        assert_eq!(tracker.status("a.rs"), Some(TaskStatus::Done));
        assert!(matches!(tracker.status("fail.rs"), Some(TaskStatus::Failed(_))));
        assert_eq!(provider.prompts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn no_files_no_calls() {
        let provider = echo();
        let generator = DocGenerator::new(provider.clone(), Duration::from_secs(5));
        let batch = generator.generate_comments(&ContentMap::new(), "").await;
        assert!(batch.commented.is_empty());
        assert!(batch.is_complete());
        assert!(provider.prompts.lock().unwrap().is_empty());
    }
}

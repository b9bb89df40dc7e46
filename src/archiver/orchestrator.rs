//! Fault-isolated archive run

use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::report::{ArchiveReport, MediaOutcome, PostOutcome, StepOutcome};
use super::{ArchiveError, ArchiveResult, RateLimiter};
use crate::config::ArchiveConfig;
use crate::fetcher::{
    Credentials, FeedPaginator, MediaFetcher, PlatformApi, PostLookup, Session,
};
use crate::metrics::RunMetrics;
use crate::output::ArchiveSink;
use crate::shutdown::SharedShutdown;
use crate::{MediaFile, Post};

/// Drives login, feed fetch, per-post archive and download, and persistence
pub struct ArchiveOrchestrator {
    api: Arc<dyn PlatformApi>,
    media: Arc<dyn MediaFetcher>,
    sink: Arc<dyn ArchiveSink>,
    limiter: Arc<RateLimiter>,
    store_locally: bool,
    shutdown: Option<SharedShutdown>,
    progress: ProgressBar,
}

impl ArchiveOrchestrator {
    /// Wire the pipeline's collaborators
    ///
    /// The limiter is shared by every remote call the orchestrator makes,
    /// including those issued through its paginator.
    pub fn new(
        api: Arc<dyn PlatformApi>,
        media: Arc<dyn MediaFetcher>,
        sink: Arc<dyn ArchiveSink>,
        limiter: Arc<RateLimiter>,
        config: &ArchiveConfig,
    ) -> Self {
        Self {
            api,
            media,
            sink,
            limiter,
            store_locally: config.store_locally,
            shutdown: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Show a progress bar over posts while archiving
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = if enabled {
            create_progress_bar()
        } else {
            ProgressBar::hidden()
        };
        self
    }

    /// Stop side-effect steps once `shutdown` is requested
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Authenticate
    pub async fn login(&self, credentials: &Credentials) -> ArchiveResult<Session> {
        self.limiter.acquire().await;
        Ok(self.api.login(credentials).await?)
    }

    /// Fetch and convert every post of the session's feed
    pub async fn fetch_all(&self, session: &Session) -> ArchiveResult<Vec<Post>> {
        Ok(self.paginator(session).fetch_all().await?)
    }

    /// Look up one post by shortcode, permalink or numeric id
    pub async fn fetch_one(&self, session: &Session, identifier: &str) -> ArchiveResult<PostLookup> {
        Ok(self.paginator(session).fetch_one(identifier).await?)
    }

    fn paginator(&self, session: &Session) -> FeedPaginator {
        FeedPaginator::new(self.api.clone(), self.limiter.clone(), session.clone())
    }

    /// Archive and download every post, isolating failures per post
    ///
    /// Every input post is returned in the report, in order. Remaining posts
    /// skip both steps once shutdown is requested.
    pub async fn archive_all(&self, session: &Session, posts: Vec<Post>) -> ArchiveReport {
        let mut report = ArchiveReport::default();
        self.progress.set_length(posts.len() as u64);

        for mut post in posts {
            if !report.is_interrupted() && self.shutdown_requested() {
                warn!("Shutdown requested, remaining posts will only be persisted");
                report.mark_interrupted();
            }

            let outcome = if report.is_interrupted() {
                PostOutcome {
                    post_id: post.id.clone(),
                    archive: StepOutcome::Skipped,
                    media: MediaOutcome::Skipped,
                }
            } else {
                self.process_post(session, &mut post).await
            };

            self.progress.inc(1);
            report.push(post, outcome);
        }

        self.progress.finish_with_message("done");
        info!(
            total = report.total(),
            archived = report.archived(),
            archive_failures = report.archive_failures(),
            media_failures = report.media_failures(),
            "Archive pass complete"
        );
        report
    }

    /// Full run: login, fetch, archive and download, then persist metadata
    ///
    /// # Errors
    /// Login, feed and metadata errors abort the run. A run that fails
    /// before the metadata step writes nothing.
    pub async fn run(&self, credentials: &Credentials) -> ArchiveResult<ArchiveReport> {
        let run_metrics = RunMetrics::start(credentials.username.as_str());

        let result = async {
            let session = self.login(credentials).await?;
            let posts = self.fetch_all(&session).await?;
            info!(posts = posts.len(), "Fetched feed");

            let report = self.archive_all(&session, posts).await;
            self.sink.write_metadata(report.posts()).await?;
            Ok::<_, ArchiveError>(report)
        }
        .await;

        match &result {
            Ok(report) => run_metrics.record_success(report.total()),
            Err(e) => run_metrics.record_failure(&e.to_string()),
        }
        result
    }

    async fn process_post(&self, session: &Session, post: &mut Post) -> PostOutcome {
        let archive = match self.archive_post(session, post).await {
            Ok(()) => {
                post.is_archived = true;
                StepOutcome::Ok
            }
            Err(e) => {
                warn!(post_id = %post.id, error = %e, "Failed to archive post");
                crate::metrics::record_archive_failure();
                StepOutcome::Failed(e.to_string())
            }
        };

        let media = if self.store_locally {
            self.download_media(post).await
        } else {
            MediaOutcome::Skipped
        };

        PostOutcome {
            post_id: post.id.clone(),
            archive,
            media,
        }
    }

    async fn archive_post(&self, session: &Session, post: &Post) -> ArchiveResult<()> {
        self.limiter.acquire().await;

        let status = self
            .api
            .set_archived(session, &post.id)
            .await
            .map_err(|e| ArchiveError::ArchiveStepError(e.to_string()))?;

        if !status.is_ok() {
            return Err(ArchiveError::ArchiveStepError(format!(
                "platform answered status {:?}: {}",
                status.status,
                status.message.as_deref().unwrap_or("no message")
            )));
        }

        debug!(post_id = %post.id, "Post archived");
        Ok(())
    }

    async fn download_media(&self, post: &mut Post) -> MediaOutcome {
        let mut failed_files = Vec::new();
        let mut first_path = None;

        for (index, file) in post.media_files.iter().enumerate() {
            match self.download_file(post, index, file).await {
                Ok(path) => {
                    if first_path.is_none() {
                        first_path = Some(path);
                    }
                }
                Err(e) => {
                    warn!(post_id = %post.id, index, url = %file.url, error = %e, "Failed to store media");
                    crate::metrics::record_download_failure();
                    failed_files.push(index);
                }
            }
        }

        if failed_files.is_empty() {
            post.local_path = first_path;
            MediaOutcome::Ok {
                files: post.media_files.len(),
            }
        } else {
            MediaOutcome::Failed { failed_files }
        }
    }

    async fn download_file(
        &self,
        post: &Post,
        index: usize,
        file: &MediaFile,
    ) -> ArchiveResult<PathBuf> {
        self.limiter.acquire().await;

        let bytes = self
            .media
            .fetch(&file.url)
            .await
            .map_err(|e| ArchiveError::DownloadStepError(e.to_string()))?;

        self.sink
            .write_media(post, index, &bytes, file.kind)
            .await
            .map_err(|e| ArchiveError::DownloadStepError(e.to_string()))
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|s| s.is_shutdown_requested())
    }
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} posts {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("archiving");
    pb
}

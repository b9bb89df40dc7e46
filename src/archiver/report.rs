//! Per-post outcomes of an archive run

use crate::Post;
use serde::Serialize;
use std::fmt;

/// Outcome of the remote archive step for one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The platform confirmed the post is archived
    Ok,
    /// The call failed or the platform refused
    Failed(String),
    /// Not attempted (shutdown requested)
    Skipped,
}

/// Outcome of the media step for one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MediaOutcome {
    /// Every media file was written
    Ok {
        /// Number of files written
        files: usize,
    },
    /// At least one file could not be fetched or written
    Failed {
        /// Indexes into `media_files` that failed
        failed_files: Vec<usize>,
    },
    /// Not attempted (local storage disabled or shutdown requested)
    Skipped,
}

/// Outcomes for one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostOutcome {
    /// Post id
    pub post_id: String,
    /// Remote archive step
    pub archive: StepOutcome,
    /// Media step
    pub media: MediaOutcome,
}

/// Result of processing a batch of posts
///
/// Holds every post handed to the pipeline, in input order, whatever
/// happened to its side-effect steps.
#[derive(Debug, Clone, Default)]
pub struct ArchiveReport {
    posts: Vec<Post>,
    outcomes: Vec<PostOutcome>,
    interrupted: bool,
}

impl ArchiveReport {
    pub(crate) fn push(&mut self, post: Post, outcome: PostOutcome) {
        self.posts.push(post);
        self.outcomes.push(outcome);
    }

    pub(crate) fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Posts after processing, ready for persistence
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Consume the report, returning the processed posts
    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }

    /// Per-post outcomes in input order
    pub fn outcomes(&self) -> &[PostOutcome] {
        &self.outcomes
    }

    /// Number of posts processed
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Posts whose archive step succeeded
    pub fn archived(&self) -> usize {
        self.count(|o| o.archive == StepOutcome::Ok)
    }

    /// Posts whose archive step failed
    pub fn archive_failures(&self) -> usize {
        self.count(|o| matches!(o.archive, StepOutcome::Failed(_)))
    }

    /// Posts whose media were all written
    pub fn media_stored(&self) -> usize {
        self.count(|o| matches!(o.media, MediaOutcome::Ok { .. }))
    }

    /// Posts with at least one failed media file
    pub fn media_failures(&self) -> usize {
        self.count(|o| matches!(o.media, MediaOutcome::Failed { .. }))
    }

    /// Whether shutdown cut the side-effect steps short
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    fn count(&self, predicate: impl Fn(&PostOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

impl fmt::Display for ArchiveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} posts: {} archived, {} archive failures, {} with media stored, {} media failures",
            self.total(),
            self.archived(),
            self.archive_failures(),
            self.media_stored(),
            self.media_failures()
        )?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}

//! Clip review seam.
//!
//! Rendering never waits on review. A [`ClipReviewer`] is driven over the
//! clips a batch produced, and its decisions can be persisted next to the
//! clips for later curation.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use longform_common::{LongformError, LongformResult};
use serde::{Deserialize, Serialize};

use crate::segment::Clip;

/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

/// A reviewer's verdict on one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    /// Stars, 0 through 5.
    pub rating: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewDecision {
    pub fn new(rating: u8) -> Self {
        Self {
            rating,
            tags: vec![],
            notes: None,
            reviewed_at: Utc::now(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn validate(&self) -> LongformResult<()> {
        if self.rating > MAX_RATING {
            return Err(LongformError::review(format!(
                "rating {} is outside 0-{MAX_RATING}",
                self.rating
            )));
        }
        Ok(())
    }
}

/// A clip together with its review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipReview {
    pub segment_id: String,
    pub decision: ReviewDecision,
}

/// Rates finished clips (a person at a prompt, a model, a fixed policy).
#[async_trait]
pub trait ClipReviewer: Send + Sync {
    async fn review(&self, clip: &Clip) -> LongformResult<ReviewDecision>;
}

/// Review each clip in order, rejecting out-of-range ratings.
pub async fn review_clips<'a, I>(
    reviewer: &dyn ClipReviewer,
    clips: I,
) -> LongformResult<Vec<ClipReview>>
where
    I: IntoIterator<Item = &'a Clip>,
{
    let mut reviews = vec![];
    for clip in clips {
        let decision = reviewer.review(clip).await?;
        decision.validate()?;
        tracing::debug!(segment = %clip.segment_id, rating = decision.rating, "Clip reviewed");
        reviews.push(ClipReview {
            segment_id: clip.segment_id.clone(),
            decision,
        });
    }
    Ok(reviews)
}

/// Persist reviews as pretty JSON.
pub fn write_review_log(path: &Path, reviews: &[ClipReview]) -> LongformResult<()> {
    std::fs::write(path, serde_json::to_string_pretty(reviews)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::ClipStatus;
    use std::path::PathBuf;

    struct FixedReviewer(u8);

    #[async_trait]
    impl ClipReviewer for FixedReviewer {
        async fn review(&self, _clip: &Clip) -> LongformResult<ReviewDecision> {
            Ok(ReviewDecision::new(self.0).with_tags(["auto"]))
        }
    }

    fn clip(id: &str) -> Clip {
        Clip {
            segment_id: id.to_string(),
            path: PathBuf::from(format!("/clips/{id}.mp4")),
            status: ClipStatus::Created,
        }
    }

    #[tokio::test]
    async fn test_review_clips_in_order() {
        let clips = vec![clip("a"), clip("b")];
        let reviews = review_clips(&FixedReviewer(4), &clips).await.unwrap();
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].segment_id, "a");
        assert_eq!(reviews[1].decision.tags, vec!["auto".to_string()]);
    }

    #[tokio::test]
    async fn test_out_of_range_rating_is_rejected() {
        let clips = vec![clip("a")];
        let err = review_clips(&FixedReviewer(6), &clips).await.unwrap_err();
        assert!(matches!(err, LongformError::Review { .. }));
        assert_eq!(err.to_string(), "Invalid review: rating 6 is outside 0-5");
    }

    #[test]
    fn test_review_log_roundtrips() {
        let path = std::env::temp_dir().join("longform_test_reviews.json");
        let reviews = vec![ClipReview {
            segment_id: "a".to_string(),
            decision: ReviewDecision::new(3),
        }];
        write_review_log(&path, &reviews).unwrap();
        let loaded: Vec<ClipReview> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, reviews);
        std::fs::remove_file(&path).ok();
    }
}

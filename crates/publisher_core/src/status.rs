/// Lifecycle status of a post as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Created, not yet due or not yet claimed.
    Scheduled,
    /// Claimed by a scheduler tick; a publish pass is (or was) in progress.
    Publishing,
    /// Some targets published, some failed, after a complete pass.
    PartiallyPublished,
    /// Every target published.
    Published,
    /// Every target failed.
    Failed,
}

/// Lifecycle status of a single platform target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    /// Not yet attempted, or eligible for retry.
    Pending,
    /// A publish attempt is in flight for this target.
    Publishing,
    /// Published successfully; `remotePostId` is set.
    Published,
    /// The most recent attempt failed.
    Failed,
}

/// Reduce the multiset of a post's target statuses, after a publish pass,
/// to a single post status.
///
/// All-published yields `published`, all-failed yields `failed`, anything
/// else (a mix, or an empty target set) yields `partially_published`.
/// A lingering `publishing` status is a bug in the caller — it means the
/// pass did not finalize every target — so callers are expected to check
/// for that *before* calling this function (see `publisher_error::PublishErrorKind::StuckPublishing`);
/// this function treats any leftover `Publishing` entry as non-terminal and
/// folds it into the `partially_published` bucket rather than panicking.
pub fn reduce_post_status(statuses: &[TargetStatus]) -> PostStatus {
    if statuses.is_empty() {
        return PostStatus::PartiallyPublished;
    }
    let all_published = statuses.iter().all(|s| matches!(s, TargetStatus::Published));
    if all_published {
        return PostStatus::Published;
    }
    let all_failed = statuses.iter().all(|s| matches!(s, TargetStatus::Failed));
    if all_failed {
        return PostStatus::Failed;
    }
    PostStatus::PartiallyPublished
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_published_is_published() {
        let statuses = vec![TargetStatus::Published, TargetStatus::Published];
        assert_eq!(reduce_post_status(&statuses), PostStatus::Published);
    }

    #[test]
    fn all_failed_is_failed() {
        let statuses = vec![TargetStatus::Failed, TargetStatus::Failed];
        assert_eq!(reduce_post_status(&statuses), PostStatus::Failed);
    }

    #[test]
    fn mixed_is_partially_published() {
        let statuses = vec![TargetStatus::Published, TargetStatus::Failed];
        assert_eq!(reduce_post_status(&statuses), PostStatus::PartiallyPublished);
    }

    #[test]
    fn single_pending_is_partially_published() {
        let statuses = vec![TargetStatus::Pending];
        assert_eq!(reduce_post_status(&statuses), PostStatus::PartiallyPublished);
    }

    #[test]
    fn leftover_publishing_is_not_terminal() {
        let statuses = vec![TargetStatus::Published, TargetStatus::Publishing];
        assert_eq!(reduce_post_status(&statuses), PostStatus::PartiallyPublished);
    }
}

//! The scheduler tick loop: claims due posts and dispatches each to the
//! publish pipeline.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use publisher_engine::Publisher;
use publisher_store::Store;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

/// Drives the periodic claim/dispatch cycle against a store and publisher.
pub struct SchedulerLoop {
    store: Arc<dyn Store>,
    publisher: Arc<Publisher>,
    poll_interval: Duration,
    stuck_publishing_threshold: Duration,
}

impl SchedulerLoop {
    /// Build a scheduler loop with the given tick period and stuck-post
    /// recovery threshold.
    pub fn new(
        store: Arc<dyn Store>,
        publisher: Arc<Publisher>,
        poll_interval: Duration,
        stuck_publishing_threshold: Duration,
    ) -> Self {
        Self {
            store,
            publisher,
            poll_interval,
            stuck_publishing_threshold,
        }
    }

    /// Run ticks until `shutdown` reports `true`. The first tick fires
    /// immediately; an in-flight publish pass at shutdown is allowed to
    /// finish, best-effort, by awaiting the collected join set afterward.
    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick(&mut in_flight).await;
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("scheduler shutting down");
                        break;
                    }
                }
            }
        }

        while in_flight.join_next().await.is_some() {}
    }

    /// Reset a post left in `publishing` by a crashed pass: any target
    /// still showing `publishing` goes back to `pending` so the next
    /// claim retries it, and the post itself drops to
    /// `partially_published` so `claim_due_posts` can pick it up again.
    async fn recover_stuck_post(&self, post_id: publisher_core::PostId) -> Result<(), publisher_error::StoreError> {
        let post = self.store.load_post(post_id).await?;
        for target in &post.targets {
            if target.publish_status == publisher_core::TargetStatus::Publishing {
                self.store
                    .update_target(
                        target.id,
                        publisher_store::TargetPatch {
                            publish_status: Some(publisher_core::TargetStatus::Pending),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
        }
        self.store
            .set_post_status(post_id, publisher_core::PostStatus::PartiallyPublished)
            .await
    }

    /// One tick: recover stuck posts, claim due posts, and dispatch each
    /// to the publish pipeline concurrently.
    #[instrument(skip(self, in_flight))]
    async fn tick(&self, in_flight: &mut JoinSet<()>) {
        let now = Utc::now();

        match self
            .store
            .list_stuck_publishing(now - self.stuck_publishing_threshold)
            .await
        {
            Ok(stuck) => {
                for post_id in stuck {
                    warn!(%post_id, "recovering post stuck in publishing");
                    if let Err(e) = self.recover_stuck_post(post_id).await {
                        error!(%post_id, error = %e, "failed to recover stuck post");
                    }
                }
            }
            Err(e) => error!(error = %e, "failed to sweep for stuck posts"),
        }

        let ids = match self.store.claim_due_posts(now).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "failed to claim due posts");
                return;
            }
        };

        for post_id in ids {
            let publisher = Arc::clone(&self.publisher);
            let store = Arc::clone(&self.store);
            in_flight.spawn(async move {
                if let Err(e) = publisher.publish_post(post_id).await {
                    error!(%post_id, error = %e, "catastrophic publish error, marking post failed");
                    if let Err(set_err) = store
                        .set_post_status(post_id, publisher_core::PostStatus::Failed)
                        .await
                    {
                        error!(%post_id, error = %set_err, "failed to mark post failed after catastrophic error");
                    }
                }
            });
        }

        // Drain handles that have already finished so the set doesn't
        // grow unbounded across many ticks.
        while in_flight.try_join_next().is_some() {}
    }
}

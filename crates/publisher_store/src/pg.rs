//! Postgres-backed [`Store`] implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use publisher_core::{
    Platform, PlatformCredentials, Post, PostId, PostStatus, PublishAttempt, TargetId,
    TargetStatus,
};
use publisher_error::{StoreError, StoreErrorKind};
use tracing::instrument;
use uuid::Uuid;

use crate::connection::PgPool;
use crate::models::{
    parse_platform, AttemptRow, CredentialsRow, MediaAssetRow, PostMediaRow, PostRow, TargetRow,
};
use crate::schema::{media_assets, platform_credentials, post_media, post_platform_targets, posts, publish_attempts};
use crate::store::{NewPost, PostPatch, Store, StoreResult, TargetPatch};

/// A [`Store`] backed by a pooled Postgres connection.
///
/// Every method runs its diesel call inside [`tokio::task::spawn_blocking`]:
/// diesel's synchronous API must never execute on the async runtime's
/// worker threads.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::new(StoreErrorKind::Connection(e.to_string())))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::new(StoreErrorKind::Query(e.to_string())))?
    }

    fn load_post_sync(conn: &mut PgConnection, id: Uuid) -> Result<Post, StoreError> {
        let row: PostRow = posts::table.find(id).first(conn)?;
        let mut post = row.into_domain()?;

        let target_rows: Vec<TargetRow> = post_platform_targets::table
            .filter(post_platform_targets::post_id.eq(id))
            .load(conn)?;
        post.targets = target_rows
            .into_iter()
            .map(|r| r.into_domain())
            .collect::<Result<Vec<_>, _>>()?;

        let media_rows: Vec<(PostMediaRow, MediaAssetRow)> = post_media::table
            .inner_join(media_assets::table)
            .filter(post_media::post_id.eq(id))
            .order(post_media::sort_order.asc())
            .load(conn)?;
        post.media = media_rows
            .into_iter()
            .map(|(_, asset)| asset.into_domain())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(post)
    }
}

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self))]
    async fn claim_due_posts(&self, now: DateTime<Utc>) -> StoreResult<Vec<PostId>> {
        self.run(move |conn| {
            let ids: Vec<Uuid> = diesel::update(posts::table)
                .filter(
                    posts::status
                        .eq("scheduled")
                        .or(posts::status.eq("partially_published")),
                )
                .filter(posts::scheduled_at_utc.le(now))
                .set((posts::status.eq("publishing"), posts::updated_at.eq(now)))
                .returning(posts::id)
                .get_results(conn)?;
            Ok(ids.into_iter().map(PostId).collect())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn load_post(&self, id: PostId) -> StoreResult<Post> {
        self.run(move |conn| Self::load_post_sync(conn, id.0)).await
    }

    #[instrument(skip(self, patch))]
    async fn update_target(&self, id: TargetId, patch: TargetPatch) -> StoreResult<()> {
        self.run(move |conn| {
            diesel::update(post_platform_targets::table.find(id.0))
                .set((
                    patch
                        .publish_status
                        .map(|s| post_platform_targets::publish_status.eq(s.to_string())),
                    patch
                        .remote_post_id
                        .map(|v| post_platform_targets::remote_post_id.eq(v)),
                    patch
                        .failure_reason
                        .map(|v| post_platform_targets::failure_reason.eq(v)),
                    patch
                        .last_attempt_at
                        .map(|v| post_platform_targets::last_attempt_at.eq(v)),
                    post_platform_targets::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self, attempt))]
    async fn append_attempt(&self, attempt: PublishAttempt) -> StoreResult<()> {
        self.run(move |conn| {
            diesel::insert_into(publish_attempts::table)
                .values(AttemptRow::from_domain(&attempt))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn count_attempts(&self, target_id: TargetId) -> StoreResult<u32> {
        self.run(move |conn| {
            let count: i64 = publish_attempts::table
                .filter(publish_attempts::target_id.eq(target_id.0))
                .count()
                .get_result(conn)?;
            Ok(count as u32)
        })
        .await
    }

    #[instrument(skip(self))]
    async fn set_post_status(&self, id: PostId, status: PostStatus) -> StoreResult<()> {
        self.run(move |conn| {
            diesel::update(posts::table.find(id.0))
                .set((
                    posts::status.eq(status.to_string()),
                    posts::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_credentials(&self, platform: Platform) -> StoreResult<Option<PlatformCredentials>> {
        self.run(move |conn| {
            let row: Option<CredentialsRow> = platform_credentials::table
                .find(platform.to_string())
                .first(conn)
                .optional()?;
            row.map(|r| r.into_domain()).transpose()
        })
        .await
    }

    #[instrument(skip(self, values))]
    async fn put_credentials(&self, platform: Platform, values: HashMap<String, String>) -> StoreResult<()> {
        self.run(move |conn| {
            let now = Utc::now();
            let values_json = serde_json::to_string(&values)?;
            let row = CredentialsRow {
                platform: platform.to_string(),
                values_json,
                created_at: now,
                updated_at: now,
            };
            diesel::insert_into(platform_credentials::table)
                .values(&row)
                .on_conflict(platform_credentials::platform)
                .do_update()
                .set((
                    platform_credentials::values_json.eq(&row.values_json),
                    platform_credentials::updated_at.eq(now),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_credentials(&self, platform: Platform) -> StoreResult<()> {
        self.run(move |conn| {
            diesel::delete(platform_credentials::table.find(platform.to_string())).execute(conn)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_configured_platforms(&self) -> StoreResult<Vec<Platform>> {
        self.run(|conn| {
            let tags: Vec<String> = platform_credentials::table
                .select(platform_credentials::platform)
                .load(conn)?;
            tags.iter().map(|t| parse_platform(t)).collect()
        })
        .await
    }

    #[instrument(skip(self, new_post))]
    async fn create_post(&self, new_post: NewPost) -> StoreResult<PostId> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let now = Utc::now();
                let post_id = Uuid::new_v4();
                let post_row = PostRow {
                    id: post_id,
                    base_content: new_post.base_content,
                    scheduled_at_utc: new_post.scheduled_at_utc,
                    status: PostStatus::Scheduled.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                diesel::insert_into(posts::table).values(&post_row).execute(conn)?;

                for (i, media_id) in new_post.media_ids.iter().enumerate() {
                    let link = PostMediaRow {
                        post_id,
                        media_asset_id: media_id.0,
                        sort_order: i as i32,
                    };
                    diesel::insert_into(post_media::table).values(&link).execute(conn)?;
                }

                for target in new_post.targets {
                    let override_media_refs = match target.override_media_refs {
                        Some(refs) => {
                            let ids: Vec<String> = refs.iter().map(|id| id.0.to_string()).collect();
                            Some(serde_json::to_value(ids)?)
                        }
                        None => None,
                    };
                    let override_options = match target.override_options {
                        Some(opts) => Some(serde_json::to_value(opts)?),
                        None => None,
                    };
                    let target_row = TargetRow {
                        id: Uuid::new_v4(),
                        post_id,
                        platform: target.platform.to_string(),
                        override_content: target.override_content,
                        override_media_refs,
                        override_options,
                        publish_status: TargetStatus::Pending.to_string(),
                        remote_post_id: None,
                        failure_reason: None,
                        last_attempt_at: None,
                        updated_at: now,
                    };
                    diesel::insert_into(post_platform_targets::table)
                        .values(&target_row)
                        .execute(conn)?;
                }

                Ok(PostId(post_id))
            })
        })
        .await
    }

    #[instrument(skip(self, patch))]
    async fn update_post(&self, id: PostId, patch: PostPatch) -> StoreResult<()> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let current: PostRow = posts::table.find(id.0).first(conn)?;
                if current.status != PostStatus::Scheduled.to_string() {
                    return Err(StoreError::new(StoreErrorKind::Query(
                        "post is not in scheduled status".to_string(),
                    )));
                }

                let now = Utc::now();
                diesel::update(posts::table.find(id.0))
                    .set((
                        patch.base_content.map(|v| posts::base_content.eq(v)),
                        patch
                            .scheduled_at_utc
                            .map(|v| posts::scheduled_at_utc.eq(v)),
                        posts::updated_at.eq(now),
                    ))
                    .execute(conn)?;

                if let Some(media_ids) = patch.media_ids {
                    diesel::delete(post_media::table.filter(post_media::post_id.eq(id.0)))
                        .execute(conn)?;
                    for (i, media_id) in media_ids.iter().enumerate() {
                        let link = PostMediaRow {
                            post_id: id.0,
                            media_asset_id: media_id.0,
                            sort_order: i as i32,
                        };
                        diesel::insert_into(post_media::table).values(&link).execute(conn)?;
                    }
                }

                if let Some(targets) = patch.targets {
                    diesel::delete(
                        post_platform_targets::table.filter(post_platform_targets::post_id.eq(id.0)),
                    )
                    .execute(conn)?;
                    for target in targets {
                        let override_media_refs = match target.override_media_refs {
                            Some(refs) => {
                                let ids: Vec<String> =
                                    refs.iter().map(|mid| mid.0.to_string()).collect();
                                Some(serde_json::to_value(ids)?)
                            }
                            None => None,
                        };
                        let override_options = match target.override_options {
                            Some(opts) => Some(serde_json::to_value(opts)?),
                            None => None,
                        };
                        let target_row = TargetRow {
                            id: Uuid::new_v4(),
                            post_id: id.0,
                            platform: target.platform.to_string(),
                            override_content: target.override_content,
                            override_media_refs,
                            override_options,
                            publish_status: TargetStatus::Pending.to_string(),
                            remote_post_id: None,
                            failure_reason: None,
                            last_attempt_at: None,
                            updated_at: now,
                        };
                        diesel::insert_into(post_platform_targets::table)
                            .values(&target_row)
                            .execute(conn)?;
                    }
                }

                Ok(())
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_post(&self, id: PostId) -> StoreResult<()> {
        self.run(move |conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let target_ids: Vec<Uuid> = post_platform_targets::table
                    .filter(post_platform_targets::post_id.eq(id.0))
                    .select(post_platform_targets::id)
                    .load(conn)?;
                diesel::delete(
                    publish_attempts::table.filter(publish_attempts::target_id.eq_any(target_ids)),
                )
                .execute(conn)?;
                diesel::delete(
                    post_platform_targets::table.filter(post_platform_targets::post_id.eq(id.0)),
                )
                .execute(conn)?;
                diesel::delete(post_media::table.filter(post_media::post_id.eq(id.0))).execute(conn)?;
                diesel::delete(posts::table.find(id.0)).execute(conn)?;
                Ok(())
            })
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_posts(&self) -> StoreResult<Vec<Post>> {
        self.run(|conn| {
            let ids: Vec<Uuid> = posts::table.select(posts::id).load(conn)?;
            ids.into_iter()
                .map(|id| Self::load_post_sync(conn, id))
                .collect()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_post(&self, id: PostId) -> StoreResult<Post> {
        self.run(move |conn| Self::load_post_sync(conn, id.0)).await
    }

    #[instrument(skip(self, ids))]
    async fn get_media_assets(&self, ids: &[publisher_core::MediaAssetId]) -> StoreResult<Vec<publisher_core::MediaAsset>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();
        self.run(move |conn| {
            let rows: Vec<MediaAssetRow> = media_assets::table
                .filter(media_assets::id.eq_any(ids))
                .load(conn)?;
            rows.into_iter().map(|r| r.into_domain()).collect()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn list_stuck_publishing(&self, older_than: DateTime<Utc>) -> StoreResult<Vec<PostId>> {
        self.run(move |conn| {
            let ids: Vec<Uuid> = posts::table
                .filter(posts::status.eq(PostStatus::Publishing.to_string()))
                .filter(posts::updated_at.lt(older_than))
                .select(posts::id)
                .load(conn)?;
            Ok(ids.into_iter().map(PostId).collect())
        })
        .await
    }
}

// @generated manually, following the shape Diesel's CLI would produce.

diesel::table! {
    posts (id) {
        id -> Uuid,
        base_content -> Text,
        scheduled_at_utc -> Timestamptz,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    post_platform_targets (id) {
        id -> Uuid,
        post_id -> Uuid,
        platform -> Text,
        override_content -> Nullable<Text>,
        override_media_refs -> Nullable<Jsonb>,
        override_options -> Nullable<Jsonb>,
        publish_status -> Text,
        remote_post_id -> Nullable<Text>,
        failure_reason -> Nullable<Text>,
        last_attempt_at -> Nullable<Timestamptz>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    publish_attempts (id) {
        id -> Uuid,
        target_id -> Uuid,
        attempted_at -> Timestamptz,
        success -> Bool,
        error_message -> Nullable<Text>,
        error_code -> Nullable<Text>,
    }
}

diesel::table! {
    media_assets (id) {
        id -> Uuid,
        media_type -> Text,
        storage_path -> Text,
        mime_type -> Text,
        size_bytes -> Int8,
        duration_seconds -> Nullable<Float4>,
        file_hash -> Text,
        original_filename -> Text,
    }
}

diesel::table! {
    post_media (post_id, media_asset_id) {
        post_id -> Uuid,
        media_asset_id -> Uuid,
        sort_order -> Int4,
    }
}

diesel::table! {
    platform_credentials (platform) {
        platform -> Text,
        values_json -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(post_platform_targets -> posts (post_id));
diesel::joinable!(publish_attempts -> post_platform_targets (target_id));
diesel::joinable!(post_media -> posts (post_id));
diesel::joinable!(post_media -> media_assets (media_asset_id));

diesel::allow_tables_to_appear_in_same_query!(
    posts,
    post_platform_targets,
    publish_attempts,
    media_assets,
    post_media,
    platform_credentials,
);

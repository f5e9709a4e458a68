//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` or edit by hand alongside a new migration.

diesel::table! {
    /// Registered accounts and their coin balance.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        /// Lowercased; unique.
        email -> Varchar,
        password_hash -> Varchar,
        /// Never negative; enforced by a check constraint.
        coin_balance -> Int8,
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Catalog entries, hand-made or imported from RAWG.
    games (id) {
        id -> Uuid,
        /// Unique when present.
        rawg_id -> Nullable<Int8>,
        name -> Varchar,
        description -> Text,
        image_url -> Text,
        genres -> Array<Text>,
        platforms -> Array<Text>,
        rating -> Float8,
        price -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Permanent entitlements. `game_id` is deliberately not a foreign key.
    purchases (id) {
        id -> Uuid,
        user_id -> Uuid,
        game_id -> Uuid,
        price -> Int8,
        purchased_at -> Timestamptz,
    }
}

diesel::table! {
    /// Time-boxed entitlements; `status` is a hint refreshed by the sweep.
    rentals (id) {
        id -> Uuid,
        user_id -> Uuid,
        game_id -> Uuid,
        fee -> Int8,
        rent_at -> Timestamptz,
        expire_at -> Timestamptz,
        status -> Varchar,
    }
}

diesel::table! {
    recharges (id) {
        id -> Uuid,
        user_id -> Uuid,
        amount -> Int8,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Replayable responses keyed by (key, user, mutation type).
    idempotency_keys (key, user_id, mutation_type) {
        key -> Uuid,
        user_id -> Uuid,
        mutation_type -> Varchar,
        payload_hash -> Bytea,
        response_snapshot -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(purchases -> users (user_id));
diesel::joinable!(rentals -> users (user_id));
diesel::joinable!(recharges -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    games,
    purchases,
    rentals,
    recharges,
    idempotency_keys,
);

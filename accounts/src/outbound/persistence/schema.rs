//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `accounts/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered user accounts.
    ///
    /// `username` carries the `users_username_key` unique constraint. An empty
    /// `email` means the user gave no address.
    users (id) {
        id -> Uuid,
        #[max_length = 150]
        username -> Varchar,
        #[max_length = 150]
        first_name -> Varchar,
        #[max_length = 150]
        last_name -> Varchar,
        #[max_length = 254]
        email -> Varchar,
        /// Argon2 PHC string or an unusable marker.
        #[max_length = 255]
        password -> Varchar,
        #[max_length = 100]
        profile_picture -> Varchar,
        is_active -> Bool,
        is_staff -> Bool,
        is_superuser -> Bool,
        last_login -> Nullable<Timestamptz>,
        date_joined -> Timestamptz,
        /// Advanced on logout; sessions carrying an older value are rejected.
        session_version -> Int4,
    }
}

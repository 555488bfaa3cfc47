//! Idempotent store bootstrap, run once at process start.

use chrono::Utc;
use nanoid::nanoid;
use sha256::digest;
use showcase_shared::account::{Role, User};

use crate::{config, store};

/// Ensure the bootstrap accounts and moderation defaults exist.
///
/// Existing records are left untouched, so calling this on every start
/// is safe.
pub async fn ensure_seeded() -> crate::Result<()> {
    let bootstrap = config::INSTANCE.bootstrap.clone();
    store::INSTANCE
        .update(move |data| {
            if data.user_by_phone(&bootstrap.super_user.phone).is_none() {
                tracing::info!("seeding super user {}", bootstrap.super_user.phone);
                data.users.push(User {
                    id: nanoid!(),
                    phone: bootstrap.super_user.phone.clone(),
                    nickname: bootstrap.super_user.nickname.clone(),
                    avatar_url: None,
                    bio: None,
                    role: Role::SuperUser,
                    password_sha: Some(digest(bootstrap.super_user.password.as_str())),
                    created_at: Utc::now(),
                    deleted: false,
                });
            }

            if !data
                .users
                .iter()
                .any(|u| u.role == Role::Admin && !u.deleted)
            {
                tracing::info!("seeding admin account");
                data.users.push(User {
                    id: nanoid!(),
                    phone: bootstrap.admin.phone.clone(),
                    nickname: bootstrap.admin.nickname.clone(),
                    avatar_url: None,
                    bio: None,
                    role: Role::Admin,
                    password_sha: Some(digest(bootstrap.admin.password.as_str())),
                    created_at: Utc::now(),
                    deleted: false,
                });
            }

            if data.sensitive_words.is_empty() {
                data.sensitive_words = store::DEFAULT_SENSITIVE_WORDS
                    .iter()
                    .map(|w| w.to_string())
                    .collect();
            }

            Ok(())
        })
        .await
}

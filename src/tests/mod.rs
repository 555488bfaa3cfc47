mod moderation;
mod post;
mod video;

use chrono::Utc;
use nanoid::nanoid;
use showcase_shared::account::{Role, User};

use crate::{store, Viewer};

/// Reset the static store between tests.
async fn reset_all() {
    store::INSTANCE.reset().await;
}

/// Insert a user with the given role and return a viewer acting as them.
async fn viewer_with_role(nickname: &str, role: Role) -> Viewer {
    let user = User {
        id: nanoid!(),
        phone: nanoid!(),
        nickname: nickname.to_string(),
        avatar_url: None,
        bio: None,
        role,
        password_sha: None,
        created_at: Utc::now(),
        deleted: false,
    };
    let viewer = Viewer {
        user_id: user.id.clone(),
        role,
    };
    store::INSTANCE
        .update(move |data| {
            data.users.push(user);
            Ok(())
        })
        .await
        .unwrap();
    viewer
}

async fn user_viewer(nickname: &str) -> Viewer {
    viewer_with_role(nickname, Role::User).await
}

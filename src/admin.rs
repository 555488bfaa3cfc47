//! Admin-only moderation and statistics services.

use serde::Serialize;
use sha256::digest;
use showcase_shared::account::handle::{Session, UserPage};
use showcase_shared::account::{Role, User};
use showcase_shared::post::handle::PostQuery;
use showcase_shared::post::{MediaKind, Post, PostPage, PostView, TagCount};

use crate::account::{issue_session, sanitize};
use crate::{config, store, Error, Viewer};

fn require_admin(viewer: &Viewer) -> crate::Result<()> {
    if viewer.is_admin() {
        Ok(())
    } else {
        Err(Error::PermissionDenied)
    }
}

/// Log in to the admin panel with the configured username and the
/// seeded admin account's password.
pub async fn login(username: &str, password: &str) -> crate::Result<Session> {
    if username != config::INSTANCE.bootstrap.admin.username {
        return Err(Error::UsernameOrPasswordIncorrect);
    }
    let password = password.to_string();
    store::INSTANCE
        .update(move |data| {
            let admin = data
                .users
                .iter()
                .find(|u| u.role == Role::Admin && !u.deleted)
                .cloned()
                .ok_or(Error::AdminNotInitialized)?;
            match admin.password_sha.as_deref() {
                Some(sha) if digest(password.as_str()) == sha => {}
                _ => return Err(Error::UsernameOrPasswordIncorrect),
            }
            Ok(issue_session(data, &admin))
        })
        .await
}

/// Page through all non-deleted users, optionally filtered by phone,
/// nickname or id.
pub async fn list_users(
    viewer: &Viewer,
    q: Option<&str>,
    page: usize,
    page_size: usize,
) -> crate::Result<UserPage> {
    require_admin(viewer)?;
    let q = q.map(str::trim).filter(|q| !q.is_empty());
    let data = store::INSTANCE.read().await;
    let mut users: Vec<&User> = data
        .users
        .iter()
        .filter(|u| !u.deleted)
        .filter(|u| match q {
            Some(q) => u.phone.contains(q) || u.nickname.contains(q) || u.id.contains(q),
            None => true,
        })
        .collect();
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let total = users.len();

    let page = page.max(1);
    let page_size = if page_size == 0 { 10 } else { page_size };
    let items = users
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(sanitize)
        .collect();
    Ok(UserPage { items, total })
}

/// Soft-delete a user. The record stays for history; the account stops
/// resolving everywhere that filters on the flag.
pub async fn delete_user(viewer: &Viewer, user_id: &str) -> crate::Result<()> {
    require_admin(viewer)?;
    let user_id = user_id.to_string();
    store::INSTANCE
        .update(move |data| {
            let user = data
                .users
                .iter_mut()
                .find(|u| u.id == user_id)
                .ok_or(Error::UserNotFound(user_id))?;
            tracing::info!("soft-deleting user {}", user.id);
            user.deleted = true;
            Ok(())
        })
        .await
}

/// Page through every post regardless of visibility.
pub async fn list_posts(viewer: &Viewer, query: PostQuery) -> crate::Result<PostPage> {
    require_admin(viewer)?;
    let data = store::INSTANCE.read().await;
    let mut posts: Vec<&Post> = data.posts.iter().collect();

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        posts.retain(|p| {
            p.title.as_deref().map_or(false, |t| t.contains(q))
                || p.text.as_deref().map_or(false, |t| t.contains(q))
                || p.id.contains(q)
        });
    }
    if let Some(tag) = query.tag.as_deref().filter(|t| !t.is_empty()) {
        posts.retain(|p| p.tags.iter().any(|t| t == tag));
    }

    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let total = posts.len();

    let page = query.page.max(1);
    let page_size = if query.page_size == 0 {
        10
    } else {
        query.page_size
    };
    let items = posts
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(|post| PostView {
            post: post.clone(),
            rating_summary: None,
        })
        .collect();
    Ok(PostPage { items, total })
}

/// Remove a post and its comments and ratings, regardless of author.
/// Removing an id that no longer exists is a no-op.
pub async fn remove_post(viewer: &Viewer, post_id: &str) -> crate::Result<()> {
    require_admin(viewer)?;
    let post_id = post_id.to_string();
    store::INSTANCE
        .update(move |data| {
            data.posts.retain(|p| p.id != post_id);
            data.comments.retain(|c| c.post_id != post_id);
            data.ratings.retain(|r| r.post_id != post_id);
            Ok(())
        })
        .await
}

/// Posts created per day.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// `YYYY-MM-DD` in UTC.
    pub date: String,
    pub count: usize,
}

/// How posts split across media compositions.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypeRatio {
    pub text: usize,
    pub image: usize,
    pub video: usize,
    pub mixed: usize,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub trend: Vec<TrendPoint>,
    pub type_ratio: TypeRatio,
    pub top_tags: Vec<TagCount>,
}

/// Content statistics over all posts: per-day trend, media type ratio
/// and the ten most used tags.
pub async fn stats(viewer: &Viewer) -> crate::Result<Stats> {
    require_admin(viewer)?;
    let data = store::INSTANCE.read().await;

    let mut trend: std::collections::BTreeMap<String, usize> = std::collections::BTreeMap::new();
    let mut type_ratio = TypeRatio::default();
    for post in &data.posts {
        let day = post.created_at.format("%Y-%m-%d").to_string();
        *trend.entry(day).or_default() += 1;

        let has_image = post.media.iter().any(|m| m.kind == MediaKind::Image);
        let has_video = post.media.iter().any(|m| m.kind == MediaKind::Video);
        match (has_image, has_video) {
            (false, false) => type_ratio.text += 1,
            (true, false) => type_ratio.image += 1,
            (false, true) => type_ratio.video += 1,
            (true, true) => type_ratio.mixed += 1,
        }
    }

    let mut top_tags = crate::post::tag_counts_in(&data);
    top_tags.truncate(10);

    Ok(Stats {
        trend: trend
            .into_iter()
            .map(|(date, count)| TrendPoint { date, count })
            .collect(),
        type_ratio,
        top_tags,
    })
}

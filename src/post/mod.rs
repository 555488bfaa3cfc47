//! Post publishing and visibility-gated reads.

pub mod comment;
pub mod rating;

use chrono::{DateTime, Duration, Utc};
use nanoid::nanoid;
use showcase_shared::post::handle::{CreatePostDescriptor, EditPostDescriptor, PostQuery};
use showcase_shared::post::{Post, PostPage, PostView, TagCount, Visibility};
use std::collections::{HashMap, HashSet};

use crate::store::{self, Snapshot};
use crate::{friend, moderation, Error, Viewer};

/// Whether `viewer` may read `post`, given the viewer's precomputed
/// friend-id set.
///
/// Admins and super users read everything; public posts are open to
/// anyone; otherwise the author always sees their own post, private
/// posts stop there, and friends-only posts require an edge between
/// viewer and author. The friend set is computed once per request and
/// reused across a whole candidate list.
pub fn can_view(post: &Post, viewer: &Viewer, friends: &HashSet<String>) -> bool {
    if viewer.role.elevated() {
        return true;
    }
    if post.visibility == Visibility::Public {
        return true;
    }
    if post.author_id == viewer.user_id {
        return true;
    }
    if post.visibility == Visibility::Private {
        return false;
    }
    friends.contains(&post.author_id)
}

fn normalize(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reject content that hits the moderation word list.
fn ensure_clean(
    title: Option<&str>,
    text: Option<&str>,
    tags: &[String],
    words: &[String],
) -> crate::Result<()> {
    let tags_joined = tags.join(" ");
    let joined = [
        title.unwrap_or_default(),
        text.unwrap_or_default(),
        tags_joined.as_str(),
    ]
    .join("\n");
    let outcome = moderation::mask(joined.trim(), words);
    if outcome.allowed {
        Ok(())
    } else {
        Err(Error::SensitiveContent(outcome.hits))
    }
}

/// Publish a new post.
pub async fn create_post(viewer: &Viewer, descriptor: CreatePostDescriptor) -> crate::Result<Post> {
    let author_id = viewer.user_id.clone();
    store::INSTANCE
        .update(move |data| {
            let title = descriptor.title.as_deref().and_then(normalize);
            let text = descriptor.text.as_deref().and_then(normalize);
            let tags = normalize_tags(&descriptor.tags);
            ensure_clean(
                title.as_deref(),
                text.as_deref(),
                &tags,
                &data.sensitive_words,
            )?;

            let now = Utc::now();
            let post = Post {
                id: nanoid!(),
                author_id,
                title,
                text,
                tags,
                visibility: descriptor.visibility,
                media: descriptor.media,
                created_at: now,
                updated_at: now,
            };
            data.posts.push(post.clone());
            Ok(post)
        })
        .await
}

/// Partially edit an own post. The edited content passes the same
/// moderation gate as a fresh publish.
pub async fn edit_post(
    viewer: &Viewer,
    post_id: &str,
    descriptor: EditPostDescriptor,
) -> crate::Result<Post> {
    let viewer_id = viewer.user_id.clone();
    let post_id = post_id.to_string();
    store::INSTANCE
        .update(move |data| {
            let index = data
                .posts
                .iter()
                .position(|p| p.id == post_id)
                .ok_or_else(|| Error::PostNotFound(post_id.clone()))?;
            if data.posts[index].author_id != viewer_id {
                return Err(Error::PermissionDenied);
            }

            let next_title = match descriptor.title.as_deref() {
                Some(value) => normalize(value),
                None => data.posts[index].title.clone(),
            };
            let next_text = match descriptor.text.as_deref() {
                Some(value) => normalize(value),
                None => data.posts[index].text.clone(),
            };
            let next_tags = match &descriptor.tags {
                Some(tags) => normalize_tags(tags),
                None => data.posts[index].tags.clone(),
            };
            ensure_clean(
                next_title.as_deref(),
                next_text.as_deref(),
                &next_tags,
                &data.sensitive_words,
            )?;

            let post = &mut data.posts[index];
            if descriptor.title.is_some() {
                post.title = next_title;
            }
            if descriptor.text.is_some() {
                post.text = next_text;
            }
            if descriptor.tags.is_some() {
                post.tags = next_tags;
            }
            if let Some(visibility) = descriptor.visibility {
                post.visibility = visibility;
            }
            if let Some(media) = descriptor.media {
                post.media = media;
            }
            post.updated_at = Utc::now();
            Ok(post.clone())
        })
        .await
}

/// Delete an own post together with its comments and ratings, in one
/// atomic store update so no orphan ever becomes visible.
pub async fn delete_post(viewer: &Viewer, post_id: &str) -> crate::Result<()> {
    let viewer_id = viewer.user_id.clone();
    let post_id = post_id.to_string();
    store::INSTANCE
        .update(move |data| {
            let post = data
                .post(&post_id)
                .ok_or_else(|| Error::PostNotFound(post_id.clone()))?;
            if post.author_id != viewer_id {
                return Err(Error::PermissionDenied);
            }
            data.posts.retain(|p| p.id != post_id);
            data.comments.retain(|c| c.post_id != post_id);
            data.ratings.retain(|r| r.post_id != post_id);
            Ok(())
        })
        .await
}

/// Read a single post, visibility-gated.
pub async fn get_post(viewer: &Viewer, post_id: &str) -> crate::Result<PostView> {
    let data = store::INSTANCE.read().await;
    let post = data
        .post(post_id)
        .ok_or_else(|| Error::PostNotFound(post_id.to_string()))?;
    let friends = friend::friend_ids_of(&data, &viewer.user_id);
    if !can_view(post, viewer, &friends) {
        return Err(Error::PermissionDenied);
    }
    let summaries = rating::summary_map(&data, &[post.id.clone()]);
    Ok(PostView {
        rating_summary: summaries.get(&post.id).cloned(),
        post: post.clone(),
    })
}

fn day_start(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

/// List posts visible to the viewer, newest first, with rating
/// summaries attached.
pub async fn list_posts(viewer: &Viewer, query: PostQuery) -> PostPage {
    let data = store::INSTANCE.read().await;
    let friends = friend::friend_ids_of(&data, &viewer.user_id);

    let mut posts: Vec<&Post> = data
        .posts
        .iter()
        .filter(|p| {
            if query.only_mine {
                return p.author_id == viewer.user_id;
            }
            if !can_view(p, viewer, &friends) {
                return false;
            }
            if query.only_friends_feed {
                return p.author_id == viewer.user_id || friends.contains(&p.author_id);
            }
            true
        })
        .collect();

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        posts.retain(|p| {
            p.title.as_deref().map_or(false, |t| t.contains(q))
                || p.text.as_deref().map_or(false, |t| t.contains(q))
                || p.tags.iter().any(|t| t.contains(q))
        });
    }
    if let Some(tag) = query.tag.as_deref().filter(|t| !t.is_empty()) {
        posts.retain(|p| p.tags.iter().any(|t| t == tag));
    }
    if let Some(from) = query.date_from {
        let from = day_start(from);
        posts.retain(|p| p.created_at >= from);
    }
    if let Some(to) = query.date_to {
        let end = day_start(to) + Duration::days(1);
        posts.retain(|p| p.created_at < end);
    }

    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let total = posts.len();

    let page = query.page.max(1);
    let page_size = if query.page_size == 0 {
        10
    } else {
        query.page_size
    };
    let items: Vec<Post> = posts
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();

    let ids: Vec<String> = items.iter().map(|p| p.id.clone()).collect();
    let summaries = rating::summary_map(&data, &ids);
    PostPage {
        items: items
            .into_iter()
            .map(|post| PostView {
                rating_summary: summaries.get(&post.id).cloned(),
                post,
            })
            .collect(),
        total,
    }
}

/// Tag usage counts across all posts, most used first.
pub async fn tag_counts() -> Vec<TagCount> {
    let data = store::INSTANCE.read().await;
    tag_counts_in(&data)
}

pub(crate) fn tag_counts_in(data: &Snapshot) -> Vec<TagCount> {
    let mut map: HashMap<&str, usize> = HashMap::new();
    for post in &data.posts {
        for tag in &post.tags {
            *map.entry(tag.as_str()).or_default() += 1;
        }
    }
    let mut items: Vec<TagCount> = map
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    items
}

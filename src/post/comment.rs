//! Comments under posts. Reads are gated by the owning post's
//! visibility; deletion is a soft flag by the comment's author.

use chrono::Utc;
use nanoid::nanoid;
use showcase_shared::post::{Comment, CommentPage};

use crate::{friend, post, store, Error, Viewer};

/// Add a comment to a post the viewer can see.
pub async fn add_comment(
    viewer: &Viewer,
    post_id: &str,
    content: &str,
    parent_id: Option<String>,
) -> crate::Result<Comment> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::EmptyComment);
    }

    let viewer = viewer.clone();
    let post_id = post_id.to_string();
    let content = content.to_string();
    store::INSTANCE
        .update(move |data| {
            let target = data
                .post(&post_id)
                .ok_or_else(|| Error::PostNotFound(post_id.clone()))?;
            let friends = friend::friend_ids_of(data, &viewer.user_id);
            if !post::can_view(target, &viewer, &friends) {
                return Err(Error::PermissionDenied);
            }

            let comment = Comment {
                id: nanoid!(),
                post_id,
                author_id: viewer.user_id,
                content,
                parent_id,
                created_at: Utc::now(),
                deleted: false,
            };
            data.comments.push(comment.clone());
            Ok(comment)
        })
        .await
}

/// Comments of one post in chronological order, soft-deleted ones
/// hidden. Zero `page`/`page_size` fall back to the first page of 50.
pub async fn list_comments(
    viewer: &Viewer,
    post_id: &str,
    page: usize,
    page_size: usize,
) -> crate::Result<CommentPage> {
    let data = store::INSTANCE.read().await;
    let target = data
        .post(post_id)
        .ok_or_else(|| Error::PostNotFound(post_id.to_string()))?;
    let friends = friend::friend_ids_of(&data, &viewer.user_id);
    if !post::can_view(target, viewer, &friends) {
        return Err(Error::PermissionDenied);
    }

    let mut all: Vec<Comment> = data
        .comments
        .iter()
        .filter(|c| c.post_id == post_id && !c.deleted)
        .cloned()
        .collect();
    all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    let total = all.len();

    let page = page.max(1);
    let page_size = if page_size == 0 { 50 } else { page_size };
    let items = all
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();
    Ok(CommentPage { items, total })
}

/// Soft-delete an own comment.
pub async fn delete_comment(viewer: &Viewer, comment_id: &str) -> crate::Result<()> {
    let viewer_id = viewer.user_id.clone();
    let comment_id = comment_id.to_string();
    store::INSTANCE
        .update(move |data| {
            let comment = data
                .comments
                .iter_mut()
                .find(|c| c.id == comment_id)
                .ok_or_else(|| Error::CommentNotFound(comment_id.clone()))?;
            if comment.author_id != viewer_id {
                return Err(Error::PermissionDenied);
            }
            comment.deleted = true;
            Ok(())
        })
        .await
}

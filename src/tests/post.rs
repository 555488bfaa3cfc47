use super::*;

use crate::post::{self, comment, rating};
use crate::{friend, Error};
use serial_test::serial;
use showcase_shared::post::handle::{CreatePostDescriptor, EditPostDescriptor, PostQuery};
use showcase_shared::post::{Post, Visibility};

async fn publish(viewer: &Viewer, title: &str, visibility: Visibility) -> Post {
    post::create_post(
        viewer,
        CreatePostDescriptor {
            title: Some(title.to_string()),
            text: Some(format!("{title} 的正文内容")),
            tags: vec!["演示".to_string()],
            visibility,
            media: Vec::new(),
        },
    )
    .await
    .unwrap()
}

#[serial]
#[tokio::test]
async fn private_posts_are_author_only_except_elevated_roles() {
    reset_all().await;
    let author = user_viewer("author").await;
    let stranger = user_viewer("stranger").await;
    let admin = viewer_with_role("admin", Role::Admin).await;
    let super_user = viewer_with_role("super", Role::SuperUser).await;

    let post = publish(&author, "私密内容", Visibility::Private).await;

    assert!(matches!(
        post::get_post(&stranger, &post.id).await,
        Err(Error::PermissionDenied)
    ));
    assert_eq!(post::get_post(&author, &post.id).await.unwrap().post.id, post.id);
    assert!(post::get_post(&admin, &post.id).await.is_ok());
    assert!(post::get_post(&super_user, &post.id).await.is_ok());
}

#[serial]
#[tokio::test]
async fn friends_visibility_follows_the_graph() {
    reset_all().await;
    let author = user_viewer("author").await;
    let other = user_viewer("other").await;

    let post = publish(&author, "好友可见", Visibility::Friends).await;
    assert!(matches!(
        post::get_post(&other, &post.id).await,
        Err(Error::PermissionDenied)
    ));

    let request = friend::send_request(&author, &other.user_id).await.unwrap();
    friend::accept_request(&other, &request.id).await.unwrap();

    assert!(post::get_post(&other, &post.id).await.is_ok());
    assert!(post::get_post(&author, &post.id).await.is_ok());
}

#[serial]
#[tokio::test]
async fn feed_applies_visibility_and_filters() {
    reset_all().await;
    let author = user_viewer("author").await;
    let reader = user_viewer("reader").await;

    publish(&author, "旅行记录", Visibility::Public).await;
    publish(&author, "美食记录", Visibility::Public).await;
    publish(&author, "只给自己", Visibility::Private).await;

    let page = post::list_posts(&reader, PostQuery::default()).await;
    assert_eq!(page.total, 2);

    let page = post::list_posts(&author, PostQuery::default()).await;
    assert_eq!(page.total, 3);

    let page = post::list_posts(
        &reader,
        PostQuery {
            q: Some("旅行".to_string()),
            ..PostQuery::default()
        },
    )
    .await;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].post.title.as_deref(), Some("旅行记录"));

    let page = post::list_posts(
        &reader,
        PostQuery {
            tag: Some("演示".to_string()),
            page_size: 1,
            ..PostQuery::default()
        },
    )
    .await;
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);

    let page = post::list_posts(
        &reader,
        PostQuery {
            only_mine: true,
            ..PostQuery::default()
        },
    )
    .await;
    assert_eq!(page.total, 0);
}

#[serial]
#[tokio::test]
async fn friends_feed_is_limited_to_the_graph() {
    reset_all().await;
    let friend_author = user_viewer("friend").await;
    let outsider = user_viewer("outsider").await;
    let reader = user_viewer("reader").await;

    let request = friend::send_request(&friend_author, &reader.user_id)
        .await
        .unwrap();
    friend::accept_request(&reader, &request.id).await.unwrap();

    publish(&friend_author, "朋友动态", Visibility::Public).await;
    publish(&outsider, "路人动态", Visibility::Public).await;
    publish(&reader, "自己动态", Visibility::Public).await;

    let page = post::list_posts(
        &reader,
        PostQuery {
            only_friends_feed: true,
            ..PostQuery::default()
        },
    )
    .await;
    let titles: Vec<_> = page
        .items
        .iter()
        .map(|p| p.post.title.clone().unwrap())
        .collect();
    assert_eq!(page.total, 2);
    assert!(titles.contains(&"朋友动态".to_string()));
    assert!(titles.contains(&"自己动态".to_string()));
}

#[serial]
#[tokio::test]
async fn publishing_is_gated_by_the_word_list() {
    reset_all().await;
    let author = user_viewer("author").await;

    let result = post::create_post(
        &author,
        CreatePostDescriptor {
            title: Some("这个标题出现了赌博".to_string()),
            text: None,
            tags: Vec::new(),
            visibility: Visibility::Public,
            media: Vec::new(),
        },
    )
    .await;
    match result {
        Err(Error::SensitiveContent(hits)) => assert_eq!(hits, vec!["赌博".to_string()]),
        other => panic!("expected a sensitive-content rejection, got {other:?}"),
    }
}

#[serial]
#[tokio::test]
async fn edits_are_partial_and_author_only() {
    reset_all().await;
    let author = user_viewer("author").await;
    let stranger = user_viewer("stranger").await;

    let post = publish(&author, "原始标题", Visibility::Public).await;

    assert!(matches!(
        post::edit_post(&stranger, &post.id, EditPostDescriptor::default()).await,
        Err(Error::PermissionDenied)
    ));

    let edited = post::edit_post(
        &author,
        &post.id,
        EditPostDescriptor {
            text: Some("只换正文".to_string()),
            ..EditPostDescriptor::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(edited.title.as_deref(), Some("原始标题"));
    assert_eq!(edited.text.as_deref(), Some("只换正文"));

    // edits pass the same moderation gate as a fresh publish
    assert!(matches!(
        post::edit_post(
            &author,
            &post.id,
            EditPostDescriptor {
                text: Some("加一点赌博内容".to_string()),
                ..EditPostDescriptor::default()
            },
        )
        .await,
        Err(Error::SensitiveContent(_))
    ));

    // a present empty field clears it
    let cleared = post::edit_post(
        &author,
        &post.id,
        EditPostDescriptor {
            title: Some("  ".to_string()),
            ..EditPostDescriptor::default()
        },
    )
    .await
    .unwrap();
    assert!(cleared.title.is_none());
}

#[serial]
#[tokio::test]
async fn deleting_a_post_cascades_to_comments_and_ratings() {
    reset_all().await;
    let author = user_viewer("author").await;
    let reader = user_viewer("reader").await;

    let post = publish(&author, "会被删除", Visibility::Public).await;
    let keeper = publish(&author, "留下来", Visibility::Public).await;

    comment::add_comment(&reader, &post.id, "评论一条", None)
        .await
        .unwrap();
    comment::add_comment(&reader, &keeper.id, "别的评论", None)
        .await
        .unwrap();
    rating::rate_post(&reader, &post.id, 5).await.unwrap();
    rating::rate_post(&reader, &keeper.id, 3).await.unwrap();

    assert!(matches!(
        post::delete_post(&reader, &post.id).await,
        Err(Error::PermissionDenied)
    ));
    post::delete_post(&author, &post.id).await.unwrap();

    let data = store::INSTANCE.read().await;
    assert!(data.post(&post.id).is_none());
    assert!(!data.comments.iter().any(|c| c.post_id == post.id));
    assert!(!data.ratings.iter().any(|r| r.post_id == post.id));
    // the unrelated post keeps its attachments
    assert!(data.comments.iter().any(|c| c.post_id == keeper.id));
    assert!(data.ratings.iter().any(|r| r.post_id == keeper.id));
}

#[serial]
#[tokio::test]
async fn comments_follow_post_visibility_and_soft_delete() {
    reset_all().await;
    let author = user_viewer("author").await;
    let stranger = user_viewer("stranger").await;

    let post = publish(&author, "私密讨论", Visibility::Private).await;

    assert!(matches!(
        comment::add_comment(&stranger, &post.id, "看不到吧", None).await,
        Err(Error::PermissionDenied)
    ));
    assert!(matches!(
        comment::add_comment(&author, &post.id, "   ", None).await,
        Err(Error::EmptyComment)
    ));

    let first = comment::add_comment(&author, &post.id, "第一条", None)
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let second = comment::add_comment(&author, &post.id, "第二条", Some(first.id.clone()))
        .await
        .unwrap();

    let page = comment::list_comments(&author, &post.id, 0, 0).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items[0].id, first.id);
    assert_eq!(page.items[1].parent_id.as_deref(), Some(first.id.as_str()));

    assert!(matches!(
        comment::delete_comment(&stranger, &second.id).await,
        Err(Error::PermissionDenied)
    ));
    comment::delete_comment(&author, &second.id).await.unwrap();

    let page = comment::list_comments(&author, &post.id, 0, 0).await.unwrap();
    assert_eq!(page.total, 1);
    // the record itself survives as a soft-deleted row
    let data = store::INSTANCE.read().await;
    assert!(data.comments.iter().any(|c| c.id == second.id && c.deleted));
}

#[serial]
#[tokio::test]
async fn rating_is_an_upsert_per_user() {
    reset_all().await;
    let author = user_viewer("author").await;
    let reader = user_viewer("reader").await;

    let post = publish(&author, "打分对象", Visibility::Public).await;

    assert!(matches!(
        rating::rate_post(&reader, &post.id, 0).await,
        Err(Error::ScoreOutOfRange(0))
    ));
    assert!(matches!(
        rating::rate_post(&reader, &post.id, 6).await,
        Err(Error::ScoreOutOfRange(6))
    ));

    rating::rate_post(&reader, &post.id, 4).await.unwrap();
    let replaced = rating::rate_post(&reader, &post.id, 5).await.unwrap();
    assert_eq!(replaced.score, 5);

    {
        let data = store::INSTANCE.read().await;
        assert_eq!(
            data.ratings.iter().filter(|r| r.post_id == post.id).count(),
            1
        );
    }

    rating::rate_post(&author, &post.id, 3).await.unwrap();

    let mine = rating::my_rating(&reader, &post.id).await.unwrap();
    assert_eq!(mine.score, 5);

    let breakdown = rating::summary(&reader, &post.id).await.unwrap();
    assert_eq!(breakdown.total_count, 2);
    assert!((breakdown.avg - 4.0).abs() < f64::EPSILON);
    assert_eq!(breakdown.dist.get(&5), Some(&1));
    assert_eq!(breakdown.dist.get(&3), Some(&1));

    let view = post::get_post(&reader, &post.id).await.unwrap();
    let summary = view.rating_summary.unwrap();
    assert_eq!(summary.total_count, 2);
}

#[serial]
#[tokio::test]
async fn tag_counts_rank_by_usage() {
    reset_all().await;
    let author = user_viewer("author").await;

    for title in ["一", "二"] {
        post::create_post(
            &author,
            CreatePostDescriptor {
                title: Some(title.to_string()),
                text: None,
                tags: vec!["旅行".to_string(), "美食".to_string()],
                visibility: Visibility::Public,
                media: Vec::new(),
            },
        )
        .await
        .unwrap();
    }
    post::create_post(
        &author,
        CreatePostDescriptor {
            title: Some("三".to_string()),
            text: None,
            tags: vec!["旅行".to_string()],
            visibility: Visibility::Public,
            media: Vec::new(),
        },
    )
    .await
    .unwrap();

    let counts = post::tag_counts().await;
    assert_eq!(counts[0].tag, "旅行");
    assert_eq!(counts[0].count, 3);
    assert_eq!(counts[1].tag, "美食");
    assert_eq!(counts[1].count, 2);
}

//! Per-post ratings: one score per user, replaced on re-rate.

use chrono::Utc;
use serde::Serialize;
use showcase_shared::post::{Rating, RatingSummary};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::store::{self, Snapshot};
use crate::{friend, post, Error, Viewer};

fn rating_id(post_id: &str, user_id: &str) -> String {
    format!("{post_id}_{user_id}")
}

/// Aggregate ratings for the given posts in one pass over the
/// collection.
pub(crate) fn summary_map(data: &Snapshot, post_ids: &[String]) -> HashMap<String, RatingSummary> {
    let wanted: HashSet<&str> = post_ids.iter().map(String::as_str).collect();
    let mut acc: HashMap<&str, (u32, usize)> = HashMap::new();
    for rating in &data.ratings {
        if !wanted.contains(rating.post_id.as_str()) {
            continue;
        }
        let entry = acc.entry(rating.post_id.as_str()).or_default();
        entry.0 += rating.score as u32;
        entry.1 += 1;
    }
    post_ids
        .iter()
        .map(|id| {
            let (sum, count) = acc.get(id.as_str()).copied().unwrap_or((0, 0));
            let avg = if count == 0 {
                0.0
            } else {
                sum as f64 / count as f64
            };
            (
                id.clone(),
                RatingSummary {
                    avg,
                    total_count: count,
                },
            )
        })
        .collect()
}

/// Full per-post breakdown, including the score distribution.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingBreakdown {
    pub avg: f64,
    pub total_count: usize,
    pub dist: BTreeMap<u8, usize>,
}

/// Set or replace the viewer's score for a post they can see.
pub async fn rate_post(viewer: &Viewer, post_id: &str, score: u8) -> crate::Result<Rating> {
    if !(1..=5).contains(&score) {
        return Err(Error::ScoreOutOfRange(score));
    }

    let viewer = viewer.clone();
    let post_id = post_id.to_string();
    store::INSTANCE
        .update(move |data| {
            let target = data
                .post(&post_id)
                .ok_or_else(|| Error::PostNotFound(post_id.clone()))?;
            let friends = friend::friend_ids_of(data, &viewer.user_id);
            if !post::can_view(target, &viewer, &friends) {
                return Err(Error::PermissionDenied);
            }

            let id = rating_id(&post_id, &viewer.user_id);
            let now = Utc::now();
            let record = match data.ratings.iter().find(|r| r.id == id) {
                Some(existing) => Rating {
                    score,
                    updated_at: now,
                    ..existing.clone()
                },
                None => Rating {
                    id: id.clone(),
                    post_id,
                    user_id: viewer.user_id,
                    score,
                    created_at: now,
                    updated_at: now,
                },
            };
            data.ratings.retain(|r| r.id != id);
            data.ratings.push(record.clone());
            Ok(record)
        })
        .await
}

/// The viewer's own rating of a post, if any.
pub async fn my_rating(viewer: &Viewer, post_id: &str) -> Option<Rating> {
    let id = rating_id(post_id, &viewer.user_id);
    store::INSTANCE
        .read()
        .await
        .ratings
        .iter()
        .find(|r| r.id == id)
        .cloned()
}

/// Aggregated breakdown for one post, visibility-gated like any other
/// read of it.
pub async fn summary(viewer: &Viewer, post_id: &str) -> crate::Result<RatingBreakdown> {
    let data = store::INSTANCE.read().await;
    let target = data
        .post(post_id)
        .ok_or_else(|| Error::PostNotFound(post_id.to_string()))?;
    let friends = friend::friend_ids_of(&data, &viewer.user_id);
    if !post::can_view(target, viewer, &friends) {
        return Err(Error::PermissionDenied);
    }

    let all: Vec<&Rating> = data.ratings.iter().filter(|r| r.post_id == post_id).collect();
    let total_count = all.len();
    let avg = if total_count == 0 {
        0.0
    } else {
        all.iter().map(|r| r.score as f64).sum::<f64>() / total_count as f64
    };
    let mut dist = BTreeMap::new();
    for rating in &all {
        *dist.entry(rating.score).or_default() += 1;
    }
    Ok(RatingBreakdown {
        avg,
        total_count,
        dist,
    })
}

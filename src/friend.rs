//! The friendship graph and the friend-request lifecycle.
//!
//! Friendships are undirected edges identified by the canonical pair key
//! of the two user ids. An edge is only ever created by accepting a
//! pending request; either side may remove it again by the same key.

use chrono::Utc;
use nanoid::nanoid;
use showcase_shared::account::User;
use showcase_shared::friend::{FriendRequest, FriendRequestStatus, Friendship};
use std::collections::HashSet;

use crate::store::{self, Snapshot};
use crate::{account, Error, Viewer};

/// Order-independent identity of an unordered user pair.
///
/// `pair_key(a, b) == pair_key(b, a)` for all ids, and distinct pairs
/// map to distinct keys as long as ids themselves are unique.
pub fn pair_key(a: &str, b: &str) -> String {
    let mut pair = [a, b];
    pair.sort_unstable();
    pair.join("_")
}

/// Ids paired with `user_id` on either side of the friendship edges.
///
/// Pure over the given snapshot; compute once per request and reuse the
/// set across a whole candidate list.
pub fn friend_ids_of(data: &Snapshot, user_id: &str) -> HashSet<String> {
    let mut set = HashSet::new();
    for edge in &data.friendships {
        if edge.user_a == user_id {
            set.insert(edge.user_b.clone());
        }
        if edge.user_b == user_id {
            set.insert(edge.user_a.clone());
        }
    }
    set
}

/// Send a friend request to another user.
///
/// Rejected when the pair is already friends or a pending request
/// already exists between them in either direction.
pub async fn send_request(viewer: &Viewer, to_user_id: &str) -> crate::Result<FriendRequest> {
    if to_user_id == viewer.user_id {
        return Err(Error::SelfFriendRequest);
    }

    let from = viewer.user_id.clone();
    let to = to_user_id.to_string();
    store::INSTANCE
        .update(move |data| {
            if data.user(&to).is_none() {
                return Err(Error::UserNotFound(to.clone()));
            }
            let key = pair_key(&from, &to);
            if data.friendships.iter().any(|f| f.id == key) {
                return Err(Error::AlreadyFriends);
            }
            if data.friend_requests.iter().any(|r| {
                r.status == FriendRequestStatus::Pending
                    && ((r.from_user_id == from && r.to_user_id == to)
                        || (r.from_user_id == to && r.to_user_id == from))
            }) {
                return Err(Error::PendingRequestExists);
            }

            let now = Utc::now();
            let request = FriendRequest {
                id: nanoid!(),
                from_user_id: from,
                to_user_id: to,
                status: FriendRequestStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            data.friend_requests.push(request.clone());
            Ok(request)
        })
        .await
}

/// Requests addressed to the viewer, newest first. Resolved requests
/// are included as history.
pub async fn incoming_requests(viewer: &Viewer) -> Vec<FriendRequest> {
    let data = store::INSTANCE.read().await;
    let mut items: Vec<FriendRequest> = data
        .friend_requests
        .iter()
        .filter(|r| r.to_user_id == viewer.user_id)
        .cloned()
        .collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items
}

/// Accept a pending request addressed to the viewer, creating exactly
/// one friendship edge keyed by the canonical pair key.
pub async fn accept_request(viewer: &Viewer, request_id: &str) -> crate::Result<()> {
    let viewer_id = viewer.user_id.clone();
    let request_id = request_id.to_string();
    store::INSTANCE
        .update(move |data| {
            let (from, to) = {
                let request = data
                    .friend_requests
                    .iter_mut()
                    .find(|r| r.id == request_id)
                    .ok_or_else(|| Error::FriendRequestNotFound(request_id.clone()))?;
                if request.to_user_id != viewer_id {
                    return Err(Error::PermissionDenied);
                }
                if request.status != FriendRequestStatus::Pending {
                    return Err(Error::RequestAlreadyResolved);
                }
                request.status = FriendRequestStatus::Accepted;
                request.updated_at = Utc::now();
                (request.from_user_id.clone(), request.to_user_id.clone())
            };

            let key = pair_key(&from, &to);
            data.friendships.retain(|f| f.id != key);
            data.friendships.push(Friendship {
                id: key,
                user_a: from,
                user_b: to,
                created_at: Utc::now(),
            });
            Ok(())
        })
        .await
}

/// Reject a pending request addressed to the viewer. No edge is
/// created; the request is kept with its terminal status.
pub async fn reject_request(viewer: &Viewer, request_id: &str) -> crate::Result<()> {
    let viewer_id = viewer.user_id.clone();
    let request_id = request_id.to_string();
    store::INSTANCE
        .update(move |data| {
            let request = data
                .friend_requests
                .iter_mut()
                .find(|r| r.id == request_id)
                .ok_or_else(|| Error::FriendRequestNotFound(request_id.clone()))?;
            if request.to_user_id != viewer_id {
                return Err(Error::PermissionDenied);
            }
            if request.status != FriendRequestStatus::Pending {
                return Err(Error::RequestAlreadyResolved);
            }
            request.status = FriendRequestStatus::Rejected;
            request.updated_at = Utc::now();
            Ok(())
        })
        .await
}

/// The viewer's confirmed friends as sanitized user records.
pub async fn list_friends(viewer: &Viewer) -> Vec<User> {
    let data = store::INSTANCE.read().await;
    let set = friend_ids_of(&data, &viewer.user_id);
    data.users
        .iter()
        .filter(|u| !u.deleted && set.contains(&u.id))
        .map(account::sanitize)
        .collect()
}

/// Remove the friendship with `other_id`, for both sides. Removing an
/// edge that does not exist is a no-op.
pub async fn remove_friend(viewer: &Viewer, other_id: &str) -> crate::Result<()> {
    let key = pair_key(&viewer.user_id, other_id);
    store::INSTANCE
        .update(move |data| {
            data.friendships.retain(|f| f.id != key);
            Ok(())
        })
        .await
}

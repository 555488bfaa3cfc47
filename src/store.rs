//! The JSON-file document store.
//!
//! One [`Snapshot`] holds the whole object graph; every mutation goes
//! through [`Store::update`], which serializes writers behind a single
//! lock and persists the full snapshot on success. Interleaved writers
//! therefore never drop each other's changes to unrelated collections,
//! and readers always observe a consistent snapshot.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use showcase_shared::account::{SmsCode, TokenRecord, User};
use showcase_shared::friend::{FriendRequest, Friendship};
use showcase_shared::post::{Comment, Post, Rating};
use showcase_shared::resource::FileRecord;
use showcase_shared::task::{AiTask, VideoJob};
use tokio::sync::{RwLock, RwLockReadGuard};

/// The static store instance.
pub static INSTANCE: Lazy<Store> = Lazy::new(Store::new);

/// Moderation word list applied when the store has none.
pub const DEFAULT_SENSITIVE_WORDS: [&str; 6] = ["傻逼", "妈的", "法轮功", "色情", "赌博", "毒品"];

/// The whole persisted object graph.
///
/// Every collection defaults to empty so loading an older or empty store
/// file is the idempotent initialization step; missing collections simply
/// appear empty.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub sms_codes: Vec<SmsCode>,
    pub tokens: Vec<TokenRecord>,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub ratings: Vec<Rating>,
    pub friend_requests: Vec<FriendRequest>,
    pub friendships: Vec<Friendship>,
    pub files: Vec<FileRecord>,
    pub video_jobs: Vec<VideoJob>,
    pub ai_tasks: Vec<AiTask>,
    pub sensitive_words: Vec<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            sms_codes: Vec::new(),
            tokens: Vec::new(),
            posts: Vec::new(),
            comments: Vec::new(),
            ratings: Vec::new(),
            friend_requests: Vec::new(),
            friendships: Vec::new(),
            files: Vec::new(),
            video_jobs: Vec::new(),
            ai_tasks: Vec::new(),
            sensitive_words: DEFAULT_SENSITIVE_WORDS
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }
}

impl Snapshot {
    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id)
    }

    pub fn post_mut(&mut self, id: &str) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == id)
    }

    /// Look up a non-deleted user by id.
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id && !u.deleted)
    }

    /// Look up a non-deleted user by phone number.
    pub fn user_by_phone(&self, phone: &str) -> Option<&User> {
        self.users.iter().find(|u| u.phone == phone && !u.deleted)
    }
}

pub struct Store {
    #[cfg(not(test))]
    path: std::path::PathBuf,
    inner: RwLock<Snapshot>,
}

impl Store {
    fn new() -> Self {
        #[cfg(not(test))]
        {
            let dir = std::path::PathBuf::from(&crate::config::INSTANCE.store.data_dir);
            std::fs::create_dir_all(&dir).expect("store data dir could not be created");
            let path = dir.join("db.json");
            let snapshot = match std::fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str(&raw) {
                    Ok(snapshot) => snapshot,
                    Err(err) => {
                        tracing::error!("store file unreadable, starting from defaults: {err}");
                        Snapshot::default()
                    }
                },
                Err(_) => Snapshot::default(),
            };
            return Self {
                path,
                inner: RwLock::new(snapshot),
            };
        }

        #[cfg(test)]
        Self {
            inner: RwLock::new(Snapshot::default()),
        }
    }

    /// A consistent read-only view of the current snapshot.
    pub async fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.inner.read().await
    }

    /// Apply a mutation and persist the whole snapshot.
    ///
    /// The mutation runs against a draft that is committed only when both
    /// the closure and the disk write succeed, so a failed operation
    /// leaves neither memory nor disk half-changed.
    pub async fn update<F, R>(&self, f: F) -> crate::Result<R>
    where
        F: FnOnce(&mut Snapshot) -> crate::Result<R>,
    {
        let mut guard = self.inner.write().await;
        let mut draft = guard.clone();
        let value = f(&mut draft)?;
        self.persist(&draft)?;
        *guard = draft;
        Ok(value)
    }

    #[cfg(not(test))]
    fn persist(&self, snapshot: &Snapshot) -> crate::Result<()> {
        std::fs::write(&self.path, serde_json::to_string_pretty(snapshot)?)?;
        Ok(())
    }

    #[cfg(test)]
    fn persist(&self, _snapshot: &Snapshot) -> crate::Result<()> {
        Ok(())
    }

    #[cfg(test)]
    pub async fn reset(&self) {
        *self.inner.write().await = Snapshot::default();
    }
}

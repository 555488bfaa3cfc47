pub mod config;

pub mod account;
pub mod admin;
pub mod friend;
pub mod moderation;
pub mod post;
pub mod seed;
pub mod store;
pub mod task;
pub mod video;

/// The module for unit testing, will only be availabled in dev env.
#[cfg(test)]
mod tests;

use showcase_shared::account::Role;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("task actions must not be empty")]
    EmptyActions,
    #[error("file id must not be empty")]
    EmptyFileId,
    #[error("comment content must not be empty")]
    EmptyComment,
    #[error("rating score {0} out of range 1..=5")]
    ScoreOutOfRange(u8),

    #[error("task \"{0}\" not found")]
    TaskNotFound(String),
    #[error("video job \"{0}\" not found")]
    JobNotFound(String),
    #[error("post \"{0}\" not found")]
    PostNotFound(String),
    #[error("user \"{0}\" not found")]
    UserNotFound(String),
    #[error("comment \"{0}\" not found")]
    CommentNotFound(String),
    #[error("friend request \"{0}\" not found")]
    FriendRequestNotFound(String),

    #[error("not logged in")]
    NotLoggedIn,
    #[error("permission denied")]
    PermissionDenied,

    #[error("phone number already registered")]
    PhoneRegistered,
    #[error("verification code not issued for this phone")]
    SmsCodeNotIssued,
    #[error("verification code not match")]
    SmsCodeIncorrect,
    #[error("account has no password, use code login instead")]
    PasswordNotSet,
    #[error("username or password incorrect")]
    UsernameOrPasswordIncorrect,
    #[error("admin account not initialized")]
    AdminNotInitialized,

    #[error("cannot send a friend request to yourself")]
    SelfFriendRequest,
    #[error("already friends")]
    AlreadyFriends,
    #[error("a pending friend request already exists")]
    PendingRequestExists,
    #[error("friend request already resolved")]
    RequestAlreadyResolved,
    #[error("sensitive words matched: {}", .0.join(", "))]
    SensitiveContent(Vec<String>),

    #[error("text generation request failed: {0}")]
    Http(reqwest::Error),
    #[error("text generation service errored: {0}")]
    TextGeneration(String),

    #[error("store io errored: {0}")]
    Io(std::io::Error),
    #[error("store serialization errored: {0}")]
    Json(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Implements `From<T>` for [`Error`].
macro_rules! impl_from {
    ($($t:ty => $v:ident),* $(,)?) => {
        $(
            impl From<$t> for $crate::Error {
                #[inline]
                fn from(err: $t) -> Self {
                    Self::$v(err)
                }
            }
        )*
    };
}

impl_from! {
    reqwest::Error => Http,
    std::io::Error => Io,
    serde_json::Error => Json,
}

/// The authenticated caller of a service operation.
#[derive(Debug, Clone)]
pub struct Viewer {
    /// The only id of this account.
    pub user_id: String,
    pub role: Role,
}

impl Viewer {
    /// Resolve an access token into a viewer.
    ///
    /// Tokens of soft-deleted users stop resolving immediately.
    pub async fn authenticate(token: &str) -> Result<Self> {
        let data = store::INSTANCE.read().await;
        let record = data
            .tokens
            .iter()
            .find(|t| t.token == token)
            .ok_or(Error::NotLoggedIn)?;
        if data.user(&record.user_id).is_none() {
            return Err(Error::NotLoggedIn);
        }
        Ok(Self {
            user_id: record.user_id.clone(),
            role: record.role,
        })
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

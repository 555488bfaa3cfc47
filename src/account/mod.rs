//! Account registration, login and profile management.
//!
//! Verification codes are demo-grade fixed strings and tokens are opaque
//! random strings kept in the store; both stand in for a real SMS
//! gateway and session backend.

use chrono::Utc;
use nanoid::nanoid;
use rand::{distributions::Alphanumeric, Rng};
use sha256::digest;
use showcase_shared::account::handle::{
    EditProfileDescriptor, PasswordLoginDescriptor, RegisterDescriptor, ResetPasswordDescriptor,
    Session, SmsLoginDescriptor,
};
use showcase_shared::account::{Role, SmsCode, TokenRecord, User};

use crate::store::{self, Snapshot};
use crate::{config, Error, Viewer};

/// The fixed demo verification code issued for ordinary phones.
const DEMO_SMS_CODE: &str = "000000";

/// Strip credentials from a user record before exposing it.
pub fn sanitize(user: &User) -> User {
    User {
        password_sha: None,
        ..user.clone()
    }
}

fn new_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

pub(crate) fn issue_session(data: &mut Snapshot, user: &User) -> Session {
    let token = new_token();
    data.tokens.push(TokenRecord {
        token: token.clone(),
        user_id: user.id.clone(),
        role: user.role,
        created_at: Utc::now(),
    });
    Session {
        token,
        user: sanitize(user),
    }
}

fn verify_code(data: &Snapshot, phone: &str, code: &str) -> crate::Result<()> {
    let record = data
        .sms_codes
        .iter()
        .find(|c| c.phone == phone)
        .ok_or(Error::SmsCodeNotIssued)?;
    if record.code != code {
        return Err(Error::SmsCodeIncorrect);
    }
    Ok(())
}

fn default_nickname(phone: &str) -> String {
    let tail = phone.get(phone.len().saturating_sub(4)..).unwrap_or(phone);
    format!("用户{tail}")
}

/// Issue an SMS verification code for a phone number, replacing any
/// earlier one. The code is returned to the caller instead of being
/// sent anywhere.
pub async fn send_sms_code(phone: &str, scene: &str) -> crate::Result<String> {
    let code = if phone == config::INSTANCE.bootstrap.super_user.phone {
        config::INSTANCE.bootstrap.super_user.sms_code.clone()
    } else {
        DEMO_SMS_CODE.to_string()
    };

    let phone = phone.to_string();
    let scene = scene.to_string();
    let issued = code.clone();
    store::INSTANCE
        .update(move |data| {
            data.sms_codes.retain(|c| c.phone != phone);
            data.sms_codes.push(SmsCode {
                phone,
                code,
                scene,
                created_at: Utc::now(),
            });
            Ok(())
        })
        .await?;
    Ok(issued)
}

/// Register a new account with a verified phone number and log it in.
///
/// The configured super-user phone registers with elevated role; every
/// other phone gets a plain user account.
pub async fn register(descriptor: RegisterDescriptor) -> crate::Result<Session> {
    let super_phone = config::INSTANCE.bootstrap.super_user.phone.clone();
    store::INSTANCE
        .update(move |data| {
            verify_code(data, &descriptor.phone, &descriptor.code)?;
            if data.user_by_phone(&descriptor.phone).is_some() {
                return Err(Error::PhoneRegistered);
            }

            let role = if descriptor.phone == super_phone {
                Role::SuperUser
            } else {
                Role::User
            };
            let nickname = descriptor
                .nickname
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default_nickname(&descriptor.phone));

            let user = User {
                id: nanoid!(),
                phone: descriptor.phone.clone(),
                nickname,
                avatar_url: None,
                bio: None,
                role,
                password_sha: descriptor.password.as_deref().map(digest),
                created_at: Utc::now(),
                deleted: false,
            };
            tracing::info!("registered user {} ({})", user.id, user.phone);
            data.users.push(user.clone());
            Ok(issue_session(data, &user))
        })
        .await
}

/// Log in with a verification code.
pub async fn login_sms(descriptor: SmsLoginDescriptor) -> crate::Result<Session> {
    store::INSTANCE
        .update(move |data| {
            verify_code(data, &descriptor.phone, &descriptor.code)?;
            let user = data
                .user_by_phone(&descriptor.phone)
                .cloned()
                .ok_or_else(|| Error::UserNotFound(descriptor.phone.clone()))?;
            Ok(issue_session(data, &user))
        })
        .await
}

/// Log in with a password. Accounts registered without one must use
/// code login.
pub async fn login_password(descriptor: PasswordLoginDescriptor) -> crate::Result<Session> {
    store::INSTANCE
        .update(move |data| {
            let user = data
                .user_by_phone(&descriptor.phone)
                .cloned()
                .ok_or_else(|| Error::UserNotFound(descriptor.phone.clone()))?;
            let sha = user.password_sha.as_deref().ok_or(Error::PasswordNotSet)?;
            if digest(descriptor.password.as_str()) != sha {
                return Err(Error::UsernameOrPasswordIncorrect);
            }
            Ok(issue_session(data, &user))
        })
        .await
}

/// Replace the password after verifying a fresh SMS code.
pub async fn reset_password(descriptor: ResetPasswordDescriptor) -> crate::Result<()> {
    store::INSTANCE
        .update(move |data| {
            verify_code(data, &descriptor.phone, &descriptor.code)?;
            let phone = descriptor.phone.clone();
            let user = data
                .users
                .iter_mut()
                .find(|u| u.phone == phone && !u.deleted)
                .ok_or(Error::UserNotFound(phone))?;
            user.password_sha = Some(digest(descriptor.new_password.as_str()));
            Ok(())
        })
        .await
}

/// The viewer's own sanitized account.
pub async fn me(viewer: &Viewer) -> crate::Result<User> {
    let data = store::INSTANCE.read().await;
    data.user(&viewer.user_id)
        .map(sanitize)
        .ok_or_else(|| Error::UserNotFound(viewer.user_id.clone()))
}

/// Partial profile update on the viewer's own account.
pub async fn edit_profile(viewer: &Viewer, descriptor: EditProfileDescriptor) -> crate::Result<User> {
    let viewer_id = viewer.user_id.clone();
    store::INSTANCE
        .update(move |data| {
            let user = data
                .users
                .iter_mut()
                .find(|u| u.id == viewer_id && !u.deleted)
                .ok_or(Error::UserNotFound(viewer_id))?;
            if let Some(nickname) = descriptor
                .nickname
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
            {
                user.nickname = nickname.to_string();
            }
            if let Some(avatar_url) = descriptor.avatar_url {
                user.avatar_url = Some(avatar_url);
            }
            if let Some(bio) = descriptor.bio {
                user.bio = Some(bio);
            }
            if let Some(password) = descriptor.password.as_deref() {
                user.password_sha = Some(digest(password));
            }
            Ok(sanitize(user))
        })
        .await
}

/// Search the user directory, excluding the viewer and deleted accounts.
/// Capped at 50 results, newest first.
pub async fn search_users(viewer: &Viewer, q: Option<&str>) -> Vec<User> {
    let q = q.map(str::trim).filter(|q| !q.is_empty());
    let data = store::INSTANCE.read().await;
    let mut users: Vec<&User> = data
        .users
        .iter()
        .filter(|u| !u.deleted && u.id != viewer.user_id)
        .filter(|u| match q {
            Some(q) => u.phone.contains(q) || u.nickname.contains(q) || u.id.contains(q),
            None => true,
        })
        .collect();
    users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    users.into_iter().take(50).map(sanitize).collect()
}

/// A single user's sanitized public record.
pub async fn get_user(user_id: &str) -> crate::Result<User> {
    let data = store::INSTANCE.read().await;
    data.user(user_id)
        .map(sanitize)
        .ok_or_else(|| Error::UserNotFound(user_id.to_string()))
}

use bcrypt::{hash, verify};
use chrono::Utc;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};

use crate::entity::{profile, user};
use crate::error::{map_tx_error, AppError};
use crate::gallery;

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub is_active: bool,
}

#[derive(Default)]
pub struct ProfileUpdate {
    pub location: Option<String>,
    pub website: Option<String>,
    pub bio: Option<String>,
    pub camera: Option<String>,
    pub phone: Option<String>,
}

/// Creates a user and its profile in one transaction.
pub async fn create_user(
    db: &DatabaseConnection,
    new_user: NewUser,
    bcrypt_cost: u32,
) -> Result<(user::Model, profile::Model), AppError> {
    let password_hash = hash(&new_user.password, bcrypt_cost).map_err(AppError::system_exception)?;

    let created = db
        .transaction::<_, (user::Model, profile::Model), AppError>(|txn| {
            Box::pin(async move {
                let user_model = user::ActiveModel {
                    username: Set(new_user.username),
                    password_hash: Set(password_hash),
                    email: Set(new_user.email),
                    is_active: Set(new_user.is_active),
                    date_joined: Set(Utc::now()),
                    last_login: Set(None),
                    ..Default::default()
                };
                let user = match user_model.insert(txn).await {
                    Ok(user) => user,
                    Err(err) => {
                        if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
                            return Err(AppError::fail(USERNAME_TAKEN));
                        }
                        return Err(err.into());
                    }
                };

                let profile = profile::ActiveModel {
                    user_id: Set(user.id),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                Ok((user, profile))
            })
        })
        .await
        .map_err(map_tx_error)?;

    info!("created user {} (active={})", created.0.username, created.0.is_active);
    Ok(created)
}

pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}

pub async fn username_taken<C: ConnectionTrait>(db: &C, username: &str) -> Result<bool, AppError> {
    Ok(find_by_username(db, username).await?.is_some())
}

/// Returns the user when the credentials match an active account.
pub async fn authenticate(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<Option<user::Model>, AppError> {
    let user = match find_by_username(db, username).await? {
        Some(user) => user,
        None => return Ok(None),
    };
    let ok = verify(password, &user.password_hash).map_err(AppError::system_exception)?;
    if !ok || !user.is_active {
        return Ok(None);
    }
    Ok(Some(user))
}

pub async fn record_login(db: &DatabaseConnection, user_id: i32) -> Result<(), AppError> {
    user::ActiveModel {
        id: Set(user_id),
        last_login: Set(Some(Utc::now())),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(())
}

pub async fn set_active(
    db: &DatabaseConnection,
    user: user::Model,
    is_active: bool,
) -> Result<user::Model, AppError> {
    let mut active: user::ActiveModel = user.into();
    active.is_active = Set(is_active);
    Ok(active.update(db).await?)
}

pub async fn profile_for_user<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
) -> Result<profile::Model, AppError> {
    user.find_related(profile::Entity)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)
}

/// Overwrites the descriptive profile fields; blank values are stored as `NULL`.
pub async fn update_profile(
    db: &DatabaseConnection,
    profile: profile::Model,
    update: ProfileUpdate,
) -> Result<profile::Model, AppError> {
    let mut active: profile::ActiveModel = profile.into();
    active.location = Set(non_blank(update.location));
    active.website = Set(non_blank(update.website));
    active.bio = Set(non_blank(update.bio));
    active.camera = Set(non_blank(update.camera));
    active.phone = Set(non_blank(update.phone));
    Ok(active.update(db).await?)
}

/// Removes a user together with its profile, photos and albums.
pub async fn delete_user(db: &DatabaseConnection, user: user::Model) -> Result<(), AppError> {
    if let Some(profile) = user.find_related(profile::Entity).one(db).await? {
        gallery::delete_profile(db, profile).await?;
    }
    user.delete(db).await?;
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

#[cfg(test)]
mod tests {
    use super::non_blank;

    #[test]
    fn non_blank_trims_and_drops_empty_values() {
        assert_eq!(non_blank(Some("  Buffalo ".to_string())), Some("Buffalo".to_string()));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }
}

//! Photos, albums and album membership.
//!
//! Membership lives in `t_album_photo` and never changes who owns a photo:
//! removing a photo from albums keeps the photo, deleting a profile removes
//! everything it owns.

use chrono::Utc;
use log::info;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::entity::{album, album_photo, photo, profile, Published};
use crate::error::AppError;

#[derive(Clone, Debug, Default)]
pub struct NewPhoto {
    pub title: String,
    pub description: Option<String>,
    pub published: Published,
}

impl NewPhoto {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct NewAlbum {
    pub title: String,
    pub description: Option<String>,
    pub published: Published,
}

impl NewAlbum {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

pub async fn create_photo<C: ConnectionTrait>(
    db: &C,
    owner: &profile::Model,
    new_photo: NewPhoto,
) -> Result<photo::Model, AppError> {
    let title = new_photo.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::fail("photo title cannot be empty"));
    }
    let now = Utc::now();
    let photo = photo::ActiveModel {
        profile_id: Set(owner.id),
        title: Set(title),
        description: Set(new_photo.description),
        published: Set(new_photo.published),
        date_uploaded: Set(now),
        date_modified: Set(now),
        date_published: Set(published_at(new_photo.published)),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(photo)
}

pub async fn create_album<C: ConnectionTrait>(
    db: &C,
    owner: &profile::Model,
    new_album: NewAlbum,
) -> Result<album::Model, AppError> {
    let title = new_album.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::fail("album title cannot be empty"));
    }
    let now = Utc::now();
    let album = album::ActiveModel {
        profile_id: Set(owner.id),
        title: Set(title),
        description: Set(new_album.description),
        cover_id: Set(None),
        published: Set(new_album.published),
        date_created: Set(now),
        date_modified: Set(now),
        date_published: Set(published_at(new_album.published)),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(album)
}

/// Puts `photo` into `album`. Returns `false` when it was already a member.
pub async fn add_photo<C: ConnectionTrait>(
    db: &C,
    album: &album::Model,
    photo: &photo::Model,
) -> Result<bool, AppError> {
    let inserted = album_photo::Entity::insert(album_photo::ActiveModel {
        album_id: Set(album.id),
        photo_id: Set(photo.id),
    })
    .on_conflict(
        OnConflict::columns([album_photo::Column::AlbumId, album_photo::Column::PhotoId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;
    Ok(inserted > 0)
}

/// Takes `photo` out of `album`. Returns `false` when it was not a member.
pub async fn remove_photo(
    db: &DatabaseConnection,
    album: &album::Model,
    photo: &photo::Model,
) -> Result<bool, AppError> {
    let txn = db.begin().await?;
    let res = album_photo::Entity::delete_many()
        .filter(album_photo::Column::AlbumId.eq(album.id))
        .filter(album_photo::Column::PhotoId.eq(photo.id))
        .exec(&txn)
        .await?;
    album::Entity::update_many()
        .col_expr(album::Column::CoverId, Expr::value(sea_orm::Value::Int(None)))
        .filter(album::Column::Id.eq(album.id))
        .filter(album::Column::CoverId.eq(photo.id))
        .exec(&txn)
        .await?;
    txn.commit().await?;
    Ok(res.rows_affected > 0)
}

/// Drops every membership of `photo`. The photo itself is kept.
pub async fn remove_photo_from_all_albums(
    db: &DatabaseConnection,
    photo: &photo::Model,
) -> Result<u64, AppError> {
    let txn = db.begin().await?;
    clear_covers(&txn, vec![photo.id]).await?;
    let res = album_photo::Entity::delete_many()
        .filter(album_photo::Column::PhotoId.eq(photo.id))
        .exec(&txn)
        .await?;
    txn.commit().await?;
    Ok(res.rows_affected)
}

pub async fn photos_for_profile<C: ConnectionTrait>(
    db: &C,
    owner: &profile::Model,
) -> Result<Vec<photo::Model>, AppError> {
    Ok(owner
        .find_related(photo::Entity)
        .order_by_asc(photo::Column::Id)
        .all(db)
        .await?)
}

pub async fn count_photos_for_profile<C: ConnectionTrait>(
    db: &C,
    owner: &profile::Model,
) -> Result<u64, AppError> {
    Ok(owner.find_related(photo::Entity).count(db).await?)
}

pub async fn first_photo_for_profile<C: ConnectionTrait>(
    db: &C,
    owner: &profile::Model,
) -> Result<Option<photo::Model>, AppError> {
    Ok(owner
        .find_related(photo::Entity)
        .order_by_asc(photo::Column::Id)
        .one(db)
        .await?)
}

pub async fn albums_for_profile<C: ConnectionTrait>(
    db: &C,
    owner: &profile::Model,
) -> Result<Vec<album::Model>, AppError> {
    Ok(owner
        .find_related(album::Entity)
        .order_by_asc(album::Column::Id)
        .all(db)
        .await?)
}

pub async fn count_albums_for_profile<C: ConnectionTrait>(
    db: &C,
    owner: &profile::Model,
) -> Result<u64, AppError> {
    Ok(owner.find_related(album::Entity).count(db).await?)
}

pub async fn photos_in_album<C: ConnectionTrait>(
    db: &C,
    album: &album::Model,
) -> Result<Vec<photo::Model>, AppError> {
    Ok(album
        .find_related(photo::Entity)
        .order_by_asc(photo::Column::Id)
        .all(db)
        .await?)
}

pub async fn count_photos_in_album<C: ConnectionTrait>(
    db: &C,
    album: &album::Model,
) -> Result<u64, AppError> {
    Ok(album.find_related(photo::Entity).count(db).await?)
}

pub async fn albums_for_photo<C: ConnectionTrait>(
    db: &C,
    photo: &photo::Model,
) -> Result<Vec<album::Model>, AppError> {
    Ok(photo
        .find_related(album::Entity)
        .order_by_asc(album::Column::Id)
        .all(db)
        .await?)
}

pub async fn random_photo<C: ConnectionTrait>(db: &C) -> Result<Option<photo::Model>, AppError> {
    Ok(photo::Entity::find()
        .order_by(Expr::cust("RANDOM()"), Order::Asc)
        .one(db)
        .await?)
}

/// Uses `photo` as the album cover. The photo must already be in the album.
pub async fn set_cover<C: ConnectionTrait>(
    db: &C,
    album: album::Model,
    photo: &photo::Model,
) -> Result<album::Model, AppError> {
    let member = album_photo::Entity::find_by_id((album.id, photo.id))
        .one(db)
        .await?
        .is_some();
    if !member {
        return Err(AppError::fail("cover photo must belong to the album"));
    }
    let mut active: album::ActiveModel = album.into();
    active.cover_id = Set(Some(photo.id));
    active.date_modified = Set(Utc::now());
    Ok(active.update(db).await?)
}

pub async fn delete_photo(db: &DatabaseConnection, photo: photo::Model) -> Result<(), AppError> {
    let txn = db.begin().await?;
    clear_covers(&txn, vec![photo.id]).await?;
    album_photo::Entity::delete_many()
        .filter(album_photo::Column::PhotoId.eq(photo.id))
        .exec(&txn)
        .await?;
    photo.delete(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// Deletes the album and its memberships; the photos stay with their owners.
pub async fn delete_album(db: &DatabaseConnection, album: album::Model) -> Result<(), AppError> {
    let txn = db.begin().await?;
    album_photo::Entity::delete_many()
        .filter(album_photo::Column::AlbumId.eq(album.id))
        .exec(&txn)
        .await?;
    album.delete(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// Deletes a profile with every photo and album it owns.
pub async fn delete_profile(db: &DatabaseConnection, owner: profile::Model) -> Result<(), AppError> {
    let txn = db.begin().await?;

    let photo_ids: Vec<i32> = photo::Entity::find()
        .select_only()
        .column(photo::Column::Id)
        .filter(photo::Column::ProfileId.eq(owner.id))
        .into_tuple()
        .all(&txn)
        .await?;
    let album_ids: Vec<i32> = album::Entity::find()
        .select_only()
        .column(album::Column::Id)
        .filter(album::Column::ProfileId.eq(owner.id))
        .into_tuple()
        .all(&txn)
        .await?;

    clear_covers(&txn, photo_ids.clone()).await?;
    album_photo::Entity::delete_many()
        .filter(
            album_photo::Column::PhotoId
                .is_in(photo_ids.clone())
                .or(album_photo::Column::AlbumId.is_in(album_ids)),
        )
        .exec(&txn)
        .await?;
    album::Entity::delete_many()
        .filter(album::Column::ProfileId.eq(owner.id))
        .exec(&txn)
        .await?;
    photo::Entity::delete_many()
        .filter(photo::Column::ProfileId.eq(owner.id))
        .exec(&txn)
        .await?;
    let profile_id = owner.id;
    owner.delete(&txn).await?;

    txn.commit().await?;
    info!("deleted profile {} with {} photos", profile_id, photo_ids.len());
    Ok(())
}

async fn clear_covers<C: ConnectionTrait>(db: &C, photo_ids: Vec<i32>) -> Result<(), AppError> {
    if photo_ids.is_empty() {
        return Ok(());
    }
    album::Entity::update_many()
        .col_expr(album::Column::CoverId, Expr::value(sea_orm::Value::Int(None)))
        .filter(album::Column::CoverId.is_in(photo_ids))
        .exec(db)
        .await?;
    Ok(())
}

fn published_at(published: Published) -> Option<chrono::DateTime<Utc>> {
    match published {
        Published::Private => None,
        Published::Shared | Published::Public => Some(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_items_have_no_publish_date() {
        assert!(published_at(Published::Private).is_none());
        assert!(published_at(Published::Shared).is_some());
        assert!(published_at(Published::Public).is_some());
    }

    #[test]
    fn new_photo_defaults_to_private() {
        let photo = NewPhoto::titled("Photo0");
        assert_eq!(photo.title, "Photo0");
        assert_eq!(photo.published, Published::Private);
    }
}

mod common;

use imager::accounts::{self, NewUser, USERNAME_TAKEN};
use imager::error::AppError;
use imager::entity::{album, profile, Published};
use imager::gallery::{self, NewAlbum, NewPhoto};

use common::{create_user, setup, TestEnv};

/// Jimbo from Buffalo with one album holding thirty photos.
async fn jimbo_with_album(env: &TestEnv) -> (profile::Model, album::Model) {
    let (_user, profile) = create_user(env, "Jimbo", "p@ssw0rd", true).await;
    let profile = accounts::update_profile(
        env.db(),
        profile,
        accounts::ProfileUpdate {
            location: Some("Buffalo".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let album = gallery::create_album(env.db(), &profile, NewAlbum::titled("The Album"))
        .await
        .unwrap();
    for n in 0..30 {
        let photo = gallery::create_photo(env.db(), &profile, NewPhoto::titled(format!("Photo{}", n)))
            .await
            .unwrap();
        assert!(gallery::add_photo(env.db(), &album, &photo).await.unwrap());
    }
    (profile, album)
}

#[actix_web::test]
async fn user_has_thirty_photos() {
    let env = setup().await;
    let (profile, _album) = jimbo_with_album(&env).await;

    assert_eq!(profile.location.as_deref(), Some("Buffalo"));
    assert_eq!(gallery::count_photos_for_profile(env.db(), &profile).await.unwrap(), 30);
    let first = gallery::first_photo_for_profile(env.db(), &profile).await.unwrap().unwrap();
    assert!(first.title.starts_with("Photo"));
    assert_eq!(first.published, Published::Private);
    assert!(first.date_published.is_none());
}

#[actix_web::test]
async fn album_holds_thirty_photos_and_each_photo_points_back() {
    let env = setup().await;
    let (profile, album) = jimbo_with_album(&env).await;

    let albums = gallery::albums_for_profile(env.db(), &profile).await.unwrap();
    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].title, "The Album");
    assert_eq!(gallery::count_photos_in_album(env.db(), &album).await.unwrap(), 30);

    let photo = gallery::random_photo(env.db()).await.unwrap().unwrap();
    let photo_albums = gallery::albums_for_photo(env.db(), &photo).await.unwrap();
    assert!(photo_albums.iter().any(|a| a.id == album.id));
}

#[actix_web::test]
async fn adding_a_photo_twice_keeps_one_membership() {
    let env = setup().await;
    let (profile, album) = jimbo_with_album(&env).await;

    let photos = gallery::photos_for_profile(env.db(), &profile).await.unwrap();
    assert!(!gallery::add_photo(env.db(), &album, &photos[0]).await.unwrap());
    assert_eq!(gallery::count_photos_in_album(env.db(), &album).await.unwrap(), 30);
}

#[actix_web::test]
async fn membership_does_not_transfer_ownership() {
    let env = setup().await;
    let (jimbo, _album) = jimbo_with_album(&env).await;
    let (_user, other) = create_user(&env, "Other", "p@ssw0rd", true).await;

    let other_album = gallery::create_album(env.db(), &other, NewAlbum::titled("Borrowed"))
        .await
        .unwrap();
    let photo = gallery::first_photo_for_profile(env.db(), &jimbo).await.unwrap().unwrap();
    gallery::add_photo(env.db(), &other_album, &photo).await.unwrap();

    assert_eq!(gallery::albums_for_photo(env.db(), &photo).await.unwrap().len(), 2);
    assert_eq!(gallery::count_photos_for_profile(env.db(), &other).await.unwrap(), 0);
    assert_eq!(gallery::count_photos_for_profile(env.db(), &jimbo).await.unwrap(), 30);
}

#[actix_web::test]
async fn removing_photo_from_all_albums_keeps_the_photo() {
    let env = setup().await;
    let (profile, album) = jimbo_with_album(&env).await;
    let photo = gallery::first_photo_for_profile(env.db(), &profile).await.unwrap().unwrap();
    let album = gallery::set_cover(env.db(), album, &photo).await.unwrap();
    assert_eq!(album.cover_id, Some(photo.id));

    assert_eq!(gallery::remove_photo_from_all_albums(env.db(), &photo).await.unwrap(), 1);
    assert!(gallery::albums_for_photo(env.db(), &photo).await.unwrap().is_empty());
    assert_eq!(gallery::count_photos_for_profile(env.db(), &profile).await.unwrap(), 30);
    assert_eq!(gallery::count_photos_in_album(env.db(), &album).await.unwrap(), 29);

    let albums = gallery::albums_for_profile(env.db(), &profile).await.unwrap();
    assert_eq!(albums[0].cover_id, None);
}

#[actix_web::test]
async fn remove_photo_reports_membership() {
    let env = setup().await;
    let (profile, album) = jimbo_with_album(&env).await;
    let photo = gallery::first_photo_for_profile(env.db(), &profile).await.unwrap().unwrap();

    assert!(gallery::remove_photo(env.db(), &album, &photo).await.unwrap());
    assert!(!gallery::remove_photo(env.db(), &album, &photo).await.unwrap());
}

#[actix_web::test]
async fn cover_must_be_in_the_album() {
    let env = setup().await;
    let (profile, album) = jimbo_with_album(&env).await;
    let loose = gallery::create_photo(env.db(), &profile, NewPhoto::titled("Loose"))
        .await
        .unwrap();

    assert!(gallery::set_cover(env.db(), album, &loose).await.is_err());
}

#[actix_web::test]
async fn deleting_an_album_keeps_its_photos() {
    let env = setup().await;
    let (profile, album) = jimbo_with_album(&env).await;

    gallery::delete_album(env.db(), album).await.unwrap();
    assert!(gallery::albums_for_profile(env.db(), &profile).await.unwrap().is_empty());
    assert_eq!(gallery::count_photos_for_profile(env.db(), &profile).await.unwrap(), 30);
}

#[actix_web::test]
async fn deleting_a_photo_removes_its_memberships() {
    let env = setup().await;
    let (profile, album) = jimbo_with_album(&env).await;
    let photo = gallery::first_photo_for_profile(env.db(), &profile).await.unwrap().unwrap();

    gallery::delete_photo(env.db(), photo).await.unwrap();
    assert_eq!(gallery::count_photos_for_profile(env.db(), &profile).await.unwrap(), 29);
    assert_eq!(gallery::count_photos_in_album(env.db(), &album).await.unwrap(), 29);
}

#[actix_web::test]
async fn deleting_a_profile_cascades_to_its_photos_and_albums() {
    let env = setup().await;
    let (jimbo, _album) = jimbo_with_album(&env).await;
    let (_user, other) = create_user(&env, "Other", "p@ssw0rd", true).await;
    let other_album = gallery::create_album(env.db(), &other, NewAlbum::titled("Borrowed"))
        .await
        .unwrap();
    let photo = gallery::first_photo_for_profile(env.db(), &jimbo).await.unwrap().unwrap();
    gallery::add_photo(env.db(), &other_album, &photo).await.unwrap();
    let other_album = gallery::set_cover(env.db(), other_album, &photo).await.unwrap();

    gallery::delete_profile(env.db(), jimbo).await.unwrap();

    assert!(gallery::random_photo(env.db()).await.unwrap().is_none());
    assert_eq!(gallery::count_photos_in_album(env.db(), &other_album).await.unwrap(), 0);
    let remaining = gallery::albums_for_profile(env.db(), &other).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].cover_id, None);
}

#[actix_web::test]
async fn deleting_a_user_removes_everything_it_owned() {
    let env = setup().await;
    let (profile, _album) = jimbo_with_album(&env).await;
    let user = accounts::find_by_username(env.db(), "Jimbo").await.unwrap().unwrap();
    assert_eq!(profile.user_id, user.id);

    accounts::delete_user(env.db(), user).await.unwrap();
    assert!(accounts::find_by_username(env.db(), "Jimbo").await.unwrap().is_none());
    assert!(gallery::random_photo(env.db()).await.unwrap().is_none());
}

#[actix_web::test]
async fn published_photos_record_when() {
    let env = setup().await;
    let (_user, profile) = create_user(&env, "Jimbo", "p@ssw0rd", true).await;
    let photo = gallery::create_photo(
        env.db(),
        &profile,
        NewPhoto {
            title: "Sunrise".to_string(),
            description: Some("Over the lake".to_string()),
            published: Published::Public,
        },
    )
    .await
    .unwrap();
    assert_eq!(photo.published, Published::Public);
    assert!(photo.date_published.is_some());
    assert!(gallery::create_photo(env.db(), &profile, NewPhoto::titled("  ")).await.is_err());
}

#[actix_web::test]
async fn second_user_with_same_username_is_refused() {
    let env = setup().await;
    create_user(&env, "Jimbo", "p@ssw0rd", true).await;

    let err = accounts::create_user(
        env.db(),
        NewUser {
            username: "Jimbo".to_string(),
            email: "other@example.com".to_string(),
            password: "hunter22".to_string(),
            is_active: false,
        },
        4,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Fail(ref msg) if msg == USERNAME_TAKEN));
}

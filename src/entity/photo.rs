use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Who may see a photo or album.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(8))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Published {
    #[default]
    #[sea_orm(string_value = "PRIVATE")]
    Private,
    #[sea_orm(string_value = "SHARED")]
    Shared,
    #[sea_orm(string_value = "PUBLIC")]
    Public,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "t_photo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub profile_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub published: Published,
    pub date_uploaded: DateTimeUtc,
    pub date_modified: DateTimeUtc,
    pub date_published: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::ProfileId",
        to = "super::profile::Column::Id",
        on_delete = "Cascade"
    )]
    Profile,
    #[sea_orm(has_many = "super::album_photo::Entity")]
    AlbumPhoto,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::album_photo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlbumPhoto.def()
    }
}

impl Related<super::album::Entity> for Entity {
    fn to() -> RelationDef {
        super::album_photo::Relation::Album.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::album_photo::Relation::Photo.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

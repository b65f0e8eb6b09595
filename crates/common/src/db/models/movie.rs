//! Movie entity

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "String(StringLen::N(255))", unique)]
    pub title: String,

    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub imdb_id: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub overview: Option<String>,

    #[sea_orm(column_type = "String(StringLen::N(255))", nullable)]
    pub poster: Option<String>,

    /// Minutes
    pub running_time: Option<i32>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub actors: Option<NameList>,

    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub directors: Option<NameList>,
}

/// Ordered list of people stored as a JSON array
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct NameList(pub Vec<String>);

impl NameList {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for NameList {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

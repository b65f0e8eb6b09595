//! User entity

use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Role every authenticated user holds
pub const ROLE_USER: &str = "ROLE_USER";

/// Role required to change or delete movies and reviews
pub const ROLE_EDITOR: &str = "ROLE_EDITOR";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(column_type = "String(StringLen::N(180))", unique)]
    pub email: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password: String,

    #[sea_orm(column_type = "String(StringLen::N(255))")]
    pub name: String,

    #[sea_orm(column_type = "JsonBinary")]
    pub roles: RoleSet,
}

impl Model {
    /// Stored roles plus `ROLE_USER`, without duplicates
    pub fn effective_roles(&self) -> Vec<String> {
        self.roles.effective()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.effective_roles().iter().any(|r| r == role)
    }
}

/// Deduplicated set of role names, kept in insertion order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RoleSet(Vec<String>);

impl RoleSet {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: Vec<String> = Vec::new();
        for role in roles {
            let role = role.into();
            if !set.contains(&role) {
                set.push(role);
            }
        }
        Self(set)
    }

    /// Roles as stored
    pub fn stored(&self) -> &[String] {
        &self.0
    }

    /// Roles as granted: stored roles with `ROLE_USER` appended once
    pub fn effective(&self) -> Vec<String> {
        RoleSet::new(self.0.iter().cloned().chain([ROLE_USER.to_string()])).0
    }
}

impl From<Vec<String>> for RoleSet {
    fn from(roles: Vec<String>) -> Self {
        RoleSet::new(roles)
    }
}

impl From<RoleSet> for Vec<String> {
    fn from(set: RoleSet) -> Self {
        set.0
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

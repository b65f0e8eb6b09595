//! SeaORM entity models
//!
//! Database entities for RoastingReels

mod movie;
mod review;
mod user;

pub use movie::{
    Entity as MovieEntity,
    Model as Movie,
    ActiveModel as MovieActiveModel,
    Column as MovieColumn,
    NameList,
};

pub use review::{
    Entity as ReviewEntity,
    Model as Review,
    ActiveModel as ReviewActiveModel,
    Column as ReviewColumn,
    average_score, is_valid_score, MAX_SCORE, MIN_SCORE,
};

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
    RoleSet, ROLE_EDITOR, ROLE_USER,
};

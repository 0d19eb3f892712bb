//! Refresh token entity.

use sea_orm::entity::prelude::*;

/// Issued refresh token. The primary key is the token's `jti` claim.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "refresh_token")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owner of the token.
    pub user_id: String,

    /// Expiry, mirrors the `exp` claim.
    pub expires_at: DateTimeWithTimeZone,

    pub created_at: DateTimeWithTimeZone,

    /// Set on logout; revoked tokens can no longer be exchanged.
    #[sea_orm(nullable)]
    pub revoked_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

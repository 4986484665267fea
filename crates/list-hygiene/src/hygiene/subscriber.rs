//! `mailing_list` rows as seen by the hygiene job.
//!
//! Rows are created and upserted by the signup paths; this crate only reads
//! them and flips `unsubscribed` to true.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "mailing_list")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub email: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub info: Option<String>,
    pub unsubscribed: Option<bool>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

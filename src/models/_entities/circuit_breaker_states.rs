use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "circuit_breaker_states")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub provider_slug: String,
    pub phase: String,
    pub consecutive_failure_count: i32,
    pub consecutive_success_count: i32,
    pub last_failure_time: Option<DateTime>,
    pub last_state_change: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! Refunds against a sale. A refund never exceeds the sale amount.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::MoneyCents;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Refund {
    pub id: i32,
    pub sale_id: i32,
    pub reason: String,
    pub refund_amount: MoneyCents,
    pub refund_date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "refunds")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sale_id: i32,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub refund_amount_minor: i64,
    pub refund_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales::Entity",
        from = "Column::SaleId",
        to = "super::sales::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Sale,
}

impl Related<super::sales::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Refund {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            sale_id: model.sale_id,
            reason: model.reason,
            refund_amount: MoneyCents::new(model.refund_amount_minor),
            refund_date: model.refund_date,
        }
    }
}

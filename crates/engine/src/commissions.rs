//! Closer commissions.
//!
//! `computed_amount` is derived from the sale amount when the commission is
//! created and stored as is. It is never recomputed from a live join, so a
//! later change to the sale would not be reflected here.

use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::{MoneyCents, Percentage};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Commission {
    pub id: i32,
    pub sale_id: i32,
    pub closer_name: String,
    pub percentage: Percentage,
    pub computed_amount: MoneyCents,
    pub manual_adjustment: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sale_id: i32,
    pub closer_name: String,
    pub percentage_bp: i64,
    pub computed_amount_minor: i64,
    pub manual_adjustment_minor: i64,
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

impl From<Model> for Commission {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            sale_id: model.sale_id,
            closer_name: model.closer_name,
            percentage: Percentage::from_basis_points(model.percentage_bp),
            computed_amount: MoneyCents::new(model.computed_amount_minor),
            manual_adjustment: MoneyCents::new(model.manual_adjustment_minor),
        }
    }
}

/// `sale_amount * percentage / 100 + manual_adjustment`.
pub(crate) fn compute_amount(
    sale_amount: MoneyCents,
    percentage: Percentage,
    manual_adjustment: MoneyCents,
) -> crate::ResultEngine<MoneyCents> {
    percentage
        .of(sale_amount)?
        .checked_add(manual_adjustment)
        .ok_or_else(|| crate::EngineError::Validation("commission amount too large".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_percent_of_hundred_plus_five() {
        let amount = compute_amount(
            MoneyCents::new(100_00),
            Percentage::from_basis_points(10_00),
            MoneyCents::new(5_00),
        )
        .unwrap();
        assert_eq!(amount, MoneyCents::new(15_00));
    }

    #[test]
    fn negative_adjustment_reduces_amount() {
        let amount = compute_amount(
            MoneyCents::new(200_00),
            Percentage::from_basis_points(5_00),
            MoneyCents::new(-2_50),
        )
        .unwrap();
        assert_eq!(amount, MoneyCents::new(7_50));
    }
}

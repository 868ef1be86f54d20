use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    Commission, EngineError, MoneyCents, Percentage, ResultEngine,
    commissions::{self, compute_amount},
    sales,
};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Records a closer commission on a sale.
    ///
    /// The amount is computed once, here, as
    /// `sale.amount * percentage / 100 + manual_adjustment` and stored.
    pub async fn create_commission(
        &self,
        sale_id: i32,
        closer_name: &str,
        percentage: Percentage,
        manual_adjustment: MoneyCents,
    ) -> ResultEngine<Commission> {
        let closer_name = normalize_required_text(closer_name, "closer name")?;
        if percentage.is_negative() {
            return Err(EngineError::Validation(
                "percentage must be >= 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let sale = sales::Entity::find_by_id(sale_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("sale {sale_id}")))?;

            let computed =
                compute_amount(MoneyCents::new(sale.amount_minor), percentage, manual_adjustment)?;

            let model = commissions::ActiveModel {
                id: ActiveValue::NotSet,
                sale_id: ActiveValue::Set(sale_id),
                closer_name: ActiveValue::Set(closer_name),
                percentage_bp: ActiveValue::Set(percentage.basis_points()),
                computed_amount_minor: ActiveValue::Set(computed.cents()),
                manual_adjustment_minor: ActiveValue::Set(manual_adjustment.cents()),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                "created commission {} on sale {sale_id}: {computed}",
                model.id
            );
            Ok(Commission::from(model))
        })
    }
}

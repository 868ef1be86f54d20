use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{EngineError, MoneyCents, Refund, ResultEngine, refunds, sales};

use super::{Engine, require_positive, with_tx};

impl Engine {
    /// Records a refund against a sale.
    ///
    /// `refund_amount` must be > 0 and may equal, but not exceed, the sale
    /// amount. `refund_date` defaults to now.
    pub async fn create_refund(
        &self,
        sale_id: i32,
        reason: &str,
        refund_amount: MoneyCents,
        refund_date: Option<DateTime<Utc>>,
    ) -> ResultEngine<Refund> {
        require_positive(refund_amount, "refund amount")?;
        with_tx!(self, |db_tx| {
            let sale = sales::Entity::find_by_id(sale_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("sale {sale_id}")))?;

            let sale_amount = MoneyCents::new(sale.amount_minor);
            if refund_amount > sale_amount {
                return Err(EngineError::Validation(format!(
                    "refund amount {refund_amount} exceeds sale amount {sale_amount}"
                )));
            }

            let model = refunds::ActiveModel {
                id: ActiveValue::NotSet,
                sale_id: ActiveValue::Set(sale_id),
                reason: ActiveValue::Set(reason.trim().to_string()),
                refund_amount_minor: ActiveValue::Set(refund_amount.cents()),
                refund_date: ActiveValue::Set(refund_date.unwrap_or_else(Utc::now)),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!("created refund {} on sale {sale_id}", model.id);
            Ok(Refund::from(model))
        })
    }
}

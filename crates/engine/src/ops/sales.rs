use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryOrder, TransactionTrait, prelude::*};

use crate::{EngineError, MoneyCents, ResultEngine, Sale, clients, courses, sales};

use super::{Engine, require_positive, with_tx};

impl Engine {
    /// Records the sale of a course to a client.
    ///
    /// Both references must exist and `amount` must be > 0. `sale_date`
    /// defaults to now.
    pub async fn create_sale(
        &self,
        client_id: i32,
        course_id: i32,
        amount: MoneyCents,
        sale_date: Option<DateTime<Utc>>,
    ) -> ResultEngine<Sale> {
        with_tx!(self, |db_tx| {
            clients::Entity::find_by_id(client_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("client {client_id}")))?;
            courses::Entity::find_by_id(course_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("course {course_id}")))?;
            require_positive(amount, "sale amount")?;

            let model = sales::ActiveModel {
                id: ActiveValue::NotSet,
                client_id: ActiveValue::Set(client_id),
                course_id: ActiveValue::Set(course_id),
                amount_minor: ActiveValue::Set(amount.cents()),
                sale_date: ActiveValue::Set(sale_date.unwrap_or_else(Utc::now)),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                "created sale {} (client {client_id}, course {course_id}, {amount})",
                model.id
            );
            Ok(Sale::from(model))
        })
    }

    /// Returns every sale, in insertion order.
    pub async fn list_sales(&self) -> ResultEngine<Vec<Sale>> {
        with_tx!(self, |db_tx| {
            let models = sales::Entity::find()
                .order_by_asc(sales::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(Sale::from).collect())
        })
    }
}

//! Read-only projections for charts and tables. No filtering happens here.

use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;

use crate::{MoneyCents, ResultEngine, clients, sales};

use super::{Engine, with_tx};

/// Sale projection keyed for a time series on `sale_date`/`amount`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SaleReportRow {
    pub id: i32,
    pub client_id: i32,
    pub course_id: i32,
    pub amount: MoneyCents,
    pub sale_date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClientReportRow {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub country: String,
    pub referral_source: String,
}

impl From<sales::Model> for SaleReportRow {
    fn from(model: sales::Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            course_id: model.course_id,
            amount: MoneyCents::new(model.amount_minor),
            sale_date: model.sale_date,
        }
    }
}

impl From<clients::Model> for ClientReportRow {
    fn from(model: clients::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            country: model.country,
            referral_source: model.referral_source,
        }
    }
}

impl Engine {
    /// Every sale, ordered as stored.
    pub async fn sales_report(&self) -> ResultEngine<Vec<SaleReportRow>> {
        with_tx!(self, |db_tx| {
            let models = sales::Entity::find()
                .order_by_asc(sales::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(SaleReportRow::from).collect())
        })
    }

    /// Every client, ordered as stored.
    pub async fn clients_report(&self) -> ResultEngine<Vec<ClientReportRow>> {
        with_tx!(self, |db_tx| {
            let models = clients::Entity::find()
                .order_by_asc(clients::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(models.into_iter().map(ClientReportRow::from).collect())
        })
    }
}

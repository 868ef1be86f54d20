use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;

use crate::{Client, EngineError, ResultEngine, clients, tabular::read_first_sheet};

use super::{Engine, map_unique, matches_any, normalize_required_text, search_needle, with_tx};

/// Header names an import file must carry, mapped in the order of
/// [`ClientInput`] fields: name, email, phone, country, referral source.
pub const IMPORT_COLUMNS: [&str; 5] = ["nombre", "email", "telefono", "pais", "fuente_referencia"];

/// Fields of a client as typed by the user.
#[derive(Clone, Debug, Default)]
pub struct ClientInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub referral_source: String,
}

/// Outcome of a bulk import. Rows are independent: a failed row never
/// undoes the rows inserted before it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: usize,
    pub errors: Vec<ImportRowError>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportRowError {
    /// 1-based data row: row 1 is the first row under the header. This is
    /// not the spreadsheet row number, which is one higher.
    pub row: usize,
    pub email: String,
    pub message: String,
}

struct ValidClient {
    name: String,
    email: String,
}

fn validate_input(input: &ClientInput) -> ResultEngine<ValidClient> {
    Ok(ValidClient {
        name: normalize_required_text(&input.name, "client name")?,
        email: normalize_required_text(&input.email, "client email")?,
    })
}

impl Engine {
    /// Creates a client. The email must not be used by any other client.
    pub async fn create_client(&self, input: ClientInput) -> ResultEngine<Client> {
        let ValidClient { name, email } = validate_input(&input)?;
        with_tx!(self, |db_tx| {
            let exists = clients::Entity::find()
                .filter(clients::Column::Email.eq(email.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(email));
            }

            let model = clients::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name),
                email: ActiveValue::Set(email.clone()),
                phone: ActiveValue::Set(input.phone.trim().to_string()),
                country: ActiveValue::Set(input.country.trim().to_string()),
                referral_source: ActiveValue::Set(input.referral_source.trim().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| map_unique(err, &email))?;

            tracing::info!("created client {} <{}>", model.id, model.email);
            Ok(Client::from(model))
        })
    }

    /// Overwrites every field of an existing client.
    ///
    /// Changing the email to one held by another client fails with
    /// [`EngineError::ExistingKey`] and leaves the record untouched.
    pub async fn update_client(&self, client_id: i32, input: ClientInput) -> ResultEngine<Client> {
        let ValidClient { name, email } = validate_input(&input)?;
        with_tx!(self, |db_tx| {
            let current = clients::Entity::find_by_id(client_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("client {client_id}")))?;

            if current.email != email {
                let taken = clients::Entity::find()
                    .filter(clients::Column::Email.eq(email.as_str()))
                    .filter(clients::Column::Id.ne(client_id))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if taken {
                    return Err(EngineError::ExistingKey(email));
                }
            }

            let mut active: clients::ActiveModel = current.into();
            active.name = ActiveValue::Set(name);
            active.email = ActiveValue::Set(email.clone());
            active.phone = ActiveValue::Set(input.phone.trim().to_string());
            active.country = ActiveValue::Set(input.country.trim().to_string());
            active.referral_source = ActiveValue::Set(input.referral_source.trim().to_string());
            let model = active
                .update(&db_tx)
                .await
                .map_err(|err| map_unique(err, &email))?;

            tracing::info!("updated client {}", model.id);
            Ok(Client::from(model))
        })
    }

    /// Lists every client whose name, email or country contains `search`
    /// (case-insensitive). No pagination.
    pub async fn list_clients(&self, search: Option<&str>) -> ResultEngine<Vec<Client>> {
        let needle = search_needle(search);
        with_tx!(self, |db_tx| {
            let models = clients::Entity::find()
                .order_by_asc(clients::Column::Id)
                .all(&db_tx)
                .await?;
            let matching: Vec<_> = models
                .into_iter()
                .filter(|m| {
                    let fields = [m.name.as_str(), m.email.as_str(), m.country.as_str()];
                    needle
                        .as_deref()
                        .is_none_or(|needle| matches_any(needle, &fields))
                })
                .map(Client::from)
                .collect();
            tracing::debug!("listed {} clients", matching.len());
            Ok(matching)
        })
    }

    /// Imports clients from the first sheet of an `.xlsx` workbook.
    ///
    /// The header row must contain every name in [`IMPORT_COLUMNS`]
    /// (case-sensitive), otherwise nothing is imported and
    /// [`EngineError::InvalidFormat`] is returned. Each data row is created in
    /// its own transaction; rows that fail (duplicate email, invalid fields,
    /// storage errors) are reported and skipped.
    pub async fn import_clients(&self, workbook: &[u8]) -> ResultEngine<ImportReport> {
        let table = read_first_sheet(workbook)?;

        let mut indexes = [0usize; IMPORT_COLUMNS.len()];
        let mut missing = Vec::new();
        for (slot, column) in indexes.iter_mut().zip(IMPORT_COLUMNS) {
            match table.column(column) {
                Some(index) => *slot = index,
                None => missing.push(column),
            }
        }
        if !missing.is_empty() {
            return Err(EngineError::InvalidFormat(format!(
                "missing required columns: {} (expected: {})",
                missing.join(", "),
                IMPORT_COLUMNS.join(", ")
            )));
        }
        let [name, email, phone, country, referral_source] = indexes;

        let mut report = ImportReport::default();
        for (offset, cells) in table.rows.iter().enumerate() {
            if cells.iter().all(|c| c.is_empty()) {
                continue;
            }
            let cell = |index: usize| cells.get(index).cloned().unwrap_or_default();
            let input = ClientInput {
                name: cell(name),
                email: cell(email),
                phone: cell(phone),
                country: cell(country),
                referral_source: cell(referral_source),
            };
            let row_email = input.email.clone();

            match self.create_client(input).await {
                Ok(_) => report.inserted += 1,
                Err(err) => {
                    let row = offset + 1;
                    tracing::warn!("import row {row} skipped: {err}");
                    report.errors.push(ImportRowError {
                        row,
                        email: row_email,
                        message: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            "imported {} clients, {} rows rejected",
            report.inserted,
            report.errors.len()
        );
        Ok(report)
    }
}

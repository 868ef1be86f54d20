use std::io::Cursor;

use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait};

use engine::{ClientInput, Engine, EngineError, IMPORT_COLUMNS, clients};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn client(name: &str, email: &str, country: &str) -> ClientInput {
    ClientInput {
        name: name.to_string(),
        email: email.to_string(),
        phone: "+34 600 000 000".to_string(),
        country: country.to_string(),
        referral_source: "instagram".to_string(),
    }
}

/// Builds an in-memory workbook whose first sheet holds `header` then `rows`.
fn workbook(header: &[&str], rows: &[[&str; 5]]) -> Vec<u8> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
    for (col, value) in header.iter().enumerate() {
        sheet
            .get_cell_mut((col as u32 + 1, 1))
            .set_value(value.to_string());
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            sheet
                .get_cell_mut((col as u32 + 1, r as u32 + 2))
                .set_value(value.to_string());
        }
    }
    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out).unwrap();
    out.into_inner()
}

#[tokio::test]
async fn create_client_trims_and_persists() {
    let (engine, _db) = engine_with_db().await;

    let created = engine
        .create_client(client("  Ana Pérez ", " ana@example.com ", "ES"))
        .await
        .unwrap();

    assert!(created.id > 0);
    assert_eq!(created.name, "Ana Pérez");
    assert_eq!(created.email, "ana@example.com");
    assert_eq!(created.country, "ES");
}

#[tokio::test]
async fn create_client_with_taken_email_fails() {
    let (engine, db) = engine_with_db().await;
    engine
        .create_client(client("Ana", "ana@example.com", "ES"))
        .await
        .unwrap();

    let err = engine
        .create_client(client("Other Ana", "ana@example.com", "MX"))
        .await
        .unwrap_err();

    assert_eq!(err, EngineError::ExistingKey("ana@example.com".to_string()));
    assert_eq!(clients::Entity::find().count(&db).await.unwrap(), 1);
}

#[tokio::test]
async fn create_client_requires_name_and_email() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .create_client(client("", "x@example.com", "ES"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .create_client(client("X", "  ", "ES"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn update_client_to_taken_email_leaves_record_unchanged() {
    let (engine, db) = engine_with_db().await;
    let ana = engine
        .create_client(client("Ana", "a@x.com", "ES"))
        .await
        .unwrap();
    engine
        .create_client(client("Bea", "b@x.com", "AR"))
        .await
        .unwrap();

    let err = engine
        .update_client(ana.id, client("Ana Renamed", "b@x.com", "CL"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("b@x.com".to_string()));

    let stored = clients::Entity::find_by_id(ana.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.name, "Ana");
    assert_eq!(stored.email, "a@x.com");
    assert_eq!(stored.country, "ES");
}

#[tokio::test]
async fn update_client_overwrites_fields() {
    let (engine, _db) = engine_with_db().await;
    let ana = engine
        .create_client(client("Ana", "a@x.com", "ES"))
        .await
        .unwrap();

    let updated = engine
        .update_client(ana.id, client("Ana María", "a@x.com", "PT"))
        .await
        .unwrap();

    assert_eq!(updated.id, ana.id);
    assert_eq!(updated.name, "Ana María");
    assert_eq!(updated.country, "PT");
}

#[tokio::test]
async fn update_missing_client_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .update_client(7, client("Ghost", "g@x.com", ""))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("client 7".to_string()));
}

#[tokio::test]
async fn list_clients_searches_name_email_and_country() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_client(client("Ana", "ana@mail.com", "Spain"))
        .await
        .unwrap();
    engine
        .create_client(client("Bruno", "bruno@mail.com", "Brazil"))
        .await
        .unwrap();
    engine
        .create_client(client("Carla", "carla@spainmail.com", "Chile"))
        .await
        .unwrap();

    let all = engine.list_clients(None).await.unwrap();
    assert_eq!(all.len(), 3);

    let found = engine.list_clients(Some("SPAIN")).await.unwrap();
    let names: Vec<_> = found.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Ana", "Carla"]);

    let none = engine.list_clients(Some("zzz")).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn list_clients_search_folds_accented_capitals() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_client(client("Lucía", "lucia@x.com", "PERÚ"))
        .await
        .unwrap();
    engine
        .create_client(client("ÁLVARO", "alvaro@x.com", "Chile"))
        .await
        .unwrap();

    let found = engine.list_clients(Some("perú")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Lucía");

    let found = engine.list_clients(Some("álvaro")).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].country, "Chile");

    let found = engine.list_clients(Some("_")).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn import_reports_duplicate_row_and_keeps_the_rest() {
    let (engine, db) = engine_with_db().await;
    let bytes = workbook(
        &IMPORT_COLUMNS,
        &[
            ["Ana", "ana@x.com", "1", "ES", "ads"],
            ["Ana again", "ana@x.com", "2", "ES", "ads"],
            ["Bea", "bea@x.com", "3", "AR", "friend"],
        ],
    );

    let report = engine.import_clients(&bytes).await.unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 2);
    assert_eq!(report.errors[0].email, "ana@x.com");
    assert_eq!(clients::Entity::find().count(&db).await.unwrap(), 2);
}

#[tokio::test]
async fn import_accepts_columns_in_any_order_and_skips_blank_rows() {
    let (engine, _db) = engine_with_db().await;
    let bytes = workbook(
        &["email", "nombre", "pais", "telefono", "fuente_referencia"],
        &[
            ["ana@x.com", "Ana", "ES", "1", "ads"],
            ["", "", "", "", ""],
            ["bea@x.com", "Bea", "AR", "2", "friend"],
        ],
    );

    let report = engine.import_clients(&bytes).await.unwrap();
    assert_eq!(report.inserted, 2);
    assert!(report.errors.is_empty());

    let stored = engine.list_clients(Some("bea")).await.unwrap();
    assert_eq!(stored[0].name, "Bea");
    assert_eq!(stored[0].country, "AR");
}

#[tokio::test]
async fn import_with_missing_columns_inserts_nothing() {
    let (engine, db) = engine_with_db().await;
    let bytes = workbook(
        &["nombre", "email", "telefono", "pais", "origen"],
        &[["Ana", "ana@x.com", "1", "ES", "ads"]],
    );

    let err = engine.import_clients(&bytes).await.unwrap_err();

    match err {
        EngineError::InvalidFormat(message) => assert!(message.contains("fuente_referencia")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(clients::Entity::find().count(&db).await.unwrap(), 0);
}

#[tokio::test]
async fn import_of_non_workbook_bytes_is_invalid_format() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .import_clients(b"nombre,email\nAna,ana@x.com\n")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidFormat(_)));
}

#[tokio::test]
async fn import_of_header_only_sheet_is_empty_report() {
    let (engine, _db) = engine_with_db().await;
    let bytes = workbook(&IMPORT_COLUMNS, &[]);

    let report = engine.import_clients(&bytes).await.unwrap();
    assert_eq!(report.inserted, 0);
    assert!(report.errors.is_empty());
}

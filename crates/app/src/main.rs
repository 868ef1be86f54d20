use std::{error::Error, path::PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{
    ClientInput, CourseInput, CourseQuery, Engine, ExportFormat, MoneyCents, Percentage, SortOrder,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use serde::Serialize;

mod settings;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "salesbook")]
#[command(about = "Courses, clients, sales, refunds and commissions")]
struct Cli {
    /// Database connection string, overriding `settings.toml`.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Course(CourseCommand),
    #[command(subcommand)]
    Client(ClientCommand),
    #[command(subcommand)]
    Sale(SaleCommand),
    #[command(subcommand)]
    Refund(RefundCommand),
    #[command(subcommand)]
    Commission(CommissionCommand),
    #[command(subcommand)]
    Report(ReportCommand),
}

#[derive(Subcommand, Debug)]
enum CourseCommand {
    Create {
        #[command(flatten)]
        fields: CourseFields,
        /// Creation time (RFC 3339), defaults to now.
        #[arg(long)]
        created_at: Option<DateTime<Utc>>,
    },
    Update {
        #[arg(long)]
        id: i32,
        #[command(flatten)]
        fields: CourseFields,
    },
    Delete {
        #[arg(long)]
        id: i32,
    },
    List {
        #[arg(long)]
        search: Option<String>,
        /// Newest first.
        #[arg(long)]
        desc: bool,
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = 10)]
        page_size: u64,
    },
    Export {
        /// `csv` or `xlsx`.
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        #[arg(long)]
        search: Option<String>,
        /// Defaults to `courses.<format>` in the working directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct CourseFields {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    price: MoneyCents,
}

impl From<CourseFields> for CourseInput {
    fn from(fields: CourseFields) -> Self {
        Self {
            name: fields.name,
            description: fields.description,
            price: fields.price,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    Create(ClientFields),
    Update {
        #[arg(long)]
        id: i32,
        #[command(flatten)]
        fields: ClientFields,
    },
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Bulk import from an `.xlsx` workbook.
    Import {
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ClientFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    country: String,
    #[arg(long, default_value = "")]
    referral_source: String,
}

impl From<ClientFields> for ClientInput {
    fn from(fields: ClientFields) -> Self {
        Self {
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            country: fields.country,
            referral_source: fields.referral_source,
        }
    }
}

#[derive(Subcommand, Debug)]
enum SaleCommand {
    Create {
        #[arg(long)]
        client_id: i32,
        #[arg(long)]
        course_id: i32,
        #[arg(long)]
        amount: MoneyCents,
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum RefundCommand {
    Create {
        #[arg(long)]
        sale_id: i32,
        #[arg(long, default_value = "")]
        reason: String,
        #[arg(long)]
        amount: MoneyCents,
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },
}

#[derive(Subcommand, Debug)]
enum CommissionCommand {
    Create {
        #[arg(long)]
        sale_id: i32,
        #[arg(long)]
        closer: String,
        /// Percent of the sale amount, e.g. `10` or `7.5`.
        #[arg(long)]
        percentage: Percentage,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        adjustment: MoneyCents,
    },
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    Sales,
    Clients,
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection, BoxError> {
    let db = sea_orm::Database::connect(database_url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(engine: &Engine, command: Command) -> Result<(), BoxError> {
    match command {
        Command::Course(command) => match command {
            CourseCommand::Create { fields, created_at } => {
                print_json(&engine.create_course(fields.into(), created_at).await?)
            }
            CourseCommand::Update { id, fields } => {
                print_json(&engine.update_course(id, fields.into()).await?)
            }
            CourseCommand::Delete { id } => {
                engine.delete_course(id).await?;
                println!("deleted course {id}");
                Ok(())
            }
            CourseCommand::List {
                search,
                desc,
                page,
                page_size,
            } => {
                let query = CourseQuery {
                    search,
                    order: if desc { SortOrder::Desc } else { SortOrder::Asc },
                    page,
                    page_size,
                };
                print_json(&engine.list_courses(&query).await?)
            }
            CourseCommand::Export {
                format,
                search,
                output,
            } => {
                let bytes = engine.export_courses(format, search.as_deref()).await?;
                let path = output
                    .unwrap_or_else(|| PathBuf::from(format!("courses.{}", format.extension())));
                tokio::fs::write(&path, &bytes).await?;
                println!("exported {} bytes to {}", bytes.len(), path.display());
                Ok(())
            }
        },
        Command::Client(command) => match command {
            ClientCommand::Create(fields) => print_json(&engine.create_client(fields.into()).await?),
            ClientCommand::Update { id, fields } => {
                print_json(&engine.update_client(id, fields.into()).await?)
            }
            ClientCommand::List { search } => {
                print_json(&engine.list_clients(search.as_deref()).await?)
            }
            ClientCommand::Import { file } => {
                let bytes = tokio::fs::read(&file).await?;
                print_json(&engine.import_clients(&bytes).await?)
            }
        },
        Command::Sale(command) => match command {
            SaleCommand::Create {
                client_id,
                course_id,
                amount,
                date,
            } => print_json(
                &engine
                    .create_sale(client_id, course_id, amount, date)
                    .await?,
            ),
            SaleCommand::List => print_json(&engine.list_sales().await?),
        },
        Command::Refund(RefundCommand::Create {
            sale_id,
            reason,
            amount,
            date,
        }) => print_json(
            &engine
                .create_refund(sale_id, &reason, amount, date)
                .await?,
        ),
        Command::Commission(CommissionCommand::Create {
            sale_id,
            closer,
            percentage,
            adjustment,
        }) => print_json(
            &engine
                .create_commission(sale_id, &closer, percentage, adjustment)
                .await?,
        ),
        Command::Report(ReportCommand::Sales) => print_json(&engine.sales_report().await?),
        Command::Report(ReportCommand::Clients) => print_json(&engine.clients_report().await?),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match settings::Settings::new() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("invalid settings: {err}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "salesbook={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let database_url = cli
        .database_url
        .unwrap_or_else(|| settings.database.url());

    let result: Result<(), BoxError> = async {
        let db = connect_db(&database_url).await?;
        let engine = Engine::builder().database(db).build().await?;
        run(&engine, cli.command).await
    }
    .await;

    if let Err(err) = result {
        tracing::debug!("command failed: {err:?}");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

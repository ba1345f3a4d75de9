use std::fs::File;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use studentdb_cli::report::Report;
use studentdb_cli::seeder;
use studentdb_config::{DatabaseConfig, FeatureConfig};
use studentdb_core::CredentialError;
use studentdb_db::{
    CredentialStore, PgCredentialStore, PgPool, PgStudentRepository, StudentRepository,
    init_db_pool, run_migrations,
};
use studentdb_models::import::parse_students_csv;

#[derive(Parser)]
#[command(name = "studentdb-cli")]
#[command(about = "studentdb CLI - Administrative tools for the student records store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a login account
    CreateUser {
        /// Username (prompted if not provided)
        #[arg(short = 'u', long)]
        username: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,

        /// Mark the account read-only
        #[arg(long)]
        read_only: bool,
    },
    /// Import student records from a CSV file
    ImportCsv {
        /// Path to a file with the header `Фамилия,Имя,Факультет,Курс,Оценка`
        path: String,
    },
    /// Print the faculty, course, average and low-score reports
    Report {
        #[arg(short = 'f', long, default_value = "ФПМИ")]
        faculty: String,

        #[arg(short = 'c', long, default_value = "Информатика")]
        course: String,

        /// Scores strictly below this count as low (defaults to LOW_SCORE_THRESHOLD)
        #[arg(short = 't', long)]
        threshold: Option<i32>,
    },
    /// Seed the database with fake student records
    Seed {
        /// Number of students to create
        #[arg(short = 'n', long, default_value = "100")]
        count: usize,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let pool = match connect().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Commands::CreateUser {
            username,
            password,
            read_only,
        } => handle_create_user(&pool, username, password, read_only).await,
        Commands::ImportCsv { path } => handle_import_csv(&pool, &path).await,
        Commands::Report {
            faculty,
            course,
            threshold,
        } => {
            let threshold = threshold.unwrap_or_else(|| FeatureConfig::from_env().low_score_threshold);
            handle_report(&pool, &faculty, &course, threshold).await
        }
        Commands::Seed { count } => handle_seed(&pool, count).await,
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

fn prompt_username() -> String {
    match Input::new().with_prompt("Username").interact_text() {
        Ok(username) => username,
        Err(e) => {
            eprintln!("❌ Failed to read username: {}", e);
            std::process::exit(1);
        }
    }
}

fn prompt_password() -> String {
    match Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords don't match")
        .interact()
    {
        Ok(password) => password,
        Err(e) => {
            eprintln!("❌ Failed to read password: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_create_user(
    pool: &PgPool,
    username: Option<String>,
    password: Option<String>,
    read_only: bool,
) {
    let username = username.unwrap_or_else(prompt_username);
    let password = password.unwrap_or_else(prompt_password);

    let store = PgCredentialStore::new(pool.clone());
    match store.register(&username, &password, read_only).await {
        Ok(_) => {
            println!("\n✅ User created successfully!");
            println!("   Username: {}", username);
            println!("   Read-only: {}", read_only);
        }
        Err(CredentialError::AlreadyExists) => {
            eprintln!("\n❌ User '{}' already exists", username);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("\n❌ Error creating user: {}", e);
            std::process::exit(1);
        }
    }
}

async fn import_csv(pool: &PgPool, path: &str) -> anyhow::Result<(u64, usize)> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path))?;
    let import = parse_students_csv(file)?;

    let repository = PgStudentRepository::new(pool.clone());
    let inserted = repository.insert_many(import.students).await?;
    Ok((inserted, import.skipped))
}

async fn handle_import_csv(pool: &PgPool, path: &str) {
    match import_csv(pool, path).await {
        Ok((inserted, skipped)) => {
            println!("✅ Imported {} students", inserted);
            if skipped > 0 {
                println!("   Skipped {} invalid rows", skipped);
            }
        }
        Err(e) => {
            eprintln!("\n❌ Error importing CSV: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_report(pool: &PgPool, faculty: &str, course: &str, threshold: i32) {
    let repository = PgStudentRepository::new(pool.clone());
    match Report::build(&repository, faculty, course, threshold).await {
        Ok(report) => print!("{}", report),
        Err(e) => {
            eprintln!("\n❌ Error building report: {}", e);
            std::process::exit(1);
        }
    }
}

async fn handle_seed(pool: &PgPool, count: usize) {
    let repository = PgStudentRepository::new(pool.clone());
    if let Err(e) = seeder::seed_students(&repository, count).await {
        eprintln!("\n❌ Error seeding database: {}", e);
        std::process::exit(1);
    }
}

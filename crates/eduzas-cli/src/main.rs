use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use eduzas_cli::admin::{NewAdmin, create_admin};
use eduzas_cli::seeder::{self, SeedConfig};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

#[derive(Parser)]
#[command(name = "eduzas-cli")]
#[command(about = "EduZas CLI - Administrative tools for EduZas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// First name
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Father's last name
        #[arg(short = 'l', long)]
        father_lastname: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Seed the database with fake professors, students, classes and enrollments
    Seed {
        #[arg(long, default_value = "5")]
        professors: usize,

        #[arg(long, default_value = "100")]
        students: usize,

        #[arg(long, default_value = "10")]
        classes: usize,

        #[arg(long, default_value = "20")]
        students_per_class: usize,
    },
    /// Delete every seeded row
    ClearSeed,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("\n❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    match cli.command {
        Commands::CreateAdmin {
            first_name,
            father_lastname,
            email,
            password,
        } => handle_create_admin(&pool, first_name, father_lastname, email, password).await,
        Commands::Seed {
            professors,
            students,
            classes,
            students_per_class,
        } => {
            let config =
                SeedConfig::new(professors, students).with_classes(classes, students_per_class);
            seeder::seed_all(&pool, config).await
        }
        Commands::ClearSeed => seeder::clear_all(&pool).await,
    }
}

fn prompt_or(value: Option<String>, prompt: &str) -> Result<String, dialoguer::Error> {
    match value {
        Some(value) => Ok(value),
        None => Input::new().with_prompt(prompt).interact_text(),
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    first_name: Option<String>,
    father_lastname: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let first_name = prompt_or(first_name, "First name")?;
    let father_lastname = prompt_or(father_lastname, "Father's last name")?;
    let email = prompt_or(email, "Email address")?;
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    let admin = NewAdmin {
        first_name,
        father_lastname,
        email,
        password,
    };
    create_admin(pool, &admin).await?;

    println!("\n✅ Admin created successfully!");
    println!("   Email: {}", admin.email);
    println!("   Name: {} {}", admin.first_name, admin.father_lastname);
    Ok(())
}

use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use classbook_cli::provision;
use classbook_config::JwtConfig;
use classbook_db::{PgStore, init_db_pool, run_migrations};
use classbook_models::{
    CreateClassDto, CreateSchoolDto, CreateUserDto, NationalId, Role, SchoolId, UserId,
};

#[derive(Parser)]
#[command(name = "classbook-cli")]
#[command(about = "Classbook CLI - Staff provisioning for Classbook", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Register a user
    CreateUser {
        #[arg(short = 'u', long)]
        username: String,

        #[arg(short = 'f', long)]
        first_name: String,

        #[arg(short = 'l', long)]
        last_name: String,

        #[arg(short = 'e', long)]
        email: String,

        /// Exactly 10 digits
        #[arg(short = 'n', long)]
        national_id: NationalId,

        /// manager, teacher or student
        #[arg(short = 'r', long)]
        role: Role,

        #[arg(long)]
        bio: Option<String>,

        /// Create the account deactivated
        #[arg(long)]
        inactive: bool,
    },
    /// Register a school, optionally run by a manager
    CreateSchool {
        #[arg(short = 'n', long)]
        name: String,

        /// Id of a user with the manager role who runs no other school
        #[arg(short = 'm', long)]
        manager: Option<UserId>,
    },
    /// Create a class in a school
    CreateClass {
        #[arg(short = 's', long)]
        school: SchoolId,

        #[arg(short = 'n', long)]
        name: String,

        /// Id of a user with the teacher role
        #[arg(short = 't', long)]
        teacher: Option<UserId>,
    },
    /// Activate or deactivate a user account
    SetActive {
        #[arg(short = 'u', long)]
        user: UserId,

        /// true to activate, false to deactivate
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Mint an access token for a user
    IssueToken {
        #[arg(short = 'u', long)]
        user: UserId,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    let pool = init_db_pool().await.expect("Failed to connect to database");

    if let Commands::Migrate = cli.command {
        match run_migrations(&pool).await {
            Ok(()) => println!("✅ Migrations applied"),
            Err(e) => fail("running migrations", e),
        }
        return;
    }

    let store = PgStore::new(pool);
    let now = Utc::now();

    match cli.command {
        Commands::Migrate => {}
        Commands::CreateUser {
            username,
            first_name,
            last_name,
            email,
            national_id,
            role,
            bio,
            inactive,
        } => {
            let dto = CreateUserDto {
                username,
                first_name,
                last_name,
                email,
                national_id,
                role,
                bio,
                is_active: !inactive,
            };
            match provision::create_user(&store, dto, now).await {
                Ok(user) => {
                    println!("\n✅ User created successfully!");
                    println!("   Id: {}", user.id);
                    println!("   Username: {}", user.username);
                    println!("   Role: {}", user.role);
                }
                Err(e) => fail("creating user", e.error),
            }
        }
        Commands::CreateSchool { name, manager } => {
            let dto = CreateSchoolDto {
                name,
                manager_id: manager,
            };
            match provision::create_school(&store, dto, now).await {
                Ok(school) => {
                    println!("\n✅ School created successfully!");
                    println!("   Id: {}", school.id);
                    println!("   Name: {}", school.name);
                }
                Err(e) => fail("creating school", e.error),
            }
        }
        Commands::CreateClass {
            school,
            name,
            teacher,
        } => {
            let dto = CreateClassDto {
                school_id: school,
                name,
                teacher_id: teacher,
            };
            match provision::create_class(&store, dto, now).await {
                Ok(class) => {
                    println!("\n✅ Class created successfully!");
                    println!("   Id: {}", class.id);
                    println!("   Name: {}", class.name);
                }
                Err(e) => fail("creating class", e.error),
            }
        }
        Commands::SetActive { user, active } => {
            match provision::set_user_active(&store, user, active).await {
                Ok(user) => {
                    println!("\n✅ User updated successfully!");
                    println!("   Username: {}", user.username);
                    println!("   Active: {}", user.is_active);
                }
                Err(e) => fail("updating user", e.error),
            }
        }
        Commands::IssueToken { user } => {
            let jwt_config = JwtConfig::from_env();
            match provision::issue_token(&store, user, &jwt_config).await {
                Ok(token) => println!("{}", token),
                Err(e) => fail("issuing token", e.error),
            }
        }
    }
}

fn fail(what: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ Error {}: {}", what, err);
    std::process::exit(1);
}

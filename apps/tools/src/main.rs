use anyhow::Result;
use clap::{Parser, Subcommand};
use shared::domain::Role;
use storage::{SignupStore, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/waitlist.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every signup in position order.
    List {
        #[arg(long)]
        role: Option<Role>,
    },
    Count,
    /// Remove an address, same as following its unsubscribe link.
    Remove {
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::List { role } => {
            let signups = storage.list_signups().await?;
            for signup in signups
                .iter()
                .filter(|signup| role.map_or(true, |role| signup.role == role))
            {
                println!(
                    "{:>5}  {:<32}  {:<10}  {}  {}",
                    signup.signup_position,
                    signup.email,
                    signup.role,
                    signup.organization,
                    signup.created_at.to_rfc3339(),
                );
            }
        }
        Command::Count => {
            println!("{}", storage.count_signups().await?);
        }
        Command::Remove { email } => {
            let removed = storage.delete_by_email(&email).await?;
            info!(%email, removed, "remove processed");
            if removed == 0 {
                println!("{email} was not on the waitlist");
            } else {
                println!("removed {email}");
            }
        }
    }

    Ok(())
}

mod app;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cachebound::config::Config;
use cachebound::wrapper::{RepositoryWrapper, RepositoryWrapperFactory};
use cachebound_core::entity::{normalize, Role, User, UserRole};

/// Cachebound - Cache-backed repositories for users and roles
#[derive(Parser, Debug)]
#[command(name = "cachebound")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Name recorded as `created_by` / `modified_by` on every change
    #[arg(long, global = true, default_value = "cli", env = "CACHEBOUND_ACTOR")]
    actor: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage roles
    #[command(subcommand)]
    Roles(RolesCommand),

    /// Manage users
    #[command(subcommand)]
    Users(UsersCommand),

    /// Manage role assignments
    #[command(subcommand)]
    UserRoles(UserRolesCommand),
}

#[derive(Subcommand, Debug)]
enum RolesCommand {
    /// List every role
    List,
    /// Create a role
    Add(AddRole),
    /// Delete a role that nobody is assigned to
    Remove {
        /// Role name (case-insensitive)
        name: String,
    },
}

#[derive(Args, Debug)]
struct AddRole {
    name: String,

    #[arg(long, short)]
    description: Option<String>,
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// Register a user
    Add { user_name: String, email: String },
    /// List every user
    List,
}

#[derive(Subcommand, Debug)]
enum UserRolesCommand {
    /// Assign a role to a user
    Assign { user_name: String, role_name: String },
    /// List role assignments
    List {
        /// Only show assignments of this user
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Invalid configuration");
            return Err(err).context("failed to load configuration");
        }
    };
    let factory = app::build_factory(&config).await?;

    run(&factory, &cli.actor, cli.command).await
}

/// `LOG_FORMAT=json` switches to structured JSON output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cachebound=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(factory: &RepositoryWrapperFactory, actor: &str, command: Command) -> Result<()> {
    let uow = factory.begin();

    match command {
        Command::Roles(RolesCommand::List) => {
            for role in uow.roles().find_all_ordered(|r: &Role| r.normalized_name.clone()).await? {
                println!(
                    "{}\t{}\t{}",
                    role.audit.id.unwrap_or_default(),
                    role.name,
                    role.description.as_deref().unwrap_or("")
                );
            }
        }
        Command::Roles(RolesCommand::Add(args)) => {
            let mut role = Role::new(args.name, actor);
            role.description = args.description;
            uow.roles().add(&role)?;
            commit(&uow).await?;
        }
        Command::Roles(RolesCommand::Remove { name }) => {
            let role = find_role(&uow, &name).await?;
            uow.roles().remove(&role)?;
            commit(&uow).await?;
        }
        Command::Users(UsersCommand::Add { user_name, email }) => {
            let user = uow
                .auth()
                .user_manager()
                .create(User::new(user_name, email, actor))
                .await?;
            println!("{}\t{}", user.audit.id.unwrap_or_default(), user.user_name);
        }
        Command::Users(UsersCommand::List) => {
            for user in uow.auth().find_all().await? {
                println!(
                    "{}\t{}\t{}",
                    user.audit.id.unwrap_or_default(),
                    user.user_name,
                    user.email
                );
            }
        }
        Command::UserRoles(UserRolesCommand::Assign {
            user_name,
            role_name,
        }) => {
            let manager = uow.auth().user_manager();
            let user = manager
                .find_by_name(&user_name)
                .await?
                .with_context(|| format!("no user named '{user_name}'"))?;
            manager.add_to_role(&user, &role_name).await?;
            println!("{}\t{}", user.user_name, manager.roles_of(&user).await?.join(","));
        }
        Command::UserRoles(UserRolesCommand::List { user }) => {
            let users = uow.auth().find_all().await?;
            let roles = uow.roles().find_all().await?;
            let wanted = user.as_deref().map(normalize);

            for link in uow.user_roles().find_all_ordered(|l: &UserRole| (l.user_id, l.role_id)).await? {
                let Some(user) = users.iter().find(|u| u.audit.id == Some(link.user_id)) else {
                    continue;
                };
                if wanted.as_ref().is_some_and(|w| *w != user.normalized_user_name) {
                    continue;
                }
                let role = roles
                    .iter()
                    .find(|r| r.audit.id == Some(link.role_id))
                    .map_or("?", |r| r.name.as_str());
                println!("{}\t{}", user.user_name, role);
            }
        }
    }

    Ok(())
}

async fn find_role(uow: &RepositoryWrapper, name: &str) -> Result<Role> {
    let wanted = normalize(name);
    match uow.roles().find_one(move |r: &Role| r.normalized_name == wanted).await? {
        Some(role) => Ok(role),
        None => bail!("no role named '{name}'"),
    }
}

async fn commit(uow: &RepositoryWrapper) -> Result<()> {
    let report = uow.commit().await.context("failed to commit changes")?;
    tracing::info!(
        inserted = report.inserted.len(),
        updated = report.updated,
        deleted = report.deleted,
        "Changes saved"
    );
    Ok(())
}

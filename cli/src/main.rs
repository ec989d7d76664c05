//! `grocery`: terminal host for the grocery list client.
//!
//! Does the real I/O for `grocery-core`: a ureq transport and a token file
//! under `--state-dir`. Every invocation first revalidates the stored token,
//! the same readiness gate a long-running UI would pass through at startup.

mod render;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use grocery_core::{
    Api, ApiError, Credentials, EditBuffer, ErrorKind, FileTokenStore, GroceryClient, GroceryList,
    ItemId, ListQuery, PasswordChange, Profile, Registration, SessionEvent, SessionStore,
    SortField, SortOrder, StatusFilter, UreqTransport, DEFAULT_BASE_URL,
};
use grocery_core::validation::validate_draft;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::render::render_list;

type CliApi = Api<UreqTransport, FileTokenStore>;

#[derive(Debug, Parser)]
#[command(name = "grocery", version, about = "Manage your grocery list from the terminal")]
struct Cli {
    /// Base URL of the grocery API.
    #[arg(long, env = "GROCERY_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// Directory holding the persisted auth token.
    #[arg(long, env = "GROCERY_STATE_DIR", default_value = ".grocery")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an account.
    Register {
        email: String,
        #[arg(long, env = "GROCERY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in and remember the token.
    Login {
        email: String,
        #[arg(long, env = "GROCERY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the signed-in account.
    Whoami,
    /// Change the account password.
    Passwd {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Permanently delete the account.
    DeleteAccount {
        #[arg(long)]
        yes: bool,
    },
    /// Show the list, filtered and sorted.
    List {
        #[arg(long, default_value = "")]
        filter: String,
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        #[arg(long, default_value = "name")]
        sort: SortField,
        #[arg(long, default_value = "asc")]
        order: SortOrder,
    },
    Add {
        name: String,
        #[arg(default_value = "1")]
        quantity: String,
    },
    /// Change an item's name and/or quantity.
    Edit {
        id: ItemId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
    },
    /// Flip an item between pending and purchased.
    Toggle { id: ItemId },
    Rm { id: ItemId },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = Api::new(
        GroceryClient::new(&cli.api_url),
        UreqTransport::new(),
        FileTokenStore::new(&cli.state_dir),
    );
    let mut session = SessionStore::new();
    session.startup(&api);

    let result = run(cli.command, &api, &mut session);
    for event in session.take_events() {
        match event {
            SessionEvent::RedirectToLogin => info!("signed out; run `grocery login` to continue"),
        }
    }
    result
}

fn run(command: Command, api: &CliApi, session: &mut SessionStore) -> anyhow::Result<()> {
    match command {
        Command::Register { email, password } => {
            let user = session
                .register(api, &Registration { email, password })
                .map_err(registration_error)?;
            println!("Account created for {} (id {}). Please log in.", user.email, user.id);
        }
        Command::Login { email, password } => {
            let profile = session.sign_in(api, &Credentials { email, password })?;
            println!("Signed in as {}.", profile.email);
        }
        Command::Logout => {
            session.logout(api);
            println!("Signed out.");
        }
        Command::Whoami => {
            let user = require_user(session)?;
            println!("{} (id {}, member since {})", user.email, user.id, user.created_at);
        }
        Command::Passwd { current, new } => {
            require_user(session)?;
            let change = PasswordChange {
                current_password: current,
                new_password: new,
            };
            let response = session.change_password(api, &change)?;
            println!("{}", response.message);
        }
        Command::DeleteAccount { yes } => {
            require_user(session)?;
            if !yes {
                bail!("this permanently deletes the account and its list; pass --yes to confirm");
            }
            session.delete_account(api)?;
            println!("Account deleted.");
        }
        Command::List {
            filter,
            status,
            sort,
            order,
        } => {
            require_user(session)?;
            let list = load_list(api)?;
            let query = ListQuery {
                text: filter,
                status,
                sort,
                order,
            };
            print!("{}", render_list(&list.view(&query), &query));
        }
        Command::Add { name, quantity } => {
            let owner = require_user(session)?.id;
            let draft = validate_draft(&name, &quantity)?;
            let mut list = load_list(api)?;
            let item = list.add(api, &draft, owner)?;
            println!("\"{}\" added (id {}).", item.name, item.id);
        }
        Command::Edit { id, name, quantity } => {
            require_user(session)?;
            let mut list = load_list(api)?;
            let current = list.get(id).cloned().with_context(|| format!("no item with id {id}"))?;
            let mut buffer = EditBuffer::new();
            buffer.start(&current);
            if let Some(name) = name {
                buffer.set_name(&name);
            }
            if let Some(quantity) = quantity {
                buffer.set_quantity(&quantity);
            }
            let Some(edited) = buffer.commit(&list)? else {
                bail!("nothing to edit");
            };
            let item = list.update(api, edited)?;
            println!("\"{}\" updated.", item.name);
        }
        Command::Toggle { id } => {
            require_user(session)?;
            let mut list = load_list(api)?;
            let item = list.toggle_status(api, id)?;
            println!("\"{}\" is now {}.", item.name, item.status);
        }
        Command::Rm { id } => {
            require_user(session)?;
            let mut list = load_list(api)?;
            let item = list.delete(api, id)?;
            println!("\"{}\" deleted.", item.name);
        }
    }
    Ok(())
}

fn registration_error(err: ApiError) -> anyhow::Error {
    match err.kind() {
        ErrorKind::Conflict => anyhow!(
            "email: this address is already registered; log in or use a different email"
        ),
        _ => err.into(),
    }
}

fn require_user(session: &SessionStore) -> anyhow::Result<&Profile> {
    session
        .user()
        .context("not signed in; run `grocery login <email>` first")
}

fn load_list(api: &CliApi) -> anyhow::Result<GroceryList> {
    let mut list = GroceryList::new();
    list.refresh(api).context("failed to load groceries")?;
    Ok(list)
}

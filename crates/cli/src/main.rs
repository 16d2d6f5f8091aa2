//! Administrative CLI for Crema.
//!
//! Drives the session manager and menu repository against the configured
//! remote project. Mutating commands sign in first with the credentials from
//! flags or `CREMA_EMAIL`/`CREMA_PASSWORD`; destructive commands additionally
//! require `--yes`.

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use crema_core::{AppConfig, ImageFile};
use crema_menu::{MenuCategory, MenuRepository, SessionManager};
use crema_remote::{AuthApi, CategoryPatch, MenuItemPatch, NewCategory, NewMenuItem};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "cremactl")]
#[command(about = "Administrative CLI for the Crema menu")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "CREMA_CONFIG",
        default_value = "config/crema.toml"
    )]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct Credentials {
    /// Admin account email
    #[arg(long, env = "CREMA_EMAIL")]
    email: String,

    /// Admin account password
    #[arg(long, env = "CREMA_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with the configured credentials and show who you are
    Whoami {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Fetch and print the menu (no sign-in required)
    Menu,
    /// Category management
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Menu item management
    Item {
        #[command(subcommand)]
        command: ItemCommands,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Image management
    Image {
        #[command(subcommand)]
        command: ImageCommands,
        #[command(flatten)]
        credentials: Credentials,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// Add a category
    Add {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Update a category's name and/or description
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a category (and, via the store's cascade, its items)
    Rm {
        id: Uuid,
        /// Confirm the deletion
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ItemCommands {
    /// Add an item to a category
    Add {
        category_id: Uuid,
        name: String,
        #[arg(long)]
        price: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Public image URL, e.g. from `cremactl image upload`
        #[arg(long, default_value = "")]
        image: String,
    },
    /// Update fields of an item
    Update {
        category_id: Uuid,
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// Delete an item
    Rm {
        category_id: Uuid,
        id: Uuid,
        /// Confirm the deletion
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ImageCommands {
    /// Upload an image and print its public URL
    Upload {
        path: PathBuf,
        /// Override the content type guessed from the file extension
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Remove an uploaded image by its public URL
    Rm {
        url: String,
        /// Confirm the deletion
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    let remote = crema_remote::from_config(&config.remote)
        .context("failed to initialize remote client")?;
    let sessions = SessionManager::new(Arc::clone(&remote));
    let menu = MenuRepository::new(Arc::clone(&remote), config.remote.image_prefix.clone());

    match cli.command {
        Commands::Whoami { credentials } => {
            sign_in(&sessions, &credentials).await?;
            match remote.get_session().await? {
                Some(session) => println!(
                    "signed in as {}",
                    session.user_email.as_deref().unwrap_or("<unknown>")
                ),
                None => println!("not signed in"),
            }
        }

        Commands::Menu => {
            menu.fetch_all().await.context("failed to fetch menu")?;
            print!("{}", render_menu(&menu.categories().await));
        }

        Commands::Category {
            command,
            credentials,
        } => {
            sign_in(&sessions, &credentials).await?;
            match command {
                CategoryCommands::Add { name, description } => {
                    let added = menu
                        .add_category(NewCategory { name, description })
                        .await
                        .context("failed to add category")?;
                    println!("added category {} ({})", added.name, added.id);
                }
                CategoryCommands::Update {
                    id,
                    name,
                    description,
                } => {
                    let patch = CategoryPatch { name, description };
                    if patch.is_empty() {
                        anyhow::bail!("nothing to update: pass --name and/or --description");
                    }
                    menu.update_category(id, &patch)
                        .await
                        .context("failed to update category")?;
                    println!("updated category {id}");
                }
                CategoryCommands::Rm { id, yes } => {
                    confirm_destructive(yes, "category")?;
                    menu.delete_category(id)
                        .await
                        .context("failed to delete category")?;
                    println!("deleted category {id}");
                }
            }
        }

        Commands::Item {
            command,
            credentials,
        } => {
            sign_in(&sessions, &credentials).await?;
            match command {
                ItemCommands::Add {
                    category_id,
                    name,
                    price,
                    description,
                    image,
                } => {
                    let row = menu
                        .add_menu_item(
                            category_id,
                            NewMenuItem {
                                name,
                                description,
                                price,
                                image,
                            },
                        )
                        .await
                        .context("failed to add menu item")?;
                    println!("added item {} ({})", row.name, row.id);
                }
                ItemCommands::Update {
                    category_id,
                    id,
                    name,
                    description,
                    price,
                    image,
                } => {
                    let patch = MenuItemPatch {
                        name,
                        description,
                        price,
                        image,
                    };
                    if patch.is_empty() {
                        anyhow::bail!(
                            "nothing to update: pass --name, --description, --price and/or --image"
                        );
                    }
                    menu.update_menu_item(category_id, id, &patch)
                        .await
                        .context("failed to update menu item")?;
                    println!("updated item {id}");
                }
                ItemCommands::Rm {
                    category_id,
                    id,
                    yes,
                } => {
                    confirm_destructive(yes, "item")?;
                    menu.delete_menu_item(category_id, id)
                        .await
                        .context("failed to delete menu item")?;
                    println!("deleted item {id}");
                }
            }
        }

        Commands::Image {
            command,
            credentials,
        } => {
            sign_in(&sessions, &credentials).await?;
            match command {
                ImageCommands::Upload { path, content_type } => {
                    let file = read_image_file(&path, content_type).await?;
                    let url = menu
                        .upload_image(&file)
                        .await
                        .context("failed to upload image")?;
                    println!("{url}");
                }
                ImageCommands::Rm { url, yes } => {
                    confirm_destructive(yes, "image")?;
                    menu.delete_image(&url)
                        .await
                        .context("failed to delete image")?;
                    println!("deleted image");
                }
            }
        }
    }

    Ok(())
}

/// Load configuration from the TOML file (optional) layered with
/// `CREMA_`-prefixed environment variables.
fn load_config(path: &str) -> Result<AppConfig> {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("CREMA_").split("__"))
        .extract()
        .context("failed to load configuration")
}

async fn sign_in(sessions: &SessionManager, credentials: &Credentials) -> Result<()> {
    sessions
        .login(&credentials.email, &credentials.password)
        .await
        .context("login failed")?;
    Ok(())
}

/// The stand-in for the admin UI's confirmation prompt.
fn confirm_destructive(yes: bool, what: &str) -> Result<()> {
    if yes {
        Ok(())
    } else {
        anyhow::bail!("refusing to delete this {what}: pass --yes to confirm")
    }
}

async fn read_image_file(path: &Path, content_type: Option<String>) -> Result<ImageFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid file name: {}", path.display()))?
        .to_string();

    let content_type = match content_type {
        Some(ct) => ct,
        None => content_type_for(&name)
            .with_context(|| format!("cannot guess content type for {name}, pass --content-type"))?
            .to_string(),
    };

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    Ok(ImageFile::new(name, content_type, Bytes::from(bytes)))
}

/// Content type for the accepted image extensions.
fn content_type_for(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn render_menu(categories: &[MenuCategory]) -> String {
    let mut out = String::new();
    if categories.is_empty() {
        out.push_str("(the menu is empty)\n");
        return out;
    }

    for category in categories {
        let _ = writeln!(out, "{}: {}", category.name, category.description);
        if category.items.is_empty() {
            let _ = writeln!(out, "  (no items)");
        }
        for item in &category.items {
            let _ = writeln!(out, "  {:<30} {:>8}  [{}]", item.name, item.price, item.id);
        }
        out.push('\n');
    }
    out
}

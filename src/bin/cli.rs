//! Chrona CLI
//!
//! Command-line interface for Chrona operations:
//! - List Canvas courses and assignments through the Scholarly API
//! - Sign in and out (profile kept on disk)
//! - Try out grid snapping and layouts
//! - Print shortcuts and a default config

use chrona::auth::{build_provider, IdentityProvider};
use chrona::config::{generate_default_config, Config};
use chrona::dashboard::{default_shortcuts, default_widgets};
use chrona::layout::{GridConfig, GridSnapController, LayoutEngine, LayoutMode, Position, Size};
use chrona::profile::{FileStore, ProfileStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chrona")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Student dashboard: Canvas courses, layouts and grid snapping")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:3000", global = true)]
    pub api_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Profile storage file (default: user data dir)
    #[arg(long, global = true)]
    pub profile_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List active courses
    Courses,

    /// List a course's assignments
    Assignments {
        /// Canvas course id
        course_id: String,
    },

    /// Show server status
    Status,

    /// Sign in with the configured provider
    Login,

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Snap a point to the grid
    Snap {
        x: f64,
        y: f64,
        /// Grid cell size in pixels
        #[arg(long, default_value = "40")]
        cell_size: f64,
        /// Snap distance in pixels (exclusive)
        #[arg(long, default_value = "20")]
        threshold: f64,
    },

    /// Arrange the default widgets
    Layout {
        /// orbital, grid, masonry or spiral
        #[arg(default_value = "orbital")]
        mode: LayoutMode,
        #[arg(long, default_value = "1440")]
        width: f64,
        #[arg(long, default_value = "900")]
        height: f64,
    },

    /// List keyboard shortcuts
    Shortcuts,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let store = match &cli.profile_file {
        Some(path) => FileStore::new(path),
        None => FileStore::default_location(),
    };
    let profiles = ProfileStore::new(store);

    match cli.command {
        Commands::Courses => {
            let courses = fetch_list(&client, &format!("{}/api/canvas/courses", cli.api_url)).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&courses)?);
            } else if courses.is_empty() {
                println!("No active courses.");
            } else {
                println!("{:<10} {:<14} {}", "ID", "Code", "Name");
                println!("{}", "-".repeat(60));
                for course in &courses {
                    println!(
                        "{:<10} {:<14} {}",
                        display_id(&course["id"]),
                        course["course_code"].as_str().unwrap_or("-"),
                        course["name"].as_str().unwrap_or("-")
                    );
                }
            }
        }

        Commands::Assignments { course_id } => {
            let url = format!(
                "{}/api/canvas/courses/{}/assignments",
                cli.api_url,
                urlencoding::encode(&course_id)
            );
            let assignments = fetch_list(&client, &url).await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&assignments)?);
            } else if assignments.is_empty() {
                println!("No assignments for course {}.", course_id);
            } else {
                println!("{:<10} {:<22} {}", "ID", "Due", "Name");
                println!("{}", "-".repeat(70));
                for assignment in &assignments {
                    println!(
                        "{:<10} {:<22} {}",
                        display_id(&assignment["id"]),
                        assignment["due_at"].as_str().unwrap_or("-"),
                        assignment["name"].as_str().unwrap_or("-")
                    );
                }
            }
        }

        Commands::Status => {
            let response = client.get(format!("{}/health", cli.api_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    println!("Scholarly v{}", health["version"].as_str().unwrap_or("?"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!("Canvas:     {}", health["canvas"].as_str().unwrap_or("unknown"));
                    println!("Sign-in:    {}", health["auth"].as_str().unwrap_or("unknown"));

                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!();
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Scholarly API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the API server is running:");
                    eprintln!("  cargo run --bin scholarly-api");
                    std::process::exit(1);
                }
            }
        }

        Commands::Login => {
            let config = Config::load_default();
            config.validate()?;

            let Some(provider) = build_provider(&config.auth)? else {
                eprintln!("Sign-in is disabled. Set SCHOLARLY_ENV=development and SCHOLARLY_AUTH_PROVIDER=mock.");
                std::process::exit(1);
            };

            let profile = sign_in(provider.as_ref()).await?;
            profiles.save(&profile)?;
            println!("Signed in as {} <{}>", profile.name, profile.email);
        }

        Commands::Logout => {
            if profiles.is_signed_in()? {
                profiles.clear()?;
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
        }

        Commands::Whoami => match profiles.load()? {
            Some(profile) if cli.format == "json" => {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            }
            Some(profile) => {
                println!("{} <{}>", profile.name, profile.email);
                println!("  provider:  {}", profile.provider);
                println!(
                    "  signed in: {}",
                    profile.signed_in_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
            None => {
                println!("Not signed in.");
            }
        },

        Commands::Snap {
            x,
            y,
            cell_size,
            threshold,
        } => {
            let grid = GridSnapController::new(GridConfig {
                cell_size,
                snap_threshold: threshold,
                ..GridConfig::default()
            });
            let result = grid.snap_to_grid(Position::new(x, y));

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "({}, {}) -> {}  [x {}, y {}]",
                    x,
                    y,
                    result.position(),
                    if result.snapped_x { "snapped" } else { "free" },
                    if result.snapped_y { "snapped" } else { "free" }
                );
            }
        }

        Commands::Layout {
            mode,
            width,
            height,
        } => {
            let widgets = default_widgets();
            let sizes: Vec<Size> = widgets.iter().map(|w| w.size).collect();
            let positions = LayoutEngine::new().compute(mode, &sizes, Size::new(width, height));

            println!("{} layout in {}x{}", mode, width, height);
            println!("{:<12} {:>10} {:>10} {:>8} {:>8}", "Widget", "X", "Y", "W", "H");
            println!("{}", "-".repeat(52));
            for (widget, position) in widgets.iter().zip(positions) {
                println!(
                    "{:<12} {:>10.1} {:>10.1} {:>8} {:>8}",
                    widget.id, position.x, position.y, widget.size.width, widget.size.height
                );
            }
        }

        Commands::Shortcuts => {
            for shortcut in default_shortcuts() {
                println!("{:<10} {}", shortcut.chord_label(), shortcut.description);
            }
        }

        Commands::Config { output } => {
            let config = generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// GET a JSON list from the API, exiting with the server's message on error
async fn fetch_list(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<serde_json::Value>, Box<dyn std::error::Error>> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("Cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        eprintln!(
            "Failed ({}): {}",
            status,
            body["error"].as_str().unwrap_or("no details")
        );
        std::process::exit(1);
    }

    Ok(response.json().await?)
}

/// Run the provider's redirect flow in-process
async fn sign_in(
    provider: &dyn IdentityProvider,
) -> Result<chrona::profile::UserProfile, Box<dyn std::error::Error>> {
    let state = uuid::Uuid::new_v4().to_string();
    let redirect = provider.authorize_url("chrona-cli:callback", &state);

    let query = redirect.split_once('?').map(|(_, q)| q).unwrap_or("");
    let param = |name: &str| {
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| urlencoding::decode(value).ok())
            .map(|value| value.into_owned())
    };

    if param("state").as_deref() != Some(state.as_str()) {
        return Err("sign-in state mismatch".into());
    }
    let code = param("code").ok_or("provider returned no code")?;

    Ok(provider.exchange_code(&code).await?)
}

fn display_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => "-".to_string(),
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

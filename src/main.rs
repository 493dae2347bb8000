use std::{fs, process::exit};

use clap::{Parser, Subcommand};
use futures::future::join_all;
use postfeed::{
    config::{ApiConfig, Config},
    FeedController, FeedState, HttpPostRepository, Post,
};
use tokio::task::JoinError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(version, about)]
struct Args {
    /// Toml configuration with an `[api]` table.
    #[clap(short, long, value_parser, default_value = "postfeed.toml")]
    config: String,

    /// Server root. Overrides the config file, which then becomes optional.
    #[clap(short, long, value_parser)]
    base_url: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the whole feed.
    List,
    /// Show a single post.
    Show {
        #[clap(value_parser)]
        id: i64,
    },
    /// Publish a new post.
    Create {
        #[clap(value_parser)]
        content: String,
    },
    /// Like the given posts, or remove the like if already liked.
    Like {
        #[clap(value_parser, required = true)]
        ids: Vec<i64>,
    },
    /// Delete a post.
    Delete {
        #[clap(value_parser)]
        id: i64,
    },
}

fn read_config(args: &Args) -> Config {
    let bytes = match fs::read(&args.config) {
        Ok(b) => Some(b),
        Err(e) if args.base_url.is_some() => {
            info!("not using {}: {}", args.config, e);
            None
        }
        Err(e) => {
            eprintln!("Failed to open {} for reading: {}", args.config, e);
            exit(1);
        }
    };

    let mut cfg = match bytes {
        Some(bytes) => match toml::from_str::<Config>(&String::from_utf8_lossy(&bytes)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Invalid config {}: {}", args.config, e);
                exit(1);
            }
        },
        None => Config { api: ApiConfig::new("") },
    };

    if let Some(base_url) = &args.base_url {
        cfg.api.base_url = base_url.clone();
    }

    cfg
}

fn print_post(post: &Post) {
    let heart = if post.liked_by_me { "♥" } else { "♡" };
    println!("#{} {} ({}) {} {}", post.id, post.author, post.published, heart, post.likes);
    println!("    {}", post.content);
}

fn print_state(state: &FeedState) {
    if state.network_error {
        println!("[server unavailable, try again later]");
    } else if state.error {
        println!("[something went wrong]");
    } else if state.empty() {
        println!("[no posts]");
    }

    for post in state.posts() {
        print_post(post);
    }
}

async fn mutate(feed: &FeedController<HttpPostRepository>, command: Command) -> Result<(), JoinError> {
    match command {
        Command::Create { content } => {
            let mut created = feed.created_events();
            feed.update_draft_content(&content);

            let Some(handle) = feed.submit_draft() else {
                eprintln!("Refusing to publish an empty post");
                exit(1);
            };
            handle.await?;

            if let Ok(post) = created.try_recv() {
                println!("Created:");
                print_post(&post);
                println!();
            }
        }
        Command::Like { ids } => {
            let mut pending = vec![];
            for id in ids {
                match feed.toggle_like(id) {
                    Some(handle) => pending.push(handle),
                    None => eprintln!("No post #{} in the feed", id),
                }
            }
            for result in join_all(pending).await {
                result?;
            }
        }
        Command::Delete { id } => {
            if feed.state().find(id).is_none() {
                eprintln!("No post #{} in the feed", id);
            }
            feed.remove(id).await?;
        }
        Command::List | Command::Show { .. } => {}
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("postfeed=info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = read_config(&args);

    let repository = match HttpPostRepository::from_config(&cfg.api) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to set up HTTP client: {}", e);
            exit(1);
        }
    };
    let feed = FeedController::new(repository);

    let finished = match args.command {
        Command::List => feed.load().await,
        Command::Show { id } => feed.load_one(id).await,
        command => {
            // Mutations work against the visible feed, like the UI does.
            let finished = feed.load().await;
            let state = feed.state();
            if finished.is_err() || state.error || state.network_error {
                finished
            } else {
                mutate(&feed, command).await
            }
        }
    };

    if let Err(e) = finished {
        error!(error = %e, "request task failed");
        exit(2);
    }

    let state = feed.state();
    print_state(&state);

    if state.error || state.network_error {
        exit(2);
    }
}

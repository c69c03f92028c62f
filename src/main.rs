use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deck_tracker::api::state::AppState;
use deck_tracker::calculate::{
    diff_collections, group_matches_by_date, normalize_opponent_stats, overview,
    sorted_by_games, summarize, CardDiff, PerformanceSummary,
};
use deck_tracker::config::AppConfig;
use deck_tracker::models::{Board, Deck, MatchResult};
use deck_tracker::storage::{DeckStore, FileStore, MatchEdit, NewMatch};

#[derive(Parser)]
#[command(name = "deck-tracker")]
#[command(about = "Track trading card game decks, matches and deck versions")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// List decks with their records
    Decks,

    /// Create an empty deck
    NewDeck {
        name: String,

        #[arg(long, default_value = "")]
        format: String,
    },

    /// Show a deck's summary, cards and match history
    Show {
        /// Deck ID or name
        deck: String,

        /// Only show matches with this result (win, loss, draw)
        #[arg(long)]
        result: Option<MatchResult>,
    },

    /// Record a match
    AddMatch {
        /// Deck ID or name
        deck: String,

        #[arg(long, default_value = "")]
        opponent: String,

        #[arg(long)]
        wins: u32,

        #[arg(long)]
        losses: u32,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Change a recorded match
    EditMatch {
        /// Deck ID or name
        deck: String,

        match_id: String,

        #[arg(long)]
        opponent: Option<String>,

        #[arg(long)]
        wins: Option<u32>,

        #[arg(long)]
        losses: Option<u32>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Delete a recorded match
    DeleteMatch {
        /// Deck ID or name
        deck: String,

        match_id: String,
    },

    /// Record against each opponent deck
    Matchups {
        /// Deck ID or name
        deck: String,
    },

    /// Statistics across all decks
    Stats {
        /// Number of recent matches to show
        #[arg(long, default_value = "5")]
        recent: usize,
    },

    /// List a deck's saved versions
    Versions {
        /// Deck ID or name
        deck: String,
    },

    /// Show card changes from one version to another (or to the current list)
    Diff {
        /// Deck ID or name
        deck: String,

        version_id: String,

        /// Version to compare against; defaults to the current cards
        #[arg(long)]
        against: Option<String>,
    },

    /// Restore a deck's cards from a saved version
    Revert {
        /// Deck ID or name
        deck: String,

        version_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    // Initialize tracing
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!("Data directory: {}", config.data_dir.display());

    let backend = Arc::new(FileStore::new(config.storage()));

    let store = DeckStore::new(backend.clone())
        .with_allow_empty_score(config.matches.allow_empty_score);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let addr = config.server.addr();
            let state = AppState::new(config, backend);
            let app = deck_tracker::api::build_router(state);

            tracing::info!("Starting deck-tracker v{}", env!("CARGO_PKG_VERSION"));
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {}", addr))?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Decks => {
            let decks = store.get_decks().await?;
            if decks.is_empty() {
                println!("No decks yet. Create one with `deck-tracker new-deck <name>`.");
            }
            for deck in &decks {
                let summary = summarize(&deck.matches);
                println!(
                    "{}  {:<30} {:<10} {}-{}-{}  {:>5.1}%  last played {}",
                    deck.id,
                    deck.name,
                    deck.format,
                    summary.wins,
                    summary.losses,
                    summary.draws,
                    summary.win_rate,
                    summary.last_played_label()
                );
            }
        }
        Commands::NewDeck { name, format } => {
            let deck = store.create_deck(&name, &format).await?;
            println!("Created deck {} ({})", deck.name, deck.id);
        }
        Commands::Show { deck, result } => {
            let deck = resolve_deck(&store, &deck).await?;
            println!("=== {} ({}) ===", deck.name, deck.format);
            println!("ID:       {}", deck.id);
            println!("Created:  {}", deck.created_at.format("%Y-%m-%d"));
            print_summary(&summarize(&deck.matches));

            println!("\nMain deck ({} cards):", deck.cards.count(Board::Main));
            for entry in deck.cards.main.values() {
                println!("  {} {}", entry.quantity, entry.card.name);
            }
            if !deck.cards.side.is_empty() {
                println!("\nSideboard ({} cards):", deck.cards.count(Board::Side));
                for entry in deck.cards.side.values() {
                    println!("  {} {}", entry.quantity, entry.card.name);
                }
            }

            let matches = deck.matches_with_result(result);
            println!("\nMatches ({}):", matches.len());
            for (day, records) in group_matches_by_date(matches).iter().rev() {
                println!("  {}", day);
                for record in records {
                    println!(
                        "    {}  {:<5} {}  vs {}{}",
                        record.id,
                        record.result(),
                        record.score(),
                        record.opponent_deck,
                        record
                            .notes
                            .as_deref()
                            .map(|n| format!("  ({})", n))
                            .unwrap_or_default()
                    );
                }
            }
        }
        Commands::AddMatch {
            deck,
            opponent,
            wins,
            losses,
            notes,
        } => {
            let deck = resolve_deck(&store, &deck).await?;
            let record = store
                .add_match(
                    deck.id.as_str(),
                    NewMatch {
                        opponent_deck: opponent,
                        game_wins: wins,
                        game_losses: losses,
                        notes,
                    },
                )
                .await?;
            println!(
                "Recorded {} {} vs {} ({})",
                record.result(),
                record.score(),
                record.opponent_deck,
                record.id
            );
        }
        Commands::EditMatch {
            deck,
            match_id,
            opponent,
            wins,
            losses,
            notes,
        } => {
            let deck = resolve_deck(&store, &deck).await?;
            let edit = MatchEdit {
                opponent_deck: opponent,
                game_wins: wins,
                game_losses: losses,
                notes,
            };
            let record = store.edit_match(deck.id.as_str(), &match_id, edit).await?;
            println!(
                "Updated {}: {} {} vs {}",
                record.id,
                record.result(),
                record.score(),
                record.opponent_deck
            );
        }
        Commands::DeleteMatch { deck, match_id } => {
            let deck = resolve_deck(&store, &deck).await?;
            let removed = store.delete_match(deck.id.as_str(), &match_id).await?;
            println!(
                "Deleted {} {} vs {}",
                removed.result(),
                removed.score(),
                removed.opponent_deck
            );
        }
        Commands::Matchups { deck } => {
            let deck = resolve_deck(&store, &deck).await?;
            let stats = sorted_by_games(normalize_opponent_stats(&deck.matches));
            if stats.is_empty() {
                println!("No matches recorded for {}.", deck.name);
            }
            for stat in &stats {
                println!(
                    "{:<30} {}-{}-{}  {:>5.1}%",
                    stat.display_name,
                    stat.wins,
                    stat.losses,
                    stat.draws,
                    stat.win_rate()
                );
            }
        }
        Commands::Stats { recent } => {
            let decks = store.get_decks().await?;
            let stats = overview(&decks, recent);
            println!("=== Collection ===");
            println!("Decks:         {}", stats.deck_count);
            println!("Matches:       {}", stats.total);
            println!(
                "Record:        {}-{}-{}",
                stats.wins, stats.losses, stats.draws
            );
            println!(
                "Win rate:      {}",
                stats
                    .win_rate
                    .map(|r| format!("{:.1}%", r))
                    .unwrap_or_else(|| "N/A".to_string())
            );
            if let Some(best) = &stats.best_deck {
                println!("Best deck:     {} ({:.1}%)", best.name, best.win_rate);
            }
            if let Some(worst) = &stats.worst_deck {
                println!("Worst deck:    {} ({:.1}%)", worst.name, worst.win_rate);
            }
            if !stats.recent_matches.is_empty() {
                println!("\nRecent matches:");
                for recent in &stats.recent_matches {
                    println!(
                        "  {}  {:<20} {:<5} {}  vs {}",
                        recent.record.date().format("%Y-%m-%d"),
                        recent.deck_name,
                        recent.record.result(),
                        recent.record.score(),
                        recent.record.opponent_deck
                    );
                }
            }
        }
        Commands::Versions { deck } => {
            let deck = resolve_deck(&store, &deck).await?;
            if deck.versions.is_empty() {
                println!("No saved versions for {}.", deck.name);
            }
            for (i, version) in deck.versions.iter().enumerate() {
                println!(
                    "#{:<3} {}  {}  main {} / side {}",
                    i + 1,
                    version.id,
                    version.timestamp.format("%Y-%m-%d %H:%M"),
                    version.cards.count(Board::Main),
                    version.cards.count(Board::Side)
                );
            }
        }
        Commands::Diff {
            deck,
            version_id,
            against,
        } => {
            let deck = resolve_deck(&store, &deck).await?;
            let base = deck
                .find_version(&version_id)
                .with_context(|| format!("version {} not found in {}", version_id, deck.name))?;
            let target = match &against {
                Some(other) => {
                    &deck
                        .find_version(other)
                        .with_context(|| format!("version {} not found in {}", other, deck.name))?
                        .cards
                }
                None => &deck.cards,
            };

            let diff = diff_collections(&base.cards, target);
            if diff.is_empty() {
                println!("No changes.");
            }
            print_board_diff("Main deck", &diff.main);
            print_board_diff("Sideboard", &diff.side);
        }
        Commands::Revert { deck, version_id } => {
            let deck = resolve_deck(&store, &deck).await?;
            let deck = store.revert_to_version(deck.id.as_str(), &version_id).await?;
            println!(
                "Reverted {} to version {} ({} main / {} side)",
                deck.name,
                version_id,
                deck.cards.count(Board::Main),
                deck.cards.count(Board::Side)
            );
        }
    }

    Ok(())
}

/// Find a deck by ID, falling back to a case-insensitive name match.
async fn resolve_deck(store: &DeckStore, ident: &str) -> Result<Deck> {
    if let Some(deck) = store.get_deck(ident).await? {
        return Ok(deck);
    }

    let wanted = ident.trim().to_lowercase();
    let mut found: Vec<Deck> = store
        .get_decks()
        .await?
        .into_iter()
        .filter(|d| d.name.to_lowercase() == wanted)
        .collect();
    match found.len() {
        0 => bail!("No deck with ID or name {:?}", ident),
        1 => Ok(found.remove(0)),
        n => bail!("{} decks are named {:?}; use the deck ID", n, ident),
    }
}

fn print_summary(summary: &PerformanceSummary) {
    println!(
        "Record:   {}-{}-{} ({} matches)",
        summary.wins, summary.losses, summary.draws, summary.total
    );
    println!("Win rate: {:.1}%", summary.win_rate);
    println!(
        "Streaks:  current {}, best {}, worst {}",
        summary.current_streak, summary.best_win_streak, summary.worst_loss_streak
    );
    println!("Last:     {}", summary.last_played_label());
}

fn print_board_diff(label: &str, diff: &CardDiff) {
    if diff.is_empty() {
        return;
    }
    println!("{}:", label);
    for entry in &diff.added {
        println!("  +{} {}", entry.quantity, entry.card.name);
    }
    for entry in &diff.removed {
        println!("  -{} {}", entry.quantity, entry.card.name);
    }
}

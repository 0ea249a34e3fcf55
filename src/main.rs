use colored::Colorize;
use env_logger::Env;
use log::{error, info};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use text_io::read;
use thiserror::Error;

mod libwordbank;

use crate::libwordbank::db;
use crate::libwordbank::db::{Answer, Item};
use crate::libwordbank::scramble;

#[derive(Parser, Debug)]
#[command(name = "wordbank")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, default_value = "info")]
    log_level: String,
    #[arg(short, long, value_name = "FILE", default_value = "wordbank.db")]
    db: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every stored item
    List,
    /// Print one item
    Get { id: i32 },
    /// Print every item in a category
    Category { name: String },
    /// Enter a new item interactively
    Add,
    /// Create items from a JSON array file
    Import { file: PathBuf },
    /// Write every stored item to a JSON file
    Export { file: PathBuf },
    /// Copy an item under a new id
    Duplicate { id: i32 },
    /// Replace an item with the one in a JSON file
    Update { id: i32, file: PathBuf },
    /// Delete an item
    Delete { id: i32 },
    /// Randomly reorder the answers of one item
    Scramble { id: i32 },
    /// Randomly reorder the answers of every item
    ScrambleAll,
}

#[derive(Debug, Error)]
enum Error {
    #[error("cannot read file: {0}")]
    File(#[from] io::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] db::Error),
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_level)).init();

    let conn = match db::create_or_open(&args.db) {
        Ok(conn) => conn,
        Err(err) => {
            error!("{}{}", "Unable to open Database: ".red(), err);
            exit(1);
        }
    };

    match run(&conn, args.command) {
        Ok(()) => db::close_db(conn).unwrap(),
        Err(err) => {
            error!("{}", err.to_string().red());
            db::close_db(conn).unwrap();
            exit(1);
        }
    }
}

fn run(conn: &Connection, command: Commands) -> Result<(), Error> {
    match command {
        Commands::List => {
            let items = Item::get_all(conn)?;
            info!("{}", format!("{} items stored.", items.len()).cyan());
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Commands::Get { id } => {
            let item = Item::get_by_id(conn, id)?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        Commands::Category { name } => {
            let items = Item::get_in_category(conn, &name)?;
            info!(
                "{}",
                format!("Found {} items in category '{}'", items.len(), name).cyan()
            );
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Commands::Add => {
            let item = read_item();
            let id = Item::add(conn, &item)?;
            info!("{}", format!("Created Item {}", id).green());
        }
        Commands::Import { file } => {
            let json = fs::read_to_string(&file)?;
            let items: Vec<Item> = serde_json::from_str(&json)?;
            info!("{}", format!("Importing {} items...", items.len()).blue());
            let ids = Item::add_batch(conn, &items)?;
            for id in &ids {
                info!("{}", format!("├ Created Item {}", id).green());
            }
            info!("{}", format!("Imported {} items.", ids.len()).blue());
        }
        Commands::Export { file } => {
            let items = Item::get_all(conn)?;
            fs::write(&file, serde_json::to_string_pretty(&items)?)?;
            info!(
                "{}",
                format!("Exported {} items to {:?}", items.len(), file).blue()
            );
        }
        Commands::Duplicate { id } => {
            let new_id = Item::duplicate(conn, id)?;
            info!(
                "{}",
                format!("Duplicated Item {} as Item {}", id, new_id).green()
            );
        }
        Commands::Update { id, file } => {
            let json = fs::read_to_string(&file)?;
            let item: Item = serde_json::from_str(&json)?;
            Item::update(conn, id, &item)?;
            info!("{}", format!("Updated Item {}", id).green());
        }
        Commands::Delete { id } => {
            Item::delete(conn, id)?;
            info!("{}", format!("Deleted Item {}", id).green());
        }
        Commands::Scramble { id } => {
            let item = scramble::scramble_by_id(conn, id)?;
            info!("{}", format!("Scrambled answers of Item {}", id).green());
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        Commands::ScrambleAll => {
            let items = scramble::scramble_all(conn)?;
            info!(
                "{}",
                format!("Scrambled answers of {} items.", items.len()).green()
            );
        }
    }
    Ok(())
}

fn read_item() -> Item {
    print!("{} ", "Category:".cyan());
    let category: String = read!("{}\n");
    print!("{} ", "Question:".cyan());
    let question: String = read!("{}\n");
    print!("{} ", "Target word:".cyan());
    let target_word: String = read!("{}\n");

    let mut answers = Vec::new();
    loop {
        print!(
            "{} ",
            format!("Answer {} (empty to stop):", answers.len() + 1).cyan()
        );
        let option: String = read!("{}\n");
        if option.is_empty() {
            break;
        }
        print!("{} ", "Image URL (empty for none):".cyan());
        let url: String = read!("{}\n");
        answers.push(Answer {
            option,
            url: if url.is_empty() { None } else { Some(url) },
        });
    }

    print!(
        "{} ",
        format!("Correct answer (1-{}):", answers.len()).cyan()
    );
    let correct_string: String = read!("{}\n");
    let correct = correct_string
        .parse::<usize>()
        .unwrap_or(1)
        .saturating_sub(1);

    Item {
        id: None,
        category,
        question,
        target_word,
        answers,
        correct,
    }
}

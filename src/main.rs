//! Manga Scanner CLI
//!
//! Scans a manga library directory into a catalog, using a per-library
//! cache to skip unchanged titles on repeated runs.

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

use manga_scanner::{ScanConfig, Scanner};

/// Manga library scanner with hybrid timestamp-validated caching
#[derive(Parser)]
#[command(name = "manga_scanner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a library root and print the resulting catalog
    Scan {
        /// Library root directory
        #[arg(short, long)]
        root: PathBuf,

        /// Worker pool width for parallel title scanning
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Skip the cache and scan everything from disk
        #[arg(long)]
        no_cache: bool,

        /// Output the full catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show information about a library's cache file
    CacheInfo {
        /// Library root directory
        #[arg(short, long)]
        root: PathBuf,
    },

    /// Delete a library's cache file
    ClearCache {
        /// Library root directory
        #[arg(short, long)]
        root: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            root,
            workers,
            no_cache,
            json,
        } => {
            let config = ScanConfig::builder()
                .max_workers(workers)
                .cache_enabled(!no_cache)
                .build();
            let scanner = Scanner::new(config);

            info!("Scanning library: {:?}", root);
            let library = match scanner.scan_library(&root) {
                Ok(library) => library,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            if json {
                match serde_json::to_string_pretty(&library) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error: failed to serialize catalog: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                println!("Scan completed:");
                println!("  Mangas:   {}", library.total_mangas);
                println!("  Chapters: {}", library.total_chapters);
                println!("  Pages:    {}", library.total_pages);
                for manga in &library.mangas {
                    println!(
                        "  - {} ({} chapters, {} pages)",
                        manga.title, manga.chapter_count, manga.total_pages
                    );
                }
            }
        }
        Commands::CacheInfo { root } => {
            let scanner = Scanner::default();
            let cache_info = scanner.cache_info(&root);
            match serde_json::to_string_pretty(&cache_info) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        Commands::ClearCache { root } => {
            let scanner = Scanner::default();
            match scanner.clear_cache(&root) {
                Ok(true) => println!("Cache cleared"),
                Ok(false) => println!("No cache file found"),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}

use chrono::{Datelike, Local};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

mod config;
mod media;
mod state;

use config::{ConfigError, GalleryConfig};
use media::MediaError;
use state::collection::Gallery;
use state::data::{Artwork, ArtworkDraft, ArtworkId, Direction, Filter, KNOWN_TOOLS};
use state::error::{GalleryError, StorageError};
use state::storage::{ArtworkStorage, SqliteStore};

#[derive(Parser)]
#[command(
    name = "artwork-gallery",
    version,
    about = "A personal gallery of AI-generated artwork, filterable by generation tool"
)]
struct Cli {
    /// Database file to use instead of the configured one
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List artworks visible under a filter
    List {
        /// Tool to show, or "All"
        #[arg(long, default_value = "All")]
        filter: Filter,
    },

    /// Upload an image as a new artwork
    Add {
        /// Image file to embed
        image: PathBuf,
        #[command(flatten)]
        details: DetailArgs,
    },

    /// Replace an artwork's details, keeping its id
    Edit {
        id: ArtworkId,
        /// New image file to embed
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        tool: Option<String>,
        #[arg(long)]
        series: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        prompt: Option<String>,
    },

    /// Delete an artwork
    Delete {
        id: ArtworkId,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Open an artwork, optionally stepping to its neighbour
    Show {
        id: ArtworkId,
        /// Filter the neighbours are taken from
        #[arg(long, default_value = "All")]
        filter: Filter,
        #[arg(long, conflicts_with = "next")]
        prev: bool,
        #[arg(long)]
        next: bool,
        /// Write the embedded image to this file
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,
    },

    /// Add every image in a folder (recursively) with the same details
    Import {
        folder: PathBuf,
        #[command(flatten)]
        details: DetailArgs,
    },

    /// List known tools and the tools in use
    Tools,
}

/// Details shared by uploads and folder imports
#[derive(Args)]
struct DetailArgs {
    /// Generation tool the artwork is filed under
    #[arg(long)]
    tool: String,
    #[arg(long)]
    series: String,
    /// Defaults to the current year
    #[arg(long)]
    year: Option<i32>,
    /// Defaults to the current month
    #[arg(long)]
    month: Option<u32>,
    #[arg(long)]
    prompt: String,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Gallery(#[from] GalleryError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("failed to read confirmation: {0}")]
    Prompt(#[from] io::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Result of a folder import operation
#[derive(Debug, Clone, Default)]
struct ImportResult {
    imported_count: usize,
    skipped_count: usize,
}

/// Command-line front end over the gallery.
///
/// Renders state to stdout and forwards each command to the store.
struct App {
    gallery: Gallery<SqliteStore>,
}

impl App {
    fn open(db_path: PathBuf) -> Result<Self, AppError> {
        let storage = ArtworkStorage::new(SqliteStore::open(&db_path)?);
        let mut gallery = Gallery::open(storage)?;
        gallery.subscribe(|event| debug!(?event, "gallery changed"));

        Ok(App { gallery })
    }

    /// Handle one command to completion
    fn run(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::List { filter } => {
                self.gallery.set_filter(filter);
                self.print_visible();
                Ok(())
            }
            Command::Add { image, details } => {
                self.gallery.set_filter(Filter::named(&details.tool));
                let mut draft = self.upload_template(&details)?;
                draft.image_url = media::encode_file(&image)?;
                validate(&draft)?;
                let artwork = self.gallery.add(draft)?;

                println!("Added artwork {} to {}.", artwork.id, artwork.tool);
                Ok(())
            }
            Command::Edit {
                id,
                image,
                tool,
                series,
                year,
                month,
                prompt,
            } => {
                let current = self
                    .gallery
                    .get(id)
                    .ok_or(GalleryError::NotFound(id))?;

                // Pre-fill the form from the current values
                let mut draft = current.draft();
                if let Some(image) = image {
                    draft.image_url = media::encode_file(&image)?;
                }
                if let Some(tool) = tool {
                    draft.tool = tool;
                }
                if let Some(series) = series {
                    draft.series = series;
                }
                if let Some(year) = year {
                    draft.year = year;
                }
                if let Some(month) = month {
                    draft.month = month;
                }
                if let Some(prompt) = prompt {
                    draft.prompt = prompt;
                }
                validate(&draft)?;

                let artwork = self.gallery.edit(id, draft)?;
                println!("Updated artwork {}.", artwork.id);
                Ok(())
            }
            Command::Delete { id, yes } => {
                if !self.gallery.is_user_created(id) {
                    return Err(GalleryError::NotFound(id).into());
                }
                if !yes && !confirm(&format!("Are you sure you want to delete artwork {}?", id))? {
                    println!("Kept artwork {}.", id);
                    return Ok(());
                }

                self.gallery.delete(id)?;
                println!("Deleted artwork {}.", id);
                Ok(())
            }
            Command::Show {
                id,
                filter,
                prev,
                next,
                export,
            } => {
                self.gallery.set_filter(filter);
                self.gallery.select(Some(id))?;

                let direction = match (prev, next) {
                    (true, _) => Some(Direction::Prev),
                    (_, true) => Some(Direction::Next),
                    _ => None,
                };
                if let Some(direction) = direction {
                    if self.gallery.navigate(direction).is_none() {
                        println!("Artwork {} is not visible under {}; staying put.", id, self.gallery.filter());
                    }
                }

                let Some(artwork) = self.gallery.selection() else {
                    return Err(GalleryError::NotFound(id).into());
                };
                print_artwork(artwork, self.gallery.is_user_created(artwork.id));

                if let Some(path) = export {
                    let (image, written) = media::export(&artwork.image_url, &path)?;
                    println!("Exported {} ({} bytes) to {}.", image.mime, image.bytes.len(), written.display());
                }
                Ok(())
            }
            Command::Import { folder, details } => {
                let result = self.import_folder(&folder, &details)?;

                println!(
                    "Import complete! Added {} artworks, skipped {} files.",
                    result.imported_count, result.skipped_count
                );
                Ok(())
            }
            Command::Tools => {
                let mut counts: BTreeMap<&str, usize> =
                    KNOWN_TOOLS.iter().map(|tool| (*tool, 0)).collect();
                for artwork in self.gallery.artworks() {
                    *counts.entry(artwork.tool.as_str()).or_default() += 1;
                }

                for (tool, count) in counts {
                    let marker = if KNOWN_TOOLS.contains(&tool) { "" } else { " (custom)" };
                    println!("{:<16} {:>4}{}", tool, count, marker);
                }
                println!(
                    "{} artworks in {}",
                    self.gallery.artworks().len(),
                    self.gallery.storage().backend().path().display()
                );
                Ok(())
            }
        }
    }

    /// Build a draft tagged with the active filter's tool, with no image yet.
    /// Every field but the image is validated.
    fn upload_template(&self, details: &DetailArgs) -> Result<ArtworkDraft, AppError> {
        let tool = self
            .gallery
            .upload_tool()
            .ok_or_else(|| AppError::Invalid("choose a tool to upload to, not \"All\"".into()))?;

        let today = Local::now();
        let draft = ArtworkDraft {
            image_url: String::new(),
            tool: tool.to_string(),
            series: details.series.clone(),
            year: details.year.unwrap_or_else(|| today.year()),
            month: details.month.unwrap_or_else(|| today.month()),
            prompt: details.prompt.clone(),
        };

        let missing: Vec<_> = draft
            .missing_fields()
            .into_iter()
            .filter(|field| *field != "image")
            .collect();
        if !missing.is_empty() {
            return Err(invalid(&missing));
        }
        Ok(draft)
    }

    /// Import every image file under `folder`.
    /// Unreadable or unrecognised files are skipped; a failed save stops the import.
    fn import_folder(&mut self, folder: &std::path::Path, details: &DetailArgs) -> Result<ImportResult, AppError> {
        let mut result = ImportResult::default();
        self.gallery.set_filter(Filter::named(&details.tool));
        let template = self.upload_template(details)?;
        info!(folder = %folder.display(), "scanning folder");

        // Walk the directory tree recursively
        for entry in WalkDir::new(folder)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !media::is_image_path(path) {
                continue;
            }

            let image_url = match media::encode_file(path) {
                Ok(url) => url,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping file");
                    result.skipped_count += 1;
                    continue;
                }
            };

            self.gallery.add(ArtworkDraft {
                image_url,
                ..template.clone()
            })?;
            result.imported_count += 1;
            if result.imported_count % 100 == 0 {
                info!(count = result.imported_count, "import progress");
            }
        }

        info!(
            imported = result.imported_count,
            skipped = result.skipped_count,
            "import complete"
        );
        Ok(result)
    }

    fn print_visible(&self) {
        let visible = self.gallery.visible();
        if visible.is_empty() {
            println!("No artworks under {}.", self.gallery.filter());
            return;
        }

        for artwork in &visible {
            println!(
                "{:>14}  {:<12} {:<24} {}-{:02}  {}",
                artwork.id,
                artwork.tool,
                truncate(&artwork.series, 24),
                artwork.year,
                artwork.month,
                truncate(&artwork.prompt, 48),
            );
        }
        println!("{} of {} artworks shown ({}).", visible.len(), self.gallery.artworks().len(), self.gallery.filter());
    }
}

fn print_artwork(artwork: &Artwork, editable: bool) {
    println!("Artwork {}", artwork.id);
    println!("  Tool:     {}", artwork.tool);
    println!("  Series:   {}", artwork.series);
    println!("  Date:     {}-{:02}", artwork.year, artwork.month);
    println!("  Image:    {} bytes embedded", artwork.image_url.len());
    println!("  Editable: {}", if editable { "yes" } else { "no" });
    println!("  Prompt:");
    for line in artwork.prompt.lines() {
        println!("    {}", line);
    }
}

fn validate(draft: &ArtworkDraft) -> Result<(), AppError> {
    let missing = draft.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(invalid(&missing))
    }
}

fn invalid(fields: &[&str]) -> AppError {
    AppError::Invalid(format!("missing or invalid: {}", fields.join(", ")))
}

/// Ask a yes/no question on stdin; anything but "y"/"yes" is no
fn confirm(question: &str) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn truncate(text: &str, max: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() <= max && !text.contains('\n') {
        return first_line.to_string();
    }
    let cut: String = first_line.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artwork_gallery=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<(), AppError> {
    let db_path = match cli.db {
        Some(path) => path,
        None => GalleryConfig::from_env()?.db_path,
    };

    let mut app = App::open(db_path)?;
    app.run(cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(tool: &str) -> DetailArgs {
        DetailArgs {
            tool: tool.into(),
            series: "Dreams".into(),
            year: Some(2024),
            month: Some(5),
            prompt: "a fox in snow".into(),
        }
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["artwork-gallery", "--db", "/tmp/x.db", "list", "--filter", "Nanobanana"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        assert!(matches!(cli.command, Command::List { filter: Filter::Tool(ref t) } if t == "Nanobanana"));

        let cli = Cli::try_parse_from(["artwork-gallery", "show", "5", "--prev", "--next"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("one\ntwo", 10), "one…");
    }

    #[test]
    fn test_add_import_edit_delete_through_app() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images");
        std::fs::create_dir_all(images.join("nested")).unwrap();
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        std::fs::write(images.join("a.png"), png).unwrap();
        std::fs::write(images.join("nested").join("b.png"), png).unwrap();
        std::fs::write(images.join("broken.png"), b"not an image").unwrap();
        std::fs::write(images.join("notes.txt"), b"ignored").unwrap();

        let db_path = dir.path().join("gallery.db");
        let mut app = App::open(db_path.clone()).unwrap();

        app.run(Command::Add {
            image: images.join("a.png"),
            details: details("Midjourney"),
        })
        .unwrap();
        let result = app.import_folder(&images, &details("Nanobanana")).unwrap();
        assert_eq!(result.imported_count, 2);
        assert_eq!(result.skipped_count, 1);
        assert_eq!(app.gallery.artworks().len(), 3);

        let id = app.gallery.artworks()[0].id;
        app.run(Command::Edit {
            id,
            image: None,
            tool: None,
            series: Some("Renamed".into()),
            year: None,
            month: None,
            prompt: None,
        })
        .unwrap();
        assert_eq!(app.gallery.get(id).unwrap().series, "Renamed");
        assert_eq!(app.gallery.get(id).unwrap().tool, "Nanobanana");

        app.run(Command::Delete { id, yes: true }).unwrap();
        drop(app);

        let reopened = App::open(db_path).unwrap();
        assert_eq!(reopened.gallery.artworks().len(), 2);
        assert!(!reopened.gallery.is_user_created(id));
    }

    #[test]
    fn test_add_rejects_all_and_invalid_month() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("a.png");
        std::fs::write(&image, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();
        let mut app = App::open(dir.path().join("gallery.db")).unwrap();

        let err = app
            .run(Command::Add {
                image: image.clone(),
                details: details("All"),
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));

        let mut bad_month = details("Midjourney");
        bad_month.month = Some(13);
        let err = app
            .run(Command::Add {
                image,
                details: bad_month,
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));
        assert!(app.gallery.artworks().is_empty());
    }

    #[test]
    fn test_import_checks_details_before_walking() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty");
        std::fs::create_dir_all(&empty).unwrap();
        let mut app = App::open(dir.path().join("gallery.db")).unwrap();

        let err = app.import_folder(&empty, &details("All")).unwrap_err();
        assert!(matches!(err, AppError::Invalid(_)));

        let mut bad_month = details("Midjourney");
        bad_month.month = Some(13);
        let err = app.import_folder(&empty, &bad_month).unwrap_err();
        assert!(matches!(err, AppError::Invalid(ref msg) if msg.contains("month")));

        let result = app.import_folder(&empty, &details("Midjourney")).unwrap();
        assert_eq!(result.imported_count, 0);
    }
}

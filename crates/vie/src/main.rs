mod action;
mod editor;
mod event;
mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use vie_text::Document;

use crate::editor::Editor;

/// Headless front end: feeds a key script to the editor and prints the
/// resulting screen.
#[derive(Parser)]
struct Cli {
    /// File to open. Without one, the document is empty.
    file: Option<PathBuf>,

    /// Terminal height, including the status line.
    #[arg(long, default_value_t = 24)]
    height: usize,

    /// Terminal width.
    #[arg(long, default_value_t = 80)]
    width: usize,

    /// Keys to play, e.g. `3Gihello<esc>`.
    #[arg(long, default_value = "")]
    keys: String,

    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long, default_value = "debug")]
    log_level: log::LevelFilter,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_file = match args.log_file {
        Some(path) => path,
        None => default_log_file()?,
    };
    init_logging(&log_file, args.log_level).context("couldn't initialise logging")?;

    let document = match &args.file {
        Some(path) => open(path)?,
        None => Document::new(),
    };

    let events = event::parse_script(&args.keys).context("couldn't parse key script")?;

    let mut editor = Editor::new(document, args.height, args.width);
    if let Some(path) = &args.file {
        editor.set_message(format!(
            "\"{}\" {} lines",
            path.display(),
            editor.document().count()
        ));
    }

    for event in events {
        if editor.handle_event(event).is_break() {
            log::info!("quit");
            break;
        }
    }

    let mut stdout = std::io::stdout().lock();
    render::render(&editor, &mut stdout).context("couldn't draw screen")?;

    Ok(())
}

fn open(path: &Path) -> Result<Document> {
    let bytes =
        std::fs::read(path).with_context(|| format!("couldn't read {}", path.display()))?;

    let document = Document::from_bytes(&bytes)
        .with_context(|| format!("couldn't load {}", path.display()))?;

    log::info!("opened {} ({} lines)", path.display(), document.count());

    Ok(document)
}

fn default_log_file() -> Result<PathBuf> {
    let Some(project_dirs) = ProjectDirs::from("", "", "vie") else {
        return Ok(PathBuf::from("vie.log"));
    };

    std::fs::create_dir_all(project_dirs.data_dir())
        .context("couldn't create data directory")?;

    Ok(project_dirs.data_dir().join("vie.log"))
}

fn init_logging(path: &Path, level: log::LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            let now = chrono::Local::now();

            out.finish(format_args!(
                "[{} {} {}] {}",
                now.format("%Y/%m/%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(fern::log_file(path)?)
        .apply()?;

    Ok(())
}

mod app;
mod ui;

use anyhow::Result;
use app::App;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use folio_config::Config;
use folio_engine::{FsPostStore, ImageUploader, LocalUploader, PostStore, io};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    env,
    fs::File,
    io::{Stdout, stdout},
    process,
    sync::Arc,
    time::Duration,
};

const USAGE: &str = "[--new | <post-slug>]";

fn init_logging() {
    // The terminal belongs to the UI, so log lines go to a file instead
    let log_path = env::temp_dir().join("folio-cli.log");
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(log::LevelFilter::Info)
        .parse_default_env();
    if let Ok(file) = File::create(&log_path) {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();
    log::info!("folio-cli starting up");

    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => {
            eprintln!("Error: No config file found");
            eprintln!(
                "Create {} with posts_path and uploads_path",
                config_path.display()
            );
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = io::validate_posts_dir(&config.posts_path) {
        eprintln!(
            "Error: Posts path '{}' from config file '{}' is invalid: {e}",
            config.posts_path.display(),
            config_path.display()
        );
        process::exit(1);
    }

    let store = FsPostStore::new(&config.posts_path);
    let local_uploader = LocalUploader::new(&config.uploads_path, config.uploads_url_prefix.as_str());
    log::info!(
        "Posts in {}, uploads in {}",
        store.root().display(),
        local_uploader.dir().display()
    );
    let uploader: Arc<dyn ImageUploader> = Arc::new(local_uploader);

    let mut app = match args.as_slice() {
        [_] => {
            list_posts(&store)?;
            return Ok(());
        }
        [_, flag] if flag == "--new" => App::new_post(store, uploader),
        [_, slug] => match App::open(store, uploader, slug) {
            Ok(app) => app,
            Err(e) => {
                eprintln!("Error: Cannot open post '{slug}': {e}");
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: {} {USAGE}", args[0]);
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }
    if app.deleted {
        println!("Deleted post '{}'", app.post.slug);
    } else if app.is_dirty() {
        println!("Quit with unsaved changes to '{}'", app.post.slug);
    }

    Ok(())
}

fn list_posts(store: &FsPostStore) -> Result<()> {
    let posts = store.list()?;
    if posts.is_empty() {
        println!("No posts in {}", store.root().display());
        return Ok(());
    }
    for post in posts {
        println!("{}  {:<32} {}", post.date, post.slug, post.title);
    }
    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.poll_uploads();
        terminal.draw(|f| ui::ui(f, app))?;

        // Poll so finished uploads show up without waiting for a key press
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.handle_key(key.code)
        {
            return Ok(());
        }
    }
}

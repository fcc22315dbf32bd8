use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use otto_popup::command::{CommandSink, DryRunSink, ShellCommandSink};
use otto_popup::config::Config;
use otto_popup::geometry::{Point, Rect};
use otto_popup::menu::MenuFile;
use otto_popup::monitor::MonitorLayout;
use otto_popup::popup::{ItemEvent, PopupId, PopupTree};
use otto_popup::window::HeadlessDisplay;

/// Lay out and cascade popup menus on a headless display
#[derive(Debug, Parser)]
#[command(name = "otto-popup", version)]
struct Args {
    /// Menu definition file
    menu: PathBuf,

    /// Popup configuration file, replacing the layered lookup
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monitor size as WIDTHxHEIGHT
    #[arg(long, default_value = "1920x1080")]
    monitor: String,

    /// Point to open the root popup at, as X,Y
    #[arg(long, default_value = "100,100")]
    at: String,

    /// Open the popup registered under this bang instead of the first menu
    #[arg(long)]
    bang: Option<String>,

    /// Folder items to hover in turn, as item indices separated by '/'
    #[arg(long)]
    open: Option<String>,

    /// Click this item of the innermost open popup
    #[arg(long)]
    click: Option<usize>,

    /// Run commands instead of only logging them
    #[arg(long)]
    execute: bool,
}

fn main() -> Result<()> {
    if let Ok(env_filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("info")
            .compact()
            .init();
    }

    let args = Args::parse();
    if args.execute {
        run(&args, ShellCommandSink::new())
    } else {
        run(&args, DryRunSink::new())
    }
}

fn run<C: CommandSink>(args: &Args, commands: C) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load(),
    };
    let menu = MenuFile::from_path(&args.menu)?;

    let (width, height) = parse_pair(&args.monitor, 'x').context("invalid --monitor")?;
    let (x, y) = parse_pair(&args.at, ',').context("invalid --at")?;

    let mut display = HeadlessDisplay::new();
    let mut tree = PopupTree::new(
        MonitorLayout::single(Rect::from_xywh(0, 0, width, height)),
        commands,
    );
    let roots = menu.build(&mut tree, &mut display, &config)?;

    let root = match &args.bang {
        Some(bang) => match tree.find_by_bang(bang) {
            Some(id) => id,
            None => bail!("no menu registered for {bang}"),
        },
        None => match roots.first() {
            Some(id) => *id,
            None => bail!("{} defines no menu", args.menu.display()),
        },
    };
    tree.show_at(root, Point::new(x, y))?;

    let mut current = root;
    if let Some(path) = &args.open {
        for step in path.split('/').filter(|s| !s.is_empty()) {
            let index: usize = step
                .parse()
                .with_context(|| format!("invalid item index '{step}' in --open"))?;
            tree.item_event(current, index, ItemEvent::PointerEnter)?;
            match tree.get(current)?.open_child() {
                Some(child) => current = child,
                None => bail!("item {index} of '{}' is not a folder", tree.get(current)?.title()),
            }
        }
    }

    if let Some(index) = args.click {
        for event in [ItemEvent::PointerEnter, ItemEvent::ButtonDown, ItemEvent::ButtonUp] {
            tree.item_event(current, index, event)?;
        }
    }

    report(&tree, &display, root)
}

fn report<C: CommandSink>(
    tree: &PopupTree<MonitorLayout, C>,
    display: &HeadlessDisplay,
    root: PopupId,
) -> Result<()> {
    let mut next = Some(root);
    while let Some(id) = next {
        let popup = tree.get(id)?;
        let Some(window) = display.snapshot(popup.window_id()) else {
            break;
        };
        tracing::info!(
            "popup '{}': {:?} at ({}, {}) size {}x{} columns {} expand_left {}",
            popup.title(),
            popup.state(),
            window.position.x,
            window.position.y,
            window.size.0,
            window.size.1,
            popup.layout().map(|l| l.columns).unwrap_or(1),
            popup.expand_left()
        );
        for item in popup.items() {
            let position = item.position();
            tracing::debug!(
                "  '{}' at ({}, {}) {}x{}",
                item.title(),
                position.x,
                position.y,
                item.width(),
                item.height()
            );
        }
        next = popup.open_child();
    }
    Ok(())
}

fn parse_pair(value: &str, separator: char) -> Result<(i32, i32)> {
    let Some((first, second)) = value.split_once(separator) else {
        bail!("expected two numbers separated by '{separator}', got '{value}'");
    };
    Ok((first.trim().parse()?, second.trim().parse()?))
}

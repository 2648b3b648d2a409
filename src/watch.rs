//! Watch mode: rebuild the PDF whenever the source file changes.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::{Config, convert_with_config};

pub struct WatchCommand {
    pub output: Option<PathBuf>,
    pub config: Config,
    pub workspace: Option<PathBuf>,
    pub verbose: bool,
}

#[derive(Debug)]
pub enum WatchError {
    Io(std::io::Error),
    Notify(notify::Error),
}

impl std::fmt::Display for WatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Notify(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for WatchError {}

pub fn watch_input(path: &Path, command: &WatchCommand) -> Result<(), WatchError> {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .map_err(WatchError::Notify)?;

    let watch_path = canonicalize(path);
    watcher
        .watch(&watch_path, RecursiveMode::NonRecursive)
        .map_err(WatchError::Notify)?;
    println!("watching {}", watch_path.display());

    loop {
        let event = rx
            .recv()
            .map_err(|e| WatchError::Io(std::io::Error::other(e.to_string())))?;
        match event {
            Ok(Event {
                kind: EventKind::Modify(_) | EventKind::Create(_),
                paths,
                ..
            }) => {
                if !paths.iter().any(|changed| canonicalize(changed) == watch_path) {
                    continue;
                }

                match convert_with_config(
                    path,
                    command.output.as_deref(),
                    command.workspace.as_deref(),
                    &command.config,
                ) {
                    Err(err) => eprintln!("[watch] failed: {err}"),
                    Ok(destination) if command.verbose => {
                        println!("[watch] updated {}", destination.display());
                    }
                    Ok(_) => {}
                }
            }
            Ok(_) => {}
            Err(err) => return Err(WatchError::Notify(err)),
        }
    }
}

fn canonicalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

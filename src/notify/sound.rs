use anyhow::Result;
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::notify::{ChangeEvent, Notifier};

/// A command line able to play an alert sound.
#[derive(Debug, Clone)]
pub struct Player {
    pub program: String,
    pub sound: String,
}

impl Player {
    pub fn new(program: &str, sound: &str) -> Self {
        Self {
            program: program.to_string(),
            sound: sound.to_string(),
        }
    }
}

pub fn default_players() -> Vec<Player> {
    vec![
        Player::new("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
        Player::new("paplay", "/usr/share/sounds/freedesktop/stereo/bell.oga"),
        Player::new("aplay", "/usr/share/sounds/alsa/Front_Center.wav"),
    ]
}

/// Plays the first available alert sound without waiting for it to finish.
/// Falls back to the terminal bell.
pub struct SoundNotifier {
    players: Vec<Player>,
}

impl SoundNotifier {
    pub fn new() -> Self {
        Self::with_players(default_players())
    }

    pub fn with_players(players: Vec<Player>) -> Self {
        Self { players }
    }

    /// Returns the program that was started, if any.
    fn spawn_player(&self) -> Option<&str> {
        for player in &self.players {
            let Some(path) = find_on_path(&player.program) else {
                continue;
            };

            // Dropping the child detaches it; tokio reaps it in the background.
            let spawned = Command::new(path)
                .arg(&player.sound)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            match spawned {
                Ok(_child) => return Some(&player.program),
                Err(e) => debug!("Could not start {}: {}", player.program, e),
            }
        }
        None
    }
}

impl Default for SoundNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for SoundNotifier {
    fn name(&self) -> &'static str {
        "sound"
    }

    async fn notify(&self, _event: &ChangeEvent) -> Result<()> {
        if let Some(program) = self.spawn_player() {
            debug!("Playing alert with {}", program);
            return Ok(());
        }

        let mut stdout = std::io::stdout();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
        Ok(())
    }
}

fn find_on_path(program: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

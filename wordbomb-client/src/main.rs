use anyhow::{Context, Result};
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use wordbomb_client::{Config, GameSession, HostAdmin, SessionExit, SessionHandle, lobby};
use wordbomb_core::WordValidator;
use wordbomb_store::{DEFAULT_CHAT_HISTORY, MemoryStore, RoomStore};
use wordbomb_types::{Difficulty, GameMode, RoomSettings};

const DEMO_BOTS: usize = 3;
const DEMO_ROUNDS: u32 = 3;

// Used when no dictionary file is available.
const FALLBACK_WORDS: &str = "
another answer bakery brother catch station nation mountain counter
other think three weather feather thing nothing something everything
action motion question caution lotion portion position kitchen
painter paint pain faint saint taint rather father gather leather
ending bending sending tender render wonder under thunder
";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wordbomb_client=info,wordbomb_store=info")),
        )
        .init();

    info!("Starting Word Bomb demo room...");

    let config = Config::from_env().context("loading configuration")?;
    let validator = match WordValidator::from_file(&config.words_file) {
        Ok(validator) => validator,
        Err(e) => {
            warn!("{:#}; falling back to the built-in word list", e);
            WordValidator::from_word_list(&FALLBACK_WORDS.split_whitespace().collect::<Vec<_>>().join("\n"))
        }
    };
    info!("Dictionary ready with {} words", validator.len());
    let validator = Arc::new(validator);

    let store: Arc<dyn RoomStore> =
        Arc::new(MemoryStore::new().with_notification_drop_rate(config.notification_drop_rate));

    let mut settings = RoomSettings::new("Host", GameMode::VsAll, Difficulty::Medium);
    settings.max_rounds = DEMO_ROUNDS;
    let (room, host) = lobby::create_room(store.as_ref(), settings).await?;
    let (guest, _) = lobby::join_room(store.as_ref(), room.code.as_str(), "Guest").await?;
    lobby::add_bots(store.as_ref(), &room.code, DEMO_BOTS, Difficulty::Medium).await?;

    // The guest watches the lobby the way a second client would.
    let guest_lobby = {
        let store = store.clone();
        let code = room.code.clone();
        let interval = config.lobby_poll_interval;
        tokio::spawn(async move { lobby::wait_for_start(store.as_ref(), &code, interval).await })
    };

    let room = lobby::start_game(store.as_ref(), &room.code, host.id).await?;
    let guest_room = guest_lobby.await.context("lobby poll task")??;

    let admin = HostAdmin::new(store.clone(), room.code.clone(), host.id).await?;
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, ending the game...");
            if let Err(e) = admin.end_game().await {
                error!("Failed to end room {}: {}", admin.room_code(), e);
            }
        }
    });

    let handles: Vec<SessionHandle> = [(&host, &room), (&guest, &guest_room)]
        .into_iter()
        .map(|(player, room)| {
            SessionHandle::spawn(GameSession::new(
                store.clone(),
                validator.clone(),
                config.clone(),
                room.clone(),
                player,
            ))
        })
        .collect();

    let exits = join_all(handles.into_iter().map(SessionHandle::wait)).await;

    for message in store
        .list_chat_messages(&room.code, DEFAULT_CHAT_HISTORY)
        .await
        .unwrap_or_default()
    {
        info!("[chat] {}: {}", message.player_name, message.message);
    }

    match exits.into_iter().find_map(|exit| match exit {
        SessionExit::Finished { standings } => Some(standings),
        _ => None,
    }) {
        Some(standings) => println!("{}", serde_json::to_string_pretty(&standings)?),
        None => warn!("Room {} stopped before the game finished", room.code),
    }

    info!("Demo complete.");
    Ok(())
}

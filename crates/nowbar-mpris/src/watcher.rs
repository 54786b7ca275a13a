//! MPRIS player watcher
//!
//! Single D-Bus connection; change signals are a trigger only. When a
//! managed player signals, ALL of its track properties are fetched fresh
//! and handed to the callback as one snapshot. Players come and go via
//! NameOwnerChanged on the bus; only allowlisted names are managed.

use crate::error::WatcherError;
use crate::types::{PlaybackStatus, TrackSnapshot};
use futures_util::StreamExt;
use log::{debug, info, warn};
use std::collections::HashMap;
use tokio::sync::mpsc;
use zbus::Connection;
use zbus::zvariant::OwnedValue;

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// D-Bus proxy for the MPRIS player interface
#[zbus::proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_path = "/org/mpris/MediaPlayer2"
)]
trait MprisPlayer {
    #[zbus(property)]
    fn metadata(&self) -> zbus::Result<HashMap<String, OwnedValue>>;

    #[zbus(property)]
    fn playback_status(&self) -> zbus::Result<String>;
}

/// A player currently under management, in attach order.
struct ManagedPlayer {
    bus_name: String,
    proxy: MprisPlayerProxy<'static>,
    signal_task: tokio::task::JoinHandle<()>,
}

/// MPRIS watcher over one session-bus connection.
pub struct PlayerWatcher {
    connection: Connection,
    allowlist: &'static [&'static str],
}

impl PlayerWatcher {
    /// Connect to the session bus. Failure here is fatal for the caller;
    /// every later error is logged and skipped instead.
    pub async fn connect(allowlist: &'static [&'static str]) -> Result<Self, WatcherError> {
        let connection = Connection::session().await?;
        Ok(Self {
            connection,
            allowlist,
        })
    }

    /// Attach already-running players, then pump bus events forever,
    /// invoking `on_track` with a fresh snapshot on every change.
    ///
    /// Only resolves if the bus signal stream ends.
    pub async fn run<F>(self, on_track: F) -> Result<(), WatcherError>
    where
        F: Fn(TrackSnapshot),
    {
        let dbus = zbus::fdo::DBusProxy::new(&self.connection).await?;
        let mut owner_changes = dbus.receive_name_owner_changed().await?;
        let (signal_tx, mut signal_rx) = mpsc::channel::<String>(32);
        let mut managed: Vec<ManagedPlayer> = Vec::new();

        match dbus.list_names().await {
            Ok(names) => {
                for name in names {
                    let name = name.to_string();
                    if name.starts_with(MPRIS_PREFIX) {
                        self.attach_player(name, &mut managed, &signal_tx, &on_track)
                            .await;
                    }
                }
            }
            Err(e) => warn!("Error obtaining player names: {e}"),
        }

        loop {
            tokio::select! {
                change = owner_changes.next() => {
                    let Some(change) = change else { break };
                    let Ok(args) = change.args() else { continue };
                    let name = args.name().to_string();
                    if !name.starts_with(MPRIS_PREFIX) {
                        continue;
                    }
                    if args.new_owner().is_some() {
                        self.attach_player(name, &mut managed, &signal_tx, &on_track)
                            .await;
                    } else {
                        self.detach_player(&name, &mut managed, &on_track).await;
                    }
                }
                Some(bus_name) = signal_rx.recv() => {
                    if let Some(player) = managed.iter().find(|p| p.bus_name == bus_name) {
                        on_track(fetch_snapshot(player).await);
                    }
                }
            }
        }

        info!("Bus signal stream ended, shutting down");
        Ok(())
    }

    /// Name-appeared transition: allowlist check, proxy creation, signal
    /// subscription, registration. Creation failure leaves the name
    /// unmanaged.
    async fn attach_player<F>(
        &self,
        bus_name: String,
        managed: &mut Vec<ManagedPlayer>,
        signal_tx: &mpsc::Sender<String>,
        on_track: &F,
    ) where
        F: Fn(TrackSnapshot),
    {
        if managed.iter().any(|p| p.bus_name == bus_name) {
            return;
        }
        if !is_supported(self.allowlist, &bus_name) {
            debug!("Ignoring unsupported player {bus_name}");
            return;
        }

        let proxy = match build_proxy(&self.connection, &bus_name).await {
            Ok(proxy) => proxy,
            Err(e) => {
                warn!("Error creating player proxy for {bus_name}: {e}");
                return;
            }
        };

        // Forward change signals into the single event channel; the
        // snapshot fetch happens on the main loop.
        let task_proxy = proxy.clone();
        let tx = signal_tx.clone();
        let signal_name = bus_name.clone();
        let signal_task = tokio::spawn(async move {
            let mut metadata_changed = task_proxy.receive_metadata_changed().await;
            let mut status_changed = task_proxy.receive_playback_status_changed().await;
            loop {
                tokio::select! {
                    Some(_) = metadata_changed.next() => {}
                    Some(_) = status_changed.next() => {}
                    else => break,
                }
                if tx.send(signal_name.clone()).await.is_err() {
                    break;
                }
            }
        });

        info!("Managing player {bus_name}");
        let player = ManagedPlayer {
            bus_name,
            proxy,
            signal_task,
        };
        on_track(fetch_snapshot(&player).await);
        managed.push(player);
    }

    /// Player-vanished transition: release the handle, then hand the
    /// display to the most recently attached remaining player.
    async fn detach_player<F>(
        &self,
        bus_name: &str,
        managed: &mut Vec<ManagedPlayer>,
        on_track: &F,
    ) where
        F: Fn(TrackSnapshot),
    {
        let Some(index) = managed.iter().position(|p| p.bus_name == bus_name) else {
            return;
        };
        let player = managed.remove(index);
        player.signal_task.abort();
        info!("Player {bus_name} vanished");

        if let Some(current) = managed.last() {
            on_track(fetch_snapshot(current).await);
        }
    }
}

async fn build_proxy(
    connection: &Connection,
    bus_name: &str,
) -> zbus::Result<MprisPlayerProxy<'static>> {
    MprisPlayerProxy::builder(connection)
        .destination(bus_name.to_string())?
        .build()
        .await
}

/// Fetch all track properties fresh. Read failures are logged and leave
/// the field at its default.
async fn fetch_snapshot(player: &ManagedPlayer) -> TrackSnapshot {
    let metadata = match player.proxy.metadata().await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("Error obtaining metadata for {}: {e}", player.bus_name);
            HashMap::new()
        }
    };
    let status = match player.proxy.playback_status().await {
        Ok(status) => PlaybackStatus::from_str(&status),
        Err(e) => {
            warn!("Error obtaining playback status for {}: {e}", player.bus_name);
            PlaybackStatus::default()
        }
    };

    TrackSnapshot {
        player: short_player_name(&player.bus_name).to_string(),
        status,
        title: extract_string(&metadata, "xesam:title").unwrap_or_default(),
        artist: extract_str_array(&metadata, "xesam:artist").unwrap_or_default(),
        album: extract_string(&metadata, "xesam:album").unwrap_or_default(),
    }
}

/// Short name from a full bus name
/// "org.mpris.MediaPlayer2.spotify" -> "spotify"
/// "org.mpris.MediaPlayer2.firefox.instance_1_234" -> "firefox"
pub fn short_player_name(bus_name: &str) -> &str {
    let stripped = bus_name.strip_prefix(MPRIS_PREFIX).unwrap_or(bus_name);
    stripped.split('.').next().unwrap_or(stripped)
}

fn is_supported(allowlist: &[&str], bus_name: &str) -> bool {
    let short = short_player_name(bus_name);
    allowlist.iter().any(|player| *player == short)
}

// ============ Metadata extraction helpers ============

fn extract_string(map: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    use std::ops::Deref;
    use zbus::zvariant::Value;

    map.get(key).and_then(|v| match v.deref() {
        Value::Str(s) => Some(s.to_string()),
        _ => None,
    })
}

fn extract_str_array(map: &HashMap<String, OwnedValue>, key: &str) -> Option<String> {
    use std::ops::Deref;
    use zbus::zvariant::Value;

    map.get(key).and_then(|v| match v.deref() {
        Value::Array(arr) => {
            let strings: Vec<String> = arr
                .iter()
                .filter_map(|item| match item {
                    Value::Str(s) => Some(s.to_string()),
                    _ => None,
                })
                .collect();
            if strings.is_empty() {
                None
            } else {
                Some(strings.join(", "))
            }
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::Value;

    fn owned(value: Value<'_>) -> OwnedValue {
        OwnedValue::try_from(value).unwrap()
    }

    #[test]
    fn test_short_player_name() {
        assert_eq!(short_player_name("org.mpris.MediaPlayer2.spotify"), "spotify");
        assert_eq!(
            short_player_name("org.mpris.MediaPlayer2.firefox.instance_1_234"),
            "firefox"
        );
        assert_eq!(short_player_name("org.mpris.MediaPlayer2.mpv"), "mpv");
        // Unprefixed names pass through
        assert_eq!(short_player_name("spotify"), "spotify");
    }

    #[test]
    fn test_is_supported() {
        let allowlist = &["spotify", "mpv"];
        assert!(is_supported(allowlist, "org.mpris.MediaPlayer2.spotify"));
        assert!(is_supported(allowlist, "org.mpris.MediaPlayer2.mpv"));
        assert!(!is_supported(allowlist, "org.mpris.MediaPlayer2.vlc"));
        assert!(!is_supported(
            allowlist,
            "org.mpris.MediaPlayer2.chromium.instance_42"
        ));
    }

    #[test]
    fn test_extract_string() {
        let mut map = HashMap::new();
        map.insert("xesam:title".to_string(), owned(Value::from("Track")));
        map.insert("mpris:length".to_string(), owned(Value::from(1234i64)));

        assert_eq!(extract_string(&map, "xesam:title"), Some("Track".to_string()));
        assert_eq!(extract_string(&map, "xesam:album"), None);
        // Wrong type is treated as absent
        assert_eq!(extract_string(&map, "mpris:length"), None);
    }

    #[test]
    fn test_extract_str_array() {
        let mut map = HashMap::new();
        map.insert(
            "xesam:artist".to_string(),
            owned(Value::from(vec!["Band", "Guest"])),
        );
        map.insert("empty".to_string(), owned(Value::from(Vec::<String>::new())));

        assert_eq!(
            extract_str_array(&map, "xesam:artist"),
            Some("Band, Guest".to_string())
        );
        assert_eq!(extract_str_array(&map, "empty"), None);
        assert_eq!(extract_str_array(&map, "missing"), None);
    }
}

//! Live-session registry.
//!
//! Holds every open notification channel (`/_has_update` subscription),
//! keyed by session id and grouped by the page URL it watches. A session is
//! notified at most once; after that, or when its connection is found dead,
//! it is dropped from both maps.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::{SessionId, UrlPath};
use crate::debug;

/// Single event sent to a session before its stream is closed.
pub const RELOAD_EVENT: &[u8] = b"data: 'reload'\n\n";

/// SSE comment line used to check whether a session is still connected.
pub const HEARTBEAT: &[u8] = b": ping\n\n";

/// Server side of one event stream.
pub trait EventSink: Send {
    /// Write one event and flush it to the client.
    fn send(&mut self, event: &[u8]) -> io::Result<()>;

    /// End the stream. Nothing is sent afterwards.
    fn finish(&mut self) -> io::Result<()>;
}

pub type SessionSink = Box<dyn EventSink>;

/// `None` once the stream has been finished.
type SharedSink = Arc<Mutex<Option<SessionSink>>>;

/// Handle to one session's stream, used after the registry lock is released.
///
/// Socket writes never happen under the registry lock, so a client that
/// stops reading stalls only its own channel.
#[derive(Clone)]
pub struct Channel {
    id: SessionId,
    origin: UrlPath,
    sink: SharedSink,
}

impl Channel {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Send the reload event, then end the stream.
    ///
    /// Returns `true` if the event reached the connection. A channel that was
    /// already finished returns `false`.
    pub fn reload(&self) -> bool {
        let Some(mut sink) = self.sink.lock().take() else {
            return false;
        };

        match sink.send(RELOAD_EVENT) {
            Ok(()) => {
                let _ = sink.finish();
                debug!("reload"; "notified session {} ({})", self.id, self.origin);
                true
            }
            Err(e) => {
                debug!("reload"; "session {} already gone: {}", self.id, e);
                false
            }
        }
    }

    /// End the stream without an event.
    pub fn close(&self) {
        if let Some(mut sink) = self.sink.lock().take() {
            let _ = sink.finish();
        }
    }

    /// Ping the connection with an SSE comment.
    ///
    /// A finished channel counts as alive: whoever finished it also removed it.
    pub fn ping(&self) -> bool {
        match self.sink.lock().as_mut() {
            Some(sink) => sink.send(HEARTBEAT).is_ok(),
            None => true,
        }
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: FxHashMap<SessionId, Channel>,
    by_origin: FxHashMap<UrlPath, FxHashSet<SessionId>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as a live channel for `origin`, keeping the sink needed
    /// to push the reload event and close the stream.
    pub fn subscribe(&mut self, id: SessionId, origin: UrlPath, sink: SessionSink) {
        self.by_origin.entry(origin.clone()).or_default().insert(id);
        let sink = Arc::new(Mutex::new(Some(sink)));
        self.sessions.insert(id, Channel { id, origin, sink });
    }

    /// Sessions subscribed to any of `origins`, de-duplicated and in id order.
    pub fn subscribers<'a>(&self, origins: impl IntoIterator<Item = &'a UrlPath>) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = origins
            .into_iter()
            .filter_map(|origin| self.by_origin.get(origin))
            .flatten()
            .copied()
            .collect::<FxHashSet<_>>()
            .into_iter()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Take `id` out of the primary map for notification.
    ///
    /// A second call returns `None`, so a session is reloaded at most once.
    /// The caller sends through [`Channel::reload`] once the lock is gone.
    pub fn notify(&mut self, id: SessionId) -> Option<Channel> {
        self.sessions.remove(&id)
    }

    /// Forget `ids` everywhere: the primary map and every per-URL group.
    pub fn cleanup(&mut self, ids: &[SessionId]) {
        for id in ids {
            if let Some(channel) = self.sessions.remove(id) {
                self.detach(id, &channel.origin);
            }
        }
        // Notified sessions are already out of the primary map; sweep groups
        let ids: FxHashSet<&SessionId> = ids.iter().collect();
        self.by_origin.retain(|_, group| {
            group.retain(|id| !ids.contains(id));
            !group.is_empty()
        });
    }

    /// Every open channel, for a heartbeat run outside the lock.
    pub fn channels(&self) -> Vec<Channel> {
        self.sessions.values().cloned().collect()
    }

    /// Remove every session (server shutdown). The caller closes the returned
    /// channels.
    pub fn close_all(&mut self) -> Vec<Channel> {
        self.by_origin.clear();
        self.sessions.drain().map(|(_, channel)| channel).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Whether any per-URL group still mentions `id`.
    #[cfg(test)]
    pub fn is_grouped(&self, id: SessionId) -> bool {
        self.by_origin.values().any(|group| group.contains(&id))
    }

    fn detach(&mut self, id: &SessionId, origin: &UrlPath) {
        if let Some(group) = self.by_origin.get_mut(origin) {
            group.remove(id);
            if group.is_empty() {
                self.by_origin.remove(origin);
            }
        }
    }
}

/// Ping every open session and clean up the ones whose connection has
/// closed. Returns the ids removed.
pub fn heartbeat(sessions: &Mutex<SessionRegistry>) -> Vec<SessionId> {
    let channels = sessions.lock().channels();
    let dead: Vec<SessionId> = channels
        .iter()
        .filter(|channel| !channel.ping())
        .map(Channel::id)
        .collect();

    if !dead.is_empty() {
        sessions.lock().cleanup(&dead);
    }
    dead
}

/// Close every open session. Returns how many were open.
pub fn close_all(sessions: &Mutex<SessionRegistry>) -> usize {
    let channels = sessions.lock().close_all();
    for channel in &channels {
        channel.close();
    }
    channels.len()
}

// =============================================================================
// Tests
// =============================================================================

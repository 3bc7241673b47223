use std::path::Path;

use notify::EventKind;
use notify::event::ModifyKind;

use crate::reload::{FsEvent, FsEventKind};

/// Map a notify event onto invalidation events, one per path.
///
/// Creation, removal and renames all become [`FsEventKind::Renamed`]: the
/// engine toggles existence and reconciles with the disk. Content writes
/// become [`FsEventKind::Modified`]. Metadata and access events are dropped,
/// as are paths outside `root`.
pub(super) fn translate(event: &notify::Event, root: &Path) -> Vec<FsEvent> {
    let kind = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => FsEventKind::Renamed,
        EventKind::Modify(ModifyKind::Name(_)) => FsEventKind::Renamed,
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => FsEventKind::Modified,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter_map(|path| path.strip_prefix(root).ok())
        .filter(|relative| !relative.as_os_str().is_empty())
        .map(|relative| FsEvent::new(kind, relative))
        .collect()
}

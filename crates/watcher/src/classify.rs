//! Backend event classification

use notify::event::{EventKind, ModifyKind};
use replicator_core::OpKind;

/// Map a `notify` event kind onto the replicator's operation kinds
///
/// Returns `None` for access notifications (open/close), which do not
/// change the file.
pub fn classify(kind: &EventKind) -> Option<OpKind> {
    match kind {
        EventKind::Access(_) => None,
        EventKind::Create(_) => Some(OpKind::Create),
        EventKind::Remove(_) => Some(OpKind::Remove),
        EventKind::Modify(ModifyKind::Name(_)) => Some(OpKind::Rename),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(OpKind::Chmod),
        EventKind::Modify(_) => Some(OpKind::Write),
        _ => Some(OpKind::Other),
    }
}

use dialog_table::Payload;
use tracing::warn;

/// Payload keys that name structural fields of a node. Tree operations own
/// these; callers cannot set them through a payload.
pub const RESERVED_KEYS: [&str; 5] = ["id", "parent_id", "lft", "rgt", "depth"];

/// Strip every [RESERVED_KEYS] entry from a caller-supplied payload
pub fn sanitize(mut payload: Payload) -> Payload {
    for key in RESERVED_KEYS {
        if payload.remove(key).is_some() {
            warn!(key, "Discarded reserved key from node payload");
        }
    }
    payload
}

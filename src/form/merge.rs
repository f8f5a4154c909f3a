use serde_json::{Map, Value};

/// Merges `patch` into `target`, recursing only where both sides are
/// objects. Any other patch value, arrays included, replaces the target
/// value wholesale.
pub(super) fn deep_merge(target: &mut Value, patch: Map<String, Value>) {
    let Value::Object(target) = target else {
        *target = Value::Object(patch);
        return;
    };
    for (key, incoming) in patch {
        match (target.get_mut(&key), incoming) {
            (Some(existing @ Value::Object(_)), Value::Object(nested)) => {
                deep_merge(existing, nested);
            }
            (_, incoming) => {
                target.insert(key, incoming);
            }
        }
    }
}

/// Replaces each top-level key of `target` named in `patch`.
pub(super) fn shallow_merge(target: &mut Value, patch: Map<String, Value>) {
    let Value::Object(target) = target else {
        *target = Value::Object(patch);
        return;
    };
    target.extend(patch);
}

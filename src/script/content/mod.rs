//! Bundled content scripts.

mod mushroom_castle;

use super::ScriptRegistry;

/// Register every bundled script.
pub fn register_all(registry: &mut ScriptRegistry) {
    mushroom_castle::register(registry);
}

use std::sync::{Arc, RwLock};

use crate::error::TokenkeepError;
use crate::manager::TokenLifecycleManager;

static HANDLE: RwLock<Option<Arc<TokenLifecycleManager>>> = RwLock::new(None);

/// Install the process-wide manager. Replaces any previous handle.
pub fn init(manager: TokenLifecycleManager) -> Arc<TokenLifecycleManager> {
    let manager = Arc::new(manager);
    if let Ok(mut slot) = HANDLE.write() {
        *slot = Some(manager.clone());
    }
    manager
}

/// Access the process-wide manager.
///
/// Fails loudly before `init` instead of handing back a silent `None`; the
/// caller is holding a programming error, not a recoverable condition.
pub fn handle() -> Result<Arc<TokenLifecycleManager>, TokenkeepError> {
    let slot = HANDLE
        .read()
        .map_err(|e| TokenkeepError::StoreUnavailable(e.to_string()))?;
    slot.clone()
        .ok_or_else(|| TokenkeepError::AuthRequired("token manager not initialized".into()))
}

/// Drop the process-wide manager. Idempotent.
pub fn teardown() {
    if let Ok(mut slot) = HANDLE.write() {
        *slot = None;
    }
}

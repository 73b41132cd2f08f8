use std::sync::Arc;

use crate::repository::{ChatSpaceStore, StreamStore};
use crate::services::{ChatSpaceMembershipService, StreamAttendanceService};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub streams: StreamAttendanceService,
    pub chat_spaces: ChatSpaceMembershipService,
}

impl AppState {
    pub fn new(
        stream_store: Arc<dyn StreamStore>,
        chat_space_store: Arc<dyn ChatSpaceStore>,
        max_bulk_ids: usize,
    ) -> Self {
        Self {
            streams: StreamAttendanceService::new(stream_store, max_bulk_ids),
            chat_spaces: ChatSpaceMembershipService::new(chat_space_store),
        }
    }
}

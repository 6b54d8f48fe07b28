//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the shared
//! resources every handler needs.

use crate::config::Config;
use std::sync::Arc;
use tutor_core::tutor::TutorService;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub tutor: Arc<TutorService>,
    pub config: Arc<Config>,
}

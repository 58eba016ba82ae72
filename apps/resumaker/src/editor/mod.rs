pub mod handlers;
pub mod session;
pub mod state;

use std::sync::Arc;

use tokio::sync::RwLock;

pub use session::{EditorSession, SessionManager};
pub use state::{EditError, EditState};

/// The edit state shared between the session (writer) and the reconciler.
pub type SharedDocument = Arc<RwLock<EditState>>;

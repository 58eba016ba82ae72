// Autosave: debounce, save status, profile-sync gate and the reconciler that
// ties them to the remote store.

pub mod debounce;
pub mod profile;
pub mod reconciler;
pub mod status;

pub use reconciler::{AutosaveSettings, Reconciler};
pub use status::{SaveStatus, StatusTracker};

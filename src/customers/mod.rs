//! Customer registry: de-duplicated contacts plus notification
//! preferences.

pub mod models;
pub mod preferences;
pub mod repository;
pub mod validation;

pub use models::{Customer, NotificationPreferences};
pub use preferences::PreferencesRepository;
pub use repository::{CustomerInput, CustomerRepository};

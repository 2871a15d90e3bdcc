//! Runs the Japanese text enlarger when a page loads, when watched page
//! regions mutate, and on the "enlarge even more" keyboard shortcut.

pub mod activation;
pub mod config;
pub mod controller;
pub mod events;
pub mod page;

pub use activation::ActivationRules;
pub use config::ControllerConfig;
pub use config::RegionConfig;
pub use config::ShortcutConfig;
pub use controller::ControllerState;
pub use controller::FlushSummary;
pub use controller::Installed;
pub use controller::PassOutcome;
pub use controller::PassRequest;
pub use controller::Region;
pub use controller::TriggerController;
pub use controller::TriggerSource;
pub use events::HostEvent;
pub use events::KeyEvent;
pub use events::Modifier;
pub use events::Modifiers;
pub use events::ReadyState;
pub use page::Page;
pub use page::PageKind;
pub use page::PageLocation;

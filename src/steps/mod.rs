//! Concrete provisioning steps.
//!
//! Each module contributes one `Step` implementation. Steps are independent
//! and run in a fixed order; the only channel between them is the
//! operating-system state an earlier step mutated and a later step's
//! presence detection observes.

pub mod desktop;
pub mod devtools;
pub mod fonts;
pub mod path_env;
pub mod settings;
pub mod share;
pub mod software;
pub mod taskbar;

pub use desktop::DesktopIconsStep;
pub use devtools::DevToolsStep;
pub use fonts::FontsStep;
pub use path_env::PathEditStep;
pub use settings::SettingsStep;
pub use share::ShareDriveStep;
pub use software::SoftwareStep;
pub use taskbar::TaskbarLayoutStep;

//! Desktop icon visibility step.
//!
//! A single `HideIcons=1` DWORD under the Explorer `Advanced` key. Explorer
//! picks the change up on restart, which the orchestrator's final cleanup
//! handles.

use crate::config::ProvisionConfig;
use crate::detect;
use crate::error::Result;
use crate::registry::{RegRoot, RegValue};
use crate::step::{ActionOutcome, Step, StepContext};

const ADVANCED_SUBKEY: &str = "Software\\Microsoft\\Windows\\CurrentVersion\\Explorer\\Advanced";
const HIDE_ICONS: &str = "HideIcons";

/// Hides all desktop icons.
pub struct DesktopIconsStep;

impl Step for DesktopIconsStep {
    fn name(&self) -> &'static str {
        "Desktop Icons"
    }

    fn description(&self, _config: &ProvisionConfig) -> String {
        "Hide desktop icons?".to_string()
    }

    fn execute(&self, ctx: &mut StepContext<'_>) -> Result<Vec<ActionOutcome>> {
        let action = "Hide desktop icons";
        let desired = RegValue::Dword(1);

        if detect::registry_value_matches(
            ctx.registry,
            RegRoot::CurrentUser,
            ADVANCED_SUBKEY,
            HIDE_ICONS,
            &desired,
        )? {
            return Ok(vec![ActionOutcome::already_satisfied(action)]);
        }

        match ctx
            .registry
            .set_value(RegRoot::CurrentUser, ADVANCED_SUBKEY, HIDE_ICONS, &desired)
        {
            Ok(()) => Ok(vec![ActionOutcome::applied(action)]),
            Err(e) => Ok(vec![ActionOutcome::failed(action, e.to_string())]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryRegistry, RegistryStore};

    #[test]
    fn test_hide_icons_targets_advanced_key() {
        let mut reg = MemoryRegistry::new();
        reg.set_value(
            RegRoot::CurrentUser,
            ADVANCED_SUBKEY,
            HIDE_ICONS,
            &RegValue::Dword(1),
        )
        .unwrap();

        let matches = detect::registry_value_matches(
            &reg,
            RegRoot::CurrentUser,
            ADVANCED_SUBKEY,
            HIDE_ICONS,
            &RegValue::Dword(1),
        )
        .unwrap();
        assert!(matches);
    }
}

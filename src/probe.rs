use std::sync::Mutex;

use sysinfo::System;

use crate::platform::ProcessProbe;

/// Looks processes up by name the way Windows tools do: the executable
/// name without its `.exe` suffix, ignoring case.
pub struct SystemProbe {
    system: Mutex<System>,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl ProcessProbe for SystemProbe {
    fn is_running(&self, name: &str) -> bool {
        let Ok(mut system) = self.system.lock() else {
            warn!("Process table lock poisoned, assuming {name} is not running");
            return false;
        };
        system.refresh_processes();
        system
            .processes()
            .values()
            .any(|process| matches_name(process.name(), name))
    }
}

fn matches_name(process_name: &str, wanted: &str) -> bool {
    let stem = match process_name.rsplit_once('.') {
        Some((stem, extension)) if extension.eq_ignore_ascii_case("exe") => stem,
        _ => process_name,
    };
    stem.eq_ignore_ascii_case(wanted)
}

//! Backend commands queued from UI to backend worker.

use std::time::Duration;

use shared::domain::PackageHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    RefreshOfferings,
    Purchase { package: PackageHandle },
    Restore,
    ArmCloseButton { delay: Duration },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::RefreshOfferings => "refresh_offerings",
            BackendCommand::Purchase { .. } => "purchase",
            BackendCommand::Restore => "restore",
            BackendCommand::ArmCloseButton { .. } => "arm_close_button",
        }
    }
}

mod backup;
mod fs_utils;
mod layout;
mod lifecycle;
mod runner;

pub use backup::{
    create_backup, is_agent_installed, read_backup_version, remove_backup, restore_agent_config,
    BackupSnapshot,
};
pub use fs_utils::copy_file;
pub use layout::AgentLayout;
pub use lifecycle::{install_version_token, LifecycleFailure, LifecycleManager};
pub use runner::{InstallRequest, NpmRunner, PackageRunner};

use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tracing::{debug, error, info};

const NPM_PROGRAM: &str = "npm";

/// Native addons in the agent need C++17.
const NPM_CXXFLAGS: &str = "-std=c++17";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallRequest<'a> {
    pub package: &'a str,
    pub version: &'a str,
    pub registry: &'a str,
    pub working_dir: &'a Path,
}

/// Fetches, links and removes packages inside a working directory.
///
/// Implementations return the tool's combined output on success and an error
/// carrying that output on failure.
pub trait PackageRunner {
    fn install(&self, request: &InstallRequest<'_>) -> Result<String>;

    fn uninstall(&self, package: &str, working_dir: &Path) -> Result<String>;
}

impl<T: PackageRunner + ?Sized> PackageRunner for &T {
    fn install(&self, request: &InstallRequest<'_>) -> Result<String> {
        (**self).install(request)
    }

    fn uninstall(&self, package: &str, working_dir: &Path) -> Result<String> {
        (**self).uninstall(package, working_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpmRunner {
    program: OsString,
}

impl Default for NpmRunner {
    fn default() -> Self {
        Self::new(NPM_PROGRAM)
    }
}

impl NpmRunner {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub(crate) fn build_install_command(&self, request: &InstallRequest<'_>) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("install")
            .arg(format!("{}@{}", request.package, request.version))
            .arg("--registry")
            .arg(request.registry)
            .current_dir(request.working_dir)
            .env("CXXFLAGS", NPM_CXXFLAGS);
        command
    }

    pub(crate) fn build_uninstall_command(&self, package: &str, working_dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("uninstall")
            .arg(package)
            .current_dir(working_dir);
        command
    }
}

impl PackageRunner for NpmRunner {
    fn install(&self, request: &InstallRequest<'_>) -> Result<String> {
        let output = run_command(
            &mut self.build_install_command(request),
            "npm install failed",
        )?;
        info!(output = %output, "package installed successfully");
        Ok(output)
    }

    fn uninstall(&self, package: &str, working_dir: &Path) -> Result<String> {
        let output = run_command(
            &mut self.build_uninstall_command(package, working_dir),
            "npm uninstall failed",
        )?;
        info!(output = %output, "package uninstalled successfully");
        Ok(output)
    }
}

/// Runs `command` to completion and returns stdout followed by stderr.
pub(crate) fn run_command(command: &mut Command, context_message: &str) -> Result<String> {
    debug!(command = ?command, "running package manager");
    let output = command
        .output()
        .with_context(|| format!("{context_message}: command failed to start"))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    if output.status.success() {
        return Ok(combined);
    }

    error!(status = %output.status, output = %combined, "{context_message}");
    Err(anyhow!(
        "{context_message}: {}, output: {}",
        output.status,
        combined
    ))
}

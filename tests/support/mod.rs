use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const WORKSPACE: &str = "ws";

pub fn helper_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_bundles-from-git-status"))
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// Run a command that is expected to fail and return its output.
pub fn run_command_failing(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        bail!(
            "command {:?} unexpectedly succeeded\nstdout: {}",
            cmd,
            String::from_utf8_lossy(&output.stdout)
        );
    }
    Ok(output)
}

/// Scratch repository with a bundle tree, a status report and an output dir.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("failed to allocate fixture dir")?,
        })
    }

    pub fn repo_root(&self) -> PathBuf {
        self.dir.path().join("repo")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn status_path(&self) -> PathBuf {
        self.dir.path().join("git_status.txt")
    }

    /// Create empty files at the given repo-relative paths.
    pub fn touch(&self, files: &[&str]) -> Result<()> {
        for file in files {
            let path = self.repo_root().join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(&path, b"select 1;\n")
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(())
    }

    pub fn write_status(&self, lines: &[&str]) -> Result<PathBuf> {
        let path = self.status_path();
        let mut contents = lines.join("\n");
        contents.push('\n');
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(helper_binary());
        cmd.arg(self.status_path())
            .arg(self.output_dir())
            .arg(WORKSPACE)
            .arg("--repo-root")
            .arg(self.repo_root())
            .env_remove("CHANGED_BUNDLES_REPO_ROOT")
            .env_remove("RUST_LOG");
        cmd
    }
}

pub fn read_json_strings(path: &Path) -> Result<Vec<String>> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

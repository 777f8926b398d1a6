#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug)]
pub struct CliResult {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Fake compiler: copies the program through, or rejects any source
/// containing `BAD` with a diagnostic on stdout.
pub const FAKE_COMPILER: &str = r#"src=$(cat)
case "$src" in
  *BAD*) echo "error: unexpected token"; exit 1 ;;
esac
printf '%s\n' "$src"
"#;

/// Fake P-machine: prints the program, then the timing report.
pub const FAKE_VM: &str = r#"cat "$1"
echo "--> Execution time: 3ms"
"#;

/// A throwaway project layout: tools, fixtures and scratch space.
pub struct Workspace {
    pub root: PathBuf,
}

impl Workspace {
    pub fn new(prefix: &str) -> Self {
        let root = unique_temp_path(prefix);
        fs::create_dir_all(&root).expect("failed to create workspace");
        let ws = Workspace { root };
        ws.tool("c2p", FAKE_COMPILER);
        ws.tool("pmachine", FAKE_VM);
        ws
    }

    pub fn tool(&self, name: &str, body: &str) -> PathBuf {
        let path = self.root.join("bin").join(name);
        write_text_file(&path, &format!("#!/bin/sh\n{}", body));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("failed to mark tool executable");
        path
    }

    pub fn fixtures(&self) -> PathBuf {
        self.root.join("codegen")
    }

    pub fn scratch(&self) -> PathBuf {
        self.root.join("temp")
    }

    pub fn valid(&self, name: &str, source: &str, expected: &str) {
        write_text_file(&self.fixtures().join(name), source);
        write_text_file(&self.fixtures().join(format!("{}.out", name)), expected);
    }

    pub fn invalid(&self, name: &str, source: &str, expected: &str) {
        let dir = self.fixtures().join("fail");
        write_text_file(&dir.join(name), source);
        write_text_file(&dir.join(format!("{}.out", name)), expected);
    }

    /// Run the driver against this workspace's tools and fixtures.
    pub fn run(&self, args: &[&str]) -> CliResult {
        let mut full: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        full.extend([
            "--compiler".to_string(),
            self.root.join("bin").join("c2p").display().to_string(),
            "--vm".to_string(),
            self.root.join("bin").join("pmachine").display().to_string(),
            "--fixtures".to_string(),
            self.fixtures().display().to_string(),
            "--scratch".to_string(),
            self.scratch().display().to_string(),
        ]);
        run_cli(&full)
    }

    /// Replace this workspace's absolute path so output is stable.
    pub fn normalize(&self, text: &str) -> String {
        text.replace(&self.root.display().to_string(), "<ROOT>")
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

pub fn run_cli(args: &[String]) -> CliResult {
    let output = Command::new(env!("CARGO_BIN_EXE_c2p-conformance"))
        .env_remove("C2P_COMPILER")
        .env_remove("C2P_VM")
        .env_remove("C2P_FIXTURES")
        .env_remove("C2P_SCRATCH")
        .env_remove("C2P_TIMEOUT_SECS")
        .args(args)
        .output()
        .expect("failed to execute c2p-conformance binary");

    CliResult {
        status: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

pub fn unique_temp_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time drift")
        .as_nanos();
    std::env::temp_dir().join(format!("{}_{}_{}", prefix, std::process::id(), nanos))
}

pub fn write_text_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create parent directory");
    }
    fs::write(path, contents).expect("failed to write file");
}

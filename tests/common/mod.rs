use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::path::Path;
use std::process::Output;

pub fn fileward_cmd(cwd: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("fileward");
    cmd.arg("-C").arg(cwd);
    cmd
}

pub fn check_output(cwd: &Path, path: &str) -> Output {
    let mut cmd = fileward_cmd(cwd);
    cmd.arg("check").arg(path);
    cmd.output().expect("failed to run `fileward check`")
}

// Each integration test file is compiled as its own crate. Some crates only
// use `fileward_cmd` and `check_output`, so these helpers are intentionally
// unused there.
#[allow(dead_code)]
pub fn ledger_content(cwd: &Path) -> String {
    std::fs::read_to_string(cwd.join("hash_record.txt")).expect("ledger should exist")
}

#[allow(dead_code)]
pub fn count_entries(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

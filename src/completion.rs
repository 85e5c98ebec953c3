//! Completion scripts for the `reqrank` subcommands.
//!
//! The script is rendered in memory first, so `--stdout` and `--out-dir`
//! emit identical bytes and a failed render never leaves a partial file.

use anyhow::{Context, Result, bail};
use clap::CommandFactory;
use clap_complete::{Generator, Shell as CompletionShell, generate};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::info;

use crate::cli::{AppContext, Cli, CompletionsArgs, Shell};

const BIN_NAME: &str = "reqrank";

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
            Shell::Elvish => CompletionShell::Elvish,
        }
    }
}

/// Completion script for `shell` covering every subcommand and flag
pub fn render(shell: Shell) -> Vec<u8> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    generate(CompletionShell::from(shell), &mut cmd, BIN_NAME, &mut buf);
    buf
}

/// Conventional file name of the script, e.g. `_reqrank` for zsh
pub fn file_name(shell: Shell) -> String {
    CompletionShell::from(shell).file_name(BIN_NAME)
}

pub fn run(args: CompletionsArgs, ctx: &AppContext) -> Result<()> {
    let script = render(args.shell.clone());

    if args.stdout {
        io::stdout().write_all(&script).context("write completion to stdout")?;
        return Ok(());
    }

    let Some(dir) = args.out_dir else {
        bail!("--out-dir is required unless --stdout is set");
    };
    let path = write_script(&dir, &file_name(args.shell), &script)?;

    info!(path = %path.display(), bytes = script.len(), "Wrote completion script");
    if !ctx.quiet {
        eprintln!("Wrote completion to {}", path.display());
    }
    Ok(())
}

fn write_script(dir: &Path, name: &str, script: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(name);
    fs::write(&path, script).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_ctx() -> AppContext {
        AppContext { quiet: true, no_color: true, config: None, store: None, source: None }
    }

    #[test]
    fn bash_script_lists_feedback_commands() {
        let script = String::from_utf8(render(Shell::Bash)).unwrap();
        for sub in ["prioritize", "chart", "like", "undislike", "defer", "delete-profile"] {
            assert!(script.contains(sub), "missing {sub}");
        }
    }

    #[test]
    fn file_names_follow_shell_conventions() {
        assert_eq!(file_name(Shell::Zsh), "_reqrank");
        assert_eq!(file_name(Shell::Bash), "reqrank.bash");
        assert_eq!(file_name(Shell::Fish), "reqrank.fish");
    }

    #[test]
    fn out_dir_receives_the_rendered_script() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = quiet_ctx();
        let args = CompletionsArgs { shell: Shell::Fish, out_dir: Some(dir.path().join("completions")), stdout: false };
        run(args, &ctx).unwrap();

        let written = fs::read(dir.path().join("completions/reqrank.fish")).unwrap();
        assert_eq!(written, render(Shell::Fish));
    }

    #[test]
    fn missing_target_is_an_error() {
        let ctx = quiet_ctx();
        let args = CompletionsArgs { shell: Shell::Bash, out_dir: None, stdout: false };
        let err = run(args, &ctx).unwrap_err();
        assert!(err.to_string().contains("--out-dir"));
    }
}

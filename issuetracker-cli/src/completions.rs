use crate::cli::Cli;
use crate::error::{CliResult, IntoCliResult};
use clap::CommandFactory;
use clap_complete::Shell;
use std::io::{self, Write};

const BIN_NAME: &str = "issuetracker";

/// Write the completion script for `shell` to `out`
pub fn write_completion<W: Write>(shell: Shell, out: &mut W) -> CliResult<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, BIN_NAME, out);
    out.flush().cli_general_error()
}

/// Print shell completion script to stdout
pub fn print_completion(shell: Shell) -> CliResult<()> {
    write_completion(shell, &mut io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_scripts_name_the_binary() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell] {
            let mut out = Vec::new();
            write_completion(shell, &mut out).unwrap();
            let script = String::from_utf8(out).unwrap();
            assert!(script.contains(BIN_NAME), "{:?} script", shell);
            assert!(script.contains("serve"), "{:?} script", shell);
        }
    }
}

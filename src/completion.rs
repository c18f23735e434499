//! # Shell Completion Module
//!
//! Completion scripts via `clap_complete`, plus the list of mood labels that
//! completion scripts can offer for `--mood`.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! moodmuse completion bash > ~/.local/share/bash-completion/completions/moodmuse
//!
//! # Generate zsh completions
//! moodmuse completion zsh > ~/.config/zsh/completions/_moodmuse
//! ```

use crate::cli::Shell;
use crate::config::EngineConfig;
use crate::mood::Mood;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};

/// Generate shell completions for the given shell on stdout
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate_completions_to(gen, cmd, &mut io::stdout());
}

/// Generate shell completions into `out`
pub fn generate_completions_to<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

pub const fn shell_to_completion_shell(shell: Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Known mood labels plus any extra rows from configured mood tables, sorted.
pub fn mood_completions(config: &EngineConfig) -> Result<Vec<String>> {
    let tables = config.load_mood_tables()?;
    let mut moods: Vec<String> = Mood::KNOWN
        .iter()
        .map(|mood| mood.as_str().to_string())
        .chain(tables.moods().map(str::to_string))
        .collect();
    moods.sort();
    moods.dedup();
    Ok(moods)
}

pub fn print_mood_completions(config: &EngineConfig) -> Result<()> {
    for mood in mood_completions(config)? {
        println!("{mood}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_shell_conversion() {
        assert_eq!(shell_to_completion_shell(Shell::Bash), CompletionShell::Bash);
        assert_eq!(shell_to_completion_shell(Shell::Zsh), CompletionShell::Zsh);
        assert_eq!(shell_to_completion_shell(Shell::PowerShell), CompletionShell::PowerShell);
    }

    #[test]
    fn test_bash_script_mentions_subcommands() {
        let mut cmd = crate::cli::Args::command();
        let mut out = Vec::new();
        generate_completions_to(CompletionShell::Bash, &mut cmd, &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("moodmuse"));
        assert!(script.contains("playlist"));
        assert!(script.contains("feedback-list"));
    }

    #[test]
    fn test_mood_completions_cover_known_moods() {
        let moods = mood_completions(&EngineConfig::default()).unwrap();
        assert_eq!(moods.len(), Mood::KNOWN.len());
        assert!(moods.contains(&"workout".to_string()));
        assert!(moods.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

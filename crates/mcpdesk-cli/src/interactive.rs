//! Terminal prompts for the few commands that ask before acting.
//!
//! Uses dialoguer for terminal UI prompts. `--yes` skips every prompt. Without
//! a terminal, confirmations fail instead of guessing and env prompts are
//! skipped.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use console::{Term, style};
use dialoguer::{Confirm, Input, theme::ColorfulTheme};

pub struct Prompter {
    theme: ColorfulTheme,
    assume_yes: bool,
    interactive: bool,
}

impl Prompter {
    pub fn new(assume_yes: bool) -> Self {
        Self::with_terminal(assume_yes, Term::stderr().is_term())
    }

    fn with_terminal(assume_yes: bool, terminal: bool) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            assume_yes,
            interactive: !assume_yes && terminal,
        }
    }

    /// Ask a yes/no question. `--yes` answers for the user; with no terminal
    /// to ask on this is an error.
    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        if !self.interactive {
            bail!("{} (no terminal to confirm on; pass --yes to proceed)", prompt);
        }
        let confirmed = Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }

    /// Ask for each variable in `names` that `values` does not already hold.
    ///
    /// When not interactive the missing variables are left out; the installed
    /// entry then carries them with empty values.
    pub fn fill_env(&self, names: &[String], values: &mut BTreeMap<String, String>) -> Result<()> {
        let missing: Vec<_> = names.iter().filter(|n| !values.contains_key(*n)).collect();
        if missing.is_empty() {
            return Ok(());
        }
        if !self.interactive {
            eprintln!(
                "{} Missing environment values: {} (set them later in the config)",
                style("⚠").yellow(),
                missing
                    .iter()
                    .map(|n| n.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            return Ok(());
        }

        for name in missing {
            let value: String = Input::with_theme(&self.theme)
                .with_prompt(name.as_str())
                .allow_empty(true)
                .interact_text()?;
            values.insert(name.clone(), value);
        }
        Ok(())
    }
}

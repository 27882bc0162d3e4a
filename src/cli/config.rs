//! `bankflow config` handler

use std::io::Write;

use clap::Args;

use crate::config::{BankflowPaths, Settings};
use crate::error::FlowResult;

/// Options for `bankflow config`
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Write the current settings to the config file
    #[arg(long)]
    pub init: bool,
}

/// Show paths and settings, optionally persisting them
pub fn handle_config_command<W: Write>(
    paths: &BankflowPaths,
    settings: &Settings,
    args: &ConfigArgs,
    out: &mut W,
) -> FlowResult<()> {
    if args.init {
        settings.save(paths)?;
        writeln!(out, "Wrote settings to {}", paths.settings_file().display())?;
        writeln!(out)?;
    }

    writeln!(out, "bankflow Configuration")?;
    writeln!(out, "======================")?;
    writeln!(out, "Config directory: {}", paths.base_dir().display())?;
    writeln!(out, "Settings file:    {}", paths.settings_file().display())?;
    writeln!(out)?;
    writeln!(out, "Settings:")?;
    writeln!(out, "  Currency symbol:      {}", settings.currency_symbol)?;
    writeln!(out, "  Reference max length: {}", settings.reference_max_length)?;
    writeln!(out, "  Min phone digits:     {}", settings.min_phone_digits)?;
    writeln!(out, "  Log filter:           {}", settings.log_filter)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_settings() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BankflowPaths::with_base_dir(temp_dir.path().join("bankflow"));
        let mut out = Vec::new();

        handle_config_command(&paths, &Settings::default(), &ConfigArgs { init: true }, &mut out)
            .unwrap();

        assert!(paths.settings_file().exists());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Currency symbol:      £"));
    }

    #[test]
    fn test_show_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BankflowPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut out = Vec::new();

        handle_config_command(&paths, &Settings::default(), &ConfigArgs::default(), &mut out)
            .unwrap();

        assert!(!paths.settings_file().exists());
    }
}

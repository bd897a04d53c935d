//! Init command implementation

use anyhow::{bail, Context, Result};
use colored::Colorize;
use tracing::info;

use crate::cli::InitArgs;
use crate::config::write_default_config;

/// Write the default configuration, refusing to overwrite an existing file
pub fn run(args: InitArgs) -> Result<()> {
    if args.path.exists() {
        bail!(
            "Configuration file already exists: {} (remove it first)",
            args.path.display()
        );
    }

    write_default_config(&args.path)
        .with_context(|| format!("Failed to write configuration file: {}", args.path.display()))?;

    info!(path = %args.path.display(), "Configuration file created");
    println!(
        "{} Configuration written to {}",
        "✓".bright_green().bold(),
        args.path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DEFAULT_CONFIG_TEMPLATE};

    #[test]
    fn test_init_writes_template_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        run(InitArgs { path: path.clone() }).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG_TEMPLATE);
        assert!(Config::load(&path).is_ok());

        std::fs::write(&path, "driver: local_cmd\n").unwrap();
        let err = run(InitArgs { path: path.clone() }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "driver: local_cmd\n");
    }
}

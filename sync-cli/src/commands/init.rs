//! Write the CLI config.

use anyhow::{Context, Result};
use habit_sync_client::SyncConfig;
use std::path::Path;
use std::time::Duration;

use crate::config::CliConfig;

/// Run the init command.
pub fn run(data_dir: &Path, base_url: &str, timeout_secs: Option<u64>, force: bool) -> Result<()> {
    if CliConfig::exists(data_dir) && !force {
        anyhow::bail!(
            "Already initialized. Use --force to overwrite {}.",
            CliConfig::path(data_dir).display()
        );
    }

    let mut server = SyncConfig::new(base_url);
    if let Some(secs) = timeout_secs {
        server = server.with_timeout(Duration::from_secs(secs));
    }
    let config = CliConfig { server };
    config
        .save(data_dir)
        .context("Failed to save configuration")?;

    println!("Initialized habit tracker");
    println!();
    println!("  Server:   {}", config.server.base_url);
    println!("  Timeout:  {}s", config.server.timeout_secs);
    println!("  Data dir: {}", data_dir.display());
    println!();
    println!("Next steps:");
    println!("  1. Add a habit: habits add \"Drink water\" --need 8");
    println!("  2. Mark it done: habits done <id>");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_writes_config() {
        let dir = tempdir().unwrap();
        run(dir.path(), "http://127.0.0.1:9000/", Some(5), false).unwrap();

        let config = CliConfig::load(dir.path()).unwrap();
        assert_eq!(config.server.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.server.timeout_secs, 5);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        run(dir.path(), "http://a.example", None, false).unwrap();

        assert!(run(dir.path(), "http://b.example", None, false).is_err());
        run(dir.path(), "http://b.example", None, true).unwrap();
        assert_eq!(
            CliConfig::load(dir.path()).unwrap().server.base_url,
            "http://b.example"
        );
    }
}

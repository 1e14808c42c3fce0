use std::path::Path;

use crate::config::Config;

const PROBE_FILE: &str = ".write-test";

pub fn print_banner(config: &Config) {
    let banner = format!(
        r#"
                 __  _ ____        __
    ____  ____  / /_(_) __/_  ____/ /
   / __ \/ __ \/ __/ / /_/ / / / __  /
  / / / / /_/ / /_/ / __/ /_/ / /_/ /
 /_/ /_/\____/\__/_/_/  \__, /\__,_/
                       /____/

notifyd v{}
watching containers labelled {}={}
"#,
        env!("CARGO_PKG_VERSION"),
        config.trigger_label,
        config.trigger_value,
    );

    println!("{}", banner);
}

/// Make sure the data directory exists and is writable.
///
/// Creates the directory when missing, then writes and removes a scratch file.
pub async fn check_storage(data_dir: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !data_dir.exists() {
        tracing::info!("Creating data directory: {}", data_dir.display());
        tokio::fs::create_dir_all(data_dir).await?;
    }

    if !data_dir.is_dir() {
        return Err(format!("Data path is not a directory: {}", data_dir.display()).into());
    }

    let probe = data_dir.join(PROBE_FILE);
    tokio::fs::write(&probe, b"test").await
        .map_err(|e| format!("Cannot write to {}: {}", data_dir.display(), e))?;
    tokio::fs::remove_file(&probe).await?;

    tracing::info!("Verified write access to {}", data_dir.display());
    Ok(())
}

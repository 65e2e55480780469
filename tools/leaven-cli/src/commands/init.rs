//! Write a configuration file.

use std::path::{Path, PathBuf};

use leaven_common::config::AppConfig;

/// Parse an `"x,y"` point prompt.
pub fn parse_point(value: &str) -> Result<[f64; 2], String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got \"{value}\""))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid coordinate \"{s}\": {e}"))
    };
    Ok([parse(x)?, parse(y)?])
}

pub fn run(
    config_path: &Path,
    points: Vec<[f64; 2]>,
    labels: Vec<i32>,
    folder: PathBuf,
    force: bool,
) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            config_path.display()
        );
    }

    let config = AppConfig::new(points, labels, folder);
    config.validate()?;
    config.save(config_path)?;

    println!("Configuration written to {}", config_path.display());
    println!("  Points: {:?}", config.input_points);
    println!("  Labels: {:?}", config.input_labels);
    println!("  Stills: {}", config.folder_path.display());
    println!("  Cache: {}", config.cache_path.display());
    println!("  GIF: {}", config.gif_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("120, 240.5").unwrap(), [120.0, 240.5]);
        assert!(parse_point("120").is_err());
        assert!(parse_point("a,1").is_err());
    }
}

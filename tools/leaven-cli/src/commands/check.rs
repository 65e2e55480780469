//! Check system capabilities.

use std::path::{Path, PathBuf};

use leaven_common::config::AppConfig;
use leaven_notify::Credentials;
use leaven_render_engine::command_exists;
use leaven_series_model::list_stills;

pub fn run(config_path: &Path) -> anyhow::Result<()> {
    println!("Leaven System Check");
    println!("{}", "=".repeat(50));

    let mut ready = true;

    if command_exists("ffmpeg") {
        println!("[OK] ffmpeg found");
    } else {
        println!("[MISSING] ffmpeg not found in PATH (needed for capture and GIF rendering)");
        ready = false;
    }

    match AppConfig::load(config_path) {
        Ok(config) => {
            println!("[OK] Config: {}", config_path.display());
            println!(
                "     {} point prompts, poll every {}s",
                config.input_points.len(),
                config.poll_interval_secs
            );

            match list_stills(&config.folder_path) {
                Ok(stills) => println!(
                    "[OK] Stills folder: {} ({} stills)",
                    config.folder_path.display(),
                    stills.len()
                ),
                Err(e) => println!("[WARN] Stills folder: {e}"),
            }

            match find_program(&config.extractor.program) {
                Some(path) => println!("[OK] Segmentation worker: {}", path.display()),
                None => {
                    println!(
                        "[MISSING] Segmentation worker '{}' not found",
                        config.extractor.program
                    );
                    ready = false;
                }
            }
        }
        Err(e) => {
            println!("[MISSING] Config: {e}");
            ready = false;
        }
    }

    match Credentials::from_env() {
        Ok(credentials) => println!("[OK] Email alerts to {}", credentials.email()),
        Err(e) => println!("[WARN] {e} (use `leaven watch --no-email` to log alerts instead)"),
    }

    println!();
    if ready {
        println!("All required capabilities are available. Leaven is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}

/// Resolve `program` as a path or through `PATH`.
fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| p.is_file() || p.with_extension("exe").is_file())
}

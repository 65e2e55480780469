//! Render the growth GIF from the current stills.

use std::path::{Path, PathBuf};

use leaven_common::config::AppConfig;
use leaven_render_engine::{render_growth_gif, FfmpegGifRenderer, GifJob};
use leaven_series_model::list_stills;

pub fn run(config_path: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path)?;
    let output = output.unwrap_or_else(|| config.gif_path.clone());

    let stills = list_stills(&config.folder_path)?;
    println!("Rendering {} stills to {}", stills.len(), output.display());

    let job = GifJob::new(
        stills.iter().map(|s| s.path().to_path_buf()).collect(),
        output,
    );
    let written = render_growth_gif(&FfmpegGifRenderer::new(), &job)?;
    println!("GIF saved to: {}", written.display());

    Ok(())
}

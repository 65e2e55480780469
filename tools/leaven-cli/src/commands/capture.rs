//! Capture webcam stills.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use leaven_capture_engine::{
    existing_entries, get_backend, prepare_output_dir, CaptureDevice, CaptureSession,
    DirectoryChoice, SessionConfig,
};

pub async fn run(
    output: PathBuf,
    device: String,
    interval: u64,
    restart: bool,
    resume: bool,
) -> anyhow::Result<()> {
    let choice = if restart {
        DirectoryChoice::Restart
    } else if resume || existing_entries(&output)? == 0 {
        DirectoryChoice::Resume
    } else {
        ask_directory_choice(&output)?
    };
    prepare_output_dir(&output, choice)?;

    let device = CaptureDevice::parse(&device);
    println!("Capturing stills from webcam {device}");
    println!("  Output: {}", output.display());
    println!("  Interval: {interval}s");
    println!("Each still is named with its UTC capture time.");
    println!("Press Ctrl+C to stop capturing...");
    println!();

    let mut session = CaptureSession::new(
        SessionConfig {
            output_dir: output,
            interval: Duration::from_secs(interval),
        },
        get_backend(device),
    );
    let captured = session.run_until(super::ctrl_c()).await?;

    println!();
    println!("Captured {captured} stills");
    Ok(())
}

fn ask_directory_choice(dir: &Path) -> anyhow::Result<DirectoryChoice> {
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!(
            "Files found in {}. Do you want to [r]estart or [c]ontinue? ",
            dir.display()
        );
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            anyhow::bail!("No answer given; pass --restart or --resume");
        }
        if let Some(choice) = DirectoryChoice::from_answer(&line) {
            return Ok(choice);
        }
    }
}

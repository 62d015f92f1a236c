//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg commands.
///
/// Inputs are listed in order; output arguments apply after the last `-i`.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input file.
    pub fn input(mut self, input: impl AsRef<Path>) -> Self {
        self.inputs.push(input.as_ref().to_path_buf());
        self
    }

    /// Add an output argument (after the inputs).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Resolve the ffmpeg binary, honoring `FFMPEG_PATH`.
    fn ffmpeg_binary() -> MediaResult<PathBuf> {
        if let Ok(path) = std::env::var("FFMPEG_PATH") {
            return Ok(PathBuf::from(path));
        }
        which::which("ffmpeg").map_err(|e| MediaError::FfmpegNotFound(e.to_string()))
    }

    /// Full argument list, without the binary itself.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            self.log_level.clone(),
        ];
        if self.overwrite {
            args.push("-y".to_string());
        }
        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.display().to_string());
        }
        args.extend(self.output_args.iter().cloned());
        args.push(self.output.display().to_string());
        args
    }

    /// Run ffmpeg to completion.
    pub async fn run(&self) -> MediaResult<()> {
        let binary = Self::ffmpeg_binary()?;
        let args = self.build_args();

        debug!("Running {} {}", binary.display(), args.join(" "));

        let output = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::FfmpegFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}

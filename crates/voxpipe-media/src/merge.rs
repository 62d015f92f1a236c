//! Audio/video merge.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;

/// Merge a staged audio file onto a staged video file.
///
/// The video stream is copied untouched; the audio stream is encoded to AAC
/// and attached. `-shortest` trims the output to the shorter of the two, so
/// a voiceover shorter than the video ends cleanly.
pub async fn merge_audio_video(
    audio_path: &Path,
    video_path: &Path,
    out_dir: &Path,
) -> MediaResult<PathBuf> {
    let output = out_dir.join("merged.mp4");

    FfmpegCommand::new(&output)
        .input(video_path)
        .input(audio_path)
        .output_args([
            "-map", "0:v:0",
            "-map", "1:a:0",
            "-c:v", "copy",
            "-c:a", "aac",
            "-shortest",
        ])
        .run()
        .await?;

    info!(
        "Merged {} + {} into {}",
        video_path.display(),
        audio_path.display(),
        output.display()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::FfmpegCommand;

    #[test]
    fn merge_command_copies_video_and_encodes_audio() {
        let args = FfmpegCommand::new("/tmp/out/merged.mp4")
            .input("/tmp/video.mp4")
            .input("/tmp/audio.wav")
            .output_args([
                "-map", "0:v:0",
                "-map", "1:a:0",
                "-c:v", "copy",
                "-c:a", "aac",
                "-shortest",
            ])
            .build_args();

        let joined = args.join(" ");
        assert!(joined.contains("-c:v copy"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("-shortest"));
    }
}

use std::path::Path;

use crate::stt::Segment;
use crate::Result;

/// Write segments as a WebVTT subtitle track
pub fn write_vtt(segments: &[Segment], path: &Path) -> Result<()> {
    let mut content = String::from("WEBVTT\n\n");

    for segment in segments {
        content.push_str(&format!(
            "{} --> {}\n{}\n\n",
            vtt_timestamp(segment.start),
            vtt_timestamp(segment.end),
            segment.text.trim()
        ));
    }

    fs_err::write(path, content)?;
    Ok(())
}

/// Format seconds as a VTT cue timestamp (HH:MM:SS.mmm)
fn vtt_timestamp(seconds: f64) -> String {
    let total_millis = (seconds * 1000.0) as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1_000;
    let millis = total_millis % 1_000;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vtt_timestamp() {
        assert_eq!(vtt_timestamp(0.0), "00:00:00.000");
        assert_eq!(vtt_timestamp(65.123), "00:01:05.123");
        assert_eq!(vtt_timestamp(3661.500), "01:01:01.500");
    }

    #[test]
    fn writes_header_and_cues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id1.vtt");

        let segments = vec![
            Segment { start: 0.0, end: 2.5, text: " hello there ".to_string() },
            Segment { start: 2.5, end: 4.0, text: "general".to_string() },
        ];
        write_vtt(&segments, &path).unwrap();

        let content = fs_err::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "WEBVTT\n\n\
             00:00:00.000 --> 00:00:02.500\nhello there\n\n\
             00:00:02.500 --> 00:00:04.000\ngeneral\n\n"
        );
    }

    #[test]
    fn empty_transcription_still_produces_a_track() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id1.vtt");

        write_vtt(&[], &path).unwrap();

        assert_eq!(fs_err::read_to_string(&path).unwrap(), "WEBVTT\n\n");
    }
}

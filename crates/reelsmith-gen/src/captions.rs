//! Caption generation from narration audio via speech-to-text

use reelsmith_core::Result;
use reelsmith_timeline::captions::save_captions;
use reelsmith_timeline::{CaptionTrack, CaptionWord};
use std::path::{Path, PathBuf};

/// Audio files to transcribe, with the caption id each one gets
///
/// A directory yields every `.mp3` in it, sorted by name. A file yields
/// itself.
pub fn collect_inputs(input: &Path) -> Result<Vec<(String, PathBuf)>> {
    if input.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(input)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map(|e| e == "mp3").unwrap_or(false))
            .collect();
        files.sort();
        Ok(files
            .into_iter()
            .map(|p| (clip_id(&p), p))
            .collect())
    } else {
        // read it now so a bad path fails before any upload
        std::fs::metadata(input)?;
        Ok(vec![(clip_id(input), input.to_path_buf())])
    }
}

fn clip_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Transcribe each input in order. A file that fails gets an empty word list.
pub fn transcribe_all<F>(inputs: &[(String, PathBuf)], mut transcribe: F) -> Vec<CaptionTrack>
where
    F: FnMut(&Path) -> Result<Vec<CaptionWord>>,
{
    inputs
        .iter()
        .map(|(id, path)| {
            println!("Transcribing: {}...", id);
            let words = match transcribe(path) {
                Ok(words) => {
                    println!("  → {} words", words.len());
                    words
                }
                Err(e) => {
                    eprintln!("  ✗ Failed: {}", e);
                    Vec::new()
                }
            };
            CaptionTrack::new(id.clone(), words)
        })
        .collect()
}

/// Collect, transcribe and save; returns the tracks written to `output`
pub fn generate_captions<F>(input: &Path, output: &Path, transcribe: F) -> Result<Vec<CaptionTrack>>
where
    F: FnMut(&Path) -> Result<Vec<CaptionWord>>,
{
    let inputs = collect_inputs(input)?;
    if input.is_dir() {
        println!("Found {} audio files in {}", inputs.len(), input.display());
    }
    let tracks = transcribe_all(&inputs, transcribe);
    save_captions(output, &tracks)?;
    println!("Captions saved to: {}", output.display());
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsmith_core::ReelError;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("reelsmith_captions_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_directory_inputs_are_sorted_mp3s() {
        let dir = temp_dir();
        for name in ["ch2-a.mp3", "ch1-b.mp3", "notes.txt", "ch1-a.mp3"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        let ids: Vec<String> = collect_inputs(&dir).unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["ch1-a", "ch1-b", "ch2-a"]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_failed_file_gets_empty_words() {
        let dir = temp_dir();
        std::fs::write(dir.join("a.mp3"), b"x").unwrap();
        std::fs::write(dir.join("b.mp3"), b"x").unwrap();
        let output = dir.join("out/captions.json");

        let tracks = generate_captions(&dir, &output, |path| {
            if path.ends_with("a.mp3") {
                Err(ReelError::upstream("ElevenLabs STT", 422, "unsupported"))
            } else {
                Ok(vec![CaptionWord {
                    text: "Namaste".to_string(),
                    start: 0.0,
                    end: 0.6,
                }])
            }
        })
        .unwrap();

        assert!(tracks[0].words.is_empty());
        assert_eq!(tracks[1].words.len(), 1);
        let saved = reelsmith_timeline::captions::load_captions(&output).unwrap();
        assert_eq!(saved, tracks);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_single_file_input() {
        let dir = temp_dir();
        let file = dir.join("intro.mp3");
        std::fs::write(&file, b"x").unwrap();
        let inputs = collect_inputs(&file).unwrap();
        assert_eq!(inputs, vec![("intro".to_string(), file.clone())]);
        assert!(collect_inputs(&dir.join("missing.mp3")).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}

use crate::wav;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use transkh_core::{AudioError, SynthesisResult};

/// Per-run scratch directory, removed when dropped.
#[derive(Debug)]
pub struct ScratchSpace {
    dir: TempDir,
}

impl ScratchSpace {
    /// Create a uniquely named directory under `base`, creating `base` if needed.
    pub fn create_in(base: &Path, run_id: &str) -> Result<Self, AudioError> {
        std::fs::create_dir_all(base)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("transkh-{run_id}-"))
            .tempdir_in(base)?;
        tracing::trace!(path = %dir.path().display(), "scratch space created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a synthesis result as a mono WAV at its declared sample rate.
    pub fn write_wav(&self, name: &str, result: &SynthesisResult) -> Result<PathBuf, AudioError> {
        let path = self.dir.path().join(name);
        wav::write_pcm16(&path, &result.samples, result.sample_rate)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transkh_core::Language;

    #[test]
    fn test_scratch_spaces_are_distinct() {
        let base = tempfile::tempdir().unwrap();
        let a = ScratchSpace::create_in(base.path(), "run").unwrap();
        let b = ScratchSpace::create_in(base.path(), "run").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().starts_with(base.path()));
    }

    #[test]
    fn test_scratch_removed_on_drop() {
        let base = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::create_in(base.path(), "drop").unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.exists());
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_creates_missing_base() {
        let base = tempfile::tempdir().unwrap();
        let nested = base.path().join("a").join("b");
        let scratch = ScratchSpace::create_in(&nested, "nested").unwrap();
        assert!(scratch.path().starts_with(&nested));
    }

    #[test]
    fn test_write_wav_uses_declared_rate() {
        let base = tempfile::tempdir().unwrap();
        let scratch = ScratchSpace::create_in(base.path(), "wav").unwrap();
        let result = SynthesisResult {
            samples: vec![0.0, 0.25, -0.25],
            sample_rate: 22050,
            language: Language::Khmer,
        };
        let path = scratch.write_wav("reply.wav", &result).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 3);
    }
}

//! Background footage discovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reelkit_common::error::{ReelError, ReelResult};
use reelkit_timeline_model::asset::MediaAsset;

use crate::probe::MediaProber;

/// File extensions treated as video footage (case-insensitive).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Video files directly inside `dir`, sorted by path.
pub fn find_footage(dir: &Path) -> ReelResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ReelError::no_assets(dir.display().to_string()));
    }
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_video_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    if paths.is_empty() {
        return Err(ReelError::no_assets(dir.display().to_string()));
    }
    Ok(paths)
}

/// Read metadata for every video in `dir`.
///
/// Files that fail to decode are skipped with a warning; the call fails
/// with `NoAssetsFound` only when nothing usable remains.
pub fn load_footage(dir: &Path, prober: &dyn MediaProber) -> ReelResult<Vec<Arc<MediaAsset>>> {
    let paths = find_footage(dir)?;
    let mut assets = Vec::with_capacity(paths.len());
    let mut skipped = 0usize;

    for path in &paths {
        match prober.probe_video(path) {
            Ok(asset) => {
                tracing::debug!(
                    asset = %asset.name(),
                    width = asset.width,
                    height = asset.height,
                    duration_secs = asset.duration_secs,
                    "Scanned footage"
                );
                assets.push(Arc::new(asset));
            }
            Err(err @ ReelError::AssetDecode { .. }) => {
                tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable footage");
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        dir = %dir.display(),
        found = paths.len(),
        usable = assets.len(),
        skipped,
        prober = prober.name(),
        "Footage loaded"
    );

    if assets.is_empty() {
        return Err(ReelError::no_assets(dir.display().to_string()));
    }
    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads "WIDTHxHEIGHT@DURATION" from the file body.
    struct FakeProber;

    impl MediaProber for FakeProber {
        fn probe_video(&self, path: &Path) -> ReelResult<MediaAsset> {
            let body = std::fs::read_to_string(path)?;
            let parsed: Option<(u32, u32, f64)> = body.trim().split_once('@').and_then(|(dims, dur)| {
                let (w, h) = dims.split_once('x')?;
                Some((w.parse().ok()?, h.parse().ok()?, dur.parse().ok()?))
            });
            match parsed {
                Some((w, h, d)) => Ok(MediaAsset::video(path, w, h, d, 30.0)),
                None => Err(ReelError::asset_decode(path, "corrupt")),
            }
        }

        fn probe_audio(&self, path: &Path) -> ReelResult<MediaAsset> {
            Err(ReelError::asset_decode(path, "not audio"))
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[test]
    fn test_extension_filter() {
        assert!(is_video_file(Path::new("a/b.MP4")));
        assert!(is_video_file(Path::new("clip.webm")));
        assert!(!is_video_file(Path::new("notes.txt")));
        assert!(!is_video_file(Path::new("noext")));
    }

    #[test]
    fn test_corrupt_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.mp4"), "1920x1080@20").unwrap();
        std::fs::write(dir.path().join("bad.mov"), "garbage").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "1920x1080@20").unwrap();

        let assets = load_footage(dir.path(), &FakeProber).unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].name(), "good.mp4");
    }

    #[test]
    fn test_nothing_usable_is_no_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.mp4"), "garbage").unwrap();
        assert!(matches!(
            load_footage(dir.path(), &FakeProber),
            Err(ReelError::NoAssetsFound { .. })
        ));

        let empty = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_footage(empty.path()),
            Err(ReelError::NoAssetsFound { .. })
        ));
        assert!(find_footage(&empty.path().join("missing")).is_err());
    }

    #[test]
    fn test_paths_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.mp4", "a.mkv", "b.avi"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let names: Vec<_> = find_footage(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.mkv", "b.avi", "c.mp4"]);
    }
}

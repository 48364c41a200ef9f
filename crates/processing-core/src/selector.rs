//! Segment selection: pick a trim window of a requested length.
//!
//! This is the only place randomness enters background selection. The RNG
//! is always supplied by the caller so selections are reproducible.

use std::sync::Arc;

use rand::Rng;
use reelkit_common::error::{ReelError, ReelResult};
use reelkit_timeline_model::asset::MediaAsset;
use reelkit_timeline_model::clip::Clip;

/// Trim `asset` to `requested_secs`, starting at `start_secs` or at a
/// uniformly random offset in `[0, max(0, duration - requested)]`.
///
/// Assets shorter than the request yield a shorter clip; callers must
/// tolerate under-length segments.
pub fn select_segment<R: Rng + ?Sized>(
    asset: Arc<MediaAsset>,
    requested_secs: f64,
    start_secs: Option<f64>,
    rng: &mut R,
) -> ReelResult<Clip> {
    if !(requested_secs.is_finite() && requested_secs > 0.0) {
        return Err(ReelError::invalid_input(format!(
            "requested segment duration must be positive, got {requested_secs}"
        )));
    }
    let duration = asset.duration_secs;
    if !(duration.is_finite() && duration > 0.0) {
        return Err(ReelError::asset_decode(
            asset.path.clone(),
            format!("unusable duration {duration}s"),
        ));
    }

    let start = match start_secs {
        Some(start) => {
            if !(start >= 0.0 && start < duration) {
                return Err(ReelError::invalid_input(format!(
                    "start {start}s outside [0, {duration}) of {}",
                    asset.name()
                )));
            }
            start
        }
        None => {
            let max_start = (duration - requested_secs).max(0.0);
            if max_start > 0.0 {
                rng.gen_range(0.0..=max_start)
            } else {
                0.0
            }
        }
    };
    let end = (start + requested_secs).min(duration);

    tracing::debug!(
        asset = %asset.name(),
        start_secs = start,
        end_secs = end,
        requested_secs,
        "Segment selected"
    );

    Clip::new(asset, start, end).map_err(|e| ReelError::invalid_input(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn asset(duration: f64) -> Arc<MediaAsset> {
        Arc::new(MediaAsset::video("stock.mp4", 1920, 1080, duration, 30.0))
    }

    #[test]
    fn test_random_start_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let clip = select_segment(asset(30.0), 8.0, None, &mut rng).unwrap();
            assert!(clip.in_secs >= 0.0 && clip.in_secs <= 22.0);
            assert!((clip.duration() - 8.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_short_asset_is_clamped() {
        let mut rng = StdRng::seed_from_u64(7);
        let clip = select_segment(asset(5.0), 8.0, None, &mut rng).unwrap();
        assert_eq!(clip.in_secs, 0.0);
        assert_eq!(clip.out_secs, 5.0);
    }

    #[test]
    fn test_explicit_start() {
        let mut rng = StdRng::seed_from_u64(7);
        let clip = select_segment(asset(30.0), 8.0, Some(25.0), &mut rng).unwrap();
        assert_eq!(clip.in_secs, 25.0);
        assert_eq!(clip.out_secs, 30.0);
        assert!(select_segment(asset(30.0), 8.0, Some(30.0), &mut rng).is_err());
    }

    #[test]
    fn test_same_seed_same_selection() {
        let a = select_segment(asset(60.0), 10.0, None, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = select_segment(asset(60.0), 10.0, None, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a.in_secs, b.in_secs);
        assert_eq!(a.out_secs, b.out_secs);
    }

    #[test]
    fn test_invalid_request() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_segment(asset(10.0), 0.0, None, &mut rng).is_err());
        assert!(matches!(
            select_segment(asset(0.0), 1.0, None, &mut rng),
            Err(ReelError::AssetDecode { .. })
        ));
    }
}

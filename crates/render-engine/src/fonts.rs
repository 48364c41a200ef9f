//! Font resolution ahead of export.

use std::path::PathBuf;

use reelkit_common::error::{ReelError, ReelResult};
use reelkit_timeline_model::text::{FontChoice, FontFallback};

/// Pick the first existing font among `candidates`.
///
/// With no usable candidate, `PlainOutlined` falls back to the renderer's
/// built-in font and `RequireStyled` fails with a configuration error.
pub fn resolve_font(candidates: &[PathBuf], fallback: FontFallback) -> ReelResult<FontChoice> {
    if let Some(path) = candidates.iter().find(|path| path.is_file()) {
        tracing::debug!(font = %path.display(), "Using styled font");
        return Ok(FontChoice::Styled { path: path.clone() });
    }

    match fallback {
        FontFallback::PlainOutlined => {
            tracing::info!(
                candidates = candidates.len(),
                "No styled font found; rendering plain outlined text"
            );
            Ok(FontChoice::PlainOutlined)
        }
        FontFallback::RequireStyled => Err(ReelError::config(format!(
            "none of the {} configured font candidates exist",
            candidates.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("second.ttf");
        let third = dir.path().join("third.ttf");
        std::fs::write(&second, b"font").unwrap();
        std::fs::write(&third, b"font").unwrap();

        let candidates = vec![dir.path().join("missing.ttf"), second.clone(), third];
        assert_eq!(
            resolve_font(&candidates, FontFallback::RequireStyled).unwrap(),
            FontChoice::Styled { path: second }
        );
    }

    #[test]
    fn test_fallback_strategies() {
        let candidates = vec![PathBuf::from("/no/such/font.ttf")];
        assert_eq!(
            resolve_font(&candidates, FontFallback::PlainOutlined).unwrap(),
            FontChoice::PlainOutlined
        );
        assert!(matches!(
            resolve_font(&candidates, FontFallback::RequireStyled),
            Err(ReelError::Config { .. })
        ));
        assert!(matches!(
            resolve_font(&[], FontFallback::RequireStyled),
            Err(ReelError::Config { .. })
        ));
    }
}

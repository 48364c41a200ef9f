//! Print a saved timeline and check its invariants.

use std::path::Path;

use reelkit_timeline_model::text::FontChoice;
use reelkit_timeline_model::timeline::Timeline;

pub fn run(path: &Path) -> anyhow::Result<()> {
    let timeline = Timeline::load_json(path)
        .map_err(|e| anyhow::anyhow!("Failed to load timeline {}: {e}", path.display()))?;

    println!("Timeline: {}", path.display());
    println!("  Size: {}x{}", timeline.width, timeline.height);
    println!("  Duration: {:.2}s", timeline.total_duration_secs);

    println!("  Clips ({}):", timeline.clips.len());
    for (i, clip) in timeline.clips.iter().enumerate() {
        let name = clip
            .asset
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| clip.asset.path.display().to_string());
        println!(
            "    #{i} {name}: source {:.2}-{:.2}s at {:.2}-{:.2}s (fade in {:.2}s, out {:.2}s)",
            clip.in_secs,
            clip.out_secs,
            clip.layer_start_secs,
            clip.layer_end(),
            clip.fade_in_secs,
            clip.fade_out_secs,
        );
    }

    if !timeline.transitions.is_empty() {
        println!("  Transitions:");
        for t in &timeline.transitions {
            println!(
                "    {} -> {}: {} ({:.2}s requested, {:.2}s overlap)",
                t.from_clip, t.to_clip, t.style, t.requested_secs, t.overlap_secs
            );
        }
    }

    let fragments = timeline.fragments();
    if !fragments.is_empty() {
        let font = match &timeline.text.font {
            FontChoice::Styled { path } => path.display().to_string(),
            FontChoice::PlainOutlined => "plain outlined".to_string(),
        };
        println!("  Text ({} fragments, font: {font}):", fragments.len());
        for fragment in fragments {
            println!(
                "    [{:.2}-{:.2}s] {}",
                fragment.display_start_secs, fragment.display_end_secs, fragment.text
            );
        }
    }

    match &timeline.narration {
        Some(track) => println!(
            "  Narration: {} ({:.2}s)",
            track.asset.path.display(),
            track.duration()
        ),
        None => println!("  Narration: none"),
    }

    match timeline.validate() {
        Ok(()) => {
            println!("  Invariants: OK");
            Ok(())
        }
        Err(violation) => {
            println!("  Invariants: VIOLATED ({violation})");
            Err(anyhow::anyhow!("Timeline {} is invalid: {violation}", path.display()))
        }
    }
}

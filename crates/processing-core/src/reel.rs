//! Reel timeline assembly: a window of a background timeline plus
//! narration and timed text for one content item.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use reelkit_common::error::{ReelError, ReelResult};
use reelkit_timeline_model::clip::Clip;
use reelkit_timeline_model::content::ContentItem;
use reelkit_timeline_model::text::{FontChoice, TextAnimationKind, TextStyle};
use reelkit_timeline_model::timeline::{NarrationTrack, Timeline};
use reelkit_timeline_model::transition::TransitionRequest;
use reelkit_timeline_model::TIME_EPSILON;

use crate::blender::LayoutCursor;
use crate::chunker::{chunk, word_count};
use crate::composer::{compose, ComposeConfig, ComposeRequest};
use crate::duration::{estimate_reading_duration, resolve, DurationSource, DEFAULT_WORDS_PER_MINUTE};

/// Upper bound on windowed segments when looping a short background.
const MAX_WINDOW_SEGMENTS: usize = 100_000;

/// Configuration for reel assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ReelConfig {
    /// Hard cap on the reel length.
    pub max_duration_secs: f64,
    pub words_per_chunk: usize,
    /// Narration text is truncated to this many words.
    pub max_words: usize,
    /// Reading rate used when no narration duration is available.
    pub words_per_minute: f64,
    pub text_style: TextStyle,
    pub animation: TextAnimationKind,
    pub font: FontChoice,
    pub terminal_fade_secs: f64,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: 90.0,
            words_per_chunk: 8,
            max_words: 200,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            text_style: TextStyle::default(),
            animation: TextAnimationKind::Fade,
            font: FontChoice::PlainOutlined,
            terminal_fade_secs: 0.5,
        }
    }
}

/// One reel of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ReelRequest {
    pub item: ContentItem,
    pub narration: Option<NarrationTrack>,
    pub seed: u64,
}

/// Build the reel timeline for `item` over `background`.
///
/// The total duration comes from the narration when it has a usable
/// length, otherwise from the reading-time estimate; both are capped.
pub fn build_reel_timeline(
    background: &Timeline,
    item: &ContentItem,
    narration: Option<NarrationTrack>,
    config: &ReelConfig,
    seed: u64,
) -> ReelResult<Timeline> {
    let text = item.narration_text_limited(config.max_words);
    let words = word_count(&text);
    if words == 0 {
        return Err(ReelError::empty_content(format!(
            "content item {:?} has no text to narrate",
            item.title
        )));
    }

    let estimated = estimate_reading_duration(words, config.words_per_minute);
    let measured = narration.as_ref().map(NarrationTrack::duration);
    let resolved = resolve(measured, estimated, config.max_duration_secs)?;
    let narration = match resolved.source {
        DurationSource::MeasuredAudio => narration,
        DurationSource::ReadingEstimate => None,
    };
    let total = resolved.total_secs;

    let background_total = background.total_duration_secs;
    let mut rng = StdRng::seed_from_u64(seed);
    let start = if background_total > total {
        rng.gen_range(0.0..=background_total - total)
    } else {
        0.0
    };
    let (segments, transitions) = window_background(background, start, total)?;

    tracing::info!(
        title = %item.title,
        words,
        total_secs = total,
        source = ?resolved.source,
        capped = resolved.capped,
        window_start_secs = start,
        segments = segments.len(),
        "Composing reel"
    );

    let request = ComposeRequest {
        segments,
        transitions,
        fragments: chunk(&text, config.words_per_chunk),
        narration,
        total_duration_secs: total,
    };
    let compose_config = ComposeConfig {
        width: background.width,
        height: background.height,
        opening_fade_secs: 0.0,
        terminal_fade_secs: config.terminal_fade_secs,
        text_animation: config.animation,
        text_style: config.text_style.clone(),
        font: config.font.clone(),
    };
    compose(&request, &compose_config)
}

/// Build independent reels on worker threads. Results are in request
/// order; a failed reel never affects its siblings.
pub fn build_reel_batch(
    background: &Timeline,
    requests: &[ReelRequest],
    config: &ReelConfig,
) -> Vec<ReelResult<Timeline>> {
    requests
        .par_iter()
        .map(|request| {
            build_reel_timeline(
                background,
                &request.item,
                request.narration.clone(),
                config,
                request.seed,
            )
        })
        .collect()
}

/// Segments and transitions covering `[start_secs, start_secs + total_secs)`
/// of `background`, ready to be recomposed from time zero.
///
/// Clips keep their crop and filters. When the background ends before the
/// window does, it loops from its first clip, joined by a cut.
pub fn window_background(
    background: &Timeline,
    start_secs: f64,
    total_secs: f64,
) -> ReelResult<(Vec<Clip>, Vec<TransitionRequest>)> {
    let clips = &background.clips;
    if clips.is_empty() {
        return Err(ReelError::no_assets("background timeline"));
    }
    if !(background.total_duration_secs > 0.0) {
        return Err(ReelError::invalid_input(format!(
            "background duration must be positive, got {}",
            background.total_duration_secs
        )));
    }
    if !(start_secs >= 0.0 && start_secs < background.total_duration_secs) {
        return Err(ReelError::invalid_input(format!(
            "window start {start_secs}s outside background of {}s",
            background.total_duration_secs
        )));
    }

    // Last clip starting at or before the window start.
    let first = clips
        .iter()
        .rposition(|clip| clip.layer_start_secs <= start_secs + TIME_EPSILON)
        .unwrap_or(0);
    let offset = (start_secs - clips[first].layer_start_secs).max(0.0);

    let mut segments = Vec::new();
    let mut transitions = Vec::new();
    let mut cursor = LayoutCursor::default();
    let mut index = first;
    let mut join = TransitionRequest::cut();

    while cursor.end_secs() < total_secs - TIME_EPSILON {
        if segments.len() >= MAX_WINDOW_SEGMENTS {
            return Err(ReelError::invariant(format!(
                "background of {}s cannot cover a {total_secs}s window",
                background.total_duration_secs
            )));
        }

        let mut clip = clips[index].clone().without_curves();
        if segments.is_empty() {
            clip.in_secs += offset;
        }
        if clip.duration() > TIME_EPSILON {
            if !segments.is_empty() {
                transitions.push(join);
            }
            cursor.push(clip.duration(), join);
            segments.push(clip.placed_at(0.0));
        }

        if index + 1 < clips.len() {
            join = background
                .transitions
                .get(index)
                .map(|spec| spec.request())
                .unwrap_or_else(TransitionRequest::cut);
            index += 1;
        } else {
            tracing::debug!(
                background_secs = background.total_duration_secs,
                "Looping background"
            );
            join = TransitionRequest::cut();
            index = 0;
        }
    }

    Ok((segments, transitions))
}

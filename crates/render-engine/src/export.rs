//! Export configuration and job management.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;

use reelkit_common::config::ExportDefaults;
use reelkit_common::error::{ReelError, ReelResult};
use reelkit_narration::subtitles::{save_subtitles, sidecar_path};
use reelkit_processing_core::aspect::{crop_dimensions, TargetFrame};
use reelkit_sources::probe::command_exists;
use reelkit_timeline_model::clip::Clip;
use reelkit_timeline_model::effects::{FrameFilter, ScaleRamp};
use reelkit_timeline_model::text::{FontChoice, TextFragment, TextStyle};
use reelkit_timeline_model::timeline::Timeline;

/// Encoder settings applied to every export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSettings {
    pub fps: u32,
    pub video_codec: String,
    /// Constant rate factor (lower is better quality).
    pub crf: u32,
    pub preset: String,
    pub audio_bitrate_kbps: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            video_codec: "libx264".to_string(),
            crf: 23,
            preset: "medium".to_string(),
            audio_bitrate_kbps: 192,
        }
    }
}

impl From<&ExportDefaults> for ExportSettings {
    fn from(config: &ExportDefaults) -> Self {
        Self {
            fps: config.fps,
            video_codec: config.video_codec.clone(),
            crf: config.crf,
            preset: config.preset.clone(),
            audio_bitrate_kbps: config.audio_bitrate_kbps,
        }
    }
}

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Finished timeline. Never modified by the export.
    pub timeline: Arc<Timeline>,

    /// Output file path.
    pub output_path: PathBuf,

    pub settings: ExportSettings,

    /// Wall-clock budget for the render.
    pub deadline: Option<Duration>,

    /// Write an SRT sidecar next to the video.
    pub write_subtitles: bool,
}

impl ExportJob {
    pub fn new(timeline: Arc<Timeline>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            timeline,
            output_path: output_path.into(),
            settings: ExportSettings::default(),
            deadline: None,
            write_subtitles: false,
        }
    }

    pub fn with_settings(mut self, settings: ExportSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_subtitles(mut self, write_subtitles: bool) -> Self {
        self.write_subtitles = write_subtitles;
        self
    }

    fn total_frames(&self) -> u64 {
        (self.timeline.total_duration_secs * self.settings.fps.max(1) as f64).ceil() as u64
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

/// Shared stop flag for cooperative cancellation.
///
/// Backends poll it while the encoder runs and stop it once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a finished export produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub output_path: PathBuf,
    pub duration_secs: f64,
    pub elapsed_secs: f64,
    pub subtitles_path: Option<PathBuf>,
}

/// Trait for render backends.
pub trait RenderBackend: Send {
    /// Execute the export job, honoring `cancel` and the job deadline.
    fn render(
        &mut self,
        job: &ExportJob,
        progress: Option<ProgressCallback>,
        cancel: &CancelFlag,
    ) -> ReelResult<()>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Export a timeline to a video file with ffmpeg.
///
/// This is the main entry point for rendering.
pub async fn export_timeline(
    job: ExportJob,
    progress: Option<ProgressCallback>,
    cancel: CancelFlag,
) -> ReelResult<ExportReport> {
    export_timeline_with(Box::new(FfmpegBackend::default()), job, progress, cancel).await
}

/// Export a timeline with an explicit backend.
pub async fn export_timeline_with(
    mut backend: Box<dyn RenderBackend>,
    job: ExportJob,
    progress: Option<ProgressCallback>,
    cancel: CancelFlag,
) -> ReelResult<ExportReport> {
    tracing::info!(
        output = %job.output_path.display(),
        duration_secs = job.timeline.total_duration_secs,
        clips = job.timeline.clips.len(),
        fragments = job.timeline.fragments().len(),
        "Starting export"
    );

    job.timeline
        .validate()
        .map_err(|e| ReelError::invalid_input(format!("Timeline is not exportable: {e}")))?;

    if cancel.is_cancelled() {
        return Err(ReelError::Cancelled);
    }

    if let Some(parent) = job.output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if let Some(cb) = &progress {
        cb(ExportProgress {
            progress: 0.0,
            frames_rendered: 0,
            total_frames: job.total_frames(),
            eta_secs: 0.0,
            stage: ExportStage::Preparing,
        });
    }

    if !backend.is_available() {
        return Err(ReelError::unsupported(format!(
            "Render backend {} is not available (expected it in PATH)",
            backend.name()
        )));
    }
    tracing::info!(backend = backend.name(), "Using render backend");

    let started = Instant::now();
    let job = tokio::task::spawn_blocking(move || {
        backend.render(&job, progress, &cancel).map(|()| job)
    })
    .await
    .map_err(|e| ReelError::export(format!("Render task failed: {e}")))??;

    let subtitles_path = if job.write_subtitles && !job.timeline.fragments().is_empty() {
        let path = sidecar_path(&job.output_path, "srt");
        save_subtitles(job.timeline.fragments(), &path)?;
        Some(path)
    } else {
        None
    };

    let report = ExportReport {
        output_path: job.output_path.clone(),
        duration_secs: job.timeline.total_duration_secs,
        elapsed_secs: started.elapsed().as_secs_f64(),
        subtitles_path,
    };
    tracing::info!(
        output = %report.output_path.display(),
        elapsed_secs = report.elapsed_secs,
        "Export finished"
    );
    Ok(report)
}

/// Outcome of one job in a batch export.
#[derive(Debug)]
pub struct BatchExportResult {
    pub output_path: PathBuf,
    pub result: ReelResult<ExportReport>,
}

/// Export several timelines with at most `max_concurrent` encodes at once.
///
/// Results come back in job order. A failed job never aborts its siblings.
pub async fn export_batch(
    jobs: Vec<ExportJob>,
    max_concurrent: usize,
    cancel: CancelFlag,
) -> Vec<BatchExportResult> {
    export_batch_with(jobs, max_concurrent, cancel, || {
        Box::new(FfmpegBackend::default()) as Box<dyn RenderBackend>
    })
    .await
}

/// Batch export with a backend factory (one backend per job).
pub async fn export_batch_with<F>(
    jobs: Vec<ExportJob>,
    max_concurrent: usize,
    cancel: CancelFlag,
    make_backend: F,
) -> Vec<BatchExportResult>
where
    F: Fn() -> Box<dyn RenderBackend> + Send + Sync + 'static,
{
    let limit = max_concurrent.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));
    let make_backend = Arc::new(make_backend);
    tracing::info!(jobs = jobs.len(), max_concurrent = limit, "Starting batch export");

    let mut handles = Vec::with_capacity(jobs.len());
    for job in jobs {
        let output_path = job.output_path.clone();
        let semaphore = Arc::clone(&semaphore);
        let make_backend = Arc::clone(&make_backend);
        let cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| ReelError::export(format!("Export queue closed: {e}")))?;
            export_timeline_with((*make_backend)(), job, None, cancel).await
        });
        handles.push((output_path, handle));
    }

    let mut results = Vec::with_capacity(handles.len());
    for (output_path, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(ReelError::export(format!("Export task failed: {e}"))),
        };
        if let Err(err) = &result {
            tracing::warn!(output = %output_path.display(), error = %err, "Export failed");
        }
        results.push(BatchExportResult {
            output_path,
            result,
        });
    }
    results
}

#[derive(Debug, Clone)]
struct ExportPlan {
    ffmpeg_args: Vec<String>,
    total_frames: u64,
    expected_duration_secs: f64,
}

/// Renders through a single ffmpeg filter graph.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    binary: String,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }
}

/// Stall warning interval for ffmpeg progress.
const STALL_WARNING_SECS: u64 = 10;
/// How often cancellation and the deadline are checked while ffmpeg is quiet.
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Padding of the backdrop box around text, in pixels.
const TEXT_BOX_PADDING_PX: u32 = 24;
const TEXT_LINE_SPACING_PX: u32 = 12;
/// Minimum outline width when no styled font is available.
const PLAIN_TEXT_BORDER_PX: u32 = 3;

impl FfmpegBackend {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn build_plan(&self, job: &ExportJob) -> ReelResult<ExportPlan> {
        let timeline = &job.timeline;
        let total = timeline.total_duration_secs;
        if !(total > 0.0) {
            return Err(ReelError::export("Export duration resolved to zero seconds"));
        }
        let fps = job.settings.fps.max(1);

        let mut args = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-nostats".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
        ];

        for clip in &timeline.clips {
            if !clip.asset.path.exists() {
                return Err(ReelError::FileNotFound {
                    path: clip.asset.path.clone(),
                });
            }
            args.push("-ss".to_string());
            args.push(format!("{:.6}", clip.in_secs));
            args.push("-t".to_string());
            args.push(format!("{:.6}", clip.duration()));
            args.push("-i".to_string());
            args.push(clip.asset.path.display().to_string());
        }

        let narration_index = match &timeline.narration {
            Some(track) => {
                if !track.asset.path.exists() {
                    return Err(ReelError::FileNotFound {
                        path: track.asset.path.clone(),
                    });
                }
                args.push("-i".to_string());
                args.push(track.asset.path.display().to_string());
                Some(timeline.clips.len())
            }
            None => None,
        };

        let filter = build_filter_graph(timeline, fps)?;
        let filter_len = filter.len();

        args.push("-filter_complex".to_string());
        args.push(filter);
        args.push("-map".to_string());
        args.push("[vout]".to_string());
        match narration_index {
            Some(index) => {
                args.push("-map".to_string());
                args.push(format!("{index}:a:0"));
            }
            None => args.push("-an".to_string()),
        }
        args.push("-r".to_string());
        args.push(fps.to_string());
        args.push("-t".to_string());
        args.push(format!("{total:.6}"));

        let mut codec_args = codec_args_for_settings(&job.settings, narration_index.is_some());
        args.append(&mut codec_args);

        args.push(job.output_path.display().to_string());

        let total_frames = job.total_frames();
        tracing::info!(
            duration_secs = total,
            frames = total_frames,
            clips = timeline.clips.len(),
            fragments = timeline.fragments().len(),
            narration = narration_index.is_some(),
            filter_len,
            "Export plan built"
        );

        Ok(ExportPlan {
            ffmpeg_args: args,
            total_frames,
            expected_duration_secs: total,
        })
    }

    fn run_ffmpeg(
        &self,
        plan: &ExportPlan,
        job: &ExportJob,
        progress: Option<ProgressCallback>,
        cancel: &CancelFlag,
    ) -> ReelResult<()> {
        tracing::debug!(args = ?plan.ffmpeg_args, "Running ffmpeg");
        let mut cmd = Command::new(&self.binary);
        cmd.args(&plan.ffmpeg_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| ReelError::export(format!("Failed to start {}: {e}", self.binary)))?;

        tracing::info!(
            pid = child.id(),
            args_len = plan.ffmpeg_args.len(),
            total_frames = plan.total_frames,
            "ffmpeg process started"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::export("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::export("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently to avoid ffmpeg blocking on a full stderr pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        // Progress lines arrive on their own thread so cancellation and the
        // deadline are still checked while ffmpeg prints nothing.
        let (lines_tx, lines_rx) = mpsc::channel::<std::io::Result<String>>();
        let stdout_task = std::thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                if lines_tx.send(line).is_err() {
                    break;
                }
            }
        });

        let mut latest_progress = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        let mut last_progress_wall = Instant::now();
        loop {
            if let Some(err) = interruption(cancel, job.deadline, start) {
                abort(&mut child, job);
                return Err(err);
            }

            let line = match lines_rx.recv_timeout(PROGRESS_POLL_INTERVAL) {
                Ok(line) => line
                    .map_err(|e| ReelError::export(format!("Failed reading ffmpeg progress: {e}")))?,
                Err(RecvTimeoutError::Timeout) => {
                    if last_progress_wall.elapsed().as_secs() >= STALL_WARNING_SECS {
                        tracing::warn!(
                            out_time_secs = latest_progress.out_time_secs,
                            elapsed_secs = start.elapsed().as_secs_f64(),
                            "No ffmpeg progress advancement for {STALL_WARNING_SECS}s"
                        );
                        last_progress_wall = Instant::now();
                    }
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            };

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            latest_progress.update(key, value);
            if key != "progress" {
                continue;
            }

            if latest_progress.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = latest_progress.out_time_secs;
                last_progress_wall = Instant::now();
            }
            let report = progress_report(
                &latest_progress,
                plan.total_frames,
                plan.expected_duration_secs,
                start.elapsed().as_secs_f64(),
            );
            tracing::debug!(
                progress = report.progress,
                frames = report.frames_rendered,
                eta_secs = report.eta_secs,
                "Export progress"
            );
            if let Some(cb) = &progress {
                cb(report);
            }
        }
        if stdout_task.join().is_err() {
            tracing::debug!("ffmpeg progress reader panicked");
        }

        let status = child
            .wait()
            .map_err(|e| ReelError::export(format!("Failed to wait on ffmpeg: {e}")))?;

        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            if let Some(cb) = &progress {
                cb(ExportProgress {
                    progress: 0.0,
                    frames_rendered: 0,
                    total_frames: plan.total_frames,
                    eta_secs: 0.0,
                    stage: ExportStage::Failed,
                });
            }
            return Err(ReelError::export(format!(
                "ffmpeg export failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        let written = std::fs::metadata(&job.output_path)
            .map(|meta| meta.len())
            .unwrap_or(0);
        if written == 0 {
            return Err(ReelError::export(format!(
                "ffmpeg produced no output at {}",
                job.output_path.display()
            )));
        }

        if let Some(cb) = &progress {
            cb(ExportProgress {
                progress: 1.0,
                frames_rendered: plan.total_frames,
                total_frames: plan.total_frames,
                eta_secs: 0.0,
                stage: ExportStage::Complete,
            });
        }

        Ok(())
    }
}

impl RenderBackend for FfmpegBackend {
    fn render(
        &mut self,
        job: &ExportJob,
        progress: Option<ProgressCallback>,
        cancel: &CancelFlag,
    ) -> ReelResult<()> {
        let started = Instant::now();
        let plan = self.build_plan(job)?;
        self.run_ffmpeg(&plan, job, progress, cancel)?;
        tracing::info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            output = %job.output_path.display(),
            "ffmpeg render finished"
        );
        Ok(())
    }

    fn is_available(&self) -> bool {
        command_exists(&self.binary)
    }

    fn name(&self) -> &str {
        &self.binary
    }
}

/// Stop ffmpeg and drop the partial file.
/// Why a running export must stop now, if it must.
fn interruption(cancel: &CancelFlag, deadline: Option<Duration>, start: Instant) -> Option<ReelError> {
    if cancel.is_cancelled() {
        return Some(ReelError::Cancelled);
    }
    match deadline {
        Some(deadline) if start.elapsed() > deadline => Some(ReelError::DeadlineExceeded {
            elapsed_secs: start.elapsed().as_secs_f64(),
        }),
        _ => None,
    }
}

fn abort(child: &mut Child, job: &ExportJob) {
    if let Err(err) = child.kill() {
        tracing::debug!(error = %err, "ffmpeg already exited");
    }
    let _ = child.wait();
    if job.output_path.exists() {
        if let Err(err) = std::fs::remove_file(&job.output_path) {
            tracing::warn!(error = %err, path = %job.output_path.display(), "Failed to remove partial export");
        }
    }
    tracing::warn!(output = %job.output_path.display(), "Export stopped");
}

fn build_filter_graph(timeline: &Timeline, fps: u32) -> ReelResult<String> {
    let (width, height) = (timeline.width, timeline.height);
    let mut parts = vec![format!(
        "color=c=black:s={width}x{height}:r={fps}:d={:.6},format=yuv420p[base0]",
        timeline.total_duration_secs
    )];

    for (index, clip) in timeline.clips.iter().enumerate() {
        parts.push(clip_chain(index, clip, timeline, fps)?);
        parts.push(format!(
            "[base{index}][clip{index}]overlay=eof_action=pass:format=auto[base{next}]",
            next = index + 1
        ));
    }

    let base = format!("[base{}]", timeline.clips.len());
    let text_filters: Vec<String> = timeline
        .fragments()
        .iter()
        .map(|fragment| drawtext_filter(fragment, &timeline.text.style, &timeline.text.font, width))
        .collect();
    if text_filters.is_empty() {
        parts.push(format!("{base}format=yuv420p[vout]"));
    } else {
        parts.push(format!("{base}{},format=yuv420p[vout]", text_filters.join(",")));
    }

    Ok(parts.join(";"))
}

/// Crop, effects, zoom ramp, fades, and placement of one clip.
fn clip_chain(index: usize, clip: &Clip, timeline: &Timeline, fps: u32) -> ReelResult<String> {
    let (width, height) = (timeline.width, timeline.height);
    let view = match clip.crop {
        Some(view) => view,
        None => crop_dimensions(
            clip.asset.width,
            clip.asset.height,
            TargetFrame::new(width, height),
        )?,
    };

    let mut chain = format!(
        "[{index}:v]crop={}:{}:{}:{},scale={width}:{height}:flags=lanczos,setsar=1,fps={fps}",
        view.width, view.height, view.x, view.y
    );
    for filter in &clip.filters {
        chain.push(',');
        chain.push_str(&effect_filter(filter));
    }
    chain.push_str(",format=yuva420p");

    if let Some(ramp) = &clip.scale_ramp {
        chain.push_str(&format!(
            ",scale=w='trunc(iw*({expr})/2)*2':h='trunc(ih*({expr})/2)*2':eval=frame,crop={width}:{height}",
            expr = scale_ramp_expr(ramp)
        ));
    }

    let length = clip.duration();
    if clip.fade_in_secs > 0.0 {
        chain.push_str(&format!(",fade=t=in:st=0:d={:.6}:alpha=1", clip.fade_in_secs));
    }
    if clip.fade_out_secs > 0.0 {
        chain.push_str(&format!(
            ",fade=t=out:st={:.6}:d={:.6}:alpha=1",
            (length - clip.fade_out_secs).max(0.0),
            clip.fade_out_secs
        ));
    }

    chain.push_str(&format!(
        ",setpts=PTS-STARTPTS+{:.6}/TB[clip{index}]",
        clip.layer_start_secs
    ));
    Ok(chain)
}

fn effect_filter(filter: &FrameFilter) -> String {
    match *filter {
        FrameFilter::ColorScale { factor } => {
            format!("colorchannelmixer=rr={factor:.4}:gg={factor:.4}:bb={factor:.4}")
        }
        FrameFilter::Vignette { strength, .. } => {
            let angle = (strength * std::f64::consts::FRAC_PI_2).clamp(0.0, std::f64::consts::FRAC_PI_2);
            format!("vignette=angle={angle:.4}")
        }
    }
}

/// Clip-local scale expression over ffmpeg's `t`.
fn scale_ramp_expr(ramp: &ScaleRamp) -> String {
    let span = ramp.end_secs - ramp.start_secs;
    if span <= 0.0 {
        return format!(
            "if(gte(t,{end:.6}),{to:.6},{from:.6})",
            end = ramp.end_secs,
            to = ramp.to,
            from = ramp.from
        );
    }
    format!(
        "{from:.6}+({delta:.6})*clip((t-{start:.6})/{span:.6},0,1)",
        from = ramp.from,
        delta = ramp.to - ramp.from,
        start = ramp.start_secs,
    )
}

fn drawtext_filter(fragment: &TextFragment, style: &TextStyle, font: &FontChoice, width: u32) -> String {
    let start = fragment.display_start_secs;
    let end = fragment.display_end_secs;
    let local = format!("(t-{start:.6})");
    let animation = &fragment.animation;

    let mut alpha_terms = Vec::new();
    if animation.fade_in_secs > 0.0 {
        alpha_terms.push(format!("min(1,{local}/{:.6})", animation.fade_in_secs));
    }
    if animation.fade_out_secs > 0.0 {
        alpha_terms.push(format!("min(1,({end:.6}-t)/{:.6})", animation.fade_out_secs));
    }
    let alpha = if alpha_terms.is_empty() {
        "1".to_string()
    } else {
        format!("clip({},0,1)", alpha_terms.join("*"))
    };

    let y_offset = match animation.slide {
        Some(slide) if slide.duration_secs > 0.0 => format!(
            "if(lt({local},{d:.6}),(1-{local}/{d:.6})*{off:.1},0)",
            d = slide.duration_secs,
            off = slide.offset_px
        ),
        _ => "0".to_string(),
    };

    let font_size = match animation.zoom {
        Some(zoom) => format!(
            "{}*min(1+{:.6}*{local},{:.6})",
            style.font_size, zoom.rate_per_sec, zoom.max_scale
        ),
        None => style.font_size.to_string(),
    };

    let (font_arg, border) = match font {
        FontChoice::Styled { path } => (
            format!(":fontfile={}", escape_filter_value(&path.display().to_string())),
            style.stroke_width,
        ),
        FontChoice::PlainOutlined => (String::new(), style.stroke_width.max(PLAIN_TEXT_BORDER_PX)),
    };

    let text = wrap_text(&fragment.text, chars_per_line(width, style.font_size));

    format!(
        "drawtext=text={text}{font_arg}:expansion=none:fontsize='{font_size}':fontcolor={color}:alpha='{alpha}':bordercolor={stroke}:borderw={border}:box=1:boxcolor=black@{backdrop:.2}:boxborderw={pad}:line_spacing={spacing}:x=(w-text_w)/2:y='(h-text_h)/2+{y_offset}':enable='gte(t,{start:.6})*lt(t,{end:.6})'",
        text = escape_filter_value(&text),
        color = hex_color(style.color),
        stroke = hex_color(style.stroke_color),
        backdrop = style.backdrop_opacity.clamp(0.0, 1.0),
        pad = TEXT_BOX_PADDING_PX,
        spacing = TEXT_LINE_SPACING_PX,
    )
}

fn hex_color(rgb: [u8; 3]) -> String {
    format!("0x{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

/// Approximate characters that fit in 90% of the frame width.
fn chars_per_line(width: u32, font_size: u32) -> usize {
    let glyph = (font_size.max(1) as f64 * 0.55).max(1.0);
    ((width as f64 * 0.9) / glyph).floor().max(8.0) as usize
}

/// Greedy word wrap. Words longer than a line stay whole.
fn wrap_text(text: &str, max_chars: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}

/// Escape a value for an unquoted filter option inside `-filter_complex`.
///
/// Two parsing levels apply: the graph level and the option level.
fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str(r"\\\\"),
            '\'' | ':' | ',' | ';' | '[' | ']' => {
                escaped.push_str(r"\\\");
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn codec_args_for_settings(settings: &ExportSettings, has_audio: bool) -> Vec<String> {
    let mut args = vec![
        "-c:v".to_string(),
        settings.video_codec.clone(),
        "-preset".to_string(),
        settings.preset.clone(),
        "-crf".to_string(),
        settings.crf.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
    ];
    if has_audio {
        args.push("-c:a".to_string());
        args.push("aac".to_string());
        args.push("-b:a".to_string());
        args.push(format!("{}k", settings.audio_bitrate_kbps.max(64)));
    }
    args.push("-movflags".to_string());
    args.push("+faststart".to_string());
    args
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            "out_time_ms" | "out_time_us" => {
                // ffmpeg reports microseconds under both keys.
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> ExportProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let frames_rendered = (progress * total_frames as f64).round() as u64;
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    ExportProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            ExportStage::Finalizing
        } else {
            ExportStage::Rendering
        },
    }
}

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::audio::decode::{load_audio, AudioSignal};
use crate::audio::spectrum::{FftAnalyzer, SpectrumAnalyzer};
use crate::audio::transcode::{FfmpegTranscoder, Transcoder};
use crate::audio::window::{apply_window, hann_window, FrameSchedule, FrameSpan};
use crate::config::RenderConfig;
use crate::encode::ffmpeg::{AssemblyJob, FfmpegAssembler, VideoAssembler};
use crate::error::{PipelineError, Result};
use crate::render::frame::{FrameSink, PngFrameWriter};
use crate::render::spectrogram::SpectrogramRenderer;
use crate::render::text::TextOverlay;

static SESSION_SEQ: AtomicU64 = AtomicU64::new(0);

/// Per-run scratch directory. Removed recursively when dropped, on every exit
/// path.
pub struct PipelineSession {
    workspace: PathBuf,
}

impl PipelineSession {
    pub fn create_in(parent: &Path) -> Result<Self> {
        std::fs::create_dir_all(parent)
            .map_err(|e| PipelineError::render_io(format!("create {}", parent.display()), e))?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        let name = format!(
            "spectrogram-frames-{}-{}-{}",
            std::process::id(),
            nanos,
            SESSION_SEQ.fetch_add(1, Ordering::Relaxed)
        );
        let workspace = parent.join(name);
        std::fs::create_dir(&workspace)
            .map_err(|e| PipelineError::render_io(format!("create {}", workspace.display()), e))?;

        log::debug!("Workspace: {}", workspace.display());
        Ok(Self { workspace })
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }
}

impl Drop for PipelineSession {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.workspace) {
            Ok(()) => log::debug!("Removed workspace {}", self.workspace.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove workspace {}: {}", self.workspace.display(), e),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub output: PathBuf,
    pub frames: usize,
    pub duration: f64,
    pub sample_rate: u32,
}

type SinkFactory = Box<dyn Fn(&Path) -> Box<dyn FrameSink> + Send + Sync>;

/// Decode, render every frame, mux. External collaborators are injectable so
/// tests can swap in doubles.
pub struct Pipeline {
    config: RenderConfig,
    transcoder: Box<dyn Transcoder>,
    analyzer: Box<dyn SpectrumAnalyzer>,
    assembler: Box<dyn VideoAssembler>,
    sink_factory: SinkFactory,
    text: Option<TextOverlay>,
    cancel: Option<Arc<AtomicBool>>,
    progress: ProgressBar,
    workspace_root: PathBuf,
}

impl Pipeline {
    /// Validates `config` and wires the ffmpeg/rustfft/PNG implementations.
    pub fn new(config: RenderConfig) -> Result<Self> {
        config.validate()?;
        let text = if config.show_time_markers || config.show_frequency_markers {
            TextOverlay::load(config.font.as_deref())?
        } else {
            None
        };

        Ok(Self {
            transcoder: Box::new(FfmpegTranscoder::new(config.ffmpeg.clone())),
            analyzer: Box::new(FftAnalyzer::new(config.frame_size)),
            assembler: Box::new(FfmpegAssembler::from_config(&config)),
            sink_factory: Box::new(png_sink),
            text,
            cancel: None,
            progress: ProgressBar::hidden(),
            workspace_root: std::env::temp_dir(),
            config,
        })
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn run(&self, input: &Path, output: &Path) -> Result<RunSummary> {
        let session = PipelineSession::create_in(&self.workspace_root)?;

        // 1. Decode
        log::info!("Decoding {}...", input.display());
        let signal = load_audio(input, self.transcoder.as_ref(), session.workspace())?;

        let sample_rate = self.config.sample_rate.unwrap_or(signal.sample_rate);
        if self.config.sample_rate.is_some() {
            log::info!("Sample rate overridden: {}Hz (decoded {}Hz)", sample_rate, signal.sample_rate);
        }
        let schedule = FrameSchedule::new(
            signal.samples.len(),
            sample_rate,
            self.config.fps,
            self.config.frame_size,
        );
        if schedule.samples_per_frame == 0 {
            return Err(PipelineError::Config(format!(
                "fps {} exceeds sample rate {}Hz",
                self.config.fps, sample_rate
            )));
        }
        let duration = signal.samples.len() as f64 / sample_rate as f64;
        log::info!(
            "Audio duration: {:.2}s, total frames: {}, samples per frame: {}",
            duration,
            schedule.total_frames,
            schedule.samples_per_frame
        );

        // 2. Render
        let frames_dir = session.workspace().join("frames");
        std::fs::create_dir(&frames_dir)
            .map_err(|e| PipelineError::render_io(format!("create {}", frames_dir.display()), e))?;
        let sink = (self.sink_factory)(&frames_dir);
        let renderer = SpectrogramRenderer::new(&self.config, sample_rate, self.text.as_ref());

        self.progress.reset();
        self.progress.set_length(schedule.frame_count() as u64);
        let frames = if self.config.parallel {
            self.render_parallel(&signal, &schedule, &renderer, sink.as_ref())?
        } else {
            self.render_sequential(&signal, &schedule, &renderer, sink.as_ref())?
        };
        self.progress.finish_with_message("Rendering complete");
        log::info!("Rendered {} frames", frames);

        // 3. Assemble inside the workspace, then publish
        let staged = session.workspace().join(staged_name(output));
        self.assembler.assemble(&AssemblyJob {
            frames_dir: &frames_dir,
            frame_count: frames,
            fps: self.config.fps,
            audio: input,
            output: &staged,
        })?;
        publish(&staged, output)?;

        log::info!("Wrote {}", output.display());
        Ok(RunSummary {
            output: output.to_path_buf(),
            frames,
            duration,
            sample_rate,
        })
    }

    fn render_sequential(
        &self,
        signal: &AudioSignal,
        schedule: &FrameSchedule,
        renderer: &SpectrogramRenderer<'_>,
        sink: &dyn FrameSink,
    ) -> Result<usize> {
        let window = hann_window(self.config.frame_size);
        let mut windowed = vec![0.0f32; self.config.frame_size];
        let mut canvas = renderer.canvas()?;
        let mut written = 0;

        for span in schedule.spans() {
            self.check_cancelled()?;
            self.render_frame(signal, &span, &window, &mut windowed, renderer, &mut canvas, sink)?;
            written += 1;
            self.progress.inc(1);
            if span.index % 10 == 0 {
                log::debug!(
                    "Processed {}/{} frames ({}%)",
                    span.index,
                    schedule.total_frames,
                    span.index * 100 / schedule.total_frames.max(1)
                );
            }
        }
        Ok(written)
    }

    /// Each worker owns its canvas and window buffer; file names stay keyed
    /// by frame index so the sequence is still contiguous.
    fn render_parallel(
        &self,
        signal: &AudioSignal,
        schedule: &FrameSchedule,
        renderer: &SpectrogramRenderer<'_>,
        sink: &dyn FrameSink,
    ) -> Result<usize> {
        let window = hann_window(self.config.frame_size);
        let spans: Vec<FrameSpan> = schedule.spans().collect();
        let blank = renderer.canvas()?;

        spans.par_iter().try_for_each_init(
            || (blank.clone(), vec![0.0f32; self.config.frame_size]),
            |(canvas, windowed), span| {
                self.check_cancelled()?;
                self.render_frame(signal, span, &window, windowed, renderer, canvas, sink)?;
                self.progress.inc(1);
                Ok::<(), PipelineError>(())
            },
        )?;
        Ok(spans.len())
    }

    #[allow(clippy::too_many_arguments)]
    fn render_frame(
        &self,
        signal: &AudioSignal,
        span: &FrameSpan,
        window: &[f32],
        windowed: &mut [f32],
        renderer: &SpectrogramRenderer<'_>,
        canvas: &mut crate::render::canvas::Canvas,
        sink: &dyn FrameSink,
    ) -> Result<()> {
        apply_window(&signal.samples[span.start..span.end], window, windowed);
        let spectrum = self.analyzer.magnitudes(windowed)?;
        renderer.render(canvas, &spectrum, span.start);
        sink.write_frame(span.index, canvas)
    }

    fn check_cancelled(&self) -> Result<()> {
        match self.cancel {
            Some(ref flag) if flag.load(Ordering::Relaxed) => Err(PipelineError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Injection points for test doubles and embedders.
#[cfg_attr(not(test), allow(dead_code))]
impl Pipeline {
    pub fn with_transcoder(mut self, transcoder: impl Transcoder + 'static) -> Self {
        self.transcoder = Box::new(transcoder);
        self
    }

    pub fn with_analyzer(mut self, analyzer: impl SpectrumAnalyzer + 'static) -> Self {
        self.analyzer = Box::new(analyzer);
        self
    }

    pub fn with_assembler(mut self, assembler: impl VideoAssembler + 'static) -> Self {
        self.assembler = Box::new(assembler);
        self
    }

    pub fn with_frame_sink<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Path) -> Box<dyn FrameSink> + Send + Sync + 'static,
    {
        self.sink_factory = Box::new(factory);
        self
    }

    /// Checked between frames; a set flag aborts the run with `Cancelled`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }
}

fn png_sink(dir: &Path) -> Box<dyn FrameSink> {
    Box::new(PngFrameWriter::new(dir))
}

fn staged_name(output: &Path) -> String {
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    format!("video.{}", ext)
}

/// Move the finished video into place; copy when rename crosses filesystems.
fn publish(staged: &Path, output: &Path) -> Result<()> {
    if std::fs::rename(staged, output).is_ok() {
        return Ok(());
    }
    std::fs::copy(staged, output).map(|_| ()).map_err(|e| {
        let _ = std::fs::remove_file(output);
        PipelineError::Encode(format!("move video to {}: {}", output.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::canvas::Canvas;
    use crate::render::frame::frame_file_name;
    use std::sync::Mutex;

    fn test_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sonogram-pipeline-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_sine(path: &Path, seconds: f32, sample_rate: u32, freq: f32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let n = (seconds * sample_rate as f32) as usize;
        for i in 0..n {
            let t = i as f32 / sample_rate as f32;
            let s = 0.5 * (2.0 * std::f32::consts::PI * freq * t).sin();
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn quiet_config() -> RenderConfig {
        RenderConfig {
            show_time_markers: false,
            show_frequency_markers: false,
            ..Default::default()
        }
    }

    /// Records calls and writes a placeholder video.
    #[derive(Clone, Default)]
    struct FakeAssembler {
        fail: bool,
        check_files: bool,
        calls: Arc<Mutex<Vec<(usize, u32)>>>,
    }

    impl VideoAssembler for FakeAssembler {
        fn assemble(&self, job: &AssemblyJob<'_>) -> Result<()> {
            self.calls.lock().unwrap().push((job.frame_count, job.fps));
            if self.fail {
                return Err(PipelineError::Encode("muxer exploded".into()));
            }
            if self.check_files {
                let on_disk = std::fs::read_dir(job.frames_dir).unwrap().count();
                assert_eq!(on_disk, job.frame_count);
                for i in 0..job.frame_count {
                    assert!(job.frames_dir.join(frame_file_name(i)).is_file());
                }
            }
            std::fs::write(job.output, b"video").map_err(|e| PipelineError::Encode(e.to_string()))
        }
    }

    #[derive(Default)]
    struct CapturingSink {
        frames: Mutex<Vec<(usize, Canvas)>>,
    }

    struct SharedSink(Arc<CapturingSink>);

    impl FrameSink for SharedSink {
        fn write_frame(&self, index: usize, canvas: &Canvas) -> Result<()> {
            self.0.frames.lock().unwrap().push((index, canvas.clone()));
            Ok(())
        }
    }

    struct FailingSink;

    impl FrameSink for FailingSink {
        fn write_frame(&self, index: usize, _canvas: &Canvas) -> Result<()> {
            Err(PipelineError::render(format!("disk full at frame {}", index)))
        }
    }

    struct BrokenAnalyzer;

    impl SpectrumAnalyzer for BrokenAnalyzer {
        fn magnitudes(&self, _windowed: &[f32]) -> Result<Vec<f32>> {
            Err(PipelineError::Analysis("no spectrum today".into()))
        }
    }

    struct NoTranscode;

    impl Transcoder for NoTranscode {
        fn to_wav(&self, _input: &Path, _output: &Path) -> Result<()> {
            Err(PipelineError::Transcode("no ffmpeg in tests".into()))
        }
    }

    fn capturing_pipeline(config: RenderConfig, root: &Path) -> (Pipeline, Arc<CapturingSink>, FakeAssembler) {
        let sink = Arc::new(CapturingSink::default());
        let assembler = FakeAssembler::default();
        let shared = sink.clone();
        let pipeline = Pipeline::new(config)
            .unwrap()
            .with_transcoder(NoTranscode)
            .with_assembler(assembler.clone())
            .with_frame_sink(move |_| Box::new(SharedSink(shared.clone())) as Box<dyn FrameSink>)
            .with_workspace_root(root.join("ws"));
        (pipeline, sink, assembler)
    }

    fn workspace_is_empty(root: &Path) -> bool {
        std::fs::read_dir(root.join("ws")).unwrap().next().is_none()
    }

    #[test]
    fn session_removes_workspace_on_drop() {
        let root = test_root("session");
        let session = PipelineSession::create_in(&root).unwrap();
        let ws = session.workspace().to_path_buf();
        std::fs::write(ws.join("frame-000000.png"), b"x").unwrap();
        assert!(ws.is_dir());
        drop(session);
        assert!(!ws.exists());
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn concurrent_sessions_get_distinct_workspaces() {
        let root = test_root("distinct");
        let a = PipelineSession::create_in(&root).unwrap();
        let b = PipelineSession::create_in(&root).unwrap();
        assert_ne!(a.workspace(), b.workspace());
        drop((a, b));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn sine_at_1khz_renders_twenty_frames_with_peak_bar() {
        let root = test_root("e2e");
        let input = root.join("tone.wav");
        write_sine(&input, 2.0, 44_100, 1000.0);
        let output = root.join("out.mp4");

        let config = RenderConfig { fps: 10, ..quiet_config() };
        let (pipeline, sink, assembler) = capturing_pipeline(config, &root);
        let summary = pipeline.run(&input, &output).unwrap();

        assert_eq!(summary.frames, 20);
        assert!((summary.duration - 2.0).abs() < 1e-6);
        assert_eq!(*assembler.calls.lock().unwrap(), vec![(20, 10)]);
        assert!(output.is_file());
        assert!(workspace_is_empty(&root));

        let mut frames = sink.frames.lock().unwrap().clone();
        frames.sort_by_key(|(i, _)| *i);
        assert_eq!(frames.iter().map(|(i, _)| *i).collect::<Vec<_>>(), (0..20).collect::<Vec<_>>());

        // 1025 bins -> cutoff 512.5 over 800px; bin 46 ~ 990 Hz
        let bin_width = 800.0 / 512.5;
        let column = |bin: usize| ((bin as f32 + 0.5) * bin_width) as u32;
        let brighter = frames
            .iter()
            .filter(|(_, canvas)| {
                let peak = canvas.pixel(column(46), 399)[0];
                peak > canvas.pixel(column(30), 399)[0] && peak > canvas.pixel(column(62), 399)[0]
            })
            .count();
        assert!(brighter >= 18, "peak brighter in only {}/20 frames", brighter);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn png_frames_are_contiguous_on_disk() {
        let root = test_root("png");
        let input = root.join("tone.wav");
        write_sine(&input, 0.5, 8000, 440.0);
        let output = root.join("out.mp4");

        let config = RenderConfig {
            fps: 10,
            width: 64,
            height: 32,
            frame_size: 256,
            ..quiet_config()
        };
        let assembler = FakeAssembler {
            check_files: true,
            ..Default::default()
        };
        let pipeline = Pipeline::new(config)
            .unwrap()
            .with_assembler(assembler.clone())
            .with_workspace_root(root.join("ws"));
        let summary = pipeline.run(&input, &output).unwrap();

        assert_eq!(summary.frames, 5);
        assert_eq!(*assembler.calls.lock().unwrap(), vec![(5, 10)]);
        assert!(workspace_is_empty(&root));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn parallel_rendering_matches_sequential() {
        let root = test_root("parallel");
        let input = root.join("tone.wav");
        write_sine(&input, 1.0, 8000, 700.0);

        let render = |parallel: bool| {
            let config = RenderConfig {
                fps: 15,
                width: 120,
                height: 60,
                frame_size: 512,
                parallel,
                ..quiet_config()
            };
            let (pipeline, sink, _) = capturing_pipeline(config, &root);
            pipeline.run(&input, &root.join(format!("out-{}.mp4", parallel))).unwrap();
            let mut frames = sink.frames.lock().unwrap().clone();
            frames.sort_by_key(|(i, _)| *i);
            frames
        };

        let sequential = render(false);
        let parallel = render(true);
        assert_eq!(sequential.len(), 15);
        assert_eq!(sequential.len(), parallel.len());
        for ((i, a), (j, b)) in sequential.iter().zip(&parallel) {
            assert_eq!(i, j);
            assert_eq!(a.pixels(), b.pixels());
        }
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn repeated_runs_produce_same_frame_count() {
        let root = test_root("repeat");
        let input = root.join("tone.wav");
        write_sine(&input, 1.3, 8000, 300.0);

        let config = RenderConfig { fps: 12, width: 32, height: 16, ..quiet_config() };
        let (pipeline, _, _) = capturing_pipeline(config, &root);
        let first = pipeline.run(&input, &root.join("a.mp4")).unwrap();
        let second = pipeline.run(&input, &root.join("b.mp4")).unwrap();
        assert_eq!(first.frames, 15);
        assert_eq!(first.frames, second.frames);
        assert_eq!(first.duration, second.duration);
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn sample_rate_override_rescales_schedule() {
        let root = test_root("override");
        let input = root.join("tone.wav");
        write_sine(&input, 1.0, 8000, 500.0);

        let config = RenderConfig {
            fps: 10,
            width: 32,
            height: 16,
            sample_rate: Some(4000),
            ..quiet_config()
        };
        let (pipeline, _, _) = capturing_pipeline(config, &root);
        let summary = pipeline.run(&input, &root.join("out.mp4")).unwrap();
        assert_eq!(summary.sample_rate, 4000);
        assert_eq!(summary.frames, 20);
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_input_fails_and_cleans_up() {
        let root = test_root("missing");
        let (pipeline, sink, assembler) = capturing_pipeline(quiet_config(), &root);
        let err = pipeline.run(&root.join("absent.wav"), &root.join("out.mp4")).unwrap_err();
        assert!(matches!(err, PipelineError::Input { .. }));
        assert!(sink.frames.lock().unwrap().is_empty());
        assert!(assembler.calls.lock().unwrap().is_empty());
        assert!(workspace_is_empty(&root));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn corrupt_input_fails_at_decode_and_cleans_up() {
        let root = test_root("corrupt");
        let input = root.join("broken.wav");
        std::fs::write(&input, b"RIFF\x10\x00\x00\x00WAVEjunkjunkjunk").unwrap();
        let output = root.join("out.mp4");

        let (pipeline, _, _) = capturing_pipeline(quiet_config(), &root);
        let err = pipeline.run(&input, &output).unwrap_err();
        assert!(
            matches!(err, PipelineError::Decode(_) | PipelineError::Transcode(_)),
            "{:?}",
            err
        );
        assert!(!output.exists());
        assert!(workspace_is_empty(&root));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn render_failure_cleans_up() {
        let root = test_root("render-fail");
        let input = root.join("tone.wav");
        write_sine(&input, 0.5, 8000, 440.0);
        let output = root.join("out.mp4");

        let assembler = FakeAssembler::default();
        let pipeline = Pipeline::new(RenderConfig { fps: 10, ..quiet_config() })
            .unwrap()
            .with_assembler(assembler.clone())
            .with_frame_sink(|_| Box::new(FailingSink) as Box<dyn FrameSink>)
            .with_workspace_root(root.join("ws"));
        let err = pipeline.run(&input, &output).unwrap_err();

        assert!(matches!(err, PipelineError::Render { .. }));
        assert!(assembler.calls.lock().unwrap().is_empty());
        assert!(!output.exists());
        assert!(workspace_is_empty(&root));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn analysis_failure_cleans_up() {
        let root = test_root("analysis-fail");
        let input = root.join("tone.wav");
        write_sine(&input, 0.5, 8000, 440.0);

        let (pipeline, sink, assembler) = capturing_pipeline(RenderConfig { fps: 10, ..quiet_config() }, &root);
        let pipeline = pipeline.with_analyzer(BrokenAnalyzer);
        let err = pipeline.run(&input, &root.join("out.mp4")).unwrap_err();

        assert!(matches!(err, PipelineError::Analysis(_)));
        assert!(sink.frames.lock().unwrap().is_empty());
        assert!(assembler.calls.lock().unwrap().is_empty());
        assert!(workspace_is_empty(&root));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn encode_failure_leaves_no_output() {
        let root = test_root("encode-fail");
        let input = root.join("tone.wav");
        write_sine(&input, 0.5, 8000, 440.0);
        let output = root.join("out.mp4");

        let assembler = FakeAssembler {
            fail: true,
            ..Default::default()
        };
        let pipeline = Pipeline::new(RenderConfig { fps: 10, width: 32, height: 16, ..quiet_config() })
            .unwrap()
            .with_assembler(assembler)
            .with_workspace_root(root.join("ws"));
        let err = pipeline.run(&input, &output).unwrap_err();

        assert!(matches!(err, PipelineError::Encode(_)));
        assert!(!output.exists());
        assert!(workspace_is_empty(&root));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn cancellation_stops_at_frame_boundary() {
        let root = test_root("cancel");
        let input = root.join("tone.wav");
        write_sine(&input, 0.5, 8000, 440.0);

        let flag = Arc::new(AtomicBool::new(true));
        let (pipeline, sink, _) = capturing_pipeline(RenderConfig { fps: 10, ..quiet_config() }, &root);
        let pipeline = pipeline.with_cancel_flag(flag);
        let err = pipeline.run(&input, &root.join("out.mp4")).unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled));
        assert!(sink.frames.lock().unwrap().is_empty());
        assert!(workspace_is_empty(&root));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn fps_above_sample_rate_is_rejected() {
        let root = test_root("fps");
        let input = root.join("tone.wav");
        write_sine(&input, 0.5, 8000, 440.0);

        let (pipeline, _, _) = capturing_pipeline(RenderConfig { fps: 9000, ..quiet_config() }, &root);
        let err = pipeline.run(&input, &root.join("out.mp4")).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(workspace_is_empty(&root));
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn invalid_config_is_rejected_before_any_stage() {
        assert!(matches!(
            Pipeline::new(RenderConfig { width: 0, ..quiet_config() }),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            Pipeline::new(RenderConfig { width: 65_536, height: 16_384, ..quiet_config() }),
            Err(PipelineError::Config(_))
        ));
    }
}

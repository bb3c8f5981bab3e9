/// Symmetric Hann window: `w[0] == w[n-1] == 0`.
pub fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![0.0; size];
    }
    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64;
            (0.5 * (1.0 - phase.cos())) as f32
        })
        .collect()
}

/// Multiply `chunk` by the leading part of `window` into `out`; anything past
/// the end of `chunk` is zeroed.
pub fn apply_window(chunk: &[f32], window: &[f32], out: &mut [f32]) {
    debug_assert_eq!(window.len(), out.len());
    let n = chunk.len().min(out.len());
    for (o, (s, w)) in out[..n].iter_mut().zip(chunk.iter().zip(window)) {
        *o = s * w;
    }
    out[n..].fill(0.0);
}

/// One analysis window over the signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSpan {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

/// Time-uniform frame offsets: frame `f` starts at `f * samples_per_frame`.
#[derive(Clone, Copy, Debug)]
pub struct FrameSchedule {
    pub total_frames: usize,
    pub samples_per_frame: usize,
    pub frame_size: usize,
    pub signal_len: usize,
}

impl FrameSchedule {
    pub fn new(signal_len: usize, sample_rate: u32, fps: u32, frame_size: usize) -> Self {
        let duration = signal_len as f64 / sample_rate as f64;
        Self {
            total_frames: (duration * fps as f64).floor() as usize,
            samples_per_frame: (sample_rate / fps) as usize,
            frame_size,
            signal_len,
        }
    }

    /// Spans in order. Stops at the first start offset past the signal.
    pub fn spans(&self) -> impl Iterator<Item = FrameSpan> + '_ {
        (0..self.total_frames)
            .map(move |index| (index, index * self.samples_per_frame))
            .take_while(move |&(_, start)| start < self.signal_len)
            .map(move |(index, start)| FrameSpan {
                index,
                start,
                end: (start + self.frame_size).min(self.signal_len),
            })
    }

    pub fn frame_count(&self) -> usize {
        self.spans().count()
    }
}

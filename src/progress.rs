/// Receiver for advisory progress updates
///
/// Updates never influence the conversion; implementations must not fail.
pub trait ProgressSink {
    fn update(&mut self, percent: u8, message: &str);
}

/// Discards all updates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _percent: u8, _message: &str) {}
}

impl<F> ProgressSink for F
where
    F: FnMut(u8, &str),
{
    fn update(&mut self, percent: u8, message: &str) {
        self(percent, message)
    }
}

/// `100 * (step / steps + outer) / outers`, clamped to 0..=100
pub(crate) fn percent(step: usize, steps: usize, outer: usize, outers: usize) -> u8 {
    if outers == 0 {
        return 100;
    }
    let inner = if steps == 0 { 1.0 } else { step as f64 / steps as f64 };
    let value = 100.0 * (inner + outer as f64) / outers as f64;
    value.clamp(0.0, 100.0) as u8
}

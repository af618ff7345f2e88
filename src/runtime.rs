//! Block Scheduler
//!
//! Reference implementation of the scheduling port: owns the block pool,
//! the noise synthesizer and the spectrum analyzer, and runs each exactly
//! once per quantum. The firmware calls [`Pipeline::tick`] from its audio
//! interrupt; host tests call it in a loop.
//!
//! Parameter changes go through `&mut self`, so whoever shares a pipeline
//! with the interrupt must wrap it in a critical-section mutex. That is the
//! serialization the components themselves do not provide.

use crate::block::{BlockPool, BlockRef};
use crate::config::BLOCK_POOL_CAPACITY;
use crate::dsp::noise::NoiseSynth;
use crate::dsp::spectrum::SpectrumAnalyzer;
use crate::dsp::window::WindowTable;
use crate::node::AudioNode;
use crate::params::ParamRecord;
use crate::types::AudioBlock;

/// Analyzer input selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Route {
    /// Analyze the captured input
    #[default]
    Capture,
    /// Analyze the generated noise
    Loopback,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Route {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Capture => defmt::write!(f, "capture"),
            Self::Loopback => defmt::write!(f, "loopback"),
        }
    }
}

/// What happened during one quantum
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Generator produced a block
    pub generated: bool,
    /// Analyzer received a block
    pub analyzed: bool,
    /// A new spectrum was published during this tick
    pub spectrum_ready: bool,
}

/// Running counters for a supervising layer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Quanta run
    pub ticks: u32,
    /// Generator frames lost to pool exhaustion
    pub dropped_output: u32,
    /// Capture frames lost to pool exhaustion
    pub dropped_input: u32,
}

#[cfg(feature = "embedded")]
impl defmt::Format for PipelineStats {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "ticks={} dropped out={} in={}",
            self.ticks,
            self.dropped_output,
            self.dropped_input
        );
    }
}

/// Noise generator and spectrum analyzer sharing one block pool
pub struct Pipeline<'w, const N: usize = BLOCK_POOL_CAPACITY> {
    pool: BlockPool<N>,
    noise: NoiseSynth,
    analyzer: SpectrumAnalyzer<'w>,
    route: Route,
    stats: PipelineStats,
}

impl<'w, const N: usize> Pipeline<'w, N> {
    /// Create a pipeline with a silent generator and the given window
    #[must_use]
    pub fn new(window: &'w WindowTable) -> Self {
        Self {
            pool: BlockPool::new(),
            noise: NoiseSynth::new(),
            analyzer: SpectrumAnalyzer::new(window),
            route: Route::default(),
            stats: PipelineStats::default(),
        }
    }

    /// Seed generator settings from the persisted record
    ///
    /// The window named by the record is built by the caller, since the
    /// analyzer only borrows tables.
    pub fn apply_params(&mut self, record: &ParamRecord) {
        self.noise.amplitude(record.noise_amplitude);
        match record.low_pass_hz {
            Some(hz) => self.noise.set_low_pass(hz),
            None => self.noise.clear_low_pass(),
        }
        self.noise.set_seed(record.seed);
    }

    /// Run one quantum.
    ///
    /// `capture` is the block the codec just delivered (if any) and
    /// `output` receives the generated block. When the pool is exhausted
    /// the generator's frame is dropped and `output` is left untouched.
    pub fn tick(&mut self, capture: Option<&AudioBlock>, output: &mut AudioBlock) -> TickReport {
        let mut report = TickReport::default();
        self.stats.ticks = self.stats.ticks.wrapping_add(1);
        let published_before = self.analyzer.windows_computed();

        let generated = self.noise.update(&mut self.pool, None);
        if generated.is_none() {
            self.stats.dropped_output = self.stats.dropped_output.wrapping_add(1);
        }

        let route = self.route;
        let analyzer_input = match route {
            Route::Capture => capture.and_then(|samples| self.capture_block(samples)),
            Route::Loopback => generated.as_ref().and_then(|block| self.pool.share(block)),
        };
        report.analyzed = analyzer_input.is_some();
        self.analyzer.update(&mut self.pool, analyzer_input);

        if let Some(block) = generated {
            output.copy_from_slice(self.pool.data(&block));
            self.pool.release(block);
            report.generated = true;
        }

        report.spectrum_ready = self.analyzer.windows_computed() != published_before;
        report
    }

    fn capture_block(&mut self, samples: &AudioBlock) -> Option<BlockRef> {
        let Some(block) = self.pool.acquire() else {
            self.stats.dropped_input = self.stats.dropped_input.wrapping_add(1);
            #[cfg(feature = "embedded")]
            defmt::warn!("capture: pool exhausted, frame dropped");
            return None;
        };
        if let Some(data) = self.pool.data_mut(&block) {
            data.copy_from_slice(samples);
        }
        Some(block)
    }

    /// Select the analyzer input
    pub fn set_route(&mut self, route: Route) {
        if route != self.route {
            self.analyzer.reset();
        }
        self.route = route;
    }

    /// Current analyzer input
    #[must_use]
    pub const fn route(&self) -> Route {
        self.route
    }

    /// Generator control
    pub fn noise_mut(&mut self) -> &mut NoiseSynth {
        &mut self.noise
    }

    /// Generator state
    #[must_use]
    pub const fn noise(&self) -> &NoiseSynth {
        &self.noise
    }

    /// Analyzer control
    pub fn analyzer_mut(&mut self) -> &mut SpectrumAnalyzer<'w> {
        &mut self.analyzer
    }

    /// Analyzer readout
    #[must_use]
    pub const fn analyzer(&self) -> &SpectrumAnalyzer<'w> {
        &self.analyzer
    }

    /// Shared pool, for inspection and for blocks held outside the graph
    pub fn pool_mut(&mut self) -> &mut BlockPool<N> {
        &mut self.pool
    }

    /// Running counters
    #[must_use]
    pub const fn stats(&self) -> PipelineStats {
        self.stats
    }
}

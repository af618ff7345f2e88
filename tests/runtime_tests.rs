//! Pipeline Tests
//!
//! One tick per quantum: generation, routing to the analyzer and frame
//! accounting under pool pressure.
//! Run with: cargo test --test runtime_tests

use avna_dsp::config::{BLOCKS_PER_WINDOW, SPECTRUM_BINS};
use avna_dsp::dsp::noise::{NoiseMode, NoiseSynth};
use avna_dsp::dsp::window::WindowTable;
use avna_dsp::params::ParamRecord;
use avna_dsp::runtime::{Pipeline, PipelineStats, Route};
use avna_dsp::types::{AudioBlock, SILENT_BLOCK};

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_silent_by_default() {
    let table = WindowTable::default();
    let mut pipeline: Pipeline<'_> = Pipeline::new(&table);
    let mut output = [9i16; 128];
    let report = pipeline.tick(None, &mut output);
    assert!(report.generated);
    assert!(!report.analyzed);
    assert_eq!(output, SILENT_BLOCK);
    assert_eq!(pipeline.route(), Route::Capture);
}

#[test]
fn test_output_matches_standalone_generator() {
    let table = WindowTable::default();
    let mut pipeline: Pipeline<'_> = Pipeline::new(&table);
    pipeline.noise_mut().amplitude(0.1);

    let mut reference = NoiseSynth::new();
    reference.amplitude(0.1);

    let mut output = SILENT_BLOCK;
    let mut expected = SILENT_BLOCK;
    for _ in 0..4 {
        pipeline.tick(None, &mut output);
        reference.fill(&mut expected);
        assert_eq!(output, expected);
    }
}

#[test]
fn test_pool_drained_after_each_tick() {
    let table = WindowTable::default();
    let mut pipeline: Pipeline<'_> = Pipeline::new(&table);
    pipeline.noise_mut().amplitude(0.1);
    let capture = SILENT_BLOCK;
    let mut output = SILENT_BLOCK;
    for _ in 0..20 {
        pipeline.tick(Some(&capture), &mut output);
        assert_eq!(pipeline.pool_mut().in_use(), 0);
    }
    assert!(pipeline.pool_mut().peak_in_use() <= 2);
}

// =============================================================================
// Routing
// =============================================================================

#[test]
fn test_capture_route_analyzes_input() {
    let table = WindowTable::default();
    let mut pipeline: Pipeline<'_> = Pipeline::new(&table);
    pipeline.noise_mut().amplitude(0.3);

    let capture = SILENT_BLOCK;
    let mut output = SILENT_BLOCK;
    let mut ready_at = Vec::new();
    for i in 1..=BLOCKS_PER_WINDOW {
        let report = pipeline.tick(Some(&capture), &mut output);
        assert!(report.analyzed);
        if report.spectrum_ready {
            ready_at.push(i);
        }
    }
    assert_eq!(ready_at, vec![BLOCKS_PER_WINDOW]);
    assert!(pipeline.analyzer().available());
    assert!((0..SPECTRUM_BINS).all(|bin| pipeline.analyzer().read(bin) == 0.0));
}

#[test]
fn test_loopback_analyzes_generated_noise() {
    let table = WindowTable::default();
    let mut pipeline: Pipeline<'_> = Pipeline::new(&table);
    pipeline.noise_mut().amplitude(0.1);
    pipeline.set_route(Route::Loopback);

    let mut output = SILENT_BLOCK;
    for _ in 0..BLOCKS_PER_WINDOW {
        let report = pipeline.tick(None, &mut output);
        assert!(report.analyzed);
    }
    assert!(pipeline.analyzer().available());
    let total: f32 = (0..SPECTRUM_BINS).map(|bin| pipeline.analyzer().read(bin)).sum();
    assert!(total > 0.0);
    assert_eq!(pipeline.pool_mut().in_use(), 0);
}

#[test]
fn test_route_change_restarts_window() {
    let table = WindowTable::default();
    let mut pipeline: Pipeline<'_> = Pipeline::new(&table);
    pipeline.set_route(Route::Loopback);
    let mut output = SILENT_BLOCK;
    for _ in 0..3 {
        pipeline.tick(None, &mut output);
    }
    assert_eq!(pipeline.analyzer().pending_samples(), 384);

    pipeline.set_route(Route::Loopback);
    assert_eq!(pipeline.analyzer().pending_samples(), 384, "same route keeps data");

    pipeline.set_route(Route::Capture);
    assert_eq!(pipeline.analyzer().pending_samples(), 0);
}

// =============================================================================
// Pool Pressure
// =============================================================================

#[test]
fn test_generator_drop_when_pool_held() {
    let table = WindowTable::default();
    let mut pipeline: Pipeline<'_, 1> = Pipeline::new(&table);
    pipeline.noise_mut().amplitude(0.1);
    let seed = pipeline.noise().seed();

    let held = pipeline.pool_mut().acquire().expect("single block");
    let mut output: AudioBlock = [5; 128];
    let report = pipeline.tick(None, &mut output);
    assert!(!report.generated);
    assert_eq!(output, [5; 128], "output untouched on a dropped frame");
    assert_eq!(pipeline.noise().seed(), seed);
    assert_eq!(
        pipeline.stats(),
        PipelineStats {
            ticks: 1,
            dropped_output: 1,
            dropped_input: 0,
        }
    );

    pipeline.pool_mut().release(held);
    assert!(pipeline.tick(None, &mut output).generated);
}

#[test]
fn test_capture_drop_when_pool_small() {
    let table = WindowTable::default();
    let mut pipeline: Pipeline<'_, 1> = Pipeline::new(&table);
    let capture = SILENT_BLOCK;
    let mut output = SILENT_BLOCK;

    let report = pipeline.tick(Some(&capture), &mut output);
    assert!(report.generated);
    assert!(!report.analyzed);
    assert_eq!(pipeline.stats().dropped_input, 1);
    assert_eq!(pipeline.stats().dropped_output, 0);
}

// =============================================================================
// Parameters
// =============================================================================

#[test]
fn test_apply_params() {
    let table = WindowTable::default();
    let mut pipeline: Pipeline<'_> = Pipeline::new(&table);
    let record = ParamRecord {
        noise_amplitude: 0.2,
        low_pass_hz: Some(2000.0),
        seed: 42,
        ..ParamRecord::default()
    };
    pipeline.apply_params(&record);
    assert_eq!(pipeline.noise().seed(), 42);
    assert_eq!(pipeline.noise().mode(), NoiseMode::Filtered);
    assert_eq!(pipeline.noise().params().amplitude().as_f32(), 0.2);

    pipeline.apply_params(&ParamRecord::default());
    assert_eq!(pipeline.noise().mode(), NoiseMode::Disabled);
}

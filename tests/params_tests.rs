//! Parameter Record Tests
//!
//! Byte layout, round trip and rejection of stored parameters.
//! Run with: cargo test --test params_tests

use avna_dsp::config::DEFAULT_SEED;
use avna_dsp::dsp::window::WindowShape;
use avna_dsp::params::{ParamError, ParamRecord, CAL_POINTS, PARAM_MAGIC, RECORD_LEN};

fn sample_record() -> ParamRecord {
    ParamRecord {
        noise_amplitude: 0.25,
        low_pass_hz: Some(3000.0),
        seed: 0x1234_5678,
        window: WindowShape::Hanning,
        sg_cal: 1.6,
        sa_correction_db: 3.25,
        voltage_ratio_cal: core::array::from_fn(|i| 1.0 + i as f64 * 0.01),
        phase_cal: core::array::from_fn(|i| -(i as f64) * 0.5),
    }
}

#[test]
fn test_defaults() {
    let record = ParamRecord::default();
    assert_eq!(record.seed, DEFAULT_SEED);
    assert_eq!(record.window, WindowShape::BlackmanHarris);
    assert_eq!(record.noise_amplitude, 0.0);
    assert_eq!(record.low_pass_hz, None);
    assert_eq!(record.voltage_ratio_cal, [1.0; CAL_POINTS]);
}

#[test]
fn test_round_trip() {
    let record = sample_record();
    let bytes = record.encode();
    assert_eq!(bytes.len(), RECORD_LEN);
    assert_eq!(ParamRecord::decode(&bytes), Ok(record));
}

#[test]
fn test_field_offsets() {
    let bytes = sample_record().encode();
    assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]), PARAM_MAGIC);
    assert_eq!(bytes[2], 1);
    assert_eq!(f32::from_le_bytes([bytes[3], bytes[4], bytes[5], bytes[6]]), 0.25);
    assert_eq!(f32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]), 3000.0);
    assert_eq!(
        u32::from_le_bytes([bytes[11], bytes[12], bytes[13], bytes[14]]),
        0x1234_5678
    );
    assert_eq!(bytes[15], WindowShape::Hanning.id());

    let mut first_cal = [0u8; 8];
    first_cal.copy_from_slice(&bytes[24..32]);
    assert_eq!(f64::from_le_bytes(first_cal), 1.0);
    let mut last_phase = [0u8; 8];
    last_phase.copy_from_slice(&bytes[224..232]);
    assert_eq!(f64::from_le_bytes(last_phase), -6.0);
}

#[test]
fn test_zero_cutoff_means_no_filter() {
    let record = ParamRecord {
        low_pass_hz: None,
        ..sample_record()
    };
    let bytes = record.encode();
    assert_eq!(&bytes[7..11], &[0, 0, 0, 0]);
    assert_eq!(ParamRecord::decode(&bytes).map(|r| r.low_pass_hz), Ok(None));
}

#[test]
fn test_longer_input_accepted() {
    let mut storage = vec![0xFF; 2048];
    storage[..RECORD_LEN].copy_from_slice(&sample_record().encode());
    assert_eq!(ParamRecord::decode(&storage), Ok(sample_record()));
}

// =============================================================================
// Rejection
// =============================================================================

#[test]
fn test_truncated() {
    let bytes = sample_record().encode();
    assert_eq!(
        ParamRecord::decode(&bytes[..100]),
        Err(ParamError::Truncated {
            expected: RECORD_LEN,
            found: 100
        })
    );
    assert!(ParamRecord::decode(&[]).is_err());
}

#[test]
fn test_erased_flash() {
    let erased = [0xFF; RECORD_LEN];
    assert_eq!(ParamRecord::decode(&erased), Err(ParamError::BadMagic(0xFFFF)));
}

#[test]
fn test_wrong_version() {
    let mut bytes = sample_record().encode();
    bytes[2] = 2;
    assert_eq!(ParamRecord::decode(&bytes), Err(ParamError::UnsupportedVersion(2)));
}

#[test]
fn test_unknown_window() {
    let mut bytes = sample_record().encode();
    bytes[15] = 11;
    assert_eq!(ParamRecord::decode(&bytes), Err(ParamError::UnknownWindow(11)));
    assert_eq!(ParamError::UnknownWindow(11).to_string(), "unknown window id 11");
}

//! Calibration Tests
//!
//! Reading computation, offset/scale mutation and persistence.
//! Run with: cargo test --test calibration_tests

mod common;

use ammeter_firmware::calibration::record::RECORD_LEN;
use ammeter_firmware::calibration::{
    CalibrationEngine, CalibrationError, CalibrationRecord, LoadOutcome,
};
use ammeter_firmware::sampling::Window;
use ammeter_firmware::storage::{NvStore, StoreError};
use ammeter_firmware::types::{AcquisitionSettings, DataRate, Gain, Polarity, ScaleFactor};

use common::{feed, small_window, FailingStore, TestStore};

fn engine() -> CalibrationEngine<TestStore> {
    CalibrationEngine::open(TestStore::new(), AcquisitionSettings::default()).0
}

fn uniform(code: i16, count: u16) -> Window {
    Window {
        sum: i32::from(code) * i32::from(count),
        count,
        max: code,
        min: code,
    }
}

fn stored_bytes<S: NvStore>(store: &mut S) -> Vec<u8> {
    let mut bytes = vec![0u8; store.capacity()];
    store.read(0, &mut bytes).expect("read store");
    bytes
}

// =============================================================================
// Boot Tests
// =============================================================================

#[test]
fn blank_store_is_initialized_with_defaults() {
    let (engine, outcome) = CalibrationEngine::open(TestStore::new(), AcquisitionSettings::default());
    assert_eq!(outcome, LoadOutcome::Initialized);
    assert_eq!(engine.offset_sum(), 0);
    assert_eq!(engine.scale_factor(), ScaleFactor::UNITY);
    assert_eq!(engine.store().write_count(), 1);
    assert_eq!(
        &engine.store().as_bytes()[..RECORD_LEN],
        &CalibrationRecord::DEFAULT.encode()
    );
}

#[test]
fn programmed_store_is_loaded() {
    let (mut engine, _) = CalibrationEngine::open(TestStore::new(), AcquisitionSettings::default());
    engine.capture_offset(1234).expect("capture");
    engine.set_scale_factor(2.5).expect("scale");

    let (reloaded, outcome) = CalibrationEngine::open(engine.into_store(), AcquisitionSettings::default());
    assert_eq!(outcome, LoadOutcome::Loaded);
    assert_eq!(reloaded.offset_sum(), -1234);
    assert_eq!(reloaded.scale_factor().get(), 2.5);
    // Loading does not write
    assert_eq!(reloaded.store().write_count(), 3);
}

#[test]
fn corrupt_record_is_replaced() {
    let mut store = TestStore::new();
    let mut bytes = CalibrationRecord::DEFAULT.encode();
    bytes[8..12].copy_from_slice(&f32::NAN.to_le_bytes());
    store.write(0, &bytes).expect("seed");

    let (engine, outcome) = CalibrationEngine::open(store, AcquisitionSettings::default());
    assert_eq!(outcome, LoadOutcome::Initialized);
    assert_eq!(engine.scale_factor(), ScaleFactor::UNITY);
}

#[test]
fn unreadable_store_runs_on_defaults() {
    let mut store = FailingStore::new();
    store.fail_reads = true;
    let (engine, outcome) = CalibrationEngine::open(store, AcquisitionSettings::default());
    assert_eq!(outcome, LoadOutcome::Unavailable(StoreError::Bus));
    assert_eq!(engine.offset_sum(), 0);
    assert_eq!(engine.scale_factor(), ScaleFactor::UNITY);
}

#[test]
fn unwritable_blank_store_runs_on_defaults() {
    let mut store = FailingStore::new();
    store.fail_writes = true;
    let (_, outcome) = CalibrationEngine::open(store, AcquisitionSettings::default());
    assert_eq!(outcome, LoadOutcome::Unavailable(StoreError::Bus));
}

#[test]
fn record_at_custom_address() {
    let (mut engine, _) =
        CalibrationEngine::open_at(TestStore::new(), 40, AcquisitionSettings::default());
    engine.set_scale_factor(3.0).expect("scale");
    let store = engine.into_store();
    assert_eq!(&store.as_bytes()[..12], &[0xFF; 12]);

    let (engine, outcome) = CalibrationEngine::open_at(store, 40, AcquisitionSettings::default());
    assert_eq!(outcome, LoadOutcome::Loaded);
    assert_eq!(engine.scale_factor().get(), 3.0);
}

// =============================================================================
// Reading Tests
// =============================================================================

#[test]
fn reference_window_reads_an_eighth_amp() {
    let engine = engine();
    let reading = engine.compute_reading(&uniform(1000, 430));
    let expected = 4.096 / 32767.0 * 1000.0;
    assert!((reading.amps - expected).abs() < 1e-6, "got {}", reading.amps);
    assert!((reading.amps - 0.125).abs() < 1e-3);
    assert_eq!(reading.mean_code, 1000);
    assert_eq!(reading.polarity, Polarity::Positive);
    assert!((reading.high_volts - expected).abs() < 1e-6);
    assert!((reading.low_volts - expected).abs() < 1e-6);
    assert!(reading.delta_volts().abs() < 1e-6);
}

#[test]
fn negative_reading_sets_polarity() {
    let engine = engine();
    let reading = engine.compute_reading(&uniform(-2000, 430));
    assert!(reading.amps < 0.0);
    assert_eq!(reading.polarity, Polarity::Negative);
}

#[test]
fn zero_reading_is_positive() {
    let engine = engine();
    let reading = engine.compute_reading(&uniform(0, 430));
    assert_eq!(reading.amps, 0.0);
    assert_eq!(reading.polarity, Polarity::Positive);
}

#[test]
fn mean_is_integer_before_scaling() {
    let engine = engine();
    let window = Window {
        sum: 9,
        count: 4,
        max: 3,
        min: 2,
    };
    let reading = engine.compute_reading(&window);
    assert_eq!(reading.mean_code, 2);
    assert!((reading.amps - engine.voltage_scale() * 2.0).abs() < 1e-9);
}

#[test]
fn extrema_include_offset_per_sample() {
    let (mut engine, _) = CalibrationEngine::open(TestStore::new(), small_window(4));
    engine.capture_offset(400).expect("capture");
    assert_eq!(engine.offset_per_sample(), -100.0);

    let window = Window {
        sum: 500,
        count: 4,
        max: 200,
        min: 50,
    };
    let reading = engine.compute_reading(&window);
    let vs = engine.voltage_scale();
    assert_eq!(reading.mean_code, 25);
    assert!((reading.high_volts - vs * 100.0).abs() < 1e-9);
    assert!((reading.low_volts - vs * -50.0).abs() < 1e-9);
}

#[test]
fn scale_factor_multiplies_reading() {
    let mut engine = engine();
    let before = engine.compute_reading(&uniform(1000, 430)).amps;
    engine.set_scale_factor(2.0).expect("scale");
    let after = engine.compute_reading(&uniform(1000, 430)).amps;
    assert!((after - 2.0 * before).abs() < 1e-6);
}

#[test]
fn gain_sets_voltage_scale() {
    let default_scale = engine().voltage_scale();
    let settings = AcquisitionSettings {
        gain: Gain::Fsr2V048,
        data_rate: DataRate::Sps128,
        samples_per_window: 430,
    };
    let (engine, _) = CalibrationEngine::open(TestStore::new(), settings);
    assert!((engine.voltage_scale() - default_scale / 2.0).abs() < 1e-12);
}

#[test]
fn settings_are_fixed_for_the_monitor_lifetime() {
    let mut monitor = common::monitor_with(small_window(4));
    assert_eq!(monitor.calibration().settings().samples_per_window, 4);
    assert_eq!(monitor.aggregator().window_size(), 4);
    assert!(feed(&mut monitor, 10, 3).is_none());
    assert!(feed(&mut monitor, 10, 1).is_some());
}

#[test]
fn corrected_mean_saturates() {
    let (mut engine, _) = CalibrationEngine::open(TestStore::new(), small_window(1));
    engine.capture_offset(i32::MAX).expect("capture");
    let reading = engine.compute_reading(&uniform(i16::MIN, 1));
    assert_eq!(reading.mean_code, i32::MIN);
    assert!(reading.amps < 0.0);

    engine.capture_offset(-i32::MAX).expect("capture");
    let reading = engine.compute_reading(&uniform(i16::MAX, 1));
    assert_eq!(reading.mean_code, i32::MAX);
}

#[test]
fn counts_per_milliamp_is_inverse_scale() {
    let engine = engine();
    // 32767 / 4.096 V / 1000
    assert!((engine.counts_per_milliamp() - 7.9998).abs() < 1e-3);
}

// =============================================================================
// Offset Tests
// =============================================================================

#[test]
fn captured_offset_zeroes_the_same_input() {
    let mut monitor = common::monitor();
    let report = feed(&mut monitor, 37, 430).expect("window");
    assert!(report.reading.amps > 0.0);

    monitor
        .calibration_mut()
        .capture_offset(report.window.sum)
        .expect("capture");
    assert_eq!(monitor.calibration().offset_sum(), -37 * 430);

    let report = feed(&mut monitor, 37, 430).expect("window");
    assert!(report.reading.amps.abs() < 1e-6);
    assert!(report.reading.high_volts.abs() < 1e-6);
    assert!(report.reading.low_volts.abs() < 1e-6);
}

#[test]
fn captured_offset_is_persisted() {
    let mut engine = engine();
    engine.capture_offset(-5000).expect("capture");
    let mut store = engine.into_store();
    let record = CalibrationRecord::load(&mut store, 0)
        .expect("read")
        .expect("valid");
    assert_eq!(record.offset_sum, 5000);
}

#[test]
fn capture_of_extreme_sum_saturates() {
    let mut engine = engine();
    engine.capture_offset(i32::MIN).expect("capture");
    assert_eq!(engine.offset_sum(), i32::MAX);
}

#[test]
fn zero_offset_always_zero_and_persisted() {
    for prior in [0, 1, -98_765, 14_000_000] {
        let mut engine = engine();
        engine.capture_offset(prior).expect("capture");
        engine.zero_offset().expect("zero");
        assert_eq!(engine.offset_sum(), 0);
        assert_eq!(engine.offset_per_sample(), 0.0);

        let mut store = engine.into_store();
        let record = CalibrationRecord::load(&mut store, 0)
            .expect("read")
            .expect("valid");
        assert_eq!(record.offset_sum, 0);
    }
}

// =============================================================================
// Scale Factor Tests
// =============================================================================

#[test]
fn scale_factor_round_trips_through_store() {
    for value in [1.0_f32, 0.001, -3.75, 1234.567, 10_000.0, -10_000.0, 1.0e-6] {
        let mut engine = engine();
        let accepted = engine.set_scale_factor(value).expect("in range");
        assert_eq!(accepted.get(), value);

        let (reloaded, outcome) =
            CalibrationEngine::open(engine.into_store(), AcquisitionSettings::default());
        assert_eq!(outcome, LoadOutcome::Loaded);
        assert_eq!(reloaded.scale_factor().get().to_bits(), value.to_bits());
    }
}

#[test]
fn scale_factor_parsed_from_text() {
    let mut engine = engine();
    let accepted = engine.set_scale_factor_from_str("  2.75 ").expect("parse");
    assert_eq!(accepted.get(), 2.75);
    assert_eq!(engine.scale_factor().get(), 2.75);
}

#[test]
fn rejected_scale_factor_changes_nothing() {
    let mut engine = engine();
    engine.set_scale_factor(4.0).expect("scale");
    let before = stored_bytes(&mut engine.into_store());

    for token in ["abc", "", "1.2.3", "--1", "nan", "inf", "0", "0.0", "10000.5", "-20000", "1e9"] {
        let mut store = TestStore::new();
        store.write(0, &before).expect("seed");
        let (mut engine, _) = CalibrationEngine::open(store, AcquisitionSettings::default());
        let writes = engine.store().write_count();

        let err = engine
            .set_scale_factor_from_str(token)
            .expect_err("token must be rejected");
        assert!(
            matches!(err, CalibrationError::NotANumber | CalibrationError::OutOfBounds(_)),
            "{token:?} gave {err:?}"
        );
        assert_eq!(engine.scale_factor().get(), 4.0, "{token:?}");
        assert_eq!(engine.store().write_count(), writes, "{token:?}");
        assert_eq!(stored_bytes(&mut engine.into_store()), before, "{token:?}");
    }
}

#[test]
fn non_numeric_reports_not_a_number() {
    let mut engine = engine();
    assert_eq!(
        engine.set_scale_factor_from_str("volts"),
        Err(CalibrationError::NotANumber)
    );
}

#[test]
fn out_of_bound_reports_value() {
    let mut engine = engine();
    assert_eq!(
        engine.set_scale_factor(12_345.0),
        Err(CalibrationError::OutOfBounds(12_345.0))
    );
}

#[test]
fn reset_restores_unity() {
    let mut engine = engine();
    engine.set_scale_factor(9.5).expect("scale");
    let unity = engine.reset_scale_factor().expect("reset");
    assert_eq!(unity, ScaleFactor::UNITY);
    let mut store = engine.into_store();
    let record = CalibrationRecord::load(&mut store, 0)
        .expect("read")
        .expect("valid");
    assert_eq!(record.scale_factor, ScaleFactor::UNITY);
}

// =============================================================================
// Write-through Tests
// =============================================================================

#[test]
fn failed_write_leaves_memory_unchanged() {
    let (mut engine, _) = CalibrationEngine::open(FailingStore::new(), AcquisitionSettings::default());
    engine.set_scale_factor(2.0).expect("scale");
    engine.capture_offset(100).expect("capture");

    let mut store = engine.into_store();
    store.fail_writes = true;
    let (mut engine, outcome) = CalibrationEngine::open(store, AcquisitionSettings::default());
    assert_eq!(outcome, LoadOutcome::Loaded);
    let vs = engine.voltage_scale();

    assert_eq!(
        engine.set_scale_factor(3.0),
        Err(CalibrationError::Store(StoreError::Bus))
    );
    assert_eq!(
        engine.zero_offset(),
        Err(CalibrationError::Store(StoreError::Bus))
    );
    assert_eq!(
        engine.capture_offset(7),
        Err(CalibrationError::Store(StoreError::Bus))
    );
    assert_eq!(engine.scale_factor().get(), 2.0);
    assert_eq!(engine.offset_sum(), -100);
    assert_eq!(engine.voltage_scale(), vs);
}

#[test]
fn memory_matches_store_after_every_mutation() {
    let mut engine = engine();
    let check = |engine: &mut CalibrationEngine<TestStore>| {
        let bytes = engine.store().as_bytes()[..RECORD_LEN].to_vec();
        assert_eq!(bytes, engine.record().encode().to_vec());
    };
    engine.capture_offset(321).expect("capture");
    check(&mut engine);
    engine.set_scale_factor(-1.5).expect("scale");
    check(&mut engine);
    engine.zero_offset().expect("zero");
    check(&mut engine);
    engine.reset_scale_factor().expect("reset");
    check(&mut engine);
}

#[test]
fn error_display() {
    assert_eq!(
        CalibrationError::Store(StoreError::Timeout).to_string(),
        format!("{}", CalibrationError::from(StoreError::Timeout))
    );
    assert!(!CalibrationError::NotANumber.to_string().is_empty());
}

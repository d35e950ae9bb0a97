use approx::assert_abs_diff_eq;

use astrostack_core::consts::ALPHA;
use astrostack_core::filters::{
    apply, apply_settings, auto_levels, BasicAdjustments, LevelsParams, ToneSettings,
};
use astrostack_core::frame::Frame;

fn px(r: f32, g: f32, b: f32, a: f32) -> Frame {
    Frame::filled(2, 2, [r, g, b, a])
}

#[test]
fn test_defaults_are_identity_on_8bit_values() {
    let frame = px(64.0 / 255.0, 128.0 / 255.0, 1.0, 0.5);
    let out = apply(&frame, &LevelsParams::default(), &BasicAdjustments::default());
    assert_abs_diff_eq!(out.data[[0, 0, 0]], 64.0 / 255.0, epsilon = 1e-6);
    assert_abs_diff_eq!(out.data[[0, 0, 1]], 128.0 / 255.0, epsilon = 1e-6);
    assert_abs_diff_eq!(out.data[[0, 0, 2]], 1.0, epsilon = 1e-6);
    assert_eq!(out.data[[0, 0, ALPHA]], 0.5);
}

#[test]
fn test_levels_stretch() {
    let levels = LevelsParams {
        black_point: 50,
        white_point: 150,
        midtones: 1.0,
    };
    let out = apply(&px(0.1, 100.0 / 255.0, 0.9, 1.0), &levels, &BasicAdjustments::default());
    assert_eq!(out.data[[0, 0, 0]], 0.0);
    assert_abs_diff_eq!(out.data[[0, 0, 1]], 0.5, epsilon = 1e-6);
    assert_abs_diff_eq!(out.data[[0, 0, 2]], 1.0, epsilon = 1e-6);
}

#[test]
fn test_exposure_one_stop_doubles() {
    let basic = BasicAdjustments {
        exposure: 100.0,
        ..Default::default()
    };
    let out = apply(&px(0.2, 0.2, 0.2, 1.0), &LevelsParams::default(), &basic);
    let expected = 2.0 * (0.2f32 * 255.0).round() / 255.0;
    assert_abs_diff_eq!(out.data[[1, 1, 0]], expected, epsilon = 1e-5);
}

#[test]
fn test_brightness_clamps() {
    let basic = BasicAdjustments {
        brightness: 300.0,
        ..Default::default()
    };
    let out = apply(&px(0.5, 0.5, 0.5, 1.0), &LevelsParams::default(), &basic);
    assert_abs_diff_eq!(out.data[[0, 0, 0]], 1.0, epsilon = 1e-6);
}

#[test]
fn test_zero_saturation_is_grey() {
    let basic = BasicAdjustments {
        saturation: 0.0,
        ..Default::default()
    };
    let out = apply(&px(1.0, 0.0, 0.0, 1.0), &LevelsParams::default(), &basic);
    let r = out.data[[0, 0, 0]];
    assert_abs_diff_eq!(r, 0.299, epsilon = 1e-6);
    assert_eq!(out.data[[0, 0, 1]], r);
    assert_eq!(out.data[[0, 0, 2]], r);
}

#[test]
fn test_auto_levels_stretches_range() {
    let mut frame = Frame::filled(10, 10, [0.2, 0.2, 0.2, 1.0]);
    for col in 0..10 {
        for ch in 0..3 {
            frame.data[[9, col, ch]] = 0.6;
        }
    }
    let levels = auto_levels(&frame, 0.0, 1.0);
    assert!(levels.black_point <= 51);
    assert!(levels.white_point >= 153);

    let settings = ToneSettings {
        auto_levels: Some((0.0, 1.0)),
        ..Default::default()
    };
    let out = apply_settings(&frame, &settings);
    assert!(out.data[[0, 0, 0]] < 0.02);
    assert!(out.data[[9, 0, 0]] > 0.98);
}

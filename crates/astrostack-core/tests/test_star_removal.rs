mod common;

use astrostack_core::consts::ALPHA;
use astrostack_core::frame::Frame;
use astrostack_core::postprocess::star_removal::build_star_mask;
use astrostack_core::postprocess::{remove_stars, StarRemovalConfig};

use common::frame_with_discs;

fn config() -> StarRemovalConfig {
    StarRemovalConfig {
        strength: 0.5,
        ..Default::default()
    }
}

#[test]
fn test_star_is_replaced_by_background() {
    let frame = frame_with_discs(41, 41, 0.2, &[(20.0, 20.0, 3.0, 1.0)]);
    let (cleaned, report) = remove_stars(&frame, &config());

    assert_eq!(report.stars, 1);
    assert!(report.masked > 0);
    assert_eq!(report.filled, report.masked);
    assert_eq!(report.unfilled, 0);
    for ch in 0..3 {
        assert!(
            (cleaned.data[[20, 20, ch]] - 0.2).abs() < 1e-5,
            "centre channel {ch} = {}",
            cleaned.data[[20, 20, ch]]
        );
    }
}

#[test]
fn test_unmasked_pixels_and_alpha_untouched() {
    let mut frame = frame_with_discs(41, 41, 0.2, &[(20.0, 20.0, 3.0, 1.0)]);
    frame.data[[20, 20, ALPHA]] = 0.75;
    let (mask, _) = build_star_mask(&frame, &config());
    let (cleaned, _) = remove_stars(&frame, &config());

    for row in 0..41 {
        for col in 0..41 {
            assert_eq!(cleaned.data[[row, col, ALPHA]], frame.data[[row, col, ALPHA]]);
            if !mask.is_masked(col, row) {
                assert_eq!(cleaned.pixel(col, row), frame.pixel(col, row));
            }
        }
    }
}

#[test]
fn test_mask_covers_star_plus_margin() {
    let frame = frame_with_discs(41, 41, 0.2, &[(20.0, 20.0, 3.0, 1.0)]);
    let (mask, stars) = build_star_mask(&frame, &config());
    assert_eq!(stars, 1);
    // Star radius 3 plus the default 2 px margin.
    assert!(mask.is_masked(25, 20));
    assert!(mask.is_masked(20, 15));
    assert!(!mask.is_masked(20, 30));
}

#[test]
fn test_extended_structure_is_kept() {
    let frame = frame_with_discs(61, 61, 0.05, &[(30.0, 30.0, 15.0, 1.0)]);
    let (cleaned, report) = remove_stars(&frame, &config());
    assert_eq!(report.stars, 0);
    assert_eq!(report.masked, 0);
    assert_eq!(cleaned.data, frame.data);
}

#[test]
fn test_strength_controls_which_stars_go() {
    let frame = frame_with_discs(
        80,
        40,
        0.0,
        &[(15.0, 20.0, 2.0, 1.0), (60.0, 20.0, 2.0, 0.4)],
    );
    let (_, strong_only) = remove_stars(&frame, &config());
    let gentle = StarRemovalConfig {
        strength: 0.2,
        ..Default::default()
    };
    let (_, both) = remove_stars(&frame, &gentle);
    assert_eq!(strong_only.stars, 1);
    assert_eq!(both.stars, 2);
}

#[test]
fn test_blank_frame_is_unchanged() {
    let frame = Frame::filled(8, 8, [0.1, 0.1, 0.1, 1.0]);
    let (cleaned, report) = remove_stars(&frame, &config());
    assert_eq!(report.stars, 0);
    assert_eq!(cleaned.data, frame.data);
}

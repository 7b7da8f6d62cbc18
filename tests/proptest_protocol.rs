//! Property tests for color validation, frame encoding, status decoding and
//! the speed computation.

use proptest::prelude::*;

use krakenx::config::{Color, Configuration, MAX_COLORS};
use krakenx::cooling::{MIN_AUTO_FAN_PERCENT, PUMP_FLOOR_PERCENT, fan_speed_for, pump_speed_for};
use krakenx::protocol::{
    COLOR_FRAME_LENGTH, LightingMode, STATUS_REPORT_LENGTH, StatusReading, encode_color_frames,
};

fn any_mode() -> impl Strategy<Value = LightingMode> {
    prop::sample::select(LightingMode::ALL.to_vec())
}

fn any_color() -> impl Strategy<Value = Color> {
    any::<[u8; 3]>().prop_map(|[r, g, b]| Color::new(r, g, b))
}

fn valid_configuration() -> impl Strategy<Value = Configuration> {
    (
        any_mode(),
        prop::collection::vec(any_color(), MAX_COLORS),
        1..=MAX_COLORS,
        any_color(),
        0u8..=4,
    )
        .prop_map(|(mode, colors, color_count, text_color, animation_speed)| {
            let mut config = Configuration {
                mode,
                color_count,
                text_color,
                animation_speed,
                ..Configuration::default()
            };
            config.colors.copy_from_slice(&colors);
            config
        })
}

proptest! {
    #[test]
    fn color_accepted_iff_three_components_in_range(
        components in prop::collection::vec(-300i64..600, 0..6)
    ) {
        let in_range = components.len() == 3 && components.iter().all(|c| (0..=255).contains(c));
        prop_assert_eq!(Color::from_components(&components).is_ok(), in_range);
    }

    #[test]
    fn swap_is_an_involution(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
        let color = Color::new(r, g, b);
        prop_assert_eq!(color.swapped().swapped(), color);
        prop_assert_eq!(color.swapped().rgb(), [g, r, b]);
    }

    #[test]
    fn decode_is_pure(bytes in prop::collection::vec(any::<u8>(), STATUS_REPORT_LENGTH)) {
        let report: [u8; STATUS_REPORT_LENGTH] = bytes.clone().try_into().unwrap();
        let copy: [u8; STATUS_REPORT_LENGTH] = bytes.try_into().unwrap();

        let first = StatusReading::decode(&report);
        prop_assert_eq!(first, StatusReading::decode(&copy));
        prop_assert_eq!(first.fan_rpm, u16::from_be_bytes([report[3], report[4]]));
        prop_assert_eq!(first.pump_rpm, u16::from_be_bytes([report[5], report[6]]));
    }

    #[test]
    fn frame_count_follows_mode(config in valid_configuration()) {
        prop_assert!(config.validate().is_ok());

        let frames = encode_color_frames(&config).unwrap();
        let expected = if config.mode.is_chained() { config.color_count } else { 1 };
        prop_assert_eq!(frames.len(), expected);
        prop_assert!(frames.iter().all(|f| f.len() == COLOR_FRAME_LENGTH));
        prop_assert_eq!(encode_color_frames(&config).unwrap(), frames);
    }

    #[test]
    fn speeds_stay_in_bounds(max_safe_temp in 30u8..=85, current in -50.0f64..150.0) {
        let fan = fan_speed_for(max_safe_temp, current);
        let pump = pump_speed_for(fan);

        prop_assert!((MIN_AUTO_FAN_PERCENT..=100).contains(&fan));
        prop_assert_eq!(fan % 5, 0);
        prop_assert!((PUMP_FLOOR_PERCENT..=100).contains(&pump));
        prop_assert!(pump >= fan);
    }
}

//! Fuzz target: `PressClassifier::sample`
//!
//! Drives an arbitrary stream of (level, time step) samples through the
//! classifier.  Events may only fire on a release, and each press yields
//! at most one event.
//!
//! cargo fuzz run fuzz_button_samples

#![no_main]

use libfuzzer_sys::fuzz_target;
use osmoflow::drivers::button::PressClassifier;

fuzz_target!(|data: &[u8]| {
    let mut classifier = PressClassifier::new(50, 1500);
    let mut now = 0u64;
    let mut was_pressed = false;

    for byte in data {
        let pressed = byte & 0x80 != 0;
        now += u64::from(byte & 0x7f);
        let event = classifier.sample(pressed, now);
        if event.is_some() {
            assert!(was_pressed && !pressed, "event without a release at {now}ms");
        }
        assert_eq!(classifier.is_pressed(), pressed);
        was_pressed = pressed;
    }
});

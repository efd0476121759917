//! Per-profile tunable constants and their thread-shared storage.
//!
//! Every (family, quality) pair owns one flat table of `f32` constants.
//! A control surface mutates the table through [`SharedTuning`], which keeps
//! each field in an atomic cell; the audio thread takes a plain value-copy
//! ([`FamilyTuning`]) once per block, so per-sample code never touches an
//! atomic. Missing keys in a loaded configuration leave the prior values in
//! place via [`TuningPatch`].

use std::sync::atomic::{AtomicU32, Ordering};

/// Families 0-4, each with a Normal and a High-Quality profile.
pub const PROFILE_COUNT: usize = 10;

macro_rules! tunable_table {
    ($($field:ident = $default:expr),+ $(,)?) => {
        /// One profile's worth of tunable constants, as plain values.
        ///
        /// This is the snapshot type the audio thread works with; it is
        /// `Copy` and carries no synchronization.
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct FamilyTuning {
            $(pub $field: f32,)+
        }

        /// Sparse overlay for a profile: `None` fields keep prior values.
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(default))]
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        pub struct TuningPatch {
            $(pub $field: Option<f32>,)+
        }

        impl FamilyTuning {
            pub const FIELD_COUNT: usize = [$(stringify!($field)),+].len();

            /// Shared starting point before per-family adjustments.
            pub fn base() -> Self {
                Self {
                    $($field: $default,)+
                }
            }

            pub fn to_array(&self) -> [f32; Self::FIELD_COUNT] {
                [$(self.$field),+]
            }

            pub fn from_array(values: &[f32; Self::FIELD_COUNT]) -> Self {
                let mut index = 0;
                $(
                    let $field = values[index];
                    index += 1;
                )+
                let _ = index;
                Self { $($field),+ }
            }
        }

        impl TuningPatch {
            /// Overlay the set fields onto `target`, leaving the rest alone.
            pub fn apply(&self, target: &mut FamilyTuning) {
                $(
                    if let Some(value) = self.$field {
                        target.$field = value;
                    }
                )+
            }
        }
    };
}

tunable_table! {
    // Modulation range and per-core delay smoothing.
    mod_depth_ms = 6.0,
    delay_smooth_ms = 12.0,
    // Core switching.
    warmup_ms = 40.0,
    switch_fade_ms = 80.0,
    duck_depth = 0.25,
    duck_width = 0.1,
    fade_bias = 1.6,
    // Input conditioning.
    input_hp_hz = 60.0,
    emphasis_hz = 2_500.0,
    emphasis_max = 0.6,
    emphasis_rms_ref = 0.25,
    rms_time_ms = 120.0,
    // Wet post-processing.
    bloom_amount = 0.35,
    bloom_hz = 1_200.0,
    focus_amount = 0.3,
    focus_hz = 1_800.0,
    post_drive = 1.5,
    // Output compressor.
    comp_threshold = 0.7,
    comp_ratio = 3.0,
    comp_attack_ms = 8.0,
    comp_release_ms = 120.0,
    comp_makeup = 1.1,
    // Bucket-brigade emulation.
    bbd_stages = 1_024.0,
    bbd_clock_min_hz = 4_000.0,
    bbd_clock_max_hz = 250_000.0,
    bbd_bandwidth_ratio = 0.3,
    bbd_color_darken = 0.5,
    // Tape emulation.
    tape_drive = 1.8,
    tape_tension = 0.25,
    tape_wow_rate_hz = 0.9,
    tape_wow_depth = 0.004,
    tape_flutter_rate_hz = 6.1,
    tape_flutter_depth = 0.001_5,
    tape_leak = 0.000_8,
    tape_depth_scale = 0.01,
    tape_tone_min_hz = 1_200.0,
    tape_tone_max_hz = 9_000.0,
    tape_tone_smooth_ms = 30.0,
    // Ensemble twin-tap shaping.
    ensemble_detune = 0.05,
    ensemble_depth_scale = 0.7,
    ensemble_blend_max = 0.45,
    // Windowed-sinc delay smoothing.
    sinc_smooth_ms = 3.0,
    // Phase-warp shaping.
    warp_amount = 0.8,
    warp_feedback = 1.2,
    warp_ratio = 2.0,
    // Orbit geometry.
    orbit_ecc = 0.6,
    orbit_rot_min_hz = 0.02,
    orbit_rot_max_hz = 0.35,
}

impl FamilyTuning {
    /// Factory constants for one of the ten shipped profiles.
    pub fn defaults_for(family: usize, high_quality: bool) -> Self {
        let mut tuning = Self::base();
        match family {
            // Silk: restrained depth, gentle presence lift.
            0 => {
                tuning.mod_depth_ms = 4.0;
                tuning.delay_smooth_ms = 15.0;
                tuning.focus_amount = 0.35;
            }
            // Ensemble: wide, dense, blooms in the low mids.
            1 => {
                tuning.mod_depth_ms = 7.0;
                tuning.bloom_amount = 0.4;
                tuning.ensemble_blend_max = 0.5;
            }
            // Analog: narrower sweep, darker reconstruction.
            2 => {
                tuning.mod_depth_ms = 5.0;
                tuning.input_hp_hz = 80.0;
                tuning.bbd_bandwidth_ratio = 0.28;
            }
            // Vintage: color doubles as post drive.
            3 => {
                tuning.mod_depth_ms = 5.5;
                tuning.post_drive = 2.2;
            }
            // Dream: the widest, slowest-moving profile.
            _ => {
                tuning.mod_depth_ms = 8.0;
            }
        }
        if high_quality {
            tuning.switch_fade_ms = 110.0;
            tuning.warmup_ms = 55.0;
            tuning.delay_smooth_ms *= 0.7;
            tuning.tape_tone_max_hz = 12_000.0;
            tuning.bbd_stages = 2_048.0;
            tuning.bbd_bandwidth_ratio = 0.32;
        }
        tuning
    }
}

#[inline]
fn profile_index(family: usize, high_quality: bool) -> usize {
    family.min(4) * 2 + high_quality as usize
}

/// Writer-side storage for all ten profiles.
///
/// Each field lives in its own `AtomicU32` holding the `f32` bit pattern,
/// so a control thread can update any subset without locking while the
/// audio thread snapshots a whole profile with relaxed loads.
pub struct SharedTuning {
    profiles: [[AtomicU32; FamilyTuning::FIELD_COUNT]; PROFILE_COUNT],
}

impl SharedTuning {
    pub fn new() -> Self {
        let profiles = std::array::from_fn(|profile| {
            let defaults =
                FamilyTuning::defaults_for(profile / 2, profile % 2 == 1).to_array();
            std::array::from_fn(|field| AtomicU32::new(defaults[field].to_bits()))
        });
        Self { profiles }
    }

    /// Value-copy of one profile. Called once per block on the audio thread.
    pub fn load(&self, family: usize, high_quality: bool) -> FamilyTuning {
        let cells = &self.profiles[profile_index(family, high_quality)];
        let mut values = [0.0f32; FamilyTuning::FIELD_COUNT];
        for (value, cell) in values.iter_mut().zip(cells.iter()) {
            *value = f32::from_bits(cell.load(Ordering::Relaxed));
        }
        FamilyTuning::from_array(&values)
    }

    pub fn store(&self, family: usize, high_quality: bool, tuning: &FamilyTuning) {
        let cells = &self.profiles[profile_index(family, high_quality)];
        for (cell, value) in cells.iter().zip(tuning.to_array().iter()) {
            cell.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    /// Overlay a sparse patch onto one profile.
    pub fn apply_patch(&self, family: usize, high_quality: bool, patch: &TuningPatch) {
        let mut tuning = self.load(family, high_quality);
        patch.apply(&mut tuning);
        self.store(family, high_quality, &tuning);
    }
}

impl Default for SharedTuning {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_round_trip_preserves_every_field() {
        let tuning = FamilyTuning::defaults_for(2, true);
        let round = FamilyTuning::from_array(&tuning.to_array());
        assert_eq!(tuning, round);
    }

    #[test]
    fn test_shared_tuning_store_and_load() {
        let shared = SharedTuning::new();
        let mut tuning = shared.load(3, false);
        tuning.post_drive = 4.2;
        tuning.mod_depth_ms = 2.5;
        shared.store(3, false, &tuning);

        let reloaded = shared.load(3, false);
        assert_eq!(reloaded, tuning);
        // Other profiles are untouched.
        assert_eq!(shared.load(3, true), FamilyTuning::defaults_for(3, true));
    }

    #[test]
    fn test_patch_keeps_unset_fields() {
        let shared = SharedTuning::new();
        let before = shared.load(1, false);

        let patch = TuningPatch {
            bloom_amount: Some(0.9),
            ..Default::default()
        };
        shared.apply_patch(1, false, &patch);

        let after = shared.load(1, false);
        assert_eq!(after.bloom_amount, 0.9);
        assert_eq!(after.mod_depth_ms, before.mod_depth_ms);
        assert_eq!(after.ensemble_blend_max, before.ensemble_blend_max);
    }

    #[test]
    fn test_profiles_differ_per_family() {
        let silk = FamilyTuning::defaults_for(0, false);
        let dream = FamilyTuning::defaults_for(4, false);
        assert!(silk.mod_depth_ms < dream.mod_depth_ms);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_patch_tolerates_missing_and_unknown_keys() {
        // Only one known key present; everything else must stay default.
        let json = r#"{ "tape_drive": 2.5 }"#;
        let patch: TuningPatch = serde_json::from_str(json).unwrap();
        assert_eq!(patch.tape_drive, Some(2.5));
        assert_eq!(patch.mod_depth_ms, None);

        let mut tuning = FamilyTuning::base();
        let before = tuning;
        patch.apply(&mut tuning);
        assert_eq!(tuning.tape_drive, 2.5);
        assert_eq!(tuning.mod_depth_ms, before.mod_depth_ms);
    }
}

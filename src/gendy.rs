//! Dynamic stochastic waveform generators.
//!
//! Breakpoint-table synthesis after Xenakis: the output interpolates
//! between successive breakpoint amplitudes, and every time the phase
//! accumulator wraps, the breakpoint under the cursor has its amplitude
//! and duration perturbed by a draw from a selectable probability law,
//! then folded back into range by mirror reflection rather than clamping.
//!
//! Two variants share the state machine: [`Gendy`] interpolates linearly
//! across each segment, [`Gendyx`] raises the phase to a per-direction
//! curve exponent first.

use crate::opcode::{Opcode, OpcodeError, PerfContext};
use crate::random::{bipolar, unipolar, Rand31};
use crate::Sample;

/// Most control points a single instance may allocate.
pub const MAX_CONTROL_POINTS: usize = 8192;
/// Control-point count used when the requested count is below 1.
const DEFAULT_CONTROL_POINTS: usize = 12;

/// Probability law applied to amplitude or duration perturbations.
///
/// Each law is a closed-form transform of one raw 31-bit draw, shaped by
/// a parameter `a`. The exact constants are part of the audible behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distribution {
    /// Uniform on [-1, 1).
    #[default]
    Linear,
    Cauchy,
    Logistic,
    HyperbolicCosine,
    Arcsine,
    Exponential,
    /// Pass the (clamped) shape parameter through unchanged, so an
    /// external control signal can drive the walk directly.
    External,
}

impl Distribution {
    /// Map a numeric selector onto a law. Out-of-range selectors fall
    /// back to [`Distribution::Linear`].
    pub fn from_selector(selector: i32) -> Self {
        match selector {
            1 => Distribution::Cauchy,
            2 => Distribution::Logistic,
            3 => Distribution::HyperbolicCosine,
            4 => Distribution::Arcsine,
            5 => Distribution::Exponential,
            6 => Distribution::External,
            _ => Distribution::Linear,
        }
    }

    /// Transform a raw draw into a perturbation in roughly [-1, 1],
    /// shaped by `a` (clamped into [0.0001, 1.0] so every law stays
    /// finite).
    pub fn transform(self, a: Sample, raw: u32) -> Sample {
        let a = a.clamp(0.0001, 1.0);
        match self {
            Distribution::Linear => bipolar(raw),
            Distribution::Cauchy => {
                let c = (10.0 * a).atan();
                (1.0 / a) * (c * bipolar(raw)).tan() * 0.1
            }
            Distribution::Logistic => {
                let c = 0.5 + 0.499 * a;
                let c = ((1.0 - c) / c).ln();
                let r = (unipolar(raw) - 0.5) * 0.998 * a + 0.5;
                ((1.0 - r) / r).ln() / c
            }
            Distribution::HyperbolicCosine => {
                let c = (1.5692255 * a).tan();
                let r = (1.5692255 * a * unipolar(raw)).tan() / c;
                (r * 0.999 + 0.001).ln() * -0.1447648 * 2.0 - 1.0
            }
            Distribution::Arcsine => {
                let c = (1.5707963 * a).sin();
                (std::f64::consts::PI * (unipolar(raw) - 0.5) * a).sin() / c
            }
            Distribution::Exponential => {
                let c = (1.0 - 0.999 * a).ln();
                let r = unipolar(raw) * 0.999 * a;
                ((1.0 - r).ln() / c) * 2.0 - 1.0
            }
            Distribution::External => a,
        }
    }
}

/// Control parameters shared by both variants. All of them are read
/// fresh every block, so a scheduler may retarget them between blocks;
/// out-of-range values are clamped inside the generator, never rejected.
#[derive(Debug, Clone)]
pub struct GendyParams {
    /// Output amplitude scale.
    pub amp: Sample,
    pub amp_dist: Distribution,
    pub dur_dist: Distribution,
    /// Shape parameter for the amplitude law.
    pub amp_dist_param: Sample,
    /// Shape parameter for the duration law.
    pub dur_dist_param: Sample,
    /// Frequency reached when a breakpoint's duration value is 0.
    pub min_freq: Sample,
    /// Frequency reached when a breakpoint's duration value is 1.
    pub max_freq: Sample,
    /// Scale applied to amplitude perturbations.
    pub amp_scale: Sample,
    /// Scale applied to duration perturbations.
    pub dur_scale: Sample,
    /// Control points allocated at init; clamped into [1, 8192], with 12
    /// substituted when below 1.
    pub init_cps: i32,
    /// Usable control points per cycle; out of range falls back to the
    /// full table.
    pub knum: i32,
    /// Explicit random seed. `None` draws from the process-wide seed.
    pub seed: Option<u32>,
}

impl Default for GendyParams {
    fn default() -> Self {
        Self {
            amp: 1.0,
            amp_dist: Distribution::Cauchy,
            dur_dist: Distribution::Cauchy,
            amp_dist_param: 1.0,
            dur_dist_param: 1.0,
            min_freq: 440.0,
            max_freq: 660.0,
            amp_scale: 0.5,
            dur_scale: 0.5,
            init_cps: 12,
            knum: 12,
            seed: None,
        }
    }
}

/// Per-instance state. Owned exclusively by one instance, mutated only by
/// its own process step.
#[derive(Debug, Default)]
struct GendyState {
    phase: Sample,
    amp: Sample,
    next_amp: Sample,
    dur: Sample,
    speed: Sample,
    index: usize,
    /// Clamped copy of `init_cps`; the caller's params are never written.
    cps: usize,
    rng: Rand31,
    amp_points: Vec<Sample>,
    dur_points: Vec<Sample>,
}

impl GendyState {
    fn build(params: &GendyParams) -> Self {
        let cps = if params.init_cps < 1 {
            DEFAULT_CONTROL_POINTS
        } else {
            (params.init_cps as usize).min(MAX_CONTROL_POINTS)
        };
        let mut rng = match params.seed {
            Some(seed) => Rand31::with_seed(seed),
            None => Rand31::from_global(),
        };
        let mut amp_points = Vec::with_capacity(cps);
        let mut dur_points = Vec::with_capacity(cps);
        for _ in 0..cps {
            amp_points.push(rng.next_bipolar());
            dur_points.push(rng.next_unipolar());
        }
        GendyState {
            phase: 1.0,
            amp: 0.0,
            next_amp: 0.0,
            dur: 0.0,
            speed: 100.0,
            index: 0,
            cps,
            rng,
            amp_points,
            dur_points,
        }
    }

    /// One breakpoint transition: advance the cursor, perturb the stored
    /// amplitude and duration under it, recompute the phase increment.
    fn advance(&mut self, params: &GendyParams, sample_dur: Sample) {
        let knum = match params.knum {
            k if k < 1 || k as usize > self.cps => self.cps,
            k => k as usize,
        };
        self.index = (self.index + 1) % knum;
        self.amp = self.next_amp;

        let draw = self.rng.next_raw();
        let dist = params.amp_dist.transform(params.amp_dist_param, draw);
        let next_amp = mirror_amp(self.amp_points[self.index] + params.amp_scale * dist);
        self.next_amp = next_amp;
        self.amp_points[self.index] = next_amp;

        let draw = self.rng.next_raw();
        let dist = params.dur_dist.transform(params.dur_dist_param, draw);
        let dur = mirror_dur(self.dur_points[self.index] + params.dur_scale * dist);
        self.dur = dur;
        self.dur_points[self.index] = dur;

        self.speed =
            (params.min_freq + (params.max_freq - params.min_freq) * dur) * sample_dur * knum as Sample;
    }
}

/// Reflect an amplitude candidate back into [-1, 1].
///
/// Out-of-range values shift into [0, 4), reduce modulo 4, then fold:
/// (1, 3) maps to `2 - v`, [3, 4) maps to `v - 4`.
fn mirror_amp(mut v: Sample) -> Sample {
    if !(-1.0..=1.0).contains(&v) {
        if v < 0.0 {
            v += 4.0;
        }
        v %= 4.0;
        if v > 1.0 {
            v = if v < 3.0 { 2.0 - v } else { v - 4.0 };
        }
    }
    v
}

/// Reflect a duration candidate back toward the unit interval. The case
/// split differs from the amplitude fold on purpose: duration is
/// unipolar.
fn mirror_dur(v: Sample) -> Sample {
    if v > 1.0 {
        2.0 - v % 2.0
    } else if v < 0.0 {
        2.0 - (v + 2.0) % 2.0
    } else {
        v
    }
}

/// Stochastic generator, linear-segment variant.
#[derive(Debug, Default)]
pub struct Gendy {
    pub params: GendyParams,
    state: GendyState,
}

impl Gendy {
    pub fn new(params: GendyParams) -> Self {
        Self {
            params,
            state: GendyState::default(),
        }
    }
}

impl Opcode for Gendy {
    fn init(&mut self, _ctx: &PerfContext) -> Result<(), OpcodeError> {
        self.state = GendyState::build(&self.params);
        Ok(())
    }

    fn process_block(&mut self, ctx: &PerfContext, out: &mut [Sample]) -> Result<(), OpcodeError> {
        if out.len() != ctx.block_size {
            return Err(OpcodeError::BlockSizeMismatch {
                want: ctx.block_size,
                got: out.len(),
            });
        }
        let state = &mut self.state;
        if state.amp_points.is_empty() {
            return Err(OpcodeError::NotInitialized);
        }
        let sample_dur = ctx.sample_dur();
        for sample in out.iter_mut() {
            while state.phase >= 1.0 {
                state.phase -= 1.0;
                state.advance(&self.params, sample_dur);
            }
            *sample =
                self.params.amp * ((1.0 - state.phase) * state.amp + state.phase * state.next_amp);
            state.phase += state.speed;
        }
        Ok(())
    }
}

/// Stochastic generator, power-curve variant. Rising segments follow
/// `phase^curve_up`, falling segments `phase^curve_down`.
#[derive(Debug)]
pub struct Gendyx {
    pub params: GendyParams,
    /// Curve sharpness for rising segments; negative values clamp to 0.
    pub curve_up: Sample,
    /// Curve sharpness for falling segments; negative values clamp to 0.
    pub curve_down: Sample,
    state: GendyState,
}

impl Gendyx {
    pub fn new(params: GendyParams, curve_up: Sample, curve_down: Sample) -> Self {
        Self {
            params,
            curve_up,
            curve_down,
            state: GendyState::default(),
        }
    }
}

impl Default for Gendyx {
    fn default() -> Self {
        Self::new(GendyParams::default(), 1.0, 1.0)
    }
}

impl Opcode for Gendyx {
    fn init(&mut self, _ctx: &PerfContext) -> Result<(), OpcodeError> {
        self.state = GendyState::build(&self.params);
        Ok(())
    }

    fn process_block(&mut self, ctx: &PerfContext, out: &mut [Sample]) -> Result<(), OpcodeError> {
        if out.len() != ctx.block_size {
            return Err(OpcodeError::BlockSizeMismatch {
                want: ctx.block_size,
                got: out.len(),
            });
        }
        let state = &mut self.state;
        if state.amp_points.is_empty() {
            return Err(OpcodeError::NotInitialized);
        }
        let sample_dur = ctx.sample_dur();
        for sample in out.iter_mut() {
            while state.phase >= 1.0 {
                state.phase -= 1.0;
                state.advance(&self.params, sample_dur);
            }
            // Clamp copies each sample; the caller-visible fields stay.
            let up = self.curve_up.max(0.0);
            let down = self.curve_down.max(0.0);
            let curve = if state.next_amp - state.amp > 0.0 { up } else { down };
            *sample = self.params.amp
                * (state.amp + state.phase.powf(curve) * (state.next_amp - state.amp));
            state.phase += state.speed;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mirror_amp_folds_to_spec_value() {
        // 2.5 mod 4 = 2.5, inside (1, 3), so the fold is 2 - 2.5.
        assert!((mirror_amp(2.5) - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn mirror_amp_cases() {
        assert_eq!(mirror_amp(0.25), 0.25);
        assert_eq!(mirror_amp(-1.0), -1.0);
        assert_eq!(mirror_amp(1.0), 1.0);
        // 3.5 lands in [3, 4): folds to v - 4.
        assert!((mirror_amp(3.5) - (-0.5)).abs() < 1e-12);
        // -1.5 shifts to 2.5, folds to -0.5.
        assert!((mirror_amp(-1.5) - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn mirror_dur_cases() {
        assert_eq!(mirror_dur(0.5), 0.5);
        assert!((mirror_dur(1.25) - 0.75).abs() < 1e-12);
        assert!((mirror_dur(-0.25) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn transform_clamps_shape_parameter() {
        // A zero shape parameter would blow up Cauchy's 1/a; the clamp
        // keeps it finite.
        let v = Distribution::Cauchy.transform(0.0, 12345);
        assert!(v.is_finite());
        // External passes the clamped parameter through.
        assert_eq!(Distribution::External.transform(7.5, 1), 1.0);
        assert_eq!(Distribution::External.transform(0.0, 1), 0.0001);
    }

    #[test]
    fn selector_mapping() {
        assert_eq!(Distribution::from_selector(0), Distribution::Linear);
        assert_eq!(Distribution::from_selector(4), Distribution::Arcsine);
        assert_eq!(Distribution::from_selector(99), Distribution::Linear);
        assert_eq!(Distribution::from_selector(-1), Distribution::Linear);
    }

    #[test]
    fn init_clamps_control_points() {
        let ctx = PerfContext::new(44100.0, 64);
        let mut g = Gendy::new(GendyParams {
            init_cps: 0,
            seed: Some(1),
            ..GendyParams::default()
        });
        g.init(&ctx).unwrap();
        assert_eq!(g.state.amp_points.len(), DEFAULT_CONTROL_POINTS);
        // The caller-visible parameter is untouched.
        assert_eq!(g.params.init_cps, 0);

        let mut g = Gendy::new(GendyParams {
            init_cps: 100_000,
            seed: Some(1),
            ..GendyParams::default()
        });
        g.init(&ctx).unwrap();
        assert_eq!(g.state.amp_points.len(), MAX_CONTROL_POINTS);
    }

    #[test]
    fn process_before_init_is_an_error() {
        let ctx = PerfContext::new(44100.0, 64);
        let mut g = Gendy::new(GendyParams::default());
        let mut out = vec![0.0; 64];
        assert_eq!(
            g.process_block(&ctx, &mut out).unwrap_err(),
            OpcodeError::NotInitialized
        );
    }

    #[test]
    fn block_size_mismatch_is_an_error() {
        let ctx = PerfContext::new(44100.0, 64);
        let mut g = Gendy::new(GendyParams {
            seed: Some(1),
            ..GendyParams::default()
        });
        g.init(&ctx).unwrap();
        let mut out = vec![0.0; 32];
        assert_eq!(
            g.process_block(&ctx, &mut out).unwrap_err(),
            OpcodeError::BlockSizeMismatch { want: 64, got: 32 }
        );
    }

    proptest! {
        #[test]
        fn amp_fold_lands_in_range(v in -4.0f64..100.0) {
            // The single shift-by-4 covers candidates down to -4; below
            // that the rule is out of its stated domain.
            let folded = mirror_amp(v);
            prop_assert!((-1.0..=1.0).contains(&folded), "{v} folded to {folded}");
        }

        #[test]
        fn dur_fold_from_one_step(base in 0.0f64..=1.0, delta in -1.0f64..1.0) {
            // One perturbation step away from a stored in-range duration
            // folds back into the unit interval.
            let folded = mirror_dur(base + delta);
            prop_assert!((0.0..=1.0).contains(&folded), "{base}+{delta} folded to {folded}");
        }
    }
}

//! Regime-switch intervention on a scalar bandwidth model.
//!
//! Before `t_intervention` the system runs in the crisis regime (high
//! extraction α, high noise σ). From `t_intervention` on it switches to
//! the recovery regime (reduced σ) and a structured control term
//!
//!   u(t) = A·(sin(ω·t) + 1) / 2
//!
//! is added to the drift. A baseline run keeps the crisis regime for the
//! whole horizon. Both runs consume the same seeded noise sequence, so
//! they coincide up to the switch and any later gap is the intervention.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ensure_finite, ensure_non_negative, DynamicsError, Result};
use crate::integrator::{check_initial, SdeIntegrator};
use crate::systems::{Controllable, DiffusionModel, DriftModel, MultiplicativeNoise};

/// Extraction and noise levels of one regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regime {
    pub alpha: f64,
    pub sigma: f64,
}

impl Regime {
    fn validate(&self) -> Result<()> {
        ensure_non_negative("alpha", self.alpha)?;
        ensure_non_negative("sigma", self.sigma)
    }
}

/// Periodic control input u(t) = A·(sin(ω·t) + 1)/2, in [0, A]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlSignal {
    /// Amplitude A (`music_amp`)
    pub amplitude: f64,
    /// Angular frequency ω (`music_freq`)
    pub frequency: f64,
}

impl ControlSignal {
    #[inline]
    pub fn value(&self, t: f64) -> f64 {
        self.amplitude * ((self.frequency * t).sin() + 1.0) / 2.0
    }
}

/// Drift that switches model and adds u(t) at `t_switch`
struct SwitchedDrift<M> {
    crisis: M,
    recovery: M,
    control: ControlSignal,
    t_switch: f64,
}

impl<M: DriftModel<State = f64>> DriftModel for SwitchedDrift<M> {
    type State = f64;

    fn drift(&self, b: f64, t: f64) -> f64 {
        if t < self.t_switch {
            self.crisis.drift(b, t)
        } else {
            self.recovery.drift(b, t) + self.control.value(t)
        }
    }
}

/// Multiplicative noise whose σ switches at `t_switch`
struct SwitchedNoise {
    crisis: MultiplicativeNoise,
    recovery: MultiplicativeNoise,
    t_switch: f64,
}

impl DiffusionModel<f64> for SwitchedNoise {
    fn diffusion(&self, b: f64, t: f64) -> f64 {
        if t < self.t_switch {
            self.crisis.diffusion(b, t)
        } else {
            self.recovery.diffusion(b, t)
        }
    }
}

/// Paired intervention and baseline trajectories
#[derive(Debug, Clone, Serialize)]
pub struct InterventionOutcome {
    pub time: Array1<f64>,
    /// B(t) with the regime switch and control
    pub controlled: Array1<f64>,
    /// B(t) under the crisis regime throughout
    pub uncontrolled: Array1<f64>,
    /// u(t) at each sample (zero before the switch)
    pub control_signal: Array1<f64>,
    pub t_intervention: f64,
    pub seed: u64,
}

/// Headline numbers of an intervention run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterventionSummary {
    pub t_intervention: f64,
    /// Lowest B before the switch
    pub min_pre: Option<f64>,
    /// Mean B from the switch on
    pub mean_post: Option<f64>,
    /// Highest B from the switch on
    pub max_post: Option<f64>,
    /// mean_post / B(0)
    pub recovery_ratio: Option<f64>,
    pub final_controlled: f64,
    pub final_uncontrolled: f64,
    /// final_controlled - final_uncontrolled
    pub improvement: f64,
    /// improvement / final_uncontrolled
    pub relative_improvement: Option<f64>,
}

impl InterventionOutcome {
    /// Index of the first sample at or after the switch
    pub fn switch_index(&self) -> usize {
        self.time
            .iter()
            .position(|&t| t >= self.t_intervention)
            .unwrap_or(self.time.len())
    }

    pub fn summary(&self) -> InterventionSummary {
        let split = self.switch_index();
        let pre = self.controlled.slice(ndarray::s![..split]);
        let post = self.controlled.slice(ndarray::s![split..]);

        let min_pre = pre.iter().copied().reduce(f64::min);
        let max_post = post.iter().copied().reduce(f64::max);
        let mean_post = post.mean();

        let initial = self.controlled.first().copied().unwrap_or(f64::NAN);
        let recovery_ratio = mean_post
            .filter(|_| initial != 0.0)
            .map(|m| m / initial);

        let final_controlled = self.controlled.last().copied().unwrap_or(f64::NAN);
        let final_uncontrolled = self.uncontrolled.last().copied().unwrap_or(f64::NAN);
        let improvement = final_controlled - final_uncontrolled;
        let relative_improvement = (final_uncontrolled != 0.0).then(|| improvement / final_uncontrolled);

        InterventionSummary {
            t_intervention: self.t_intervention,
            min_pre,
            mean_post,
            max_post,
            recovery_ratio,
            final_controlled,
            final_uncontrolled,
            improvement,
            relative_improvement,
        }
    }
}

/// Runs the intervention scenario and its same-seed baseline
#[derive(Debug, Clone)]
pub struct InterventionController<M> {
    integrator: SdeIntegrator,
    model: M,
    crisis: Regime,
    recovery: Regime,
    control: ControlSignal,
    t_intervention: f64,
    initial_state: f64,
}

impl<M> InterventionController<M>
where
    M: DriftModel<State = f64> + Controllable<Parameter = f64> + Clone,
{
    /// Create controller
    ///
    /// # Arguments
    /// * `integrator` - Step size, horizon and state floor
    /// * `model` - Drift whose α is set per regime
    /// * `crisis` / `recovery` - Regimes before / after the switch
    /// * `control` - Control input added after the switch
    /// * `t_intervention` - Switch time, within [0, T]
    pub fn new(
        integrator: SdeIntegrator,
        model: M,
        crisis: Regime,
        recovery: Regime,
        control: ControlSignal,
        t_intervention: f64,
    ) -> Result<Self> {
        crisis.validate()?;
        recovery.validate()?;
        ensure_finite("music_amp", control.amplitude)?;
        ensure_finite("music_freq", control.frequency)?;
        ensure_non_negative("t_intervention", t_intervention)?;
        if t_intervention > integrator.horizon() {
            return Err(DynamicsError::invalid(
                "t_intervention",
                t_intervention,
                "must not exceed the horizon",
            ));
        }

        Ok(Self {
            integrator,
            model,
            crisis,
            recovery,
            control,
            t_intervention,
            initial_state: 1.0,
        })
    }

    /// Start both runs from `b0` instead of 1.0
    pub fn with_initial_state(mut self, b0: f64) -> Result<Self> {
        check_initial(b0)?;
        self.initial_state = b0;
        Ok(self)
    }

    /// Run intervention and baseline under one seed (random if `None`)
    pub fn run(&self, seed: Option<u64>) -> Result<InterventionOutcome> {
        let seed = seed.unwrap_or_else(rand::random);

        let crisis_model = self.model.with_parameter(self.crisis.alpha);
        let crisis_noise = MultiplicativeNoise::new(self.crisis.sigma)?;

        let switched_drift = SwitchedDrift {
            crisis: crisis_model.clone(),
            recovery: self.model.with_parameter(self.recovery.alpha),
            control: self.control,
            t_switch: self.t_intervention,
        };
        let switched_noise = SwitchedNoise {
            crisis: crisis_noise,
            recovery: MultiplicativeNoise::new(self.recovery.sigma)?,
            t_switch: self.t_intervention,
        };

        let controlled = self.integrator.integrate_seeded(
            self.initial_state,
            &switched_drift,
            &switched_noise,
            Some(seed),
        )?;
        let uncontrolled = self.integrator.integrate_seeded(
            self.initial_state,
            &crisis_model,
            &crisis_noise,
            Some(seed),
        )?;

        let time = controlled.time_grid();
        let control_signal = time.mapv(|t| {
            if t >= self.t_intervention {
                self.control.value(t)
            } else {
                0.0
            }
        });

        let outcome = InterventionOutcome {
            time,
            controlled: controlled.primary_series(),
            uncontrolled: uncontrolled.primary_series(),
            control_signal,
            t_intervention: self.t_intervention,
            seed,
        };

        let summary = outcome.summary();
        info!(
            seed,
            t_intervention = self.t_intervention,
            final_controlled = summary.final_controlled,
            final_uncontrolled = summary.final_uncontrolled,
            "intervention finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::LogisticDrift;

    fn controller(t_intervention: f64) -> InterventionController<LogisticDrift> {
        let integrator = SdeIntegrator::new(0.01, 100.0).unwrap().with_floor(0.01).unwrap();
        InterventionController::new(
            integrator,
            LogisticDrift::new(0.5, 0.8).unwrap(),
            Regime { alpha: 0.8, sigma: 0.45 },
            Regime { alpha: 0.8, sigma: 0.15 },
            ControlSignal { amplitude: 0.08, frequency: 0.5 },
            t_intervention,
        )
        .unwrap()
    }

    #[test]
    fn test_control_signal_range() {
        let u = ControlSignal { amplitude: 0.08, frequency: 0.5 };
        assert!((u.value(0.0) - 0.04).abs() < 1e-15);
        let peak = std::f64::consts::PI; // sin(0.5·π) = 1
        assert!((u.value(peak) - 0.08).abs() < 1e-12);
        for i in 0..1000 {
            let v = u.value(i as f64 * 0.1);
            assert!((0.0..=0.08).contains(&v));
        }
    }

    #[test]
    fn test_identical_before_switch() {
        let outcome = controller(40.0).run(Some(42)).unwrap();
        let split = outcome.switch_index();
        assert!(split > 0 && split < outcome.time.len());

        for i in 0..split {
            assert_eq!(
                outcome.controlled[i].to_bits(),
                outcome.uncontrolled[i].to_bits(),
                "runs differ at t = {}",
                outcome.time[i]
            );
        }
        let diverged = (split..outcome.time.len())
            .any(|i| outcome.controlled[i] != outcome.uncontrolled[i]);
        assert!(diverged, "intervention had no effect");
    }

    #[test]
    fn test_control_signal_zero_before_switch() {
        let outcome = controller(40.0).run(Some(1)).unwrap();
        let split = outcome.switch_index();
        assert!(outcome.control_signal.iter().take(split).all(|&u| u == 0.0));
        assert!(outcome.control_signal.iter().skip(split).all(|&u| u >= 0.0 && u <= 0.08));
    }

    #[test]
    fn test_intervention_lifts_bandwidth() {
        let outcome = controller(40.0).run(Some(42)).unwrap();
        let split = outcome.switch_index();
        let post_controlled = outcome.controlled.slice(ndarray::s![split..]).mean().unwrap();
        let post_baseline = outcome.uncontrolled.slice(ndarray::s![split..]).mean().unwrap();
        assert!(
            post_controlled > post_baseline,
            "controlled {} vs baseline {}",
            post_controlled,
            post_baseline
        );

        let summary = outcome.summary();
        assert!(summary.min_pre.unwrap() >= 0.01);
        assert!(summary.mean_post.unwrap() <= summary.max_post.unwrap());
        assert!((summary.improvement - (summary.final_controlled - summary.final_uncontrolled)).abs() < 1e-15);
    }

    #[test]
    fn test_floor_holds_on_both_runs() {
        let outcome = controller(40.0).run(Some(9)).unwrap();
        assert!(outcome.controlled.iter().all(|&b| b >= 0.01));
        assert!(outcome.uncontrolled.iter().all(|&b| b >= 0.01));
        assert_eq!(outcome.controlled[0], 1.0);
    }

    #[test]
    fn test_switch_time_validated() {
        let integrator = SdeIntegrator::new(0.01, 10.0).unwrap();
        let result = InterventionController::new(
            integrator,
            LogisticDrift::default(),
            Regime { alpha: 0.8, sigma: 0.45 },
            Regime { alpha: 0.8, sigma: 0.15 },
            ControlSignal { amplitude: 0.08, frequency: 0.5 },
            40.0,
        );
        assert!(result.is_err());

        let negative_noise = InterventionController::new(
            integrator,
            LogisticDrift::default(),
            Regime { alpha: 0.8, sigma: -0.1 },
            Regime { alpha: 0.8, sigma: 0.15 },
            ControlSignal { amplitude: 0.08, frequency: 0.5 },
            5.0,
        );
        assert!(negative_noise.is_err());
    }
}

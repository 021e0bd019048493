//! Transient simulation of a regularized system.
//!
//! With Creg invertible the reduced system is a pure ODE
//!
//! ```text
//! dX/dt = Creg⁻¹·(−Greg)·X + Creg⁻¹·Breg·u(t)
//! ```
//!
//! which is integrated over a caller-supplied time grid with TR-BDF2: a
//! trapezoidal stage to t + γh followed by a BDF2 stage to t + h, with
//! γ = 2 − √2 so both stages share one step matrix. The method is L-stable,
//! so stiff networks run to completion at any step size. Each grid interval
//! is split into equal substeps to keep h·‖drift‖∞ below
//! [`TransientConfig::max_step_scale`], up to [`TransientConfig::max_substeps`];
//! there is no error-based step control. Outputs are Y = Lregᵗ·X.

use std::cmp::Ordering;
use std::f64::consts::SQRT_2;

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info_span, trace};

use crate::error::{InterconnectError, MatrixRole, Result};

use super::factor::Factorization;
use super::mna::MnaSystem;

/// TR-BDF2 split point: the trapezoidal stage covers γ·h.
pub const TRBDF2_GAMMA: f64 = 2.0 - SQRT_2;

/// Default bound on h·‖drift‖∞ per substep.
pub const DEFAULT_MAX_STEP_SCALE: f64 = 0.1;

/// Default cap on substeps within one grid interval.
pub const DEFAULT_MAX_SUBSTEPS: usize = 1_000;

/// Largest time grid [`uniform_grid`] will materialize.
pub const MAX_GRID_POINTS: usize = 10_000_000;

/// Substep lengths closer than this (relative) share a step matrix.
const STEP_REUSE_TOLERANCE: f64 = 1e-9;

/// Configuration for transient simulation.
#[derive(Debug, Clone)]
pub struct TransientConfig {
    /// State at the first grid time (zero if unset).
    pub initial_state: Option<DVector<f64>>,
    /// Target bound on h·‖drift‖∞ for each substep.
    pub max_step_scale: f64,
    /// Cap on substeps in a single grid interval.
    pub max_substeps: usize,
}

impl Default for TransientConfig {
    fn default() -> Self {
        Self {
            initial_state: None,
            max_step_scale: DEFAULT_MAX_STEP_SCALE,
            max_substeps: DEFAULT_MAX_SUBSTEPS,
        }
    }
}

impl TransientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial state.
    pub fn with_initial_state(mut self, x0: DVector<f64>) -> Self {
        self.initial_state = Some(x0);
        self
    }

    /// Set the bound on h·‖drift‖∞.
    ///
    /// Only accuracy depends on it: smaller values resolve the fastest
    /// time constants more finely at the cost of more substeps.
    pub fn with_max_step_scale(mut self, scale: f64) -> Self {
        self.max_step_scale = scale;
        self
    }

    /// Set the substep cap per grid interval.
    ///
    /// Intervals that would need more substeps take exactly this many; the
    /// fastest modes are then damped rather than resolved.
    pub fn with_max_substeps(mut self, max_substeps: usize) -> Self {
        self.max_substeps = max_substeps;
        self
    }
}

/// An input waveform for one source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    /// Held at a fixed value
    Constant(f64),
    /// Zero before `at`, `level` from `at` onward
    Step { at: f64, level: f64 },
}

impl Waveform {
    /// Evaluate the waveform at time `t`.
    pub fn value(&self, t: f64) -> f64 {
        match *self {
            Waveform::Constant(v) => v,
            Waveform::Step { at, level } => {
                if t >= at {
                    level
                } else {
                    0.0
                }
            }
        }
    }
}

/// Build an input function u(t) from one waveform per source.
pub fn waveform_input(waveforms: Vec<Waveform>) -> impl Fn(f64) -> DVector<f64> {
    move |t| DVector::from_iterator(waveforms.len(), waveforms.iter().map(|w| w.value(t)))
}

/// One sample of a transient result.
#[derive(Debug, Clone, PartialEq)]
pub struct TimePoint {
    pub time: f64,
    /// Y = Lregᵗ·X at `time`
    pub outputs: DVector<f64>,
}

/// Explicit state-derivative function of a regularized system.
#[derive(Debug, Clone)]
pub struct CircuitOde {
    drift: DMatrix<f64>,
    in_term: DMatrix<f64>,
    l_reg: DMatrix<f64>,
}

impl CircuitOde {
    /// Precompute Creg⁻¹·(−Greg) and Creg⁻¹·Breg from one factorization of Creg.
    pub fn new(reduced: &MnaSystem) -> Result<Self> {
        reduced.validate()?;
        let c_lu = Factorization::new(&reduced.c, MatrixRole::Creg)?;
        let drift = c_lu.solve(&(-&reduced.g))?;
        let in_term = c_lu.solve(&reduced.b)?;
        Ok(Self {
            drift,
            in_term,
            l_reg: reduced.l.clone(),
        })
    }

    /// Number of states.
    pub fn dim(&self) -> usize {
        self.drift.nrows()
    }

    /// Number of inputs the derivative expects.
    pub fn num_inputs(&self) -> usize {
        self.in_term.ncols()
    }

    /// Creg⁻¹·Breg·u(t), checking the width of u(t).
    fn forcing<F>(&self, t: f64, input: &F) -> Result<DVector<f64>>
    where
        F: Fn(f64) -> DVector<f64>,
    {
        let u = input(t);
        if u.len() != self.num_inputs() {
            return Err(InterconnectError::dimension_mismatch(
                format!("input vector at t = {t:e}"),
                self.num_inputs(),
                u.len(),
            ));
        }
        Ok(&self.in_term * u)
    }

    /// f(x, t) = drift·x + in_term·u(t)
    pub fn derivative<F>(&self, x: &DVector<f64>, t: f64, input: &F) -> Result<DVector<f64>>
    where
        F: Fn(f64) -> DVector<f64>,
    {
        Ok(&self.drift * x + self.forcing(t, input)?)
    }

    /// Y = Lregᵗ·X
    pub fn output(&self, x: &DVector<f64>) -> DVector<f64> {
        self.l_reg.tr_mul(x)
    }

    /// ‖drift‖∞, which bounds every eigenvalue magnitude.
    pub fn stiffness_bound(&self) -> f64 {
        self.drift
            .row_iter()
            .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }
}

/// One TR-BDF2 step of fixed length, with its step matrix factored.
struct TrBdf2Step {
    h: f64,
    /// γh/2, equal to the BDF2 stage's implicit coefficient
    kappa: f64,
    /// BDF2 weights on x(t + γh) and x(t)
    a1: f64,
    a2: f64,
    lu: Factorization,
}

impl TrBdf2Step {
    /// Factor I − κ·drift for substeps of length `h`.
    fn new(ode: &CircuitOde, h: f64) -> Result<Self> {
        let gamma = TRBDF2_GAMMA;
        let kappa = 0.5 * gamma * h;
        let n = ode.dim();
        let m = DMatrix::identity(n, n) - &ode.drift * kappa;
        let denom = gamma * (2.0 - gamma);
        Ok(Self {
            h,
            kappa,
            a1: 1.0 / denom,
            a2: -(1.0 - gamma).powi(2) / denom,
            lu: Factorization::new(&m, MatrixRole::Step)?,
        })
    }

    fn fits(&self, h: f64) -> bool {
        (h - self.h).abs() <= STEP_REUSE_TOLERANCE * self.h
    }

    /// Advance `x` from `t` to `t + h`.
    fn advance<F>(&self, ode: &CircuitOde, x: &DVector<f64>, t: f64, input: &F) -> Result<DVector<f64>>
    where
        F: Fn(f64) -> DVector<f64>,
    {
        let (h, kappa) = (self.h, self.kappa);

        // Trapezoidal stage to t + γh
        let f0 = ode.derivative(x, t, input)?;
        let fg = ode.forcing(t + TRBDF2_GAMMA * h, input)?;
        let x_gamma = self.lu.solve_vector(&(x + (f0 + fg) * kappa))?;

        // BDF2 stage through t, t + γh to t + h
        let f1 = ode.forcing(t + h, input)?;
        self.lu
            .solve_vector(&(&x_gamma * self.a1 + x * self.a2 + f1 * kappa))
    }
}

/// Time points `start, start + step, …` strictly below `stop`.
///
/// Fails when the grid would exceed [`MAX_GRID_POINTS`].
pub fn uniform_grid(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if !(step.is_finite() && step > 0.0) {
        return Err(InterconnectError::invalid_param(format!(
            "time step must be positive (got {step})"
        )));
    }
    if !(start.is_finite() && stop.is_finite()) || stop < start {
        return Err(InterconnectError::invalid_param(format!(
            "invalid time range [{start}, {stop})"
        )));
    }
    let ratio = (stop - start) / step;
    if !(ratio <= MAX_GRID_POINTS as f64) {
        return Err(InterconnectError::invalid_param(format!(
            "time grid [{start}, {stop}) with step {step} exceeds {MAX_GRID_POINTS} points"
        )));
    }
    // Points within rounding distance of `stop` are excluded
    let limit = stop - step * 1e-9;
    let count = ratio.ceil() as usize;
    Ok((0..count)
        .map(|i| start + i as f64 * step)
        .filter(|&t| t < limit)
        .collect())
}

/// Simulate a regularized system over `times`, returning Y at each time.
///
/// `input` gives the source vector u(t) and must return one value per
/// column of Breg.
pub fn simulate<F>(
    reduced: &MnaSystem,
    input: F,
    times: &[f64],
    config: &TransientConfig,
) -> Result<Vec<TimePoint>>
where
    F: Fn(f64) -> DVector<f64>,
{
    let _span = info_span!("transient", points = times.len()).entered();

    if let Some(w) = times
        .windows(2)
        .find(|w| w[1].partial_cmp(&w[0]) != Some(Ordering::Greater))
    {
        return Err(InterconnectError::invalid_param(format!(
            "time grid must be strictly increasing ({} then {})",
            w[0], w[1]
        )));
    }
    if !(config.max_step_scale.is_finite() && config.max_step_scale > 0.0) {
        return Err(InterconnectError::invalid_param(format!(
            "max_step_scale must be positive (got {})",
            config.max_step_scale
        )));
    }
    if config.max_substeps == 0 {
        return Err(InterconnectError::invalid_param(
            "max_substeps must be at least 1",
        ));
    }

    let ode = CircuitOde::new(reduced)?;
    let first = match times.first() {
        Some(&t) => t,
        None => return Ok(Vec::new()),
    };

    let mut x = match &config.initial_state {
        Some(x0) if x0.len() != ode.dim() => {
            return Err(InterconnectError::dimension_mismatch(
                "initial state",
                ode.dim(),
                x0.len(),
            ));
        }
        Some(x0) => x0.clone(),
        None => DVector::zeros(ode.dim()),
    };

    let norm = ode.stiffness_bound();
    debug!(states = ode.dim(), stiffness = norm, "integrating");

    let mut points = Vec::with_capacity(times.len());
    points.push(TimePoint {
        time: first,
        outputs: ode.output(&x),
    });

    let mut stepper: Option<TrBdf2Step> = None;
    let mut capped = 0usize;
    for w in times.windows(2) {
        let (t0, t1) = (w[0], w[1]);
        let span = t1 - t0;
        let wanted = ((span * norm / config.max_step_scale).ceil() as usize).max(1);
        let substeps = wanted.min(config.max_substeps);
        if substeps < wanted {
            capped += 1;
        }

        let h = span / substeps as f64;
        let step = match stepper.take() {
            Some(step) if step.fits(h) => step,
            _ => {
                trace!(h, substeps, "factoring step matrix");
                TrBdf2Step::new(&ode, h)?
            }
        };
        for s in 0..substeps {
            x = step.advance(&ode, &x, t0 + s as f64 * step.h, &input)?;
        }
        stepper = Some(step);

        points.push(TimePoint {
            time: t1,
            outputs: ode.output(&x),
        });
    }

    if capped > 0 {
        debug!(
            intervals = capped,
            max_substeps = config.max_substeps,
            "substep cap reached; fastest modes damped rather than resolved"
        );
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::reference;
    use crate::solver::mna::{stamp_branch, stamp_lumped};
    use crate::solver::regularize::regularize;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_grid_half_open() {
        let grid = uniform_grid(0.0, 1e-9, 1e-12).unwrap();
        assert_eq!(grid.len(), 1000);
        assert_eq!(grid[0], 0.0);
        assert!(*grid.last().unwrap() < 1e-9);

        assert!(uniform_grid(0.0, 1.0, 0.0).is_err());
        assert!(uniform_grid(1.0, 0.0, 0.1).is_err());
        assert!(uniform_grid(0.0, 0.0, 0.1).unwrap().is_empty());
    }

    #[test]
    fn test_waveforms() {
        let step = Waveform::Step { at: 1e-12, level: 2.0 };
        assert_eq!(step.value(0.0), 0.0);
        assert_eq!(step.value(1e-12), 2.0);
        let input = waveform_input(vec![Waveform::Constant(0.5), step]);
        assert_eq!(input(5e-12), DVector::from_vec(vec![0.5, 2.0]));
    }

    #[test]
    fn test_single_pole_matches_exponential() {
        let (r1, r2, c) = (1e3, 1e3, 1e-15);
        let circuit = reference::rc_divider(r1, r2, c).unwrap();
        let reg = regularize(&circuit.system).unwrap();
        let times = uniform_grid(0.0, 5e-12, 1e-14).unwrap();
        let input = waveform_input(vec![Waveform::Constant(1.0)]);
        let fine = TransientConfig::new().with_max_step_scale(0.002);
        let result = simulate(&reg.system, input, &times, &fine).unwrap();

        let h0 = r2 / (r1 + r2);
        let tau = (r1 * r2 / (r1 + r2)) * c;
        for p in &result {
            let expected = h0 * (1.0 - (-p.time / tau).exp());
            assert_relative_eq!(p.outputs[0], expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_coupled_lines_step_response() {
        let circuit = reference::coupled_lines().unwrap();
        let reg = regularize(&circuit.system).unwrap();
        assert_eq!(reg.dim(), 6);

        let times = uniform_grid(0.0, 5e-9, 1e-12).unwrap();
        let input = waveform_input(vec![
            Waveform::Step { at: 0.0, level: 1.0 },
            Waveform::Constant(0.0),
        ]);
        let result = simulate(&reg.system, input, &times, &TransientConfig::default()).unwrap();
        assert_eq!(result.len(), times.len());

        let aggressor: Vec<f64> = result.iter().map(|p| p.outputs[0]).collect();
        assert_eq!(aggressor[0], 0.0);
        for w in aggressor.windows(2) {
            assert!(w[1] >= w[0] - 1e-12, "aggressor decreased: {} -> {}", w[0], w[1]);
        }
        for &y in &aggressor {
            assert!(y <= 1.0 + 1e-9, "aggressor overshoot: {y}");
        }
        assert!(*aggressor.last().unwrap() > 0.999);

        // Victim sees a crosstalk bump that decays back toward zero
        let victim: Vec<f64> = result.iter().map(|p| p.outputs[1]).collect();
        let peak = victim.iter().copied().fold(0.0, f64::max);
        assert!(peak > 0.0);
        assert!(victim.last().unwrap().abs() < 1e-3);
    }

    #[test]
    fn test_singular_creg_rejected() {
        // Nonzero rows that are linearly dependent: a lone floating capacitor
        let mut sys = MnaSystem::zeros(2, 1, 1);
        stamp_lumped(&mut sys.g, 0, 1e-3);
        stamp_lumped(&mut sys.g, 1, 1e-3);
        stamp_branch(&mut sys.c, 0, 1, 1e-15);
        sys.b[(0, 0)] = 1.0;
        sys.l[(1, 0)] = 1.0;

        let times = [0.0, 1e-12];
        let err = simulate(&sys, |_| DVector::from_element(1, 1.0), &times, &TransientConfig::new())
            .unwrap_err();
        assert_eq!(err, InterconnectError::SingularMatrix { matrix: MatrixRole::Creg });
    }

    #[test]
    fn test_input_width_checked() {
        let circuit = reference::rc_divider(1e3, 1e3, 1e-15).unwrap();
        let reg = regularize(&circuit.system).unwrap();
        let err = simulate(&reg.system, |_| DVector::zeros(2), &[0.0, 1e-13], &TransientConfig::new())
            .unwrap_err();
        assert!(matches!(err, InterconnectError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_grid_and_initial_state_validation() {
        let circuit = reference::rc_divider(1e3, 1e3, 1e-15).unwrap();
        let reg = regularize(&circuit.system).unwrap();
        let input = waveform_input(vec![Waveform::Constant(0.0)]);

        assert!(simulate(&reg.system, &input, &[0.0, 0.0], &TransientConfig::new()).is_err());
        assert!(simulate(&reg.system, &input, &[], &TransientConfig::new())
            .unwrap()
            .is_empty());

        let bad_x0 = TransientConfig::new().with_initial_state(DVector::zeros(5));
        assert!(matches!(
            simulate(&reg.system, &input, &[0.0, 1e-13], &bad_x0),
            Err(InterconnectError::DimensionMismatch { .. })
        ));

        // Starting charged with zero input decays toward zero
        let x0 = DVector::from_element(reg.dim(), 1.0);
        let charged = TransientConfig::new().with_initial_state(x0);
        let result = simulate(&reg.system, &input, &[0.0, 1e-12, 2e-12], &charged).unwrap();
        assert!(result[2].outputs[0] < result[1].outputs[0]);
        assert!(result[1].outputs[0] < result[0].outputs[0]);
    }

    #[test]
    fn test_stiff_divider_settles() {
        // tau = 5e-18 s against a 1 ps grid
        let circuit = reference::rc_divider(10.0, 10.0, 1e-18).unwrap();
        let reg = regularize(&circuit.system).unwrap();
        let times = uniform_grid(0.0, 1e-10, 1e-12).unwrap();
        let input = waveform_input(vec![Waveform::Constant(1.0)]);
        let result = simulate(&reg.system, input, &times, &TransientConfig::default()).unwrap();

        assert_eq!(result.len(), times.len());
        assert_eq!(result[0].outputs[0], 0.0);
        for p in &result[1..] {
            assert_relative_eq!(p.outputs[0], 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_substep_cap_still_completes() {
        let circuit = reference::rc_divider(10.0, 10.0, 1e-18).unwrap();
        let reg = regularize(&circuit.system).unwrap();
        let input = waveform_input(vec![Waveform::Constant(1.0)]);
        let times = uniform_grid(0.0, 1e-11, 1e-12).unwrap();

        let one = TransientConfig::new().with_max_substeps(1);
        let result = simulate(&reg.system, &input, &times, &one).unwrap();
        let last = result.last().unwrap().outputs[0];
        assert_relative_eq!(last, 0.5, epsilon = 1e-6);
        assert!(result.iter().all(|p| p.outputs[0].is_finite()));

        let none = TransientConfig::new().with_max_substeps(0);
        assert!(matches!(
            simulate(&reg.system, &input, &times, &none),
            Err(InterconnectError::InvalidSimulationParam { .. })
        ));
    }

    #[test]
    fn test_oversized_grid_rejected() {
        assert!(matches!(
            uniform_grid(0.0, 1e-9, 1e-30),
            Err(InterconnectError::InvalidSimulationParam { .. })
        ));
        assert!(uniform_grid(0.0, f64::MAX, f64::MIN_POSITIVE).is_err());
    }

    #[test]
    fn test_mismatched_shapes_rejected() {
        let circuit = reference::rc_divider(1e3, 1e3, 1e-15).unwrap();
        let mut sys = regularize(&circuit.system).unwrap().system;
        sys.l = DMatrix::zeros(3, 1);
        assert!(matches!(
            CircuitOde::new(&sys),
            Err(InterconnectError::DimensionMismatch { .. })
        ));
    }
}

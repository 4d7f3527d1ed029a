use crate::base::EvolutionManager;
use crate::material::BehaviourDescription;
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Defines the kind of constraint
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConstraintKind {
    /// The driving variable component is pinned to the evolution (direct elimination)
    DrivingVariable,

    /// The thermodynamic force component follows the evolution (one Lagrange multiplier)
    ThermodynamicForce,
}

/// Holds an algebraic equation coupling one component to an evolution
#[derive(Clone, Debug)]
pub struct Constraint {
    /// Kind of constraint
    pub kind: ConstraintKind,

    /// Name of the constrained component (e.g., "EXX" or "SYY")
    pub component: String,

    /// Name of the evolution giving the target value
    pub evolution: String,

    /// Index of the component (resolved)
    index: usize,

    /// Position of the Lagrange multiplier in the unknown vector (resolved; force constraints only)
    position: usize,
}

/// Holds all constraints in declaration order
///
/// Imposed driving variables are eliminated directly: the component is pinned to
/// `evolution(t+Δt)` and its equilibrium row is replaced by `a·(u_i - target)`, where `a`
/// is the normalisation factor. An imposed thermodynamic force on component `i` owns the
/// multiplier `λ_p` and contributes:
///
/// ```text
/// row i:  s_i - λ_p           (∂/∂u = K_i·, ∂/∂λ_p = -1)
/// row p:  s_i - target        (∂/∂u = K_i·)
/// ```
///
/// Free driving variable components satisfy `s_i = 0`.
#[derive(Clone, Debug)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
    resolved: bool,
}

impl ConstraintSet {
    /// Allocates an empty set
    pub fn new() -> Self {
        ConstraintSet {
            constraints: Vec::new(),
            resolved: false,
        }
    }

    /// Adds a constraint
    pub fn add(&mut self, kind: ConstraintKind, component: &str, evolution: &str) -> Result<(), StrError> {
        if self.resolved {
            return Err("constraints cannot be added after the initialisation is complete");
        }
        if self.constraints.iter().any(|c| c.component == component) {
            return Err("the component is already constrained");
        }
        self.constraints.push(Constraint {
            kind,
            component: component.to_string(),
            evolution: evolution.to_string(),
            index: 0,
            position: 0,
        });
        Ok(())
    }

    /// Returns the constraints
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns true if the component carries a constraint
    pub fn constrains(&self, component: &str) -> bool {
        self.constraints.iter().any(|c| c.component == component)
    }

    /// Returns the number of Lagrange multipliers (one per imposed thermodynamic force)
    pub fn n_lagrange_multipliers(&self) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.kind == ConstraintKind::ThermodynamicForce)
            .count()
    }

    /// Finds the component indices and the positions of the multipliers
    ///
    /// Multipliers follow the driving variables in declaration order.
    pub fn resolve(&mut self, description: &BehaviourDescription, evolutions: &EvolutionManager) -> Result<(), StrError> {
        let ndv = description.n_driving_variables();
        let mut position = ndv;
        for c in &mut self.constraints {
            let names = match c.kind {
                ConstraintKind::DrivingVariable => &description.driving_variables,
                ConstraintKind::ThermodynamicForce => &description.thermodynamic_forces,
            };
            c.index = match names.iter().position(|n| *n == c.component) {
                Some(index) => index,
                None => {
                    println!("ERROR: component {} is not declared by the behaviour", c.component);
                    return Err("constraint refers to an undeclared variable");
                }
            };
            if c.index >= ndv {
                return Err("constraint refers to an undeclared variable");
            }
            if !evolutions.contains(&c.evolution) {
                println!("ERROR: evolution {} is not defined", c.evolution);
                return Err("constraint refers to an undefined evolution");
            }
            if c.kind == ConstraintKind::ThermodynamicForce {
                c.position = position;
                position += 1;
            }
        }
        for (k, c) in self.constraints.iter().enumerate() {
            if self.constraints[..k].iter().any(|o| o.index == c.index) {
                return Err("the component is already constrained");
            }
        }
        self.resolved = true;
        Ok(())
    }

    /// Returns true if the constraints have been resolved
    pub fn resolved(&self) -> bool {
        self.resolved
    }

    /// Sets the imposed driving variables to their target values at time t
    pub fn pin(&self, u: &mut Vector, evolutions: &EvolutionManager, t: f64) -> Result<(), StrError> {
        for c in self.constraints.iter().filter(|c| c.kind == ConstraintKind::DrivingVariable) {
            u[c.index] = evolutions.value(&c.evolution, t)?;
        }
        Ok(())
    }

    /// Assembles the global system at time t
    ///
    /// # Input
    ///
    /// * `kk` -- Jacobian (psz × psz); overwritten
    /// * `rr` -- residual (psz); overwritten
    /// * `op` -- operator of the behaviour (nth × ndv)
    /// * `s` -- thermodynamic forces (actual or linearized)
    /// * `u` -- unknowns at which the residual is evaluated
    /// * `a` -- normalisation factor of the imposed driving variable rows
    pub fn assemble(
        &self,
        kk: &mut Matrix,
        rr: &mut Vector,
        op: &Matrix,
        s: &Vector,
        u: &Vector,
        evolutions: &EvolutionManager,
        t: f64,
        a: f64,
    ) -> Result<(), StrError> {
        let (psz, _) = kk.dims();
        let (_, ndv) = op.dims();

        // equilibrium rows
        kk.fill(0.0);
        rr.fill(0.0);
        for i in 0..ndv {
            for j in 0..ndv {
                kk.set(i, j, op.get(i, j));
            }
            rr[i] = s[i];
        }

        // constraint contributions
        for c in &self.constraints {
            let target = evolutions.value(&c.evolution, t)?;
            let i = c.index;
            match c.kind {
                ConstraintKind::DrivingVariable => {
                    for j in 0..psz {
                        kk.set(i, j, 0.0);
                    }
                    kk.set(i, i, a);
                    rr[i] = a * (u[i] - target);
                }
                ConstraintKind::ThermodynamicForce => {
                    let p = c.position;
                    kk.set(i, p, -1.0);
                    rr[i] -= u[p];
                    for j in 0..ndv {
                        kk.set(p, j, op.get(i, j));
                    }
                    rr[p] = s[i] - target;
                }
            }
        }
        Ok(())
    }

    /// Returns true if all constraints are satisfied at time t
    ///
    /// Imposed driving variables must match within `eeps` and imposed thermodynamic forces within `seps`.
    pub fn satisfied(
        &self,
        u: &Vector,
        s: &Vector,
        evolutions: &EvolutionManager,
        t: f64,
        eeps: f64,
        seps: f64,
    ) -> Result<bool, StrError> {
        for c in &self.constraints {
            let target = evolutions.value(&c.evolution, t)?;
            let ok = match c.kind {
                ConstraintKind::DrivingVariable => f64::abs(u[c.index] - target) <= eeps,
                ConstraintKind::ThermodynamicForce => f64::abs(s[c.index] - target) < seps,
            };
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Default for ConstraintSet {
    fn default() -> Self {
        ConstraintSet::new()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

use super::{Behaviour, BehaviourDescription, BehaviourHandle, BehaviourType, Direction, Kinematic, Rotation};
use super::{SymmetryType, VariableType};
use crate::base::{OutOfBoundsPolicy, StiffnessMatrixType};
use crate::driver::CurrentState;
use crate::StrError;
use libloading::Library;
use russell_lab::{Matrix, Vector};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::Arc;

/// Defines the signature of the small strain integration function
///
/// ```text
/// f(ntens, dt, drot, D, e0, de, T, dT, mp, nprops, esv, desv, iv, nstatv, s, ndi, kinc)
/// ```
///
/// * `D[0]` holds the requested operator code on entry and the operator (column-major) on exit
/// * `s` holds the stress at the beginning of the step on entry and at the end on exit
/// * `kinc` is 1 on success
pub type UmatFunction = unsafe extern "C" fn(
    ntens: *const i32,
    dt: *const f64,
    drot: *const f64,
    ddsdde: *mut f64,
    stran: *const f64,
    dstran: *const f64,
    temp: *const f64,
    dtemp: *const f64,
    props: *const f64,
    nprops: *const i32,
    predef: *const f64,
    dpred: *const f64,
    statev: *mut f64,
    nstatv: *const i32,
    stress: *mut f64,
    ndi: *const i32,
    kinc: *mut i32,
);

/// Defines the signature of the function setting the out-of-bounds policy
type PolicyFunction = unsafe extern "C" fn(policy: i32);

/// Holds the √2 factor between Mandel and engineering shear components
const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// Implements the adapter to small strain behaviours with the umat calling convention
///
/// The function usually comes from a shared library; it may also be any function with
/// the same signature (see `from_function`). Shear components are converted between the
/// Mandel basis of the driver and the engineering convention of the function around
/// every call. Orthotropic behaviours receive values in the material frame.
pub struct UmatBehaviour {
    /// Library handle (shared with the adapters created by `share`); keeps `function` alive
    library: Option<Arc<Library>>,

    /// Integration function
    function: UmatFunction,

    /// Description read from the library symbols
    description: BehaviourDescription,

    /// Strain at the beginning of the step (engineering, material frame)
    e0: Vector,

    /// Strain increment (engineering, material frame)
    de: Vector,

    /// Stress (engineering, material frame)
    s: Vector,

    /// Operator (column-major, engineering, material frame)
    dd: Vec<f64>,

    /// Internal state variables
    iv: Vec<f64>,

    /// Scratch vector for frame changes
    tmp: Vector,
}

impl UmatBehaviour {
    /// Loads the behaviour identified by the handle
    pub fn new(handle: &BehaviourHandle, policy: OutOfBoundsPolicy) -> Result<Self, StrError> {
        let library = unsafe { Library::new(&handle.library) }.map_err(|_| "cannot load the behaviour library")?;
        let f = handle.function.as_str();
        let function: UmatFunction = unsafe {
            *library
                .get::<UmatFunction>(f.as_bytes())
                .map_err(|_| "cannot find the behaviour function")?
        };

        // behaviour type and kinematic
        let code = read_u16(&library, &format!("{}_BehaviourType", f)).ok_or("cannot read the behaviour type")?;
        let btype = BehaviourType::from_code(code)?;
        if btype != BehaviourType::SmallStrain {
            return Err("only small strain behaviours are supported by the umat interface");
        }
        let mut description = BehaviourDescription::new(btype, handle.hypothesis);
        if let Some(code) = read_u16(&library, &format!("{}_BehaviourKinematic", f)) {
            description.kinematic = Kinematic::from_code(code)?;
        }

        // symmetry
        description.symmetry = match read_u16(&library, &format!("{}_SymmetryType", f)) {
            Some(1) => SymmetryType::Orthotropic,
            Some(0) | None => SymmetryType::Isotropic,
            Some(_) => return Err("unknown symmetry type code"),
        };

        // variables
        description.material_properties = read_names(&library, f, "MaterialProperties")?;
        let names = read_names(&library, f, "InternalStateVariables")?;
        let types = read_types(&library, f, names.len())?;
        description.internal_state_variables = names.into_iter().zip(types.into_iter()).collect();
        for name in read_names(&library, f, "ExternalStateVariables")? {
            description.external_state_variables.push(name);
        }
        description.reentrant = read_u16(&library, &format!("{}_Reentrant", f)) == Some(1);

        // bounds policy
        let symbol = format!("{}_setOutOfBoundsPolicy", f);
        if let Ok(set_policy) = unsafe { library.get::<PolicyFunction>(symbol.as_bytes()) } {
            unsafe { set_policy(policy.code()) };
        }

        let mut behaviour = UmatBehaviour::from_function(function, description)?;
        behaviour.library = Some(Arc::new(library));
        Ok(behaviour)
    }

    /// Wraps a function following the umat calling convention
    ///
    /// The description gives the variables (usually read from the library symbols by `new`).
    pub fn from_function(function: UmatFunction, description: BehaviourDescription) -> Result<Self, StrError> {
        if description.btype != BehaviourType::SmallStrain {
            return Err("only small strain behaviours are supported by the umat interface");
        }
        description.validate()?;
        let n = description.n_driving_variables();
        let niv = description.n_internal_state_variables();
        Ok(UmatBehaviour {
            library: None,
            function,
            description,
            e0: Vector::new(n),
            de: Vector::new(n),
            s: Vector::new(n),
            dd: vec![0.0; n * n],
            iv: vec![0.0; niv],
            tmp: Vector::new(n),
        })
    }

    /// Returns a new adapter sharing the same library handle
    ///
    /// Only allowed if the library declares itself re-entrant.
    pub fn share(&self) -> Result<Self, StrError> {
        if !self.description.reentrant {
            return Err("the behaviour library is not re-entrant");
        }
        let mut behaviour = UmatBehaviour::from_function(self.function, self.description.clone())?;
        behaviour.library = self.library.clone();
        Ok(behaviour)
    }

    /// Prepares the buffers and calls the library
    ///
    /// Returns true if the library reports success.
    fn call(
        &mut self,
        state: &CurrentState,
        rotation: &Rotation,
        dt: f64,
        ktype: StiffnessMatrixType,
        prediction: bool,
    ) -> Result<bool, StrError> {
        let n = self.description.n_driving_variables();
        let niv = self.iv.len();
        if state.mprops1.dim() != self.description.material_properties.len() {
            return Err("the number of material properties does not match the behaviour");
        }

        // driving variables and forces in the material frame
        for i in 0..n {
            self.tmp[i] = state.u0[i] - state.e_th0[i];
        }
        rotation.rotate(&mut self.e0, &self.tmp, Direction::GlobalToMaterial)?;
        for i in 0..n {
            self.tmp[i] = if prediction { 0.0 } else { state.mechanical_increment(i) };
        }
        rotation.rotate(&mut self.de, &self.tmp, Direction::GlobalToMaterial)?;
        rotation.rotate(&mut self.s, &state.s0, Direction::GlobalToMaterial)?;
        to_engineering(&mut self.e0, &mut self.de, &mut self.s);
        self.iv.copy_from_slice(&state.iv0.as_data()[..niv]);

        // requested operator
        for v in self.dd.iter_mut() {
            *v = 0.0;
        }
        self.dd[0] = ktype.code(prediction);

        // arguments
        let ntens = n as i32;
        let nprops = state.mprops1.dim() as i32;
        let nstatv = niv as i32;
        let ndi = self.description.hypothesis.umat_code();
        let drot = drot_from_frame(rotation.frame());
        let temp = state.esv0[0];
        let dtemp = if prediction { 0.0 } else { state.desv[0] };
        let predef = &state.esv0.as_data()[1..];
        let dpred: Vec<f64> = if prediction {
            vec![0.0; predef.len()]
        } else {
            state.desv.as_data()[1..].to_vec()
        };
        let dt = if prediction { 0.0 } else { dt };
        let mut kinc: i32 = 1;
        unsafe {
            (self.function)(
                &ntens,
                &dt,
                drot.as_ptr(),
                self.dd.as_mut_ptr(),
                self.e0.as_data().as_ptr(),
                self.de.as_data().as_ptr(),
                &temp,
                &dtemp,
                state.mprops1.as_data().as_ptr(),
                &nprops,
                predef.as_ptr(),
                dpred.as_ptr(),
                self.iv.as_mut_ptr(),
                &nstatv,
                self.s.as_mut_data().as_mut_ptr(),
                &ndi,
                &mut kinc,
            );
        }
        Ok(kinc == 1)
    }

    /// Copies the operator returned by the library into kt (Mandel basis, global frame)
    fn copy_operator(&self, kt: &mut Matrix, rotation: &Rotation) -> Result<(), StrError> {
        let n = self.description.n_driving_variables();
        operator_to_mandel(kt, &self.dd, n);
        rotation.rotate_stiffness(kt)
    }
}

impl Behaviour for UmatBehaviour {
    fn description(&self) -> &BehaviourDescription {
        &self.description
    }

    fn compute_prediction_operator(
        &mut self,
        kt: &mut Matrix,
        state: &CurrentState,
        rotation: &Rotation,
        ktype: StiffnessMatrixType,
    ) -> Result<bool, StrError> {
        if !self.call(state, rotation, 0.0, ktype, true)? {
            return Ok(false);
        }
        self.copy_operator(kt, rotation)?;
        Ok(true)
    }

    fn integrate(
        &mut self,
        kt: &mut Matrix,
        state: &mut CurrentState,
        rotation: &Rotation,
        dt: f64,
        ktype: StiffnessMatrixType,
    ) -> Result<bool, StrError> {
        if !self.call(state, rotation, dt, ktype, false)? {
            return Ok(false);
        }
        let n = self.description.n_driving_variables();
        for i in 3..n {
            self.s[i] *= SQRT_2;
        }
        rotation.rotate(&mut state.s1, &self.s, Direction::MaterialToGlobal)?;
        let niv = self.iv.len();
        state.iv1.as_mut_data()[..niv].copy_from_slice(&self.iv);
        if ktype != StiffnessMatrixType::NoStiffness {
            self.copy_operator(kt, rotation)?;
        }
        Ok(true)
    }
}

/// Converts strains and stress from the Mandel basis to the engineering convention
///
/// Shear strains are multiplied by √2 (γ = 2ε) and shear stresses are divided by √2.
fn to_engineering(e0: &mut Vector, de: &mut Vector, s: &mut Vector) {
    for i in 3..e0.dim() {
        e0[i] *= SQRT_2;
        de[i] *= SQRT_2;
        s[i] /= SQRT_2;
    }
}

/// Converts a column-major engineering operator into the Mandel basis
///
/// Rows and columns associated with shear components are scaled by √2.
fn operator_to_mandel(kt: &mut Matrix, dd: &[f64], n: usize) {
    for i in 0..n {
        for j in 0..n {
            let fi = if i < 3 { 1.0 } else { SQRT_2 };
            let fj = if j < 3 { 1.0 } else { SQRT_2 };
            kt.set(i, j, fi * fj * dd[i + j * n]);
        }
    }
}

/// Returns the rotation array passed to the library (column-major transpose of the frame)
fn drot_from_frame(frame: &Matrix) -> [f64; 9] {
    let mut drot = [0.0; 9];
    for i in 0..3 {
        for j in 0..3 {
            drot[i + 3 * j] = frame.get(j, i);
        }
    }
    drot
}

/// Reads an unsigned short exported by the library
fn read_u16(library: &Library, symbol: &str) -> Option<u16> {
    unsafe {
        let ptr = library.get::<*const u16>(symbol.as_bytes()).ok()?;
        if ptr.is_null() {
            None
        } else {
            Some(**ptr)
        }
    }
}

/// Reads a list of names exported as `{f}_n{Name}` and `{f}_{Name}`
///
/// A missing counter means an empty list.
fn read_names(library: &Library, function: &str, name: &str) -> Result<Vec<String>, StrError> {
    let n = match read_u16(library, &format!("{}_n{}", function, name)) {
        Some(n) => n as usize,
        None => return Ok(Vec::new()),
    };
    if n == 0 {
        return Ok(Vec::new());
    }
    let symbol = format!("{}_{}", function, name);
    let mut names = Vec::with_capacity(n);
    unsafe {
        let array = library
            .get::<*const *const c_char>(symbol.as_bytes())
            .map_err(|_| "cannot read the names of the behaviour variables")?;
        for i in 0..n {
            let ptr = *(*array).add(i);
            if ptr.is_null() {
                return Err("found a null name in the behaviour variables");
            }
            let text = CStr::from_ptr(ptr)
                .to_str()
                .map_err(|_| "found an invalid name in the behaviour variables")?;
            names.push(text.to_string());
        }
    }
    Ok(names)
}

/// Reads the types of the internal state variables
fn read_types(library: &Library, function: &str, n: usize) -> Result<Vec<VariableType>, StrError> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let symbol = format!("{}_InternalStateVariablesTypes", function);
    let mut types = Vec::with_capacity(n);
    unsafe {
        let array = library
            .get::<*const i32>(symbol.as_bytes())
            .map_err(|_| "cannot read the types of the internal state variables")?;
        for i in 0..n {
            types.push(VariableType::from_code(*(*array).add(i))?);
        }
    }
    Ok(types)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{drot_from_frame, operator_to_mandel, to_engineering, UmatBehaviour, SQRT_2};
    use crate::base::{Hypothesis, OutOfBoundsPolicy, StiffnessMatrixType};
    use crate::driver::CurrentState;
    use crate::material::{hooke_operator, Behaviour, BehaviourDescription, BehaviourHandle, BehaviourType, Rotation};
    use russell_lab::{approx_eq, mat_approx_eq, Matrix, Vector};
    use std::cell::Cell;

    thread_local! {
        /// Operator code received by the last call of a stub
        static LAST_CODE: Cell<f64> = Cell::new(f64::NAN);
    }

    /// Writes the isotropic elastic operator in the engineering convention (column-major)
    fn engineering_operator(dd: &mut [f64], n: usize, young: f64, poisson: f64) {
        let lambda = young * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
        let mu = young / (2.0 * (1.0 + poisson));
        for v in dd.iter_mut() {
            *v = 0.0;
        }
        for i in 0..3 {
            for j in 0..3 {
                dd[i + j * n] = if i == j { lambda + 2.0 * mu } else { lambda };
            }
        }
        for i in 3..n {
            dd[i + i * n] = mu;
        }
    }

    /// Isotropic linear elasticity with engineering shear strains (props: E, ν)
    extern "C" fn elastic_umat(
        ntens: *const i32,
        _dt: *const f64,
        _drot: *const f64,
        ddsdde: *mut f64,
        _stran: *const f64,
        dstran: *const f64,
        _temp: *const f64,
        _dtemp: *const f64,
        props: *const f64,
        _nprops: *const i32,
        _predef: *const f64,
        _dpred: *const f64,
        _statev: *mut f64,
        _nstatv: *const i32,
        stress: *mut f64,
        _ndi: *const i32,
        kinc: *mut i32,
    ) {
        unsafe {
            let n = *ntens as usize;
            let dd = std::slice::from_raw_parts_mut(ddsdde, n * n);
            let de = std::slice::from_raw_parts(dstran, n);
            let s = std::slice::from_raw_parts_mut(stress, n);
            let code = dd[0];
            LAST_CODE.with(|c| c.set(code));
            engineering_operator(dd, n, *props, *props.add(1));
            for i in 0..n {
                for j in 0..n {
                    s[i] += dd[i + j * n] * de[j];
                }
            }
            *kinc = 1;
        }
    }

    /// Orthotropic diagonal law: stiffness 10 along the first material axis and 1 otherwise
    extern "C" fn diagonal_umat(
        ntens: *const i32,
        _dt: *const f64,
        _drot: *const f64,
        ddsdde: *mut f64,
        _stran: *const f64,
        dstran: *const f64,
        _temp: *const f64,
        _dtemp: *const f64,
        _props: *const f64,
        _nprops: *const i32,
        _predef: *const f64,
        _dpred: *const f64,
        _statev: *mut f64,
        _nstatv: *const i32,
        stress: *mut f64,
        _ndi: *const i32,
        kinc: *mut i32,
    ) {
        unsafe {
            let n = *ntens as usize;
            let dd = std::slice::from_raw_parts_mut(ddsdde, n * n);
            let de = std::slice::from_raw_parts(dstran, n);
            let s = std::slice::from_raw_parts_mut(stress, n);
            for i in 0..n {
                let k = if i == 0 { 10.0 } else { 1.0 };
                dd[i + i * n] = k;
                s[i] += k * de[i];
            }
            *kinc = 1;
        }
    }

    /// Always reports a local failure
    extern "C" fn failing_umat(
        _ntens: *const i32,
        _dt: *const f64,
        _drot: *const f64,
        _ddsdde: *mut f64,
        _stran: *const f64,
        _dstran: *const f64,
        _temp: *const f64,
        _dtemp: *const f64,
        _props: *const f64,
        _nprops: *const i32,
        _predef: *const f64,
        _dpred: *const f64,
        _statev: *mut f64,
        _nstatv: *const i32,
        _stress: *mut f64,
        _ndi: *const i32,
        kinc: *mut i32,
    ) {
        unsafe {
            *kinc = 0;
        }
    }

    fn description(hypothesis: Hypothesis) -> BehaviourDescription {
        let mut d = BehaviourDescription::new(BehaviourType::SmallStrain, hypothesis);
        d.material_properties = vec!["YoungModulus".to_string(), "PoissonRatio".to_string()];
        d
    }

    fn new_state(d: &BehaviourDescription) -> CurrentState {
        let mut state = CurrentState::new(d, 0);
        state.mprops1[0] = 1000.0;
        state.mprops1[1] = 0.25;
        state.esv0[0] = 293.15;
        state
    }

    #[test]
    fn new_captures_errors() {
        let handle = BehaviourHandle::new("umat", "/nonexistent/libBehaviour.so", "norton", Hypothesis::Tridimensional);
        assert_eq!(
            UmatBehaviour::new(&handle, OutOfBoundsPolicy::None).err(),
            Some("cannot load the behaviour library")
        );
        let d = BehaviourDescription::new(BehaviourType::FiniteStrain, Hypothesis::Tridimensional);
        assert_eq!(
            UmatBehaviour::from_function(elastic_umat, d).err(),
            Some("only small strain behaviours are supported by the umat interface")
        );
        let model = UmatBehaviour::from_function(elastic_umat, description(Hypothesis::Tridimensional)).unwrap();
        assert_eq!(model.share().err(), Some("the behaviour library is not re-entrant"));
    }

    #[test]
    fn integrate_converts_the_shear_components() {
        let d = description(Hypothesis::PlaneStrain);
        let mut model = UmatBehaviour::from_function(elastic_umat, d.clone()).unwrap();
        let mut state = new_state(&d);
        let strain = [1e-3, -2e-4, 0.0, SQRT_2 * 5e-4]; // Mandel shear
        for i in 0..4 {
            state.u1[i] = strain[i];
        }
        let rotation = Rotation::identity();
        let mut kt = Matrix::new(4, 4);
        let ktype = StiffnessMatrixType::ConsistentTangentOperator;
        assert_eq!(model.integrate(&mut kt, &mut state, &rotation, 1.0, ktype), Ok(true));
        assert_eq!(LAST_CODE.with(|c| c.get()), 4.0);

        // the Mandel response must match Hooke's law in the Mandel basis
        let mut dd = Matrix::new(4, 4);
        hooke_operator(&mut dd, 1000.0, 0.25).unwrap();
        mat_approx_eq(&kt, &dd, 1e-12);
        for i in 0..4 {
            let mut sigma = 0.0;
            for j in 0..4 {
                sigma += dd.get(i, j) * strain[j];
            }
            approx_eq(state.s1[i], sigma, 1e-12);
        }
        // tensorial shear stress: σxy = 2 μ εxy
        approx_eq(state.s1[3] / SQRT_2, 2.0 * 400.0 * 5e-4, 1e-12);
    }

    #[test]
    fn prediction_sends_the_negated_code() {
        let d = description(Hypothesis::Tridimensional);
        let mut model = UmatBehaviour::from_function(elastic_umat, d.clone()).unwrap();
        let state = new_state(&d);
        let rotation = Rotation::identity();
        let mut kt = Matrix::new(6, 6);
        let ok = model
            .compute_prediction_operator(&mut kt, &state, &rotation, StiffnessMatrixType::Elastic)
            .unwrap();
        assert!(ok);
        assert_eq!(LAST_CODE.with(|c| c.get()), -1.0);
        let mut dd = Matrix::new(6, 6);
        hooke_operator(&mut dd, 1000.0, 0.25).unwrap();
        mat_approx_eq(&kt, &dd, 1e-12);
    }

    #[test]
    fn local_failures_are_reported() {
        let d = description(Hypothesis::Tridimensional);
        let mut model = UmatBehaviour::from_function(failing_umat, d.clone()).unwrap();
        let mut state = new_state(&d);
        let rotation = Rotation::identity();
        let mut kt = Matrix::new(6, 6);
        let ktype = StiffnessMatrixType::ConsistentTangentOperator;
        assert_eq!(model.integrate(&mut kt, &mut state, &rotation, 1.0, ktype), Ok(false));
        assert_eq!(
            model.compute_prediction_operator(&mut kt, &state, &rotation, ktype),
            Ok(false)
        );
    }

    #[test]
    fn material_properties_must_match() {
        let d = description(Hypothesis::Tridimensional);
        let mut model = UmatBehaviour::from_function(elastic_umat, d).unwrap();
        let other = BehaviourDescription::new(BehaviourType::SmallStrain, Hypothesis::Tridimensional);
        let mut state = CurrentState::new(&other, 0);
        let rotation = Rotation::identity();
        let mut kt = Matrix::new(6, 6);
        assert_eq!(
            model
                .integrate(&mut kt, &mut state, &rotation, 1.0, StiffnessMatrixType::Elastic)
                .err(),
            Some("the number of material properties does not match the behaviour")
        );
    }

    #[test]
    fn orthotropic_values_are_rotated() {
        // material axes rotated by 90° around z: the stiff material axis is the global y axis
        let d = description(Hypothesis::PlaneStrain);
        let mut model = UmatBehaviour::from_function(diagonal_umat, d.clone()).unwrap();
        let frame = Matrix::from(&[[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        let rotation = Rotation::new_stensor(&frame, 4).unwrap();
        let mut kt = Matrix::new(4, 4);
        let ktype = StiffnessMatrixType::TangentOperator;

        let mut state = new_state(&d);
        state.u1[0] = 1e-3;
        assert_eq!(model.integrate(&mut kt, &mut state, &rotation, 1.0, ktype), Ok(true));
        approx_eq(state.s1[0], 1e-3, 1e-15);
        approx_eq(state.s1[1], 0.0, 1e-15);
        approx_eq(kt.get(0, 0), 1.0, 1e-14);
        approx_eq(kt.get(1, 1), 10.0, 1e-14);

        let mut state = new_state(&d);
        state.u1[1] = 1e-3;
        assert_eq!(model.integrate(&mut kt, &mut state, &rotation, 1.0, ktype), Ok(true));
        approx_eq(state.s1[0], 0.0, 1e-15);
        approx_eq(state.s1[1], 1e-2, 1e-15);
    }

    #[test]
    fn to_engineering_works() {
        let mut e0 = Vector::from(&[1.0, 2.0, 3.0, SQRT_2]);
        let mut de = Vector::from(&[0.0, 0.0, 0.0, 2.0 * SQRT_2]);
        let mut s = Vector::from(&[10.0, 20.0, 30.0, 5.0 * SQRT_2]);
        to_engineering(&mut e0, &mut de, &mut s);
        assert_eq!(&e0.as_data()[0..3], &[1.0, 2.0, 3.0]);
        approx_eq(e0[3], 2.0, 1e-15);
        approx_eq(de[3], 4.0, 1e-15);
        approx_eq(s[3], 5.0, 1e-15);
    }

    #[test]
    fn operator_to_mandel_works() {
        // engineering isotropic operator with λ = 1, μ = 2 (column-major)
        let n = 4;
        let mut dd = vec![0.0; n * n];
        for i in 0..3 {
            for j in 0..3 {
                dd[i + j * n] = if i == j { 5.0 } else { 1.0 };
            }
        }
        dd[3 + 3 * n] = 2.0; // μ
        dd[1 + 0 * n] = 1.5; // unsymmetric entry to check the ordering
        let mut kt = Matrix::new(n, n);
        operator_to_mandel(&mut kt, &dd, n);
        approx_eq(kt.get(0, 0), 5.0, 1e-15);
        approx_eq(kt.get(1, 0), 1.5, 1e-15);
        approx_eq(kt.get(0, 1), 1.0, 1e-15);
        approx_eq(kt.get(3, 3), 4.0, 1e-14); // 2μ
    }

    #[test]
    fn drot_from_frame_works() {
        let frame = Matrix::from(&[[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        let drot = drot_from_frame(&frame);
        // column-major storage of the transpose = row-major storage of the frame
        assert_eq!(drot, [0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }
}

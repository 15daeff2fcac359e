use super::*;

/*
Fresnel cosine and sine integrals and the generalized integrals used to place
points along a clothoid.

Adapted from:
Atlas for computing mathematical functions : an illustrated guide for
practitioners, with programs in C and Mathematica / William J. Thompson.
New York : Wiley, c1997.
by way of ebertolazzi/Clothoids.git Fresnel.cc
*/
#[allow(clippy::excessive_precision)]
const FRN: &[Float] = &[
    0.49999988085884732562,
    1.3511177791210715095,
    1.3175407836168659241,
    1.1861149300293854992,
    0.7709627298888346769,
    0.4173874338787963957,
    0.19044202705272903923,
    0.06655998896627697537,
    0.022789258616785717418,
    0.0040116689358507943804,
    0.0012192036851249883877,
];

#[allow(clippy::excessive_precision)]
const FRD: &[Float] = &[
    1.0,
    2.7022305772400260215,
    4.2059268151438492767,
    4.5221882840107715516,
    3.7240352281630359588,
    2.4589286254678152943,
    1.3125491629443702962,
    0.5997685720120932908,
    0.20907680750378849485,
    0.07159621634657901433,
    0.012602969513793714191,
    0.0038302423512931250065,
];

#[allow(clippy::excessive_precision)]
const GN: &[Float] = &[
    0.50000014392706344801,
    0.032346434925349128728,
    0.17619325157863254363,
    0.038606273170706486252,
    0.023693692309257725361,
    0.007092018516845033662,
    0.0012492123212412087428,
    0.00044023040894778468486,
    -8.80266827476172521e-6,
    -1.4033554916580018648e-8,
    2.3509221782155474353e-10,
];

#[allow(clippy::excessive_precision)]
const GD: &[Float] = &[
    1.0,
    2.0646987497019598937,
    2.9109311766948031235,
    2.6561936751333032911,
    2.0195563983177268073,
    1.1167891129189363902,
    0.57267874755973172715,
    0.19408481169593070798,
    0.07634808341431248904,
    0.011573247407207865977,
    0.0044099273693067311209,
    -0.00009070958410429993314,
];

/// Number of moments (powers of tau) the generalized integrals are computed for
pub const MOMENTS: usize = 3;

/// terms of the series in `a` used when `|a|` is below `A_SMALL_THRESHOLD`
const A_SERIES_SIZE: usize = 3;
const A_SMALL_THRESHOLD: Float = 0.01;
const A_ZERO_SIZE: usize = MOMENTS + 4 * A_SERIES_SIZE + 2;

/// Compute Fresnel integrals C(x) and S(x)
///
/// ```text
///   C(x) = ∫₀ˣ cos(π/2 t²) dt
///   S(x) = ∫₀ˣ sin(π/2 t²) dt
/// ```
///
/// | x   | C(x)       | S(x)       |
/// | :-: | :--------: | :--------: |
/// | 0.0 | 0.00000000 | 0.00000000 |
/// | 0.5 | 0.49234423 | 0.06473243 |
/// | 1.0 | 0.77989340 | 0.43825915 |
/// | 1.5 | 0.44526118 | 0.69750496 |
/// | 2.0 | 0.48825341 | 0.34341568 |
/// | 2.5 | 0.45741301 | 0.61918176 |
///
/// Power series below 1, rational approximation below 6, asymptotic expansion above.
/// Both integrals are odd and approach ±0.5 as x goes to ±infinity.
pub fn fresnel_cs(y: Float) -> (Float, Float) {
    if y.is_nan() {
        return (y, y);
    }
    let eps = 1E-15;
    let x = y.abs();

    let mut c_value: Float;
    let mut s_value: Float;

    if x < 1.0 {
        let s = FRAC_PI_2 * (x * x);
        let t = -s * s;

        // Cosine integral series
        {
            let mut twofn = 0.0;
            let mut fact = 1.0;
            let mut denterm = 1.0;
            let mut numterm = 1.0;
            let mut sum: Float = 1.0;
            loop {
                twofn += 2.0;
                fact *= twofn * (twofn - 1.0);
                denterm += 4.0;
                numterm *= t;
                let term = numterm / (fact * denterm);
                sum += term;
                if term.abs() <= eps * sum.abs() {
                    break;
                }
            }

            c_value = x * sum;
        }

        // Sine integral series
        {
            let mut twofn = 1.0;
            let mut fact = 1.0;
            let mut denterm = 3.0;
            let mut numterm = 1.0;
            let mut sum: Float = numterm / denterm;
            loop {
                twofn += 2.0;
                fact *= twofn * (twofn - 1.0);
                denterm += 4.0;
                numterm *= t;
                let term = numterm / (fact * denterm);
                sum += term;
                if term.abs() <= (eps * sum.abs()) {
                    break;
                }
            }

            s_value = FRAC_PI_2 * sum * (x * x * x);
        }
    } else if x < 6.0 {
        // Rational approximation for f
        let f: Float;
        {
            let mut sumn = 0.0;
            let mut sumd = FRD[11];
            for k in (0..=10).rev() {
                sumn = FRN[k] + x * sumn;
                sumd = FRD[k] + x * sumd;
            }
            f = sumn / sumd;
        }

        // Rational approximation for g
        let g: Float;
        {
            let mut sumn = 0.0;
            let mut sumd = GD[11];
            for k in (0..=10).rev() {
                sumn = GN[k] + x * sumn;
                sumd = GD[k] + x * sumd;
            }
            g = sumn / sumd;
        }

        let u_value = FRAC_PI_2 * (x * x);
        let sin_u = sin(u_value);
        let cos_u = cos(u_value);
        c_value = 0.5 + f * sin_u - g * cos_u;
        s_value = 0.5 - f * cos_u - g * sin_u;
    } else {
        // x >= 6; asymptotic expansions for f and g
        let s = PI * x * x;
        let t = -1.0 / (s * s);

        // Expansion for f
        let mut numterm = -1.0;
        let mut term = 1.0;
        let mut sum = 1.0;
        let eps10 = 0.1 * eps;

        loop {
            numterm += 4.0;
            term *= numterm * (numterm - 2.0) * t;
            sum += term;
            if term.abs() <= eps10 * sum.abs() {
                break;
            }
        }

        let f = sum / (PI * x);

        // Expansion for g
        numterm = -1.0;
        term = 1.0;
        sum = 1.0;

        loop {
            numterm += 4.0;
            term *= numterm * (numterm + 2.0) * t;
            sum += term;
            if term.abs() <= eps10 * sum.abs() {
                break;
            }
        }

        let g0 = PI * x;
        let g = sum / (g0 * g0 * x);

        let u_value = FRAC_PI_2 * (x * x);
        if u_value.is_finite() {
            let sin_u = sin(u_value);
            let cos_u = cos(u_value);
            c_value = 0.5 + f * sin_u - g * cos_u;
            s_value = 0.5 - f * cos_u - g * sin_u;
        } else {
            // f and g have vanished long before the phase overflows
            c_value = 0.5;
            s_value = 0.5;
        }
    }
    if y < 0.0 {
        c_value = -c_value;
        s_value = -s_value;
    }

    (c_value, s_value)
}

/// Fresnel integrals together with their first and second moments
///
/// ```text
///   C[k](x) = ∫₀ˣ tᵏ cos(π/2 t²) dt
///   S[k](x) = ∫₀ˣ tᵏ sin(π/2 t²) dt
/// ```
pub fn fresnel_cs_moments(t: Float) -> ([Float; MOMENTS], [Float; MOMENTS]) {
    let (c0, s0) = fresnel_cs(t);
    let tt = FRAC_PI_2 * (t * t);
    let sin_tt = sin(tt);
    let cos_tt = cos(tt);
    let c1 = sin_tt / PI;
    let s1 = (1.0 - cos_tt) / PI;
    let c2 = (t * sin_tt - s0) / PI;
    let s2 = (c0 - t * cos_tt) / PI;
    ([c0, c1, c2], [s0, s1, s2])
}

fn lommel_reduced(mu: Float, nu: Float, b: Float) -> Float {
    let mut tmp = 1.0 / ((mu + nu + 1.0) * (mu - nu + 1.0));
    let mut res = tmp;
    for n in 1..=100 {
        let nf = n as Float;
        tmp *= (-b / (2.0 * nf + mu - nu + 1.0)) * (b / (2.0 * nf + mu + nu + 1.0));
        res += tmp;
        if tmp.abs() <= res.abs() * Float::EPSILON {
            break;
        }
    }
    res
}

/// moments ∫₀¹ τᵏ cos(b τ) dτ and ∫₀¹ τᵏ sin(b τ) dτ for k in 0..nk
fn eval_xy_a_zero(nk: usize, b: Float) -> ([Float; A_ZERO_SIZE], [Float; A_ZERO_SIZE]) {
    let mut x: [Float; A_ZERO_SIZE] = [0.0; A_ZERO_SIZE];
    let mut y: [Float; A_ZERO_SIZE] = [0.0; A_ZERO_SIZE];
    let nk = nk.min(A_ZERO_SIZE);

    // the cosine moments are even in b and the sine moments odd,
    // so work with |b| where the recurrence below is stable
    let sign = if b < 0.0 { -1.0 } else { 1.0 };
    let b = b.abs();

    let sb = sin(b);
    let cb = cos(b);
    let b2 = b * b;
    if b < 1e-3 {
        x[0] = 1.0 - (b2 / 6.0) * (1.0 - (b2 / 20.0) * (1.0 - (b2 / 42.0)));
        y[0] = (b / 2.0) * (1.0 - (b2 / 12.0) * (1.0 - (b2 / 30.0)));
    } else {
        x[0] = sb / b;
        y[0] = (1.0 - cb) / b;
    }
    // use recurrence in the stable part
    let m = (floor(2.0 * b) as usize).clamp(1, nk.max(2) - 1);
    for k in 1..m {
        let kf = k as Float;
        x[k] = (sb - kf * y[k - 1]) / b;
        y[k] = (kf * x[k - 1] - cb) / b;
    }
    // use Lommel for the unstable part
    if m < nk {
        let big_a = b * sb;
        let big_d = sb - b * cb;
        let big_b = b * big_d;
        let big_c = -b2 * sb;
        let m_offset = m as Float + 0.5;
        let mut r_la = lommel_reduced(m_offset, 1.5, b);
        let mut r_ld = lommel_reduced(m_offset, 0.5, b);
        for k in m..nk {
            let kf = k as Float;
            let k_offset = kf + 1.5;
            let r_lb = lommel_reduced(k_offset, 0.5, b);
            let r_lc = lommel_reduced(k_offset, 1.5, b);
            x[k] = (kf * big_a * r_la + big_b * r_lb + cb) / (1.0 + kf);
            y[k] = (big_c * r_lc + sb) / (2.0 + kf) + big_d * r_ld;
            r_la = r_lc;
            r_ld = r_lb;
        }
    }

    for yk in y.iter_mut().take(nk) {
        *yk *= sign;
    }

    (x, y)
}

fn eval_xy_a_small(nk: usize, a: Float, b: Float) -> ([Float; MOMENTS], [Float; MOMENTS]) {
    let (x0, y0) = eval_xy_a_zero(nk + 4 * A_SERIES_SIZE + 2, b);

    let mut x = [0.0; MOMENTS];
    let mut y = [0.0; MOMENTS];
    for j in 0..nk {
        x[j] = x0[j] - (a / 2.0) * y0[j + 2];
        y[j] = y0[j] + (a / 2.0) * x0[j + 2];
    }

    let mut t = 1.0;
    let aa = -a * a / 4.0;
    for n in 1..=A_SERIES_SIZE {
        t *= aa / ((2 * n * (2 * n - 1)) as Float);
        let bf = a / ((4 * n + 2) as Float);
        for j in 0..nk {
            let jj = 4 * n + j;
            x[j] += t * (x0[jj] - bf * y0[jj + 2]);
            y[j] += t * (y0[jj] + bf * x0[jj + 2]);
        }
    }
    (x, y)
}

fn eval_xy_a_large(nk: usize, a: Float, b: Float) -> ([Float; MOMENTS], [Float; MOMENTS]) {
    let mut x = [0.0; MOMENTS];
    let mut y = [0.0; MOMENTS];

    let s = a.signum();
    let absa = a.abs();
    let m_1_sqrt_pi = FRAC_2_SQRT_PI * 0.5;
    let z = m_1_sqrt_pi * sqrt(absa);
    let ell = s * b * m_1_sqrt_pi / sqrt(absa);
    let g = -0.5 * s * (b * b) / absa;
    let mut cg = cos(g) / z;
    let mut sg = sin(g) / z;

    let ((cl, sl), (cz, sz)) = if nk > 1 {
        (fresnel_cs_moments(ell), fresnel_cs_moments(ell + z))
    } else {
        let (cl, sl) = fresnel_cs(ell);
        let (cz, sz) = fresnel_cs(ell + z);
        (([cl, 0.0, 0.0], [sl, 0.0, 0.0]), ([cz, 0.0, 0.0], [sz, 0.0, 0.0]))
    };

    let d_c0 = cz[0] - cl[0];
    let d_s0 = sz[0] - sl[0];

    x[0] = cg * d_c0 - s * sg * d_s0;
    y[0] = sg * d_c0 + s * cg * d_s0;

    if nk > 1 {
        cg /= z;
        sg /= z;
        let d_c1 = cz[1] - cl[1];
        let d_s1 = sz[1] - sl[1];
        let dc = d_c1 - ell * d_c0;
        let ds = d_s1 - ell * d_s0;
        x[1] = cg * dc - s * sg * ds;
        y[1] = sg * dc + s * cg * ds;
        if nk > 2 {
            let d_c2 = cz[2] - cl[2];
            let d_s2 = sz[2] - sl[2];
            let dc = d_c2 + ell * (ell * d_c0 - 2.0 * d_c1);
            let ds = d_s2 + ell * (ell * d_s0 - 2.0 * d_s1);
            cg /= z;
            sg /= z;
            x[2] = cg * dc - s * sg * ds;
            y[2] = sg * dc + s * cg * ds;
        }
    }

    (x, y)
}

fn generalized_fresnel(nk: usize, a: Float, b: Float, c: Float) -> ([Float; MOMENTS], [Float; MOMENTS]) {
    let (xx, yy) = if a.abs() < A_SMALL_THRESHOLD {
        eval_xy_a_small(nk, a, b)
    } else {
        eval_xy_a_large(nk, a, b)
    };

    let cosc = cos(c);
    let sinc = sin(c);

    let mut int_c = [0.0; MOMENTS];
    let mut int_s = [0.0; MOMENTS];
    for k in 0..nk {
        int_c[k] = xx[k] * cosc - yy[k] * sinc;
        int_s[k] = xx[k] * sinc + yy[k] * cosc;
    }
    (int_c, int_s)
}

/// Generalized Fresnel integrals
///
/// ```text
///   X(a, b, c) = ∫₀¹ cos(a/2 τ² + b τ + c) dτ
///   Y(a, b, c) = ∫₀¹ sin(a/2 τ² + b τ + c) dτ
/// ```
///
/// A clothoid with start heading c, curvature b / s and curvature rate a / s²
/// reaches `s * (X, Y)` after arc length s.
pub fn generalized_fresnel_cs(a: Float, b: Float, c: Float) -> (Float, Float) {
    let (int_c, int_s) = generalized_fresnel(1, a, b, c);
    (int_c[0], int_s[0])
}

/// Generalized Fresnel integrals weighted by τᵏ for k in 0..MOMENTS
pub fn generalized_fresnel_moments(a: Float, b: Float, c: Float) -> ([Float; MOMENTS], [Float; MOMENTS]) {
    generalized_fresnel(MOMENTS, a, b, c)
}

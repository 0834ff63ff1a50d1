use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Removes Fourier components with `|Q|` outside `[qmin, qmax)` from a signal
/// sampled at spacing `dr`.
///
/// The signal is zero-padded to a power of two at least twice its length
/// before transforming. Nothing is done when `qmin <= 0` and `qmax` is
/// infinite.
pub fn band_pass_filter(values: &mut [f64], dr: f64, qmin: f64, qmax: f64) {
    if values.is_empty() || (qmin <= 0.0 && qmax.is_infinite()) {
        return;
    }
    let n = values.len();
    let padlen = (2 * n).next_power_of_two();

    let mut buffer: Vec<Complex<f64>> = values
        .iter()
        .map(|&v| Complex::new(v, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(padlen)
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(padlen).process(&mut buffer);

    let dq = 2.0 * std::f64::consts::PI / (padlen as f64 * dr);
    for (k, coefficient) in buffer.iter_mut().enumerate() {
        let q = k.min(padlen - k) as f64 * dq;
        if q < qmin || q >= qmax {
            *coefficient = Complex::new(0.0, 0.0);
        }
    }

    planner.plan_fft_inverse(padlen).process(&mut buffer);

    let norm = 1.0 / padlen as f64;
    for (value, filtered) in values.iter_mut().zip(&buffer) {
        *value = filtered.re * norm;
    }
}

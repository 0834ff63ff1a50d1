pub mod fourier;
pub mod numeric;

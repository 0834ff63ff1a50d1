use phf::{Map, phf_map};

/// Atomic number by element symbol. Deuterium is listed as `D`.
#[rustfmt::skip]
pub static ATOMIC_NUMBERS: Map<&'static str, u32> = phf_map! {
    "H" => 1, "He" => 2, "Li" => 3, "Be" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8,
    "F" => 9, "Ne" => 10, "Na" => 11, "Mg" => 12, "Al" => 13, "Si" => 14, "P" => 15, "S" => 16,
    "Cl" => 17, "Ar" => 18, "K" => 19, "Ca" => 20, "Sc" => 21, "Ti" => 22, "V" => 23, "Cr" => 24,
    "Mn" => 25, "Fe" => 26, "Co" => 27, "Ni" => 28, "Cu" => 29, "Zn" => 30, "Ga" => 31, "Ge" => 32,
    "As" => 33, "Se" => 34, "Br" => 35, "Kr" => 36, "Rb" => 37, "Sr" => 38, "Y" => 39, "Zr" => 40,
    "Nb" => 41, "Mo" => 42, "Tc" => 43, "Ru" => 44, "Rh" => 45, "Pd" => 46, "Ag" => 47, "Cd" => 48,
    "In" => 49, "Sn" => 50, "Sb" => 51, "Te" => 52, "I" => 53, "Xe" => 54, "Cs" => 55, "Ba" => 56,
    "La" => 57, "Ce" => 58, "Pr" => 59, "Nd" => 60, "Pm" => 61, "Sm" => 62, "Eu" => 63, "Gd" => 64,
    "Tb" => 65, "Dy" => 66, "Ho" => 67, "Er" => 68, "Tm" => 69, "Yb" => 70, "Lu" => 71, "Hf" => 72,
    "Ta" => 73, "W" => 74, "Re" => 75, "Os" => 76, "Ir" => 77, "Pt" => 78, "Au" => 79, "Hg" => 80,
    "Tl" => 81, "Pb" => 82, "Bi" => 83, "Po" => 84, "At" => 85, "Rn" => 86, "Fr" => 87, "Ra" => 88,
    "Ac" => 89, "Th" => 90, "Pa" => 91, "U" => 92, "Np" => 93, "Pu" => 94, "Am" => 95, "Cm" => 96,
    "Bk" => 97, "Cf" => 98,
    "D" => 1,
};

/// Bound coherent neutron scattering length in fm, natural isotope abundance.
#[rustfmt::skip]
pub static NEUTRON_SCATTERING_LENGTHS: Map<&'static str, f64> = phf_map! {
    "H" => -3.7390, "D" => 6.671, "He" => 3.26, "Li" => -1.90, "Be" => 7.79, "B" => 5.30,
    "C" => 6.6460, "N" => 9.36, "O" => 5.803, "F" => 5.654, "Ne" => 4.566, "Na" => 3.63,
    "Mg" => 5.375, "Al" => 3.449, "Si" => 4.1491, "P" => 5.13, "S" => 2.847, "Cl" => 9.5770,
    "Ar" => 1.909, "K" => 3.67, "Ca" => 4.70, "Sc" => 12.29, "Ti" => -3.438, "V" => -0.3824,
    "Cr" => 3.635, "Mn" => -3.73, "Fe" => 9.45, "Co" => 2.49, "Ni" => 10.3, "Cu" => 7.718,
    "Zn" => 5.680, "Ga" => 7.288, "Ge" => 8.185, "As" => 6.58, "Se" => 7.970, "Br" => 6.795,
    "Kr" => 7.81, "Rb" => 7.09, "Sr" => 7.02, "Y" => 7.75, "Zr" => 7.16, "Nb" => 7.054,
    "Mo" => 6.715, "Tc" => 6.8, "Ru" => 7.03, "Rh" => 5.88, "Pd" => 5.91, "Ag" => 5.922,
    "Cd" => 4.87, "In" => 4.065, "Sn" => 6.225, "Sb" => 5.57, "Te" => 5.80, "I" => 5.28,
    "Xe" => 4.92, "Cs" => 5.42, "Ba" => 5.07, "La" => 8.24, "Ce" => 4.84, "Pr" => 4.58,
    "Nd" => 7.69, "Sm" => 0.80, "Eu" => 7.22, "Gd" => 6.5, "Tb" => 7.38, "Dy" => 16.9,
    "Ho" => 8.01, "Er" => 7.79, "Tm" => 7.07, "Yb" => 12.43, "Lu" => 7.21, "Hf" => 7.7,
    "Ta" => 6.91, "W" => 4.86, "Re" => 9.2, "Os" => 10.7, "Ir" => 10.6, "Pt" => 9.60,
    "Au" => 7.63, "Hg" => 12.692, "Tl" => 8.776, "Pb" => 9.405, "Bi" => 8.532, "Th" => 10.31,
    "U" => 8.417,
};

#[derive(Debug, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub number: u8,
    /// standard atomic weight
    pub mass: f64,
    /// allowed valences for implicit hydrogen assignment, in increasing order.
    /// empty outside the SMILES organic subset
    pub valences: &'static [u8],
}

impl Element {
    pub fn is_heavy(&self) -> bool {
        self.number > 1
    }

    pub fn is_halogen(&self) -> bool {
        matches!(self.number, 9 | 17 | 35 | 53 | 85)
    }
}

macro_rules! elements {
    ($($sym:literal $num:literal $mass:literal $val:expr;)*) => {
        &[$(Element {
            symbol: $sym,
            number: $num,
            mass: $mass,
            valences: $val,
        },)*]
    };
}

pub static WILDCARD: Element = Element {
    symbol: "*",
    number: 0,
    mass: 0.0,
    valences: &[],
};

pub const HYDROGEN_MASS: f64 = 1.008;

static ELEMENTS: &[Element] = elements! {
    "H" 1 1.008 &[1];
    "He" 2 4.0026 &[];
    "Li" 3 6.94 &[];
    "Be" 4 9.0122 &[];
    "B" 5 10.81 &[3];
    "C" 6 12.011 &[4];
    "N" 7 14.007 &[3, 5];
    "O" 8 15.999 &[2];
    "F" 9 18.998 &[1];
    "Ne" 10 20.180 &[];
    "Na" 11 22.990 &[];
    "Mg" 12 24.305 &[];
    "Al" 13 26.982 &[];
    "Si" 14 28.085 &[];
    "P" 15 30.974 &[3, 5];
    "S" 16 32.06 &[2, 4, 6];
    "Cl" 17 35.45 &[1];
    "Ar" 18 39.948 &[];
    "K" 19 39.098 &[];
    "Ca" 20 40.078 &[];
    "Ti" 22 47.867 &[];
    "Cr" 24 51.996 &[];
    "Mn" 25 54.938 &[];
    "Fe" 26 55.845 &[];
    "Co" 27 58.933 &[];
    "Ni" 28 58.693 &[];
    "Cu" 29 63.546 &[];
    "Zn" 30 65.38 &[];
    "Ga" 31 69.723 &[];
    "Ge" 32 72.630 &[];
    "As" 33 74.922 &[];
    "Se" 34 78.971 &[];
    "Br" 35 79.904 &[1];
    "Kr" 36 83.798 &[];
    "Rb" 37 85.468 &[];
    "Sr" 38 87.62 &[];
    "Pd" 46 106.42 &[];
    "Ag" 47 107.87 &[];
    "Cd" 48 112.41 &[];
    "Sn" 50 118.71 &[];
    "Sb" 51 121.76 &[];
    "Te" 52 127.60 &[];
    "I" 53 126.90 &[1];
    "Xe" 54 131.29 &[];
    "Cs" 55 132.91 &[];
    "Ba" 56 137.33 &[];
    "Pt" 78 195.08 &[];
    "Au" 79 196.97 &[];
    "Hg" 80 200.59 &[];
    "Pb" 82 207.2 &[];
    "Bi" 83 208.98 &[];
    "At" 85 210.0 &[];
};

pub fn by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

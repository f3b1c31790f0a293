//! A small SMILES reader producing a [Molecule] graph, enough to feed the
//! built-in descriptors. Stereochemistry is accepted and discarded.

use std::collections::HashMap;

use thiserror::Error;

use super::element::{by_symbol, Element, WILDCARD};

#[derive(Debug, Error, PartialEq)]
pub enum SmilesError {
    #[error("empty SMILES")]
    Empty,

    #[error("unexpected character {ch:?} at position {pos} in {smiles:?}")]
    UnexpectedChar {
        ch: char,
        pos: usize,
        smiles: String,
    },

    #[error("unclosed bracket atom starting at position {pos} in {smiles:?}")]
    UnclosedBracket { pos: usize, smiles: String },

    #[error("unknown element {symbol:?} in {smiles:?}")]
    UnknownElement { symbol: String, smiles: String },

    #[error("unmatched parenthesis in {0:?}")]
    UnmatchedParen(String),

    #[error("unclosed ring bond {ring} in {smiles:?}")]
    UnclosedRing { ring: u16, smiles: String },

    #[error("bond at position {pos} is not between two atoms in {smiles:?}")]
    DanglingBond { pos: usize, smiles: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
}

impl BondOrder {
    /// contribution to the valence of each endpoint. aromatic bonds count as
    /// single bonds, and the missing half is added per aromatic atom
    fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

#[derive(Debug)]
pub struct Atom {
    pub element: &'static Element,
    pub aromatic: bool,
    pub charge: i8,
    /// total attached hydrogens that are not themselves atoms in the graph.
    /// explicit for bracket atoms, implicit otherwise
    pub hydrogens: u8,
    pub bracket: bool,
}

#[derive(Debug)]
pub struct Bond {
    pub atoms: (usize, usize),
    pub order: BondOrder,
}

#[derive(Debug, Default)]
pub struct Molecule {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    /// (neighbor, bond index) for each atom
    pub adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn neighbors(&self, atom: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[atom].iter().map(|&(n, _)| n)
    }

    fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.atoms.len() - 1
    }

    fn add_bond(&mut self, a: usize, b: usize, order: BondOrder) {
        let idx = self.bonds.len();
        self.bonds.push(Bond { atoms: (a, b), order });
        self.adjacency[a].push((b, idx));
        self.adjacency[b].push((a, idx));
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    /// fill in implicit hydrogens on organic-subset atoms using the lowest
    /// default valence that fits the explicit bonds
    fn assign_implicit_hydrogens(&mut self) {
        for i in 0..self.atoms.len() {
            let atom = &self.atoms[i];
            if atom.bracket || atom.element.valences.is_empty() {
                continue;
            }
            let mut used: u8 = self.adjacency[i]
                .iter()
                .map(|&(_, b)| self.bonds[b].order.valence())
                .sum();
            let allowed = if atom.aromatic {
                used += 1;
                &atom.element.valences[..1]
            } else {
                atom.element.valences
            };
            let h = allowed
                .iter()
                .find(|&&v| v >= used)
                .map(|v| v - used)
                .unwrap_or(0);
            self.atoms[i].hydrogens = h;
        }
    }
}

struct Parser<'a> {
    smiles: &'a str,
    bytes: &'a [u8],
    pos: usize,
    mol: Molecule,
}

impl<'a> Parser<'a> {
    fn new(smiles: &'a str) -> Self {
        Self {
            smiles,
            bytes: smiles.as_bytes(),
            pos: 0,
            mol: Molecule::default(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn unexpected(&self, pos: usize) -> SmilesError {
        // positions always land on char boundaries since every byte we
        // consume is ASCII
        let ch = self.smiles[pos..].chars().next().unwrap_or('\0');
        SmilesError::UnexpectedChar {
            ch,
            pos,
            smiles: self.smiles.to_owned(),
        }
    }

    fn dangling(&self, pos: usize) -> SmilesError {
        SmilesError::DanglingBond {
            pos,
            smiles: self.smiles.to_owned(),
        }
    }

    fn element(&self, symbol: &str) -> Result<&'static Element, SmilesError> {
        by_symbol(symbol).ok_or_else(|| SmilesError::UnknownElement {
            symbol: symbol.to_owned(),
            smiles: self.smiles.to_owned(),
        })
    }

    /// digits at the cursor, `None` when there are none. values that don't
    /// fit in `T` are rejected at the first digit
    fn number<T: TryFrom<u32>>(&mut self) -> Result<Option<T>, SmilesError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(None);
        }
        self.smiles[start..self.pos]
            .parse::<u32>()
            .ok()
            .and_then(|n| T::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| self.unexpected(start))
    }

    fn parse(mut self) -> Result<Molecule, SmilesError> {
        let mut prev: Option<usize> = None;
        let mut branches: Vec<Option<usize>> = Vec::new();
        let mut pending: Option<(BondOrder, usize)> = None;
        let mut rings: HashMap<u16, (usize, Option<BondOrder>)> =
            HashMap::new();

        while let Some(c) = self.peek() {
            let start = self.pos;
            let atom = match c {
                b'(' => {
                    if prev.is_none() {
                        return Err(self.unexpected(start));
                    }
                    branches.push(prev);
                    self.pos += 1;
                    continue;
                }
                b')' => {
                    if pending.is_some() {
                        return Err(self.dangling(start));
                    }
                    let Some(p) = branches.pop() else {
                        return Err(SmilesError::UnmatchedParen(
                            self.smiles.to_owned(),
                        ));
                    };
                    prev = p;
                    self.pos += 1;
                    continue;
                }
                b'.' => {
                    if pending.is_some() {
                        return Err(self.dangling(start));
                    }
                    prev = None;
                    self.pos += 1;
                    continue;
                }
                b'-' | b'=' | b'#' | b'$' | b':' | b'/' | b'\\' => {
                    if prev.is_none() || pending.is_some() {
                        return Err(self.dangling(start));
                    }
                    let order = match c {
                        b'=' => BondOrder::Double,
                        b'#' => BondOrder::Triple,
                        b'$' => BondOrder::Quadruple,
                        b':' => BondOrder::Aromatic,
                        _ => BondOrder::Single,
                    };
                    pending = Some((order, start));
                    self.pos += 1;
                    continue;
                }
                b'0'..=b'9' | b'%' => {
                    let Some(cur) = prev else {
                        return Err(self.unexpected(start));
                    };
                    let ring = self.ring_number()?;
                    let order = pending.take().map(|(o, _)| o);
                    match rings.remove(&ring) {
                        Some((other, opened)) => {
                            let order = order
                                .or(opened)
                                .unwrap_or(self.mol.default_order(other, cur));
                            self.mol.add_bond(other, cur, order);
                        }
                        None => {
                            rings.insert(ring, (cur, order));
                        }
                    }
                    continue;
                }
                b'[' => self.bracket_atom()?,
                b'*' => {
                    self.pos += 1;
                    Atom {
                        element: &WILDCARD,
                        aromatic: false,
                        charge: 0,
                        hydrogens: 0,
                        bracket: false,
                    }
                }
                _ => self.organic_atom()?,
            };

            let idx = self.mol.add_atom(atom);
            if let Some(p) = prev {
                let order = pending
                    .take()
                    .map(|(o, _)| o)
                    .unwrap_or(self.mol.default_order(p, idx));
                self.mol.add_bond(p, idx, order);
            }
            prev = Some(idx);
        }

        if let Some((_, pos)) = pending {
            return Err(self.dangling(pos));
        }
        if !branches.is_empty() {
            return Err(SmilesError::UnmatchedParen(self.smiles.to_owned()));
        }
        if let Some(&ring) = rings.keys().min() {
            return Err(SmilesError::UnclosedRing {
                ring,
                smiles: self.smiles.to_owned(),
            });
        }
        if self.mol.atoms.is_empty() {
            return Err(SmilesError::Empty);
        }

        self.mol.assign_implicit_hydrogens();
        Ok(self.mol)
    }

    fn ring_number(&mut self) -> Result<u16, SmilesError> {
        let start = self.pos;
        if self.peek() == Some(b'%') {
            self.pos += 1;
            let digits = self.bytes.get(self.pos..self.pos + 2);
            match digits {
                Some(d) if d.iter().all(u8::is_ascii_digit) => {
                    self.pos += 2;
                    Ok(u16::from(d[0] - b'0') * 10 + u16::from(d[1] - b'0'))
                }
                _ => Err(self.unexpected(start)),
            }
        } else {
            self.pos += 1;
            Ok(u16::from(self.bytes[start] - b'0'))
        }
    }

    fn organic_atom(&mut self) -> Result<Atom, SmilesError> {
        let start = self.pos;
        let c = self.bytes[start];
        let next = self.bytes.get(start + 1).copied();
        let (symbol, len, aromatic) = match (c, next) {
            (b'B', Some(b'r')) => ("Br", 2, false),
            (b'C', Some(b'l')) => ("Cl", 2, false),
            (b'B', _) => ("B", 1, false),
            (b'C', _) => ("C", 1, false),
            (b'N', _) => ("N", 1, false),
            (b'O', _) => ("O", 1, false),
            (b'P', _) => ("P", 1, false),
            (b'S', _) => ("S", 1, false),
            (b'F', _) => ("F", 1, false),
            (b'I', _) => ("I", 1, false),
            (b'b', _) => ("B", 1, true),
            (b'c', _) => ("C", 1, true),
            (b'n', _) => ("N", 1, true),
            (b'o', _) => ("O", 1, true),
            (b'p', _) => ("P", 1, true),
            (b's', _) => ("S", 1, true),
            _ => return Err(self.unexpected(start)),
        };
        self.pos += len;
        Ok(Atom {
            element: self.element(symbol)?,
            aromatic,
            charge: 0,
            hydrogens: 0,
            bracket: false,
        })
    }

    /// [isotope? symbol chiral? hcount? charge? class?]
    fn bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        let open = self.pos;
        let Some(close) = self.smiles[open..].find(']').map(|i| open + i)
        else {
            return Err(SmilesError::UnclosedBracket {
                pos: open,
                smiles: self.smiles.to_owned(),
            });
        };
        self.pos += 1;

        // isotope only affects exact mass, which we don't report
        self.number::<u16>()?;

        let (element, aromatic) = self.bracket_symbol()?;

        while self.peek() == Some(b'@') {
            self.pos += 1;
        }
        // extended chirality classes like @TH1 or @SP2
        if self.pos > open + 1
            && self.bytes[self.pos - 1] == b'@'
            && self.peek().is_some_and(|c| c.is_ascii_uppercase())
            && self.peek() != Some(b'H')
        {
            for _ in 0..2 {
                if !self.peek().is_some_and(|c| c.is_ascii_uppercase()) {
                    return Err(self.unexpected(self.pos));
                }
                self.pos += 1;
            }
            self.number::<u16>()?;
        }

        let mut hydrogens = 0;
        if self.peek() == Some(b'H') {
            self.pos += 1;
            hydrogens = self.number::<u8>()?.unwrap_or(1);
        }

        let mut charge: i8 = 0;
        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            let unit: i8 = if sign == b'+' { 1 } else { -1 };
            let start = self.pos;
            self.pos += 1;
            match self.number::<i8>()? {
                Some(n) => charge = unit * n,
                None => {
                    charge = unit;
                    while self.peek() == Some(sign) {
                        charge = charge
                            .checked_add(unit)
                            .ok_or_else(|| self.unexpected(start))?;
                        self.pos += 1;
                    }
                }
            }
        }

        if self.peek() == Some(b':') {
            self.pos += 1;
            if self.number::<u32>()?.is_none() {
                return Err(self.unexpected(self.pos));
            }
        }

        if self.pos != close {
            return Err(self.unexpected(self.pos));
        }
        self.pos += 1;

        Ok(Atom {
            element,
            aromatic,
            charge,
            hydrogens,
            bracket: true,
        })
    }

    fn bracket_symbol(
        &mut self,
    ) -> Result<(&'static Element, bool), SmilesError> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Err(self.unexpected(start));
        };
        if c == b'*' {
            self.pos += 1;
            return Ok((&WILDCARD, false));
        }
        if c.is_ascii_lowercase() {
            // aromatic: se, as, te, or a single organic letter
            for (sym, elem) in [("se", "Se"), ("as", "As"), ("te", "Te")] {
                if self.smiles[start..].starts_with(sym) {
                    self.pos += 2;
                    return Ok((self.element(elem)?, true));
                }
            }
            let elem = match c {
                b'b' => "B",
                b'c' => "C",
                b'n' => "N",
                b'o' => "O",
                b'p' => "P",
                b's' => "S",
                _ => return Err(self.unexpected(start)),
            };
            self.pos += 1;
            return Ok((self.element(elem)?, true));
        }
        if !c.is_ascii_uppercase() {
            return Err(self.unexpected(start));
        }
        // prefer the two letter symbol when it is a real element
        if let Some(&n) = self.bytes.get(start + 1) {
            if n.is_ascii_lowercase() {
                if let Some(e) = by_symbol(&self.smiles[start..start + 2]) {
                    self.pos += 2;
                    return Ok((e, false));
                }
            }
        }
        self.pos += 1;
        Ok((self.element(&self.smiles[start..start + 1])?, false))
    }
}

/// parse `smiles` into a [Molecule]. leading and trailing whitespace is
/// ignored
pub fn parse(smiles: &str) -> Result<Molecule, SmilesError> {
    let smiles = smiles.trim();
    if smiles.is_empty() {
        return Err(SmilesError::Empty);
    }
    Parser::new(smiles).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogens(mol: &Molecule) -> Vec<u8> {
        mol.atoms.iter().map(|a| a.hydrogens).collect()
    }

    #[test]
    fn ethanol() {
        let mol = parse("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bonds.len(), 2);
        assert_eq!(hydrogens(&mol), vec![3, 2, 1]);
    }

    #[test]
    fn benzene() {
        let mol = parse("c1ccccc1").unwrap();
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.bonds.len(), 6);
        assert!(mol.bonds.iter().all(|b| b.order == BondOrder::Aromatic));
        assert_eq!(hydrogens(&mol), vec![1; 6]);
    }

    #[test]
    fn aromatic_heteroatoms() {
        let pyridine = parse("c1ccncc1").unwrap();
        assert_eq!(pyridine.atoms[3].hydrogens, 0);
        let thiophene = parse("c1ccsc1").unwrap();
        assert_eq!(thiophene.atoms[3].hydrogens, 0);
        let pyrrole = parse("c1cc[nH]c1").unwrap();
        assert_eq!(pyrrole.atoms[3].hydrogens, 1);
    }

    #[test]
    fn branches_and_bonds() {
        let mol = parse("CC(=O)O").unwrap();
        assert_eq!(mol.bonds[1].order, BondOrder::Double);
        assert_eq!(hydrogens(&mol), vec![3, 0, 0, 1]);

        let mol = parse("C#N").unwrap();
        assert_eq!(hydrogens(&mol), vec![1, 0]);

        let mol = parse("F/C=C/F").unwrap();
        assert_eq!(mol.bonds.len(), 3);
        assert_eq!(hydrogens(&mol), vec![0, 1, 1, 0]);
    }

    #[test]
    fn bracket_atoms() {
        let mol = parse("[NH4+]").unwrap();
        assert_eq!(mol.atoms[0].hydrogens, 4);
        assert_eq!(mol.atoms[0].charge, 1);

        let mol = parse("[13CH3:2][C@@H](F)Cl").unwrap();
        assert_eq!(mol.atoms[0].hydrogens, 3);
        assert_eq!(mol.atoms[1].hydrogens, 1);
        assert_eq!(mol.atoms[3].element.symbol, "Cl");

        let mol = parse("[O--]").unwrap();
        assert_eq!(mol.atoms[0].charge, -2);
        let mol = parse("[Fe+3]").unwrap();
        assert_eq!(mol.atoms[0].charge, 3);
        assert_eq!(mol.atoms[0].element.symbol, "Fe");

        let mol = parse("[se]1cccc1").unwrap();
        assert!(mol.atoms[0].aromatic);
        assert_eq!(mol.atoms[0].element.symbol, "Se");

        let mol = parse("[H][H]").unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(hydrogens(&mol), vec![0, 0]);

        let mol = parse("F[C@TH1H](Cl)Br").unwrap();
        assert_eq!(mol.atoms[1].hydrogens, 1);
        assert_eq!(mol.atom_count(), 4);
        let mol = parse("F[Pt@SP2](F)(Cl)Cl").unwrap();
        assert_eq!(mol.atoms[1].element.symbol, "Pt");
        assert_eq!(mol.atoms[1].hydrogens, 0);

        assert_eq!(parse("[C+127]").unwrap().atoms[0].charge, 127);
        assert_eq!(parse("[C-127]").unwrap().atoms[0].charge, -127);
        assert_eq!(parse("[CH255]").unwrap().atoms[0].hydrogens, 255);
    }

    #[test]
    fn rings_and_fragments() {
        let mol = parse("C1CC%12CC1CC%12").unwrap();
        assert_eq!(mol.atom_count(), 7);
        assert_eq!(mol.bonds.len(), 8);

        let mol = parse("[Na+].[Cl-]").unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert!(mol.bonds.is_empty());
    }

    #[test]
    fn errors() {
        assert!(matches!(parse("  "), Err(SmilesError::Empty)));
        assert!(matches!(
            parse("CC(C"),
            Err(SmilesError::UnmatchedParen(_))
        ));
        assert!(matches!(parse("CC)"), Err(SmilesError::UnmatchedParen(_))));
        assert!(matches!(
            parse("C1CC"),
            Err(SmilesError::UnclosedRing { ring: 1, .. })
        ));
        assert!(matches!(
            parse("[CH3"),
            Err(SmilesError::UnclosedBracket { pos: 0, .. })
        ));
        assert!(matches!(
            parse("[Xx]"),
            Err(SmilesError::UnknownElement { .. })
        ));
        assert!(matches!(
            parse("CC="),
            Err(SmilesError::DanglingBond { pos: 2, .. })
        ));
        assert!(matches!(
            parse("=C"),
            Err(SmilesError::DanglingBond { pos: 0, .. })
        ));
        assert!(matches!(
            parse("CQ"),
            Err(SmilesError::UnexpectedChar { ch: 'Q', pos: 1, .. })
        ));
        assert!(matches!(
            parse("C C"),
            Err(SmilesError::UnexpectedChar { ch: ' ', pos: 1, .. })
        ));
    }

    #[test]
    fn non_ascii_is_rejected() {
        assert!(matches!(
            parse("[C@Té]"),
            Err(SmilesError::UnexpectedChar { ch: 'é', pos: 4, .. })
        ));
        assert!(matches!(
            parse("Cé"),
            Err(SmilesError::UnexpectedChar { ch: 'é', pos: 1, .. })
        ));
        assert!(matches!(
            parse("[Cé]"),
            Err(SmilesError::UnexpectedChar { ch: 'é', pos: 2, .. })
        ));
        assert!(matches!(
            parse("[é]"),
            Err(SmilesError::UnexpectedChar { ch: 'é', pos: 1, .. })
        ));
    }

    #[test]
    fn bracket_numbers_out_of_range() {
        for (smiles, pos) in
            [("[C+200]", 3), ("[C-128]", 3), ("[CH300]", 3), ("[99999C]", 1)]
        {
            let got = parse(smiles);
            assert!(
                matches!(got, Err(SmilesError::UnexpectedChar { pos: p, .. }) if p == pos),
                "{smiles} => {got:?}"
            );
        }

        let plusses = format!("[C{}]", "+".repeat(130));
        assert!(matches!(
            parse(&plusses),
            Err(SmilesError::UnexpectedChar { ch: '+', pos: 2, .. })
        ));
        let minuses = format!("[C{}]", "-".repeat(128));
        assert_eq!(parse(&minuses).unwrap().atoms[0].charge, -128);
    }
}

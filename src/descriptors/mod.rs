//! The built-in descriptor engine. These are simple graph and composition
//! descriptors computed from a parsed SMILES string. They make no attempt to
//! match any particular toolkit's definitions beyond the obvious ones

use std::collections::VecDeque;

use crate::calculator::{Calculator, Descriptor};

pub mod element;
pub mod smiles;

use element::HYDROGEN_MASS;
use smiles::{BondOrder, Molecule, SmilesError};

macro_rules! descriptors {
    ($($name:literal => $summary:literal,)*) => {
        &[$(Descriptor { name: $name, summary: $summary },)*]
    };
}

pub static DESCRIPTORS: &[Descriptor] = descriptors! {
    "nHeavyAtom" => "number of heavy (non-hydrogen) atoms",
    "nH" => "number of hydrogen atoms, implicit and explicit",
    "nC" => "number of carbon atoms",
    "nN" => "number of nitrogen atoms",
    "nO" => "number of oxygen atoms",
    "nS" => "number of sulfur atoms",
    "nP" => "number of phosphorus atoms",
    "nHalogen" => "number of halogen atoms",
    "nHetero" => "number of heavy atoms other than carbon",
    "nAromAtom" => "number of aromatic atoms",
    "nBond" => "number of bonds between heavy atoms",
    "nDoubleBond" => "number of double bonds",
    "nTripleBond" => "number of triple bonds",
    "nRing" => "cyclomatic number of the molecular graph",
    "nRotB" => "number of rotatable bonds",
    "nHBDon" => "number of nitrogen and oxygen atoms bearing hydrogen",
    "nHBAcc" => "number of nitrogen and oxygen atoms",
    "FormalCharge" => "sum of formal charges",
    "MW" => "average molecular weight",
    "WienerIndex" => "sum of shortest path lengths between heavy atoms",
    "Zagreb1" => "sum of squared heavy atom degrees",
    "nFragment" => "number of disconnected fragments",
};

/// Computes [DESCRIPTORS] for SMILES strings. An engine holds onto scratch
/// buffers for its graph searches, so keep one around per thread rather than
/// building a fresh one for every molecule
#[derive(Default)]
pub struct DescriptorEngine {
    queue: VecDeque<usize>,
    dist: Vec<usize>,
    seen: Vec<bool>,
}

impl DescriptorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, n: usize) {
        self.queue.clear();
        self.dist.clear();
        self.dist.resize(n, usize::MAX);
    }

    /// breadth-first distances from `start`, optionally ignoring bond `skip`
    /// and non-heavy atoms
    fn bfs(
        &mut self,
        mol: &Molecule,
        start: usize,
        skip: Option<usize>,
        heavy_only: bool,
    ) {
        self.reset(mol.atom_count());
        self.dist[start] = 0;
        self.queue.push_back(start);
        while let Some(cur) = self.queue.pop_front() {
            for &(next, bond) in &mol.adjacency[cur] {
                if Some(bond) == skip
                    || (heavy_only && !mol.atoms[next].element.is_heavy())
                    || self.dist[next] != usize::MAX
                {
                    continue;
                }
                self.dist[next] = self.dist[cur] + 1;
                self.queue.push_back(next);
            }
        }
    }

    fn fragments(&mut self, mol: &Molecule) -> usize {
        let n = mol.atom_count();
        let mut seen = std::mem::take(&mut self.seen);
        seen.clear();
        seen.resize(n, false);
        let mut count = 0;
        for start in 0..n {
            if seen[start] {
                continue;
            }
            count += 1;
            self.bfs(mol, start, None, false);
            for (i, &d) in self.dist.iter().enumerate() {
                if d != usize::MAX {
                    seen[i] = true;
                }
            }
        }
        self.seen = seen;
        count
    }

    fn in_ring(&mut self, mol: &Molecule, bond: usize) -> bool {
        let (a, b) = mol.bonds[bond].atoms;
        self.bfs(mol, a, Some(bond), false);
        self.dist[b] != usize::MAX
    }

    fn wiener(&mut self, mol: &Molecule) -> f64 {
        let heavy: Vec<usize> = (0..mol.atom_count())
            .filter(|&i| mol.atoms[i].element.is_heavy())
            .collect();
        let mut sum = 0;
        for &i in &heavy {
            self.bfs(mol, i, None, true);
            sum += heavy
                .iter()
                .filter(|&&j| j > i && self.dist[j] != usize::MAX)
                .map(|&j| self.dist[j])
                .sum::<usize>();
        }
        sum as f64
    }

    pub fn compute(&mut self, mol: &Molecule) -> Vec<f64> {
        let atoms = &mol.atoms;
        let is_heavy = |i: usize| atoms[i].element.is_heavy();
        let heavy_degree =
            |i: usize| mol.neighbors(i).filter(|&n| is_heavy(n)).count();
        // hydrogens on atom i, whether implicit or written as [H] neighbors
        let total_h = |i: usize| {
            atoms[i].hydrogens as usize
                + mol
                    .neighbors(i)
                    .filter(|&n| atoms[n].element.number == 1)
                    .count()
        };
        let count = |number: u8| {
            atoms.iter().filter(|a| a.element.number == number).count() as f64
        };

        let n_heavy = (0..atoms.len()).filter(|&i| is_heavy(i)).count();
        let n_h = atoms.iter().map(|a| a.hydrogens as usize).sum::<usize>()
            + count(1) as usize;
        let n_halogen = atoms.iter().filter(|a| a.element.is_halogen()).count();
        let n_hetero = atoms
            .iter()
            .filter(|a| a.element.is_heavy() && a.element.number != 6)
            .count();
        let n_arom = atoms.iter().filter(|a| a.aromatic).count();
        let heavy_bonds = mol
            .bonds
            .iter()
            .filter(|b| is_heavy(b.atoms.0) && is_heavy(b.atoms.1))
            .count();
        let order_count =
            |o: BondOrder| mol.bonds.iter().filter(|b| b.order == o).count();

        let fragments = self.fragments(mol);
        let rings = mol.bonds.len() + fragments - atoms.len();

        let mut rotatable = 0;
        for (idx, bond) in mol.bonds.iter().enumerate() {
            let (a, b) = bond.atoms;
            if bond.order == BondOrder::Single
                && is_heavy(a)
                && is_heavy(b)
                && heavy_degree(a) > 1
                && heavy_degree(b) > 1
                && !self.in_ring(mol, idx)
            {
                rotatable += 1;
            }
        }

        let nitrogen_oxygen =
            |i: &usize| matches!(atoms[*i].element.number, 7 | 8);
        let donors = (0..atoms.len())
            .filter(nitrogen_oxygen)
            .filter(|&i| total_h(i) > 0)
            .count();
        let acceptors = (0..atoms.len()).filter(nitrogen_oxygen).count();

        let charge: i64 = atoms.iter().map(|a| a.charge as i64).sum();
        let mw: f64 = atoms
            .iter()
            .map(|a| a.element.mass + a.hydrogens as f64 * HYDROGEN_MASS)
            .sum();

        let zagreb: usize = (0..atoms.len())
            .filter(|&i| is_heavy(i))
            .map(|i| heavy_degree(i).pow(2))
            .sum();

        vec![
            n_heavy as f64,
            n_h as f64,
            count(6),
            count(7),
            count(8),
            count(16),
            count(15),
            n_halogen as f64,
            n_hetero as f64,
            n_arom as f64,
            heavy_bonds as f64,
            order_count(BondOrder::Double) as f64,
            order_count(BondOrder::Triple) as f64,
            rings as f64,
            rotatable as f64,
            donors as f64,
            acceptors as f64,
            charge as f64,
            mw,
            self.wiener(mol),
            zagreb as f64,
            fragments as f64,
        ]
    }
}

impl Calculator for DescriptorEngine {
    type Error = SmilesError;

    fn calculate(&mut self, structure: &str) -> Result<Vec<f64>, SmilesError> {
        let mol = smiles::parse(structure)?;
        Ok(self.compute(&mol))
    }

    fn describe(&self) -> Vec<Descriptor> {
        DESCRIPTORS.to_vec()
    }
}

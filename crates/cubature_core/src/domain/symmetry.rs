//! Finite symmetry groups acting on natural coordinates.
//!
//! Every group used by the reference domains is a subgroup of the signed
//! permutations: `y[i] = sign[i] * x[perm[i]]`.

/// One element of a signed permutation group.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedPerm {
    pub perm: Vec<usize>,
    pub signs: Vec<f64>,
}

impl SignedPerm {
    pub fn identity(n: usize) -> Self {
        Self {
            perm: (0..n).collect(),
            signs: vec![1.0; n],
        }
    }

    pub fn apply(&self, x: &[f64]) -> Vec<f64> {
        self.perm
            .iter()
            .zip(&self.signs)
            .map(|(&p, &s)| s * x[p])
            .collect()
    }

    /// Block composition: `self` on the leading coordinates, `other` on the rest.
    pub fn direct_sum(&self, other: &SignedPerm) -> SignedPerm {
        let shift = self.perm.len();
        let mut perm = self.perm.clone();
        perm.extend(other.perm.iter().map(|p| p + shift));
        let mut signs = self.signs.clone();
        signs.extend_from_slice(&other.signs);
        SignedPerm { perm, signs }
    }
}

/// All `n!` permutations of `n` coordinates in lexicographic order.
pub fn permutations(n: usize) -> Vec<SignedPerm> {
    let mut out = Vec::new();
    let mut current: Vec<usize> = (0..n).collect();
    permute(&mut current, 0, &mut out);
    out.sort_by(|a, b| a.perm.cmp(&b.perm));
    out
}

fn permute(current: &mut Vec<usize>, k: usize, out: &mut Vec<SignedPerm>) {
    if k == current.len() {
        out.push(SignedPerm {
            perm: current.clone(),
            signs: vec![1.0; current.len()],
        });
        return;
    }
    for i in k..current.len() {
        current.swap(k, i);
        permute(current, k + 1, out);
        current.swap(k, i);
    }
}

/// Sign flips of each of `n` coordinates (`2^n` elements).
pub fn reflections(n: usize) -> Vec<SignedPerm> {
    (0..(1usize << n))
        .map(|mask| SignedPerm {
            perm: (0..n).collect(),
            signs: (0..n)
                .map(|i| if mask & (1 << i) != 0 { -1.0 } else { 1.0 })
                .collect(),
        })
        .collect()
}

/// The hyperoctahedral group: permutations composed with sign flips.
pub fn signed_permutations(n: usize) -> Vec<SignedPerm> {
    let mut out = Vec::new();
    for p in permutations(n) {
        for r in reflections(n) {
            out.push(SignedPerm {
                perm: p.perm.clone(),
                signs: r.signs.clone(),
            });
        }
    }
    out
}

/// Every pairing of an element of `a` with an element of `b`.
pub fn product(a: &[SignedPerm], b: &[SignedPerm]) -> Vec<SignedPerm> {
    a.iter()
        .flat_map(|ga| b.iter().map(move |gb| ga.direct_sum(gb)))
        .collect()
}

//! Disjoint-set forest with path halving.
//!
//! `find` is iterative so arbitrarily long transitive chains cannot overflow
//! the stack.

#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grandparent = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grandparent;
            x = grandparent;
        }
        x
    }

    /// Order-dependent union: the smaller root always becomes the
    /// representative. Returns `true` if `a` and `b` were in different sets.
    pub fn union_keep_min(&mut self, a: u32, b: u32) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        let (min, max) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parent[max as usize] = min;
        true
    }

    /// Dense labels `0..k` in order of each set's smallest member, plus `k`.
    pub fn labels(&mut self) -> (Vec<u32>, usize) {
        let n = self.parent.len();
        let mut label_of_root = vec![u32::MAX; n];
        let mut labels = Vec::with_capacity(n);
        let mut next = 0u32;
        for i in 0..n as u32 {
            let root = self.find(i) as usize;
            if label_of_root[root] == u32::MAX {
                label_of_root[root] = next;
                next += 1;
            }
            labels.push(label_of_root[root]);
        }
        (labels, next as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_keeps_smallest_root() {
        let mut uf = UnionFind::new(5);
        assert!(uf.union_keep_min(4, 2));
        assert!(uf.union_keep_min(2, 3));
        assert!(!uf.union_keep_min(3, 4));
        assert_eq!(uf.find(4), 2);
        assert_eq!(uf.find(0), 0);
    }

    #[test]
    fn long_chain_does_not_recurse() {
        let n = 200_000;
        let mut uf = UnionFind::new(n);
        for i in (1..n as u32).rev() {
            uf.union_keep_min(i, i - 1);
        }
        assert_eq!(uf.find(n as u32 - 1), 0);
        let (labels, k) = uf.labels();
        assert_eq!(k, 1);
        assert!(labels.iter().all(|&l| l == 0));
    }

    #[test]
    fn labels_are_dense_and_ordered() {
        let mut uf = UnionFind::new(4);
        uf.union_keep_min(1, 3);
        let (labels, k) = uf.labels();
        assert_eq!(k, 3);
        assert_eq!(labels, vec![0, 1, 2, 1]);
    }
}

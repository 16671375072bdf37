//! Graph input model: a triangular adjacency relation with per-edge
//! weights assigned at load time. Grounded on this codebase's `Graph`
//! adjacency-matrix loaders (e.g. the `mcp` example's `graph.rs`), adapted
//! to a plain whitespace-separated matrix format instead of DIMACS.

use std::io::{BufRead, BufReader, Read};

use rand::Rng;

use crate::error::Error;

/// Replicated, read-only once loaded. `adjacency` and `weight` are both
/// indexed `[row * n + col]`; only entries with `row < col` (the upper
/// triangle) are authoritative.
#[derive(Debug, Clone)]
pub struct Graph {
    pub n: usize,
    adjacency: Vec<bool>,
    weight: Vec<u8>,
}

impl Graph {
    /// Vertices are 1-based in the public API; `i` and `j` below are
    /// 1-based.
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        if i == j {
            return false;
        }
        let (row, col) = Self::canonical(i, j);
        self.adjacency[(row - 1) * self.n + (col - 1)]
    }

    pub fn weight(&self, i: usize, j: usize) -> i32 {
        let (row, col) = Self::canonical(i, j);
        self.weight[(row - 1) * self.n + (col - 1)] as i32
    }

    fn canonical(i: usize, j: usize) -> (usize, usize) {
        if i <= j {
            (i, j)
        } else {
            (j, i)
        }
    }

    /// Loads the graph from a plain ASCII adjacency-matrix format and
    /// assigns each upper-triangle edge a weight in `[1, 255]` using the
    /// given source of randomness. Every process parses the file and rolls
    /// its own weights independently.
    pub fn load<R: Read, G: Rng>(source: R, rng: &mut G) -> Result<Self, Error> {
        let mut reader = BufReader::new(source);
        let mut tokens = tokenize(&mut reader)?;

        let n = tokens
            .next()
            .ok_or_else(|| Error::Parse("missing vertex count N".into()))?
            .parse::<usize>()
            .map_err(|e| Error::Parse(format!("invalid N: {e}")))?;
        if n < 2 {
            return Err(Error::Parse(format!("N must be >= 2, got {n}")));
        }

        let mut raw = vec![0u32; n * n];
        for (idx, slot) in raw.iter_mut().enumerate() {
            let tok = tokens.next().ok_or_else(|| {
                Error::Parse(format!(
                    "expected {} matrix entries, ran out at entry {}",
                    n * n,
                    idx
                ))
            })?;
            *slot = tok
                .parse::<u32>()
                .map_err(|e| Error::Parse(format!("invalid matrix entry: {e}")))?;
        }

        let mut adjacency = vec![false; n * n];
        let mut weight = vec![0u8; n * n];
        for row in 1..=n {
            for col in (row + 1)..=n {
                let present = raw[(row - 1) * n + (col - 1)] != 0;
                let off = (row - 1) * n + (col - 1);
                adjacency[off] = present;
                if present {
                    weight[off] = rng.gen_range(1..=255);
                }
            }
        }

        Ok(Graph {
            n,
            adjacency,
            weight,
        })
    }
}

fn tokenize<R: BufRead>(reader: &mut R) -> Result<std::vec::IntoIter<String>, Error> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .map_err(Error::Io)?;
    let tokens: Vec<String> = contents.split_whitespace().map(String::from).collect();
    Ok(tokens.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn loads_triangle_and_assigns_weights_in_range() {
        let input = "3\n0 1 1\n1 0 1\n1 1 0\n";
        let mut rng = StdRng::seed_from_u64(42);
        let g = Graph::load(input.as_bytes(), &mut rng).unwrap();
        assert_eq!(g.n, 3);
        assert!(g.has_edge(1, 2));
        assert!(g.has_edge(1, 3));
        assert!(g.has_edge(2, 3));
        for (i, j) in [(1, 2), (1, 3), (2, 3)] {
            let w = g.weight(i, j);
            assert!((1..=255).contains(&w));
            assert_eq!(g.weight(i, j), g.weight(j, i));
        }
    }

    #[test]
    fn disconnected_pair_plus_isolate_has_one_edge() {
        let input = "3\n0 1 0\n1 0 0\n0 0 0\n";
        let mut rng = StdRng::seed_from_u64(1);
        let g = Graph::load(input.as_bytes(), &mut rng).unwrap();
        assert!(g.has_edge(1, 2));
        assert!(!g.has_edge(1, 3));
        assert!(!g.has_edge(2, 3));
    }

    #[test]
    fn rejects_n_below_two() {
        let input = "1\n0\n";
        let mut rng = StdRng::seed_from_u64(1);
        assert!(Graph::load(input.as_bytes(), &mut rng).is_err());
    }

    #[test]
    fn rejects_truncated_matrix() {
        let input = "3\n0 1 1\n1 0 1\n";
        let mut rng = StdRng::seed_from_u64(1);
        assert!(Graph::load(input.as_bytes(), &mut rng).is_err());
    }
}

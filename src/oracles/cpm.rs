//! Constant Potts model community detection as a resolution oracle.
//!
//! Quality at resolution `γ` for a partition of a weighted undirected graph:
//!
//! ```text
//! Q(γ) = Σ_c [ W_in(c) − γ · n_c (n_c − 1) / 2 ]
//! ```
//!
//! where `W_in(c)` is the edge weight inside community `c` and `n_c` its
//! node count. Higher resolutions favor more, smaller communities; the
//! total internal weight of the optimal partition is non-increasing in `γ`,
//! which is exactly the signal the bisection scanner needs.
//!
//! Optimization is greedy Louvain-style: repeated local-moving passes over
//! the nodes (optionally in random order), then aggregation of communities
//! into supernodes and another round on the collapsed graph, until no merge
//! happens. The traversal randomness makes the oracle stochastic unless a
//! seed is set; the scanner absorbs the resulting noise via monotonicity
//! repair.

use std::collections::BTreeMap;

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::OracleError;
use crate::traits::ResolutionOracle;

/// Which communities are candidates when moving a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsiderComms {
    /// Every non-empty community.
    AllComms,
    /// Communities of the node's neighbors.
    AllNeighComms,
    /// One uniformly random non-empty community.
    RandComm,
    /// The community of one uniformly random neighbor.
    RandNeighComm,
}

/// Knobs for the greedy local-moving loop.
#[derive(Debug, Clone, Copy)]
pub struct LocalMoveParams {
    /// Stop a level once a full pass improves quality by no more than this.
    pub eps: f64,
    /// Stop once the fraction of nodes moved in a pass drops below this.
    pub delta: f64,
    /// Hard cap on local-moving passes per level.
    pub max_itr: usize,
    /// Shuffle the node traversal order each pass.
    pub random_order: bool,
    /// Candidate communities considered for each move.
    pub consider_comms: ConsiderComms,
}

impl Default for LocalMoveParams {
    fn default() -> Self {
        Self {
            eps: 1e-5,
            delta: 1e-2,
            max_itr: 10_000,
            random_order: true,
            consider_comms: ConsiderComms::AllNeighComms,
        }
    }
}

/// CPM community detection over a weighted undirected graph.
///
/// Unweighted inputs can be mapped in with weight `1.0` per edge; self
/// loops contribute to internal weight but never to move gains. Negative
/// edge weights and negative resolutions are both legal.
pub struct CpmOracle {
    graph: UnGraph<(), f64>,
    params: LocalMoveParams,
    seed: Option<u64>,
    bisect_fn: fn(&Membership) -> f64,
}

impl CpmOracle {
    pub fn new(graph: UnGraph<(), f64>) -> Self {
        Self {
            graph,
            params: LocalMoveParams::default(),
            seed: None,
            bisect_fn: Membership::internal_weight,
        }
    }

    pub fn with_params(mut self, params: LocalMoveParams) -> Self {
        self.params = params;
        self
    }

    /// Make the oracle deterministic: traversal order at a given resolution
    /// becomes a pure function of `(seed, resolution)`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the default bisect summary (total internal edge weight).
    pub fn with_bisect_fn(mut self, bisect_fn: fn(&Membership) -> f64) -> Self {
        self.bisect_fn = bisect_fn;
        self
    }

    pub fn graph(&self) -> &UnGraph<(), f64> {
        &self.graph
    }

    fn rng_for(&self, resolution: f64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ resolution.to_bits()),
            None => StdRng::from_entropy(),
        }
    }

    fn finish(&self, assignment: Vec<usize>, resolution: f64) -> Membership {
        let n_communities = assignment.iter().copied().max().map_or(0, |max| max + 1);
        let mut internal_weight = 0.0;
        for edge in self.graph.edge_references() {
            let a = edge.source().index();
            let b = edge.target().index();
            if assignment[a] == assignment[b] {
                internal_weight += *edge.weight();
            }
        }
        let mut sizes = vec![0usize; n_communities];
        for &c in &assignment {
            sizes[c] += 1;
        }
        let penalty: f64 = sizes
            .iter()
            .map(|&s| (s as f64) * ((s as f64) - 1.0) / 2.0)
            .sum();
        Membership {
            assignment,
            internal_weight,
            quality: internal_weight - resolution * penalty,
            n_communities,
        }
    }
}

impl ResolutionOracle for CpmOracle {
    type Partition = Membership;

    fn find_partition(&self, resolution: f64) -> Result<Membership, OracleError> {
        if !resolution.is_finite() {
            return Err(OracleError::new(format!(
                "non-finite resolution {resolution}"
            )));
        }
        let mut rng = self.rng_for(resolution);
        let mut assignment: Vec<usize> = (0..self.graph.node_count()).collect();
        let mut level = Level::from_graph(&self.graph);
        loop {
            let before = level.len();
            let (comm, n_comms) = local_move(&level, resolution, &self.params, &mut rng);
            for slot in assignment.iter_mut() {
                *slot = comm[*slot];
            }
            if n_comms == before || n_comms <= 1 {
                break;
            }
            level = aggregate(&level, &comm, n_comms);
        }
        Ok(self.finish(assignment, resolution))
    }

    fn bisect_value(&self, partition: &Membership) -> f64 {
        (self.bisect_fn)(partition)
    }
}

/// A clustering of the oracle's graph.
#[derive(Debug, Clone)]
pub struct Membership {
    assignment: Vec<usize>,
    internal_weight: f64,
    quality: f64,
    n_communities: usize,
}

impl Membership {
    /// Community id per node index, compacted to `0..n_communities`.
    pub fn assignment(&self) -> &[usize] {
        &self.assignment
    }

    pub fn community_of(&self, node: usize) -> usize {
        self.assignment[node]
    }

    pub fn n_communities(&self) -> usize {
        self.n_communities
    }

    /// Total edge weight occurring strictly inside communities, the default
    /// bisect value.
    pub fn internal_weight(&self) -> f64 {
        self.internal_weight
    }

    /// CPM quality at the resolution the partition was produced for.
    pub fn quality(&self) -> f64 {
        self.quality
    }
}

/// One level of the aggregation hierarchy.
///
/// `adj` excludes self loops; collapsed internal weight lives in
/// `self_weight`, and `node_size` counts original vertices per supernode.
struct Level {
    adj: Vec<Vec<(usize, f64)>>,
    self_weight: Vec<f64>,
    node_size: Vec<usize>,
}

impl Level {
    fn from_graph(graph: &UnGraph<(), f64>) -> Self {
        let n = graph.node_count();
        let mut adj = vec![Vec::new(); n];
        let mut self_weight = vec![0.0; n];
        for edge in graph.edge_references() {
            let a = edge.source().index();
            let b = edge.target().index();
            let w = *edge.weight();
            if a == b {
                self_weight[a] += w;
            } else {
                adj[a].push((b, w));
                adj[b].push((a, w));
            }
        }
        Self {
            adj,
            self_weight,
            node_size: vec![1; n],
        }
    }

    fn len(&self) -> usize {
        self.node_size.len()
    }
}

/// Greedy local moving at one level. Returns the compacted community
/// assignment and the number of communities.
fn local_move(
    level: &Level,
    resolution: f64,
    params: &LocalMoveParams,
    rng: &mut StdRng,
) -> (Vec<usize>, usize) {
    let n = level.len();
    let mut comm: Vec<usize> = (0..n).collect();
    let mut comm_size: Vec<usize> = level.node_size.clone();
    let mut comm_nodes: Vec<usize> = vec![1; n];
    // Stack of community ids that became empty; entries are validated
    // lazily since a move can re-occupy one.
    let mut empties: Vec<usize> = Vec::new();
    let mut order: Vec<usize> = (0..n).collect();

    let mut itr = 0usize;
    loop {
        if params.random_order {
            order.shuffle(rng);
        }
        let mut moves = 0usize;
        let mut improvement = 0.0f64;

        for &v in &order {
            let old = comm[v];
            let size_v = level.node_size[v] as f64;

            // Weight from v to each adjacent community.
            let mut w_to: BTreeMap<usize, f64> = BTreeMap::new();
            for &(u, w) in &level.adj[v] {
                *w_to.entry(comm[u]).or_insert(0.0) += w;
            }

            comm_size[old] -= level.node_size[v];
            comm_nodes[old] -= 1;
            if comm_nodes[old] == 0 {
                empties.push(old);
            }

            let gain_of = |c: usize| -> f64 {
                let w = w_to.get(&c).copied().unwrap_or(0.0);
                w - resolution * size_v * (comm_size[c] as f64)
            };

            // Rejoining the old community is the baseline every candidate
            // has to beat.
            let baseline = gain_of(old);
            let mut best_comm = old;
            let mut best_gain = baseline;

            // Ties never replace the incumbent, so re-considering the old
            // community is harmless.
            let consider = |c: usize, best_comm: &mut usize, best_gain: &mut f64| {
                let gain = gain_of(c);
                if gain > *best_gain {
                    *best_gain = gain;
                    *best_comm = c;
                }
            };

            match params.consider_comms {
                ConsiderComms::AllNeighComms => {
                    for &c in w_to.keys() {
                        consider(c, &mut best_comm, &mut best_gain);
                    }
                }
                ConsiderComms::AllComms => {
                    for c in 0..n {
                        if comm_nodes[c] > 0 {
                            consider(c, &mut best_comm, &mut best_gain);
                        }
                    }
                }
                ConsiderComms::RandComm => {
                    let occupied: Vec<usize> = (0..n).filter(|&c| comm_nodes[c] > 0).collect();
                    if let Some(&c) = occupied.choose(rng) {
                        consider(c, &mut best_comm, &mut best_gain);
                    }
                }
                ConsiderComms::RandNeighComm => {
                    if let Some(&(u, _)) = level.adj[v].choose(rng) {
                        consider(comm[u], &mut best_comm, &mut best_gain);
                    }
                }
            }

            // A free community is always a candidate: leaving a node
            // isolated has gain zero, which beats any negative move.
            while let Some(&c) = empties.last() {
                if comm_nodes[c] == 0 {
                    consider(c, &mut best_comm, &mut best_gain);
                    break;
                }
                empties.pop();
            }

            comm[v] = best_comm;
            comm_size[best_comm] += level.node_size[v];
            comm_nodes[best_comm] += 1;
            if best_comm != old {
                moves += 1;
                improvement += best_gain - baseline;
            }
        }

        itr += 1;
        if moves == 0 || improvement <= params.eps || itr >= params.max_itr {
            break;
        }
        if (moves as f64) < params.delta * (n as f64) {
            break;
        }
    }

    let n_comms = compact(&mut comm);
    (comm, n_comms)
}

/// Renumber community ids to `0..k` in order of first appearance.
fn compact(comm: &mut [usize]) -> usize {
    let mut remap = vec![usize::MAX; comm.len()];
    let mut next = 0usize;
    for slot in comm.iter_mut() {
        if remap[*slot] == usize::MAX {
            remap[*slot] = next;
            next += 1;
        }
        *slot = remap[*slot];
    }
    next
}

/// Collapse communities into supernodes for the next level.
fn aggregate(level: &Level, comm: &[usize], n_comms: usize) -> Level {
    let mut self_weight = vec![0.0f64; n_comms];
    let mut node_size = vec![0usize; n_comms];
    for v in 0..level.len() {
        self_weight[comm[v]] += level.self_weight[v];
        node_size[comm[v]] += level.node_size[v];
    }

    let mut between: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n_comms];
    for v in 0..level.len() {
        for &(u, w) in &level.adj[v] {
            // adj holds both directions; visit each edge at its lower end.
            if u < v {
                continue;
            }
            let (cv, cu) = (comm[v], comm[u]);
            if cv == cu {
                self_weight[cv] += w;
            } else {
                *between[cv].entry(cu).or_insert(0.0) += w;
                *between[cu].entry(cv).or_insert(0.0) += w;
            }
        }
    }

    Level {
        adj: between
            .into_iter()
            .map(|m| m.into_iter().collect())
            .collect(),
        self_weight,
        node_size,
    }
}

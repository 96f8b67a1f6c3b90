//! Weighted MaxSAT: the formula builder and a swappable solver capability.
//!
//! A [`Formula`] holds hard clauses that every assignment must satisfy and
//! weighted soft clauses whose satisfied weight is maximized. Solvers
//! implement [`MaxSatSolver`]; [`BranchAndBoundSolver`] is an exact
//! DPLL-style search with unit propagation on hard clauses and a
//! weight-based bound, adequate for the small formulas the version resolver
//! produces.

/// A boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(usize);

impl Var {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    var: Var,
    positive: bool,
}

impl Lit {
    pub fn pos(var: Var) -> Self {
        Self {
            var,
            positive: true,
        }
    }

    pub fn neg(var: Var) -> Self {
        Self {
            var,
            positive: false,
        }
    }

    pub fn var(self) -> Var {
        self.var
    }

    pub fn is_positive(self) -> bool {
        self.positive
    }
}

pub type Clause = Vec<Lit>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedClause {
    pub clause: Clause,
    pub weight: u64,
}

/// Formula factory; build a fresh one per solve.
#[derive(Debug, Clone, Default)]
pub struct Formula {
    num_vars: usize,
    hard: Vec<Clause>,
    soft: Vec<WeightedClause>,
}

impl Formula {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_var(&mut self) -> Var {
        let var = Var(self.num_vars);
        self.num_vars += 1;
        var
    }

    pub fn add_hard(&mut self, clause: Clause) {
        self.hard.push(clause);
    }

    pub fn add_soft(&mut self, clause: Clause, weight: u64) {
        self.soft.push(WeightedClause { clause, weight });
    }

    /// `a` implies `b`.
    pub fn implies(&mut self, a: Var, b: Var) {
        self.add_hard(vec![Lit::neg(a), Lit::pos(b)]);
    }

    /// Pairwise encoding: no two of `vars` are true together.
    pub fn at_most_one(&mut self, vars: &[Var]) {
        for (i, &a) in vars.iter().enumerate() {
            for &b in &vars[i + 1..] {
                self.add_hard(vec![Lit::neg(a), Lit::neg(b)]);
            }
        }
    }

    pub fn at_least_one(&mut self, vars: &[Var]) {
        self.add_hard(vars.iter().map(|&v| Lit::pos(v)).collect());
    }

    pub fn exactly_one(&mut self, vars: &[Var]) {
        self.at_least_one(vars);
        self.at_most_one(vars);
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn hard(&self) -> &[Clause] {
        &self.hard
    }

    pub fn soft(&self) -> &[WeightedClause] {
        &self.soft
    }
}

/// A total assignment satisfying every hard clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<bool>,
    pub satisfied_weight: u64,
}

impl Assignment {
    pub fn value(&self, var: Var) -> bool {
        self.values.get(var.0).copied().unwrap_or(false)
    }

    /// Variables assigned `true`, in index order.
    pub fn true_vars(&self) -> impl Iterator<Item = Var> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(|(i, _)| Var(i))
    }
}

pub trait MaxSatSolver {
    /// An optimal assignment, or `None` when the hard clauses are
    /// unsatisfiable or optimality could not be established.
    fn solve(&self, formula: &Formula) -> Option<Assignment>;
}

/// Exact branch-and-bound MaxSAT search.
#[derive(Debug, Clone, Default)]
pub struct BranchAndBoundSolver {
    node_limit: Option<usize>,
}

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up (returning `None`) after exploring this many search nodes.
    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.node_limit = Some(limit);
        self
    }
}

impl MaxSatSolver for BranchAndBoundSolver {
    fn solve(&self, formula: &Formula) -> Option<Assignment> {
        let mut search = Search::new(formula, self.node_limit);
        if formula.hard.iter().any(|c| c.is_empty()) || !search.propagate_initial() {
            return None;
        }
        search.run();
        if search.exhausted {
            tracing::warn!("MaxSAT search hit its node limit before proving optimality");
            return None;
        }
        search.best.map(|(weight, values)| Assignment {
            values,
            satisfied_weight: weight,
        })
    }
}

struct Search<'a> {
    formula: &'a Formula,
    values: Vec<Option<bool>>,
    trail: Vec<usize>,
    /// Hard clause indices per variable.
    occurs: Vec<Vec<usize>>,
    /// Branching order with preferred polarity.
    order: Vec<(usize, bool)>,
    best: Option<(u64, Vec<bool>)>,
    total_weight: u64,
    nodes: usize,
    node_limit: Option<usize>,
    exhausted: bool,
}

impl<'a> Search<'a> {
    fn new(formula: &'a Formula, node_limit: Option<usize>) -> Self {
        let n = formula.num_vars;
        let mut occurs = vec![Vec::new(); n];
        for (ci, clause) in formula.hard.iter().enumerate() {
            for lit in clause {
                occurs[lit.var.0].push(ci);
            }
        }

        // Branch first on variables carrying the heaviest soft weight, trying
        // the polarity that satisfies it; everything else defaults to false.
        let mut preference: Vec<Option<(u64, bool)>> = vec![None; n];
        for soft in &formula.soft {
            for lit in &soft.clause {
                let slot = &mut preference[lit.var.0];
                if slot.map_or(true, |(w, _)| soft.weight > w) {
                    *slot = Some((soft.weight, lit.positive));
                }
            }
        }
        let mut weighted: Vec<(usize, u64, bool)> = preference
            .iter()
            .enumerate()
            .filter_map(|(v, p)| p.map(|(w, pol)| (v, w, pol)))
            .collect();
        weighted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let mut order: Vec<(usize, bool)> = weighted.iter().map(|&(v, _, pol)| (v, pol)).collect();
        order.extend((0..n).filter(|&v| preference[v].is_none()).map(|v| (v, false)));

        Self {
            formula,
            values: vec![None; n],
            trail: Vec::new(),
            occurs,
            order,
            best: None,
            total_weight: formula.soft.iter().map(|s| s.weight).sum(),
            nodes: 0,
            node_limit,
            exhausted: false,
        }
    }

    fn propagate_initial(&mut self) -> bool {
        let formula = self.formula;
        for clause in &formula.hard {
            if let [lit] = clause.as_slice() {
                if !self.assign(lit.var.0, lit.positive) {
                    return false;
                }
            }
        }
        true
    }

    fn run(&mut self) {
        self.search(0);
    }

    fn search(&mut self, pos: usize) {
        if self.exhausted {
            return;
        }
        self.nodes += 1;
        if self.node_limit.is_some_and(|limit| self.nodes > limit) {
            self.exhausted = true;
            return;
        }

        let falsified = self.falsified_weight();
        let upper = self.total_weight - falsified;
        if let Some((best, _)) = &self.best {
            if upper <= *best {
                return;
            }
        }

        let Some(offset) = self.order[pos..]
            .iter()
            .position(|&(v, _)| self.values[v].is_none())
        else {
            let values = self.values.iter().map(|v| v.unwrap_or(false)).collect();
            self.best = Some((upper, values));
            return;
        };
        let next = pos + offset;
        let (var, preferred) = self.order[next];

        for value in [preferred, !preferred] {
            let mark = self.trail.len();
            if self.assign(var, value) {
                self.search(next + 1);
            }
            self.undo(mark);
            if self.exhausted {
                return;
            }
        }
    }

    /// Assign and unit-propagate. Returns `false` on conflict; the caller
    /// undoes the partial trail either way.
    fn assign(&mut self, var: usize, value: bool) -> bool {
        let mut queue = vec![(var, value)];
        while let Some((v, val)) = queue.pop() {
            match self.values[v] {
                Some(existing) if existing != val => return false,
                Some(_) => continue,
                None => {
                    self.values[v] = Some(val);
                    self.trail.push(v);
                }
            }
            for &ci in &self.occurs[v] {
                let mut free = 0;
                let mut unit = None;
                let mut satisfied = false;
                for lit in &self.formula.hard[ci] {
                    match self.values[lit.var.0] {
                        Some(x) if x == lit.positive => {
                            satisfied = true;
                            break;
                        }
                        Some(_) => {}
                        None => {
                            free += 1;
                            unit = Some(*lit);
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                match (free, unit) {
                    (0, _) => return false,
                    (1, Some(lit)) => queue.push((lit.var.0, lit.positive)),
                    _ => {}
                }
            }
        }
        true
    }

    fn undo(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some(v) = self.trail.pop() {
                self.values[v] = None;
            }
        }
    }

    fn falsified_weight(&self) -> u64 {
        self.formula
            .soft
            .iter()
            .filter(|s| {
                s.clause
                    .iter()
                    .all(|lit| self.values[lit.var.0].is_some_and(|x| x != lit.positive))
            })
            .map(|s| s.weight)
            .sum()
    }
}

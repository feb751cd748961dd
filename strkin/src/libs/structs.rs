use std::collections::BTreeMap;
use std::collections::VecDeque;

use color_eyre::{
    eyre::{ensure, eyre},
    Result,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::StrkinError;

/// A short-tandem-repeat marker with a per-meiosis mutation rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub mutation_rate: f64,
}

impl Marker {
    pub fn new(name: &str, mutation_rate: f64) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&mutation_rate),
            eyre!(StrkinError::MutationRateError((name.into(), mutation_rate)))
        );
        Ok(Self {
            name: name.to_string(),
            mutation_rate,
        })
    }
}

/// An ordered marker table, shared read-only by all computations.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSet {
    markers: Vec<Marker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self { markers: vec![] }
    }

    pub fn push(&mut self, marker: Marker) -> Result<()> {
        ensure!(
            self.get(&marker.name).is_none(),
            eyre!(StrkinError::DuplicateMarkerError(marker.name.clone()))
        );
        self.markers.push(marker);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// One allele value. The parent fields are derived by
/// [`crate::stats::annotate_mutations`] once the haplotypes of a trial are
/// final, they are not part of the canonical state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allele {
    pub value: i64,
    pub parent_value: Option<i64>,
    pub mutation_step: Option<i64>,
    pub mutation_probability: Option<f64>,
}

impl Allele {
    pub fn new(value: i64) -> Self {
        Self {
            value,
            parent_value: None,
            mutation_step: None,
            mutation_probability: None,
        }
    }
}

/// Alleles keyed by marker name, in marker table order.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Haplotype {
    alleles: IndexMap<String, Allele>,
}

impl Haplotype {
    pub fn insert(&mut self, marker_name: &str, allele: Allele) {
        self.alleles.insert(marker_name.to_string(), allele);
    }

    pub fn allele(&self, marker_name: &str) -> Option<&Allele> {
        self.alleles.get(marker_name)
    }

    pub fn allele_mut(&mut self, marker_name: &str) -> Option<&mut Allele> {
        self.alleles.get_mut(marker_name)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Allele> {
        self.alleles.iter()
    }

    pub fn len(&self) -> usize {
        self.alleles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alleles.is_empty()
    }

    pub fn covers(&self, markers: &MarkerSet) -> bool {
        markers
            .iter()
            .all(|marker| self.alleles.contains_key(&marker.name))
    }

    /// Marker-by-marker equality of the allele values.
    pub fn same_values_as(&self, other: &Haplotype) -> bool {
        self.alleles.len() == other.alleles.len()
            && self
                .alleles
                .iter()
                .all(|(name, allele)| other.allele(name).is_some_and(|o| o.value == allele.value))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaplotypeClass {
    #[default]
    Unknown,
    Known,
    Suspect,
    Simulated,
    Fixed,
}

impl std::fmt::Display for HaplotypeClass {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Known => write!(f, "known"),
            Self::Suspect => write!(f, "suspect"),
            Self::Simulated => write!(f, "simulated"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

/// `Unused` edges count as observed evidence in the probability product,
/// `Simulated` edges were consumed to generate a haplotype during the current
/// trial and are excluded from the observed product.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeClass {
    #[default]
    Unused,
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeFilter {
    All,
    Unused,
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    pub id: i64,
    pub name: String,
    pub haplotype: Haplotype,
    pub class: HaplotypeClass,
}

impl Individual {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            haplotype: Haplotype::default(),
            class: HaplotypeClass::default(),
        }
    }

    pub fn has_same_haplotype_as(&self, other: &Individual) -> bool {
        self.haplotype.same_values_as(&other.haplotype)
    }
}

/// A directed parent to child edge, stored as arena indices into
/// [`Pedigree::individuals`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub parent: usize,
    pub child: usize,
    pub class: EdgeClass,
}

impl Relationship {
    pub fn new(parent: usize, child: usize) -> Self {
        Self {
            parent,
            child,
            class: EdgeClass::default(),
        }
    }

    pub fn matches(&self, filter: EdgeFilter) -> bool {
        match filter {
            EdgeFilter::All => true,
            EdgeFilter::Unused => self.class == EdgeClass::Unused,
            EdgeFilter::Simulated => self.class == EdgeClass::Simulated,
        }
    }
}

/// The pedigree arena. Individuals are indexed by insertion order and edges
/// refer to those indices, so a per-trial deep copy is a plain clone of two
/// vectors.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Pedigree {
    individuals: Vec<Individual>,
    relationships: Vec<Relationship>,
}

impl Pedigree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_individual(&mut self, id: i64, name: &str) -> Result<()> {
        ensure!(
            self.idx_by_name(name).is_none() && self.idx_by_id(id).is_none(),
            eyre!(StrkinError::DuplicateIndividualError(name.into()))
        );
        self.individuals.push(Individual::new(id, name));
        Ok(())
    }

    pub fn add_relationship(&mut self, parent_id: i64, child_id: i64) -> Result<()> {
        let parent = self
            .idx_by_id(parent_id)
            .ok_or_else(|| eyre!(StrkinError::IndividualIdNotFoundError(parent_id)))?;
        let child = self
            .idx_by_id(child_id)
            .ok_or_else(|| eyre!(StrkinError::IndividualIdNotFoundError(child_id)))?;
        self.relationships.push(Relationship::new(parent, child));
        Ok(())
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn individual(&self, idx: usize) -> &Individual {
        &self.individuals[idx]
    }

    pub fn individual_mut(&mut self, idx: usize) -> &mut Individual {
        &mut self.individuals[idx]
    }

    pub fn idx_by_name(&self, name: &str) -> Option<usize> {
        self.individuals.iter().position(|i| i.name == name)
    }

    pub fn idx_by_id(&self, id: i64) -> Option<usize> {
        self.individuals.iter().position(|i| i.id == id)
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Assign a known haplotype to a named individual. The alleles are stored
    /// in marker table order and have to cover the full table.
    pub fn assign_known_haplotype(
        &mut self,
        name: &str,
        values: &IndexMap<String, i64>,
        markers: &MarkerSet,
    ) -> Result<()> {
        let idx = self
            .idx_by_name(name)
            .ok_or_else(|| eyre!(StrkinError::IndividualNotFoundError(name.into())))?;

        for marker_name in values.keys() {
            ensure!(
                markers.get(marker_name).is_some(),
                eyre!(StrkinError::MarkerNotFoundError(marker_name.clone()))
            );
        }

        let mut haplotype = Haplotype::default();
        for marker in markers.iter() {
            let value = values.get(&marker.name).ok_or_else(|| {
                eyre!(StrkinError::HaplotypeCoverageError((
                    name.into(),
                    marker.name.clone()
                )))
            })?;
            haplotype.insert(&marker.name, Allele::new(*value));
        }

        let individual = &mut self.individuals[idx];
        individual.haplotype = haplotype;
        individual.class = HaplotypeClass::Known;
        Ok(())
    }

    fn undirected_adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![vec![]; self.individuals.len()];
        for relationship in &self.relationships {
            adjacency[relationship.parent].push(relationship.child);
            adjacency[relationship.child].push(relationship.parent);
        }
        adjacency
    }

    /// Mark the named individual as the suspect and rebuild the relationship
    /// set as the depth-first spanning tree of the undirected topology rooted
    /// at the suspect. Edges not on the tree are dropped, every tree edge
    /// starts out as [`EdgeClass::Unused`]. Returns the suspect's index.
    pub fn reroot(&mut self, suspect_name: &str) -> Result<usize> {
        let root = self
            .idx_by_name(suspect_name)
            .ok_or_else(|| eyre!(StrkinError::IndividualNotFoundError(suspect_name.into())))?;
        self.individuals[root].class = HaplotypeClass::Suspect;

        let adjacency = self.undirected_adjacency();
        let mut visited = vec![false; self.individuals.len()];
        let mut tree = Vec::with_capacity(self.individuals.len().saturating_sub(1));
        let mut stack = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            if visited[node] {
                continue;
            }
            visited[node] = true;
            if let Some(parent) = parent {
                tree.push(Relationship::new(parent, node));
            }
            // Reversed push order so neighbors are visited in insertion order
            for &next in adjacency[node].iter().rev() {
                if !visited[next] {
                    stack.push((next, Some(node)));
                }
            }
        }

        if let Some(unreached) = visited.iter().position(|v| !v) {
            return Err(eyre!(StrkinError::DisconnectedPedigreeError(
                self.individuals[unreached].name.clone()
            )));
        }

        self.relationships = tree;
        Ok(root)
    }

    /// Individuals by breadth-first distance from the named source, ties
    /// within a level broken by edge insertion order. On the rerooted tree
    /// this guarantees every parent appears before its children.
    pub fn level_order_from(&self, source_name: &str) -> Result<Vec<usize>> {
        let source = self
            .idx_by_name(source_name)
            .ok_or_else(|| eyre!(StrkinError::IndividualNotFoundError(source_name.into())))?;

        let mut children = vec![vec![]; self.individuals.len()];
        for relationship in &self.relationships {
            children[relationship.parent].push(relationship.child);
        }

        let mut order = Vec::with_capacity(self.individuals.len());
        let mut visited = vec![false; self.individuals.len()];
        let mut queue = VecDeque::from([source]);
        visited[source] = true;

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &child in &children[node] {
                if !visited[child] {
                    visited[child] = true;
                    queue.push_back(child);
                }
            }
        }

        Ok(order)
    }

    /// The unique incoming edge source, `None` for the root.
    pub fn parent_of(&self, idx: usize) -> Option<usize> {
        self.relationships
            .iter()
            .find(|r| r.child == idx)
            .map(|r| r.parent)
    }

    /// Point mutation on the matching edge, a no-op if the edge is absent.
    pub fn set_relationship_class(&mut self, parent: usize, child: usize, class: EdgeClass) {
        if let Some(relationship) = self
            .relationships
            .iter_mut()
            .find(|r| r.parent == parent && r.child == child)
        {
            relationship.class = class;
        }
    }

    pub fn edges_of_class(&self, filter: EdgeFilter) -> impl Iterator<Item = &Relationship> + '_ {
        self.relationships.iter().filter(move |r| r.matches(filter))
    }

    pub fn unknown_individuals(&self) -> Vec<usize> {
        self.individuals
            .iter()
            .enumerate()
            .filter(|(_, i)| i.class == HaplotypeClass::Unknown)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Edges pairing one unknown individual with a known-or-better neighbor,
    /// as (unknown, neighbor). Used by the unconstrained mutation path.
    pub fn edges_with_one_known_one_unknown(
        &self,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.relationships.iter().filter_map(move |r| {
            let parent_unknown = self.individuals[r.parent].class == HaplotypeClass::Unknown;
            let child_unknown = self.individuals[r.child].class == HaplotypeClass::Unknown;
            match (parent_unknown, child_unknown) {
                (false, true) => Some((r.child, r.parent)),
                (true, false) => Some((r.parent, r.child)),
                _ => None,
            }
        })
    }
}

/// Result of a full simulation run. The average pedigree probability is
/// finalized before any distribution entry is estimated and immutable
/// afterwards, every distribution entry divides by it.
#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub average_pedigree_probability: f64,
    pub l_matching_probability: BTreeMap<usize, f64>,
    pub degenerate_trials: usize,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_markers() -> MarkerSet {
        let mut markers = MarkerSet::new();
        markers.push(Marker::new("DYS19", 0.1).unwrap()).unwrap();
        markers.push(Marker::new("DYS390", 0.2).unwrap()).unwrap();
        markers
    }

    // A pedigree with a marriage loop: both a and b are parents of c
    fn looped_pedigree() -> Pedigree {
        let mut pedigree = Pedigree::new();
        pedigree.add_individual(1, "a").unwrap();
        pedigree.add_individual(2, "b").unwrap();
        pedigree.add_individual(3, "c").unwrap();
        pedigree.add_individual(4, "d").unwrap();
        pedigree.add_relationship(1, 3).unwrap();
        pedigree.add_relationship(2, 3).unwrap();
        pedigree.add_relationship(3, 4).unwrap();
        pedigree.add_relationship(1, 2).unwrap();
        pedigree
    }

    #[test]
    fn test_marker_rate_validation() {
        assert!(Marker::new("DYS19", 1.5).is_err());
        assert!(Marker::new("DYS19", -0.1).is_err());
        assert!(Marker::new("DYS19", 0.0).is_ok());
    }

    #[test]
    fn test_duplicate_individual() {
        let mut pedigree = Pedigree::new();
        pedigree.add_individual(1, "a").unwrap();
        assert!(pedigree.add_individual(2, "a").is_err());
        assert!(pedigree.add_individual(1, "b").is_err());
    }

    #[test]
    fn test_relationship_to_missing_id() {
        let mut pedigree = Pedigree::new();
        pedigree.add_individual(1, "a").unwrap();
        assert!(pedigree.add_relationship(1, 9).is_err());
    }

    #[test]
    fn test_reroot_builds_a_spanning_tree() {
        let mut pedigree = looped_pedigree();
        let root = pedigree.reroot("c").unwrap();

        assert_eq!(pedigree.individual(root).class, HaplotypeClass::Suspect);
        // A spanning tree over 4 individuals has 3 edges, one loop edge dropped
        assert_eq!(pedigree.relationships().len(), 3);
        for (idx, individual) in pedigree.individuals().iter().enumerate() {
            if individual.name == "c" {
                assert_eq!(pedigree.parent_of(idx), None);
            } else {
                assert!(pedigree.parent_of(idx).is_some());
            }
        }
    }

    #[test]
    fn test_reroot_is_idempotent() {
        let mut pedigree = looped_pedigree();
        pedigree.reroot("c").unwrap();
        let first = pedigree.relationships().to_vec();
        pedigree.reroot("c").unwrap();
        assert_eq!(first, pedigree.relationships());
    }

    #[test]
    fn test_reroot_unknown_name() {
        let mut pedigree = looped_pedigree();
        assert!(pedigree.reroot("nobody").is_err());
    }

    #[test]
    fn test_reroot_disconnected() {
        let mut pedigree = looped_pedigree();
        pedigree.add_individual(5, "stray").unwrap();
        assert!(pedigree.reroot("c").is_err());
    }

    #[test]
    fn test_level_order_lists_parents_first() {
        let mut pedigree = looped_pedigree();
        pedigree.reroot("c").unwrap();
        let order = pedigree.level_order_from("c").unwrap();

        assert_eq!(order.len(), pedigree.len());
        assert_eq!(pedigree.individual(order[0]).name, "c");
        for (position, &idx) in order.iter().enumerate() {
            if let Some(parent) = pedigree.parent_of(idx) {
                let parent_position = order.iter().position(|&o| o == parent).unwrap();
                assert!(parent_position < position);
            }
        }
    }

    #[test]
    fn test_set_relationship_class() {
        let mut pedigree = looped_pedigree();
        pedigree.reroot("c").unwrap();

        let child = pedigree.idx_by_name("d").unwrap();
        let parent = pedigree.parent_of(child).unwrap();
        pedigree.set_relationship_class(parent, child, EdgeClass::Simulated);
        assert_eq!(pedigree.edges_of_class(EdgeFilter::Simulated).count(), 1);

        // No-op on an edge that is not in the tree
        pedigree.set_relationship_class(child, parent, EdgeClass::Simulated);
        assert_eq!(pedigree.edges_of_class(EdgeFilter::Simulated).count(), 1);
        assert_eq!(
            pedigree.edges_of_class(EdgeFilter::All).count(),
            pedigree.relationships().len()
        );
    }

    #[test]
    fn test_assign_known_haplotype() {
        let markers = test_markers();
        let mut pedigree = looped_pedigree();

        let mut values = IndexMap::new();
        values.insert("DYS390".to_string(), 24);
        values.insert("DYS19".to_string(), 14);
        pedigree
            .assign_known_haplotype("a", &values, &markers)
            .unwrap();

        let a = pedigree.individual(pedigree.idx_by_name("a").unwrap());
        assert_eq!(a.class, HaplotypeClass::Known);
        assert!(a.haplotype.covers(&markers));
        // Alleles are stored in marker table order, not file order
        let names: Vec<&String> = a.haplotype.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["DYS19", "DYS390"]);
    }

    #[test]
    fn test_assign_known_haplotype_requires_coverage() {
        let markers = test_markers();
        let mut pedigree = looped_pedigree();

        let mut values = IndexMap::new();
        values.insert("DYS19".to_string(), 14);
        assert!(pedigree
            .assign_known_haplotype("a", &values, &markers)
            .is_err());

        values.insert("DYS999".to_string(), 1);
        assert!(pedigree
            .assign_known_haplotype("a", &values, &markers)
            .is_err());
    }

    #[test]
    fn test_edges_with_one_known_one_unknown() {
        let markers = test_markers();
        let mut pedigree = looped_pedigree();
        let mut values = IndexMap::new();
        values.insert("DYS19".to_string(), 14);
        values.insert("DYS390".to_string(), 24);
        pedigree
            .assign_known_haplotype("c", &values, &markers)
            .unwrap();
        pedigree.reroot("c").unwrap();

        let c = pedigree.idx_by_name("c").unwrap();
        let pairs: Vec<(usize, usize)> = pedigree.edges_with_one_known_one_unknown().collect();
        // Both tree edges out of c pair an unknown with the suspect
        assert_eq!(pairs.len(), 2);
        for (unknown, known) in pairs {
            assert_eq!(known, c);
            assert_eq!(
                pedigree.individual(unknown).class,
                HaplotypeClass::Unknown
            );
        }
    }

    #[test]
    fn test_same_haplotype_comparison() {
        let mut a = Haplotype::default();
        a.insert("DYS19", Allele::new(14));
        a.insert("DYS390", Allele::new(24));

        let mut b = Haplotype::default();
        b.insert("DYS19", Allele::new(14));
        b.insert("DYS390", Allele::new(24));
        assert!(a.same_values_as(&b));

        b.allele_mut("DYS390").unwrap().value = 25;
        assert!(!a.same_values_as(&b));

        let mut c = Haplotype::default();
        c.insert("DYS19", Allele::new(14));
        assert!(!a.same_values_as(&c));
    }
}

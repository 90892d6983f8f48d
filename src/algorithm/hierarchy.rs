//! Concept hierarchy construction and traversal
//!
//! Concept relationship tables arrive as flat (ancestor, descendant, details)
//! rows containing only direct relations. This module groups them into a
//! parent → children mapping, finds the roots, and walks the result depth-first
//! for rendering.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Int64Type};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use log::{debug, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::HierarchyConfig;
use crate::error::{CohortError, Result};
use crate::models::{ConceptChild, ConceptEdge, ConceptId};

/// Parent → ordered children mapping built from direct relations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConceptHierarchy {
    nodes: BTreeMap<ConceptId, Vec<ConceptChild>>,
}

impl ConceptHierarchy {
    /// Group edges by ancestor, keeping each group's row order
    ///
    /// Rows without an ancestor are skipped. Transitive edges are not removed,
    /// and no cycle check is made; see [`Self::build_checked`].
    #[must_use]
    pub fn build(edges: &[ConceptEdge]) -> Self {
        let mut nodes: BTreeMap<ConceptId, Vec<ConceptChild>> = BTreeMap::new();
        for edge in edges {
            let Some(ancestor) = edge.ancestor else {
                continue;
            };
            nodes.entry(ancestor).or_default().push(ConceptChild {
                concept_id: edge.descendant,
                details: edge.details.clone(),
            });
        }
        debug!("Built concept hierarchy with {} parent concepts", nodes.len());
        Self { nodes }
    }

    /// Build and reject edge sets containing a cycle
    pub fn build_checked(edges: &[ConceptEdge]) -> Result<Self> {
        let hierarchy = Self::build(edges);
        hierarchy.check_acyclic()?;
        Ok(hierarchy)
    }

    /// Children of a concept, if it has any
    #[must_use]
    pub fn children(&self, concept_id: ConceptId) -> Option<&[ConceptChild]> {
        self.nodes.get(&concept_id).map(Vec::as_slice)
    }

    /// Whether the concept has an entry (at least one child)
    #[must_use]
    pub fn contains(&self, concept_id: ConceptId) -> bool {
        self.nodes.contains_key(&concept_id)
    }

    /// Parent concepts in ascending id order
    pub fn parents(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of parent concepts
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The underlying mapping
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<ConceptId, Vec<ConceptChild>> {
        &self.nodes
    }

    /// Fail with the first concept found on a cycle
    pub fn check_acyclic(&self) -> Result<()> {
        let mut marks: FxHashMap<ConceptId, Mark> = FxHashMap::default();
        for parent in self.parents() {
            self.visit(parent, &mut marks)?;
        }
        Ok(())
    }

    fn visit(&self, concept_id: ConceptId, marks: &mut FxHashMap<ConceptId, Mark>) -> Result<()> {
        match marks.get(&concept_id) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::InProgress) => return Err(CohortError::HierarchyCycle(concept_id)),
            None => {}
        }
        marks.insert(concept_id, Mark::InProgress);
        for child in self.children(concept_id).unwrap_or_default() {
            if let Some(child_id) = child.concept_id {
                self.visit(child_id, marks)?;
            }
        }
        marks.insert(concept_id, Mark::Done);
        Ok(())
    }

    /// Depth-first, pre-order walk from `root`
    ///
    /// When `root_details` is given it is yielded first at depth 0 and the
    /// children start at depth 1; otherwise the children start at depth 0. A root
    /// without children yields nothing.
    #[must_use]
    pub fn walk<'a>(&'a self, root: ConceptId, root_details: Option<&'a str>) -> HierarchyWalk<'a> {
        let Some(children) = self.children(root) else {
            return HierarchyWalk {
                hierarchy: self,
                pending_root: None,
                stack: Vec::new(),
            };
        };

        let pending_root = root_details.map(|details| RenderedNode {
            concept_id: Some(root),
            details,
            depth: 0,
        });
        let depth = usize::from(pending_root.is_some());

        HierarchyWalk {
            hierarchy: self,
            pending_root,
            stack: vec![Frame {
                concept_id: root,
                children: children.iter(),
                depth,
            }],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mark {
    InProgress,
    Done,
}

/// A node yielded by [`HierarchyWalk`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedNode<'a> {
    pub concept_id: Option<ConceptId>,
    pub details: &'a str,
    pub depth: usize,
}

#[derive(Debug)]
struct Frame<'a> {
    concept_id: ConceptId,
    children: std::slice::Iter<'a, ConceptChild>,
    depth: usize,
}

/// Lazy pre-order traversal of a [`ConceptHierarchy`]
///
/// The walk does not descend into a concept that is already on the current
/// path, so cyclic input terminates.
#[derive(Debug)]
pub struct HierarchyWalk<'a> {
    hierarchy: &'a ConceptHierarchy,
    pending_root: Option<RenderedNode<'a>>,
    stack: Vec<Frame<'a>>,
}

impl<'a> Iterator for HierarchyWalk<'a> {
    type Item = RenderedNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.pending_root.take() {
            return Some(root);
        }

        loop {
            let frame = self.stack.last_mut()?;
            let depth = frame.depth;
            let Some(child) = frame.children.next() else {
                self.stack.pop();
                continue;
            };

            if let Some(child_id) = child.concept_id {
                if let Some(grandchildren) = self.hierarchy.children(child_id) {
                    if self.stack.iter().any(|f| f.concept_id == child_id) {
                        warn!("Concept {child_id} is its own ancestor; not descending again");
                    } else {
                        self.stack.push(Frame {
                            concept_id: child_id,
                            children: grandchildren.iter(),
                            depth: depth + 1,
                        });
                    }
                }
            }

            return Some(RenderedNode {
                concept_id: child.concept_id,
                details: &child.details,
                depth,
            });
        }
    }
}

/// Concept ids that are parents but never children
///
/// Rows with a missing ancestor are ignored; missing descendants are kept in
/// the child set. The result is sorted by id.
#[must_use]
pub fn find_roots(edges: &[ConceptEdge]) -> Vec<ConceptId> {
    let parents: FxHashSet<ConceptId> = edges.iter().filter_map(|e| e.ancestor).collect();
    let children: FxHashSet<Option<ConceptId>> = edges.iter().map(|e| e.descendant).collect();

    parents
        .into_iter()
        .filter(|parent| !children.contains(&Some(*parent)))
        .sorted()
        .collect()
}

/// Direction a hierarchy was expanded in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyDirection {
    /// Walking towards ancestors
    Parents,
    /// Walking towards descendants
    Children,
}

impl HierarchyDirection {
    /// Glyph shown in front of rendered lines
    #[must_use]
    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Parents => "\u{1F53C}",
            Self::Children => "\u{1F53D}",
        }
    }
}

/// Renders a hierarchy walk as indented text
#[derive(Debug, Clone)]
pub struct HierarchyRenderer {
    indent: String,
    direction: Option<HierarchyDirection>,
}

impl Default for HierarchyRenderer {
    fn default() -> Self {
        Self::new(&HierarchyConfig::default())
    }
}

impl HierarchyRenderer {
    #[must_use]
    pub fn new(config: &HierarchyConfig) -> Self {
        Self {
            indent: config.indent.clone(),
            direction: None,
        }
    }

    /// Prefix every line below the root with the direction glyph
    #[must_use]
    pub fn with_direction(mut self, direction: HierarchyDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Format a single walked node
    #[must_use]
    pub fn format_node(&self, node: &RenderedNode<'_>, is_root_line: bool) -> String {
        let mut line = self.indent.repeat(node.depth);
        if let (Some(direction), false) = (self.direction, is_root_line) {
            let _ = write!(line, "{} ", direction.arrow());
        }
        line.push_str(node.details);
        line
    }

    /// Rendered lines of the walk from `root`
    #[must_use]
    pub fn render_lines(
        &self,
        hierarchy: &ConceptHierarchy,
        root: ConceptId,
        root_details: Option<&str>,
    ) -> Vec<String> {
        let has_root_line = root_details.is_some();
        hierarchy
            .walk(root, root_details)
            .enumerate()
            .map(|(i, node)| self.format_node(&node, has_root_line && i == 0))
            .collect()
    }

    /// Render the walk from `root` as newline-terminated text
    #[must_use]
    pub fn render(
        &self,
        hierarchy: &ConceptHierarchy,
        root: ConceptId,
        root_details: Option<&str>,
    ) -> String {
        let mut output = String::new();
        for line in self.render_lines(hierarchy, root, root_details) {
            output.push_str(&line);
            output.push('\n');
        }
        output
    }

    /// Stream the walk from `root` to a writer
    pub fn write_to<W: Write>(
        &self,
        hierarchy: &ConceptHierarchy,
        root: ConceptId,
        root_details: Option<&str>,
        writer: &mut W,
    ) -> Result<()> {
        let has_root_line = root_details.is_some();
        for (i, node) in hierarchy.walk(root, root_details).enumerate() {
            writeln!(writer, "{}", self.format_node(&node, has_root_line && i == 0))?;
        }
        Ok(())
    }
}

/// Extract concept edges from an Arrow record batch
///
/// The id columns may be any integer type castable to Int64 and may contain
/// nulls. Null details become empty strings.
pub fn edges_from_record_batch(
    batch: &RecordBatch,
    config: &HierarchyConfig,
) -> Result<Vec<ConceptEdge>> {
    let schema = batch.schema();
    let ancestor_idx = schema.index_of(&config.ancestor_column)?;
    let descendant_idx = schema.index_of(&config.descendant_column)?;
    let details_idx = schema.index_of(&config.details_column)?;

    let ancestors = cast(batch.column(ancestor_idx), &DataType::Int64)?;
    let descendants = cast(batch.column(descendant_idx), &DataType::Int64)?;
    let details = cast(batch.column(details_idx), &DataType::Utf8)?;

    let ancestors = ancestors.as_primitive::<Int64Type>();
    let descendants = descendants.as_primitive::<Int64Type>();
    let details = details.as_string::<i32>();

    let edges = (0..batch.num_rows())
        .map(|row| ConceptEdge {
            ancestor: (!ancestors.is_null(row)).then(|| ancestors.value(row)),
            descendant: (!descendants.is_null(row)).then(|| descendants.value(row)),
            details: if details.is_null(row) {
                String::new()
            } else {
                details.value(row).to_string()
            },
        })
        .collect();

    Ok(edges)
}

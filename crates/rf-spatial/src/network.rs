//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays are sorted by source node and indexed by `EdgeId`.  The
//! sort is stable, so a node's outgoing edges keep the order in which the
//! segments that produced them were added.
//!
//! Every segment yields a forward edge and its mirror (endpoints swapped,
//! bearing + 180°).  Each edge lives only in the adjacency of its start node.
//!
//! # Spatial index
//!
//! Two R-trees (via `rstar`) over raw `[lat, lon]`: one of nodes for
//! nearest-node snapping, one of forward segments for nearest-edge lookup.
//! Nearest-node snapping seeds from the planar nearest neighbour, then scans
//! the lat/lon box that bounds the spherical cap through that seed, so the
//! pick is the exact haversine nearest at any latitude.

use rand::Rng;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use rf_core::{reverse_bearing, EdgeId, GeoPoint, NodeId, StreetId, EARTH_RADIUS_KM};

use crate::{SpatialError, SpatialResult};

/// Slack added to each side of a search window, in degrees (~0.1 mm).
const WINDOW_PAD_DEG: f64 = 1e-9;

// ── R-tree entries ────────────────────────────────────────────────────────────

#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2], // [lat, lon]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

/// Lat/lon box holding every point within `radius_km` of `center`.
///
/// Falls back to the full longitude range when the cap reaches a pole or
/// crosses the antimeridian.
fn search_window(center: GeoPoint, radius_km: f64) -> AABB<[f64; 2]> {
    let angle = radius_km / EARTH_RADIUS_KM;
    let dlat = angle.to_degrees() + WINDOW_PAD_DEG;
    let (lat_lo, lat_hi) = (center.lat - dlat, center.lat + dlat);

    let ratio = angle.sin() / center.lat.to_radians().cos();
    let mut dlon = if lat_lo <= -90.0 || lat_hi >= 90.0 || !(ratio < 1.0) {
        360.0
    } else {
        ratio.asin().to_degrees() + WINDOW_PAD_DEG
    };
    if center.lon - dlon < -180.0 || center.lon + dlon > 180.0 {
        dlon = 360.0;
    }

    AABB::from_corners([lat_lo, center.lon - dlon], [lat_hi, center.lon + dlon])
}

/// A forward segment; its mirror shares the same geometry and is not indexed.
#[derive(Clone)]
struct SegmentEntry {
    a: [f64; 2],
    b: [f64; 2],
    id: EdgeId,
}

impl RTreeObject for SegmentEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.a, self.b)
    }
}

impl PointDistance for SegmentEntry {
    /// Squared planar distance from `point` to the closest point of the
    /// segment.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let (ax, ay) = (self.a[0], self.a[1]);
        let (dx, dy) = (self.b[0] - ax, self.b[1] - ay);
        let len2 = dx * dx + dy * dy;
        let t = if len2 > 0.0 {
            (((point[0] - ax) * dx + (point[1] - ay) * dy) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (px, py) = (ax + t * dx - point[0], ay + t * dy - point[1]);
        px * px + py * py
    }
}

// ── Streets and roads ─────────────────────────────────────────────────────────

/// One source line feature.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Street {
    /// The feature's `id` property, or a generated `street-{n}` key.
    pub key: String,
    pub name: Option<String>,
}

/// All streets sharing one display name.
#[derive(Debug, Clone)]
struct Road {
    name: String,
    nodes: Vec<NodeId>,
}

/// A road returned by [`RoadNetwork::search_by_name`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadMatch {
    pub name: String,
    pub nodes: Vec<NodeId>,
    pub coordinates: Vec<GeoPoint>,
}

/// Lat/lon bounding box of every node.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

impl Bounds {
    pub fn contains(&self, p: GeoPoint) -> bool {
        (self.min.lat..=self.max.lat).contains(&p.lat)
            && (self.min.lon..=self.max.lon).contains(&p.lon)
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road graph in CSR format plus spatial indexes.
///
/// All arrays are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`RoadNetworkBuilder`] or the GeoJSON loader.
/// Immutable after construction, so it can be shared behind an `Arc` and read
/// from any number of agent ticks without locking.
pub struct RoadNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    pub node_pos: Vec<GeoPoint>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId) ─────────────────────────────────────
    pub edge_from: Vec<NodeId>,
    pub edge_to: Vec<NodeId>,
    /// Great-circle length in kilometres.
    pub edge_distance_km: Vec<f64>,
    /// Degrees in `[0, 360)` from start to end.
    pub edge_bearing: Vec<f64>,
    pub edge_street: Vec<StreetId>,

    // ── Source features ───────────────────────────────────────────────────
    pub streets: Vec<Street>,
    roads: Vec<Road>,

    // ── Spatial indexes ───────────────────────────────────────────────────
    node_idx: RTree<NodeEntry>,
    segment_idx: RTree<SegmentEntry>,
    bounds: Option<Bounds>,
}

impl RoadNetwork {
    /// Construct an empty network with no nodes or edges.
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(EdgeId::from_index)
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Edges that continue a traversal of `edge`: the adjacency of its end
    /// node, minus any edge leading straight back to its start.
    ///
    /// An agent entering a dead end gets an empty list.
    pub fn connected_edges(&self, edge: EdgeId) -> Vec<EdgeId> {
        self.continuations(self.edge_from[edge.index()], self.edge_to[edge.index()])
    }

    /// Same as [`connected_edges`](Self::connected_edges) for a traversal
    /// from `from` to `to` that need not be a graph edge (e.g. a U-turn).
    pub fn continuations(&self, from: NodeId, to: NodeId) -> Vec<EdgeId> {
        self.out_edges(to)
            .filter(|e| self.edge_to[e.index()] != from)
            .collect()
    }

    // ── Random picks ──────────────────────────────────────────────────────

    /// Uniform random edge; `None` on an edgeless graph.
    pub fn random_edge<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<EdgeId> {
        let n = self.edge_count();
        (n > 0).then(|| EdgeId::from_index(rng.gen_range(0..n)))
    }

    /// Uniform random node; `None` on an empty graph.
    pub fn random_node<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<NodeId> {
        let n = self.node_count();
        (n > 0).then(|| NodeId::from_index(rng.gen_range(0..n)))
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// The node closest to `pos` by great-circle distance.
    ///
    /// Ties go to the lower `NodeId`.
    pub fn find_nearest_node(&self, pos: GeoPoint) -> SpatialResult<NodeId> {
        let seed = self
            .node_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .ok_or(SpatialError::EmptyNetwork)?;
        let radius_km = pos.distance_km(self.node_pos[seed.id.index()]);

        // Anything nearer than the seed lies inside the window.
        let best = self
            .node_idx
            .locate_in_envelope(&search_window(pos, radius_km))
            .map(|e| (e.id, pos.distance_km(self.node_pos[e.id.index()])))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map_or(seed.id, |(id, _)| id);
        Ok(best)
    }

    /// The forward edge whose segment passes closest to `pos`.
    pub fn find_nearest_edge(&self, pos: GeoPoint) -> SpatialResult<EdgeId> {
        self.segment_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.id)
            .ok_or(SpatialError::EmptyNetwork)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Position along `edge` at `fraction` of its length.
    #[inline]
    pub fn point_on_edge(&self, edge: EdgeId, fraction: f64) -> GeoPoint {
        let a = self.node_pos[self.edge_from[edge.index()].index()];
        let b = self.node_pos[self.edge_to[edge.index()].index()];
        a.lerp(b, fraction)
    }

    // ── Streets ───────────────────────────────────────────────────────────

    pub fn street(&self, id: StreetId) -> Option<&Street> {
        self.streets.get(id.index())
    }

    /// Display name of the street an edge belongs to.
    pub fn edge_name(&self, edge: EdgeId) -> Option<&str> {
        self.street(self.edge_street[edge.index()])
            .and_then(|s| s.name.as_deref())
    }

    /// Case-insensitive substring search over road names.
    pub fn search_by_name(&self, query: &str) -> Vec<RoadMatch> {
        let needle = query.to_lowercase();
        self.roads
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .map(|r| RoadMatch {
                name: r.name.clone(),
                nodes: r.nodes.clone(),
                coordinates: r.nodes.iter().map(|n| self.node_pos[n.index()]).collect(),
            })
            .collect()
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// Nodes are deduplicated on their exact formatted coordinate: two vertices
/// are the same node only if `"{lat},{lon}"` matches byte for byte.
///
/// # Example
///
/// ```
/// use rf_core::GeoPoint;
/// use rf_spatial::RoadNetworkBuilder;
///
/// let mut b = RoadNetworkBuilder::new();
/// b.add_line(None, Some("Main St".into()), &[
///     GeoPoint::new(0.0, 0.0),
///     GeoPoint::new(0.0, 0.01),
///     GeoPoint::new(0.0, 0.02),
/// ]);
/// let net = b.build();
/// assert_eq!(net.node_count(), 3);
/// assert_eq!(net.edge_count(), 4); // two segments, both directions
/// ```
pub struct RoadNetworkBuilder {
    nodes:        Vec<GeoPoint>,
    node_by_key:  FxHashMap<String, NodeId>,
    raw_edges:    Vec<RawEdge>,
    streets:      Vec<Street>,
    street_nodes: Vec<Vec<NodeId>>,
}

struct RawEdge {
    from:        NodeId,
    to:          NodeId,
    distance_km: f64,
    bearing:     f64,
    street:      StreetId,
    forward:     bool,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self {
            nodes:        Vec::new(),
            node_by_key:  FxHashMap::default(),
            raw_edges:    Vec::new(),
            streets:      Vec::new(),
            street_nodes: Vec::new(),
        }
    }

    /// Look up or create the node at exactly `pos`.
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let next = NodeId::from_index(self.nodes.len());
        let id = *self.node_by_key.entry(pos.dedup_key()).or_insert(next);
        if id == next {
            self.nodes.push(pos);
        }
        id
    }

    /// Register a source feature.  Without a key, one is generated.
    pub fn add_street(&mut self, key: Option<String>, name: Option<String>) -> StreetId {
        let id = StreetId::from_index(self.streets.len());
        let key = key.unwrap_or_else(|| format!("street-{}", id.0));
        self.streets.push(Street { key, name });
        self.street_nodes.push(Vec::new());
        id
    }

    /// Add the forward/reverse edge pair for one segment of `street`.
    ///
    /// Returns `false` (and adds nothing) when both endpoints resolve to the
    /// same node.
    pub fn add_segment(&mut self, street: StreetId, a: GeoPoint, b: GeoPoint) -> bool {
        let from = self.add_node(a);
        let to = self.add_node(b);
        if from == to {
            return false;
        }
        let (pa, pb) = (self.nodes[from.index()], self.nodes[to.index()]);
        let distance_km = pa.distance_km(pb);
        let bearing = pa.bearing_to(pb);

        self.raw_edges.push(RawEdge { from, to, distance_km, bearing, street, forward: true });
        self.raw_edges.push(RawEdge {
            from: to,
            to: from,
            distance_km,
            bearing: reverse_bearing(bearing),
            street,
            forward: false,
        });

        let nodes = &mut self.street_nodes[street.index()];
        for n in [from, to] {
            if !nodes.contains(&n) {
                nodes.push(n);
            }
        }
        true
    }

    /// Add a polyline feature: one edge pair per consecutive vertex pair.
    pub fn add_line(
        &mut self,
        key: Option<String>,
        name: Option<String>,
        vertices: &[GeoPoint],
    ) -> StreetId {
        let street = self.add_street(key, name);
        for pair in vertices.windows(2) {
            self.add_segment(street, pair[0], pair[1]);
        }
        street
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// Time complexity: O(E log E) for the edge sort + O(N log N) for the
    /// R-tree bulk loads.
    pub fn build(self) -> RoadNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:        Vec<NodeId>   = raw.iter().map(|e| e.from).collect();
        let edge_to:          Vec<NodeId>   = raw.iter().map(|e| e.to).collect();
        let edge_distance_km: Vec<f64>      = raw.iter().map(|e| e.distance_km).collect();
        let edge_bearing:     Vec<f64>      = raw.iter().map(|e| e.bearing).collect();
        let edge_street:      Vec<StreetId> = raw.iter().map(|e| e.street).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for e in &raw {
            node_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let node_entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry { point: [pos.lat, pos.lon], id: NodeId::from_index(i) })
            .collect();
        let node_idx = RTree::bulk_load(node_entries);

        let segment_entries: Vec<SegmentEntry> = raw
            .iter()
            .enumerate()
            .filter(|(_, e)| e.forward)
            .map(|(i, e)| {
                let (a, b) = (self.nodes[e.from.index()], self.nodes[e.to.index()]);
                SegmentEntry { a: [a.lat, a.lon], b: [b.lat, b.lon], id: EdgeId::from_index(i) }
            })
            .collect();
        let segment_idx = RTree::bulk_load(segment_entries);

        let bounds = self.nodes.split_first().map(|(first, rest)| {
            rest.iter().fold(Bounds { min: *first, max: *first }, |b, p| Bounds {
                min: GeoPoint::new(b.min.lat.min(p.lat), b.min.lon.min(p.lon)),
                max: GeoPoint::new(b.max.lat.max(p.lat), b.max.lon.max(p.lon)),
            })
        });

        // Group named streets into roads, in order of first appearance.
        let mut roads: Vec<Road> = Vec::new();
        let mut road_by_name: FxHashMap<&str, usize> = FxHashMap::default();
        for (street, nodes) in self.streets.iter().zip(&self.street_nodes) {
            let Some(name) = street.name.as_deref() else { continue };
            let slot = *road_by_name.entry(name).or_insert_with(|| {
                roads.push(Road { name: name.to_owned(), nodes: Vec::new() });
                roads.len() - 1
            });
            let road = &mut roads[slot];
            for n in nodes {
                if !road.nodes.contains(n) {
                    road.nodes.push(*n);
                }
            }
        }

        tracing::debug!(nodes = node_count, edges = edge_count, roads = roads.len(), "road network built");

        RoadNetwork {
            node_pos: self.nodes,
            node_out_start,
            edge_from,
            edge_to,
            edge_distance_km,
            edge_bearing,
            edge_street,
            streets: self.streets,
            roads,
            node_idx,
            segment_idx,
            bounds,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}

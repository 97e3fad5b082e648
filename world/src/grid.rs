//! Node mesh that backs pathfinding and rendering.

use grid_siege_core::{NodeCoord, NodeState, PixelPoint};

/// One cell of the pathfinding grid.
///
/// Neighbor lists hold coordinates rather than references so the grid keeps
/// exclusive ownership of every node.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    coord: NodeCoord,
    position: PixelPoint,
    state: NodeState,
    neighbors: Vec<NodeCoord>,
}

impl Node {
    fn new(coord: NodeCoord, cell_size: f32) -> Self {
        Self {
            coord,
            position: coord.to_grid_point().to_pixels(cell_size),
            state: NodeState::Open,
            neighbors: Vec::with_capacity(4),
        }
    }

    /// Row and column of the node.
    #[must_use]
    pub const fn coord(&self) -> NodeCoord {
        self.coord
    }

    /// Top-left corner of the node in screen space.
    #[must_use]
    pub const fn position(&self) -> PixelPoint {
        self.position
    }

    /// Current passability state.
    #[must_use]
    pub const fn state(&self) -> NodeState {
        self.state
    }

    /// Non-barrier 4-connected neighbors captured by the last refresh.
    #[must_use]
    pub fn neighbors(&self) -> &[NodeCoord] {
        &self.neighbors
    }
}

/// Fixed-size 2D mesh of nodes indexed by row and column.
///
/// State mutations leave neighbor lists stale until
/// [`refresh_neighbors`](Self::refresh_neighbors) runs. Querying a coordinate
/// outside the grid is a programming error and panics.
#[derive(Clone, Debug)]
pub struct Grid {
    rows: u32,
    columns: u32,
    cell_size: f32,
    nodes: Vec<Node>,
    start: Option<NodeCoord>,
    end: Option<NodeCoord>,
    neighbors_stale: bool,
}

impl Grid {
    /// Allocates `rows * columns` open nodes.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero or if `cell_size` is not positive.
    #[must_use]
    pub fn new(rows: u32, columns: u32, cell_size: f32) -> Self {
        assert!(rows > 0, "grid rows must be positive");
        assert!(columns > 0, "grid columns must be positive");
        assert!(cell_size > 0.0, "grid cell size must be positive");

        let capacity = usize::try_from(u64::from(rows) * u64::from(columns))
            .expect("grid node count fits usize");
        let mut nodes = Vec::with_capacity(capacity);
        for row in 0..rows {
            for column in 0..columns {
                nodes.push(Node::new(NodeCoord::new(row, column), cell_size));
            }
        }

        Self {
            rows,
            columns,
            cell_size,
            nodes,
            start: None,
            end: None,
            neighbors_stale: true,
        }
    }

    /// Number of node rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of node columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Edge length of a node in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Grids always contain at least one node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, coord: NodeCoord) -> bool {
        coord.row() < self.rows && coord.column() < self.columns
    }

    /// Row-major index of the coordinate.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the grid.
    #[must_use]
    pub fn index(&self, coord: NodeCoord) -> usize {
        assert!(
            self.contains(coord),
            "node {coord:?} lies outside the {}x{} grid",
            self.rows,
            self.columns
        );
        coord.row() as usize * self.columns as usize + coord.column() as usize
    }

    /// Coordinate stored at the provided row-major index.
    #[must_use]
    pub fn coord_at(&self, index: usize) -> NodeCoord {
        self.nodes[index].coord
    }

    /// Node stored at the coordinate.
    #[must_use]
    pub fn node(&self, coord: NodeCoord) -> &Node {
        &self.nodes[self.index(coord)]
    }

    /// Iterator over every node in row-major order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Current state of the node at the coordinate.
    #[must_use]
    pub fn state(&self, coord: NodeCoord) -> NodeState {
        self.node(coord).state
    }

    /// Neighbors of the node captured by the last refresh.
    #[must_use]
    pub fn neighbors(&self, coord: NodeCoord) -> &[NodeCoord] {
        self.node(coord).neighbors()
    }

    /// Node currently holding the start role.
    #[must_use]
    pub const fn start(&self) -> Option<NodeCoord> {
        self.start
    }

    /// Node currently holding the end role.
    #[must_use]
    pub const fn end(&self) -> Option<NodeCoord> {
        self.end
    }

    /// Reports whether a state change happened since the last refresh.
    #[must_use]
    pub const fn neighbors_stale(&self) -> bool {
        self.neighbors_stale
    }

    /// Screen-space position of the node's top-left corner.
    #[must_use]
    pub fn pixel_position(&self, coord: NodeCoord) -> PixelPoint {
        self.node(coord).position
    }

    /// Turns the node into a barrier.
    pub fn set_barrier(&mut self, coord: NodeCoord) {
        self.write_state(coord, NodeState::Barrier);
    }

    /// Flips the node between barrier and open, returning the new state.
    pub fn toggle_barrier(&mut self, coord: NodeCoord) -> NodeState {
        let next = if self.state(coord) == NodeState::Barrier {
            NodeState::Open
        } else {
            NodeState::Barrier
        };
        self.write_state(coord, next);
        next
    }

    /// Gives the start role to the node, demoting any previous holder to open.
    pub fn set_start(&mut self, coord: NodeCoord) {
        if let Some(previous) = self.start.filter(|previous| *previous != coord) {
            self.write_state(previous, NodeState::Open);
        }
        self.write_state(coord, NodeState::Start);
    }

    /// Gives the end role to the node, demoting any previous holder to open.
    pub fn set_end(&mut self, coord: NodeCoord) {
        if let Some(previous) = self.end.filter(|previous| *previous != coord) {
            self.write_state(previous, NodeState::Open);
        }
        self.write_state(coord, NodeState::End);
    }

    /// Returns the node to the open state.
    pub fn reset(&mut self, coord: NodeCoord) {
        self.write_state(coord, NodeState::Open);
    }

    /// Marks an open node as finalized by a search. Role and barrier nodes keep their state.
    pub fn mark_visited(&mut self, coord: NodeCoord) {
        let index = self.index(coord);
        if self.nodes[index].state == NodeState::Open {
            self.nodes[index].state = NodeState::Visited;
        }
    }

    /// Marks an open or visited node as lying on the active route.
    pub fn mark_on_path(&mut self, coord: NodeCoord) {
        let index = self.index(coord);
        if matches!(
            self.nodes[index].state,
            NodeState::Open | NodeState::Visited
        ) {
            self.nodes[index].state = NodeState::OnPath;
        }
    }

    /// Returns every visited or on-path node to the open state.
    pub fn clear_markers(&mut self) {
        for node in &mut self.nodes {
            if node.state.is_marker() {
                node.state = NodeState::Open;
            }
        }
    }

    /// Recomputes the 4-connected neighbor list of every node.
    ///
    /// Barrier nodes and out-of-bounds cells never appear in a list. Lists are
    /// ordered north, east, south, west.
    pub fn refresh_neighbors(&mut self) {
        for index in 0..self.nodes.len() {
            let coord = self.nodes[index].coord;
            let mut neighbors = std::mem::take(&mut self.nodes[index].neighbors);
            neighbors.clear();
            for candidate in cardinal_neighbors(coord, self.rows, self.columns) {
                if self.nodes[self.index(candidate)].state.is_passable() {
                    neighbors.push(candidate);
                }
            }
            self.nodes[index].neighbors = neighbors;
        }
        self.neighbors_stale = false;
    }

    fn write_state(&mut self, coord: NodeCoord, state: NodeState) {
        let index = self.index(coord);
        let previous = self.nodes[index].state;
        if previous == state {
            return;
        }

        if previous == NodeState::Start {
            self.start = None;
        }
        if previous == NodeState::End {
            self.end = None;
        }
        match state {
            NodeState::Start => self.start = Some(coord),
            NodeState::End => self.end = Some(coord),
            _ => {}
        }

        self.nodes[index].state = state;
        self.neighbors_stale = true;
    }
}

fn cardinal_neighbors(
    coord: NodeCoord,
    rows: u32,
    columns: u32,
) -> impl Iterator<Item = NodeCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    if let Some(row) = coord.row().checked_sub(1) {
        candidates[count] = Some(NodeCoord::new(row, coord.column()));
        count += 1;
    }

    if let Some(column) = coord.column().checked_add(1) {
        if column < columns {
            candidates[count] = Some(NodeCoord::new(coord.row(), column));
            count += 1;
        }
    }

    if let Some(row) = coord.row().checked_add(1) {
        if row < rows {
            candidates[count] = Some(NodeCoord::new(row, coord.column()));
            count += 1;
        }
    }

    if let Some(column) = coord.column().checked_sub(1) {
        candidates[count] = Some(NodeCoord::new(coord.row(), column));
        count += 1;
    }

    candidates.into_iter().take(count).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_open_with_pixel_positions() {
        let grid = Grid::new(3, 4, 32.0);

        assert_eq!(grid.len(), 12);
        assert!(grid.nodes().all(|node| node.state() == NodeState::Open));
        let node = grid.node(NodeCoord::new(2, 1));
        assert_eq!(node.position(), PixelPoint::new(32.0, 64.0));
        assert!(grid.neighbors_stale());
    }

    #[test]
    fn refresh_links_four_connected_neighbors() {
        let mut grid = Grid::new(3, 3, 1.0);
        grid.refresh_neighbors();

        assert_eq!(
            grid.neighbors(NodeCoord::new(1, 1)),
            &[
                NodeCoord::new(0, 1),
                NodeCoord::new(1, 2),
                NodeCoord::new(2, 1),
                NodeCoord::new(1, 0),
            ]
        );
        assert_eq!(
            grid.neighbors(NodeCoord::new(0, 0)),
            &[NodeCoord::new(0, 1), NodeCoord::new(1, 0)]
        );
        assert!(!grid.neighbors_stale());
    }

    #[test]
    fn refresh_excludes_barriers_and_never_links_self() {
        let mut grid = Grid::new(3, 3, 1.0);
        grid.set_barrier(NodeCoord::new(0, 1));
        grid.set_barrier(NodeCoord::new(1, 0));
        grid.refresh_neighbors();

        assert!(grid.neighbors(NodeCoord::new(0, 0)).is_empty());
        for node in grid.nodes() {
            assert!(!node.neighbors().contains(&node.coord()));
            for neighbor in node.neighbors() {
                assert_ne!(grid.state(*neighbor), NodeState::Barrier);
            }
        }
    }

    #[test]
    fn mutations_leave_neighbors_stale_until_refresh() {
        let mut grid = Grid::new(2, 2, 1.0);
        grid.refresh_neighbors();
        grid.set_barrier(NodeCoord::new(0, 1));

        assert!(grid.neighbors_stale());
        assert!(grid
            .neighbors(NodeCoord::new(0, 0))
            .contains(&NodeCoord::new(0, 1)));

        grid.refresh_neighbors();
        assert!(!grid
            .neighbors(NodeCoord::new(0, 0))
            .contains(&NodeCoord::new(0, 1)));
    }

    #[test]
    fn start_and_end_roles_are_exclusive() {
        let mut grid = Grid::new(3, 3, 1.0);
        grid.set_start(NodeCoord::new(0, 0));
        grid.set_start(NodeCoord::new(1, 1));
        grid.set_end(NodeCoord::new(2, 2));

        assert_eq!(grid.start(), Some(NodeCoord::new(1, 1)));
        assert_eq!(grid.state(NodeCoord::new(0, 0)), NodeState::Open);
        assert_eq!(grid.end(), Some(NodeCoord::new(2, 2)));

        grid.set_end(NodeCoord::new(1, 1));
        assert_eq!(grid.start(), None);
        assert_eq!(grid.end(), Some(NodeCoord::new(1, 1)));
        assert_eq!(grid.state(NodeCoord::new(2, 2)), NodeState::Open);
    }

    #[test]
    fn toggle_and_reset_round_trip_state() {
        let mut grid = Grid::new(2, 2, 1.0);
        let cell = NodeCoord::new(1, 0);

        assert_eq!(grid.toggle_barrier(cell), NodeState::Barrier);
        assert_eq!(grid.toggle_barrier(cell), NodeState::Open);

        grid.set_start(cell);
        grid.reset(cell);
        assert_eq!(grid.state(cell), NodeState::Open);
        assert_eq!(grid.start(), None);
    }

    #[test]
    fn markers_only_touch_open_nodes() {
        let mut grid = Grid::new(1, 3, 1.0);
        grid.set_start(NodeCoord::new(0, 0));
        grid.mark_visited(NodeCoord::new(0, 0));
        grid.mark_visited(NodeCoord::new(0, 1));
        grid.mark_on_path(NodeCoord::new(0, 1));

        assert_eq!(grid.state(NodeCoord::new(0, 0)), NodeState::Start);
        assert_eq!(grid.state(NodeCoord::new(0, 1)), NodeState::OnPath);

        grid.clear_markers();
        assert_eq!(grid.state(NodeCoord::new(0, 1)), NodeState::Open);
        assert_eq!(grid.state(NodeCoord::new(0, 0)), NodeState::Start);
    }

    #[test]
    #[should_panic(expected = "lies outside")]
    fn out_of_range_queries_fail_fast() {
        let grid = Grid::new(2, 2, 1.0);
        let _ = grid.node(NodeCoord::new(2, 0));
    }

    #[test]
    #[should_panic(expected = "rows must be positive")]
    fn zero_dimensions_fail_fast() {
        let _ = Grid::new(0, 3, 1.0);
    }
}

use nav_core::Position;

/// Straight-line waypoints between two points of one region, start included.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Route {
    pub waypoints: Vec<Position>,
}

impl Route {
    pub fn new(waypoints: Vec<Position>) -> Self {
        Self { waypoints }
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Where to move next: the second waypoint when there is one (the first
    /// is the snapped start), otherwise the only waypoint.
    pub fn next_destination(&self) -> Option<&Position> {
        self.waypoints.get(1).or_else(|| self.waypoints.first())
    }

    pub fn last(&self) -> Option<&Position> {
        self.waypoints.last()
    }

    /// Total length on the ground plane.
    pub fn length_2d(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|w| w[0].distance_2d_squared(&w[1]).sqrt())
            .sum()
    }
}

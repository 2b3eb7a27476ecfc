use crate::geometry_utils::Point;

/// Ordered waypoints for one drone
#[derive(Debug, Clone)]
pub struct Mission {
    waypoints: Vec<Point>,
    current: usize,
    loop_waypoints: bool,
}

impl Mission {
    pub fn new(waypoints: Vec<Point>, loop_waypoints: bool) -> Self {
        Mission {
            waypoints,
            current: 0,
            loop_waypoints,
        }
    }

    pub fn current(&self) -> Option<Point> {
        self.waypoints.get(self.current).copied()
    }

    /// Step to the next waypoint and return it. At the end of the list this
    /// wraps around when looping, otherwise it keeps returning the last one.
    pub fn advance(&mut self) -> Option<Point> {
        if self.waypoints.is_empty() {
            return None;
        }
        if self.current + 1 < self.waypoints.len() {
            self.current += 1;
        } else if self.loop_waypoints {
            self.current = 0;
        }
        self.current()
    }

    pub fn is_last(&self) -> bool {
        self.waypoints.is_empty() || self.current + 1 >= self.waypoints.len()
    }
}

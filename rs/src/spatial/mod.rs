pub mod geometry;
pub mod kdtree;

pub use geometry::earth_distance;
pub use kdtree::KdTree;

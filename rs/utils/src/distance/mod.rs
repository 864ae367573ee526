pub mod squared_euclidean;

pub use squared_euclidean::sq_l2_distance;

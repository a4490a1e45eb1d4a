// Index i of a prediction vector is the probability of CLASSES[i].
pub const CLASSES: [&str; 6] = ["buildings", "forest", "glacier", "mountain", "sea", "street"];

pub const NUM_CLASSES: usize = CLASSES.len();

pub fn class_name(index: usize) -> Option<&'static str> {
    CLASSES.get(index).copied()
}

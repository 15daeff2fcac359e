/// Copyright 2024 Lucas Walter
///
/// std glue around clothoid_curve, turns sampled paths into text for plotting
pub mod render;

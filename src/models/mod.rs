pub mod batch;
pub mod history;
pub mod image;

pub use batch::*;
pub use history::*;
pub use image::*;

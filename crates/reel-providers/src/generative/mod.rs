mod inline;
mod task;

pub use inline::{ContentImageGen, InlineGenConfig, PredictImageGen};
pub use task::{TaskImageConfig, TaskImageGen};

//! Visual providers and the fallback chain that picks between them.
//!
//! Every concrete backend sits behind one of three narrow traits so the
//! resolver's chain logic never changes when a provider is swapped out.

mod batch;
mod error;
mod generative;
mod motion;
mod poll;
mod resolver;
mod search;
mod traits;

pub use batch::BatchImageCache;
pub use error::{ProviderError, ProviderResult};
pub use generative::{ContentImageGen, InlineGenConfig, PredictImageGen, TaskImageConfig, TaskImageGen};
pub use motion::{LongRunningMotion, MotionConfig};
pub use poll::{poll_until_terminal, PollOutcome};
pub use resolver::{AssetResolver, Resolution};
pub use search::{StockPhotoSearch, StockSearchConfig, WebImageSearch, WebSearchConfig};
pub use traits::{Candidate, CandidateSource, GenerativeProvider, MotionProvider, SearchProvider};

// Application layer - Use case interactors

pub mod container;
pub mod info_interactor;
pub mod search_interactor;
pub mod trim_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use info_interactor::{InfoInteractor, VideoInfo};
pub use search_interactor::{SearchInteractor, SearchResults};
pub use trim_interactor::TrimInteractor;

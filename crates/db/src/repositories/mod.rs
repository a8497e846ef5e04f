pub mod event_repo;
pub mod message_repo;
pub mod project_repo;
pub mod scene_repo;
pub mod search_index_repo;

pub use event_repo::EventRepo;
pub use message_repo::MessageRepo;
pub use project_repo::ProjectRepo;
pub use scene_repo::SceneRepo;
pub use search_index_repo::SearchIndexRepo;

pub mod auth;
pub mod broker;
pub mod cache;
pub mod config;
pub mod live;
pub mod orchestrator;
pub mod project;
pub mod task;
pub mod testing;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use broker::{BrokerError, ChannelBroker, WorkBroker, WorkOrder, WorkerEvent};
pub use cache::{CacheError, MemoryStatusCache, StatusCache};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, DatabaseConfig, SanitizedConfig, ServerConfig,
};
pub use live::{LiveConfig, LiveDeps, LiveEvent, LiveStream, ProjectSnapshot};
pub use orchestrator::{
    AdmissionError, CreateTaskRequest, OrchestratorConfig, OrchestratorError,
    PipelineOrchestrator,
};
pub use project::{
    FileCategory, FileRef, NewProject, Project, ProjectError, ProjectStore, SqliteProjectStore,
};
pub use task::{NewTask, SqliteTaskStore, Task, TaskError, TaskKind, TaskStore};

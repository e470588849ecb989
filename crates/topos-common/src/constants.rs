//! Manifest schema identifiers and well-known defaults.

/// Manifest schema tag of a generic container resource.
pub const CONTAINER_V0: &str = "container.v0";

/// Manifest schema tag of a project resource.
pub const PROJECT_V0: &str = "project.v0";

/// Manifest schema tag of a MySQL server container.
pub const MYSQL_SERVER_V0: &str = "mysql.server.v0";

/// Manifest schema tag of an externally supplied MySQL connection.
pub const MYSQL_CONNECTION_V0: &str = "mysql.connection.v0";

/// Manifest schema tag of a database hosted on a MySQL server.
pub const MYSQL_DATABASE_V0: &str = "mysql.database.v0";

/// Manifest schema tag of a Dapr component.
pub const DAPR_COMPONENT_V0: &str = "dapr.component.v0";

/// Manifest schema tag of a Dapr sidecar.
pub const DAPR_V0: &str = "dapr.v0";

/// Host used when synthesizing connection strings.
pub const DEFAULT_HOST: &str = "localhost";

/// Default MySQL image reference.
pub const MYSQL_IMAGE: &str = "mysql";

/// Default MySQL image tag.
pub const MYSQL_TAG: &str = "latest";

/// Port the MySQL server listens on inside its container.
pub const MYSQL_CONTAINER_PORT: u16 = 3306;

/// Environment variable carrying the MySQL root password.
pub const MYSQL_PASSWORD_ENV: &str = "MYSQL_ROOT_PASSWORD";

/// Dapr component type of a state store.
pub const DAPR_STATE_STORE: &str = "state";

/// Dapr component type of a pub/sub broker.
pub const DAPR_PUB_SUB: &str = "pubsub";

/// Maximum depth followed when resolving chained parent relations.
pub const MAX_RELATION_DEPTH: usize = 32;

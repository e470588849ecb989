//! MySQL servers, connections, and databases.

use topos_common::constants::{
    MYSQL_CONNECTION_V0, MYSQL_CONTAINER_PORT, MYSQL_DATABASE_V0, MYSQL_IMAGE,
    MYSQL_PASSWORD_ENV, MYSQL_SERVER_V0, MYSQL_TAG,
};
use topos_common::error::{Result, ToposError};
use topos_common::types::RelationRole;
use topos_compose::annotation::{Annotation, ContainerImage, ServiceBinding};
use topos_compose::builder::ResourceBuilder;
use topos_compose::graph::ApplicationGraph;
use topos_compose::manifest::ManifestContext;
use topos_compose::resource::{Resource, ResourceKind};

/// MySQL operations on the application graph.
pub trait MySqlExt {
    /// Adds a MySQL server container.
    ///
    /// `port` is the host port clients connect to; without it the server has
    /// no connection string until one is allocated downstream. A root
    /// password is generated when `password` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateResourceName` or `GraphSealed`.
    fn add_mysql_container(
        &self,
        name: &str,
        port: Option<u16>,
        password: Option<String>,
    ) -> Result<ResourceBuilder>;

    /// Adds a MySQL server managed outside the application.
    ///
    /// Without a literal `connection_string`, one must be supplied later
    /// through [`ResourceBuilder::with_connection_string`].
    ///
    /// # Errors
    ///
    /// Returns `DuplicateResourceName` or `GraphSealed`.
    fn add_mysql_connection(
        &self,
        name: &str,
        connection_string: Option<String>,
    ) -> Result<ResourceBuilder>;
}

impl MySqlExt for ApplicationGraph {
    fn add_mysql_container(
        &self,
        name: &str,
        port: Option<u16>,
        password: Option<String>,
    ) -> Result<ResourceBuilder> {
        self.ensure_available(name)?;
        let password = password.unwrap_or_else(|| self.generate_credential());
        let mut binding =
            ServiceBinding::new("tcp", "tcp").with_container_port(MYSQL_CONTAINER_PORT);
        binding.port = port;

        let mut server = Resource::container(name, password.clone());
        server.add_annotation(Annotation::ContainerImage(ContainerImage::new(
            MYSQL_IMAGE,
            MYSQL_TAG,
        )));
        server.add_annotation(Annotation::ServiceBinding(binding));
        server.add_annotation(Annotation::environment_fn(MYSQL_PASSWORD_ENV, move || {
            password.clone()
        }));
        server.add_annotation(Annotation::publishing(write_server));
        self.add_resource(server)
    }

    fn add_mysql_connection(
        &self,
        name: &str,
        connection_string: Option<String>,
    ) -> Result<ResourceBuilder> {
        let mut connection = Resource::connection(name, connection_string);
        connection.add_annotation(Annotation::publishing(write_connection));
        self.add_resource(connection)
    }
}

/// MySQL operations on a server builder.
pub trait MySqlBuilderExt {
    /// Adds a database hosted on this server.
    ///
    /// # Errors
    ///
    /// Returns `Config` if this builder does not wrap a MySQL container or
    /// connection, otherwise `DuplicateResourceName` or `GraphSealed`.
    fn add_database(&self, name: &str) -> Result<ResourceBuilder>;
}

impl MySqlBuilderExt for ResourceBuilder {
    fn add_database(&self, name: &str) -> Result<ResourceBuilder> {
        let server = self.resource().ok_or_else(|| ToposError::UnknownResource {
            name: self.name().to_string(),
        })?;
        if !matches!(
            server.kind(),
            ResourceKind::Container { .. } | ResourceKind::Connection { .. }
        ) {
            return Err(ToposError::Config {
                message: format!(
                    "cannot add database \"{name}\" to {} resource \"{}\"",
                    server.kind().label(),
                    server.name()
                ),
            });
        }
        tracing::debug!(server = %server.name(), database = name, "adding database");

        let mut database = Resource::new(name, ResourceKind::Database);
        database.add_annotation(Annotation::publishing(write_database));
        self.add_dependent(database)
    }
}

fn write_server(context: &mut ManifestContext<'_>) -> Result<()> {
    context.write_type(MYSQL_SERVER_V0)?;
    if let Some(image) = context.resource().image() {
        context.write_field("image", image.reference())?;
    }
    context.write_env()?;
    context.write_bindings()
}

fn write_connection(context: &mut ManifestContext<'_>) -> Result<()> {
    let connection_string = context.connection_string()?;
    context.write_type(MYSQL_CONNECTION_V0)?;
    context.write_field("connectionString", connection_string)
}

fn write_database(context: &mut ManifestContext<'_>) -> Result<()> {
    let parent = context
        .resource()
        .parent()
        .ok_or_else(|| ToposError::MissingConfiguration {
            resource: context.resource().name().to_string(),
            what: "parent server".into(),
        })?;
    let parent = context.resolve(parent, RelationRole::Parent)?;
    context.write_type(MYSQL_DATABASE_V0)?;
    context.write_field("parent", parent.name())
}

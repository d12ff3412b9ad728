//! Send/receive usage matrix of an app.

use crate::models::{
    AppUsage, AppUsageMatrix, Direction, UsageMessage, UsageResource, UsageServer,
};
use crate::storage::{StorageBackend, StorageError};
use tracing::warn;
use uuid::Uuid;

/// Resolve every active link of `app_id` into message, resource and server
/// summaries, split by direction in link creation order.
pub async fn usage_matrix(
    storage: &dyn StorageBackend,
    app_id: Uuid,
) -> Result<AppUsageMatrix, StorageError> {
    let mut matrix = AppUsageMatrix {
        app_id,
        sends: Vec::new(),
        receives: Vec::new(),
    };

    for link in storage.list_app_resource_messages(app_id).await? {
        let message = storage.get_message(link.message_id).await?;
        let resource = storage.get_resource(link.resource_id).await?;
        let server = match &resource {
            Some(resource) => storage.get_server(resource.server_id).await?,
            None => None,
        };

        let (Some(message), Some(resource), Some(server)) = (message, resource, server) else {
            warn!("Link {} of app {} has a dangling reference", link.id, app_id);
            continue;
        };

        let usage = AppUsage {
            message: UsageMessage {
                id: message.id,
                name: message.name,
                schema_id: message.schema_id,
                schema_version: message.schema_version,
            },
            resource: UsageResource {
                id: resource.id,
                name: resource.name,
                mode: resource.mode,
                resource_type: resource.resource_type,
            },
            server: UsageServer {
                id: server.id,
                name: server.name,
                protocol: server.protocol,
            },
        };

        match link.direction {
            Direction::Sends => matrix.sends.push(usage),
            Direction::Receives => matrix.receives.push(usage),
        }
    }

    Ok(matrix)
}

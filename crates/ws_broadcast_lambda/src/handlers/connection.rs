use serde_json::{json, Value};
use tracing::{error, info, warn};
use ws_broadcast_core::contract::{WebsocketRouteEvent, CONNECT_ROUTE, DISCONNECT_ROUTE};
use ws_broadcast_core::store::ConnectionStore;

use crate::handlers::response::{error_response, success_response, ApiGatewayResponse};

/// Handles the `$connect` and `$disconnect` routes of the WebSocket API.
///
/// A failed registration rejects the connection. A failed removal is only
/// logged, since the socket is already closed by then.
pub async fn handle_route_event<S: ConnectionStore>(
    event: Value,
    table: &str,
    store: &S,
) -> ApiGatewayResponse {
    let event: WebsocketRouteEvent = match serde_json::from_value(event) {
        Ok(value) => value,
        Err(failure) => {
            return error_response(400, &format!("malformed websocket event: {failure}"))
        }
    };
    let context = event.request_context;

    let Some(connection_id) = context.connection_id.filter(|id| !id.is_empty()) else {
        return error_response(400, "missing connection id");
    };
    let route_key = context.route_key.unwrap_or_default();

    match route_key.as_str() {
        CONNECT_ROUTE => match store.add_connection(table, &connection_id).await {
            Ok(()) => {
                info!(
                    component = "connection_handler",
                    connection_id = connection_id.as_str(),
                    "connection registered"
                );
                success_response(json!({ "connectionId": connection_id }))
            }
            Err(failure) => {
                error!(
                    component = "connection_handler",
                    connection_id = connection_id.as_str(),
                    error = %failure,
                    "failed to register connection"
                );
                error_response(500, &failure.to_string())
            }
        },
        DISCONNECT_ROUTE => {
            match store.remove_connection(table, &connection_id).await {
                Ok(()) => info!(
                    component = "connection_handler",
                    connection_id = connection_id.as_str(),
                    "connection removed"
                ),
                Err(failure) => warn!(
                    component = "connection_handler",
                    connection_id = connection_id.as_str(),
                    error = %failure,
                    "failed to remove connection"
                ),
            }
            success_response(json!({ "connectionId": connection_id }))
        }
        other => error_response(400, &format!("unsupported route {other}")),
    }
}
